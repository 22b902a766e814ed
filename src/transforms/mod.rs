pub mod class_inherited_hook;
