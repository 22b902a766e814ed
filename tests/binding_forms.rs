use classhook_rs::{ClassHook, HookEmit, TransformOptions, TransformResult};

fn run_with(input: &str, emit: HookEmit) -> TransformResult {
    let t = ClassHook::default();
    let out = t
        .transform(
            input,
            TransformOptions {
                emit,
                source_type: Some(oxc_span::SourceType::mjs()),
                ..TransformOptions::default()
            },
        )
        .unwrap();

    println!("==== INPUT ====\n{input}\n==== OUTPUT ====\n{}\n", out.code);
    out
}

fn run(input: &str) -> String {
    run_with(input, HookEmit::SharedHelper).code
}

#[test]
fn anonymous_class_expression_takes_declarator_name() {
    let input = "let Apple = class extends Fruit {};\n";
    let output = run(input);

    assert!(output.contains("let Apple ="));
    assert!(output.contains("__classInheritedHook(_Apple, _Fruit, \"Apple\")"));
}

#[test]
fn named_class_expression_keeps_its_own_name() {
    let input = "let Apple = class Banana extends Fruit {};\n";
    let output = run(input);

    // The class's own name wins over the declarator name, and the id is kept
    // so internal self-references still resolve.
    assert!(output.contains("class Banana extends _Fruit"));
    assert!(output.contains(", \"Banana\")"));
    assert!(!output.contains("\"Apple\""));
}

#[test]
fn named_class_declaration_keeps_internal_binding() {
    let input = "class Apple extends Fruit {\n  clone() {\n    return new Apple();\n  }\n}\n";
    let output = run(input);

    assert!(output.contains("class Apple extends _Fruit"));
    assert!(output.contains("new Apple()"));
}

#[test]
fn anonymous_class_as_object_property_gets_no_name_argument() {
    let input = "let Children = { Child: class extends Parents.Parent {} };\n";
    let output = run(input);

    assert!(output.contains(", void 0)"));
    // Member-chain superclass is captured once into a local.
    assert_eq!(output.matches("Parents.Parent").count(), 1);
    assert!(output.contains("var _Parent = Parents.Parent"));
}

#[test]
fn named_class_as_object_property_uses_its_own_name() {
    let input = "let Children = { Child: class NamedChild extends Parent {} };\n";
    let output = run(input);

    assert!(output.contains(", \"NamedChild\")"));
}

#[test]
fn parenthesized_class_expression_is_rewritten() {
    let input = "let Apple = (class extends Fruit {});\n";
    let output = run(input);

    assert!(output.contains("__classInheritedHook(_Apple, _Fruit, \"Apple\")"));
}

#[test]
fn unnamed_default_export_is_rewritten_in_place() {
    let input = "export default class extends Base {}\n";
    let output = run(input);

    assert!(output.contains("export default"));
    assert!(output.contains("__classInheritedHook(_Class, _Base, void 0)"));
}

#[test]
fn named_default_export_keeps_module_binding() {
    let input = "export default class Foo extends Base {}\n";
    let output = run(input);

    assert!(output.contains("let Foo ="));
    assert!(output.contains("export default Foo"));
    assert!(output.contains("__classInheritedHook(_Foo, _Base, \"Foo\")"));
}

#[test]
fn named_export_declaration_becomes_exported_let() {
    let input = "export class Apple extends Fruit {}\n";
    let output = run(input);

    assert!(output.contains("export let Apple ="));
    assert!(output.contains("__classInheritedHook(_Apple, _Fruit, \"Apple\")"));
}

#[test]
fn generated_locals_avoid_existing_identifiers() {
    let input = "var _Apple = 1;\nvar _Fruit = 2;\nclass Apple extends Fruit {}\n";
    let output = run(input);

    assert!(output.contains("__classInheritedHook(_Apple2, _Fruit2, \"Apple\")"));
}

#[test]
fn each_site_gets_fresh_locals() {
    let input = "class Apple extends Fruit {}\nlet Pear = class extends Fruit {};\n";
    let output = run(input);

    assert!(output.contains("__classInheritedHook(_Apple, _Fruit, \"Apple\")"));
    assert!(output.contains("__classInheritedHook(_Pear, _Fruit2, \"Pear\")"));
}

#[test]
fn class_body_passes_through_unchanged() {
    let input = "class Apple extends Fruit {\n  static onInherited(child) {}\n  #seed = 1;\n  ripen() {\n    return this.#seed;\n  }\n}\n";
    let output = run(input);

    assert!(output.contains("static onInherited(child)"));
    assert!(output.contains("ripen()"));
}
