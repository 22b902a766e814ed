use std::path::PathBuf;

use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions, CodegenReturn};
use oxc_parser::{ParseOptions, Parser};
use oxc_span::SourceType;

mod names;
mod template;
mod transforms;

pub use transforms::class_inherited_hook::{ClassInheritedHook, HookEmit, HELPER_NAME, HOOK_NAME};

/// Driver for the `onInherited` class rewrite. Owns parse/print options;
/// each call to [`ClassHook::transform`] runs a single pass over the input.
pub struct ClassHook {
    parse_options: ParseOptions,
    codegen_options: CodegenOptions,
}

impl Default for ClassHook {
    fn default() -> Self {
        Self {
            parse_options: ParseOptions { parse_regular_expression: true, ..ParseOptions::default() },
            codegen_options: CodegenOptions::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TransformOptions {
    /// Emit a shared per-file helper (default) or the full protocol inline at every site.
    pub emit: HookEmit,
    pub source_type: Option<SourceType>,
    pub filename_for_source_type: Option<PathBuf>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self { emit: HookEmit::default(), source_type: None, filename_for_source_type: None }
    }
}

#[derive(Debug)]
pub enum Error {
    InvalidSourceType { path: PathBuf, message: String },
    ParseFailed,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidSourceType { path, message } => {
                write!(f, "Failed to determine source type for {}: {}", path.display(), message)
            }
            Error::ParseFailed => write!(f, "Parsing failed"),
        }
    }
}

impl std::error::Error for Error {}

pub struct TransformResult {
    pub modified: bool,
    pub code: String,
}

pub trait Transform {
    fn name(&self) -> &'static str;

    fn run<'a>(&self, ctx: &mut TransformCtx<'a>, program: &mut oxc_ast::ast::Program<'a>) -> bool;
}

pub struct TransformCtx<'a> {
    pub allocator: &'a Allocator,
    pub source_text: &'a str,
    pub source_type: SourceType,
}

impl ClassHook {
    pub fn transform(&self, source_text: &str, opts: TransformOptions) -> Result<TransformResult, Error> {
        let allocator = Allocator::default();

        let source_type = if let Some(st) = opts.source_type {
            st
        } else if let Some(path) = opts.filename_for_source_type.as_ref() {
            SourceType::from_path(path)
                .map_err(|e| Error::InvalidSourceType { path: path.clone(), message: e.to_string() })?
        } else {
            SourceType::mjs()
        };

        let parse_ret = Parser::new(&allocator, source_text, source_type)
            .with_options(self.parse_options)
            .parse();

        if !parse_ret.errors.is_empty() {
            return Err(Error::ParseFailed);
        }

        let mut program = parse_ret.program;

        let pass = ClassInheritedHook::new(opts.emit);
        let mut ctx = TransformCtx { allocator: &allocator, source_text, source_type };
        let modified = pass.run(&mut ctx, &mut program);

        let CodegenReturn { code, .. } = Codegen::new()
            .with_options(self.codegen_options.clone())
            .with_source_text(source_text)
            .build(&program);

        Ok(TransformResult { modified, code })
    }
}
