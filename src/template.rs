use std::collections::HashMap;

use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::VisitMut;
use oxc_parser::Parser;
use oxc_span::SourceType;

/// Parses a parameterized snippet and grafts real subtrees over placeholder
/// identifiers. Snippets are compile-time constants of this crate; a snippet
/// that fails to parse or leaves a substitution unused is a programming error.
pub fn statement<'a>(
    allocator: &'a Allocator,
    source_type: SourceType,
    source: &str,
    substitutions: Vec<(&'static str, Expression<'a>)>,
) -> Statement<'a> {
    let source = allocator.alloc_str(source);
    let parsed = Parser::new(allocator, source, source_type).parse();
    debug_assert!(parsed.errors.is_empty(), "template failed to parse: {source}");

    let mut program = parsed.program;
    let mut substituter = Substituter { map: substitutions.into_iter().collect() };
    substituter.visit_program(&mut program);
    debug_assert!(substituter.map.is_empty(), "template left substitutions unused: {source}");

    match program.body.pop() {
        Some(stmt) => stmt,
        None => unreachable!("template produced no statement: {source}"),
    }
}

pub fn expression<'a>(
    allocator: &'a Allocator,
    source_type: SourceType,
    source: &str,
    substitutions: Vec<(&'static str, Expression<'a>)>,
) -> Expression<'a> {
    match statement(allocator, source_type, source, substitutions) {
        Statement::ExpressionStatement(stmt) => stmt.unbox().expression,
        _ => unreachable!("template is not a single expression: {source}"),
    }
}

struct Substituter<'a> {
    map: HashMap<&'static str, Expression<'a>>,
}

impl<'a> VisitMut<'a> for Substituter<'a> {
    fn visit_expression(&mut self, it: &mut Expression<'a>) {
        if let Expression::Identifier(id) = &*it {
            if let Some(replacement) = self.map.remove(id.name.as_str()) {
                *it = replacement;
                return;
            }
        }
        oxc_ast_visit::walk_mut::walk_expression(self, it);
    }
}
