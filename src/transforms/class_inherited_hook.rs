use oxc_allocator::{Box as ArenaBox, Vec as ArenaVec};
use oxc_ast::ast::*;
use oxc_ast_visit::VisitMut;
use oxc_span::Span;
use oxc_syntax::operator::BinaryOperator;

use std::collections::HashSet;

use crate::names::{NameCollector, UidGenerator};
use crate::{template, Transform, TransformCtx};

/// Property probed on the superclass (own or inherited) after construction.
pub const HOOK_NAME: &str = "onInherited";

/// Name of the per-file shared helper binding.
pub const HELPER_NAME: &str = "__classInheritedHook";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HookEmit {
    /// Inject one file-scope helper and emit a three-argument call per class.
    #[default]
    SharedHelper,
    /// Re-emit the full hook-invocation protocol at every rewrite site.
    Inline,
}

/// Rewrites every derived class so that defining it invokes
/// `Parent.onInherited(Child)` and an optional non-`undefined` return value
/// replaces the binding.
pub struct ClassInheritedHook {
    emit: HookEmit,
}

impl ClassInheritedHook {
    pub fn new(emit: HookEmit) -> Self {
        Self { emit }
    }
}

impl Transform for ClassInheritedHook {
    fn name(&self) -> &'static str {
        "transformClassInheritedHook"
    }

    fn run<'a>(&self, ctx: &mut TransformCtx<'a>, program: &mut Program<'a>) -> bool {
        let mut collector = NameCollector::default();
        collector.visit_program(program);
        let helper_bound = collector.bound.contains(HELPER_NAME);

        let mut rewriter = Rewriter {
            allocator: ctx.allocator,
            source_type: ctx.source_type,
            emit: self.emit,
            uids: UidGenerator::new(collector.used),
            skip: HashSet::new(),
            rewrote: false,
        };
        rewriter.visit_program(program);

        if rewriter.rewrote && self.emit == HookEmit::SharedHelper && !helper_bound {
            let helper = template::statement(ctx.allocator, ctx.source_type, &helper_source(), Vec::new());
            let original = std::mem::replace(&mut program.body, ArenaVec::new_in(ctx.allocator));
            let mut body = ArenaVec::new_in(ctx.allocator);
            body.push(helper);
            for stmt in original {
                body.push(stmt);
            }
            program.body = body;
        }

        rewriter.rewrote
    }
}

/// The shared helper implements the whole protocol once: pin the child's name,
/// probe the prototype chain for the hook, fail on a non-callable hook, and
/// substitute a returned value unless it is `undefined` (identity check, so
/// falsy replacements like `null`, `0`, `""`, `false`, and `NaN` propagate).
fn helper_source() -> String {
    format!(
        r#"var {HELPER_NAME} = function(child, parent, childName) {{
  if (childName) {{
    Object.defineProperty(child, "name", {{ value: childName, configurable: true }});
  }}
  if ("{HOOK_NAME}" in parent) {{
    if (typeof parent.{HOOK_NAME} === "function") {{
      var replacement = parent.{HOOK_NAME}(child);
      if (replacement !== void 0) {{
        if (childName && typeof replacement === "function" && replacement.name !== childName) {{
          Object.defineProperty(replacement, "name", {{ value: childName, configurable: true }});
        }}
        child = replacement;
      }}
    }} else {{
      throw new TypeError("Attempted to call {HOOK_NAME}, but it was not a function");
    }}
  }}
  return child;
}};"#
    )
}

struct Rewriter<'a> {
    allocator: &'a oxc_allocator::Allocator,
    source_type: oxc_span::SourceType,
    emit: HookEmit,
    uids: UidGenerator,
    /// Addresses of synthesized (or recognized-as-synthesized) class nodes the
    /// matcher must never touch again.
    skip: HashSet<usize>,
    rewrote: bool,
}

impl<'a> Rewriter<'a> {
    fn unwrap_parens<'b>(&self, mut expr: &'b Expression<'a>) -> &'b Expression<'a> {
        loop {
            match expr {
                Expression::ParenthesizedExpression(p) => expr = &p.expression,
                _ => return expr,
            }
        }
    }

    fn strip_parens_owned(&self, mut expr: Expression<'a>) -> Expression<'a> {
        loop {
            match expr {
                Expression::ParenthesizedExpression(p) => expr = p.unbox().expression,
                other => return other,
            }
        }
    }

    fn is_candidate(&self, class: &Class<'a>) -> bool {
        class.super_class.is_some() && !self.skip.contains(&(class as *const Class<'a> as usize))
    }

    fn ident_expr(&self, name: &str) -> Expression<'a> {
        let name = self.allocator.alloc_str(name);
        Expression::Identifier(ArenaBox::new_in(
            IdentifierReference { span: Span::default(), name: name.into(), reference_id: None.into() },
            self.allocator,
        ))
    }

    fn placeholder_expr(&self) -> Expression<'a> {
        Expression::NullLiteral(ArenaBox::new_in(NullLiteral { span: Span::default() }, self.allocator))
    }

    /// Synthesizes the immediately-invoked wrapper for one matched class. The
    /// class body is moved, never cloned; the superclass expression is bound
    /// to a fresh local so it is evaluated exactly once.
    fn rewrite_class(&mut self, mut class: ArenaBox<'a, Class<'a>>, declared_name: Option<&str>) -> Expression<'a> {
        let Some(super_expr) = class.super_class.take() else {
            return Expression::ClassExpression(class);
        };
        self.rewrote = true;

        let parent_base = match self.unwrap_parens(&super_expr) {
            Expression::Identifier(id) => id.name.as_str().to_string(),
            _ => String::from("Parent"),
        };
        let parent_local = self.uids.generate(&parent_base);
        let child_local = self.uids.generate(declared_name.unwrap_or("Class"));

        class.r#type = ClassType::ClassExpression;
        class.super_class = Some(self.ident_expr(&parent_local));

        let class_expr = Expression::ClassExpression(class);
        if let Expression::ClassExpression(c) = &class_expr {
            self.skip.insert(&**c as *const Class<'a> as usize);
        }

        let source = match self.emit {
            HookEmit::SharedHelper => {
                let name_arg = match declared_name {
                    Some(name) => format!("\"{name}\""),
                    None => String::from("void 0"),
                };
                format!(
                    "(function() {{\n  var {parent_local} = __SUPER__;\n  var {child_local} = __CLASS__;\n  return {HELPER_NAME}({child_local}, {parent_local}, {name_arg});\n}})()"
                )
            }
            HookEmit::Inline => self.inline_source(&parent_local, &child_local, declared_name),
        };

        template::expression(
            self.allocator,
            self.source_type,
            &source,
            vec![("__SUPER__", super_expr), ("__CLASS__", class_expr)],
        )
    }

    fn inline_source(&mut self, parent_local: &str, child_local: &str, declared_name: Option<&str>) -> String {
        let returned_local = self.uids.generate("returned");
        match declared_name {
            Some(name) => format!(
                r#"(function() {{
  var {parent_local} = __SUPER__;
  var {child_local} = __CLASS__;
  Object.defineProperty({child_local}, "name", {{ value: "{name}", configurable: true }});
  if ("{HOOK_NAME}" in {parent_local}) {{
    if (typeof {parent_local}.{HOOK_NAME} === "function") {{
      var {returned_local} = {parent_local}.{HOOK_NAME}({child_local});
      if ({returned_local} !== void 0) {{
        if (typeof {returned_local} === "function" && {returned_local}.name !== "{name}") {{
          Object.defineProperty({returned_local}, "name", {{ value: "{name}", configurable: true }});
        }}
        {child_local} = {returned_local};
      }}
    }} else {{
      throw new TypeError("Attempted to call {HOOK_NAME}, but it was not a function");
    }}
  }}
  return {child_local};
}})()"#
            ),
            None => format!(
                r#"(function() {{
  var {parent_local} = __SUPER__;
  var {child_local} = __CLASS__;
  if ("{HOOK_NAME}" in {parent_local}) {{
    if (typeof {parent_local}.{HOOK_NAME} === "function") {{
      var {returned_local} = {parent_local}.{HOOK_NAME}({child_local});
      if ({returned_local} !== void 0) {{
        {child_local} = {returned_local};
      }}
    }} else {{
      throw new TypeError("Attempted to call {HOOK_NAME}, but it was not a function");
    }}
  }}
  return {child_local};
}})()"#
            ),
        }
    }

    fn let_binding_stmt(&mut self, name: &str, wrapper: Expression<'a>) -> Statement<'a> {
        template::statement(
            self.allocator,
            self.source_type,
            &format!("let {name} = __WRAPPER__;"),
            vec![("__WRAPPER__", wrapper)],
        )
    }

    /// Recognizes wrapper expressions this transform itself emitted, so that a
    /// later traversal (or a whole re-run over already-rewritten source) never
    /// re-matches the nested class expression inside them.
    fn mark_generated_wrapper(&mut self, call: &CallExpression<'a>) {
        if !call.arguments.is_empty() {
            return;
        }
        let Expression::FunctionExpression(func) = self.unwrap_parens(&call.callee) else {
            return;
        };
        if func.id.is_some() || !func.params.items.is_empty() {
            return;
        }
        let Some(body) = func.body.as_ref() else {
            return;
        };

        let mut class_ptr = None;
        let mut has_protocol = false;
        for stmt in &body.statements {
            match stmt {
                Statement::VariableDeclaration(decl) => {
                    for declarator in &decl.declarations {
                        if let Some(init) = declarator.init.as_ref() {
                            if let Expression::ClassExpression(c) = self.unwrap_parens(init) {
                                class_ptr = Some(&**c as *const Class<'a> as usize);
                            }
                        }
                    }
                }
                Statement::ReturnStatement(ret) => {
                    if let Some(Expression::CallExpression(inner)) =
                        ret.argument.as_ref().map(|e| self.unwrap_parens(e))
                    {
                        if let Expression::Identifier(id) = self.unwrap_parens(&inner.callee) {
                            if id.name.as_str() == HELPER_NAME {
                                has_protocol = true;
                            }
                        }
                    }
                }
                Statement::IfStatement(ifs) => {
                    if let Expression::BinaryExpression(bin) = self.unwrap_parens(&ifs.test) {
                        if bin.operator == BinaryOperator::In {
                            if let Expression::StringLiteral(s) = self.unwrap_parens(&bin.left) {
                                if s.value.as_str() == HOOK_NAME {
                                    has_protocol = true;
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        if has_protocol {
            if let Some(ptr) = class_ptr {
                self.skip.insert(ptr);
            }
        }
    }

    /// Statement-position binder: class declarations become `let` bindings,
    /// default exports stay default exports. Statements are rewritten in
    /// declaration order, so a parent is rewritten before its subclasses.
    fn rewrite_statement_list(&mut self, stmts: &mut ArenaVec<'a, Statement<'a>>) {
        let original = std::mem::replace(stmts, ArenaVec::new_in(self.allocator));
        let mut out = ArenaVec::new_in(self.allocator);

        for stmt in original {
            let stmt = match stmt {
                Statement::ClassDeclaration(class) if self.is_candidate(&class) => {
                    let name = class.id.as_ref().map(|id| id.name.as_str().to_string());
                    let wrapper = self.rewrite_class(class, name.as_deref());
                    match name {
                        Some(name) => out.push(self.let_binding_stmt(&name, wrapper)),
                        None => out.push(template::statement(
                            self.allocator,
                            self.source_type,
                            "__WRAPPER__;",
                            vec![("__WRAPPER__", wrapper)],
                        )),
                    }
                    continue;
                }
                Statement::ExportDefaultDeclaration(export)
                    if matches!(
                        &export.declaration,
                        ExportDefaultDeclarationKind::ClassDeclaration(c) if self.is_candidate(c)
                    ) =>
                {
                    if let ExportDefaultDeclarationKind::ClassDeclaration(class) = export.unbox().declaration {
                        let name = class.id.as_ref().map(|id| id.name.as_str().to_string());
                        let wrapper = self.rewrite_class(class, name.as_deref());
                        match name {
                            Some(name) => {
                                // Keep the module-scope binding the named declaration implied.
                                out.push(self.let_binding_stmt(&name, wrapper));
                                out.push(template::statement(
                                    self.allocator,
                                    self.source_type,
                                    &format!("export default {name};"),
                                    Vec::new(),
                                ));
                            }
                            None => out.push(template::statement(
                                self.allocator,
                                self.source_type,
                                "export default __WRAPPER__;",
                                vec![("__WRAPPER__", wrapper)],
                            )),
                        }
                    }
                    continue;
                }
                other => other,
            };
            out.push(stmt);
        }

        *stmts = out;
    }
}

impl<'a> VisitMut<'a> for Rewriter<'a> {
    fn visit_program(&mut self, it: &mut Program<'a>) {
        self.rewrite_statement_list(&mut it.body);
        oxc_ast_visit::walk_mut::walk_program(self, it);
    }

    fn visit_function_body(&mut self, it: &mut FunctionBody<'a>) {
        self.rewrite_statement_list(&mut it.statements);
        oxc_ast_visit::walk_mut::walk_function_body(self, it);
    }

    fn visit_block_statement(&mut self, it: &mut BlockStatement<'a>) {
        self.rewrite_statement_list(&mut it.body);
        oxc_ast_visit::walk_mut::walk_block_statement(self, it);
    }

    fn visit_static_block(&mut self, it: &mut StaticBlock<'a>) {
        self.rewrite_statement_list(&mut it.body);
        oxc_ast_visit::walk_mut::walk_static_block(self, it);
    }

    fn visit_switch_case(&mut self, it: &mut SwitchCase<'a>) {
        self.rewrite_statement_list(&mut it.consequent);
        oxc_ast_visit::walk_mut::walk_switch_case(self, it);
    }

    fn visit_export_named_declaration(&mut self, it: &mut ExportNamedDeclaration<'a>) {
        let matched = matches!(
            &it.declaration,
            Some(Declaration::ClassDeclaration(c)) if self.is_candidate(c)
        );
        if matched {
            if let Some(Declaration::ClassDeclaration(class)) = it.declaration.take() {
                let name = class.id.as_ref().map(|id| id.name.as_str().to_string());
                let wrapper = self.rewrite_class(class, name.as_deref());
                if let Some(name) = &name {
                    if let Statement::VariableDeclaration(decl) = self.let_binding_stmt(name, wrapper) {
                        it.declaration = Some(Declaration::VariableDeclaration(decl));
                    }
                }
            }
        }
        oxc_ast_visit::walk_mut::walk_export_named_declaration(self, it);
    }

    fn visit_variable_declarator(&mut self, it: &mut VariableDeclarator<'a>) {
        let matched = match it.init.as_ref().map(|e| self.unwrap_parens(e)) {
            Some(Expression::ClassExpression(c)) => self.is_candidate(c),
            _ => false,
        };
        if matched {
            if let Some(init) = it.init.take() {
                match self.strip_parens_owned(init) {
                    Expression::ClassExpression(class) => {
                        // The class's own name wins; the declarator name is the fallback.
                        let name = class.id.as_ref().map(|id| id.name.as_str().to_string()).or_else(|| {
                            match &it.id.kind {
                                BindingPatternKind::BindingIdentifier(id) => Some(id.name.as_str().to_string()),
                                _ => None,
                            }
                        });
                        it.init = Some(self.rewrite_class(class, name.as_deref()));
                    }
                    other => it.init = Some(other),
                }
            }
        }
        oxc_ast_visit::walk_mut::walk_variable_declarator(self, it);
    }

    fn visit_expression(&mut self, it: &mut Expression<'a>) {
        if let Expression::CallExpression(call) = &*it {
            self.mark_generated_wrapper(call);
        }

        let matched = matches!(&*it, Expression::ClassExpression(c) if self.is_candidate(c));
        if matched {
            let placeholder = self.placeholder_expr();
            match std::mem::replace(it, placeholder) {
                Expression::ClassExpression(class) => {
                    let name = class.id.as_ref().map(|id| id.name.as_str().to_string());
                    *it = self.rewrite_class(class, name.as_deref());
                }
                other => *it = other,
            }
        }

        oxc_ast_visit::walk_mut::walk_expression(self, it);
    }
}
