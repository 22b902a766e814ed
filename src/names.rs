use std::collections::HashSet;

use oxc_ast::ast::*;
use oxc_ast_visit::VisitMut;

/// Collects every identifier appearing in the program: `used` is the pool the
/// uid generator must avoid, `bound` only the names introduced by bindings
/// (used to detect a pre-existing helper binding).
#[derive(Default)]
pub struct NameCollector {
    pub used: HashSet<String>,
    pub bound: HashSet<String>,
}

impl<'a> VisitMut<'a> for NameCollector {
    fn visit_identifier_reference(&mut self, it: &mut IdentifierReference<'a>) {
        self.used.insert(it.name.as_str().to_string());
    }

    fn visit_binding_identifier(&mut self, it: &mut BindingIdentifier<'a>) {
        self.used.insert(it.name.as_str().to_string());
        self.bound.insert(it.name.as_str().to_string());
    }
}

/// Babel-style uid generation: `_Base`, then `_Base2`, `_Base3`, ...
/// Handed-out names are reserved so later sites never collide.
pub struct UidGenerator {
    used: HashSet<String>,
}

impl UidGenerator {
    pub fn new(used: HashSet<String>) -> Self {
        Self { used }
    }

    pub fn generate(&mut self, base: &str) -> String {
        let base = base.trim_start_matches('_');
        let base = if base.is_empty() { "temp" } else { base };
        let mut candidate = format!("_{base}");
        let mut n = 2;
        while self.used.contains(&candidate) {
            candidate = format!("_{base}{n}");
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}
