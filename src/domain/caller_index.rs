//! Caller Index
//!
//! Whole-program map from method to the call sites that target it, built
//! once before any traversal. Entry-point detection is a lookup against
//! this index instead of a per-method whole-program search.
//!
//! Calls whose receiver cannot be typed go into a by-name bucket: an
//! untyped `x.m()` anywhere counts as a caller of every indexed `m`.
//! That is deliberately conservative; a missing diagram is preferred over
//! a diagram for a method that is actually called.

use dashmap::DashMap;
use proc_macro2::Span;
use rayon::prelude::*;
use syn::visit::{self, Visit};
use syn::Expr;

use crate::domain::index::SymbolIndex;
use crate::domain::model::{type_ident, CompilationUnit, SourceFile};
use crate::domain::resolver::{receiver_ident, LocalScope};

/// One discovered call site.
#[derive(Debug, Clone)]
pub struct CallSite {
    /// Enclosing symbol, e.g. `Engine::run` or `bootstrap`.
    pub caller: String,
    /// file:line
    pub location: String,
}

/// Immutable-after-build caller table.
#[derive(Debug, Default)]
pub struct CallerIndex {
    // Key: (TypeName, MethodName) -> resolved call sites
    direct: DashMap<(String, String), Vec<CallSite>>,

    // Key: MethodName -> call sites with an untypeable receiver
    by_name: DashMap<String, Vec<CallSite>>,
}

impl CallerIndex {
    /// Collect call sites from every source in parallel. Parse failures
    /// were already reported by the symbol pass and are skipped silently.
    pub fn build(sources: &[SourceFile], symbols: &SymbolIndex) -> Self {
        let index = CallerIndex::default();

        sources.par_iter().for_each(|src| {
            let Some(unit) = CompilationUnit::parse(src) else {
                return;
            };
            let mut collector = CallSiteCollector {
                symbols,
                index: &index,
                file_path: &unit.path,
                enclosing_type: None,
                current_fn: None,
                scope: LocalScope::default(),
            };
            collector.visit_file(&unit.ast);
        });

        index
    }

    /// All call sites targeting (type, method), including conservative
    /// by-name matches.
    pub fn callers_of(&self, type_name: &str, method: &str) -> Vec<CallSite> {
        let mut sites = self
            .direct
            .get(&(type_name.to_string(), method.to_string()))
            .map(|r| r.clone())
            .unwrap_or_default();
        if let Some(named) = self.by_name.get(method) {
            sites.extend(named.iter().cloned());
        }
        sites
    }

    pub fn has_callers(&self, type_name: &str, method: &str) -> bool {
        self.direct
            .get(&(type_name.to_string(), method.to_string()))
            .map(|r| !r.is_empty())
            .unwrap_or(false)
            || self
                .by_name
                .get(method)
                .map(|r| !r.is_empty())
                .unwrap_or(false)
    }

    fn record_direct(&self, type_name: String, method: String, site: CallSite) {
        self.direct.entry((type_name, method)).or_default().push(site);
    }

    fn record_by_name(&self, method: String, site: CallSite) {
        self.by_name.entry(method).or_default().push(site);
    }
}

/// Syntax visitor that records call sites for one compilation unit.
struct CallSiteCollector<'a> {
    symbols: &'a SymbolIndex,
    index: &'a CallerIndex,
    file_path: &'a str,
    enclosing_type: Option<String>,
    current_fn: Option<String>,
    scope: LocalScope,
}

impl CallSiteCollector<'_> {
    fn site(&self, span: Span) -> CallSite {
        let caller = match (&self.enclosing_type, &self.current_fn) {
            (Some(ty), Some(f)) => format!("{}::{}", ty, f),
            (None, Some(f)) => f.clone(),
            _ => "<module>".to_string(),
        };
        CallSite {
            caller,
            location: format!("{}:{}", self.file_path, span.start().line),
        }
    }
}

impl<'ast> Visit<'ast> for CallSiteCollector<'_> {
    fn visit_item_impl(&mut self, imp: &'ast syn::ItemImpl) {
        let prev = self.enclosing_type.take();
        self.enclosing_type = type_ident(&imp.self_ty);
        visit::visit_item_impl(self, imp);
        self.enclosing_type = prev;
    }

    fn visit_impl_item_fn(&mut self, method: &'ast syn::ImplItemFn) {
        let prev_fn = self.current_fn.replace(method.sig.ident.to_string());
        let prev_scope =
            std::mem::replace(&mut self.scope, LocalScope::from_signature(&method.sig));
        visit::visit_impl_item_fn(self, method);
        self.scope = prev_scope;
        self.current_fn = prev_fn;
    }

    fn visit_item_fn(&mut self, func: &'ast syn::ItemFn) {
        // Nested fns cannot reach the outer impl's Self.
        let prev_ty = self.enclosing_type.take();
        let prev_fn = self.current_fn.replace(func.sig.ident.to_string());
        let prev_scope = std::mem::replace(&mut self.scope, LocalScope::from_signature(&func.sig));
        visit::visit_item_fn(self, func);
        self.scope = prev_scope;
        self.current_fn = prev_fn;
        self.enclosing_type = prev_ty;
    }

    fn visit_local(&mut self, local: &'ast syn::Local) {
        self.scope.bind_local(local, self.symbols);
        visit::visit_local(self, local);
    }

    fn visit_expr_method_call(&mut self, call: &'ast syn::ExprMethodCall) {
        let method = call.method.to_string();
        let site = self.site(call.method.span());

        match receiver_ident(&call.receiver) {
            Some(id) if id == "self" => {
                if let Some(ty) = self.enclosing_type.clone() {
                    self.index.record_direct(ty, method, site);
                }
            }
            Some(id) => match self.scope.type_of(&id) {
                Some(ty) => self.index.record_direct(ty.to_string(), method, site),
                None => self.index.record_by_name(method, site),
            },
            None => self.index.record_by_name(method, site),
        }

        visit::visit_expr_method_call(self, call);
    }

    fn visit_expr_call(&mut self, call: &'ast syn::ExprCall) {
        if let Expr::Path(path) = &*call.func {
            let segments = &path.path.segments;
            if segments.len() == 1 {
                // Bare call: a member of the enclosing type, if one exists.
                let name = segments[0].ident.to_string();
                if name.chars().next().is_some_and(char::is_lowercase) {
                    if let Some(ty) = self.enclosing_type.clone() {
                        if self.symbols.method(&ty, &name).is_some() {
                            let site = self.site(segments[0].ident.span());
                            self.index.record_direct(ty, name, site);
                        }
                    }
                }
            } else if let Some(last) = segments.last() {
                let method = last.ident.to_string();
                let qualifier = segments[segments.len() - 2].ident.to_string();
                let target = if qualifier == "Self" {
                    self.enclosing_type.clone()
                } else if qualifier.chars().next().is_some_and(char::is_uppercase) {
                    Some(qualifier)
                } else {
                    None
                };
                if let Some(ty) = target {
                    let site = self.site(last.ident.span());
                    self.index.record_direct(ty, method, site);
                }
            }
        }

        visit::visit_expr_call(self, call);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ProgramModel, SourceFile};

    fn model_of(code: &str) -> ProgramModel {
        let sources = vec![SourceFile::new("test_crate", "test.rs", code)];
        ProgramModel::build(&sources)
    }

    #[test]
    fn test_self_call_is_a_direct_caller() {
        let model = model_of(
            r#"
pub struct Foo;
impl Foo {
    pub fn m(&self) { self.bar(); }
    fn bar(&self) {}
}
"#,
        );
        assert!(model.callers.has_callers("Foo", "bar"));
        let sites = model.callers.callers_of("Foo", "bar");
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].caller, "Foo::m");
        // The uncalled method stays caller-free.
        assert!(!model.callers.has_callers("Foo", "m"));
    }

    #[test]
    fn test_typed_receiver_resolves_to_its_type() {
        let model = model_of(
            r#"
pub struct Helper;
impl Helper { pub fn compute(&self) -> u32 { 42 } }
pub struct Engine;
impl Engine {
    pub fn run(&self, helper: Helper) { helper.compute(); }
}
"#,
        );
        assert!(model.callers.has_callers("Helper", "compute"));
        assert!(!model.callers.has_callers("Engine", "run"));
    }

    #[test]
    fn test_untyped_receiver_is_conservative_by_name() {
        let model = model_of(
            r#"
pub struct A;
impl A { pub fn lonely(&self) {} }
pub fn elsewhere() {
    let x = mystery();
    x.lonely();
}
"#,
        );
        // No false entry point: the by-name bucket marks every `lonely`.
        assert!(model.callers.has_callers("A", "lonely"));
        let sites = model.callers.callers_of("A", "lonely");
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].caller, "elsewhere");
    }

    #[test]
    fn test_associated_path_call_is_direct() {
        let model = model_of(
            r#"
pub struct Builder;
impl Builder { pub fn create() -> Self { Builder } }
pub struct App;
impl App {
    pub fn boot(&self) { let b = Builder::create(); }
}
"#,
        );
        assert!(model.callers.has_callers("Builder", "create"));
    }

    #[test]
    fn test_self_qualified_call_targets_enclosing_type() {
        let model = model_of(
            r#"
pub struct Foo;
impl Foo {
    pub fn m(&self) { Self::helper(); }
    fn helper() {}
}
"#,
        );
        assert!(model.callers.has_callers("Foo", "helper"));
    }

    #[test]
    fn test_lowercase_module_paths_are_ignored() {
        let model = model_of(
            r#"
pub struct Foo;
impl Foo {
    pub fn m(&self) { std::mem::drop(1); }
    fn swap(&self) {}
}
"#,
        );
        // `mem::drop` must not be attributed to any type.
        assert!(!model.callers.has_callers("Foo", "drop"));
        assert!(!model.callers.has_callers("Foo", "swap"));
    }
}
