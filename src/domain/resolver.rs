//! Call Edge Resolver
//!
//! Turns a call-shaped expression with a simple receiver into a
//! (target type, member, return type) triple, or declines. Declined
//! expressions are still descended into by the walker so nested calls are
//! found; declining is never an error.

use std::collections::HashMap;

use syn::{Expr, FnArg, Local, Pat, Signature};

use crate::domain::index::SymbolIndex;
use crate::domain::model::type_ident;

/// Outcome of resolving one call expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Call on the type enclosing the current method.
    SameType { member: String, ret: String },
    /// Call on another named type.
    CrossType {
        target: String,
        member: String,
        ret: String,
    },
    /// Receiver shape not simple, or no type could be determined.
    Unresolved,
}

/// Identifier behind a receiver expression, if the receiver is a single
/// bare identifier (`self`, `helper`, ...). Anything else declines.
pub fn receiver_ident(expr: &Expr) -> Option<String> {
    if let Expr::Path(path) = expr {
        path.path.get_ident().map(|ident| ident.to_string())
    } else {
        None
    }
}

/// Identifier -> type-name bindings visible inside one method body:
/// typed parameters plus `let` statements seen so far.
#[derive(Debug, Default, Clone)]
pub struct LocalScope {
    bindings: HashMap<String, String>,
}

impl LocalScope {
    pub fn from_signature(sig: &Signature) -> Self {
        let mut scope = Self::default();
        for input in &sig.inputs {
            if let FnArg::Typed(pt) = input {
                if let Pat::Ident(pi) = &*pt.pat {
                    if let Some(ty) = type_ident(&pt.ty) {
                        scope.bindings.insert(pi.ident.to_string(), ty);
                    }
                }
            }
        }
        scope
    }

    pub fn type_of(&self, ident: &str) -> Option<&str> {
        self.bindings.get(ident).map(String::as_str)
    }

    /// Record a `let` binding when its type is discoverable: an explicit
    /// annotation, a struct literal, or a constructor-style associated call.
    pub fn bind_local(&mut self, local: &Local, symbols: &SymbolIndex) {
        match &local.pat {
            Pat::Type(pt) => {
                if let Pat::Ident(pi) = &*pt.pat {
                    if let Some(ty) = type_ident(&pt.ty) {
                        self.bindings.insert(pi.ident.to_string(), ty);
                    }
                }
            }
            Pat::Ident(pi) => {
                if let Some(init) = &local.init {
                    if let Some(ty) = Self::infer_expr_type(&init.expr, symbols) {
                        self.bindings.insert(pi.ident.to_string(), ty);
                    }
                }
            }
            _ => {}
        }
    }

    fn infer_expr_type(expr: &Expr, symbols: &SymbolIndex) -> Option<String> {
        match expr {
            Expr::Struct(es) => es.path.segments.last().map(|seg| seg.ident.to_string()),
            Expr::Reference(r) => Self::infer_expr_type(&r.expr, symbols),
            Expr::Call(call) => {
                let Expr::Path(path) = &*call.func else {
                    return None;
                };
                let segments = &path.path.segments;
                if segments.len() < 2 {
                    return None;
                }
                let ty = segments[segments.len() - 2].ident.to_string();
                let method = segments.last()?.ident.to_string();
                if let Some(sig) = symbols.method(&ty, &method) {
                    // `Self` returns were reduced to the impl type at index time.
                    if sig.return_type == ty {
                        return Some(ty);
                    }
                    if symbols.has_type(&sig.return_type) {
                        return Some(sig.return_type);
                    }
                    return None;
                }
                // Unindexed type: assume a constructor-style call.
                if ty.chars().next().is_some_and(char::is_uppercase) {
                    return Some(ty);
                }
                None
            }
            _ => None,
        }
    }
}

/// Resolver for one method body.
pub struct CallResolver<'a> {
    pub symbols: &'a SymbolIndex,
    pub caller_type: &'a str,
    pub crate_name: &'a str,
}

impl CallResolver<'_> {
    /// `recv.m(args)`: `self` is a same-type call; a bare identifier typed
    /// through the scope is a cross-type call; anything else declines.
    pub fn resolve_method_call(
        &self,
        scope: &LocalScope,
        call: &syn::ExprMethodCall,
    ) -> Resolution {
        let member = call.method.to_string();
        let Some(receiver) = receiver_ident(&call.receiver) else {
            return Resolution::Unresolved;
        };
        if receiver == "self" {
            return self.same_type(member);
        }
        match scope.type_of(&receiver) {
            Some(target) => self.cross_type(target.to_string(), member),
            None => Resolution::Unresolved,
        }
    }

    /// `f(args)`, `Self::m(args)`, `Type::m(args)`: path calls. Variant and
    /// tuple-struct constructors (capitalized single segments) and module
    /// paths decline.
    pub fn resolve_path_call(&self, call: &syn::ExprCall) -> Resolution {
        let Expr::Path(path) = &*call.func else {
            return Resolution::Unresolved;
        };
        let segments = &path.path.segments;
        if segments.len() == 1 {
            let member = segments[0].ident.to_string();
            if member.chars().next().is_some_and(char::is_uppercase) {
                return Resolution::Unresolved;
            }
            return self.same_type(member);
        }
        let Some(last) = segments.last() else {
            return Resolution::Unresolved;
        };
        let member = last.ident.to_string();
        let qualifier = segments[segments.len() - 2].ident.to_string();
        if qualifier == "Self" || qualifier == self.caller_type {
            return self.same_type(member);
        }
        if qualifier.chars().next().is_some_and(char::is_uppercase) {
            return self.cross_type(qualifier, member);
        }
        Resolution::Unresolved
    }

    fn same_type(&self, member: String) -> Resolution {
        let ret = self
            .symbols
            .method(self.caller_type, &member)
            .map(|sig| sig.return_type)
            .or_else(|| {
                self.symbols
                    .free_function(self.crate_name, &member)
                    .map(|sig| sig.return_type)
            })
            .unwrap_or_else(|| "void".to_string());
        Resolution::SameType { member, ret }
    }

    fn cross_type(&self, target: String, member: String) -> Resolution {
        let ret = self
            .symbols
            .method(&target, &member)
            .map(|sig| sig.return_type)
            .unwrap_or_else(|| "void".to_string());
        Resolution::CrossType {
            target,
            member,
            ret,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ProgramModel, SourceFile};

    fn symbols_of(code: &str) -> SymbolIndex {
        let sources = vec![SourceFile::new("test_crate", "test.rs", code)];
        ProgramModel::build(&sources).symbols
    }

    fn method_call(src: &str) -> syn::ExprMethodCall {
        match syn::parse_str::<Expr>(src).unwrap() {
            Expr::MethodCall(call) => call,
            other => panic!("not a method call: {:?}", other),
        }
    }

    fn path_call(src: &str) -> syn::ExprCall {
        match syn::parse_str::<Expr>(src).unwrap() {
            Expr::Call(call) => call,
            other => panic!("not a call: {:?}", other),
        }
    }

    #[test]
    fn test_self_receiver_resolves_same_type() {
        let symbols = symbols_of(
            r#"
pub struct Foo;
impl Foo {
    pub fn bar(&self) -> String { String::new() }
}
"#,
        );
        let resolver = CallResolver {
            symbols: &symbols,
            caller_type: "Foo",
            crate_name: "test_crate",
        };
        let resolution =
            resolver.resolve_method_call(&LocalScope::default(), &method_call("self.bar()"));
        assert_eq!(
            resolution,
            Resolution::SameType {
                member: "bar".to_string(),
                ret: "String".to_string()
            }
        );
    }

    #[test]
    fn test_scope_typed_receiver_resolves_cross_type() {
        let symbols = symbols_of(
            r#"
pub struct Helper;
impl Helper { pub fn compute(&self) -> u32 { 42 } }
"#,
        );
        let method: syn::ImplItemFn = syn::parse_str("fn run(&self, helper: Helper) {}").unwrap();
        let scope = LocalScope::from_signature(&method.sig);
        let resolver = CallResolver {
            symbols: &symbols,
            caller_type: "Engine",
            crate_name: "test_crate",
        };
        let resolution = resolver.resolve_method_call(&scope, &method_call("helper.compute()"));
        assert_eq!(
            resolution,
            Resolution::CrossType {
                target: "Helper".to_string(),
                member: "compute".to_string(),
                ret: "u32".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_receiver_declines() {
        let symbols = symbols_of("pub struct Foo;");
        let resolver = CallResolver {
            symbols: &symbols,
            caller_type: "Foo",
            crate_name: "test_crate",
        };
        assert_eq!(
            resolver.resolve_method_call(&LocalScope::default(), &method_call("mystery.go()")),
            Resolution::Unresolved
        );
    }

    #[test]
    fn test_chained_receiver_declines() {
        let symbols = symbols_of("pub struct Foo;");
        let resolver = CallResolver {
            symbols: &symbols,
            caller_type: "Foo",
            crate_name: "test_crate",
        };
        assert_eq!(
            resolver.resolve_method_call(
                &LocalScope::default(),
                &method_call("self.items.push(1)")
            ),
            Resolution::Unresolved
        );
    }

    #[test]
    fn test_bare_call_is_same_type_with_free_function_return() {
        let symbols = symbols_of("pub fn helper() -> bool { true }");
        let resolver = CallResolver {
            symbols: &symbols,
            caller_type: "Foo",
            crate_name: "test_crate",
        };
        assert_eq!(
            resolver.resolve_path_call(&path_call("helper()")),
            Resolution::SameType {
                member: "helper".to_string(),
                ret: "bool".to_string()
            }
        );
    }

    #[test]
    fn test_variant_constructor_declines() {
        let symbols = symbols_of("pub struct Foo;");
        let resolver = CallResolver {
            symbols: &symbols,
            caller_type: "Foo",
            crate_name: "test_crate",
        };
        assert_eq!(
            resolver.resolve_path_call(&path_call("Some(1)")),
            Resolution::Unresolved
        );
    }

    #[test]
    fn test_self_qualified_path_is_same_type() {
        let symbols = symbols_of(
            r#"
pub struct Foo;
impl Foo { fn helper() -> u8 { 0 } }
"#,
        );
        let resolver = CallResolver {
            symbols: &symbols,
            caller_type: "Foo",
            crate_name: "test_crate",
        };
        assert_eq!(
            resolver.resolve_path_call(&path_call("Self::helper()")),
            Resolution::SameType {
                member: "helper".to_string(),
                ret: "u8".to_string()
            }
        );
    }

    #[test]
    fn test_module_path_declines() {
        let symbols = symbols_of("pub struct Foo;");
        let resolver = CallResolver {
            symbols: &symbols,
            caller_type: "Foo",
            crate_name: "test_crate",
        };
        assert_eq!(
            resolver.resolve_path_call(&path_call("std::mem::take(x)")),
            Resolution::Unresolved
        );
    }

    #[test]
    fn test_let_binding_via_constructor_call() {
        let symbols = symbols_of(
            r#"
pub struct Builder;
impl Builder { pub fn create() -> Self { Builder } }
"#,
        );
        let mut scope = LocalScope::default();
        let stmt: syn::Stmt = syn::parse_str("let b = Builder::create();").unwrap();
        if let syn::Stmt::Local(local) = stmt {
            scope.bind_local(&local, &symbols);
        }
        assert_eq!(scope.type_of("b"), Some("Builder"));
    }

    #[test]
    fn test_let_binding_with_annotation() {
        let symbols = symbols_of("pub struct Foo;");
        let mut scope = LocalScope::default();
        let stmt: syn::Stmt = syn::parse_str("let h: Helper = make();").unwrap();
        if let syn::Stmt::Local(local) = stmt {
            scope.bind_local(&local, &symbols);
        }
        assert_eq!(scope.type_of("h"), Some("Helper"));
    }

    #[test]
    fn test_let_binding_struct_literal() {
        let symbols = symbols_of("pub struct Foo;");
        let mut scope = LocalScope::default();
        let stmt: syn::Stmt = syn::parse_str("let w = Widget { id: 1 };").unwrap();
        if let syn::Stmt::Local(local) = stmt {
            scope.bind_local(&local, &symbols);
        }
        assert_eq!(scope.type_of("w"), Some("Widget"));
    }
}
