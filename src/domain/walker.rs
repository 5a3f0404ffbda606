//! Diagram Walker
//!
//! Orchestrates the whole traversal: iterates compilation units, decides
//! entry points, opens/finalizes diagrams, and dispatches each node kind to
//! the grouper or the resolver. Dispatch is a match over `syn::Expr` with a
//! structural default through `syn::visit`.

use std::fmt;

use rayon::prelude::*;
use syn::visit::{self, Visit};
use syn::{Expr, ImplItem, ImplItemFn, Item, ItemFn, ItemImpl};

use crate::domain::buffer::{indent_of, CommandBuffer};
use crate::domain::entry_point::{diagram_title, is_constructor};
use crate::domain::model::{type_ident, CompilationUnit, ProgramModel};
use crate::domain::resolver::{CallResolver, LocalScope, Resolution};
use crate::domain::store::DiagramStore;

/// Control-flow kinds rendered as `group <kind>` brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    If,
    For,
    While,
    Loop,
    Match,
}

impl GroupKind {
    pub fn label(self) -> &'static str {
        match self {
            GroupKind::If => "if",
            GroupKind::For => "for",
            GroupKind::While => "while",
            GroupKind::Loop => "loop",
            GroupKind::Match => "match",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Whole-program diagram traversal.
pub struct DiagramWalker;

impl DiagramWalker {
    /// Walk every compilation unit and return the finalized diagram store.
    /// Units are independent once the indices are built, so they are walked
    /// in parallel with worker-local stores merged at the end. Each worker
    /// re-parses its file; only line buffers cross thread boundaries.
    pub fn process(model: &ProgramModel) -> DiagramStore {
        model
            .sources
            .par_iter()
            .map(|src| {
                let mut store = DiagramStore::default();
                if let Some(unit) = CompilationUnit::parse(src) {
                    Self::walk_items(model, &unit, &unit.ast.items, &mut store);
                }
                store
            })
            .reduce(DiagramStore::default, |mut merged, store| {
                merged.merge(store);
                merged
            })
    }

    fn walk_items(
        model: &ProgramModel,
        unit: &CompilationUnit,
        items: &[Item],
        store: &mut DiagramStore,
    ) {
        for item in items {
            match item {
                Item::Impl(imp) => Self::walk_impl(model, unit, imp, store),
                Item::Fn(func) => Self::walk_free_fn(model, unit, func),
                Item::Mod(module) => {
                    if let Some((_, content)) = &module.content {
                        Self::walk_items(model, unit, content, store);
                    }
                }
                _ => {}
            }
        }
    }

    fn walk_impl(
        model: &ProgramModel,
        unit: &CompilationUnit,
        imp: &ItemImpl,
        store: &mut DiagramStore,
    ) {
        let Some(type_name) = type_ident(&imp.self_ty) else {
            eprintln!(
                "[seqcraft] WARN: skipping impl with unresolvable self type in {}",
                unit.path
            );
            return;
        };
        let in_trait_impl = imp.trait_.is_some();

        for item in &imp.items {
            let ImplItem::Fn(method) = item else { continue };
            let method_name = method.sig.ident.to_string();

            let suppressed = in_trait_impl
                || is_constructor(&method.sig, &type_name)
                || model.callers.has_callers(&type_name, &method_name);
            if suppressed {
                Self::walk_suppressed(model, unit, &type_name, method);
                continue;
            }

            let title = diagram_title(&unit.crate_name, &type_name, &method_name);
            {
                let buf = store.begin_or_reuse(&title);
                if buf.is_empty() {
                    // Header block, written as one unit. finalize() keys its
                    // survival threshold off these four lines.
                    buf.push_line("@startuml");
                    buf.push_line(format!("title {}", title));
                    buf.push_line("autoactivate on");
                    buf.push_line("hide footbox");
                }
                let mut visitor = MethodVisitor {
                    model,
                    caller_type: &type_name,
                    crate_name: &unit.crate_name,
                    scope: LocalScope::from_signature(&method.sig),
                    buf,
                    indent: 0,
                    suppressed: false,
                };
                visitor.visit_block(&method.block);
            }
            store.finalize(&title);
        }
    }

    /// Descend without emitting: non-entry-point methods, constructors, and
    /// trait-impl methods.
    fn walk_suppressed(
        model: &ProgramModel,
        unit: &CompilationUnit,
        type_name: &str,
        method: &ImplItemFn,
    ) {
        let mut scratch = CommandBuffer::default();
        let mut visitor = MethodVisitor {
            model,
            caller_type: type_name,
            crate_name: &unit.crate_name,
            scope: LocalScope::from_signature(&method.sig),
            buf: &mut scratch,
            indent: 0,
            suppressed: true,
        };
        visitor.visit_block(&method.block);
        debug_assert!(scratch.is_empty(), "suppressed visit must not emit");
    }

    /// Free functions carry no declaring type, so they never open diagrams.
    fn walk_free_fn(model: &ProgramModel, unit: &CompilationUnit, func: &ItemFn) {
        let mut scratch = CommandBuffer::default();
        let mut visitor = MethodVisitor {
            model,
            caller_type: "",
            crate_name: &unit.crate_name,
            scope: LocalScope::from_signature(&func.sig),
            buf: &mut scratch,
            indent: 0,
            suppressed: true,
        };
        visitor.visit_block(&func.block);
    }
}

/// Recursive visitor over one method body. Indent and suppression are
/// restored on every exit path; the helpers below only ever adjust them in
/// balanced pairs.
struct MethodVisitor<'a> {
    model: &'a ProgramModel,
    caller_type: &'a str,
    crate_name: &'a str,
    scope: LocalScope,
    buf: &'a mut CommandBuffer,
    indent: usize,
    suppressed: bool,
}

impl MethodVisitor<'_> {
    fn resolver(&self) -> CallResolver<'_> {
        CallResolver {
            symbols: &self.model.symbols,
            caller_type: self.caller_type,
            crate_name: self.crate_name,
        }
    }

    /// Bracket the node's rendered body in `group <kind>` ... `end`,
    /// collapsing to nothing when the body contributed zero lines.
    fn grouped<'ast>(&mut self, kind: GroupKind, expr: &'ast Expr) {
        if self.suppressed {
            visit::visit_expr(self, expr);
            return;
        }
        let opening = format!("{}group {}", indent_of(self.indent), kind);
        self.buf.push_line(opening.clone());
        self.indent += 1;
        visit::visit_expr(self, expr);
        self.indent -= 1;
        if !self.buf.retract_if_last(&opening) {
            self.buf.push_line(format!("{}end", indent_of(self.indent)));
        }
    }

    /// Call line, then argument sub-expressions (nested calls land between
    /// the pair, at the same indent), then the return line.
    fn emit_edge<'ast>(
        &mut self,
        target: &str,
        member: &str,
        ret: &str,
        args: impl IntoIterator<Item = &'ast Expr>,
    ) {
        let ind = indent_of(self.indent);
        if !self.suppressed {
            self.buf
                .push_line(format!("{}{} -> {}: {}", ind, self.caller_type, target, member));
        }
        for arg in args {
            self.visit_expr(arg);
        }
        if !self.suppressed {
            self.buf
                .push_line(format!("{}{} --> {}: {}", ind, target, self.caller_type, ret));
        }
    }

    fn handle_method_call<'ast>(&mut self, call: &'ast syn::ExprMethodCall) {
        match self.resolver().resolve_method_call(&self.scope, call) {
            Resolution::SameType { member, ret } => {
                self.emit_edge(self.caller_type, &member, &ret, &call.args);
            }
            Resolution::CrossType {
                target,
                member,
                ret,
            } => {
                self.emit_edge(&target, &member, &ret, &call.args);
            }
            Resolution::Unresolved => visit::visit_expr_method_call(self, call),
        }
    }

    fn handle_path_call<'ast>(&mut self, call: &'ast syn::ExprCall) {
        match self.resolver().resolve_path_call(call) {
            Resolution::SameType { member, ret } => {
                self.emit_edge(self.caller_type, &member, &ret, &call.args);
            }
            Resolution::CrossType {
                target,
                member,
                ret,
            } => {
                self.emit_edge(&target, &member, &ret, &call.args);
            }
            Resolution::Unresolved => visit::visit_expr_call(self, call),
        }
    }
}

impl<'ast> Visit<'ast> for MethodVisitor<'_> {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        match expr {
            Expr::If(_) => self.grouped(GroupKind::If, expr),
            Expr::ForLoop(_) => self.grouped(GroupKind::For, expr),
            Expr::While(_) => self.grouped(GroupKind::While, expr),
            Expr::Loop(_) => self.grouped(GroupKind::Loop, expr),
            Expr::Match(_) => self.grouped(GroupKind::Match, expr),
            Expr::MethodCall(call) => self.handle_method_call(call),
            Expr::Call(call) => self.handle_path_call(call),
            _ => visit::visit_expr(self, expr),
        }
    }

    fn visit_local(&mut self, local: &'ast syn::Local) {
        self.scope.bind_local(local, &self.model.symbols);
        visit::visit_local(self, local);
    }

    fn visit_item_fn(&mut self, func: &'ast ItemFn) {
        // A fn nested in the body runs when called, not here.
        let prev = self.suppressed;
        self.suppressed = true;
        visit::visit_item_fn(self, func);
        self.suppressed = prev;
    }
}
