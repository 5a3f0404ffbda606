//! Source Model
//!
//! Discovered sources plus the two up-front whole-program indices.
//! Everything downstream (resolver, walker) reads this model; nothing
//! mutates it after `build`.
//!
//! Parsed syntax trees are not part of the model: syn ASTs cannot cross
//! thread boundaries, so each pass parses inside its own worker and only
//! plain data reaches the shared tables.

use crate::domain::caller_index::CallerIndex;
use crate::domain::index::SymbolIndex;

/// One source file as discovered by a loader, attributed to a crate.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub crate_name: String,
    pub path: String,
    pub code: String,
}

impl SourceFile {
    pub fn new(crate_name: &str, path: &str, code: &str) -> Self {
        Self {
            crate_name: crate_name.to_string(),
            path: path.to_string(),
            code: code.to_string(),
        }
    }
}

/// A parsed compilation unit. Lives within one worker for the duration of
/// one pass.
pub struct CompilationUnit {
    pub crate_name: String,
    pub path: String,
    pub ast: syn::File,
}

impl CompilationUnit {
    /// Parse one source file; `None` for files syn cannot handle.
    pub fn parse(source: &SourceFile) -> Option<CompilationUnit> {
        syn::parse_file(&source.code)
            .ok()
            .map(|ast| CompilationUnit {
                crate_name: source.crate_name.clone(),
                path: source.path.clone(),
                ast,
            })
    }
}

/// Whole-program source model.
///
/// The symbol and caller indices are computed once, before any traversal,
/// and are read-only for the rest of the run. Sources are independent of
/// each other once the indices exist, which is what allows the walker to
/// process them in parallel.
pub struct ProgramModel {
    pub sources: Vec<SourceFile>,
    pub symbols: SymbolIndex,
    pub callers: CallerIndex,
}

impl ProgramModel {
    /// Build both indices over the given sources. Files that fail to parse
    /// are reported (once, by the symbol pass) and contribute neither
    /// symbols nor calls.
    pub fn build(sources: &[SourceFile]) -> Self {
        let symbols = SymbolIndex::build(sources);
        let callers = CallerIndex::build(sources, &symbols);

        ProgramModel {
            sources: sources.to_vec(),
            symbols,
            callers,
        }
    }
}

/// Last-segment identifier of a type, looking through references and
/// grouping. Used for receiver/binding types; `None` for shapes that do not
/// name a type (tuples, slices, trait objects, ...).
pub fn type_ident(ty: &syn::Type) -> Option<String> {
    match ty {
        syn::Type::Path(tp) => tp.path.segments.last().map(|seg| seg.ident.to_string()),
        syn::Type::Reference(r) => type_ident(&r.elem),
        syn::Type::Paren(p) => type_ident(&p.elem),
        syn::Type::Group(g) => type_ident(&g.elem),
        _ => None,
    }
}

/// Rendered name of a declared return type: the simple (last-segment) name,
/// `void` when nothing is returned, with `Self` resolved to the impl type.
pub fn return_type_name(output: &syn::ReturnType, self_ty: &str) -> String {
    match output {
        syn::ReturnType::Default => "void".to_string(),
        syn::ReturnType::Type(_, ty) => simple_type_name(ty, self_ty),
    }
}

fn simple_type_name(ty: &syn::Type, self_ty: &str) -> String {
    match ty {
        syn::Type::Path(tp) => {
            let name = tp
                .path
                .segments
                .last()
                .map(|seg| seg.ident.to_string())
                .unwrap_or_else(|| "value".to_string());
            if name == "Self" && !self_ty.is_empty() {
                self_ty.to_string()
            } else {
                name
            }
        }
        syn::Type::Reference(r) => simple_type_name(&r.elem, self_ty),
        syn::Type::Paren(p) => simple_type_name(&p.elem, self_ty),
        syn::Type::Group(g) => simple_type_name(&g.elem, self_ty),
        syn::Type::Ptr(p) => simple_type_name(&p.elem, self_ty),
        syn::Type::Slice(s) => simple_type_name(&s.elem, self_ty),
        syn::Type::Array(a) => simple_type_name(&a.elem, self_ty),
        syn::Type::Tuple(t) if t.elems.is_empty() => "void".to_string(),
        syn::Type::Tuple(_) => "tuple".to_string(),
        syn::Type::ImplTrait(it) => first_bound_name(&it.bounds),
        syn::Type::TraitObject(to) => first_bound_name(&to.bounds),
        _ => "value".to_string(),
    }
}

fn first_bound_name(
    bounds: &syn::punctuated::Punctuated<syn::TypeParamBound, syn::token::Plus>,
) -> String {
    bounds
        .iter()
        .find_map(|bound| match bound {
            syn::TypeParamBound::Trait(t) => {
                t.path.segments.last().map(|seg| seg.ident.to_string())
            }
            _ => None,
        })
        .unwrap_or_else(|| "value".to_string())
}
