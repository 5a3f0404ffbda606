use dashmap::DashMap;
use rayon::prelude::*;
use syn::{ImplItem, Item, Visibility};

use crate::domain::model::{return_type_name, type_ident, SourceFile};

/// Declared signature of a method or free function.
#[derive(Debug, Clone)]
pub struct MethodSignature {
    pub name: String,
    pub is_public: bool,
    pub receiver: Option<String>, // "&self", "self", or None for associated
    pub return_type: String,      // simple name, "void" when absent
    pub location: String,         // file:line
    pub crate_name: String,
}

/// Thread-safe symbol index using DashMap for concurrent access.
/// Built once, in parallel over compilation units, then read-only.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    // Key: declared type name -> declaring crate
    types: DashMap<String, String>,

    // Key: (TypeName, MethodName)
    type_methods: DashMap<(String, String), MethodSignature>,

    // Key: (crate, fn)
    free_functions: DashMap<(String, String), MethodSignature>,

    // Acceleration map: MethodName -> Vec<(TypeName, MethodName)>
    method_lookup: DashMap<String, Vec<(String, String)>>,
}

impl SymbolIndex {
    /// Build the symbol index from source files in parallel. Each worker
    /// parses its own file; the AST never leaves the worker.
    pub fn build(sources: &[SourceFile]) -> Self {
        let index = SymbolIndex::default();

        sources.par_iter().for_each(|src| match syn::parse_file(&src.code) {
            Ok(ast) => {
                index.index_items(&src.crate_name, &src.path, &ast.items);
            }
            Err(e) => {
                eprintln!("[seqcraft] WARN: failed to parse {}: {}", src.path, e);
            }
        });

        index
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Returns a cloned signature to avoid holding DashMap locks.
    pub fn method(&self, type_name: &str, method: &str) -> Option<MethodSignature> {
        self.type_methods
            .get(&(type_name.to_string(), method.to_string()))
            .map(|r| r.clone())
    }

    pub fn free_function(&self, crate_name: &str, name: &str) -> Option<MethodSignature> {
        self.free_functions
            .get(&(crate_name.to_string(), name.to_string()))
            .map(|r| r.clone())
    }

    /// All (type, method) keys sharing a method name, for conservative
    /// resolution of calls whose receiver could not be typed.
    pub fn methods_named(&self, method_name: &str) -> Vec<(String, String)> {
        self.method_lookup
            .get(method_name)
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn method_count(&self) -> usize {
        self.type_methods.len()
    }

    /// Index all items in a list (recursive for nested modules).
    fn index_items(&self, crate_name: &str, file_path: &str, items: &[Item]) {
        for item in items {
            match item {
                Item::Struct(s) => {
                    self.types.insert(s.ident.to_string(), crate_name.to_string());
                }
                Item::Enum(e) => {
                    self.types.insert(e.ident.to_string(), crate_name.to_string());
                }
                Item::Fn(func) => {
                    let name = func.sig.ident.to_string();
                    let line = func.sig.ident.span().start().line;

                    let sig = MethodSignature {
                        name: name.clone(),
                        is_public: matches!(func.vis, Visibility::Public(_)),
                        receiver: None,
                        return_type: return_type_name(&func.sig.output, ""),
                        location: format!("{}:{}", file_path, line),
                        crate_name: crate_name.to_string(),
                    };
                    self.free_functions
                        .insert((crate_name.to_string(), name), sig);
                }
                Item::Impl(imp) => {
                    let Some(type_name) = type_ident(&imp.self_ty) else {
                        continue;
                    };
                    self.types
                        .entry(type_name.clone())
                        .or_insert_with(|| crate_name.to_string());

                    for impl_item in &imp.items {
                        if let ImplItem::Fn(method) = impl_item {
                            let method_name = method.sig.ident.to_string();
                            let line = method.sig.ident.span().start().line;

                            let receiver = method.sig.inputs.first().and_then(|arg| match arg {
                                syn::FnArg::Receiver(r) => {
                                    if r.reference.is_some() {
                                        Some("&self".to_string())
                                    } else {
                                        Some("self".to_string())
                                    }
                                }
                                _ => None,
                            });

                            let sig = MethodSignature {
                                name: method_name.clone(),
                                is_public: matches!(method.vis, Visibility::Public(_)),
                                receiver,
                                return_type: return_type_name(&method.sig.output, &type_name),
                                location: format!("{}:{}", file_path, line),
                                crate_name: crate_name.to_string(),
                            };

                            let key = (type_name.clone(), method_name.clone());
                            self.type_methods.insert(key.clone(), sig);

                            // Thread-safe append to method_lookup
                            self.method_lookup
                                .entry(method_name)
                                .or_default()
                                .push(key);
                        }
                    }
                }
                Item::Mod(module) => {
                    // Recurse into inline modules
                    if let Some((_, content)) = &module.content {
                        self.index_items(crate_name, file_path, content);
                    }
                }
                _ => {}
            }
        }
    }
}
