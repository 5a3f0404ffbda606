//! Entry Point Rules
//!
//! A method is an entry point when the caller index knows no call site for
//! it. Constructors never qualify, and trait-impl methods are handled
//! conservatively by the walker (dynamic dispatch makes direct-caller
//! search unreliable).

use syn::{FnArg, ReturnType, Signature};

use crate::domain::model::type_ident;

/// Diagram title: `{crate}_{type}_{method}`, unique per triple.
pub fn diagram_title(crate_name: &str, type_name: &str, method: &str) -> String {
    format!("{}_{}_{}", crate_name, type_name, method)
}

/// Constructor shape: an associated function (no receiver) named `new`, or
/// one whose declared return type is `Self` / the impl type itself.
pub fn is_constructor(sig: &Signature, self_ty: &str) -> bool {
    if matches!(sig.inputs.first(), Some(FnArg::Receiver(_))) {
        return false;
    }
    if sig.ident == "new" {
        return true;
    }
    match &sig.output {
        ReturnType::Type(_, ty) => {
            let name = type_ident(ty);
            name.as_deref() == Some("Self") || name.as_deref() == Some(self_ty)
        }
        ReturnType::Default => false,
    }
}
