//! Bridge factory emitter: managed-side polymorphic value to owned native
//! handle.

use proc_macro2::TokenStream;
use quote::quote;

use crate::descriptor::{ClassDescriptor, Visibility};
use crate::externs::ident;

/// The factory translating an optional capability-interface value into a
/// scoped native handle. Absence yields the null sentinel.
pub(crate) fn emit_bridge_factory(class: &ClassDescriptor) -> TokenStream {
    if !class.bridge {
        return TokenStream::new();
    }
    let Some(interface) = &class.interface else {
        return TokenStream::new();
    };

    let interface = ident(interface);
    let conversion = match class.visibility {
        // A crate-visible class is its own only implementer; convert
        // through the value directly.
        Visibility::Crate => quote!(value.to_native_scoped()),
        // Public classes may have external implementers; delegate to the
        // class's own conversion routine.
        Visibility::Public => {
            let class = ident(&class.name);
            quote!(#class::to_native_scoped(value))
        }
    };

    quote! {
        /// Borrows `value`'s native representation for the duration of a
        /// call, or passes the null sentinel when absent.
        pub(crate) fn to_native(
            value: Option<&dyn #interface>,
        ) -> Result<ScopedInstance, PigmentError> {
            runtime::ensure_initialized();
            match value {
                Some(value) => #conversion,
                None => Ok(ScopedInstance::zero()),
            }
        }
    }
}
