//! Lifecycle emitter: wrapper type, construction from a raw handle, and
//! the disposal dispatch.

use proc_macro2::TokenStream;
use quote::quote;

use crate::descriptor::{ClassDescriptor, Visibility};
use crate::externs::{entry_ident, ident};
use crate::platform::{single_arch_fallback_gate, Arch};

pub(crate) fn visibility(class: &ClassDescriptor) -> TokenStream {
    match class.visibility {
        Visibility::Public => quote!(pub),
        Visibility::Crate => quote!(pub(crate)),
    }
}

pub(crate) fn wrapper_ident(class: &ClassDescriptor) -> proc_macro2::Ident {
    ident(&format!("Native{}", class.name))
}

/// The wrapper struct itself.
pub(crate) fn emit_struct(class: &ClassDescriptor) -> TokenStream {
    let vis = visibility(class);
    let name = wrapper_ident(class);
    if !class.has_instance {
        return quote! {
            #[derive(Debug)]
            #vis struct #name;
        };
    }

    let warnings = class.raises_warnings.then(|| quote! { warnings: WarningChannel, });
    quote! {
        #[derive(Debug)]
        #vis struct #name {
            instance: HandleCell,
            #warnings
        }
    }
}

/// Constructor from an owned raw handle, plus the warning subscription
/// surface when the class raises warnings.
pub(crate) fn emit_constructor(class: &ClassDescriptor) -> TokenStream {
    if !class.has_instance {
        return TokenStream::new();
    }

    let warnings_init = class
        .raises_warnings
        .then(|| quote! { warnings: WarningChannel::new(), });
    let subscribe = class.raises_warnings.then(|| {
        quote! {
            /// Registers a handler for non-fatal diagnostics raised by
            /// this wrapper's operations.
            pub fn on_warning(&self, handler: WarningHandler) {
                self.warnings.subscribe(handler);
            }
        }
    });

    quote! {
        /// Takes ownership of a native handle produced by the library.
        pub fn from_raw(instance: RawHandle) -> Self {
            runtime::ensure_initialized();
            Self {
                instance: HandleCell::new(instance),
                #warnings_init
            }
        }

        #subscribe
    }
}

/// Process-wide disposal entry point, usable without an owning wrapper.
pub(crate) fn emit_static_dispose(class: &ClassDescriptor) -> TokenStream {
    if !class.has_static_dispose {
        return TokenStream::new();
    }
    quote! {
        /// Releases a handle that never reached an owning wrapper.
        pub fn dispose_raw(instance: RawHandle) {
            <Self as NativeResource>::release(instance);
        }
    }
}

/// The owning-wrapper contract: diagnostics name, the handle cell, and the
/// per-architecture release dispatch.
pub(crate) fn emit_resource_impl(class: &ClassDescriptor) -> TokenStream {
    if !class.has_instance {
        return TokenStream::new();
    }

    let name = wrapper_ident(class);
    let type_name = &class.name;
    let release = if class.has_dispose {
        let arms = Arch::ALL.iter().map(|&arch| {
            let gate = arch.gate();
            let variant = arch.runtime_variant();
            let module = arch.module_ident();
            let dispose = entry_ident(class, "Dispose");
            quote! { #gate #variant => unsafe { #module::#dispose(instance) }, }
        });
        let fallback_gate = single_arch_fallback_gate();
        quote! {
            fn release(instance: RawHandle) {
                match runtime::architecture() {
                    #(#arms)*
                    #fallback_gate
                    _ => unreachable!("build does not include the detected architecture"),
                }
            }
        }
    } else {
        quote! {
            fn release(_instance: RawHandle) {}
        }
    };

    quote! {
        impl NativeResource for #name {
            fn type_name(&self) -> &'static str {
                #type_name
            }

            fn cell(&self) -> &HandleCell {
                &self.instance
            }

            #release
        }
    }
}
