//! pigment-interop: generator for Pigment's native binding units
//!
//! Turns one [`ClassDescriptor`] into one Rust source unit containing:
//! - three gated modules of raw foreign declarations (one per architecture)
//! - the wrapper type and its orchestrating operation methods
//! - lifecycle members (construction from a raw handle, disposal dispatch)
//! - an optional managed-to-native bridge factory
//!
//! Generation is a pure function of the descriptor; independent classes can
//! be generated in parallel with no shared state.
//!
//! ```ignore
//! let descriptor: ClassDescriptor = serde_json::from_str(json)?;
//! let unit = pigment_interop::generate_unit(&descriptor)?;
//! std::fs::write(out_dir.join(format!("{}.rs", unit.module_name)), unit.source)?;
//! ```

use proc_macro2::TokenStream;
use quote::quote;

mod bridge;
pub mod descriptor;
mod error;
mod externs;
mod lifecycle;
mod methods;
mod platform;

pub use descriptor::{
    ClassDescriptor, CleanupDescriptor, DescriptorError, Direction, MethodDescriptor,
    ParameterDescriptor, TypeKind, Visibility,
};
pub use error::GenerateError;

use descriptor::snake_case;

/// One generated source unit.
#[derive(Debug, Clone)]
pub struct GeneratedUnit {
    /// Managed class the unit wraps.
    pub class_name: String,
    /// Module (and file stem) the unit should live under.
    pub module_name: String,
    /// Rendered Rust source.
    pub source: String,
}

/// Generates the interop unit for one described class.
pub fn generate_unit(class: &ClassDescriptor) -> Result<GeneratedUnit, GenerateError> {
    class.validate()?;
    log::debug!("generating interop unit for `{}`", class.name);

    let aliases = emit_aliases(class);
    let foreign = externs::emit_foreign_modules(class);
    let wrapper = lifecycle::emit_struct(class);
    let constructor = lifecycle::emit_constructor(class);
    let operations = methods::emit_wrapper_methods(class)?;
    let static_dispose = lifecycle::emit_static_dispose(class);
    let bridge = bridge::emit_bridge_factory(class);
    let resource = lifecycle::emit_resource_impl(class);
    let name = lifecycle::wrapper_ident(class);

    let tokens = quote! {
        use pigment_sdk::prelude::*;
        #[allow(unused_imports)]
        use std::os::raw::c_char;
        #[allow(unused_imports)]
        use super::*;

        #aliases
        #foreign
        #wrapper

        impl #name {
            #constructor
            #operations
            #static_dispose
            #bridge
        }

        #resource
    };

    let header = format!(
        "// Generated by pigment-bindgen for `{}::{}`. Do not edit.\n",
        class.namespace, class.name
    );
    Ok(GeneratedUnit {
        class_name: class.name.clone(),
        module_name: format!("native_{}", snake_case(&class.name)),
        source: format!("{header}\n{tokens}\n"),
    })
}

/// Build-selected type aliases the declarations refer to.
fn emit_aliases(class: &ClassDescriptor) -> TokenStream {
    let quantum = class.uses_quantum.then(|| {
        quote! {
            #[cfg(feature = "quantum-8")]
            type Quantum = u8;
            #[cfg(feature = "quantum-16")]
            type Quantum = u16;
            #[cfg(feature = "quantum-16-hdri")]
            type Quantum = f32;
        }
    });
    let channels = class.uses_channels.then(|| {
        quote! {
            #[cfg(any(feature = "platform-x86", feature = "platform-any"))]
            type RawChannels = u32;
            #[cfg(not(any(feature = "platform-x86", feature = "platform-any")))]
            type RawChannels = usize;
        }
    });
    quote! {
        #quantum
        #channels
    }
}
