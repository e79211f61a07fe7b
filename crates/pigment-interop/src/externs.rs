//! Foreign declaration emitter.
//!
//! Emits one gated module per architecture variant, each linking that
//! architecture's native binary and declaring the same entry-point
//! signatures; only the selected binary differs. Identically named
//! overloads collapse to the first declaration.

use std::collections::HashSet;

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;

use crate::descriptor::{
    ClassDescriptor, Direction, MethodDescriptor, ParameterDescriptor, TypeKind,
};
use crate::platform::{reduced_runtime_gate, Arch};

/// All three architecture modules for a class.
pub(crate) fn emit_foreign_modules(class: &ClassDescriptor) -> TokenStream {
    let modules = Arch::ALL.iter().map(|&arch| emit_arch_module(class, arch));
    quote! { #(#modules)* }
}

fn emit_arch_module(class: &ClassDescriptor, arch: Arch) -> TokenStream {
    let gate = arch.gate();
    let module = arch.module_ident();
    let library = arch.library();
    let declarations = declarations(class);
    quote! {
        #gate
        #[allow(non_snake_case, dead_code)]
        mod #module {
            use super::*;

            #[link(name = #library)]
            extern "C" {
                #(#declarations)*
            }
        }
    }
}

fn declarations(class: &ClassDescriptor) -> Vec<TokenStream> {
    let mut out = Vec::new();
    if class.has_dispose {
        let dispose = entry_ident(class, "Dispose");
        out.push(quote! { pub(crate) fn #dispose(instance: RawHandle); });
    }

    let mut seen = HashSet::new();
    for method in &class.methods {
        if !seen.insert(method.entry_point_name()) {
            continue;
        }
        out.push(declaration(class, method));
    }
    out
}

fn declaration(class: &ClassDescriptor, method: &MethodDescriptor) -> TokenStream {
    let name = entry_ident(class, &method.entry_point_name());
    let use_instance = class.has_instance && method.uses_instance;

    let mut args = Vec::new();
    if use_instance {
        args.push(quote!(instance: RawHandle));
    }
    for parameter in &method.parameters {
        args.push(native_parameter(parameter));
    }
    if method.throws {
        args.push(quote!(exception: *mut RawExceptionHandle));
    }

    let output = native_return(method);
    let gate = method.restricted.then(reduced_runtime_gate);
    quote! { #gate pub(crate) fn #name(#(#args),*) #output; }
}

fn native_parameter(parameter: &ParameterDescriptor) -> TokenStream {
    let name = ident(&parameter.name);
    let out = parameter.direction == Direction::Out;
    match &parameter.kind {
        TypeKind::Primitive { name: ty } => {
            let ty = ident(ty);
            if out {
                quote!(#name: *mut #ty)
            } else {
                quote!(#name: #ty)
            }
        }
        TypeKind::Enum { .. } => {
            if out {
                quote!(#name: *mut usize)
            } else {
                quote!(#name: usize)
            }
        }
        TypeKind::Text => quote!(#name: *const c_char),
        // Output instances pass the pre-built empty representation's raw
        // handle by value; the native side fills its interior.
        TypeKind::Instance { .. } => quote!(#name: RawHandle),
        TypeKind::FixedBuffer { element } => {
            let element = ident(element);
            if out {
                quote!(#name: *mut #element)
            } else {
                quote!(#name: *const #element)
            }
        }
        TypeKind::ChannelSet => quote!(#name: RawChannels),
        TypeKind::Unit => unreachable!("rejected by descriptor validation"),
    }
}

fn native_return(method: &MethodDescriptor) -> TokenStream {
    if method.sets_instance {
        return quote!(-> RawHandle);
    }
    match &method.returns {
        TypeKind::Unit => TokenStream::new(),
        TypeKind::Primitive { name } => {
            let ty = ident(name);
            quote!(-> #ty)
        }
        TypeKind::Enum { .. } => quote!(-> usize),
        TypeKind::Text => quote!(-> *mut c_char),
        TypeKind::Instance { .. } => quote!(-> RawHandle),
        TypeKind::ChannelSet => quote!(-> RawChannels),
        TypeKind::FixedBuffer { .. } => unreachable!("rejected by descriptor validation"),
    }
}

pub(crate) fn entry_ident(class: &ClassDescriptor, suffix: &str) -> Ident {
    Ident::new(&format!("{}_{}", class.name, suffix), Span::call_site())
}

pub(crate) fn ident(name: &str) -> Ident {
    Ident::new(name, Span::call_site())
}
