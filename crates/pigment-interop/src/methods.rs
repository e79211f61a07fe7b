//! Wrapper method emitter.
//!
//! For each operation this produces the runtime orchestration: marshaling
//! prologue, the gated three-way architecture dispatch, error
//! classification with optional partial-resource cleanup, output-parameter
//! conversion, and result production.

use proc_macro2::TokenStream;
use quote::quote;

use crate::descriptor::{
    snake_case, ClassDescriptor, Direction, MethodDescriptor, ParameterDescriptor, TypeKind,
};
use crate::error::GenerateError;
use crate::externs::{entry_ident, ident};
use crate::platform::{reduced_runtime_gate, single_arch_fallback_gate, Arch};

/// Every wrapper method of the class, in declaration order.
pub(crate) fn emit_wrapper_methods(class: &ClassDescriptor) -> Result<TokenStream, GenerateError> {
    let mut methods = Vec::new();
    for method in &class.methods {
        methods.push(emit_method(class, method)?);
    }
    Ok(quote! { #(#methods)* })
}

fn emit_method(
    class: &ClassDescriptor,
    method: &MethodDescriptor,
) -> Result<TokenStream, GenerateError> {
    let name = ident(&method.name);
    let mut signature = Vec::new();
    if has_receiver(class, method) {
        if method.sets_instance {
            signature.push(quote!(&mut self));
        } else {
            signature.push(quote!(&self));
        }
    }
    for parameter in &method.parameters {
        signature.push(managed_parameter(parameter));
    }

    let output = wrapper_return(class, method);
    let body = emit_body(class, method)?;
    let gate = method.restricted.then(reduced_runtime_gate);

    Ok(quote! {
        #gate
        pub fn #name(#(#signature),*) #output {
            #(#body)*
        }
    })
}

fn has_receiver(class: &ClassDescriptor, method: &MethodDescriptor) -> bool {
    class.has_instance && !method.is_static
}

/// A wrapper is fallible when the call can report an error, when the
/// null-handle contract applies, or when building a parameter's native
/// representation can itself fail.
fn is_fallible(class: &ClassDescriptor, method: &MethodDescriptor) -> bool {
    method.throws
        || method.returns_own_class(class)
        || method
            .parameters
            .iter()
            .any(|p| matches!(p.kind, TypeKind::Instance { create: true, .. }))
}

fn managed_parameter(parameter: &ParameterDescriptor) -> TokenStream {
    let name = ident(&parameter.name);
    let out = parameter.direction == Direction::Out;
    match &parameter.kind {
        TypeKind::Primitive { name: ty } => {
            let ty = ident(ty);
            if out {
                quote!(#name: &mut #ty)
            } else {
                quote!(#name: #ty)
            }
        }
        TypeKind::Enum { name: ty } => {
            let ty = ident(ty);
            quote!(#name: #ty)
        }
        TypeKind::Text => quote!(#name: &str),
        TypeKind::Instance { class, .. } => {
            let ty = ident(class);
            if out {
                quote!(#name: &mut #ty)
            } else {
                quote!(#name: &#ty)
            }
        }
        TypeKind::FixedBuffer { element } => {
            let element = ident(element);
            if out {
                quote!(#name: &mut [#element])
            } else {
                quote!(#name: &[#element])
            }
        }
        TypeKind::ChannelSet => quote!(#name: Channels),
        TypeKind::Unit => unreachable!("rejected by descriptor validation"),
    }
}

fn wrapper_return(class: &ClassDescriptor, method: &MethodDescriptor) -> TokenStream {
    let is_unit = method.sets_instance || method.returns == TypeKind::Unit;
    let inner = if method.sets_instance {
        quote!(())
    } else {
        match &method.returns {
            TypeKind::Unit => quote!(()),
            TypeKind::Primitive { name } => {
                let ty = ident(name);
                quote!(#ty)
            }
            TypeKind::Enum { name } => {
                let ty = ident(name);
                quote!(#ty)
            }
            TypeKind::Text => {
                if method.nullable {
                    quote!(Option<String>)
                } else {
                    quote!(String)
                }
            }
            TypeKind::Instance { class: name, .. } => {
                if *name == class.name {
                    quote!(Self)
                } else {
                    let ty = ident(name);
                    quote!(#ty)
                }
            }
            TypeKind::ChannelSet => quote!(Channels),
            TypeKind::FixedBuffer { .. } => unreachable!("rejected by descriptor validation"),
        }
    };

    if is_fallible(class, method) {
        quote!(-> Result<#inner, PigmentError>)
    } else if is_unit {
        TokenStream::new()
    } else {
        quote!(-> #inner)
    }
}

fn emit_body(
    class: &ClassDescriptor,
    method: &MethodDescriptor,
) -> Result<Vec<TokenStream>, GenerateError> {
    let mut body = Vec::new();

    // Operations reachable without a constructed wrapper cross the
    // initialization guard themselves.
    if !has_receiver(class, method) {
        body.push(quote! { runtime::ensure_initialized(); });
    }
    if method.throws {
        body.push(quote! { let mut exception: RawExceptionHandle = std::ptr::null_mut(); });
    }

    for parameter in &method.parameters {
        if let Some(prologue) = parameter_prologue(parameter) {
            body.push(prologue);
        }
    }

    body.push(emit_dispatch(class, method));
    if let Some(check) = emit_error_check(class, method)? {
        body.push(check);
    }

    for parameter in &method.parameters {
        if parameter.direction == Direction::Out {
            if let TypeKind::Instance { class: name, create: true, .. } = &parameter.kind {
                let value = ident(&parameter.name);
                let native = scoped_ident(parameter);
                let path = marshaler(name);
                body.push(quote! { *#value = #path::from_scoped(&#native); });
            }
        }
    }

    body.push(emit_result(class, method));
    Ok(body)
}

fn parameter_prologue(parameter: &ParameterDescriptor) -> Option<TokenStream> {
    let name = ident(&parameter.name);
    match &parameter.kind {
        TypeKind::FixedBuffer { .. } => {
            let pinned = pinned_ident(parameter);
            if parameter.direction == Direction::Out {
                Some(quote! { let #pinned = #name.as_mut_ptr(); })
            } else {
                Some(quote! { let #pinned = #name.as_ptr(); })
            }
        }
        TypeKind::Instance { class, create: true, .. } => {
            let native = scoped_ident(parameter);
            let path = marshaler(class);
            if parameter.direction == Direction::Out {
                Some(quote! { let #native = #path::new_scoped()?; })
            } else {
                Some(quote! { let #native = #path::to_scoped(#name)?; })
            }
        }
        TypeKind::Text => {
            let text = text_ident(parameter);
            Some(quote! { let #text = ScopedText::new(#name); })
        }
        _ => None,
    }
}

fn emit_dispatch(class: &ClassDescriptor, method: &MethodDescriptor) -> TokenStream {
    let arms = Arch::ALL.iter().map(|&arch| {
        let gate = arch.gate();
        let variant = arch.runtime_variant();
        let module = arch.module_ident();
        let entry = entry_ident(class, &method.entry_point_name());
        let args = call_args(class, method);
        quote! { #gate #variant => unsafe { #module::#entry(#(#args),*) }, }
    });
    let fallback_gate = single_arch_fallback_gate();
    let dispatch = quote! {
        match runtime::architecture() {
            #(#arms)*
            #fallback_gate
            _ => unreachable!("build does not include the detected architecture"),
        }
    };

    if method.has_result() {
        quote! { let result = #dispatch; }
    } else {
        quote! { #dispatch; }
    }
}

fn call_args(class: &ClassDescriptor, method: &MethodDescriptor) -> Vec<TokenStream> {
    let mut args = Vec::new();
    if class.has_instance && method.uses_instance {
        args.push(quote!(self.instance()));
    }
    for parameter in &method.parameters {
        let name = ident(&parameter.name);
        args.push(match &parameter.kind {
            TypeKind::Primitive { .. } => quote!(#name),
            TypeKind::Enum { .. } => quote!(#name as usize),
            TypeKind::Text => {
                let text = text_ident(parameter);
                quote!(#text.as_ptr())
            }
            TypeKind::Instance { class: target, lookup: true, .. } => {
                let path = marshaler(target);
                quote!(#path::get_handle(#name))
            }
            TypeKind::Instance { .. } => {
                let native = scoped_ident(parameter);
                quote!(#native.get())
            }
            TypeKind::FixedBuffer { .. } => {
                let pinned = pinned_ident(parameter);
                quote!(#pinned)
            }
            TypeKind::ChannelSet => quote!(#name.to_raw() as RawChannels),
            TypeKind::Unit => unreachable!("rejected by descriptor validation"),
        });
    }
    if method.throws {
        args.push(quote!(&mut exception));
    }
    args
}

/// The post-dispatch error protocol: classification, optional cleanup of a
/// partially-built resource, and warning routing.
fn emit_error_check(
    class: &ClassDescriptor,
    method: &MethodDescriptor,
) -> Result<Option<TokenStream>, GenerateError> {
    if !method.throws {
        return Ok(None);
    }

    let warns = class.raises_warnings && !method.is_static;
    let non_fatal = if warns {
        quote! { self.warnings.notify(exception); }
    } else {
        TokenStream::new()
    };

    if let Some(routine) = method.cleanup_routine() {
        let routine = ident(routine);
        let mut extras = Vec::new();
        if let Some(cleanup) = &method.cleanup {
            for argument in &cleanup.arguments {
                let tokens: TokenStream =
                    argument.parse().map_err(|_| GenerateError::BadCleanupArgument {
                        method: method.name.clone(),
                        argument: argument.clone(),
                    })?;
                extras.push(tokens);
            }
        }
        // A fatal failure releases the partial result first; a null result
        // means there is nothing to release but the failure still raises.
        return Ok(Some(quote! {
            if let Some(exception) = Exception::from_carrier(exception) {
                if exception.is_fatal() {
                    if !result.is_null() {
                        Self::#routine(result #(, #extras)*);
                    }
                    return Err(exception.into_error());
                }
                #non_fatal
            }
        }));
    }

    if warns {
        Ok(Some(quote! {
            if let Some(exception) = Exception::from_carrier(exception) {
                if exception.is_fatal() {
                    return Err(exception.into_error());
                }
                #non_fatal
            }
        }))
    } else {
        Ok(Some(quote! {
            if let Some(exception) = Exception::from_carrier(exception) {
                return Err(exception.into_error());
            }
        }))
    }
}

fn emit_result(class: &ClassDescriptor, method: &MethodDescriptor) -> TokenStream {
    let fallible = is_fallible(class, method);
    let wrap = |value: TokenStream| {
        if fallible {
            quote!(Ok(#value))
        } else {
            value
        }
    };

    if method.sets_instance {
        let done = wrap(quote!(()));
        // A null result with no reported error leaves the prior handle
        // untouched.
        return quote! {
            if !result.is_null() {
                self.set_instance(result);
            }
            #done
        };
    }

    match &method.returns {
        TypeKind::Unit => {
            if fallible {
                quote!(Ok(()))
            } else {
                TokenStream::new()
            }
        }
        TypeKind::Instance { class: name, .. } if *name == class.name => {
            quote! {
                if result.is_null() {
                    return Err(PigmentError::InvalidOperation);
                }
                Ok(Self::from_raw(result))
            }
        }
        TypeKind::Instance { class: name, .. } => {
            let path = marshaler(name);
            let value = wrap(quote!(#path::into_managed(result)));
            quote!(#value)
        }
        TypeKind::Text => {
            if method.cleanup.is_some() {
                let value = wrap(quote!(decoded));
                quote! {
                    let decoded = Utf8Text::read(result);
                    memory::relinquish(result as RawHandle);
                    #value
                }
            } else if method.nullable {
                let value = wrap(quote!(Utf8Text::read_nullable(result)));
                quote!(#value)
            } else {
                let value = wrap(quote!(Utf8Text::read(result)));
                quote!(#value)
            }
        }
        TypeKind::Enum { name } => {
            let ty = ident(name);
            let value = wrap(quote!(#ty::from_raw(result)));
            quote!(#value)
        }
        TypeKind::ChannelSet => {
            let value = wrap(quote!(Channels::from_raw(result as u64)));
            quote!(#value)
        }
        TypeKind::Primitive { .. } => {
            let value = wrap(quote!(result));
            quote!(#value)
        }
        TypeKind::FixedBuffer { .. } => unreachable!("rejected by descriptor validation"),
    }
}

/// Path to the marshaling surface of a referenced class, assuming every
/// generated unit is a sibling module.
fn marshaler(class_name: &str) -> TokenStream {
    let module = ident(&format!("native_{}", snake_case(class_name)));
    let ty = ident(&format!("Native{class_name}"));
    quote!(#module::#ty)
}

fn scoped_ident(parameter: &ParameterDescriptor) -> proc_macro2::Ident {
    ident(&format!("{}_native", parameter.name))
}

fn pinned_ident(parameter: &ParameterDescriptor) -> proc_macro2::Ident {
    ident(&format!("{}_ptr", parameter.name))
}

fn text_ident(parameter: &ParameterDescriptor) -> proc_macro2::Ident {
    ident(&format!("{}_text", parameter.name))
}
