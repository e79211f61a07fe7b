//! The closed set of architecture variants and their compile-time gates.
//!
//! Each generated call site is gated so a single-architecture build compiles
//! exactly one of the three branches, while the combined `platform-any`
//! build keeps all three and picks one at runtime through the
//! once-resolved architecture value.

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;

/// One supported processor target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arch {
    Arm64,
    X64,
    X86,
}

impl Arch {
    /// Every variant, in emission order.
    pub(crate) const ALL: [Arch; 3] = [Arch::Arm64, Arch::X64, Arch::X86];

    pub(crate) fn name(self) -> &'static str {
        match self {
            Arch::Arm64 => "arm64",
            Arch::X64 => "x64",
            Arch::X86 => "x86",
        }
    }

    /// Cargo feature selecting this architecture alone.
    pub(crate) fn feature(self) -> String {
        format!("platform-{}", self.name())
    }

    /// Native binary linked by this architecture's declarations.
    pub(crate) fn library(self) -> String {
        format!("pigment_native_{}", self.name())
    }

    /// Module holding this architecture's foreign declarations.
    pub(crate) fn module_ident(self) -> Ident {
        Ident::new(self.name(), Span::call_site())
    }

    /// The runtime enum variant generated dispatches match on.
    pub(crate) fn runtime_variant(self) -> TokenStream {
        match self {
            Arch::Arm64 => quote!(Architecture::Arm64),
            Arch::X64 => quote!(Architecture::X64),
            Arch::X86 => quote!(Architecture::X86),
        }
    }

    /// Gate compiling this variant's code: its own feature, or the
    /// combined any-architecture build.
    pub(crate) fn gate(self) -> TokenStream {
        let feature = self.feature();
        quote! { #[cfg(any(feature = #feature, feature = "platform-any"))] }
    }
}

/// Gate on the fallback dispatch arm, compiled out of combined builds where
/// the three variants already cover the match.
pub(crate) fn single_arch_fallback_gate() -> TokenStream {
    quote! { #[cfg(not(feature = "platform-any"))] }
}

/// Gate excluding an operation from the reduced runtime profile.
pub(crate) fn reduced_runtime_gate() -> TokenStream {
    quote! { #[cfg(not(feature = "reduced-runtime"))] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_are_distinct() {
        let features: Vec<String> = Arch::ALL.iter().map(|a| a.feature()).collect();
        assert_eq!(features, ["platform-arm64", "platform-x64", "platform-x86"]);
        let libraries: Vec<String> = Arch::ALL.iter().map(|a| a.library()).collect();
        assert_eq!(
            libraries,
            ["pigment_native_arm64", "pigment_native_x64", "pigment_native_x86"]
        );
    }

    #[test]
    fn test_gate_includes_the_combined_build() {
        let gate = Arch::X64.gate().to_string();
        assert!(gate.contains("platform-x64"));
        assert!(gate.contains("platform-any"));
    }
}
