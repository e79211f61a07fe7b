//! Declarative description of one native-backed class.
//!
//! Descriptors arrive from the declaration-discovery pass as JSON and are
//! immutable once deserialized; generation never inspects anything else.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Visibility of the generated wrapper type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Exported from the consuming crate.
    Public,
    /// Visible inside the consuming crate only.
    Crate,
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Public
    }
}

/// Direction of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Passed into the native call.
    In,
    /// Filled by the native call.
    Out,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::In
    }
}

/// The closed set of marshaling shapes a parameter or return value can have.
///
/// Every emitter matches this exhaustively; a shape outside the set is a
/// validation error, not a fallback path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeKind {
    /// No value.
    Unit,
    /// Passed through unchanged, e.g. `usize`, `f64`, or the `Quantum` alias.
    Primitive {
        /// Rust type name.
        name: String,
    },
    /// Managed enum passed by its underlying numeric representation.
    Enum {
        /// Managed enum type name.
        name: String,
    },
    /// UTF-8 string.
    Text,
    /// Owned native handle with its marshaling capabilities.
    Instance {
        /// Managed class name.
        class: String,
        /// The class can construct a native representation from a managed
        /// value (and an empty one for output parameters).
        #[serde(default)]
        create: bool,
        /// The class can look up the existing native handle of a managed
        /// object.
        #[serde(default)]
        lookup: bool,
    },
    /// Caller-supplied buffer pinned for the duration of the call.
    FixedBuffer {
        /// Element type name.
        element: String,
    },
    /// Channel selection set, passed in the platform's raw encoding.
    ChannelSet,
}

impl Default for TypeKind {
    fn default() -> Self {
        TypeKind::Unit
    }
}

/// One parameter of an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    /// Parameter name (snake case).
    pub name: String,
    /// Marshaling shape.
    #[serde(rename = "type")]
    pub kind: TypeKind,
    /// Direction; defaults to `in`.
    #[serde(default)]
    pub direction: Direction,
}

/// Cleanup conventions of an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupDescriptor {
    /// Routine releasing a partially-built resource on fatal error; an
    /// associated function of the generated wrapper taking the raw result.
    /// `None` means the cleanup convention only governs the release of a
    /// returned text buffer.
    #[serde(default)]
    pub routine: Option<String>,
    /// Extra argument expressions appended after the raw result.
    #[serde(default)]
    pub arguments: Vec<String>,
}

/// One operation of a wrapped class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    /// Wrapper method name (snake case, unique within the class).
    pub name: String,
    /// Foreign entry-point suffix; defaults to the Pascal form of `name`.
    /// Overloads share an entry point and collapse to one declaration.
    #[serde(default)]
    pub entry_point: Option<String>,
    /// Return shape.
    #[serde(default)]
    pub returns: TypeKind,
    /// A textual return may be null.
    #[serde(default)]
    pub nullable: bool,
    /// Parameters in declaration order.
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    /// Static operations never touch instance state or the warning channel.
    #[serde(default)]
    pub is_static: bool,
    /// The owning instance's handle is the first foreign argument.
    #[serde(default)]
    pub uses_instance: bool,
    /// A successful non-null result becomes the new owned handle.
    #[serde(default)]
    pub sets_instance: bool,
    /// The entry point reports failures through a trailing error carrier.
    #[serde(default)]
    pub throws: bool,
    /// Cleanup conventions, see [`CleanupDescriptor`].
    #[serde(default)]
    pub cleanup: Option<CleanupDescriptor>,
    /// Unavailable under the reduced runtime profile.
    #[serde(default)]
    pub restricted: bool,
}

impl MethodDescriptor {
    /// Foreign entry-point suffix for this operation.
    pub fn entry_point_name(&self) -> String {
        self.entry_point
            .clone()
            .unwrap_or_else(|| pascal_case(&self.name))
    }

    /// Whether the wrapper returns the owning class itself.
    pub fn returns_own_class(&self, class: &ClassDescriptor) -> bool {
        matches!(&self.returns, TypeKind::Instance { class: name, .. } if *name == class.name)
    }

    /// Whether the operation produces a raw result value.
    pub fn has_result(&self) -> bool {
        self.sets_instance || self.returns != TypeKind::Unit
    }

    /// Routine name of the partial-resource cleanup path, when declared.
    pub fn cleanup_routine(&self) -> Option<&str> {
        self.cleanup.as_ref()?.routine.as_deref()
    }
}

/// Immutable description of one native-backed class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDescriptor {
    /// Managed class name (Pascal case).
    pub name: String,
    /// Module the generated units are siblings of.
    pub namespace: String,
    /// Visibility of the generated wrapper.
    #[serde(default)]
    pub visibility: Visibility,
    /// Capability interface accepted by the bridge factory.
    #[serde(default)]
    pub interface: Option<String>,
    /// The wrapper owns a native handle.
    #[serde(default)]
    pub has_instance: bool,
    /// The native library exposes a disposal entry point for the class.
    #[serde(default)]
    pub has_dispose: bool,
    /// A process-wide disposal entry point usable without a wrapper.
    #[serde(default)]
    pub has_static_dispose: bool,
    /// Emit the managed-to-native bridge factory.
    #[serde(default)]
    pub bridge: bool,
    /// Non-fatal diagnostics are routed to a warning channel.
    #[serde(default)]
    pub raises_warnings: bool,
    /// The class traffics in the build-selected quantum pixel type.
    #[serde(default)]
    pub uses_quantum: bool,
    /// The class passes channel selection sets.
    #[serde(default)]
    pub uses_channels: bool,
    /// Operations in declaration order.
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
}

/// Invariant violation in a descriptor.
#[derive(Debug, Clone, Error)]
pub enum DescriptorError {
    /// A name is not a usable Rust identifier.
    #[error("`{0}` is not a valid identifier")]
    InvalidIdentifier(String),

    /// Two operations share a wrapper name.
    #[error("duplicate method name `{0}`")]
    DuplicateMethod(String),

    /// A class-level flag combination is inconsistent.
    #[error("class `{class}`: {reason}")]
    InvalidClass {
        /// Class name.
        class: String,
        /// What is wrong.
        reason: String,
    },

    /// An operation is inconsistent or uses an unsupported shape.
    #[error("method `{method}`: {reason}")]
    InvalidMethod {
        /// Wrapper method name.
        method: String,
        /// What is wrong.
        reason: String,
    },
}

impl ClassDescriptor {
    /// Checks every descriptor invariant the emitters rely on.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        require_ident(&self.name)?;
        require_ident(&self.namespace)?;
        if let Some(interface) = &self.interface {
            require_ident(interface)?;
        }
        if self.bridge && self.interface.is_none() {
            return Err(self.class_error("bridge factories need a capability interface"));
        }
        if self.has_dispose && !self.has_instance {
            return Err(self.class_error("disposal needs an owned instance"));
        }
        if self.has_static_dispose && !self.has_dispose {
            return Err(self.class_error("static disposal needs a disposal entry point"));
        }
        if self.raises_warnings && !self.has_instance {
            return Err(self.class_error("warning channels live on owning wrappers"));
        }

        let mut seen = std::collections::HashSet::new();
        for method in &self.methods {
            if !seen.insert(method.name.as_str()) {
                return Err(DescriptorError::DuplicateMethod(method.name.clone()));
            }
            self.validate_method(method)?;
        }
        Ok(())
    }

    fn validate_method(&self, method: &MethodDescriptor) -> Result<(), DescriptorError> {
        require_ident(&method.name)?;
        require_ident(&method.entry_point_name())?;

        let fail = |reason: &str| DescriptorError::InvalidMethod {
            method: method.name.clone(),
            reason: reason.to_owned(),
        };

        if (method.uses_instance || method.sets_instance) && !self.has_instance {
            return Err(fail("instance operations need `hasInstance` on the class"));
        }
        if (method.uses_instance || method.sets_instance) && method.is_static {
            return Err(fail("static operations cannot touch the instance"));
        }
        if method.sets_instance && method.returns != TypeKind::Unit {
            return Err(fail("`setsInstance` operations return nothing"));
        }
        if method.nullable && method.returns != TypeKind::Text {
            return Err(fail("`nullable` applies to textual returns only"));
        }
        if method.cleanup_routine().is_some() {
            if !method.throws {
                return Err(fail("cleanup routines classify the error carrier"));
            }
            if let Some(routine) = method.cleanup_routine() {
                require_ident(routine)?;
            }
            let handle_result = method.sets_instance
                || matches!(method.returns, TypeKind::Instance { .. });
            if !handle_result {
                return Err(fail("cleanup routines release a raw result handle"));
            }
        }

        if matches!(method.returns, TypeKind::FixedBuffer { .. }) {
            return Err(fail("buffer returns are not a supported shape"));
        }
        if let TypeKind::Instance { class, create, .. } = &method.returns {
            if *class != self.name && !create {
                return Err(fail("returned instances need the construct capability"));
            }
            if *class == self.name && !self.has_instance {
                return Err(fail("returning the owning class needs `hasInstance`"));
            }
        }
        validate_type(&method.returns, &fail)?;
        self.validate_flags(&method.returns, &fail)?;
        for parameter in &method.parameters {
            require_ident(&parameter.name)?;
            validate_type(&parameter.kind, &fail)?;
            self.validate_flags(&parameter.kind, &fail)?;
            match (&parameter.kind, parameter.direction) {
                (TypeKind::Unit, _) => {
                    return Err(fail("parameters carry a value"));
                }
                (TypeKind::Text, Direction::Out) => {
                    return Err(fail("textual out parameters are not a supported shape"));
                }
                (TypeKind::ChannelSet, Direction::Out) => {
                    return Err(fail("channel-set out parameters are not a supported shape"));
                }
                (TypeKind::Enum { .. }, Direction::Out) => {
                    return Err(fail("enum out parameters are not a supported shape"));
                }
                (TypeKind::Instance { create, .. }, Direction::Out) if !create => {
                    return Err(fail("out instances need the construct capability"));
                }
                (TypeKind::Instance { create, lookup, .. }, Direction::In)
                    if !create && !lookup =>
                {
                    return Err(fail("instance parameters need a marshaling capability"));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn validate_flags(
        &self,
        kind: &TypeKind,
        fail: &impl Fn(&str) -> DescriptorError,
    ) -> Result<(), DescriptorError> {
        match kind {
            TypeKind::ChannelSet if !self.uses_channels => {
                Err(fail("channel sets need `usesChannels` on the class"))
            }
            TypeKind::Primitive { name } if name.as_str() == "Quantum" && !self.uses_quantum => {
                Err(fail("the quantum pixel type needs `usesQuantum` on the class"))
            }
            _ => Ok(()),
        }
    }

    fn class_error(&self, reason: &str) -> DescriptorError {
        DescriptorError::InvalidClass {
            class: self.name.clone(),
            reason: reason.to_owned(),
        }
    }
}

fn validate_type(
    kind: &TypeKind,
    fail: &impl Fn(&str) -> DescriptorError,
) -> Result<(), DescriptorError> {
    match kind {
        TypeKind::Unit | TypeKind::Text | TypeKind::ChannelSet => Ok(()),
        TypeKind::Primitive { name } | TypeKind::Enum { name } => require_ident(name),
        TypeKind::FixedBuffer { element } => require_ident(element),
        TypeKind::Instance { class, create, lookup } => {
            require_ident(class)?;
            if *create && *lookup {
                Err(fail("instance types have one marshaling capability"))
            } else {
                Ok(())
            }
        }
    }
}

fn require_ident(name: &str) -> Result<(), DescriptorError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(DescriptorError::InvalidIdentifier(name.to_owned()))
    }
}

/// `PascalCase` form of a snake-case name.
pub(crate) fn pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for part in name.split('_') {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.extend(chars);
        }
    }
    out
}

/// `snake_case` form of a Pascal-case name.
pub(crate) fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let after_lower = i > 0 && chars[i - 1].is_ascii_lowercase();
            let before_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if i > 0 && (after_lower || before_lower) && chars[i - 1] != '_' {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
