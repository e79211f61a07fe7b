//! Process-wide runtime state for the generated bindings.
//!
//! The active architecture is resolved exactly once and is read-only
//! afterwards; every generated dispatch matches on the value returned by
//! [`architecture`]. Library initialization is an explicit precondition the
//! binding layer crosses deliberately (every generated constructor, static
//! operation, and bridge factory starts with [`ensure_initialized`]) rather
//! than a hidden side effect of first use.

use once_cell::sync::OnceCell;

/// One of the three processor targets the native binaries ship for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    /// 64-bit ARM.
    Arm64,
    /// 64-bit x86.
    X64,
    /// 32-bit x86.
    X86,
}

impl Architecture {
    /// Architecture of the running process.
    pub fn detect() -> Self {
        if cfg!(target_arch = "aarch64") {
            Architecture::Arm64
        } else if cfg!(target_arch = "x86") {
            Architecture::X86
        } else {
            Architecture::X64
        }
    }

    /// Short lowercase name, as used in native library file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Architecture::Arm64 => "arm64",
            Architecture::X64 => "x64",
            Architecture::X86 => "x86",
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Runtime {
    architecture: Architecture,
}

static RUNTIME: OnceCell<Runtime> = OnceCell::new();
static LIBRARY_INIT: OnceCell<fn()> = OnceCell::new();

fn boot(architecture: Architecture) -> Runtime {
    if let Some(init) = LIBRARY_INIT.get() {
        init();
    }
    Runtime { architecture }
}

/// Registers the native library's one-time genesis routine.
///
/// Must be called before the first foreign call; later registrations are
/// rejected. Returns `false` if an initializer was already registered.
pub fn register_initializer(initializer: fn()) -> bool {
    LIBRARY_INIT.set(initializer).is_ok()
}

/// Runs process-wide initialization exactly once.
///
/// Safe to call from any thread, any number of times; only the first call
/// resolves the architecture and runs the registered initializer.
pub fn ensure_initialized() {
    RUNTIME.get_or_init(|| boot(Architecture::detect()));
}

/// Pins the runtime to a specific architecture instead of detecting it.
///
/// Intended for embedders that load a foreign-architecture binary set (and
/// for tests). Returns `false` when the runtime was already initialized, in
/// which case the pin had no effect.
pub fn initialize_with(architecture: Architecture) -> bool {
    let mut installed = false;
    RUNTIME.get_or_init(|| {
        installed = true;
        boot(architecture)
    });
    installed
}

/// The architecture resolved for this process.
///
/// Initializes the runtime on first use.
pub fn architecture() -> Architecture {
    RUNTIME.get_or_init(|| boot(Architecture::detect())).architecture
}
