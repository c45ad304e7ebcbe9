/// Foreign-function boundary to the embedded runtime
pub mod logger;
#[cfg(unix)]
pub mod system;

use std::path::Path;

#[cfg(unix)]
pub use system::SystemBridge;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("dlopen failed for {library}: {reason}")]
    DlopenFailed { library: String, reason: String },

    #[error("failed to set {key} in the process environment: {reason}")]
    SetEnvFailed { key: String, reason: String },

    #[error("failed to change working directory to {dir}: {reason}")]
    ChdirFailed { dir: String, reason: String },

    #[error("embedded runtime entry point not found: {0}")]
    EntryPointMissing(String),

    #[error("invalid argument for native call: {0}")]
    BadArgument(String),
}

/// The narrow set of process-global operations a launch performs. Everything
/// that touches `dlopen`, the process environment, the working directory, or
/// the embedded runtime entry point goes through this trait so the sequencing
/// logic stays testable against a recording fake.
pub trait NativeBridge: Send + Sync {
    /// Load a shared library. `name_or_path` may be a bare soname (the OS
    /// loader applies its own search rules, honoring the library path
    /// variable applied beforehand) or an absolute path.
    fn dlopen(&self, name_or_path: &str) -> Result<(), BridgeError>;

    /// Set one process environment variable, overwriting any existing value.
    fn set_env(&self, key: &str, value: &str) -> Result<(), BridgeError>;

    /// Read back a process environment variable.
    fn get_env(&self, key: &str) -> Option<String>;

    fn chdir(&self, dir: &Path) -> Result<(), BridgeError>;

    /// Hand control to the embedded runtime with the final argv (argv[0] is
    /// the synthetic program name). Blocks until the runtime exits and
    /// returns its exit code.
    fn launch_jvm(&self, argv: &[String]) -> Result<i32, BridgeError>;
}
