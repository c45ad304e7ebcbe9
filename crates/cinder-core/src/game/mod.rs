pub mod launch;
pub mod manifest;
pub mod options;
pub mod paths;
pub mod plugin;
pub mod runtime;
pub mod settings;

// Re-export commonly used types
pub use launch::{LaunchOutcome, LaunchRequest, Launcher};
pub use manifest::VersionManifest;
pub use paths::LauncherPaths;
pub use runtime::RuntimeDescriptor;
pub use settings::LauncherSettings;
