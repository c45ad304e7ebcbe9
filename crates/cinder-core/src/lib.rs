pub mod bridge;
pub mod game;
pub mod utils;

// Re-export commonly used types
pub use bridge::logger::{LaunchLogger, LogEvent, LogSink};
pub use bridge::NativeBridge;
pub use game::launch::{
    Account, LaunchError, LaunchOutcome, LaunchRequest, Launcher, QuickPlay, WindowSize,
};
pub use game::manifest::VersionManifest;
pub use game::runtime::RuntimeDescriptor;

/// Brand string handed to the game through `-Dminecraft.clientmodname` and
/// the `launcher_name` template placeholder.
pub const LAUNCHER_NAME: &str = "CinderLauncher";

pub const LAUNCHER_VERSION: &str = env!("CARGO_PKG_VERSION");
