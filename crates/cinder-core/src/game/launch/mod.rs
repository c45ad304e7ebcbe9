/// Bootstrap pipeline for starting the embedded runtime inside the host process
pub mod arguments;
pub mod classpath;
pub mod environment;
pub mod launcher;
pub mod loader;
pub mod profiles;
pub mod templates;
pub mod types;

// Re-export commonly used types
pub use arguments::tokenize_jvm_args;
pub use classpath::{maven_to_path, resolve_classpath, ResolvedClasspath};
pub use environment::{library_search_path, EnvironmentMap};
pub use launcher::Launcher;
pub use loader::{LibraryLoader, LoadState, ProbeStrategy, CORE_LOAD_SEQUENCE};
pub use templates::substitute;
pub use types::{
    Account, LaunchError, LaunchOutcome, LaunchRequest, LaunchState, QuickPlay, WindowSize,
};
