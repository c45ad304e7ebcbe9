/// Core types for the launch pipeline
use crate::bridge::BridgeError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

/// Resolved account credentials. Authentication happens upstream; the core
/// only substitutes these into the game's argument templates.
#[derive(Debug, Clone)]
pub struct Account {
    pub username: String,

    /// Profile id in canonical hyphenated form
    pub profile_id: String,

    pub access_token: String,

    /// "msa" or "legacy"
    pub user_type: String,

    pub xuid: Option<String>,

    /// Base URL of a third-party auth server; when set, the auth agent is
    /// attached at launch
    pub auth_server_url: Option<String>,
}

impl Account {
    /// Offline account with the conventional name-derived profile id.
    pub fn offline(username: &str) -> Self {
        let profile_id = uuid::Uuid::new_v3(
            &uuid::Uuid::NAMESPACE_OID,
            format!("OfflinePlayer:{username}").as_bytes(),
        );
        Self {
            username: username.to_string(),
            profile_id: profile_id.to_string(),
            access_token: "0".to_string(),
            user_type: "msa".to_string(),
            xuid: None,
            auth_server_url: None,
        }
    }

    /// Profile id without hyphens, the form the game expects in `--uuid`.
    pub fn compact_profile_id(&self) -> String {
        self.profile_id.replace('-', "")
    }
}

/// Where to drop the player right after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickPlay {
    /// World save name
    Singleplayer(String),
    /// `host` or `host:port`
    Server(String),
}

/// Everything the shell resolves before asking for a launch. Read-only to
/// the core.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Installed version id to launch
    pub version_id: String,

    pub account: Account,

    /// Runtime name; `None` uses the configured default
    pub runtime_name: Option<String>,

    pub window_size: WindowSize,

    /// Raw user JVM argument string (tokenized by the launcher)
    pub user_jvm_args: String,

    /// Raw user game argument string (split preserving quotes)
    pub user_game_args: String,

    /// Working directory override; `None` uses the shared game home
    pub game_dir_override: Option<PathBuf>,

    /// Display label for `version_type` ("release", a modpack name, ...)
    pub version_label: Option<String>,

    pub quick_play: Option<QuickPlay>,
}

/// Terminal result of a launch: the embedded runtime's exit code, whether it
/// was signal-terminated, and any degraded-launch warnings collected on the
/// way up. Produced exactly once per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchOutcome {
    pub exit_code: i32,

    /// True when the code carries the 128+signum convention
    pub is_signal: bool,

    /// Non-fatal problems (optional libraries that failed to load, env vars
    /// that could not be applied)
    pub warnings: Vec<String>,
}

impl LaunchOutcome {
    pub fn from_exit_code(exit_code: i32, warnings: Vec<String>) -> Self {
        Self {
            exit_code,
            is_signal: exit_code > 128,
            warnings,
        }
    }
}

/// Launch pipeline states, in order. Logged as the pipeline advances; the
/// shell uses them for progress display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    Idle,
    ResolvingRuntime,
    BuildingArguments,
    BuildingEnvironment,
    LoadingLibraries,
    Invoking,
    Running,
    Terminated,
}

impl std::fmt::Display for LaunchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LaunchState::Idle => "idle",
            LaunchState::ResolvingRuntime => "resolving runtime",
            LaunchState::BuildingArguments => "building arguments",
            LaunchState::BuildingEnvironment => "building environment",
            LaunchState::LoadingLibraries => "loading libraries",
            LaunchState::Invoking => "invoking",
            LaunchState::Running => "running",
            LaunchState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Errors surfaced to the caller. Everything here is fatal for the attempt;
/// no retry happens at this layer.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("runtime '{0}' is not installed")]
    RuntimeNotFound(String),

    #[error("runtime '{name}' targets '{arch}', which this device cannot run")]
    RuntimeIncompatible { name: String, arch: String },

    #[error("core library '{library}' failed to load: {reason}")]
    CoreLibraryLoadFailed { library: String, reason: String },

    #[error("argument assembly failed: {0}")]
    ArgumentBuildFailed(String),

    #[error("embedded runtime could not be invoked: {0}")]
    InvocationFailed(String),

    #[error("a launch is already in progress")]
    AlreadyLaunching,

    #[error("launch cancelled before invocation")]
    Cancelled,
}

impl From<BridgeError> for LaunchError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::EntryPointMissing(reason) => LaunchError::InvocationFailed(reason),
            other => LaunchError::InvocationFailed(other.to_string()),
        }
    }
}
