/// Native library load sequencing
use crate::bridge::logger::LaunchLogger;
use crate::bridge::NativeBridge;
use crate::game::launch::types::LaunchError;
use std::path::{Path, PathBuf};

/// How a step resolves its library before `dlopen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStrategy {
    /// Walk the search path for the file and open the full path, falling
    /// back to the bare name so the OS loader can have the last word.
    SearchPath,

    /// Open by bare name first (the OS loader applies the library-path
    /// variable), then retry with the computed full path; some loaders
    /// silently fail bare-name resolution for freshly unpacked runtimes.
    BareThenFullPath,
}

/// One entry in the ordered load plan.
#[derive(Debug, Clone, Copy)]
pub struct LoadStep {
    pub library: &'static str,
    pub required: bool,
    pub probe: ProbeStrategy,
}

const fn required(library: &'static str) -> LoadStep {
    LoadStep {
        library,
        required: true,
        probe: ProbeStrategy::SearchPath,
    }
}

/// Libraries the runtime cannot start without, in dependency order: the
/// launcher bridge, the VM itself, then verification/IO, then the AWT and
/// font stack. Each one resolves symbols out of the ones before it.
pub const CORE_LOAD_SEQUENCE: &[LoadStep] = &[
    required("libjli.so"),
    LoadStep {
        library: "libjvm.so",
        required: true,
        probe: ProbeStrategy::BareThenFullPath,
    },
    required("libverify.so"),
    required("libjava.so"),
    required("libnet.so"),
    required("libnio.so"),
    required("libawt.so"),
    required("libawt_headless.so"),
    required("libfreetype.so"),
    required("libfontmanager.so"),
];

/// Engine-support libraries loaded after the runtime stack. Optional: a
/// failure degrades the feature (no audio) instead of the launch.
pub const ENGINE_LOAD_SEQUENCE: &[LoadStep] = &[LoadStep {
    library: "libopenal.so",
    required: false,
    probe: ProbeStrategy::SearchPath,
}];

/// Per-library lifecycle, kept explicit so the order and fallback behavior
/// stay testable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Probing,
    Loaded,
    FailedRetryWithFullPath,
    FatalFailure,
}

#[derive(Debug)]
pub struct StepReport {
    pub library: &'static str,

    /// Final state
    pub state: LoadState,

    /// States visited, in order (`Probing → Loaded`, or
    /// `Probing → FailedRetryWithFullPath → …`)
    pub trail: Vec<LoadState>,

    pub error: Option<String>,
}

impl StepReport {
    fn finish(library: &'static str, mut trail: Vec<LoadState>, error: Option<String>) -> Self {
        let state = if error.is_none() {
            LoadState::Loaded
        } else {
            LoadState::FatalFailure
        };
        trail.push(state.clone());
        Self {
            library,
            state,
            trail,
            error,
        }
    }
}

/// Drives the load plan against the bridge. Owns the degraded-launch
/// warning list the coordinator forwards on the outcome.
pub struct LibraryLoader<'a> {
    bridge: &'a dyn NativeBridge,
    logger: &'a LaunchLogger,
    search_path: Vec<PathBuf>,
    jvm_variant_dir: PathBuf,
    runtime_lib_dir: PathBuf,
    native_lib_dir: PathBuf,
    pub warnings: Vec<String>,
}

impl<'a> LibraryLoader<'a> {
    pub fn new(
        bridge: &'a dyn NativeBridge,
        logger: &'a LaunchLogger,
        search_path: Vec<PathBuf>,
        jvm_variant_dir: PathBuf,
        runtime_lib_dir: PathBuf,
        native_lib_dir: PathBuf,
    ) -> Self {
        Self {
            bridge,
            logger,
            search_path,
            jvm_variant_dir,
            runtime_lib_dir,
            native_lib_dir,
            warnings: Vec::new(),
        }
    }

    /// First existing `<dir>/<name>` on the search path, else the bare name.
    pub fn find_in_search_path(&self, name: &str) -> String {
        for dir in &self.search_path {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return candidate.to_string_lossy().into_owned();
            }
        }
        name.to_string()
    }

    fn run_step(&self, step: &LoadStep) -> StepReport {
        let mut trail = vec![LoadState::NotLoaded, LoadState::Probing];

        match step.probe {
            ProbeStrategy::SearchPath => {
                let resolved = self.find_in_search_path(step.library);
                let error = self.bridge.dlopen(&resolved).err().map(|e| e.to_string());
                StepReport::finish(step.library, trail, error)
            }
            ProbeStrategy::BareThenFullPath => {
                if self.bridge.dlopen(step.library).is_ok() {
                    return StepReport::finish(step.library, trail, None);
                }
                log::warn!(
                    "Failed to load {} with no path, trying with full path",
                    step.library
                );
                trail.push(LoadState::FailedRetryWithFullPath);

                let full = self.jvm_variant_dir.join(step.library);
                let error = self
                    .bridge
                    .dlopen(&full.to_string_lossy())
                    .err()
                    .map(|e| e.to_string());
                StepReport::finish(step.library, trail, error)
            }
        }
    }

    /// Load the ordered core stack. Any failure here aborts the launch
    /// before the entry point is ever invoked.
    pub fn load_core(&mut self) -> Result<Vec<StepReport>, LaunchError> {
        let mut reports = Vec::with_capacity(CORE_LOAD_SEQUENCE.len());
        for step in CORE_LOAD_SEQUENCE {
            let report = self.run_step(step);
            self.logger.line(match report.state {
                LoadState::Loaded => format!("Loaded {}", step.library),
                _ => format!("Failed to load {}", step.library),
            });

            if report.state == LoadState::FatalFailure && step.required {
                let reason = report
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string());
                return Err(LaunchError::CoreLibraryLoadFailed {
                    library: step.library.to_string(),
                    reason,
                });
            }
            reports.push(report);
        }
        Ok(reports)
    }

    /// Best-effort pass over every remaining shared object in the runtime's
    /// library directory. Unordered; individual failures become warnings.
    pub fn sweep_runtime_libraries(&mut self) {
        for library in locate_shared_objects(&self.runtime_lib_dir) {
            if let Err(e) = self.bridge.dlopen(&library.to_string_lossy()) {
                log::warn!("Sweep failed for {:?}: {}", library, e);
                self.warnings.push(e.to_string());
            }
        }
    }

    /// Load the optional engine-support set from the launcher's own native
    /// directory. Failures are surfaced, not fatal.
    pub fn load_engine(&mut self) {
        for step in ENGINE_LOAD_SEQUENCE {
            let full = self.native_lib_dir.join(step.library);
            if let Err(e) = self.bridge.dlopen(&full.to_string_lossy()) {
                log::warn!("Optional library {} unavailable: {}", step.library, e);
                self.logger
                    .line(format!("Degraded: {} failed to load", step.library));
                self.warnings.push(format!("{}: {e}", step.library));
            } else {
                self.logger.line(format!("Loaded {}", step.library));
            }
        }
    }
}

/// Recursively collect `*.so` files, name-sorted for a stable sweep order.
fn locate_shared_objects(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return found;
    };
    for entry in read_dir.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            found.extend(locate_shared_objects(&path));
        } else if path
            .file_name()
            .map(|n| n.to_string_lossy().ends_with(".so"))
            .unwrap_or(false)
        {
            found.push(path);
        }
    }
    found.sort();
    found
}
