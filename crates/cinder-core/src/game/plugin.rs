/// Plugin-provided renderers and media backends
use std::path::PathBuf;

/// A renderer backend installed as a companion package. Contributes its
/// library directory to the search path and may carry extra environment
/// variables the renderer reads at init.
#[derive(Debug, Clone)]
pub struct RendererPlugin {
    pub id: String,
    pub library_dir: PathBuf,
    pub env: Vec<(String, String)>,
}

/// An FFmpeg build installed as a companion package, used for in-game video
/// recording. Optional; its absence only disables the feature.
#[derive(Debug, Clone)]
pub struct FfmpegPlugin {
    pub library_dir: PathBuf,
    pub executable: PathBuf,
}

impl FfmpegPlugin {
    pub fn is_available(&self) -> bool {
        self.executable.is_file()
    }
}

/// Plugins discovered by the shell before launch. Read-only to the core.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    pub renderer: Option<RendererPlugin>,
    pub ffmpeg: Option<FfmpegPlugin>,
}

impl PluginRegistry {
    /// Library directories plugins contribute to the search path, highest
    /// priority first.
    pub fn library_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(ffmpeg) = &self.ffmpeg {
            if ffmpeg.is_available() {
                dirs.push(ffmpeg.library_dir.clone());
            }
        }
        if let Some(renderer) = &self.renderer {
            dirs.push(renderer.library_dir.clone());
        }
        dirs
    }
}
