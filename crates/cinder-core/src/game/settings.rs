/// User settings consumed by the launch pipeline
use crate::utils::device;

/// Snapshot of the settings a launch reads. Persistence and the settings UI
/// live in the shell; the core only consumes resolved values.
#[derive(Debug, Clone)]
pub struct LauncherSettings {
    /// Heap allocation in MB, applied as both -Xms and -Xmx
    pub heap_mb: u32,

    /// Runtime used when the request doesn't name one
    pub default_runtime: String,

    /// Raw user JVM argument string, tokenized at launch
    pub user_jvm_args: String,

    /// Resolution factor applied to the window size hints
    pub resolution_scale: f32,

    /// Dump translated shaders from the GL bridge
    pub dump_shaders: bool,

    /// Prefer the system Vulkan driver under the Zink renderer
    pub prefer_system_vulkan_driver: bool,

    /// Force vsync from inside the Zink renderer
    pub vsync_in_zink: bool,

    /// Pin the render thread to the big cores
    pub big_core_affinity: bool,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            heap_mb: default_heap_mb(),
            default_runtime: String::new(),
            user_jvm_args: String::new(),
            resolution_scale: 1.0,
            dump_shaders: false,
            prefer_system_vulkan_driver: false,
            vsync_in_zink: false,
            big_core_affinity: false,
        }
    }
}

/// Half of device memory, with headroom kept for the host process and the
/// compositor; clamped so small devices still get a workable heap.
fn default_heap_mb() -> u32 {
    let total = device::get_total_memory_mb() as u32;
    (total / 2).clamp(1024, 8192)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_heap_is_clamped() {
        let settings = LauncherSettings::default();
        assert!(settings.heap_mb >= 1024);
        assert!(settings.heap_mb <= 8192);
    }
}
