/// Device architecture and display helpers
use once_cell::sync::Lazy;
use std::sync::Mutex;
use sysinfo::System;

static SYSTEM: Lazy<Mutex<System>> = Lazy::new(|| {
    let mut sys = System::new();
    sys.refresh_memory();
    Mutex::new(sys)
});

/// Returns the total physical memory in Megabytes
pub fn get_total_memory_mb() -> u64 {
    let mut sys = SYSTEM.lock().unwrap();
    sys.refresh_memory();
    sys.total_memory() / 1024 / 1024
}

/// Number of logical cores visible to the host process. The embedded runtime
/// mis-detects this on some devices, so the launcher pins
/// `-XX:ActiveProcessorCount` to this value.
pub fn available_processors() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

pub fn is_64bit_device() -> bool {
    cfg!(target_pointer_width = "64")
}

/// Normalized name of the host CPU architecture, matching the names used in
/// runtime install layouts (`lib/<arch>`).
pub fn device_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86" => "i386",
        "arm" => "arm",
        "aarch64" => "aarch64",
        _ => "x86_64",
    }
}

/// Expand a runtime's arch string into the directory-name candidates it may
/// use under `lib/`. 32-bit x86 runtimes historically ship any of three
/// spellings.
pub fn arch_candidates(arch: &str) -> Vec<String> {
    let expanded = if arch == "x86" || arch == "i386" {
        "i386/i486/i586"
    } else {
        arch
    };
    expanded
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a runtime built for `arch` can run on this device.
pub fn arch_compatible(arch: &str) -> bool {
    let device = device_arch();
    arch_candidates(arch).iter().any(|a| {
        a == device
            || (device == "i386" && (a == "i486" || a == "i586"))
            || (device == "x86_64" && a == "amd64")
    })
}

/// Scale a physical pixel dimension by the user's resolution factor and round
/// down to an even value; the windowing stub rejects odd framebuffer sizes.
pub fn display_friendly_res(size: u32, scale: f32) -> u32 {
    let scaled = (size as f32 * scale) as u32;
    scaled & !1
}
