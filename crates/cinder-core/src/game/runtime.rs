/// Embedded runtime descriptors and registry lookup
use crate::utils::device;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// An installed embedded-JVM build. Resolved by name from the runtimes
/// directory; immutable once resolved. Install and removal are managed
/// elsewhere; the launch pipeline only consumes these.
#[derive(Debug, Clone)]
pub struct RuntimeDescriptor {
    pub name: String,

    /// Install directory (`<runtimes>/<name>`)
    pub home: PathBuf,

    /// Major java version (8, 17, 21, ...)
    pub java_version: u32,

    /// Target CPU architecture string as recorded by the runtime build.
    /// May hold several slash-separated candidates.
    pub arch: String,
}

impl RuntimeDescriptor {
    pub fn is_java8(&self) -> bool {
        self.java_version == 8
    }

    /// Whether this build can run on the host device at all.
    pub fn is_compatible(&self) -> bool {
        device::arch_compatible(&self.arch)
    }

    /// Name of the runtime's library directory relative to its home.
    /// Modern builds use `lib`, older multi-arch builds `lib/<arch>`.
    pub fn lib_dir_name(&self) -> String {
        for candidate in device::arch_candidates(&self.arch) {
            let dir = self.home.join("lib").join(&candidate);
            if dir.is_dir() {
                return format!("lib/{candidate}");
            }
        }
        "lib".to_string()
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.home.join(self.lib_dir_name())
    }

    /// Directory holding `libjvm.so`: `server` when present, else `client`.
    pub fn jvm_variant_dir(&self) -> PathBuf {
        let server = self.lib_dir().join("server");
        if server.join("libjvm.so").exists() {
            server
        } else {
            self.lib_dir().join("client")
        }
    }
}

/// Look a runtime up by name. Reads the build's `release` metadata file
/// (`JAVA_VERSION="17.0.8"`, `OS_ARCH="aarch64"`) the way every OpenJDK
/// distribution ships it.
pub fn resolve_runtime(runtimes_dir: &Path, name: &str) -> Result<RuntimeDescriptor> {
    let home = runtimes_dir.join(name);
    if !home.is_dir() {
        anyhow::bail!("runtime '{name}' is not installed under {runtimes_dir:?}");
    }

    let release = std::fs::read_to_string(home.join("release"))
        .with_context(|| format!("runtime '{name}' has no readable release file"))?;

    let java_version = release_value(&release, "JAVA_VERSION")
        .and_then(|v| parse_major_version(&v))
        .with_context(|| format!("runtime '{name}' release file has no JAVA_VERSION"))?;

    let arch = release_value(&release, "OS_ARCH").unwrap_or_else(|| {
        log::warn!("Runtime '{}' release file has no OS_ARCH; assuming device arch", name);
        device::device_arch().to_string()
    });

    Ok(RuntimeDescriptor {
        name: name.to_string(),
        home,
        java_version,
        arch: normalize_arch(&arch),
    })
}

fn release_value(release: &str, key: &str) -> Option<String> {
    release.lines().find_map(|line| {
        let (k, v) = line.split_once('=')?;
        if k.trim() != key {
            return None;
        }
        Some(v.trim().trim_matches('"').to_string())
    })
}

/// "1.8.0_332" → 8, "17.0.8" → 17
fn parse_major_version(version: &str) -> Option<u32> {
    let mut parts = version.split(['.', '_', '-']);
    let first: u32 = parts.next()?.parse().ok()?;
    if first == 1 {
        parts.next()?.parse().ok()
    } else {
        Some(first)
    }
}

fn normalize_arch(arch: &str) -> String {
    match arch {
        "amd64" => "x86_64".to_string(),
        "i586" | "i486" | "x86" => "i386".to_string(),
        other => other.to_string(),
    }
}
