/// One-shot files some game components expect on disk before startup
use crate::utils::version;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Mod-loader installers refuse to run without a launcher profile registry,
/// even though this launcher never reads it. Written once if absent.
pub fn ensure_launcher_profiles(game_dir: &Path) {
    let path = game_dir.join("launcher_profiles.json");
    if path.exists() {
        return;
    }

    let skeleton = serde_json::json!({
        "profiles": {
            "default": { "lastVersionId": "latest-release" }
        },
        "selectedProfile": "default"
    });

    let write = || -> Result<()> {
        std::fs::create_dir_all(game_dir)
            .with_context(|| format!("Failed to create {:?}", game_dir))?;
        std::fs::write(&path, serde_json::to_string(&skeleton)?)
            .with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    };

    match write() {
        Ok(()) => log::info!("Wrote launcher profile stub: {:?}", path),
        Err(e) => log::warn!("Unable to generate launcher_profiles.json: {}", e),
    }
}

/// log4j2 configuration templates. The pattern-layout lookup syntax changed
/// in the game's 1.12 update, so versions below it need the older file.
const LOG4J_LEGACY: &str = include_str!("../../../assets/log4j-1.7.xml");
const LOG4J_MODERN: &str = include_str!("../../../assets/log4j-1.12.xml");

const LOG4J_CUTOFF: &str = "1.12";

/// Write the per-version log4j configuration if absent and return its path,
/// wired into the JVM args as `-Dlog4j.configurationFile`. Failures leave
/// the game on its bundled config; not fatal.
pub fn ensure_log4j_config(version_dir: &Path, version_id: &str) -> PathBuf {
    let path = version_dir.join("log4j2.xml");
    if path.exists() {
        return path;
    }

    let content = if version::is_lower_than(version_id, LOG4J_CUTOFF) {
        LOG4J_LEGACY
    } else {
        LOG4J_MODERN
    };

    let write = || -> Result<()> {
        std::fs::create_dir_all(version_dir)
            .with_context(|| format!("Failed to create {:?}", version_dir))?;
        std::fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    };

    if let Err(e) = write() {
        log::warn!("Failed to write fallback log4j configuration: {}", e);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn profile_stub_written_once() {
        let tmp = TempDir::new().unwrap();
        ensure_launcher_profiles(tmp.path());

        let path = tmp.path().join("launcher_profiles.json");
        let first = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(parsed["selectedProfile"], "default");

        // a second call must not clobber user edits
        std::fs::write(&path, "{\"profiles\":{}}").unwrap();
        ensure_launcher_profiles(tmp.path());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"profiles\":{}}");
    }

    #[test]
    fn log4j_template_tracks_version_cutoff() {
        let tmp = TempDir::new().unwrap();

        let legacy = ensure_log4j_config(&tmp.path().join("1.7.10"), "1.7.10");
        let modern = ensure_log4j_config(&tmp.path().join("1.20.1"), "1.20.1");

        let legacy_content = std::fs::read_to_string(legacy).unwrap();
        let modern_content = std::fs::read_to_string(modern).unwrap();
        assert_ne!(legacy_content, modern_content);
        assert!(modern_content.contains("minecraftFormatting"));
    }

    #[test]
    fn existing_config_is_kept() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("1.20.1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("log4j2.xml"), "<custom/>").unwrap();

        let path = ensure_log4j_config(&dir, "1.20.1");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<custom/>");
    }
}
