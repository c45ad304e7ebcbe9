/// Game options.txt store
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::game::launch::WindowSize;

const DEFAULT_OPTIONS: &[(&str, &str)] = &[("lang", "en_us"), ("guiScale", "0")];

/// The game's colon-delimited `options.txt`, one `key:value` per line. Loaded
/// before launch so the launcher can steer a handful of keys (language, GUI
/// scale); rewritten atomically so a crash mid-save never truncates it.
#[derive(Debug)]
pub struct GameOptions {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl GameOptions {
    /// Load options from `<game_dir>/options.txt`, creating the file with
    /// defaults when absent.
    pub fn load(game_dir: &Path) -> Result<Self> {
        let path = game_dir.join("options.txt");

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {:?}", parent))?;
            }
            let mut options = Self {
                path: path.clone(),
                entries: BTreeMap::new(),
            };
            for (k, v) in DEFAULT_OPTIONS {
                options.set(k, v);
            }
            options.save()?;
            return Ok(options);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?;

        let entries = content
            .lines()
            .filter_map(|line| {
                let idx = line.find(':')?;
                if idx == 0 {
                    return None;
                }
                Some((line[..idx].to_string(), line[idx + 1..].to_string()))
            })
            .collect();

        Ok(Self { path, entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// List-valued keys are stored as `["a","b"]`
    pub fn set_list(&mut self, key: &str, values: &[String]) {
        let joined = values
            .iter()
            .map(|v| format!("\"{v}\""))
            .collect::<Vec<_>>()
            .join(",");
        self.set(key, &format!("[{joined}]"));
    }

    pub fn get_list(&self, key: &str) -> Vec<String> {
        let Some(raw) = self.get(key) else {
            return Vec::new();
        };
        let inner = raw.trim_start_matches('[').trim_end_matches(']');
        if inner.trim().is_empty() {
            return Vec::new();
        }
        inner
            .split(',')
            .map(|item| item.trim().trim_matches('"').to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }

    /// Rewrite the file via a temp file in the same directory, then rename.
    pub fn save(&self) -> Result<()> {
        let parent = self
            .path
            .parent()
            .context("options.txt has no parent directory")?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .context("Failed to create temp options file")?;
        for (key, value) in &self.entries {
            writeln!(tmp, "{key}:{value}")?;
        }
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace {:?}", self.path))?;
        Ok(())
    }

    /// Effective GUI scale: the stored value, lowered to what the window can
    /// actually fit (`0` means auto).
    pub fn gui_scale(&self, window: WindowSize) -> u32 {
        let stored = self
            .get("guiScale")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);
        let dynamic = (window.width / 320).min(window.height / 240).max(1);
        if stored == 0 || dynamic < stored {
            dynamic
        } else {
            stored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_defaults_when_absent() {
        let tmp = TempDir::new().unwrap();
        let options = GameOptions::load(tmp.path()).unwrap();
        assert_eq!(options.get("lang"), Some("en_us"));
        assert!(tmp.path().join("options.txt").exists());
    }

    #[test]
    fn round_trips_entries() {
        let tmp = TempDir::new().unwrap();
        let mut options = GameOptions::load(tmp.path()).unwrap();
        options.set("fov", "90");
        options.set_list("resourcePacks", &["vanilla".to_string(), "fabric".to_string()]);
        options.save().unwrap();

        let reloaded = GameOptions::load(tmp.path()).unwrap();
        assert_eq!(reloaded.get("fov"), Some("90"));
        assert_eq!(
            reloaded.get_list("resourcePacks"),
            vec!["vanilla".to_string(), "fabric".to_string()]
        );
    }

    #[test]
    fn values_may_contain_colons() {
        let tmp = TempDir::new().unwrap();
        let mut options = GameOptions::load(tmp.path()).unwrap();
        options.set("key_key.attack", "key.mouse:left");
        options.save().unwrap();

        let reloaded = GameOptions::load(tmp.path()).unwrap();
        assert_eq!(reloaded.get("key_key.attack"), Some("key.mouse:left"));
    }

    #[test]
    fn gui_scale_caps_to_window() {
        let tmp = TempDir::new().unwrap();
        let mut options = GameOptions::load(tmp.path()).unwrap();

        // auto: derives from the window
        assert_eq!(
            options.gui_scale(WindowSize { width: 1280, height: 720 }),
            3
        );

        // stored value wins when the window can fit it
        options.set("guiScale", "2");
        assert_eq!(
            options.gui_scale(WindowSize { width: 1280, height: 720 }),
            2
        );

        // tiny window lowers an oversized stored value
        options.set("guiScale", "8");
        assert_eq!(
            options.gui_scale(WindowSize { width: 640, height: 480 }),
            2
        );
    }
}
