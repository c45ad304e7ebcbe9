/// Classpath construction from the version manifest
use crate::game::manifest::{Library, Rule, RuleAction};
use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const CLASSPATH_SEPARATOR: char = ':';

/// Evaluate a library's platform rules. No rules means included. An `allow`
/// rule scoped to osx marks a desktop-Mac-only artifact, which can never
/// apply here; everything else is included as-is so manifests keep working
/// unmodified.
pub fn keep_library(rules: Option<&[Rule]>) -> bool {
    let Some(rules) = rules else {
        return true;
    };

    for rule in rules {
        if rule.action == RuleAction::Allow {
            if let Some(os) = &rule.os {
                if os.name.as_deref() == Some("osx") {
                    return false;
                }
            }
        }
    }
    true
}

/// Convert Maven coordinates to a repository-relative file path.
/// Format: `group:artifact:version[:classifier][@extension]`
/// Example: "com.google.guava:guava:21.0" -> "com/google/guava/guava/21.0/guava-21.0.jar"
pub fn maven_to_path(coords: &str) -> Result<String> {
    let parts: Vec<&str> = coords.split(':').collect();

    if parts.len() < 3 {
        anyhow::bail!("Invalid Maven coordinates: {}", coords);
    }

    let group = parts[0].replace('.', "/");
    let artifact = parts[1];
    let mut version = parts[2];
    let mut classifier = None;
    let mut extension = "jar";

    if parts.len() == 3 {
        if let Some((v, ext)) = version.split_once('@') {
            version = v;
            extension = ext;
        }
    } else if let Some((clf, ext)) = parts[3].split_once('@') {
        classifier = Some(clf);
        extension = ext;
    } else {
        classifier = Some(parts[3]);
    }

    let filename = if let Some(clf) = classifier {
        format!("{artifact}-{version}-{clf}.{extension}")
    } else {
        format!("{artifact}-{version}.{extension}")
    };

    Ok(format!("{group}/{artifact}/{version}/{filename}"))
}

/// Repository-relative path for a library entry, preferring the path the
/// manifest declares over the coordinate transform.
pub fn artifact_to_path(library: &Library) -> Result<String> {
    if let Some(path) = library
        .downloads
        .as_ref()
        .and_then(|d| d.artifact.as_ref())
        .and_then(|a| a.path.as_deref())
    {
        return Ok(path.to_string());
    }
    maven_to_path(&library.name)
}

/// Resolved classpath plus bookkeeping about what was skipped.
#[derive(Debug)]
pub struct ResolvedClasspath {
    /// Ordered, de-duplicated, existing files only
    pub entries: Vec<PathBuf>,

    /// Manifest entries whose artifact was not on disk
    pub missing: Vec<String>,
}

impl ResolvedClasspath {
    pub fn joined(&self) -> String {
        self.entries
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(&CLASSPATH_SEPARATOR.to_string())
    }
}

/// Build the classpath: the replacement LWJGL jars first (they must shadow
/// any desktop LWJGL the manifest pulls in), then the manifest libraries in
/// manifest order, then the client jar last. Missing files are skipped with
/// a log line; duplicates keep their first position.
pub fn resolve_classpath(
    libraries: &[Library],
    libraries_home: &Path,
    lwjgl_dir: &Path,
    client_jar: &Path,
) -> ResolvedClasspath {
    let mut entries: Vec<PathBuf> = Vec::new();
    let mut missing: Vec<String> = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    let mut push = |path: PathBuf, entries: &mut Vec<PathBuf>| {
        if seen.insert(path.clone()) {
            entries.push(path);
        }
    };

    for jar in list_jars_sorted(lwjgl_dir) {
        push(jar, &mut entries);
    }

    for library in libraries {
        if !keep_library(library.rules.as_deref()) {
            log::debug!("Excluded by platform rules: {}", library.name);
            continue;
        }

        let rel = match artifact_to_path(library) {
            Ok(rel) => rel,
            Err(e) => {
                log::warn!("Unresolvable library {}: {}", library.name, e);
                missing.push(library.name.clone());
                continue;
            }
        };

        let full = libraries_home.join(rel);
        if !full.exists() {
            log::debug!("Ignored non-existent file: {:?}", full);
            missing.push(library.name.clone());
            continue;
        }
        push(full, &mut entries);
    }

    if client_jar.exists() {
        push(client_jar.to_path_buf(), &mut entries);
    } else {
        log::warn!("Client jar not found: {:?}", client_jar);
    }

    ResolvedClasspath { entries, missing }
}

/// Jars under `dir`, name-sorted so the output is stable across platforms
/// and runs.
fn list_jars_sorted(dir: &Path) -> Vec<PathBuf> {
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut jars: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|ext| ext == "jar")
                    .unwrap_or(false)
        })
        .collect();
    jars.sort();
    jars
}
