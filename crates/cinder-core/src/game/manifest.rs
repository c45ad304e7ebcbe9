/// Version manifest data model (consumed as already-parsed input)
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Declarative description of a game build: main class, libraries with
/// platform rules, and the JVM/game argument templates. The launcher treats
/// this as read-only input; fetching and installing it is someone else's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionManifest {
    /// Version ID (e.g., "1.20.1")
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,

    /// Modern argument templates (1.13+)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Arguments>,

    /// Legacy space-joined game arguments (pre-1.13)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minecraft_arguments: Option<String>,

    #[serde(default)]
    pub libraries: Vec<Library>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_index: Option<AssetIndex>,

    /// Assets version (legacy)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", rename = "type")]
    pub version_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_time: Option<String>,
}

impl VersionManifest {
    pub fn main_class(&self) -> Result<&str> {
        self.main_class
            .as_deref()
            .with_context(|| format!("manifest {} has no mainClass", self.id))
    }

    /// Asset index id, falling back to the legacy `assets` field.
    pub fn asset_index_id(&self) -> Option<&str> {
        self.asset_index
            .as_ref()
            .map(|a| a.id.as_str())
            .or(self.assets.as_deref())
    }

    /// JVM-side argument templates in manifest order. Only plain string
    /// entries participate; conditional entries target desktop platforms and
    /// are skipped here.
    pub fn jvm_templates(&self) -> Vec<&str> {
        self.arguments
            .as_ref()
            .map(|a| simple_templates(&a.jvm))
            .unwrap_or_default()
    }

    /// Game-side argument templates in manifest order.
    pub fn game_templates(&self) -> Vec<&str> {
        self.arguments
            .as_ref()
            .map(|a| simple_templates(&a.game))
            .unwrap_or_default()
    }
}

fn simple_templates(args: &[Argument]) -> Vec<&str> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            Argument::Simple(s) => out.push(s.as_str()),
            Argument::Conditional { .. } => {
                log::debug!("Skipping conditional argument template");
            }
        }
    }
    out
}

/// Game and JVM argument template lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<Argument>,

    #[serde(default)]
    pub jvm: Vec<Argument>,
}

/// Argument template that can be a plain string or rule-gated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    Simple(String),

    Conditional {
        rules: Vec<Rule>,
        value: ArgumentValue,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    Single(String),
    Multiple(Vec<String>),
}

/// Rule for conditional library inclusion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub action: RuleAction,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<OsRule>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<HashMap<String, bool>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

/// Library entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    /// Maven coordinates (`group:artifact:version[:classifier]`)
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloads: Option<LibraryDownloads>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryDownloads {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetIndex {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
}

/// Parse a version.json document
pub fn parse_version_json(json: &str) -> Result<VersionManifest> {
    serde_json::from_str(json).context("Failed to parse version manifest")
}

/// Load and parse a version.json from disk
pub fn load_manifest(path: &Path) -> Result<VersionManifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {:?}", path))?;
    parse_version_json(&content)
}
