//! Lookup configuration files.
//!
//! A configuration lists script variable names to check and base → target
//! remaps. Files are YAML or JSON; a directory contributes every such file in
//! name order.
//!
//! ```yaml
//! script_variables:
//!   - nectar
//!   - lootable
//! remaps:
//!   - base: { source: Critters.esl, id: "0x801" }
//!     target: { source: Critters.esl, id: "0x802" }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// A source-local form id as written in configuration.
///
/// Accepts integers or hex strings with an optional `0x` prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawIdRepr")]
pub struct RawFormId(pub u32);

impl RawFormId {
    pub fn get(self) -> u32 {
        self.0
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        u32::from_str_radix(digits, 16)
            .map(RawFormId)
            .map_err(|_| ConfigError::InvalidFormId(text.to_string()))
    }
}

impl fmt::Display for RawFormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIdRepr {
    Int(u64),
    Text(String),
}

impl TryFrom<RawIdRepr> for RawFormId {
    type Error = ConfigError;

    fn try_from(repr: RawIdRepr) -> Result<Self, Self::Error> {
        match repr {
            RawIdRepr::Int(value) => u32::try_from(value)
                .map(RawFormId)
                .map_err(|_| ConfigError::InvalidFormId(value.to_string())),
            RawIdRepr::Text(text) => RawFormId::parse(&text),
        }
    }
}

/// A form named by data source and source-local id.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FormRef {
    pub source: String,
    pub id: RawFormId,
}

impl FormRef {
    pub fn new(source: impl Into<String>, id: u32) -> Self {
        Self {
            source: source.into(),
            id: RawFormId(id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RemapEntry {
    pub base: FormRef,
    pub target: FormRef,
}

/// Parsed lookup configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub script_variables: Vec<String>,
    pub remaps: Vec<RemapEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

fn format_of(path: &Path) -> Option<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml" | "yml") => Some(Format::Yaml),
        Some("json") => Some(Format::Json),
        _ => None,
    }
}

impl ResolverConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Parse a single configuration file, picking the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = format_of(path).ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match format {
            Format::Yaml => Self::from_yaml_str(&text).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            }),
            Format::Json => Self::from_json_str(&text).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load a file, or every supported file in a directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Self::from_file(path);
        }

        let mut config = Self::default();
        for file in config_files(path)? {
            tracing::debug!(path = %file.display(), "loading lookup config");
            config.merge(Self::from_file(&file)?);
        }
        Ok(config)
    }

    /// Append `other`'s entries after this one's.
    pub fn merge(&mut self, other: ResolverConfig) {
        self.script_variables.extend(other.script_variables);
        self.remaps.extend(other.remaps);
    }
}

/// Supported configuration files directly inside `dir`, sorted by name.
fn config_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = format!("{}/*", escaped);

    let mut files: Vec<PathBuf> = glob::glob(&pattern)?
        .filter_map(Result::ok)
        .filter(|path| path.is_file() && format_of(path).is_some())
        .collect();
    files.sort();
    Ok(files)
}
