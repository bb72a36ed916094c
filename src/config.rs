use crate::error::ConfigError;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "tokens.config.json";
pub const DEFAULT_PREFIX: &str = "mantine";
pub const DEFAULT_CUSTOM_PREFIX: &str = "custom";

/// Build settings, read from `tokens.config.json`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    /// Glob patterns for token sources, relative to the project root.
    pub source: Vec<String>,
    pub build_path: PathBuf,
    pub prefix: String,
    pub selector: String,
    /// Theme subtree name to the selector its tokens are written under.
    pub themes: IndexMap<String, String>,
    pub contexts_dir: String,
    pub brands_dir: PathBuf,
    pub base_font_size: f64,
    pub output_references: bool,
    pub custom_config: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        let mut themes = IndexMap::new();
        themes.insert("dark".to_string(), "[data-theme=\"dark\"]".to_string());
        BuildConfig {
            source: vec!["tokens/**/*.json".to_string()],
            build_path: PathBuf::from("build"),
            prefix: DEFAULT_PREFIX.to_string(),
            selector: ":root".to_string(),
            themes,
            contexts_dir: "contexts".to_string(),
            brands_dir: PathBuf::from("tokens/brands"),
            base_font_size: 16.0,
            output_references: false,
            custom_config: PathBuf::from("custom-prefix.json"),
        }
    }
}

impl BuildConfig {
    /// Reads a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }

    /// Reads a config file, falling back to the defaults when it is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            log::debug!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_json(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// The small config file that carries the custom build's prefix.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomConfig {
    #[serde(default = "default_custom_prefix")]
    pub prefix: String,
}

fn default_custom_prefix() -> String {
    DEFAULT_CUSTOM_PREFIX.to_string()
}

impl Default for CustomConfig {
    fn default() -> Self {
        CustomConfig {
            prefix: default_custom_prefix(),
        }
    }
}

impl CustomConfig {
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
