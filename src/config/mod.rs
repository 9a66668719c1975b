//! Client configuration.
//!
//! `api_base` resolution, highest first: explicit override (CLI flag),
//! `EXPENSE_API_BASE`, `config.toml` in the platform config directory,
//! [`DEFAULT_API_BASE`].

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE: &str = "http://localhost:8080";

/// Environment variable overriding the configured API base address.
pub const API_BASE_ENV: &str = "EXPENSE_API_BASE";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub api_base: Option<String>,
    pub data_dir: Option<PathBuf>,
}

/// Resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base address, without trailing slash.
    pub api_base: String,
    /// Directory holding the persisted session record.
    pub data_dir: PathBuf,
}

impl ClientConfig {
    /// Load from `path`, or from the platform config directory when `None`.
    ///
    /// A missing default config file is fine; a missing explicit one is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => Some(read_file_config(path)?),
            None => match default_config_path() {
                Some(path) if path.exists() => Some(read_file_config(&path)?),
                _ => None,
            },
        };

        let env_api_base = std::env::var(API_BASE_ENV).ok();
        Ok(Self::resolve(file, env_api_base, default_data_dir()))
    }

    /// Merge the sources without touching the environment or filesystem.
    pub fn resolve(
        file: Option<FileConfig>,
        env_api_base: Option<String>,
        fallback_data_dir: PathBuf,
    ) -> Self {
        let file = file.unwrap_or_default();
        let api_base = non_empty(env_api_base)
            .or_else(|| non_empty(file.api_base))
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Self {
            api_base: normalize_base(&api_base),
            data_dir: file.data_dir.unwrap_or(fallback_data_dir),
        }
    }

    /// Apply a command-line override of the base address.
    pub fn with_api_base(mut self, api_base: Option<String>) -> Self {
        if let Some(base) = non_empty(api_base) {
            self.api_base = normalize_base(&base);
        }
        self
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "expense", "expense-client")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

pub fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".expense-client"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}
