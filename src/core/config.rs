//! Configuration management with layered hierarchy
//!
//! Sources, lowest priority first: built-in defaults, the global user
//! config (`~/.config/awb/config.yaml`), the workspace config
//! (`.awb/config.yaml`), then `AWB_*` environment variables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::store::DEFAULT_NAMESPACE;

/// Which storage backend a workspace uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One JSON file per key under `.awb/store/`
    #[default]
    Files,
    /// Single SQLite database at `.awb/store.db`
    Sqlite,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Files => write!(f, "files"),
            BackendKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "files" | "file" | "fs" => Ok(BackendKind::Files),
            "sqlite" | "db" => Ok(BackendKind::Sqlite),
            _ => Err(format!("Unknown backend: {} (expected files or sqlite)", s)),
        }
    }
}

/// AWB configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage backend
    pub backend: Option<BackendKind>,

    /// Key namespace
    pub namespace: Option<String>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(awb_dir: Option<&Path>) -> Self {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        if let Some(dir) = awb_dir {
            if let Some(local) = Self::read_file(&dir.join("config.yaml")) {
                config.merge(local);
            }
        }

        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// Parse a config file; a missing or invalid file contributes nothing
    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                None
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "awb")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Apply `AWB_BACKEND` and `AWB_NAMESPACE`
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(backend) = lookup("AWB_BACKEND") {
            match backend.parse() {
                Ok(kind) => self.backend = Some(kind),
                Err(e) => tracing::warn!(error = %e, "ignoring AWB_BACKEND"),
            }
        }
        if let Some(namespace) = lookup("AWB_NAMESPACE").filter(|n| !n.trim().is_empty()) {
            self.namespace = Some(namespace.trim().to_string());
        }
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.backend.is_some() {
            self.backend = other.backend;
        }
        if other.namespace.is_some() {
            self.namespace = other.namespace;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend.unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend(), BackendKind::Files);
        assert_eq!(config.namespace(), "awb");
    }

    #[test]
    fn test_merge_prefers_later_layer() {
        let mut config = Config {
            backend: Some(BackendKind::Sqlite),
            namespace: Some("base".to_string()),
            default_format: None,
        };
        config.merge(Config {
            namespace: Some("override".to_string()),
            ..Default::default()
        });
        assert_eq!(config.backend(), BackendKind::Sqlite);
        assert_eq!(config.namespace(), "override");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(|name| match name {
            "AWB_BACKEND" => Some("sqlite".to_string()),
            "AWB_NAMESPACE" => Some(" team ".to_string()),
            _ => None,
        });
        assert_eq!(config.backend(), BackendKind::Sqlite);
        assert_eq!(config.namespace(), "team");

        config.apply_env(|name| (name == "AWB_BACKEND").then(|| "mongo".to_string()));
        assert_eq!(config.backend(), BackendKind::Sqlite);
    }

    #[test]
    fn test_read_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "backend: sqlite\ndefault_format: json\n").unwrap();
        let config = Config::read_file(&path).unwrap();
        assert_eq!(config.backend, Some(BackendKind::Sqlite));
        assert_eq!(config.default_format.as_deref(), Some("json"));

        std::fs::write(&path, "backend: [").unwrap();
        assert!(Config::read_file(&path).is_none());
    }
}
