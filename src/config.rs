//! Configuration loading and management
//!
//! Handles parsing of `tasker.toml` in the data directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable that selects the data directory
pub const DATA_DIR_ENV: &str = "TASKER_DIR";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Tasks shown per page in list and search output
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Tasks due within this many hours are flagged as urgent
    #[serde(default = "default_urgent_hours")]
    pub urgent_hours: i64,

    /// Data file names
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            urgent_hours: default_urgent_hours(),
            storage: StorageConfig::default(),
        }
    }
}

fn default_page_size() -> usize {
    6
}

fn default_urgent_hours() -> i64 {
    7
}

/// File names inside the data directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Task collection (JSON list)
    #[serde(default = "default_tasks_file")]
    pub tasks_file: String,

    /// Last issued task id
    #[serde(default = "default_counter_file")]
    pub counter_file: String,
}

fn default_tasks_file() -> String {
    "data.json".to_string()
}

fn default_counter_file() -> String {
    "auto_increment_tasks.txt".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            tasks_file: default_tasks_file(),
            counter_file: default_counter_file(),
        }
    }
}

impl Config {
    /// Load configuration from a `tasker.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a data directory, or return defaults
    pub fn load_from_dir(data_dir: &Path) -> Self {
        let config_path = data_dir.join(crate::storage::CONFIG_FILE);
        if config_path.exists() {
            match Self::load(&config_path) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(path = %config_path.display(), %err, "ignoring invalid config");
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::InvalidConfig("page_size must be > 0".to_string()));
        }
        if self.urgent_hours < 0 {
            return Err(Error::InvalidConfig(
                "urgent_hours cannot be negative".to_string(),
            ));
        }
        self.storage.validate()
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<()> {
        validate_file_name(&self.tasks_file, "storage.tasks_file")?;
        validate_file_name(&self.counter_file, "storage.counter_file")?;
        if self.tasks_file.trim() == self.counter_file.trim() {
            return Err(Error::InvalidConfig(
                "storage.tasks_file and storage.counter_file must differ".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_file_name(name: &str, field: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidConfig(format!("{field} cannot be empty")));
    }
    if trimmed.contains('/') || trimmed.contains('\\') || trimmed == "." || trimmed == ".." {
        return Err(Error::InvalidConfig(format!(
            "{field} must be a plain file name, got '{trimmed}'"
        )));
    }
    Ok(())
}

/// Resolve the data directory: explicit path, then `TASKER_DIR`, then the
/// platform data directory.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    directories::ProjectDirs::from("", "", "tasker")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            Error::InvalidConfig(format!(
                "cannot determine a data directory; pass --dir or set {DATA_DIR_ENV}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.page_size, 6);
        assert_eq!(cfg.urgent_hours, 7);
        assert_eq!(cfg.storage.tasks_file, "data.json");
        assert_eq!(cfg.storage.counter_file, "auto_increment_tasks.txt");
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasker.toml");
        let content = r#"
page_size = 10
urgent_hours = 24

[storage]
tasks_file = "tasks.json"
counter_file = "last_id"
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.page_size, 10);
        assert_eq!(cfg.urgent_hours, 24);
        assert_eq!(cfg.storage.tasks_file, "tasks.json");
        assert_eq!(cfg.storage.counter_file, "last_id");
    }

    #[test]
    fn zero_page_size_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasker.toml");
        fs::write(&path, "page_size = 0").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn nested_file_names_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasker.toml");
        fs::write(&path, "[storage]\ntasks_file = \"../escape.json\"").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn load_from_dir_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path());
        assert_eq!(cfg.page_size, 6);
    }

    #[test]
    fn load_from_dir_defaults_when_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("tasker.toml"), "page_size = \"many\"").expect("write config");
        let cfg = Config::load_from_dir(dir.path());
        assert_eq!(cfg.page_size, 6);
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.toml");
        Config::default().save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("page_size = 6"));
        assert!(written.contains("tasks_file = \"data.json\""));
    }

    #[test]
    fn explicit_data_dir_wins() {
        let dir = resolve_data_dir(Some(PathBuf::from("/tmp/tasker-explicit"))).expect("dir");
        assert_eq!(dir, PathBuf::from("/tmp/tasker-explicit"));
    }
}
