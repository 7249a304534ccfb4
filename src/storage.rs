//! Storage layer for tasker
//!
//! Everything lives in a single data directory:
//!
//! ```text
//! <data dir>/
//!   tasker.toml                 # Configuration (optional)
//!   data.json                   # Ordered list of task records
//!   auto_increment_tasks.txt    # Last issued task id, decimal text
//! ```
//!
//! File names of the two data files come from `[storage]` in the config.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::config::{Config, StorageConfig};
use crate::error::{Error, Result};

/// Name of the configuration file inside the data directory
pub const CONFIG_FILE: &str = "tasker.toml";

/// Indentation used for the task collection file
const JSON_INDENT: &[u8] = b"    ";

/// Path layout of a tasker data directory
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
    tasks_file: String,
    counter_file: String,
}

impl Storage {
    pub fn new(data_dir: PathBuf, config: &StorageConfig) -> Self {
        Self {
            data_dir,
            tasks_file: config.tasks_file.clone(),
            counter_file: config.counter_file.clone(),
        }
    }

    /// Storage for a data directory, reading file names from its config
    pub fn for_dir(data_dir: PathBuf) -> Self {
        let config = Config::load_from_dir(&data_dir);
        Self::new(data_dir, &config.storage)
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path to the configuration file
    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Path to the task collection
    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir.join(&self.tasks_file)
    }

    /// Path to the identifier counter
    pub fn counter_file(&self) -> PathBuf {
        self.data_dir.join(&self.counter_file)
    }

    /// Create the data directory if needed
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    /// Check if the task collection exists yet
    pub fn is_initialized(&self) -> bool {
        self.tasks_file().exists()
    }
}

// =============================================================================
// File I/O helpers (atomic writes for safety)
// =============================================================================

/// Serialize `data` as indented JSON and write it atomically
///
/// Non-ASCII text is written verbatim.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    let bytes = to_json_bytes(data)?;
    write_atomic(path, &bytes)
}

/// Serialize `data` the same way `write_json` lays it out on disk
pub fn to_json_bytes<T: Serialize + ?Sized>(data: &T) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    data.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Read JSON data from a file, reporting parse failures as corrupt storage
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| Error::StorageCorrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Write data atomically using temp file + rename
///
/// Readers see either the old or the new contents, never a partial write.
/// This does not serialize concurrent writers: the last rename wins.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = temp_path_for(path);

    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
