#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tasker::storage::Storage;
use tasker::task::{Priority, TaskRecord, TaskStore};
use tempfile::TempDir;

pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        self.write_file("tasker.toml", contents)
    }

    pub fn read_file(&self, rel_path: &str) -> std::io::Result<String> {
        fs::read_to_string(self.dir.path().join(rel_path))
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.storage().tasks_file()
    }

    pub fn counter_path(&self) -> PathBuf {
        self.storage().counter_file()
    }

    pub fn storage(&self) -> Storage {
        Storage::for_dir(self.dir.path().to_path_buf())
    }

    pub fn store(&self) -> TaskStore {
        TaskStore::open(&self.storage())
    }
}

/// `tasker` binary pointed at `dir`, with logging and the env override cleared
pub fn tasker_cmd(dir: &TestDir) -> Command {
    let mut cmd = Command::cargo_bin("tasker").expect("binary");
    cmd.env_remove("TASKER_DIR")
        .env_remove("RUST_LOG")
        .arg("--dir")
        .arg(dir.path());
    cmd
}

pub fn sample_task(title: &str, category: &str) -> TaskRecord {
    TaskRecord::new(
        title,
        format!("{title} description"),
        category,
        "2030-01-01T09:00:00.000000",
        Priority::Medium,
    )
}
