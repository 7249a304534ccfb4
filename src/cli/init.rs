//! tasker init command implementation
//!
//! Creates the data directory with a default config, an empty task list and
//! a fresh id counter. Existing files are left alone.

use std::path::PathBuf;

use crate::config::{resolve_data_dir, Config};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::{Storage, CONFIG_FILE};
use crate::task::TaskStore;

#[derive(serde::Serialize)]
struct InitReport {
    dir: PathBuf,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    dir: bool,
    config: bool,
    tasks: bool,
    counter: bool,
}

pub fn run(dir: Option<PathBuf>, json: bool, quiet: bool) -> Result<()> {
    let data_dir = resolve_data_dir(dir)?;
    let created_dir = !data_dir.exists();

    let config = Config::load_from_dir(&data_dir);
    let storage = Storage::new(data_dir.clone(), &config.storage);
    storage.init()?;

    let created_config = !storage.config_file().exists();
    if created_config {
        config.save(&storage.config_file())?;
    }

    let store = TaskStore::open(&storage);
    let created_tasks = !storage.is_initialized();
    store.load_all()?;
    let created_counter = !storage.counter_file().exists();
    store.ids().load()?;

    tracing::debug!(dir = %storage.data_dir().display(), "data directory ready");

    let report = InitReport {
        dir: storage.data_dir().to_path_buf(),
        created: InitCreated {
            dir: created_dir,
            config: created_config,
            tasks: created_tasks,
            counter: created_counter,
        },
    };

    let mut created_items = Vec::new();
    if created_config {
        created_items.push(CONFIG_FILE.to_string());
    }
    if created_tasks {
        created_items.push(config.storage.tasks_file.clone());
    }
    if created_counter {
        created_items.push(config.storage.counter_file.clone());
    }

    let header = if created_items.is_empty() {
        "tasker init: nothing to do".to_string()
    } else {
        "tasker init: initialized data directory".to_string()
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("dir", storage.data_dir().display().to_string());
    human.push_summary(
        "created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    human.push_next_step("tasker add <title> --due d1");

    emit_success(OutputOptions { json, quiet }, "init", &report, Some(&human))
}
