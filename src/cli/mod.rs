//! Command-line interface for tasker
//!
//! This module defines the CLI structure using clap derive macros.
//! Command implementations live in the submodules.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DATA_DIR_ENV;
use crate::error::Result;

mod init;
mod task;

/// tasker - a small persistent task list
///
/// Tasks are kept as JSON in a data directory, one file for the records and
/// one for the last issued id.
#[derive(Parser, Debug)]
#[command(name = "tasker")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data directory)
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    pub dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory, config and empty task files
    Init,

    /// Add a task
    Add {
        /// Task title
        title: String,

        /// Longer description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Category name (exact match when grouping)
        #[arg(short, long, default_value = "general")]
        category: String,

        /// Time until the deadline: h<hours>, d<days>, m<months>, e.g. "d2h5"
        #[arg(long, default_value = "d1", conflicts_with = "deadline")]
        due: String,

        /// Absolute deadline (YYYY-MM-DDTHH:MM:SS[.ffffff])
        #[arg(long)]
        deadline: Option<String>,

        /// Priority: High, Medium or Low
        #[arg(short, long, default_value = "High")]
        priority: String,
    },

    /// List tasks, one page at a time
    List {
        /// Only tasks not yet done
        #[arg(long)]
        incomplete: bool,

        /// Only tasks in this category
        #[arg(long)]
        category: Option<String>,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Show one task in full
    Show {
        /// Task id
        id: u64,
    },

    /// Change fields of a task
    Edit {
        /// Task id
        id: u64,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New category
        #[arg(long)]
        category: Option<String>,

        /// New deadline relative to now, e.g. "h6"
        #[arg(long, conflicts_with = "deadline")]
        due: Option<String>,

        /// New absolute deadline
        #[arg(long)]
        deadline: Option<String>,

        /// New priority
        #[arg(long)]
        priority: Option<String>,
    },

    /// Mark a task as done
    Done {
        /// Task id
        id: u64,
    },

    /// Mark a task as not done
    Reopen {
        /// Task id
        id: u64,
    },

    /// Delete a task
    Rm {
        /// Task id
        id: u64,
    },

    /// Find tasks whose title contains a string (case-insensitive)
    Search {
        /// Text to look for
        query: String,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// List categories with task counts
    Categories,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => init::run(self.dir, self.json, self.quiet),
            Commands::Add {
                title,
                description,
                category,
                due,
                deadline,
                priority,
            } => task::run_add(task::AddOptions {
                title,
                description,
                category,
                due,
                deadline,
                priority,
                dir: self.dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::List {
                incomplete,
                category,
                page,
            } => task::run_list(task::ListOptions {
                incomplete,
                category,
                page,
                dir: self.dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Show { id } => task::run_show(task::ShowOptions {
                id,
                dir: self.dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Edit {
                id,
                title,
                description,
                category,
                due,
                deadline,
                priority,
            } => task::run_edit(task::EditOptions {
                id,
                title,
                description,
                category,
                due,
                deadline,
                priority,
                dir: self.dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Done { id } => task::run_status(task::StatusOptions {
                id,
                complete: true,
                dir: self.dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Reopen { id } => task::run_status(task::StatusOptions {
                id,
                complete: false,
                dir: self.dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Rm { id } => task::run_delete(task::DeleteOptions {
                id,
                dir: self.dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Search { query, page } => task::run_search(task::SearchOptions {
                query,
                page,
                dir: self.dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Categories => task::run_categories(task::CategoriesOptions {
                dir: self.dir,
                json: self.json,
                quiet: self.quiet,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn add_defaults() {
        let cli = Cli::try_parse_from(["tasker", "add", "Buy milk"]).unwrap();
        match cli.command {
            Commands::Add {
                title,
                category,
                due,
                deadline,
                priority,
                ..
            } => {
                assert_eq!(title, "Buy milk");
                assert_eq!(category, "general");
                assert_eq!(due, "d1");
                assert!(deadline.is_none());
                assert_eq!(priority, "High");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn due_and_deadline_conflict() {
        let result = Cli::try_parse_from([
            "tasker",
            "add",
            "x",
            "--due",
            "h1",
            "--deadline",
            "2024-01-01T00:00:00",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tasker", "list", "--json", "--dir", "/tmp/t"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.dir, Some(PathBuf::from("/tmp/t")));
    }
}
