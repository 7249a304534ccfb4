//! Task id allocation backed by a persisted counter file.
//!
//! The counter file holds the decimal text of the last issued id. A missing
//! file is created holding `0`, so the first id handed out is `1`. Content
//! that is not a non-negative integer is read as `1`: losing the exact next
//! id is recoverable, crashing the caller is not.
//!
//! Allocation is read-then-write without locking; only one writer may use a
//! counter file at a time.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::storage;

/// Value written to a freshly created counter file
pub const INITIAL_COUNTER: u64 = 0;

/// Value assumed when the counter file holds something unreadable
pub const FALLBACK_COUNTER: u64 = 1;

#[derive(Debug, Clone)]
pub struct IdAllocator {
    path: PathBuf,
}

impl IdAllocator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the last issued id, creating the counter file if it is missing
    pub fn load(&self) -> Result<u64> {
        if !self.path.exists() {
            self.store(INITIAL_COUNTER)?;
            return Ok(INITIAL_COUNTER);
        }

        let content = fs::read_to_string(&self.path)?;
        match parse_counter(&content) {
            Some(value) => Ok(value),
            None => {
                tracing::warn!(
                    path = %self.path.display(),
                    "counter file is unreadable, assuming {FALLBACK_COUNTER}"
                );
                Ok(FALLBACK_COUNTER)
            }
        }
    }

    /// Overwrite the counter with `value`
    pub fn store(&self, value: u64) -> Result<u64> {
        storage::write_atomic(&self.path, value.to_string().as_bytes())?;
        Ok(value)
    }

    /// Issue the next id
    ///
    /// Fails without touching the file once the counter holds `u64::MAX`.
    pub fn next(&self) -> Result<u64> {
        let current = self.load()?;
        let next = current
            .checked_add(1)
            .ok_or(Error::IdsExhausted { last: current })?;
        self.store(next)
    }
}

fn parse_counter(content: &str) -> Option<u64> {
    let trimmed = content.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}
