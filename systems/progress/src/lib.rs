#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tracks which levels the player has unlocked and persists the counter.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use bowmaster_core::Event;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Errors raised while loading or saving progress.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// The progress file could not be read or written.
    #[error("progress file {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The progress file is not valid TOML.
    #[error("malformed progress file: {0}")]
    Parse(#[from] toml::de::Error),
    /// The progress could not be encoded.
    #[error("failed to encode progress: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Highest unlocked level, as a zero-based level index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    highest_unlocked: u32,
}

impl Progress {
    /// Creates progress with only the first level unlocked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-based index of the highest unlocked level.
    #[must_use]
    pub const fn highest_unlocked(&self) -> u32 {
        self.highest_unlocked
    }

    /// Reports whether the level at `index` may be played.
    #[must_use]
    pub const fn is_unlocked(&self, index: u32) -> bool {
        index <= self.highest_unlocked
    }

    /// Unlocks every level up to and including `index`. Never locks levels.
    ///
    /// Returns `true` when the counter moved.
    pub fn unlock_up_to(&mut self, index: u32) -> bool {
        if index <= self.highest_unlocked {
            return false;
        }
        info!(from = self.highest_unlocked, to = index, "levels unlocked");
        self.highest_unlocked = index;
        true
    }

    /// Locks every level but the first.
    pub fn reset(&mut self) {
        self.highest_unlocked = 0;
    }

    /// Unlocks the level following every completed level in `events`.
    ///
    /// Returns `true` when any event moved the counter.
    pub fn handle(&mut self, events: &[Event]) -> bool {
        let mut changed = false;
        for event in events {
            if let Event::LevelCompleted { level_number, .. } = event {
                // Level numbers are one-based, so the number is the next index.
                changed |= self.unlock_up_to(*level_number);
            }
        }
        changed
    }
}

/// TOML file backing a [`Progress`].
#[derive(Clone, Debug)]
pub struct ProgressFile {
    path: PathBuf,
}

impl ProgressFile {
    /// Binds progress persistence to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the progress file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored progress; a missing file yields the default.
    pub fn load(&self) -> Result<Progress, ProgressError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no progress file, starting fresh");
                return Ok(Progress::default());
            }
            Err(source) => return Err(self.io_error(source)),
        };
        Ok(toml::from_str(&contents)?)
    }

    /// Writes `progress`, replacing any previous contents.
    pub fn save(&self, progress: &Progress) -> Result<(), ProgressError> {
        let contents = toml::to_string(progress)?;
        fs::write(&self.path, contents).map_err(|source| self.io_error(source))?;
        debug!(path = %self.path.display(), highest = progress.highest_unlocked, "progress saved");
        Ok(())
    }

    /// Deletes the stored progress; a missing file is not an error.
    pub fn clear(&self) -> Result<(), ProgressError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: io::Error) -> ProgressError {
        ProgressError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
