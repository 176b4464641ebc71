#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the BowMaster spawn scheduler.
//!
//! This crate defines the vocabulary that connects the level scheduler, the
//! wave schedulers, spawn admission, and the excluded game subsystems. Level
//! files deserialize into [`LevelDefinition`] values, schedulers report
//! progress as [`Event`] values through an [`EventSink`], and everything the
//! scheduler needs from the outside world is reached through the narrow port
//! traits re-exported from [`ports`].

use serde::{Deserialize, Serialize};

mod level;
pub mod ports;

pub use level::{
    ConfigError, GroundProbe, LevelDefinition, LevelRewards, SpawnArea, Wave, WaveEntry,
    WaveStart,
};
pub use ports::{CastleDamageSink, EventSink, GroundLocator, OverlapCheck, SpawnFactory};

/// Identifier assigned to a spawned enemy by the spawn factory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u64);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Key naming an enemy archetype, used both to instantiate enemies and to
/// count them per type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnemyTypeKey(String);

impl EnemyTypeKey {
    /// Creates a new enemy type key.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name of the enemy archetype.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EnemyTypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Zero-based position of a wave within its level definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaveIndex(usize);

impl WaveIndex {
    /// Creates a new wave index wrapper.
    #[must_use]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// Retrieves the underlying index.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

/// Point on the two-dimensional battlefield expressed in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance between two positions.
    #[must_use]
    pub fn distance(self, other: Position) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Lifecycle notifications emitted by the schedulers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A level transitioned from idle into the running state.
    LevelStarted {
        /// One-based number of the level that started.
        level_number: u32,
    },
    /// A wave's trigger fired and its scheduler was launched.
    WaveStarted {
        /// Wave that began spawning.
        wave: WaveIndex,
    },
    /// A chained wave finished spawning and released the sequence.
    WaveCompleted {
        /// Wave that finished.
        wave: WaveIndex,
    },
    /// An enemy passed admission control and entered the battlefield.
    EnemySpawned {
        /// Identifier returned by the spawn factory.
        enemy: EnemyId,
        /// Archetype of the spawned enemy.
        enemy_type: EnemyTypeKey,
        /// Wave whose entry produced the enemy.
        wave: WaveIndex,
    },
    /// The level ended successfully.
    LevelCompleted {
        /// One-based number of the completed level.
        level_number: u32,
        /// Rewards granted for completing the level.
        rewards: LevelRewards,
    },
    /// The level ended because the castle was destroyed.
    LevelFailed {
        /// One-based number of the failed level.
        level_number: u32,
    },
}
