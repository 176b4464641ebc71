//! Authorable level schema.
//!
//! Level files are TOML documents. Every duration is written as a number of
//! seconds and every field may be omitted, in which case the authoring default
//! listed on the field applies.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{EnemyTypeKey, Position};

/// Reasons a level cannot be started or loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No level definition was supplied.
    #[error("no level definition assigned")]
    MissingLevel,
    /// No castle damage sink was supplied.
    #[error("no castle damage sink assigned")]
    MissingCastle,
    /// No spawn area was supplied.
    #[error("no spawn area configured")]
    MissingSpawnArea,
    /// The level definition holds a value outside its permitted range.
    #[error("invalid level definition: {reason}")]
    InvalidLevel {
        /// Description of the offending field.
        reason: String,
    },
    /// The level document could not be parsed.
    #[error("failed to parse level definition")]
    Parse(#[from] toml::de::Error),
}

/// Immutable description of a level: its waves and termination policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelDefinition {
    /// One-based level number. Defaults to 1.
    pub level_number: u32,
    /// Human-readable level name. Defaults to `"Level 1"`.
    pub level_name: String,
    /// Nominal level length; zero means unbounded. Defaults to 90 seconds.
    #[serde(with = "seconds")]
    pub round_length: Duration,
    /// When set, the level waits for the battlefield to empty after the
    /// round length elapses. Defaults to `true`.
    pub sudden_death: bool,
    /// Cap on simultaneously alive enemies; zero means unlimited. Defaults to 30.
    pub global_max_alive: u32,
    /// Rewards granted on completion.
    pub rewards: LevelRewards,
    /// Factor applied to every entry interval (`< 1` faster, `> 1` slower).
    pub spawn_interval_multiplier: f32,
    /// Simulation time scale while the level runs. Defaults to 1.
    pub time_scale: f32,
    /// Ordered waves.
    pub waves: Vec<Wave>,
}

impl Default for LevelDefinition {
    fn default() -> Self {
        Self {
            level_number: 1,
            level_name: "Level 1".to_owned(),
            round_length: Duration::from_secs(90),
            sudden_death: true,
            global_max_alive: 30,
            rewards: LevelRewards::default(),
            spawn_interval_multiplier: 1.0,
            time_scale: 1.0,
            waves: Vec::new(),
        }
    }
}

impl LevelDefinition {
    /// Parses and validates a level definition from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let level: Self = toml::from_str(contents)?;
        level.validate()?;
        Ok(level)
    }

    /// Checks the numeric fields that the schema alone cannot constrain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.spawn_interval_multiplier.is_finite() || self.spawn_interval_multiplier < 0.0 {
            return Err(ConfigError::InvalidLevel {
                reason: format!(
                    "spawn_interval_multiplier must be a non-negative number, found {}",
                    self.spawn_interval_multiplier
                ),
            });
        }

        if !self.time_scale.is_finite() || self.time_scale < 0.0 {
            return Err(ConfigError::InvalidLevel {
                reason: format!(
                    "time_scale must be a non-negative number, found {}",
                    self.time_scale
                ),
            });
        }

        Ok(())
    }

    /// Instant after level start at which the round ends, or `None` when the
    /// round is unbounded.
    #[must_use]
    pub fn round_deadline(&self) -> Option<Duration> {
        (!self.round_length.is_zero()).then_some(self.round_length)
    }
}

/// Rewards granted when a level completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelRewards {
    /// Coins awarded. Defaults to 50.
    pub coins: u32,
    /// Score added. Defaults to 1000.
    pub score: u32,
}

impl Default for LevelRewards {
    fn default() -> Self {
        Self {
            coins: 50,
            score: 1_000,
        }
    }
}

/// Trigger that launches a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum WaveStart {
    /// Starts once the previous chained wave finished spawning. Written as
    /// any negative number of seconds.
    Chained,
    /// Starts at the given offset from level start.
    At(Duration),
}

impl TryFrom<f64> for WaveStart {
    type Error = String;

    fn try_from(seconds: f64) -> Result<Self, Self::Error> {
        if seconds.is_nan() {
            return Err("wave start must be a number of seconds".to_owned());
        }
        if seconds < 0.0 {
            return Ok(Self::Chained);
        }
        Duration::try_from_secs_f64(seconds)
            .map(Self::At)
            .map_err(|err| format!("invalid wave start {seconds}: {err}"))
    }
}

impl From<WaveStart> for f64 {
    fn from(start: WaveStart) -> Self {
        match start {
            WaveStart::Chained => -1.0,
            WaveStart::At(offset) => offset.as_secs_f64(),
        }
    }
}

/// Timed group of spawn entries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wave {
    /// Trigger for this wave. Defaults to chained.
    pub start_at: WaveStart,
    /// Longest time the wave may keep spawning; zero means unbounded.
    #[serde(with = "seconds")]
    pub max_duration: Duration,
    /// Tick every entry each step (`true`) or finish entries one after
    /// another (`false`). Defaults to `true`.
    pub interleave_entries: bool,
    /// Free-form designer annotation.
    pub note: String,
    /// Ordered spawn entries.
    pub entries: Vec<WaveEntry>,
}

impl Default for Wave {
    fn default() -> Self {
        Self {
            start_at: WaveStart::Chained,
            max_duration: Duration::ZERO,
            interleave_entries: true,
            note: String::new(),
            entries: Vec::new(),
        }
    }
}

/// Spawn schedule of a single enemy type within a wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveEntry {
    /// Archetype to spawn; entries without one are skipped.
    pub enemy_type: Option<EnemyTypeKey>,
    /// Total number of enemies to spawn. Defaults to 5.
    pub count: u32,
    /// Time between spawns. Defaults to 2 seconds.
    #[serde(with = "seconds")]
    pub interval: Duration,
    /// Delay after wave start before the first spawn.
    #[serde(with = "seconds")]
    pub start_delay: Duration,
    /// Uniform random offset applied to each interval in both directions.
    /// Defaults to 0.25 seconds.
    #[serde(with = "seconds")]
    pub interval_jitter: Duration,
    /// Cap on simultaneously alive enemies of this type; zero means unlimited.
    pub per_entry_max_alive: u32,
}

impl Default for WaveEntry {
    fn default() -> Self {
        Self {
            enemy_type: None,
            count: 5,
            interval: Duration::from_secs(2),
            start_delay: Duration::ZERO,
            interval_jitter: Duration::from_millis(250),
            per_entry_max_alive: 0,
        }
    }
}

/// Horizontal band in which enemies enter the battlefield.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnArea {
    /// Centre of the band; only its x coordinate is used for sampling.
    pub center: Position,
    /// Half of the band width.
    pub half_width: f32,
    /// Ground resolution settings.
    pub ground: GroundProbe,
    /// Clearance required around a candidate position.
    pub padding: f32,
    /// Attempts per spawn request before giving up.
    pub max_attempts: u32,
    /// Movement target handed to every enemy spawned here.
    pub target: Position,
}

impl Default for SpawnArea {
    fn default() -> Self {
        Self {
            center: Position::new(8.0, 0.0),
            half_width: 0.1,
            ground: GroundProbe::default(),
            padding: 0.05,
            max_attempts: 3,
            target: Position::new(-8.0, -3.0),
        }
    }
}

impl SpawnArea {
    /// Checks that the band can be sampled: every coordinate finite, the
    /// half width non-negative and the band's full width representable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("center.x", self.center.x()),
            ("center.y", self.center.y()),
            ("half_width", self.half_width),
            ("padding", self.padding),
            ("target.x", self.target.x()),
            ("target.y", self.target.y()),
            ("ground.search_start_y", self.ground.search_start_y),
            ("ground.max_distance", self.ground.max_distance),
            ("ground.flat_y", self.ground.flat_y),
        ];
        if let Some((field, value)) = finite.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ConfigError::InvalidLevel {
                reason: format!("spawn area {field} must be finite, found {value}"),
            });
        }

        if self.half_width < 0.0 {
            return Err(ConfigError::InvalidLevel {
                reason: format!(
                    "spawn area half_width must not be negative, found {}",
                    self.half_width
                ),
            });
        }

        let low = self.center.x() - self.half_width;
        let high = self.center.x() + self.half_width;
        if !low.is_finite() || !high.is_finite() || !(high - low).is_finite() {
            return Err(ConfigError::InvalidLevel {
                reason: format!(
                    "spawn band around x = {} with half_width {} exceeds the coordinate range",
                    self.center.x(),
                    self.half_width
                ),
            });
        }

        Ok(())
    }
}

/// How spawn admission resolves the ground height of a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundProbe {
    /// Query the ground locator; when disabled `flat_y` is always used.
    pub enabled: bool,
    /// Height the downward search starts from.
    pub search_start_y: f32,
    /// Longest downward search distance.
    pub max_distance: f32,
    /// Height used when the locator is disabled or finds nothing.
    pub flat_y: f32,
}

impl Default for GroundProbe {
    fn default() -> Self {
        Self {
            enabled: true,
            search_start_y: 12.0,
            max_distance: 50.0,
            flat_y: -3.0,
        }
    }
}

mod seconds {
    use std::time::Duration;

    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(seconds).map_err(|_| {
            D::Error::custom(format!(
                "expected a non-negative number of seconds, found {seconds}"
            ))
        })
    }
}
