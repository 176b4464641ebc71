use bowmaster_core::{ConfigError, SpawnArea};
use serde::Deserialize;

/// Battlefield geometry the headless runner plays a level on.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct ArenaConfig {
    /// Height of the ground, or `None` when the probe never finds ground.
    pub(crate) ground_y: Option<f32>,
    /// Bands enemies spawn in.
    pub(crate) spawn_areas: Vec<SpawnArea>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            ground_y: Some(0.0),
            spawn_areas: vec![SpawnArea::default()],
        }
    }
}

impl ArenaConfig {
    /// Rejects spawn bands the admission controller cannot sample.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        self.spawn_areas.iter().try_for_each(SpawnArea::validate)
    }
}
