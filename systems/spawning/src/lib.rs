#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn admission: finds a free ground position inside a spawn band and
//! instantiates an enemy there through the spawn factory port.

use bowmaster_core::{
    EnemyId, EnemyTypeKey, GroundLocator, OverlapCheck, Position, SpawnArea, SpawnFactory,
};
use bowmaster_registry::EnemyRegistry;
use rand::Rng;
use tracing::{debug, trace};

#[cfg(feature = "scripted_ports")]
pub mod scripted;

/// Reason a single placement attempt was discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AttemptRejection {
    /// Another entity sits within the padding radius of the candidate.
    #[error("candidate position overlaps an existing entity")]
    Overlap,
    /// The spawn factory could not create the instance.
    #[error("spawn factory declined to create the enemy")]
    FactoryDeclined,
    /// The factory returned an identifier the registry already tracks.
    #[error("spawned identifier is already registered")]
    RegistryConflict,
}

/// Failure of a complete spawn request. Always recoverable: callers retry later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SpawnError {
    /// The controller has no spawn area to sample from.
    #[error("no spawn area configured")]
    NoSpawnArea,
    /// Every attempt was rejected.
    #[error("all {attempts} spawn attempts were rejected")]
    AttemptsExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Rejection of the final attempt, if any attempt was made.
        last: Option<AttemptRejection>,
    },
}

/// Ports consumed by spawn admission.
pub struct SpawnPorts {
    /// Instantiates accepted enemies.
    pub factory: Box<dyn SpawnFactory>,
    /// Resolves ground height for candidate positions.
    pub ground: Box<dyn GroundLocator>,
    /// Detects crowded candidate positions.
    pub overlap: Box<dyn OverlapCheck>,
}

impl std::fmt::Debug for SpawnPorts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnPorts").finish_non_exhaustive()
    }
}

/// Places enemies inside the configured spawn areas.
#[derive(Debug)]
pub struct SpawnAdmissionController {
    areas: Vec<SpawnArea>,
    ports: SpawnPorts,
}

impl SpawnAdmissionController {
    /// Creates a controller sampling from `areas` and spawning through `ports`.
    #[must_use]
    pub fn new(areas: Vec<SpawnArea>, ports: SpawnPorts) -> Self {
        Self { areas, ports }
    }

    /// Spawn areas the controller samples from.
    #[must_use]
    pub fn areas(&self) -> &[SpawnArea] {
        &self.areas
    }

    /// Attempts to place one enemy of `enemy_type`.
    ///
    /// On success the enemy has been created, given its movement target, and
    /// registered. On failure nothing created during the call remains
    /// registered or alive.
    pub fn try_spawn<R>(
        &mut self,
        enemy_type: &EnemyTypeKey,
        registry: &mut EnemyRegistry,
        rng: &mut R,
    ) -> Result<EnemyId, SpawnError>
    where
        R: Rng + ?Sized,
    {
        let area = match self.areas.len() {
            0 => return Err(SpawnError::NoSpawnArea),
            1 => &self.areas[0],
            len => &self.areas[rng.gen_range(0..len)],
        };

        let mut last = None;
        for attempt in 0..area.max_attempts {
            let position = resolve_candidate(area, self.ports.ground.as_ref(), rng);

            if self.ports.overlap.has_neighbor(position, area.padding) {
                trace!(attempt, ?position, "spawn candidate overlaps a neighbour");
                last = Some(AttemptRejection::Overlap);
                continue;
            }

            let Some(enemy) = self.ports.factory.create(enemy_type, position, area.target) else {
                trace!(attempt, %enemy_type, "spawn factory declined");
                last = Some(AttemptRejection::FactoryDeclined);
                continue;
            };

            if registry.register(enemy, enemy_type.clone()).is_err() {
                self.ports.factory.destroy(enemy);
                debug!(
                    enemy = enemy.get(),
                    %enemy_type,
                    "rolled back spawn with conflicting identifier"
                );
                last = Some(AttemptRejection::RegistryConflict);
                continue;
            }

            debug!(enemy = enemy.get(), %enemy_type, ?position, "enemy spawned");
            return Ok(enemy);
        }

        Err(SpawnError::AttemptsExhausted {
            attempts: area.max_attempts,
            last,
        })
    }
}

fn resolve_candidate<R>(area: &SpawnArea, ground: &dyn GroundLocator, rng: &mut R) -> Position
where
    R: Rng + ?Sized,
{
    let center = area.center.x();
    let x = if area.half_width > 0.0 {
        rng.gen_range(center - area.half_width..=center + area.half_width)
    } else {
        center
    };

    let probe = area.ground;
    let y = if probe.enabled {
        ground
            .find_ground(x, probe.search_start_y, probe.max_distance)
            .unwrap_or_else(|| {
                trace!(x, "no ground found, using flat ground height");
                probe.flat_y
            })
    } else {
        probe.flat_y
    };

    Position::new(x, y)
}
