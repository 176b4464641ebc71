#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level lifecycle for BowMaster.
//!
//! The [`LevelScheduler`] turns a [`LevelDefinition`] into a running level:
//! it launches waves as their triggers fire, ticks every launched wave and
//! ends the level once its termination policy is satisfied or the castle
//! falls. The scheduler is a pure per-tick state machine; callers advance it
//! with [`LevelScheduler::tick`] and feed back enemy removals and the castle
//! destroyed signal.

mod clock;
mod runtime;

use std::{sync::Arc, time::Duration};

use bowmaster_core::{
    CastleDamageSink, ConfigError, EnemyId, EnemyTypeKey, Event, EventSink, LevelDefinition,
    SpawnArea,
};
use bowmaster_registry::EnemyRegistry;
use bowmaster_system_spawning::{SpawnAdmissionController, SpawnPorts};
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};
use tracing::{info, warn};

pub use clock::{SimulationClock, MIN_TIME_SCALE};
pub use runtime::{RuntimeLevelState, SequencerStep};

/// Reasons a level refused to start.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    /// The level setup is incomplete or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The level is already running.
    #[error("level is already running")]
    AlreadyRunning,
}

/// Lifecycle of a level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LevelStatus {
    /// Never started.
    #[default]
    Idle,
    /// Waves are being launched or the level awaits termination.
    Running,
    /// The level ended successfully.
    Completed,
    /// The castle was destroyed.
    Failed,
}

/// Everything a level needs besides the spawn ports.
pub struct LevelSetup {
    /// Level to play.
    pub level: Option<LevelDefinition>,
    /// Castle defended by the player.
    pub castle: Option<Box<dyn CastleDamageSink>>,
    /// Bands enemies spawn in.
    pub spawn_areas: Vec<SpawnArea>,
    /// Seed of the jitter and placement random source.
    pub rng_seed: u64,
}

impl std::fmt::Debug for LevelSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelSetup")
            .field("level", &self.level)
            .field("castle", &self.castle.is_some())
            .field("spawn_areas", &self.spawn_areas)
            .field("rng_seed", &self.rng_seed)
            .finish()
    }
}

/// Orchestrates waves and termination for one level.
pub struct LevelScheduler<E> {
    level: Option<Arc<LevelDefinition>>,
    castle: Option<Box<dyn CastleDamageSink>>,
    admission: SpawnAdmissionController,
    registry: EnemyRegistry,
    clock: SimulationClock,
    rng_seed: u64,
    rng: ChaCha8Rng,
    status: LevelStatus,
    runtime: Option<RuntimeLevelState>,
    events: E,
}

impl<E> std::fmt::Debug for LevelScheduler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelScheduler")
            .field("status", &self.status)
            .field("clock", &self.clock)
            .field("alive", &self.registry.count_all())
            .finish_non_exhaustive()
    }
}

impl<E> LevelScheduler<E>
where
    E: EventSink,
{
    /// Creates an idle scheduler emitting into `events`.
    #[must_use]
    pub fn new(setup: LevelSetup, ports: SpawnPorts, events: E) -> Self {
        let LevelSetup {
            level,
            castle,
            spawn_areas,
            rng_seed,
        } = setup;
        Self {
            level: level.map(Arc::new),
            castle,
            admission: SpawnAdmissionController::new(spawn_areas, ports),
            registry: EnemyRegistry::new(),
            clock: SimulationClock::new(),
            rng_seed,
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
            status: LevelStatus::Idle,
            runtime: None,
            events,
        }
    }

    /// Starts the configured level at the current simulation time.
    ///
    /// Waves whose trigger is already due launch and take their first tick
    /// before this returns.
    pub fn start_level(&mut self) -> Result<(), StartError> {
        let level = match self.validate_start() {
            Ok(level) => level,
            Err(err) => {
                warn!(error = %err, "level start rejected");
                return Err(err);
            }
        };

        self.registry = EnemyRegistry::new();
        self.rng = ChaCha8Rng::seed_from_u64(self.rng_seed);
        self.clock.apply_time_scale(level.time_scale);
        self.runtime = Some(RuntimeLevelState::new(Arc::clone(&level), self.clock.now()));
        self.status = LevelStatus::Running;

        info!(
            level = level.level_number,
            name = %level.level_name,
            waves = level.waves.len(),
            spawn_areas = self.admission.areas().len(),
            time_scale = self.clock.time_scale(),
            "level started"
        );
        self.events.emit(Event::LevelStarted {
            level_number: level.level_number,
        });

        self.step();
        Ok(())
    }

    fn validate_start(&self) -> Result<Arc<LevelDefinition>, StartError> {
        if self.status == LevelStatus::Running {
            return Err(StartError::AlreadyRunning);
        }
        let level = self.level.as_ref().ok_or(ConfigError::MissingLevel)?;
        if self.castle.is_none() {
            return Err(ConfigError::MissingCastle.into());
        }
        if self.admission.areas().is_empty() {
            return Err(ConfigError::MissingSpawnArea.into());
        }
        for area in self.admission.areas() {
            area.validate()?;
        }
        level.validate()?;
        Ok(Arc::clone(level))
    }

    /// Advances simulation time by `dt` scaled by the level's time scale and
    /// runs one scheduling step.
    pub fn tick(&mut self, dt: Duration) {
        let _ = self.clock.advance(dt);
        self.step();
    }

    fn step(&mut self) {
        let now = self.clock.now();
        let Some(runtime) = self.runtime.as_mut() else {
            return;
        };

        if runtime.advance(now, &self.registry, &mut self.events) {
            self.stop_level(false);
            return;
        }

        runtime.tick_waves(
            now,
            &mut self.registry,
            &mut self.admission,
            &mut self.rng,
            &mut self.events,
        );
    }

    /// Ends a running level, emitting exactly one completion or failure event.
    ///
    /// Calling this on a level that is not running does nothing.
    pub fn stop_level(&mut self, as_failure: bool) {
        if self.status != LevelStatus::Running {
            return;
        }
        let Some(mut runtime) = self.runtime.take() else {
            return;
        };

        runtime.cancel_waves();
        self.clock.reset_time_scale();

        let level = runtime.level();
        if as_failure {
            self.status = LevelStatus::Failed;
            info!(level = level.level_number, "level failed");
            self.events.emit(Event::LevelFailed {
                level_number: level.level_number,
            });
        } else {
            self.status = LevelStatus::Completed;
            info!(
                level = level.level_number,
                alive = self.registry.count_all(),
                "level completed"
            );
            self.events.emit(Event::LevelCompleted {
                level_number: level.level_number,
                rewards: level.rewards,
            });
        }
    }

    /// Handles the castle destroyed signal by failing a running level.
    pub fn castle_destroyed(&mut self) {
        if self.status == LevelStatus::Running {
            warn!("castle destroyed");
            self.stop_level(true);
        }
    }

    /// Forwards combat damage to the castle.
    pub fn damage_castle(&mut self, amount: u32) {
        if let Some(castle) = self.castle.as_mut() {
            castle.apply_damage(amount);
        }
    }

    /// Forgets an enemy that died or left the battlefield.
    ///
    /// Returns the enemy's type when it was registered.
    pub fn enemy_removed(&mut self, enemy: EnemyId) -> Option<EnemyTypeKey> {
        self.registry.unregister(enemy)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> LevelStatus {
        self.status
    }

    /// Current simulation time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Time scale currently applied to ticks.
    #[must_use]
    pub fn time_scale(&self) -> f32 {
        self.clock.time_scale()
    }

    /// Enemies spawned by the current or most recent run and still alive.
    #[must_use]
    pub fn registry(&self) -> &EnemyRegistry {
        &self.registry
    }

    /// State of the running level, if any.
    #[must_use]
    pub fn runtime(&self) -> Option<&RuntimeLevelState> {
        self.runtime.as_ref()
    }

    /// Sink receiving the scheduler's events.
    #[must_use]
    pub fn event_sink(&self) -> &E {
        &self.events
    }

    /// Mutable access to the event sink, e.g. for draining buffered events.
    pub fn event_sink_mut(&mut self) -> &mut E {
        &mut self.events
    }
}
