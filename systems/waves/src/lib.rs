#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-wave spawn timeline.
//!
//! A [`WaveScheduler`] owns the runtime state of one launched wave and is
//! advanced once per simulation step. Each step it decides, entry by entry,
//! whether a spawn is due and allowed by the alive caps, and forwards due
//! spawns to spawn admission.

use std::time::Duration;

use bowmaster_core::{
    EnemyTypeKey, Event, EventSink, LevelDefinition, Wave, WaveEntry, WaveIndex,
};
use bowmaster_registry::EnemyRegistry;
use bowmaster_system_spawning::SpawnAdmissionController;
use rand::Rng;
use tracing::{debug, info, warn};

/// Delay before retrying an entry whose spawn request was rejected.
pub const SPAWN_RETRY_DELAY: Duration = Duration::from_millis(150);

/// Shortest gap allowed between two successful spawns of the same entry.
pub const MIN_SPAWN_GAP: Duration = Duration::from_millis(10);

/// Level-wide settings every wave scheduler honours.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveLimits {
    /// Cap on enemies alive across the level; zero means unlimited.
    pub global_max_alive: u32,
    /// Factor applied to every entry interval.
    pub spawn_interval_multiplier: f32,
}

impl WaveLimits {
    /// Extracts the limits declared by a level.
    #[must_use]
    pub fn from_level(level: &LevelDefinition) -> Self {
        Self {
            global_max_alive: level.global_max_alive,
            spawn_interval_multiplier: level.spawn_interval_multiplier,
        }
    }
}

impl Default for WaveLimits {
    fn default() -> Self {
        Self {
            global_max_alive: 0,
            spawn_interval_multiplier: 1.0,
        }
    }
}

/// Lifecycle of a launched wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveProgress {
    /// At least one entry still has enemies left to spawn.
    Active,
    /// Every entry spawned its full count.
    Exhausted,
    /// The wave's maximum duration elapsed before it was exhausted.
    Expired,
    /// The owning level stopped the wave.
    Cancelled,
}

impl WaveProgress {
    /// Reports whether the wave will never spawn again.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// Spawn bookkeeping for a single wave entry.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryRuntimeState {
    entry: WaveEntry,
    enemy_type: EnemyTypeKey,
    next_spawn_at: Duration,
    spawned_count: u32,
}

impl EntryRuntimeState {
    fn new(entry: &WaveEntry, enemy_type: EnemyTypeKey, now: Duration) -> Self {
        Self {
            entry: entry.clone(),
            enemy_type,
            next_spawn_at: now.saturating_add(entry.start_delay),
            spawned_count: 0,
        }
    }

    /// Entry definition this state tracks.
    #[must_use]
    pub fn entry(&self) -> &WaveEntry {
        &self.entry
    }

    /// Archetype spawned by the entry.
    #[must_use]
    pub fn enemy_type(&self) -> &EnemyTypeKey {
        &self.enemy_type
    }

    /// Earliest simulation time of the next spawn attempt.
    #[must_use]
    pub fn next_spawn_at(&self) -> Duration {
        self.next_spawn_at
    }

    /// Enemies spawned so far.
    #[must_use]
    pub fn spawned_count(&self) -> u32 {
        self.spawned_count
    }

    /// Reports whether the entry spawned its full count.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.spawned_count >= self.entry.count
    }
}

/// Outcome of ticking one entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EntryTick {
    Inactive,
    Blocked,
    Waiting,
    Spawned,
    Retrying,
}

impl EntryTick {
    const fn is_active(self) -> bool {
        !matches!(self, Self::Inactive)
    }
}

/// Collaborators borrowed for the duration of one wave tick.
struct TickContext<'a, R: ?Sized, E: ?Sized> {
    now: Duration,
    wave: WaveIndex,
    limits: WaveLimits,
    registry: &'a mut EnemyRegistry,
    admission: &'a mut SpawnAdmissionController,
    rng: &'a mut R,
    out: &'a mut E,
}

/// Drives the spawn timeline of one launched wave.
#[derive(Clone, Debug)]
pub struct WaveScheduler {
    index: WaveIndex,
    limits: WaveLimits,
    interleave: bool,
    started_at: Duration,
    deadline: Option<Duration>,
    entries: Vec<EntryRuntimeState>,
    progress: WaveProgress,
}

impl WaveScheduler {
    /// Launches `wave` at simulation time `now`.
    ///
    /// Entries without an enemy type are skipped and never counted.
    #[must_use]
    pub fn new(index: WaveIndex, wave: &Wave, limits: WaveLimits, now: Duration) -> Self {
        let mut entries = Vec::with_capacity(wave.entries.len());
        for (position, entry) in wave.entries.iter().enumerate() {
            let Some(enemy_type) = entry.enemy_type.clone() else {
                warn!(
                    wave = index.get(),
                    entry = position,
                    "wave entry has no enemy type, skipping"
                );
                continue;
            };
            entries.push(EntryRuntimeState::new(entry, enemy_type, now));
        }

        let deadline =
            (!wave.max_duration.is_zero()).then(|| now.saturating_add(wave.max_duration));

        info!(
            wave = index.get(),
            entries = entries.len(),
            interleave = wave.interleave_entries,
            "wave launched"
        );

        Self {
            index,
            limits,
            interleave: wave.interleave_entries,
            started_at: now,
            deadline,
            entries,
            progress: WaveProgress::Active,
        }
    }

    /// Position of the wave within its level.
    #[must_use]
    pub fn index(&self) -> WaveIndex {
        self.index
    }

    /// Simulation time at which the wave launched.
    #[must_use]
    pub fn started_at(&self) -> Duration {
        self.started_at
    }

    /// Runtime state of every valid entry, in definition order.
    #[must_use]
    pub fn entries(&self) -> &[EntryRuntimeState] {
        &self.entries
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn progress(&self) -> WaveProgress {
        self.progress
    }

    /// Reports whether the wave may still spawn.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.progress.is_finished()
    }

    /// Reports whether the wave ran its course, either by spawning its full
    /// count or by reaching its maximum duration. A cancelled wave is neither
    /// active nor completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(
            self.progress,
            WaveProgress::Exhausted | WaveProgress::Expired
        )
    }

    /// Stops the wave; later ticks do nothing.
    pub fn cancel(&mut self) {
        if self.is_active() {
            debug!(wave = self.index.get(), "wave cancelled");
            self.progress = WaveProgress::Cancelled;
        }
    }

    /// Advances the wave to simulation time `now`.
    pub fn tick<R, E>(
        &mut self,
        now: Duration,
        registry: &mut EnemyRegistry,
        admission: &mut SpawnAdmissionController,
        rng: &mut R,
        out: &mut E,
    ) -> WaveProgress
    where
        R: Rng + ?Sized,
        E: EventSink + ?Sized,
    {
        if self.progress.is_finished() {
            return self.progress;
        }

        if self.deadline.is_some_and(|deadline| now >= deadline) {
            info!(wave = self.index.get(), "wave reached its maximum duration");
            self.progress = WaveProgress::Expired;
            return self.progress;
        }

        let mut context = TickContext {
            now,
            wave: self.index,
            limits: self.limits,
            registry,
            admission,
            rng,
            out,
        };

        let exhausted = if self.interleave {
            let mut all_done = true;
            for entry in &mut self.entries {
                let outcome = try_tick_entry(entry, &mut context);
                all_done &= !outcome.is_active();
            }
            all_done
        } else {
            !self
                .entries
                .iter_mut()
                .any(|entry| try_tick_entry(entry, &mut context).is_active())
        };

        if exhausted {
            info!(wave = self.index.get(), "wave exhausted");
            self.progress = WaveProgress::Exhausted;
        }

        self.progress
    }
}

fn try_tick_entry<R, E>(
    entry: &mut EntryRuntimeState,
    context: &mut TickContext<'_, R, E>,
) -> EntryTick
where
    R: Rng + ?Sized,
    E: EventSink + ?Sized,
{
    if entry.is_done() {
        return EntryTick::Inactive;
    }

    let global_cap = context.limits.global_max_alive as usize;
    if global_cap > 0 && context.registry.count_all() >= global_cap {
        return EntryTick::Blocked;
    }

    let entry_cap = entry.entry.per_entry_max_alive as usize;
    if entry_cap > 0 && context.registry.count_by_type(&entry.enemy_type) >= entry_cap {
        return EntryTick::Blocked;
    }

    if context.now < entry.next_spawn_at {
        return EntryTick::Waiting;
    }

    match context
        .admission
        .try_spawn(&entry.enemy_type, &mut *context.registry, &mut *context.rng)
    {
        Ok(enemy) => {
            entry.spawned_count += 1;
            let gap = next_spawn_gap(&entry.entry, context.limits, &mut *context.rng);
            entry.next_spawn_at = context.now.saturating_add(gap);
            context.out.emit(Event::EnemySpawned {
                enemy,
                enemy_type: entry.enemy_type.clone(),
                wave: context.wave,
            });
            debug!(
                wave = context.wave.get(),
                enemy_type = %entry.enemy_type,
                spawned = entry.spawned_count,
                count = entry.entry.count,
                next_in = ?gap,
                "entry spawned"
            );
            EntryTick::Spawned
        }
        Err(err) => {
            entry.next_spawn_at = context.now.saturating_add(SPAWN_RETRY_DELAY);
            debug!(
                wave = context.wave.get(),
                enemy_type = %entry.enemy_type,
                error = %err,
                "spawn rejected, retrying shortly"
            );
            EntryTick::Retrying
        }
    }
}

fn next_spawn_gap<R>(entry: &WaveEntry, limits: WaveLimits, rng: &mut R) -> Duration
where
    R: Rng + ?Sized,
{
    let jitter = if entry.interval_jitter.is_zero() {
        0.0
    } else {
        let spread = entry.interval_jitter.as_secs_f64();
        rng.gen_range(-spread..=spread)
    };
    let scaled = entry.interval.as_secs_f64() * f64::from(limits.spawn_interval_multiplier);
    let seconds = (scaled + jitter).max(MIN_SPAWN_GAP.as_secs_f64());
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}
