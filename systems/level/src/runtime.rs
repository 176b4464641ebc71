use std::{sync::Arc, time::Duration};

use bowmaster_core::{Event, EventSink, LevelDefinition, WaveIndex, WaveStart};
use bowmaster_registry::EnemyRegistry;
use bowmaster_system_spawning::SpawnAdmissionController;
use bowmaster_system_waves::{WaveLimits, WaveScheduler};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// Position of the wave sequencer within a level run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerStep {
    /// Waiting for the trigger of the current wave.
    Launching,
    /// Blocked until the chained wave in `slot` finishes.
    AwaitingChained {
        /// Index into the launched waves.
        slot: usize,
    },
    /// Every wave launched; waiting for the termination condition.
    AwaitingEnd,
}

/// Mutable state of one level run, rebuilt on every start.
#[derive(Debug)]
pub struct RuntimeLevelState {
    level: Arc<LevelDefinition>,
    limits: WaveLimits,
    current_wave_index: usize,
    start_time: Duration,
    step: SequencerStep,
    waves: Vec<WaveScheduler>,
}

impl RuntimeLevelState {
    pub(crate) fn new(level: Arc<LevelDefinition>, start_time: Duration) -> Self {
        let limits = WaveLimits::from_level(&level);
        Self {
            level,
            limits,
            current_wave_index: 0,
            start_time,
            step: SequencerStep::Launching,
            waves: Vec::new(),
        }
    }

    /// Level definition driving the run.
    #[must_use]
    pub fn level(&self) -> &LevelDefinition {
        &self.level
    }

    /// Index of the wave the sequencer is launching or waiting on.
    #[must_use]
    pub fn current_wave_index(&self) -> usize {
        self.current_wave_index
    }

    /// Simulation time at which the level started.
    #[must_use]
    pub fn start_time(&self) -> Duration {
        self.start_time
    }

    /// Current sequencer step.
    #[must_use]
    pub fn step(&self) -> SequencerStep {
        self.step
    }

    /// Launched waves in launch order.
    #[must_use]
    pub fn waves(&self) -> &[WaveScheduler] {
        &self.waves
    }

    /// Advances the wave sequencer to `now`.
    ///
    /// Returns `true` once every wave launched and the level's termination
    /// condition holds.
    pub(crate) fn advance<E>(
        &mut self,
        now: Duration,
        registry: &EnemyRegistry,
        out: &mut E,
    ) -> bool
    where
        E: EventSink + ?Sized,
    {
        loop {
            match self.step {
                SequencerStep::Launching => {
                    let Some(wave) = self.level.waves.get(self.current_wave_index) else {
                        debug!(waves = self.waves.len(), "all waves launched");
                        self.step = SequencerStep::AwaitingEnd;
                        continue;
                    };
                    if let WaveStart::At(offset) = wave.start_at {
                        if now < self.start_time.saturating_add(offset) {
                            return false;
                        }
                    }

                    let index = WaveIndex::new(self.current_wave_index);
                    out.emit(Event::WaveStarted { wave: index });
                    self.waves.push(WaveScheduler::new(index, wave, self.limits, now));

                    match wave.start_at {
                        WaveStart::Chained => {
                            self.step = SequencerStep::AwaitingChained {
                                slot: self.waves.len() - 1,
                            };
                        }
                        WaveStart::At(_) => self.current_wave_index += 1,
                    }
                }
                SequencerStep::AwaitingChained { slot } => {
                    if !self.waves[slot].is_completed() {
                        return false;
                    }
                    let index = WaveIndex::new(self.current_wave_index);
                    info!(wave = index.get(), "chained wave completed");
                    out.emit(Event::WaveCompleted { wave: index });
                    self.current_wave_index += 1;
                    self.step = SequencerStep::Launching;
                }
                SequencerStep::AwaitingEnd => return self.should_end(now, registry),
            }
        }
    }

    fn should_end(&self, now: Duration, registry: &EnemyRegistry) -> bool {
        let Some(length) = self.level.round_deadline() else {
            return false;
        };
        let past_deadline = now >= self.start_time.saturating_add(length);
        if self.level.sudden_death {
            past_deadline && registry.count_all() == 0
        } else {
            past_deadline
        }
    }

    /// Ticks every launched wave that may still spawn, in launch order.
    pub(crate) fn tick_waves<E>(
        &mut self,
        now: Duration,
        registry: &mut EnemyRegistry,
        admission: &mut SpawnAdmissionController,
        rng: &mut ChaCha8Rng,
        out: &mut E,
    ) where
        E: EventSink + ?Sized,
    {
        for wave in self.waves.iter_mut().filter(|wave| wave.is_active()) {
            let _ = wave.tick(now, registry, admission, rng, out);
        }
    }

    pub(crate) fn cancel_waves(&mut self) {
        self.waves.iter_mut().for_each(WaveScheduler::cancel);
    }
}
