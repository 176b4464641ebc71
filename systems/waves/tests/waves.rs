use std::time::Duration;

use bowmaster_core::{EnemyTypeKey, Event, SpawnArea, Wave, WaveEntry, WaveIndex};
use bowmaster_registry::EnemyRegistry;
use bowmaster_system_spawning::{
    scripted::{scripted_ports, ScriptedHandles},
    SpawnAdmissionController,
};
use bowmaster_system_waves::{WaveLimits, WaveProgress, WaveScheduler, SPAWN_RETRY_DELAY};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

struct Harness {
    registry: EnemyRegistry,
    admission: SpawnAdmissionController,
    handles: ScriptedHandles,
    rng: ChaCha8Rng,
    events: Vec<Event>,
}

impl Harness {
    fn new() -> Self {
        let (ports, handles) = scripted_ports();
        Self {
            registry: EnemyRegistry::new(),
            admission: SpawnAdmissionController::new(vec![SpawnArea::default()], ports),
            handles,
            rng: ChaCha8Rng::seed_from_u64(0xb0_57e5),
            events: Vec::new(),
        }
    }

    fn tick(&mut self, wave: &mut WaveScheduler, at_ms: u64) -> WaveProgress {
        wave.tick(
            Duration::from_millis(at_ms),
            &mut self.registry,
            &mut self.admission,
            &mut self.rng,
            &mut self.events,
        )
    }

    fn kill_oldest(&mut self) {
        let oldest = self.registry.ids()[0];
        let _ = self.registry.unregister(oldest);
    }
}

fn entry(name: &str, count: u32, interval_ms: u64) -> WaveEntry {
    WaveEntry {
        enemy_type: Some(EnemyTypeKey::new(name)),
        count,
        interval: Duration::from_millis(interval_ms),
        interval_jitter: Duration::ZERO,
        ..WaveEntry::default()
    }
}

fn wave(entries: Vec<WaveEntry>) -> Wave {
    Wave {
        entries,
        ..Wave::default()
    }
}

fn launch(definition: &Wave, limits: WaveLimits) -> WaveScheduler {
    WaveScheduler::new(WaveIndex::new(0), definition, limits, Duration::ZERO)
}

#[test]
fn global_cap_pauses_spawning_until_an_enemy_leaves() {
    let mut harness = Harness::new();
    let limits = WaveLimits {
        global_max_alive: 2,
        ..WaveLimits::default()
    };
    let mut scheduler = launch(&wave(vec![entry("goblin", 5, 1_000)]), limits);

    let _ = harness.tick(&mut scheduler, 0);
    let _ = harness.tick(&mut scheduler, 1_000);
    assert_eq!(scheduler.entries()[0].spawned_count(), 2);

    let _ = harness.tick(&mut scheduler, 2_000);
    let _ = harness.tick(&mut scheduler, 2_500);
    assert_eq!(scheduler.entries()[0].spawned_count(), 2);
    assert_eq!(harness.registry.count_all(), 2);

    harness.kill_oldest();
    let _ = harness.tick(&mut scheduler, 3_000);
    assert_eq!(scheduler.entries()[0].spawned_count(), 3);
    assert_eq!(harness.registry.count_all(), 2);
}

#[test]
fn per_entry_cap_freezes_the_entry_clock() {
    let mut harness = Harness::new();
    let capped = WaveEntry {
        per_entry_max_alive: 1,
        ..entry("goblin", 3, 500)
    };
    let mut scheduler = launch(&wave(vec![capped]), WaveLimits::default());

    let _ = harness.tick(&mut scheduler, 0);
    assert_eq!(
        scheduler.entries()[0].next_spawn_at(),
        Duration::from_millis(500)
    );

    for at in [500, 1_000, 1_500] {
        let _ = harness.tick(&mut scheduler, at);
        assert_eq!(scheduler.entries()[0].spawned_count(), 1);
        assert_eq!(
            scheduler.entries()[0].next_spawn_at(),
            Duration::from_millis(500)
        );
    }

    harness.kill_oldest();
    let _ = harness.tick(&mut scheduler, 1_600);
    assert_eq!(scheduler.entries()[0].spawned_count(), 2);
    assert_eq!(
        scheduler.entries()[0].next_spawn_at(),
        Duration::from_millis(2_100)
    );
}

#[test]
fn interleaved_entries_spawn_side_by_side() {
    let mut harness = Harness::new();
    let definition = wave(vec![entry("goblin", 2, 1_000), entry("troll", 2, 1_000)]);
    let mut scheduler = launch(&definition, WaveLimits::default());

    let _ = harness.tick(&mut scheduler, 0);

    assert_eq!(harness.registry.count_by_type(&EnemyTypeKey::new("goblin")), 1);
    assert_eq!(harness.registry.count_by_type(&EnemyTypeKey::new("troll")), 1);
}

#[test]
fn sequential_entries_wait_for_their_predecessor() {
    let mut harness = Harness::new();
    let definition = Wave {
        interleave_entries: false,
        ..wave(vec![entry("goblin", 2, 1_000), entry("troll", 2, 1_000)])
    };
    let mut scheduler = launch(&definition, WaveLimits::default());
    let troll = EnemyTypeKey::new("troll");

    let _ = harness.tick(&mut scheduler, 0);
    let _ = harness.tick(&mut scheduler, 1_000);
    assert_eq!(harness.registry.count_by_type(&troll), 0);
    assert_eq!(scheduler.entries()[0].spawned_count(), 2);

    let _ = harness.tick(&mut scheduler, 2_000);
    assert_eq!(harness.registry.count_by_type(&troll), 1);

    let _ = harness.tick(&mut scheduler, 3_000);
    let progress = harness.tick(&mut scheduler, 4_000);
    assert_eq!(progress, WaveProgress::Exhausted);
    assert!(scheduler.is_completed());
}

#[test]
fn spawned_events_carry_wave_and_type() {
    let mut harness = Harness::new();
    let mut scheduler = WaveScheduler::new(
        WaveIndex::new(3),
        &wave(vec![entry("bat", 1, 1_000)]),
        WaveLimits::default(),
        Duration::ZERO,
    );

    let progress = harness.tick(&mut scheduler, 0);
    assert_eq!(progress, WaveProgress::Active);
    let enemy = harness.handles.factory.created()[0].enemy;
    assert_eq!(
        harness.events,
        vec![Event::EnemySpawned {
            enemy,
            enemy_type: EnemyTypeKey::new("bat"),
            wave: WaveIndex::new(3),
        }]
    );

    assert_eq!(harness.tick(&mut scheduler, 100), WaveProgress::Exhausted);
}

#[test]
fn maximum_duration_stops_the_wave() {
    let mut harness = Harness::new();
    let definition = Wave {
        max_duration: Duration::from_millis(1_500),
        ..wave(vec![entry("goblin", 5, 1_000)])
    };
    let mut scheduler = launch(&definition, WaveLimits::default());

    assert_eq!(harness.tick(&mut scheduler, 0), WaveProgress::Active);
    assert_eq!(harness.tick(&mut scheduler, 1_000), WaveProgress::Active);
    assert_eq!(harness.tick(&mut scheduler, 1_500), WaveProgress::Expired);
    assert_eq!(harness.tick(&mut scheduler, 2_000), WaveProgress::Expired);
    assert_eq!(scheduler.entries()[0].spawned_count(), 2);
    assert!(scheduler.is_completed());
    assert!(!scheduler.is_active());
}

#[test]
fn entries_without_type_are_skipped() {
    let mut harness = Harness::new();
    let untyped = WaveEntry {
        enemy_type: None,
        ..entry("ignored", 3, 100)
    };
    let definition = wave(vec![untyped, entry("goblin", 1, 100)]);
    let mut scheduler = launch(&definition, WaveLimits::default());

    assert_eq!(scheduler.entries().len(), 1);
    assert_eq!(scheduler.entries()[0].enemy_type().as_str(), "goblin");

    let _ = harness.tick(&mut scheduler, 0);
    assert_eq!(harness.tick(&mut scheduler, 100), WaveProgress::Exhausted);
    assert_eq!(harness.registry.count_all(), 1);
}

#[test]
fn wave_without_valid_entries_is_exhausted_immediately() {
    let mut harness = Harness::new();
    let mut scheduler = launch(&wave(Vec::new()), WaveLimits::default());

    assert_eq!(harness.tick(&mut scheduler, 0), WaveProgress::Exhausted);
    assert!(harness.events.is_empty());
}

#[test]
fn rejected_spawn_is_retried_after_a_short_delay() {
    let mut harness = Harness::new();
    harness.handles.overlap.crowd_next(3);
    let mut scheduler = launch(&wave(vec![entry("goblin", 2, 1_000)]), WaveLimits::default());

    let _ = harness.tick(&mut scheduler, 0);
    assert_eq!(scheduler.entries()[0].spawned_count(), 0);
    assert_eq!(scheduler.entries()[0].next_spawn_at(), SPAWN_RETRY_DELAY);

    let _ = harness.tick(&mut scheduler, 100);
    assert_eq!(scheduler.entries()[0].spawned_count(), 0);

    let _ = harness.tick(&mut scheduler, 150);
    assert_eq!(scheduler.entries()[0].spawned_count(), 1);
}

#[test]
fn start_delay_offsets_the_first_spawn() {
    let mut harness = Harness::new();
    let delayed = WaveEntry {
        start_delay: Duration::from_secs(2),
        ..entry("goblin", 1, 1_000)
    };
    let mut scheduler = WaveScheduler::new(
        WaveIndex::new(0),
        &wave(vec![delayed]),
        WaveLimits::default(),
        Duration::from_secs(10),
    );

    let _ = harness.tick(&mut scheduler, 11_000);
    assert_eq!(harness.registry.count_all(), 0);
    let _ = harness.tick(&mut scheduler, 12_000);
    assert_eq!(harness.registry.count_all(), 1);
}

#[test]
fn cancelled_wave_never_spawns_again() {
    let mut harness = Harness::new();
    let mut scheduler = launch(&wave(vec![entry("goblin", 5, 100)]), WaveLimits::default());

    let _ = harness.tick(&mut scheduler, 0);
    scheduler.cancel();
    assert_eq!(harness.tick(&mut scheduler, 1_000), WaveProgress::Cancelled);
    assert_eq!(harness.registry.count_all(), 1);
    assert!(!scheduler.is_active());
    assert!(!scheduler.is_completed());
}

proptest! {
    #[test]
    fn caps_and_counts_are_never_exceeded(
        count in 1u32..12,
        global_cap in 0u32..4,
        entry_cap in 0u32..4,
        interval_ms in 10u64..400,
        kills in proptest::collection::vec(any::<bool>(), 40),
    ) {
        let mut harness = Harness::new();
        let capped = WaveEntry {
            per_entry_max_alive: entry_cap,
            ..entry("goblin", count, interval_ms)
        };
        let limits = WaveLimits {
            global_max_alive: global_cap,
            ..WaveLimits::default()
        };
        let mut scheduler = launch(&wave(vec![capped]), limits);

        for (step, kill) in kills.into_iter().enumerate() {
            if kill && harness.registry.count_all() > 0 {
                harness.kill_oldest();
            }
            let _ = harness.tick(&mut scheduler, step as u64 * 100);

            let alive = harness.registry.count_all();
            if global_cap > 0 {
                prop_assert!(alive <= global_cap as usize);
            }
            if entry_cap > 0 {
                prop_assert!(alive <= entry_cap as usize);
            }
            prop_assert!(scheduler.entries()[0].spawned_count() <= count);
            prop_assert_eq!(
                harness.events.len(),
                scheduler.entries()[0].spawned_count() as usize
            );
        }
    }
}
