#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a BowMaster level headlessly.

mod arena;
mod battlefield;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use bowmaster_core::{Event, LevelDefinition};
use bowmaster_system_level::{LevelScheduler, LevelSetup, LevelStatus};
use bowmaster_system_progress::ProgressFile;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::{arena::ArenaConfig, battlefield::Battlefield};

#[derive(Parser, Debug)]
#[command(author, version, about = "Plays a BowMaster level against a headless battlefield")]
struct Args {
    /// Level definition to play (TOML).
    #[arg(long)]
    level: PathBuf,

    /// Arena layout with spawn areas (TOML); one default band when omitted.
    #[arg(long)]
    arena: Option<PathBuf>,

    /// Seed for spawn placement and interval jitter.
    #[arg(long, default_value_t = 0x0b0e_5eed)]
    seed: u64,

    /// Length of one simulation step in milliseconds of wall-clock time.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,

    /// Simulated seconds after which the run is abandoned.
    #[arg(long, default_value_t = 600.0)]
    max_seconds: f64,

    /// Seconds an enemy survives before it breaches the castle.
    #[arg(long, default_value_t = 12.0)]
    enemy_lifetime: f64,

    /// Starting castle health.
    #[arg(long, default_value_t = 100)]
    castle_health: u32,

    /// Damage dealt by every enemy that breaches the castle.
    #[arg(long, default_value_t = 1)]
    castle_damage: u32,

    /// Progress file updated when the level is completed.
    #[arg(long)]
    progress: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let level = load_level(&args.level)?;
    let arena = match &args.arena {
        Some(path) => load_arena(path)?,
        None => ArenaConfig::default(),
    };
    if args.tick_ms == 0 {
        bail!("--tick-ms must be positive");
    }
    let tick = Duration::from_millis(args.tick_ms);
    let max_time = Duration::try_from_secs_f64(args.max_seconds)
        .context("--max-seconds must be a non-negative number of seconds")?;
    let lifetime = Duration::try_from_secs_f64(args.enemy_lifetime)
        .context("--enemy-lifetime must be a non-negative number of seconds")?;

    let battlefield = Battlefield::new(arena.ground_y, args.castle_health);
    let setup = LevelSetup {
        level: Some(level),
        castle: Some(battlefield.castle()),
        spawn_areas: arena.spawn_areas,
        rng_seed: args.seed,
    };
    let mut scheduler = LevelScheduler::new(setup, battlefield.spawn_ports(), Vec::new());
    scheduler.start_level().context("failed to start level")?;

    let mut log = Vec::new();
    while scheduler.status() == LevelStatus::Running {
        let before = scheduler.now();
        if before.saturating_sub(start_time(&scheduler)) >= max_time {
            warn!(seconds = args.max_seconds, "time limit reached, abandoning level");
            break;
        }

        scheduler.tick(tick);
        let elapsed = scheduler.now().saturating_sub(before);

        for enemy in battlefield.advance(elapsed, lifetime) {
            scheduler.damage_castle(args.castle_damage);
            let _ = scheduler.enemy_removed(enemy);
        }
        if battlefield.castle_health() == 0 {
            scheduler.castle_destroyed();
        }

        log.append(scheduler.event_sink_mut());
    }
    log.append(scheduler.event_sink_mut());

    report(&scheduler, &battlefield, &log);

    if let Some(path) = args.progress {
        update_progress(ProgressFile::new(path), &log)?;
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Ignore error if already set.
    let _ = fmt().with_env_filter(env_filter).try_init();
}

fn load_level(path: &Path) -> Result<LevelDefinition> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read level file {}", path.display()))?;
    LevelDefinition::from_toml_str(&contents)
        .with_context(|| format!("failed to parse level file {}", path.display()))
}

fn load_arena(path: &Path) -> Result<ArenaConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read arena file {}", path.display()))?;
    let arena: ArenaConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse arena file {}", path.display()))?;
    arena
        .validate()
        .with_context(|| format!("invalid spawn area in arena file {}", path.display()))?;
    Ok(arena)
}

fn start_time(scheduler: &LevelScheduler<Vec<Event>>) -> Duration {
    scheduler
        .runtime()
        .map_or(Duration::ZERO, |runtime| runtime.start_time())
}

fn report(scheduler: &LevelScheduler<Vec<Event>>, battlefield: &Battlefield, log: &[Event]) {
    let spawned = log
        .iter()
        .filter(|event| matches!(event, Event::EnemySpawned { .. }))
        .count();
    let outcome = log.iter().find_map(|event| match event {
        Event::LevelCompleted {
            level_number,
            rewards,
        } => Some(format!(
            "level {level_number} completed: +{} coins, +{} score",
            rewards.coins, rewards.score
        )),
        Event::LevelFailed { level_number } => Some(format!("level {level_number} failed")),
        _ => None,
    });

    info!(
        status = ?scheduler.status(),
        seconds = scheduler.now().as_secs_f64(),
        spawned,
        alive = battlefield.alive(),
        castle_health = battlefield.castle_health(),
        "run finished"
    );
    println!(
        "{}",
        outcome.unwrap_or_else(|| "level abandoned before it ended".to_owned())
    );
}

fn update_progress(file: ProgressFile, log: &[Event]) -> Result<()> {
    let mut progress = file
        .load()
        .with_context(|| format!("failed to load progress from {}", file.path().display()))?;
    if progress.handle(log) {
        file.save(&progress)
            .with_context(|| format!("failed to save progress to {}", file.path().display()))?;
        info!(
            highest_unlocked = progress.highest_unlocked(),
            "progress updated"
        );
    }
    Ok(())
}
