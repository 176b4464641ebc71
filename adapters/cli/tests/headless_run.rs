use std::{fs, path::PathBuf, process::Command};

fn level_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("levels")
        .join(name)
}

#[test]
fn sample_level_completes_and_unlocks_next() {
    let progress = std::env::temp_dir().join(format!(
        "bowmaster-cli-progress-{}.toml",
        std::process::id()
    ));
    let _ = fs::remove_file(&progress);

    let output = Command::new(env!("CARGO_BIN_EXE_bowmaster"))
        .arg("--level")
        .arg(level_file("siege.toml"))
        .arg("--arena")
        .arg(level_file("arena.toml"))
        .args(["--tick-ms", "100", "--seed", "7"])
        .arg("--progress")
        .arg(&progress)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run bowmaster");

    assert!(output.status.success(), "bowmaster exited with {}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("level 1 completed: +50 coins, +1000 score"),
        "unexpected output: {stdout}"
    );

    let saved = fs::read_to_string(&progress).expect("progress written");
    assert!(saved.contains("highest_unlocked = 1"), "unexpected progress: {saved}");
    let _ = fs::remove_file(&progress);
}

#[test]
fn fragile_castle_fails_the_level() {
    let output = Command::new(env!("CARGO_BIN_EXE_bowmaster"))
        .arg("--level")
        .arg(level_file("siege.toml"))
        .args(["--castle-health", "2", "--enemy-lifetime", "1.5"])
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run bowmaster");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("level 1 failed"), "unexpected output: {stdout}");
}

#[test]
fn missing_level_file_is_reported() {
    let output = Command::new(env!("CARGO_BIN_EXE_bowmaster"))
        .arg("--level")
        .arg(level_file("does-not-exist.toml"))
        .output()
        .expect("failed to run bowmaster");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read level file"), "unexpected stderr: {stderr}");
}

#[test]
fn unbounded_spawn_band_is_reported() {
    let arena = std::env::temp_dir().join(format!(
        "bowmaster-cli-arena-{}.toml",
        std::process::id()
    ));
    fs::write(&arena, "[[spawn_areas]]\nhalf_width = inf\n").expect("arena written");

    let output = Command::new(env!("CARGO_BIN_EXE_bowmaster"))
        .arg("--level")
        .arg(level_file("siege.toml"))
        .arg("--arena")
        .arg(&arena)
        .output()
        .expect("failed to run bowmaster");
    let _ = fs::remove_file(&arena);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid spawn area in arena file"),
        "unexpected stderr: {stderr}"
    );
}
