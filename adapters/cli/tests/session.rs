use std::{path::Path, process::Command};

#[test]
fn scripted_session_builds_the_tower_and_hauls_wood() {
    let missing_config = Path::new(env!("CARGO_TARGET_TMPDIR")).join("no-such-setlerio.toml");
    let output = Command::new(env!("CARGO_BIN_EXE_setlerio"))
        .arg("--config")
        .arg(&missing_config)
        .args(["--frames", "400", "--frame-ms", "16", "--strict"])
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run setlerio binary");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "session should finish cleanly: {stdout}{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("Welcome to Setlerio."), "{stdout}");
    assert!(stdout.contains("ticks simulated: 400"), "{stdout}");
    assert!(stdout.contains("1,1: tower (Built)"), "{stdout}");
    assert!(stdout.contains("wood delivered: 3/3, outstanding: 0"), "{stdout}");
    assert!(stdout.contains("rejected commands: 0"), "{stdout}");
}

#[test]
fn malformed_configuration_is_reported() {
    let dir = Path::new(env!("CARGO_TARGET_TMPDIR"));
    let config = dir.join("setlerio-bad-tick-rate.toml");
    std::fs::write(&config, "tick_rate = 0\n").expect("write config");

    let output = Command::new(env!("CARGO_BIN_EXE_setlerio"))
        .arg("--config")
        .arg(&config)
        .args(["--frames", "1"])
        .output()
        .expect("failed to run setlerio binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid configuration"), "{stderr}");
}
