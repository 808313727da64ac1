use std::process::{Command, Output};

fn run_headless(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_parking_sim"))
        .args(args)
        .env("RUST_LOG", "warn,parking_sim=info")
        .output()
        .expect("Failed to execute simulation")
}

/// Test that the simulation runs in headless mode without crashing
#[test]
fn test_headless_simulation_runs() {
    let output = run_headless(&["--ticks", "200", "--seed", "7"]);

    assert!(
        output.status.success(),
        "Simulation failed to run in headless mode. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== Final State ==="), "Missing final state");
    assert!(stdout.contains("=== Lot Map ==="), "Missing lot map");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
}

/// Test that vehicles are spawned and reported
#[test]
fn test_vehicles_spawn_during_simulation() {
    let output = run_headless(&["--ticks", "200", "--seed", "7"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    let spawned_line = stderr
        .lines()
        .find(|line| line.contains("Total vehicles spawned:"))
        .expect("Could not find 'Total vehicles spawned' line");

    let parts: Vec<&str> = spawned_line.split("Total vehicles spawned:").collect();
    let spawned_count: u32 = parts
        .get(1)
        .and_then(|s| s.trim().parse().ok())
        .expect("Could not parse spawned count");

    // 20 simulated seconds at one attempt every 2s
    assert_eq!(spawned_count, 10);
}

/// Test that an unusable configuration exits with an error
#[test]
fn test_invalid_config_fails() {
    let output = run_headless(&["--ticks", "10", "--max-vehicles", "0"]);

    assert!(!output.status.success(), "Empty pool should be rejected");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("max_vehicles"), "stderr: {}", stderr);
}
