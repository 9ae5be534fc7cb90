use std::process::{Command, Output};

fn run_sim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_transit_sim"))
        .args(args)
        .env("RUST_LOG", "warn,transit_sim=info")
        .output()
        .expect("Failed to execute simulation")
}

/// Pull the number after `label` out of a log line
fn logged_number(stderr: &str, label: &str) -> f64 {
    let line = stderr
        .lines()
        .find(|line| line.contains(label))
        .unwrap_or_else(|| panic!("Could not find '{}' line", label));
    let parts: Vec<&str> = line.split(label).collect();
    parts
        .get(1)
        .map(|s| s.trim().trim_end_matches("ms").trim_end_matches('s'))
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("Could not parse number from line: {}", line))
}

/// Test that the simulation runs headless without crashing
#[test]
fn test_headless_simulation_runs() {
    let output = run_sim(&["--ticks", "500", "--seed", "3", "--report-every", "0"]);

    assert!(
        output.status.success(),
        "Simulation failed to run. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
}

/// Test that service statistics are logged
#[test]
fn test_simulation_statistics_logged() {
    let output = run_sim(&["--ticks", "500", "--seed", "3", "--report-every", "0"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    for label in [
        "Simulated time:",
        "Passengers waiting:",
        "Passengers served:",
        "Average wait:",
        "Active trains:",
        "Total stations:",
        "Total lines:",
    ] {
        assert!(stderr.contains(label), "Missing '{}' statistic", label);
    }

    assert_eq!(logged_number(&stderr, "Active trains:"), 3.0);
    assert_eq!(logged_number(&stderr, "Total stations:"), 9.0);
    assert_eq!(logged_number(&stderr, "Total lines:"), 2.0);
    assert_eq!(logged_number(&stderr, "Simulated time:"), 8.0);
}

/// Test that trains deliver passengers over a longer run
#[test]
fn test_passengers_served_during_simulation() {
    let output = run_sim(&["--ticks", "6000", "--seed", "3", "--report-every", "0"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    let served = logged_number(&stderr, "Passengers served:");
    assert!(served > 0.0, "No passengers were served during simulation");
}

#[test]
fn test_event_generation_runs() {
    let output = run_sim(&[
        "--ticks",
        "2000",
        "--seed",
        "4",
        "--report-every",
        "500",
        "--events",
        "--event-interval-ms",
        "1",
    ]);
    assert!(
        output.status.success(),
        "Simulation with events failed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--- After tick 500"));
    assert!(stdout.contains("=== Final State ==="));
}

#[test]
fn test_invalid_config_is_rejected() {
    let path = std::env::temp_dir().join(format!("transit_sim_bad_{}.toml", std::process::id()));
    std::fs::write(&path, "train_capacity = 0\n").unwrap();

    let output = run_sim(&["--ticks", "10", "--config", path.to_str().unwrap()]);
    std::fs::remove_file(&path).unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("train_capacity"), "stderr: {}", stderr);
}
