use std::{env, fs, path::PathBuf, process::Command};

const CONFIG: &str = r#"
[geography]
n_islands = 6
x_min = 0.0
x_max = 10.0
y_min = -5.0
y_max = 5.0

[disaster]
global_prob = 0.2
spatial_pdf = "uniform"
magnitude_lambda = 2.0
mitigation_scale = 1000.0

[forage]
payoff_rule = "cube"
split_rule = "proportional"
invest_frac = 0.05

[init]
island_resources = 100.0
pool_resources = 500.0
pool_threshold = 200.0
contribution = 2.0
seed = 7

[output]
turns_per_save = 4
saves_per_file = 32
"#;

fn run_bin(args: &[&str]) -> bool {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_archipelago"));

    let output = Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command");

    if !output.status.success() {
        eprintln!(
            "binary failed with {args:?}\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    output.status.success()
}

fn setup_dir(name: &str, config: &str) -> PathBuf {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir_all(&test_dir).expect("failed to create test directory");
    fs::write(test_dir.join("config.toml"), config).expect("failed to write config file");
    test_dir
}

#[test]
fn basic_workflow() {
    let test_dir = setup_dir("basic_workflow", CONFIG);
    let dir = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert!(run_bin(&["--sim-dir", dir, "create"]));
    assert!(run_bin(&["--sim-dir", dir, "create"]));

    assert!(run_bin(&["--sim-dir", dir, "resume", "--run-idx", "0"]));
    assert!(run_bin(&["--sim-dir", dir, "resume", "--run-idx", "1"]));

    let run_dir = test_dir.join("run-0000");
    assert!(run_dir.join("checkpoint.msgpack").is_file());
    assert!(run_dir.join("trajectory-0000.msgpack").is_file());
    assert!(run_dir.join("trajectory-0001.msgpack").is_file());

    assert!(run_bin(&["--sim-dir", dir, "analyze"]));
    assert!(run_dir.join("results.msgpack").is_file());
    assert!(test_dir.join("run-0001/results.msgpack").is_file());

    assert!(run_bin(&["--sim-dir", dir, "clean"]));
    assert!(!run_dir.join("results.msgpack").exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn seeded_runs_are_reproducible() {
    let test_dir = setup_dir("seeded_runs_are_reproducible", CONFIG);
    let dir = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert!(run_bin(&["--sim-dir", dir, "create"]));
    assert!(run_bin(&["--sim-dir", dir, "create"]));

    let traj_a = fs::read(test_dir.join("run-0000/trajectory-0000.msgpack"))
        .expect("failed to read trajectory");
    let traj_b = fs::read(test_dir.join("run-0001/trajectory-0000.msgpack"))
        .expect("failed to read trajectory");
    assert_eq!(traj_a, traj_b);

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn invalid_config_is_rejected() {
    let config = CONFIG.replace("global_prob = 0.2", "global_prob = 2.0");
    let test_dir = setup_dir("invalid_config_is_rejected", &config);
    let dir = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert!(!run_bin(&["--sim-dir", dir, "create"]));

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn resuming_a_missing_run_fails() {
    let test_dir = setup_dir("resuming_a_missing_run_fails", CONFIG);
    let dir = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert!(!run_bin(&["--sim-dir", dir, "resume", "--run-idx", "3"]));

    fs::remove_dir_all(&test_dir).ok();
}
