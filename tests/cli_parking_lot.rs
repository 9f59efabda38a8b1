use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "parkinglot-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

fn launch_lines(stdout: &str) -> Vec<&str> {
    stdout
        .lines()
        .filter(|line| line.starts_with("launch "))
        .collect()
}

#[test]
fn staggered_preset_runs_with_dry_run_engine() {
    let output = Command::new(env!("CARGO_BIN_EXE_parking_lot"))
        .args(["--preset", "staggered", "--out-dir", "logs"])
        .output()
        .expect("run parking_lot");

    assert!(
        output.status.success(),
        "parking_lot failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("finished in state Some(Torndown) after 103s"));

    let launches = launch_lines(&stdout);
    assert_eq!(launches.len(), 4);
    assert!(launches[0].contains("host=h1 role=server iperf3 -s -i 1 > logs/h1_server_bbr &"));
    assert!(launches[2].contains("iperf3 -c 10.0.0.1 -t 100 -C bbr > logs/h8_client_flow1_bbr &"));
    assert!(launches[3].starts_with("launch t=10s host=h8 role=client"));
}

#[test]
fn cc_override_changes_client_commands_and_file_names() {
    let output = Command::new(env!("CARGO_BIN_EXE_parking_lot"))
        .args(["--preset", "competing", "--cc", "reno,vegas", "--variant", "q50"])
        .output()
        .expect("run parking_lot");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("iperf3 -c 10.0.0.6 -t 200 -C reno > ./h1_client_logs_4_reno_q50 &"));
    assert!(stdout.contains("iperf3 -c 10.0.0.7 -t 200 -C vegas > ./h1_client_logs_4_vegas_q50 &"));
    assert!(stdout.contains("ping 10.0.0.8 -i 1 -c 200 > ./h3_ping_4_q50 &"));
}

#[test]
fn plan_only_writes_plan_json_without_running() {
    let dir = unique_temp_dir("plan");
    let plan_json = dir.join("plan.json");

    let output = Command::new(env!("CARGO_BIN_EXE_parking_lot"))
        .args([
            "--preset",
            "competing",
            "--plan-only",
            "--plan-json",
            plan_json.to_str().unwrap(),
        ])
        .output()
        .expect("run parking_lot");

    assert!(output.status.success());
    assert!(launch_lines(&String::from_utf8_lossy(&output.stdout)).is_empty());

    let plan: Value =
        serde_json::from_str(&fs::read_to_string(&plan_json).expect("read plan")).expect("json");
    assert_eq!(plan["name"], "competing");
    assert_eq!(plan["scenario_duration_secs"], 240.0);
    assert_eq!(plan["shaping"].as_array().map(Vec::len), Some(2));
    assert_eq!(plan["shaping"][0]["descriptor"]["queue_packets"], 50);

    let hosts = plan["topology"]["nodes"]
        .as_array()
        .expect("nodes")
        .iter()
        .filter(|n| n["role"] == "host")
        .count();
    assert_eq!(hosts, 8);
}

#[test]
fn shrinking_n_below_preset_endpoints_fails_in_configuration() {
    let dir = unique_temp_dir("plan-small-n");
    let plan_json = dir.join("plan.json");

    let output = Command::new(env!("CARGO_BIN_EXE_parking_lot"))
        .args([
            "--preset",
            "competing",
            "--n",
            "2",
            "--plan-only",
            "--plan-json",
            plan_json.to_str().unwrap(),
        ])
        .output()
        .expect("run parking_lot");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error during configuration"), "{stderr}");
    assert!(stderr.contains("unknown host h6"), "{stderr}");
    assert!(!plan_json.exists());
}

#[test]
fn report_json_lists_artifacts_and_states() {
    let dir = unique_temp_dir("report");
    let report_json = dir.join("report.json");

    let output = Command::new(env!("CARGO_BIN_EXE_parking_lot"))
        .args([
            "--preset",
            "staggered",
            "--report-json",
            report_json.to_str().unwrap(),
        ])
        .output()
        .expect("run parking_lot");
    assert!(output.status.success());

    let report: Value =
        serde_json::from_str(&fs::read_to_string(&report_json).expect("read report"))
            .expect("json");
    let states: Vec<&str> = report["states"]
        .as_array()
        .expect("states")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(states.first(), Some(&"idle"));
    assert_eq!(states.last(), Some(&"torndown"));
    assert_eq!(report["launches"].as_array().map(Vec::len), Some(4));
    assert_eq!(report["connectivity"]["results"].as_array().map(Vec::len), Some(56));
}

#[test]
fn config_file_drives_the_run() {
    let dir = unique_temp_dir("config");
    let cfg = write_file(
        &dir,
        "scenario.json",
        r#"
{
    "name": "two-flows",
    "n": 2,
    "bottleneck": { "bandwidth_mbps": 20, "delays": ["5ms", "5ms"], "queue_packets": 100 },
    "grace_secs": 1,
    "flows": [
        {
            "source": "h1", "dest": "h5", "congestion": "cubic",
            "duration_secs": 5, "output_label": "a"
        },
        {
            "source": "h2", "dest": "h5", "congestion": "cubic",
            "duration_secs": 3, "start_offset_secs": 2, "output_label": "b"
        }
    ]
}
        "#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_parking_lot"))
        .args(["--config", cfg.to_str().unwrap()])
        .output()
        .expect("run parking_lot");

    assert!(
        output.status.success(),
        "parking_lot failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("scenario two-flows finished"));
    assert!(stdout.contains("after 6s"));
    let launches = launch_lines(&stdout);
    assert_eq!(launches.len(), 3);
    assert!(launches[0].contains("host=h5 role=server"));
    assert!(launches[2].starts_with("launch t=2s host=h2"));
}

#[test]
fn invalid_host_count_fails_before_network_start() {
    let output = Command::new(env!("CARGO_BIN_EXE_parking_lot"))
        .args(["--n", "0"])
        .output()
        .expect("run parking_lot");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error during configuration"));
    assert!(!stderr.contains("dry-run 网络已启动"));
}

#[test]
fn unknown_preset_is_rejected() {
    let output = Command::new(env!("CARGO_BIN_EXE_parking_lot"))
        .args(["--preset", "fat-tree"])
        .output()
        .expect("run parking_lot");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown preset"));
}
