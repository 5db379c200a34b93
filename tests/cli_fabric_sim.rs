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
        "fabric-sim-{prefix}-{}-{nanos}",
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

fn line_with<'a>(stdout: &'a str, prefix: &str) -> Option<&'a str> {
    stdout.lines().find(|line| line.starts_with(prefix))
}

#[test]
fn fabric_sim_ring_blocks_one_link_and_writes_viz_json_with_meta_first() {
    let dir = unique_temp_dir("ring-viz");
    let out_json = dir.join("viz.json");

    let output = Command::new(env!("CARGO_BIN_EXE_fabric_sim"))
        .args([
            "--topology",
            "ring",
            "--viz-json",
            out_json.to_str().unwrap(),
        ])
        .output()
        .expect("run fabric_sim");
    assert!(
        output.status.success(),
        "fabric_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stp = line_with(&stdout, "stp ").expect("stp line");
    assert!(stp.contains("components=1"), "{stp}");
    assert!(stp.contains("blocked_cables=1"), "{stp}");
    let done = line_with(&stdout, "done @ ").expect("done line");
    assert!(done.contains("lost=0"), "{done}");
    assert!(done.contains("dropped_blocked=0"), "{done}");

    let raw = fs::read_to_string(&out_json).expect("read viz.json");
    let v: Value = serde_json::from_str(&raw).expect("parse viz.json");
    let arr = v.as_array().expect("viz.json must be a JSON array");
    let first_non_cable = arr
        .iter()
        .find(|e| e.get("kind").and_then(|k| k.as_str()) != Some("cable_connected"))
        .expect("events after cabling");
    assert_eq!(
        first_non_cable.get("kind").and_then(|k| k.as_str()),
        Some("meta"),
        "expected meta right after the topology is cabled"
    );
    assert!(
        arr.iter()
            .any(|e| e.get("kind").and_then(|k| k.as_str()) == Some("forwarded")),
        "expected the reply direction to be unicast after learning"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn fabric_sim_routed_prints_the_gateway() {
    let output = Command::new(env!("CARGO_BIN_EXE_fabric_sim"))
        .args(["--topology", "routed", "--until-ms", "1000"])
        .output()
        .expect("run fabric_sim");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("route h0 -> 192.168.2.10 via 192.168.1.1 on 192.168.1.10"),
        "{stdout}"
    );
    let stp = line_with(&stdout, "stp ").expect("stp line");
    assert!(stp.contains("components=2"), "{stp}");
}

#[test]
fn fabric_sim_runs_a_scenario_file() {
    let dir = unique_temp_dir("scenario");
    let scenario = write_file(
        &dir,
        "scenario.json",
        r#"
{
    "config": { "delay_factor": 2 },
    "nodes": [
        { "kind": "switch", "name": "s1", "ports": 2 },
        { "kind": "switch", "name": "s2", "ports": 2 },
        { "kind": "host", "name": "a", "interfaces": [ { "ip": "10.0.0.1", "mask": "255.255.255.0" } ] },
        { "kind": "host", "name": "b", "interfaces": [ { "ip": "10.0.0.2", "mask": "255.255.255.0" } ] }
    ],
    "cables": [
        { "a": "a", "b": "s1" },
        { "a": "s1", "b": "s2" },
        { "a": "s2", "b": "b" }
    ],
    "traffic": [ { "from": "a", "to": "b", "count": 3, "gap_ms": 1 } ]
}
        "#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_fabric_sim"))
        .args(["--scenario", scenario.to_str().unwrap()])
        .output()
        .expect("run fabric_sim");
    assert!(
        output.status.success(),
        "fabric_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let done = line_with(&stdout, "done @ ").expect("done line");
    // 三跳，每帧 3 次投递
    assert!(done.contains("delivered_frames=9"), "{done}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn fabric_sim_rejects_out_of_range_rtt_factor() {
    let output = Command::new(env!("CARGO_BIN_EXE_fabric_sim"))
        .args(["--rtt-factor", "9"])
        .output()
        .expect("run fabric_sim");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("rtt factor 9"), "{stderr}");
}
