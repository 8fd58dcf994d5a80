use std::sync::{Arc, atomic::AtomicBool};

use clap::Parser;
use pinball_bot::cli::commands::{
    inspect::{self, InspectArgs},
    train::{TrainArgs, execute, execute_until},
};
use tempfile::tempdir;

fn parse_args<I, T>(args: I) -> TrainArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    TrainArgs::parse_from(args)
}

#[test]
fn summary_without_extension_appends_json() {
    let tmp = tempdir().unwrap();
    let summary_stem = tmp.path().join("run_overview");
    let policy = tmp.path().join("policy.csv");
    let stats = tmp.path().join("stats.csv");

    let args = parse_args([
        "pinball-train",
        "--steps",
        "300",
        "--seed",
        "3",
        "--log-interval",
        "100",
        "--progress",
        "false",
        "--policy",
        policy.to_str().unwrap(),
        "--stats",
        stats.to_str().unwrap(),
        "--summary",
        summary_stem.to_str().unwrap(),
    ]);

    execute(args).expect("training with summary should succeed");

    let expected_path = summary_stem.with_extension("json");
    assert!(
        expected_path.exists(),
        "expected summary at {}",
        expected_path.display()
    );

    let contents = std::fs::read_to_string(&expected_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(parsed["result"]["steps"], 300);
    assert_eq!(parsed["config"]["log_interval"], 100);
    assert_eq!(parsed["config"]["agent"]["backport_window"], 40);

    assert!(policy.exists());
    assert_eq!(std::fs::read_to_string(&stats).unwrap().lines().count(), 4);
}

#[test]
fn summary_directory_argument_creates_default_file() {
    let tmp = tempdir().unwrap();
    let summary_dir = tmp.path().join("summaries");
    std::fs::create_dir_all(&summary_dir).unwrap();
    let summary_arg = format!("{}/", summary_dir.display());
    let policy = tmp.path().join("policy.msgpack");

    let args = parse_args([
        "pinball-train",
        "--steps",
        "50",
        "--progress",
        "false",
        "--save-interval",
        "0",
        "--policy",
        policy.to_str().unwrap(),
        "--summary",
        summary_arg.as_str(),
    ]);

    execute(args).expect("training with summary directory should succeed");

    assert!(summary_dir.join("training_summary.json").exists());
    assert!(policy.exists());
}

#[test]
fn training_resumes_and_policy_can_be_inspected() {
    let tmp = tempdir().unwrap();
    let policy = tmp.path().join("policy.csv");

    for seed in ["1", "2"] {
        let args = parse_args([
            "pinball-train",
            "--steps",
            "400",
            "--seed",
            seed,
            "--progress",
            "false",
            "--policy",
            policy.to_str().unwrap(),
        ]);
        execute(args).expect("training run should succeed");
    }

    let args = InspectArgs::parse_from([
        "inspect",
        "--policy",
        policy.to_str().unwrap(),
        "--json",
    ]);
    inspect::execute(args).expect("inspect should load the saved policy");
}

#[test]
fn interrupted_unbounded_run_still_saves_policy() {
    let tmp = tempdir().unwrap();
    let policy = tmp.path().join("policy.csv");
    let summary = tmp.path().join("summary.json");

    let args = parse_args([
        "pinball-train",
        "--steps",
        "0",
        "--progress",
        "false",
        "--policy",
        policy.to_str().unwrap(),
        "--summary",
        summary.to_str().unwrap(),
    ]);

    // already interrupted before the first tick
    execute_until(args, Arc::new(AtomicBool::new(true)))
        .expect("interrupted training should finish cleanly");

    assert!(policy.exists());
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary).unwrap()).unwrap();
    assert_eq!(parsed["result"]["steps"], 0);
    assert_eq!(parsed["result"]["saves"], 1);
}
