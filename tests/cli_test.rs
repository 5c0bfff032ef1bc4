use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use logistic_forecaster::{
    analysis::integrate,
    io::{write_trajectory_csv, write_trajectory_excel},
    FitConfig, ParameterRange,
};

const GRID: [&str; 12] = [
    "--k-min",
    "50",
    "--k-max",
    "150",
    "--k-step",
    "10",
    "--gamma-min",
    "0.1",
    "--gamma-max",
    "0.6",
    "--gamma-step",
    "0.05",
];

/// Write a synthetic logistic series (γ = 0.3, K = 100) to a CSV file in the given directory.
fn create_test_csv(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("observed.csv");
    let traj = integrate(5.0, 0.0, 10.0, 1.0, 0.3, 100.0).unwrap();
    write_trajectory_csv(&traj, &path).unwrap();
    path
}

fn create_test_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("fit.toml");
    let mut config = FitConfig::default();
    config.search.k = ParameterRange::new(50.0, 150.0, 10.0);
    config.search.gamma = ParameterRange::new(0.1, 0.6, 0.05);
    config.forecast.end_time = 40.0;
    config.save(&path).unwrap();
    path
}

fn cmd() -> Command {
    Command::cargo_bin("logistic-fit").unwrap()
}

// --- fit subcommand ---

#[test]
fn test_fit_success() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);

    cmd()
        .args(["fit", "--input", csv_path.to_str().unwrap()])
        .args(GRID)
        .assert()
        .success()
        .stdout(predicate::str::contains("Fitted Parameters"))
        .stdout(predicate::str::contains("Carrying capacity"))
        .stdout(predicate::str::contains("100"));
}

#[test]
fn test_fit_json_report() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);

    let output = cmd()
        .args(["fit", "--json", "--parallel", "--input", csv_path.to_str().unwrap()])
        .args(GRID)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["fit"]["params"]["k"], serde_json::json!(100.0));
    assert_eq!(report["search"]["k_count"], serde_json::json!(10));
    assert_eq!(report["series"]["data_points"], serde_json::json!(11));
}

#[test]
fn test_fit_with_config_file() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);
    let config = create_test_config(&dir);

    cmd()
        .args([
            "fit",
            "--input",
            csv_path.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.3000"));
}

#[test]
fn test_fit_empty_range_fails() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);

    cmd()
        .args([
            "fit",
            "--input",
            csv_path.to_str().unwrap(),
            "--k-min",
            "100",
            "--k-max",
            "100",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Degenerate search space"));
}

#[test]
fn test_fit_oversized_range_fails() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);

    cmd()
        .args([
            "fit",
            "--input",
            csv_path.to_str().unwrap(),
            "--gamma-step",
            "1e-300",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gamma range"));
}

#[test]
fn test_fit_missing_file() {
    cmd()
        .args(["fit", "--input", "nonexistent.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nonexistent.csv"));
}

#[test]
fn test_fit_unsupported_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.txt");
    std::fs::write(&path, "time,value\n0,1\n1,2\n").unwrap();

    cmd()
        .args(["fit", "--input", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported input format"));
}

#[test]
fn test_fit_malformed_series() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.csv");
    std::fs::write(&path, "time,value\n0,1\n1,oops\n").unwrap();

    cmd()
        .args(["fit", "--input", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("row 3"));
}

// --- forecast subcommand ---

#[test]
fn test_forecast_writes_output() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);
    let out_path = dir.path().join("forecast.csv");

    cmd()
        .args([
            "forecast",
            "--input",
            csv_path.to_str().unwrap(),
            "--end-time",
            "50",
            "--step",
            "0.5",
            "--chart",
            "--output",
            out_path.to_str().unwrap(),
        ])
        .args(GRID)
        .assert()
        .success()
        .stdout(predicate::str::contains("Trajectory"))
        .stdout(predicate::str::contains("Logistic Forecast"))
        .stdout(predicate::str::contains("Wrote forecast"));

    let content = std::fs::read_to_string(&out_path).unwrap();
    assert!(content.starts_with("time,value"));
    // header + 101 samples
    assert_eq!(content.lines().count(), 102);
}

#[test]
fn test_forecast_to_excel() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);
    let out_path = dir.path().join("forecast.xlsx");

    cmd()
        .args([
            "forecast",
            "--input",
            csv_path.to_str().unwrap(),
            "--end-time",
            "30",
            "--output",
            out_path.to_str().unwrap(),
        ])
        .args(GRID)
        .assert()
        .success();

    assert!(out_path.exists());
}

#[test]
fn test_forecast_horizon_before_start_fails() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);

    cmd()
        .args([
            "forecast",
            "--input",
            csv_path.to_str().unwrap(),
            "--end-time=-5",
        ])
        .args(GRID)
        .assert()
        .failure();
}

// --- run subcommand ---

#[test]
fn test_run_pipeline() {
    let dir = TempDir::new().unwrap();
    let input_dir = dir.path().join("input");
    let output_dir = dir.path().join("output");
    std::fs::create_dir(&input_dir).unwrap();
    let traj = integrate(5.0, 0.0, 10.0, 1.0, 0.3, 100.0).unwrap();
    write_trajectory_excel(&traj, input_dir.join("population.xlsx")).unwrap();
    let config = create_test_config(&dir);

    cmd()
        .args([
            "run",
            "--input-dir",
            input_dir.to_str().unwrap(),
            "--output-dir",
            output_dir.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Search Settings"))
        .stdout(predicate::str::contains("Pipeline complete"))
        .stderr(predicate::str::contains("100%"));

    assert!(output_dir.join("fit_curve.csv").exists());
    assert!(output_dir.join("forecast.csv").exists());
    let report = std::fs::read_to_string(output_dir.join("report.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(report["forecast"]["end_time"], serde_json::json!(40.0));
}

#[test]
fn test_run_without_workbook_fails() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args([
            "run",
            "--input-dir",
            dir.path().to_str().unwrap(),
            "--output-dir",
            dir.path().join("out").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no .xlsx file"));
}

// --- transcript subcommand ---

#[test]
fn test_transcript_to_stdout() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("obs.xlsx");
    let traj = integrate(5.0, 0.0, 2.0, 1.0, 0.0, 100.0).unwrap();
    write_trajectory_excel(&traj, &path).unwrap();

    cmd()
        .args(["transcript", "--input", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("|   | A | B |"))
        .stdout(predicate::str::contains("| 1 | time | value |"))
        .stdout(predicate::str::contains("| 4 | 2 | 5 |"));
}

#[test]
fn test_transcript_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("obs.xlsx");
    let out = dir.path().join("obs.md");
    let traj = integrate(5.0, 0.0, 2.0, 1.0, 0.0, 100.0).unwrap();
    write_trajectory_excel(&traj, &path).unwrap();

    cmd()
        .args([
            "transcript",
            "--input",
            path.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Transcribed"));

    let markdown = std::fs::read_to_string(&out).unwrap();
    assert_eq!(markdown.lines().count(), 6);
}

// --- init-config subcommand ---

#[test]
fn test_init_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fit.toml");

    cmd()
        .args(["init-config", "--output", path.to_str().unwrap()])
        .assert()
        .success();

    let loaded = FitConfig::load(&path).unwrap();
    assert_eq!(loaded, FitConfig::default());

    cmd()
        .args(["init-config", "--output", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

// --- General ---

#[test]
fn test_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logistic growth fitter"));
}

#[test]
fn test_no_subcommand() {
    cmd().assert().failure();
}
