use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_covid_insights")
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn run(args: &[&str], log_dir: &Path) -> Output {
    Command::new(bin())
        .args(args)
        .env("COVID_CASES_PATH", fixture("covid_19_india.csv"))
        .env("COVID_VACCINE_PATH", fixture("covid_vaccine_statewise.csv"))
        .env("LOG_FILE_PATH", log_dir.join("covid_insights.log"))
        .output()
        .expect("covid_insights should run")
}

#[test]
fn chart_command_emits_json() {
    let logs = tempfile::tempdir().unwrap();
    let output = run(
        &["chart", "active-cases-histogram", "--region", "Goa", "--format", "json"],
        logs.path(),
    );

    assert_eq!(output.status.code(), Some(0));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("chart should emit json");
    assert_eq!(payload["chart"], "histogram");
    assert_eq!(payload["values"].as_array().map(Vec::len), Some(3));
}

#[test]
fn chart_command_accepts_form_label() {
    let logs = tempfile::tempdir().unwrap();
    let output = run(&["chart", "Deaths Pie Chart", "--start", "2021-05-03"], logs.path());

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Distribution of Total Deaths by State"));
    assert!(stdout.contains("Goa"));
    assert!(!stdout.contains("Kerala"));
}

#[test]
fn blank_region_means_all_regions() {
    let logs = tempfile::tempdir().unwrap();
    let output = run(
        &["chart", "vaccination-pie", "--region", "  ", "--format", "csv"],
        logs.path(),
    );

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines, vec!["label,value", "Goa,426", "Kerala,17062", "Maharashtra,28420"]);
}

#[test]
fn unknown_region_renders_empty_chart() {
    let logs = tempfile::tempdir().unwrap();
    let output = run(&["chart", "deaths-pie", "--region", "Atlantis"], logs.path());

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("no data"));
}

#[test]
fn unknown_chart_kind_fails() {
    let logs = tempfile::tempdir().unwrap();
    let output = run(&["chart", "scatter"], logs.path());

    assert_ne!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown chart type"));
}

#[test]
fn bad_arguments_fail_before_loading_data() {
    let logs = tempfile::tempdir().unwrap();
    let missing = logs.path().join("missing.csv");
    let missing = missing.to_str().unwrap();

    let cases = [
        (vec!["chart", "scatter"], "unknown chart type"),
        (vec!["chart", "deaths-pie", "--start", "2021/05/01"], "--start expects YYYY-MM-DD"),
        (vec!["top", "Minimum Deaths"], "invalid ranking criterion"),
    ];

    for (mut args, expected) in cases {
        args.extend(["--cases", missing, "--vaccinations", missing]);
        let output = run(&args, logs.path());

        assert_ne!(output.status.code(), Some(0));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains(expected), "{args:?}: {stderr}");
        assert!(!stderr.contains("failed to load"), "{args:?}: {stderr}");
    }
}

#[test]
fn top_command_rejects_unknown_criterion() {
    let logs = tempfile::tempdir().unwrap();
    let output = run(&["top", "Minimum Deaths"], logs.path());

    assert_ne!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid ranking criterion"));
}

#[test]
fn top_command_lists_five() {
    let logs = tempfile::tempdir().unwrap();
    let output = run(&["top", "max-confirmed", "--format", "csv"], logs.path());

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 6);
    assert_eq!(stdout.lines().nth(1), Some("Maharashtra,9250000"));
}

#[test]
fn malformed_date_argument_fails() {
    let logs = tempfile::tempdir().unwrap();
    let output = run(&["chart", "deaths-pie", "--end", "05/02/2021"], logs.path());

    assert_ne!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--end expects YYYY-MM-DD"));
}

#[test]
fn summary_command_reports_quality() {
    let logs = tempfile::tempdir().unwrap();
    let output = run(&["summary"], logs.path());

    assert_eq!(output.status.code(), Some(0));
    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["case_rows"], 10);
    assert_eq!(payload["first_date"], "2021-05-01");
    assert_eq!(payload["quality"]["negative_active_rows"], 1);
    assert_eq!(payload["negative_active_pct"], 10.0);
}

#[test]
fn export_command_writes_clean_tables() {
    let logs = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let out_dir = out.path().to_str().unwrap();

    let output = run(&["export", "--out-dir", out_dir], logs.path());
    assert_eq!(output.status.code(), Some(0));

    let cases = std::fs::read_to_string(out.path().join("cases_clean.csv")).unwrap();
    let mut lines = cases.lines();
    assert_eq!(
        lines.next(),
        Some("region,date,confirmed,cured,deaths,active_cases")
    );
    assert_eq!(
        lines.next(),
        Some("Kerala,2021-05-01,1500000,1300000,5000,195000")
    );

    let vaccinations =
        std::fs::read_to_string(out.path().join("vaccinations_clean.csv")).unwrap();
    assert!(!vaccinations.contains("India"));
}
