use std::time::{Duration, Instant};

use runcheck::Config;

use crate::setup;

#[test]
fn run_timeout_success() {
    let sh = setup();
    let command = sh.cmd("xsleep").arg("100");

    let result = command.run_timeout(Duration::from_secs(5));
    assert!(result.is_ok(), "command should complete within the timeout: {result:?}");
}

#[test]
fn run_timeout_failure() {
    let sh = setup();
    let command = sh.cmd("xsleep").arg("5000");

    let start = Instant::now();
    let err = command.run_timeout(Duration::from_millis(200)).unwrap_err();
    assert!(err.is_timeout());
    assert!(err.to_string().starts_with("command `xsleep 5000` timed out after"), "{err}");
    assert!(start.elapsed() < Duration::from_secs(4), "child wasn't killed in time");
}

#[test]
fn read_timeout_success() {
    let sh = setup();

    let output = sh.cmd("xsleep").arg("10").read_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(output, "done");
}

#[test]
fn read_stderr_timeout_failure() {
    let sh = setup();

    let err =
        sh.cmd("xsleep").arg("5000").read_stderr_timeout(Duration::from_millis(200)).unwrap_err();
    assert!(err.is_timeout());
}

#[test]
fn output_timeout_reports_status() {
    let sh = setup();

    let err =
        sh.cmd("xsleep").args(["-f", "10"]).output_timeout(Duration::from_secs(5)).unwrap_err();
    assert!(!err.is_timeout());
    assert_eq!(err.exit_code(), Some(1));
    assert_eq!(err.diagnostic(), Some("xsleep: failing as asked"));
}

#[test]
fn per_command_timeout() {
    let sh = setup();

    let err = sh.cmd("xsleep").arg("5000").timeout(Duration::from_millis(200)).run().unwrap_err();
    assert!(err.is_timeout());
}

#[test]
fn config_timeout() {
    let sh = setup();
    let sh = sh
        .with_config(Config { timeout: Some(Duration::from_millis(200)), ..sh.config().clone() });

    let err = sh.cmd("xsleep").arg("5000").read().unwrap_err();
    assert!(err.is_timeout());

    // A per-command timeout wins over the configured one.
    let output = sh.cmd("xsleep").arg("400").timeout(Duration::from_secs(5)).read().unwrap();
    assert_eq!(output, "done");
}

#[test]
fn huge_timeout_means_no_deadline() {
    let sh = setup();

    let output = sh.cmd("xecho").arg("patient").timeout(Duration::MAX).read().unwrap();
    assert_eq!(output, "patient");

    let report = sh.cmd("xecho").args(["-x", "2"]).timeout(Duration::MAX).run_reported();
    assert_eq!(report.exit_code(), Some(2));
}

#[test]
fn huge_configured_timeout() {
    let sh = setup();
    let config = Config::from_lookup(|key| {
        (key == runcheck::TIMEOUT_VAR).then(|| u64::MAX.to_string())
    })
    .unwrap();
    assert_eq!(config.timeout, Some(Duration::from_secs(u64::MAX)));
    let sh = sh.with_config(Config { echo: false, ..config });

    sh.cmd("xsleep").arg("10").run().unwrap();
}
