use std::time::Duration;

use super::setup;

#[tokio::test]
async fn test_run_async() {
    let sh = setup();
    let sh = sh.with_current_dir("nonexistent");
    let err = sh.cmd("xecho").run_async().await.unwrap_err();
    let message = err.to_string();
    if cfg!(unix) {
        assert!(message.contains("nonexistent"), "{message}");
        assert!(message.starts_with("failed to get current directory"));
        assert!(message.ends_with("no such file or directory (os error 2)"), "{message}");
    }
}

#[tokio::test]
async fn test_read_async() {
    let sh = setup();

    let output = sh.cmd("xecho").arg("hello").read_async().await.unwrap();
    assert_eq!(output, "hello");
}

#[tokio::test]
async fn test_read_stderr_async() {
    let sh = setup();

    let output = sh
        .cmd("xecho")
        .args(["-x", "1", "-e", "snafu"])
        .ignore_status()
        .read_stderr_async()
        .await
        .unwrap();
    assert!(output.contains("snafu"));
}

#[tokio::test]
async fn test_status_async() {
    let sh = setup();

    let err = sh.cmd("xecho").args(["-x", "5"]).output_async().await.unwrap_err();
    assert_eq!(err.exit_code(), Some(5));
    assert_eq!(err.diagnostic(), Some("xecho: exiting with 5"));
}

#[tokio::test]
async fn test_stdin_async() {
    let sh = setup();

    let output = sh.cmd("xecho").arg("-i").stdin("piped in").read_async().await.unwrap();
    assert_eq!(output, "piped in");
}

#[tokio::test]
async fn test_timeout_async() {
    let sh = setup();

    let err = sh
        .cmd("xsleep")
        .arg("5000")
        .run_timeout_async(Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    let output =
        sh.cmd("xsleep").arg("10").timeout(Duration::from_secs(5)).read_async().await.unwrap();
    assert_eq!(output, "done");
}

#[tokio::test]
async fn test_reported_async() {
    let sh = setup();

    let report = sh.cmd("nonexistent-cmd-xyz").run_reported_async().await;
    assert!(!report.is_success());
    assert!(report.error().unwrap().is_not_found());
}
