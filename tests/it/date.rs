use runcheck::date::{print_date, read_date};

use crate::setup;

#[test]
fn print_date_succeeds() {
    let sh = setup();

    let report = print_date(&sh);
    assert!(report.is_success(), "{report}");
    assert!(report.error().is_none());
    assert_eq!(report.cmd(), "date");
}

#[test]
fn read_date_uses_the_utility() {
    let sh = setup();

    assert_eq!(read_date(&sh).unwrap(), "Fri Jun 25 12:00:00 UTC 1982");
    assert_eq!(sh.cmd_argv(["date", "--iso"]).unwrap().read().unwrap(), "1982-06-25");
}

#[test]
fn bad_option_is_reported() {
    let sh = setup();

    let err = sh.cmd_argv(["date", "--bogus"]).unwrap().run().unwrap_err();
    assert_eq!(err.exit_code(), Some(1));
    assert_eq!(err.diagnostic(), Some("date: invalid option '--bogus'"));
}

#[test]
fn missing_date_is_reported_not_raised() {
    let mut sh = setup();
    let empty_path = sh.current_dir().join("no-binaries-here");
    sh.set_var("PATH", empty_path);

    let report = print_date(&sh);
    assert!(!report.is_success());
    assert!(report.error().unwrap().is_not_found());
    assert_eq!(report.to_string(), "command not found: `date`");
}

#[test]
fn print_date_is_idempotent() {
    let sh = setup();

    let first = print_date(&sh);
    let second = print_date(&sh);
    assert_eq!(first.is_success(), second.is_success());
    assert_eq!(read_date(&sh).unwrap(), read_date(&sh).unwrap());
}

/// Runs the real `date` from the host, if there is one.
#[cfg(unix)]
#[test]
fn host_date() {
    let sh = runcheck::Shell::new().unwrap();
    let has_date =
        ["/bin/date", "/usr/bin/date"].iter().any(|it| std::path::Path::new(it).exists());
    if !has_date {
        return;
    }

    let report = print_date(&sh);
    assert!(report.is_success(), "{report}");
}
