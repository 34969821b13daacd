//! Printing the current date with the system `date` utility.
//!
//! ```no_run
//! let sh = runcheck::Shell::new()?;
//! let report = runcheck::date::print_date(&sh);
//! assert!(report.is_success());
//! # Ok::<(), runcheck::Error>(())
//! ```

use crate::{Cmd, Report, Result, Shell};

/// Name of the date utility, looked up on the shell's `PATH`.
pub const DATE_PROGRAM: &str = "date";

fn date_cmd(sh: &Shell) -> Cmd {
    sh.cmd(DATE_PROGRAM).quiet()
}

/// Runs `date`, letting it print to stdout.
///
/// Never fails: if `date` is missing or exits with a non-zero status, the
/// error is logged and returned in the [`Report`].
pub fn print_date(sh: &Shell) -> Report {
    date_cmd(sh).run_reported()
}

/// Runs `date` and returns what it printed, without the trailing newline.
pub fn read_date(sh: &Shell) -> Result<String> {
    date_cmd(sh).read()
}
