use std::fmt;

use crate::{Cmd, Error, Result};

/// The outcome of a command whose failure was caught and logged instead of
/// propagated.
///
/// Returned by [`Cmd::run_reported`]. A failed report has already been
/// logged at `error` level by the time the caller sees it.
#[derive(Debug)]
#[must_use]
pub struct Report {
    cmd: String,
    error: Option<Error>,
}

impl Report {
    pub(crate) fn new(cmd: &Cmd, res: Result<()>) -> Report {
        let cmd = cmd.to_string();
        match res {
            Ok(()) => {
                tracing::debug!(cmd = %cmd, "command succeeded");
                Report { cmd, error: None }
            }
            Err(error) => {
                tracing::error!(
                    cmd = %cmd,
                    exit_code = ?error.exit_code(),
                    error = %error,
                    "command failed"
                );
                Report { cmd, error: Some(error) }
            }
        }
    }

    /// The command, as it would be echoed.
    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    /// Whether the command ran and exited successfully.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The caught error, if the command failed.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Exit code of a command that failed with a non-zero status.
    pub fn exit_code(&self) -> Option<i32> {
        self.error.as_ref().and_then(Error::exit_code)
    }

    /// Turns the report back into a `Result`, for callers that decide to
    /// propagate the failure after all.
    pub fn into_result(self) -> Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            None => write!(f, "`{}` succeeded", self.cmd),
            Some(err) => write!(f, "{err}"),
        }
    }
}
