use std::{fmt, io, path::PathBuf, process::ExitStatus, string::FromUtf8Error, time::Duration};

use crate::Cmd;

/// `Result` from std, with the error type defaulting to runcheck's [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error returned by a `runcheck` operation.
///
/// The interesting part lives in [`ErrorKind`], see [`Error::kind`].
pub struct Error {
    kind: Box<ErrorKind>,
}

/// The reason a command could not be run to a successful completion.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An empty argument list was supplied where a program was expected.
    #[error("command line is empty")]
    EmptyCommand,
    /// The working directory of the shell does not exist or is unreadable.
    #[error("failed to get current directory{}: {}", fmt_path(.path), errstr(.err))]
    CurrentDir { path: Option<PathBuf>, err: io::Error },
    /// The program was not found.
    #[error("command not found: `{program}`")]
    NotFound { program: String },
    /// Spawning or waiting for the child failed.
    #[error("command `{cmd}` failed, {}", errstr(.err))]
    Io { cmd: String, err: io::Error },
    /// The child exited with a non-zero status.
    #[error("command `{cmd}` failed, {status}{}", fmt_diagnostic(.stderr))]
    Status { cmd: String, status: ExitStatus, stderr: String },
    /// The child did not finish before its deadline and was killed.
    #[error("command `{cmd}` timed out after {timeout:?}")]
    Timeout { cmd: String, timeout: Duration },
    /// Writing to the child's stdin failed.
    #[error("command `{cmd}` failed to write to stdin, {}", errstr(.err))]
    Stdin { cmd: String, err: io::Error },
    /// The captured output was not valid UTF-8.
    #[error("command `{cmd}` produced invalid utf8, {err}")]
    NonUtf8 { cmd: String, err: FromUtf8Error },
    /// A configuration variable holds a value that can't be used.
    #[error("invalid value for `{var}`: {value:?}, {reason}")]
    Config { var: String, value: String, reason: String },
}

fn errstr(err: &io::Error) -> String {
    let mut res = err.to_string();
    if res.is_char_boundary(1) {
        res[..1].make_ascii_lowercase();
    }
    res
}

fn fmt_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" `{}`", path.display()),
        None => String::new(),
    }
}

fn fmt_diagnostic(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\nstderr:\n{stderr}")
    }
}

impl Error {
    /// Returns what went wrong.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The exit status of the child, if it ran to completion.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        match &*self.kind {
            ErrorKind::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The exit code of the child. `None` if the child didn't exit
    /// normally, for example when it was killed by a signal.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_status().and_then(|it| it.code())
    }

    /// Trailing stderr output of a failed child, if there was any.
    pub fn diagnostic(&self) -> Option<&str> {
        match &*self.kind {
            ErrorKind::Status { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }

    /// Whether the program could not be found.
    pub fn is_not_found(&self) -> bool {
        matches!(&*self.kind, ErrorKind::NotFound { .. })
    }

    /// Whether the child was killed because it ran past its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(&*self.kind, ErrorKind::Timeout { .. })
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error { kind: Box::new(kind) }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let err: &(dyn std::error::Error + 'static) = match &*self.kind {
            ErrorKind::CurrentDir { err, .. }
            | ErrorKind::Io { err, .. }
            | ErrorKind::Stdin { err, .. } => err,
            ErrorKind::NonUtf8 { err, .. } => err,
            _ => return None,
        };
        Some(err)
    }
}

/// `pub(crate)` constructors.
impl Error {
    pub(crate) fn new_empty_command() -> Error {
        ErrorKind::EmptyCommand.into()
    }

    pub(crate) fn new_current_dir(err: io::Error, path: Option<PathBuf>) -> Error {
        ErrorKind::CurrentDir { path, err }.into()
    }

    pub(crate) fn new_cmd_io(cmd: &Cmd, err: io::Error) -> Error {
        if err.kind() == io::ErrorKind::NotFound {
            let program = if cmd.is_secret() {
                "<secret>".to_string()
            } else {
                cmd.program().to_string_lossy().into_owned()
            };
            return ErrorKind::NotFound { program }.into();
        }
        ErrorKind::Io { cmd: cmd.to_string(), err }.into()
    }

    pub(crate) fn new_cmd_status(cmd: &Cmd, status: ExitStatus, stderr: &[u8]) -> Error {
        let stderr = String::from_utf8_lossy(stderr).trim_end().to_string();
        ErrorKind::Status { cmd: cmd.to_string(), status, stderr }.into()
    }

    pub(crate) fn new_cmd_timeout(cmd: &Cmd, timeout: Duration) -> Error {
        ErrorKind::Timeout { cmd: cmd.to_string(), timeout }.into()
    }

    pub(crate) fn new_cmd_stdin(cmd: &Cmd, err: io::Error) -> Error {
        ErrorKind::Stdin { cmd: cmd.to_string(), err }.into()
    }

    pub(crate) fn new_cmd_utf8(cmd: &Cmd, err: FromUtf8Error) -> Error {
        ErrorKind::NonUtf8 { cmd: cmd.to_string(), err }.into()
    }

    pub(crate) fn new_config(var: &str, value: &str, reason: impl Into<String>) -> Error {
        ErrorKind::Config { var: var.to_string(), value: value.to_string(), reason: reason.into() }
            .into()
    }
}

#[test]
fn error_send_sync() {
    fn f<T: Send + Sync>() {}
    f::<Error>();
}
