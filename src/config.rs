//! Settings that apply to every command spawned through a [`Shell`].
//!
//! [`Shell`]: crate::Shell
use std::time::Duration;

use crate::{Error, Result};

/// Echo commands to stderr before [`Cmd::run`](crate::Cmd::run).
pub const ECHO_VAR: &str = "RUNCHECK_ECHO";
/// Default deadline, as `<n>`, `<n>s` or `<n>ms`.
pub const TIMEOUT_VAR: &str = "RUNCHECK_TIMEOUT";
/// Number of trailing stderr bytes kept for error messages.
pub const STDERR_LIMIT_VAR: &str = "RUNCHECK_STDERR_LIMIT";

const DEFAULT_STDERR_LIMIT: usize = 4096;

/// Shell-wide defaults for running commands.
///
/// Individual [`Cmd`](crate::Cmd)s can override the timeout and echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Print `$ <cmd>` to stderr before running.
    pub echo: bool,
    /// Kill commands that run longer than this.
    pub timeout: Option<Duration>,
    /// How much of a failed command's stderr ends up in the error.
    pub stderr_limit: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config { echo: true, timeout: None, stderr_limit: DEFAULT_STDERR_LIMIT }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults
    /// for unset or empty variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let mut res = Config::default();
        let var = |key: &str| lookup(key).filter(|it| !it.trim().is_empty());

        if let Some(value) = var(ECHO_VAR) {
            res.echo = parse_bool(ECHO_VAR, &value)?;
        }
        if let Some(value) = var(TIMEOUT_VAR) {
            res.timeout = Some(parse_duration(TIMEOUT_VAR, &value)?);
        }
        if let Some(value) = var(STDERR_LIMIT_VAR) {
            res.stderr_limit = value
                .trim()
                .parse()
                .map_err(|_| Error::new_config(STDERR_LIMIT_VAR, &value, "expected a byte count"))?;
        }
        Ok(res)
    }
}

fn parse_bool(var: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::new_config(var, value, "expected a boolean")),
    }
}

fn parse_duration(var: &str, value: &str) -> Result<Duration> {
    let trimmed = value.trim();
    let (digits, to_duration): (&str, fn(u64) -> Duration) =
        if let Some(ms) = trimmed.strip_suffix("ms") {
            (ms, Duration::from_millis)
        } else if let Some(secs) = trimmed.strip_suffix('s') {
            (secs, Duration::from_secs)
        } else {
            (trimmed, Duration::from_secs)
        };
    match digits.trim().parse::<u64>() {
        Ok(0) => Err(Error::new_config(var, value, "timeout must be positive")),
        Ok(n) => Ok(to_duration(n)),
        Err(_) => {
            Err(Error::new_config(var, value, "expected a duration like `30`, `30s` or `500ms`"))
        }
    }
}
