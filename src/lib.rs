//! runcheck runs external commands and tells you, loudly and precisely, when
//! they fail.
//!
//! A command is an ordered list of strings: the program, then its arguments.
//! Running it blocks until the child exits. Exit status zero is success,
//! anything else is an [`Error`] that carries the status and the tail of the
//! child's stderr.
//!
//! ```no_run
//! use runcheck::Shell;
//!
//! let sh = Shell::new()?;
//! let today = sh.cmd("date").arg("+%Y-%m-%d").read()?;
//! println!("today is {today}");
//! # Ok::<(), runcheck::Error>(())
//! ```
//!
//! Scripts that should keep going after a failed command use
//! [`Cmd::run_reported`], which logs the failure through `tracing` and hands
//! back a [`Report`] instead of an error:
//!
//! ```no_run
//! use runcheck::{date, Shell};
//!
//! let sh = Shell::new()?;
//! let report = date::print_date(&sh);
//! if !report.is_success() {
//!     eprintln!("couldn't print the date, carrying on");
//! }
//! # Ok::<(), runcheck::Error>(())
//! ```
//!
//! # Configuration
//!
//! [`Shell::new`] reads a few environment variables, see [`Config`]:
//!
//! * `RUNCHECK_ECHO`: echo `$ <cmd>` before [`Cmd::run`], on by default.
//! * `RUNCHECK_TIMEOUT`: kill commands after `30`, `30s` or `500ms`.
//! * `RUNCHECK_STDERR_LIMIT`: bytes of stderr kept in errors, 4096 by default.
//!
//! # Feature flags
//!
//! * `async`: adds `_async` flavors of the running methods, backed by tokio.

#![deny(missing_debug_implementations)]
#![warn(missing_docs)]
#![deny(rust_2018_idioms)]

mod config;
mod error;
mod exec;
mod report;

#[cfg(feature = "async")]
mod async_ext;

pub mod date;

use std::{
    collections::HashMap,
    env::{self, current_dir, VarError},
    ffi::{OsStr, OsString},
    fmt,
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Output, Stdio},
    sync::Arc,
    time::{Duration, Instant},
};

pub use crate::{
    config::{Config, ECHO_VAR, STDERR_LIMIT_VAR, TIMEOUT_VAR},
    error::{Error, ErrorKind, Result},
    report::Report,
};
use crate::exec::{ExecError, Streams};

type EnvMap = HashMap<Arc<OsStr>, Option<Arc<OsStr>>>;

/// The context commands run in.
///
/// A `Shell` holds a logical working directory, environment overrides and a
/// [`Config`]. They are independent from the process's
/// [`std::env::current_dir`] and [`std::env::var`], and only affect commands
/// created from this shell.
///
/// Cloning is cheap, and clones never share mutable state, so a script can
/// hand out tweaked copies without affecting the original.
///
/// By convention, variable holding the shell is named `sh`.
#[derive(Debug, Clone)]
pub struct Shell {
    cwd: Arc<Path>,
    env: Arc<EnvMap>,
    config: Config,
}

impl Shell {
    /// Creates a new [`Shell`].
    ///
    /// Fails if [`std::env::current_dir`] returns an error, or if one of the
    /// `RUNCHECK_*` variables holds a value that can't be parsed.
    pub fn new() -> Result<Shell> {
        let cwd = current_dir().map_err(|err| Error::new_current_dir(err, None))?;
        let config = Config::from_env()?;
        Ok(Shell { cwd: cwd.into(), env: Default::default(), config })
    }

    /// Returns the configuration for this [`Shell`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replaces the configuration for this [`Shell`].
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Returns a new [`Shell`] with the given configuration.
    #[must_use]
    pub fn with_config(&self, config: Config) -> Shell {
        Shell { config, ..self.clone() }
    }

    /// Re-reads the configuration through this shell's environment, so that
    /// variables set with [`Shell::set_var`] take effect.
    pub fn reload_config(&mut self) -> Result<()> {
        self.config = Config::from_lookup(|key| self.var(key).ok())?;
        Ok(())
    }

    /// Returns the working directory for this [`Shell`].
    #[doc(alias = "pwd")]
    pub fn current_dir(&self) -> &Path {
        self.cwd.as_ref()
    }

    /// Changes the working directory for this [`Shell`].
    ///
    /// Note that this doesn't affect [`std::env::current_dir`].
    #[doc(alias = "cd")]
    pub fn change_dir(&mut self, dir: impl AsRef<Path>) {
        self.cwd = self.cwd.join(dir.as_ref()).into();
    }

    /// Returns a new [`Shell`] with the working directory set to `path`.
    #[doc(alias = "pushd")]
    #[must_use]
    pub fn with_current_dir(&self, path: impl AsRef<Path>) -> Shell {
        Shell { cwd: self.cwd.join(path.as_ref()).into(), ..self.clone() }
    }

    /// Fetches the environmental variable `key` for this [`Shell`].
    ///
    /// Returns an error if the variable is not set, or set to a non-utf8 value.
    pub fn var(&self, key: impl AsRef<OsStr>) -> Result<String, VarError> {
        let key = key.as_ref();
        match self.var_os(key) {
            Some(it) => it.into_string().map_err(VarError::NotUnicode),
            None => Err(VarError::NotPresent),
        }
    }

    /// Fetches the environmental variable `key` for this [`Shell`] as
    /// [`OsString`]. Returns [`None`] if the variable is not set or was
    /// removed with [`Shell::remove_var`].
    pub fn var_os(&self, key: impl AsRef<OsStr>) -> Option<OsString> {
        let key = key.as_ref();
        match self.env.get(key) {
            Some(value) => value.as_deref().map(OsStr::to_os_string),
            None => env::var_os(key),
        }
    }

    /// Sets the value of `key` environment variable for this [`Shell`] to
    /// `val`.
    ///
    /// Note that this doesn't affect [`std::env::var`].
    pub fn set_var(&mut self, key: impl AsRef<OsStr>, val: impl AsRef<OsStr>) {
        Arc::make_mut(&mut self.env).insert(key.as_ref().into(), Some(val.as_ref().into()));
    }

    /// Hides the environment variable `key` from commands of this [`Shell`].
    pub fn remove_var(&mut self, key: impl AsRef<OsStr>) {
        Arc::make_mut(&mut self.env).insert(key.as_ref().into(), None);
    }

    /// Creates a new [`Cmd`] that executes the given `program`.
    pub fn cmd(&self, program: impl AsRef<OsStr>) -> Cmd {
        Cmd::new(self, program.as_ref())
    }

    /// Creates a new [`Cmd`] from an argument vector: the first element is
    /// the program, the rest are its arguments.
    ///
    /// Fails if `argv` is empty or the program name is empty.
    ///
    /// ```
    /// # use runcheck::Shell;
    /// let sh = Shell::new()?;
    /// let cmd = sh.cmd_argv(["git", "commit", "-m", "fix typo"])?;
    /// assert_eq!(cmd.to_string(), r#"git commit -m "fix typo""#);
    ///
    /// assert!(sh.cmd_argv(Vec::<String>::new()).is_err());
    /// # Ok::<(), runcheck::Error>(())
    /// ```
    pub fn cmd_argv<I>(&self, argv: I) -> Result<Cmd>
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        let mut argv = argv.into_iter();
        let program = match argv.next() {
            Some(it) if !it.as_ref().is_empty() => it,
            _ => return Err(Error::new_empty_command()),
        };
        Ok(self.cmd(program).args(argv))
    }
}

/// A builder object for constructing a subprocess.
///
/// A [`Cmd`] is created with [`Shell::cmd`] or [`Shell::cmd_argv`] and uses
/// the shell's working directory, environment and configuration.
///
/// Running methods take `&self`, so the same command can be run repeatedly.
///
/// # Example
///
/// ```no_run
/// use runcheck::Shell;
///
/// let sh = Shell::new()?;
/// sh.cmd("git").args(["switch", "main"]).quiet().run()?;
/// # Ok::<(), runcheck::Error>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct Cmd {
    sh: Shell,
    prog: PathBuf,
    args: Vec<OsString>,
    env_clear: bool,
    ignore_status: bool,
    quiet: bool,
    secret: bool,
    stdin_contents: Option<Vec<u8>>,
    ignore_stdout: bool,
    ignore_stderr: bool,
    timeout: Option<Duration>,
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secret {
            return write!(f, "<secret>");
        }

        write!(f, "{}", self.prog.as_path().display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.chars().any(|it| it.is_ascii_whitespace()) {
                write!(f, " \"{}\"", arg.escape_default())?
            } else {
                write!(f, " {}", arg)?
            };
        }
        Ok(())
    }
}

impl From<Cmd> for Command {
    fn from(cmd: Cmd) -> Command {
        cmd.to_command()
    }
}

impl Cmd {
    fn new(sh: &Shell, prog: impl AsRef<Path>) -> Cmd {
        Cmd {
            sh: sh.clone(),
            prog: prog.as_ref().into(),
            args: Vec::new(),
            env_clear: false,
            ignore_status: false,
            quiet: false,
            secret: false,
            stdin_contents: None,
            ignore_stdout: false,
            ignore_stderr: false,
            timeout: None,
        }
    }

    /// The program this command runs.
    pub fn program(&self) -> &Path {
        &self.prog
    }

    /// Whether the command is hidden from echo, logs and error messages.
    pub fn is_secret(&self) -> bool {
        self.secret
    }

    // region:builder
    /// Adds an argument to this command.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Cmd {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Adds all of the arguments to this command.
    pub fn args<I>(mut self, args: I) -> Cmd
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|it| it.as_ref().to_owned()));
        self
    }

    /// Overrides the value of the environmental variable for this command.
    pub fn env(mut self, key: impl AsRef<OsStr>, val: impl AsRef<OsStr>) -> Cmd {
        self.sh.set_var(key, val);
        self
    }

    /// Overrides the values of specified environmental variables for this
    /// command.
    pub fn envs<I, K, V>(mut self, vars: I) -> Cmd
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        for (k, v) in vars {
            self.sh.set_var(k, v);
        }
        self
    }

    /// Removes the environment variable from this command.
    pub fn env_remove(mut self, key: impl AsRef<OsStr>) -> Cmd {
        self.sh.remove_var(key);
        self
    }

    /// Removes all of the environment variables from this command, including
    /// the ones inherited from the process.
    pub fn env_clear(mut self) -> Cmd {
        self.env_clear = true;
        Arc::make_mut(&mut self.sh.env).clear();
        self
    }

    /// Runs the command in `dir`, interpreted relative to the shell's working
    /// directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Cmd {
        self.sh.change_dir(dir);
        self
    }

    /// Don't return an error if the command exits with non-zero status.
    ///
    /// By default, non-zero exit status is considered an error.
    pub fn ignore_status(mut self) -> Cmd {
        self.set_ignore_status(true);
        self
    }
    /// Controls whether non-zero exit status is considered an error.
    pub fn set_ignore_status(&mut self, yes: bool) {
        self.ignore_status = yes;
    }

    /// Don't echo the command itself to stderr.
    ///
    /// By default, the command itself will be printed to stderr when executed
    /// via [`Cmd::run`], unless [`Config::echo`] is off.
    pub fn quiet(mut self) -> Cmd {
        self.set_quiet(true);
        self
    }
    /// Controls whether the command itself is printed to stderr.
    pub fn set_quiet(&mut self, yes: bool) {
        self.quiet = yes;
    }

    /// Marks the command as secret.
    ///
    /// If a command is secret, it echoes `<secret>` instead of the program and
    /// its arguments, even in error messages and logs.
    pub fn secret(mut self) -> Cmd {
        self.set_secret(true);
        self
    }
    /// Controls whether the command is secret.
    pub fn set_secret(&mut self, yes: bool) {
        self.secret = yes;
    }

    /// Pass the given slice to the standard input of the spawned process.
    pub fn stdin(mut self, stdin: impl AsRef<[u8]>) -> Cmd {
        self.stdin_contents = Some(stdin.as_ref().to_vec());
        self
    }

    /// Ignores the standard output stream of the process.
    ///
    /// This is equivalent to redirecting stdout to `/dev/null`.
    pub fn ignore_stdout(mut self) -> Cmd {
        self.set_ignore_stdout(true);
        self
    }
    /// Controls whether the standard output is ignored.
    pub fn set_ignore_stdout(&mut self, yes: bool) {
        self.ignore_stdout = yes;
    }

    /// Ignores the standard error stream of the process.
    ///
    /// This is equivalent to redirecting stderr to `/dev/null`. Errors for
    /// such commands carry no diagnostic text.
    pub fn ignore_stderr(mut self) -> Cmd {
        self.set_ignore_stderr(true);
        self
    }
    /// Controls whether the standard error is ignored.
    pub fn set_ignore_stderr(&mut self, yes: bool) {
        self.ignore_stderr = yes;
    }

    /// Kills the command if it runs longer than `timeout`.
    ///
    /// Overrides [`Config::timeout`].
    pub fn timeout(mut self, timeout: Duration) -> Cmd {
        self.timeout = Some(timeout);
        self
    }
    // endregion:builder

    // region:running
    /// Runs the command.
    ///
    /// By default the command itself is echoed to stderr, its stdout is
    /// inherited, its stderr is shown as it arrives and kept for the error
    /// message, and non-zero return code is considered an error. These
    /// behaviors can be overridden by using various builder methods of the
    /// [`Cmd`].
    pub fn run(&self) -> Result<()> {
        self.run_impl(self.effective_timeout())
    }

    /// Runs the command, killing it if it doesn't finish within `timeout`.
    pub fn run_timeout(&self, timeout: Duration) -> Result<()> {
        self.run_impl(Some(timeout))
    }

    /// Runs the command and return its stdout as a string. Any trailing
    /// newline or carriage return will be trimmed.
    pub fn read(&self) -> Result<String> {
        self.read_stream(false, self.effective_timeout())
    }

    /// Like [`Cmd::read`], with a deadline.
    pub fn read_timeout(&self, timeout: Duration) -> Result<String> {
        self.read_stream(false, Some(timeout))
    }

    /// Runs the command and return its stderr as a string. Any trailing
    /// newline or carriage return will be trimmed.
    pub fn read_stderr(&self) -> Result<String> {
        self.read_stream(true, self.effective_timeout())
    }

    /// Like [`Cmd::read_stderr`], with a deadline.
    pub fn read_stderr_timeout(&self, timeout: Duration) -> Result<String> {
        self.read_stream(true, Some(timeout))
    }

    /// Runs the command and return its output.
    pub fn output(&self) -> Result<Output> {
        self.output_impl(true, true, self.effective_timeout())
    }

    /// Like [`Cmd::output`], with a deadline.
    pub fn output_timeout(&self, timeout: Duration) -> Result<Output> {
        self.output_impl(true, true, Some(timeout))
    }

    /// Runs the command like [`Cmd::run`], but never fails: any error is
    /// logged and returned inside the [`Report`].
    pub fn run_reported(&self) -> Report {
        Report::new(self, self.run())
    }
    // endregion:running

    fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.or(self.sh.config.timeout)
    }

    fn run_impl(&self, timeout: Option<Duration>) -> Result<()> {
        if !self.quiet && self.sh.config.echo {
            eprintln!("$ {}", self);
        }
        self.output_impl(false, false, timeout).map(|_| ())
    }

    fn read_stream(&self, read_stderr: bool, timeout: Option<Duration>) -> Result<String> {
        let read_stdout = !read_stderr;
        let output = self.output_impl(read_stdout, read_stderr, timeout)?;

        let stream = if read_stderr { output.stderr } else { output.stdout };
        let mut stream = String::from_utf8(stream).map_err(|err| Error::new_cmd_utf8(self, err))?;

        if stream.ends_with('\n') {
            stream.pop();
        }
        if stream.ends_with('\r') {
            stream.pop();
        }

        Ok(stream)
    }

    fn output_impl(
        &self,
        read_stdout: bool,
        read_stderr: bool,
        timeout: Option<Duration>,
    ) -> Result<Output> {
        let mut command = self.to_command();

        if !self.ignore_stdout {
            command.stdout(if read_stdout { Stdio::piped() } else { Stdio::inherit() });
        }
        // Stderr is always captured: either the caller wants it, or it feeds
        // the diagnostic of a failed command.
        if !self.ignore_stderr {
            command.stderr(Stdio::piped());
        }
        command.stdin(match &self.stdin_contents {
            Some(_) => Stdio::piped(),
            None => Stdio::null(),
        });

        let streams = Streams {
            stdin: self.stdin_contents.as_deref(),
            echo_stderr: !read_stderr,
            stderr_limit: if read_stderr { None } else { Some(self.sh.config.stderr_limit) },
        };
        // A deadline too far out to represent is no deadline at all.
        let deadline = timeout.and_then(|it| Instant::now().checked_add(it));

        tracing::debug!(cmd = %self, cwd = %self.sh.cwd.display(), ?timeout, "running command");
        let output = exec::exec(command, streams, deadline).map_err(|err| match err {
            ExecError::Spawn(err) => {
                // Try to determine whether the command failed because the current
                // directory does not exist. Return an appropriate error in such a
                // case.
                if err.kind() == std::io::ErrorKind::NotFound {
                    if let Err(err) = self.sh.cwd.metadata() {
                        return Error::new_current_dir(err, Some(self.sh.cwd.to_path_buf()));
                    }
                }
                Error::new_cmd_io(self, err)
            }
            ExecError::Stdin(err) => Error::new_cmd_stdin(self, err),
            ExecError::Io(err) => Error::new_cmd_io(self, err),
            ExecError::TimedOut => {
                Error::new_cmd_timeout(self, timeout.unwrap_or_default())
            }
        })?;
        tracing::debug!(cmd = %self, status = %output.status, "command finished");

        self.check_status(output.status, &output.stderr)?;
        Ok(Output { status: output.status, stdout: output.stdout, stderr: output.stderr })
    }

    /// Builds the [`std::process::Command`] this [`Cmd`] would spawn.
    pub fn to_command(&self) -> Command {
        let mut res = Command::new(&self.prog);
        res.current_dir(&self.sh.cwd);
        res.args(&self.args);

        if self.env_clear {
            res.env_clear();
        }
        for (key, val) in &*self.sh.env {
            match val {
                Some(val) => res.env(key, val),
                None => res.env_remove(key),
            };
        }

        if self.ignore_stdout {
            res.stdout(Stdio::null());
        }

        if self.ignore_stderr {
            res.stderr(Stdio::null());
        }

        res
    }

    fn check_status(&self, status: ExitStatus, stderr: &[u8]) -> Result<()> {
        if status.success() || self.ignore_status {
            return Ok(());
        }
        let tail = stderr.len().saturating_sub(self.sh.config.stderr_limit);
        Err(Error::new_cmd_status(self, status, &stderr[tail..]))
    }
}
