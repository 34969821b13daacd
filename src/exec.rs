//! Executes the process, feeding it stdin, draining stdout/stderr, and
//! optionally imposing a deadline.
//!
//! Everything here is blocking. Each pipe gets its own scoped thread so that a
//! chatty child can't fill a pipe buffer and stall while we wait on it.
//!
//! Both `.kill` and `.wait` require `&mut Child`, so the deadline can't be
//! enforced from a separate thread. Instead, `wait_deadline` polls `try_wait`
//! with a backoff, and kills and reaps the child once the deadline passes.

use std::{
    collections::VecDeque,
    io::{self, Read, Write},
    process::{Child, ChildStderr, ExitStatus},
    thread::ScopedJoinHandle,
    time::{Duration, Instant},
};

pub(crate) struct ExecOutput {
    pub(crate) stdout: Vec<u8>,
    pub(crate) stderr: Vec<u8>,
    pub(crate) status: ExitStatus,
}

pub(crate) enum ExecError {
    Spawn(io::Error),
    Stdin(io::Error),
    Io(io::Error),
    TimedOut,
}

pub(crate) struct Streams<'a> {
    pub(crate) stdin: Option<&'a [u8]>,
    /// Copy stderr to our own stderr as it arrives.
    pub(crate) echo_stderr: bool,
    /// Keep only the last `n` bytes of stderr.
    pub(crate) stderr_limit: Option<usize>,
}

pub(crate) fn wait_deadline(
    child: &mut Child,
    deadline: Option<Instant>,
) -> io::Result<ExitStatus> {
    let Some(deadline) = deadline else {
        return child.wait();
    };

    let mut sleep_ms = 1;
    let sleep_ms_max = 64;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(io::ErrorKind::TimedOut.into());
        }
        std::thread::sleep(Duration::from_millis(sleep_ms));
        sleep_ms = std::cmp::min(sleep_ms * 2, sleep_ms_max);
    }
}

/// Spawns `command` and runs it to completion.
///
/// Stdout and stderr are read only if the caller configured them as piped.
pub(crate) fn exec(
    mut command: std::process::Command,
    streams: Streams<'_>,
    deadline: Option<Instant>,
) -> Result<ExecOutput, ExecError> {
    let mut child = command.spawn().map_err(ExecError::Spawn)?;

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let Streams { stdin: stdin_contents, echo_stderr, stderr_limit } = streams;

    let (status, in_res, out_res, err_res) = std::thread::scope(|scope| {
        let in_thread = stdin.zip(stdin_contents).map(|(mut stdin, contents)| {
            scope.spawn(move || {
                stdin.write_all(contents)?;
                stdin.flush()
            })
        });
        let out_thread = stdout.map(|mut stdout| {
            scope.spawn(move || {
                let mut buf = Vec::new();
                stdout.read_to_end(&mut buf).map(|_| buf)
            })
        });
        let err_thread = stderr.map(|stderr| {
            scope.spawn(move || drain_stderr(stderr, echo_stderr, stderr_limit))
        });

        let status = wait_deadline(&mut child, deadline);
        (status, join(in_thread, ()), join(out_thread, Vec::new()), join(err_thread, Vec::new()))
    });

    let status = match status {
        Ok(status) => status,
        Err(err) if err.kind() == io::ErrorKind::TimedOut => return Err(ExecError::TimedOut),
        Err(err) => return Err(ExecError::Io(err)),
    };
    let stdout = out_res.map_err(ExecError::Io)?;
    let stderr = err_res.map_err(ExecError::Io)?;
    if let Err(err) = in_res {
        // The child is free to exit without reading all of its input.
        if err.kind() != io::ErrorKind::BrokenPipe {
            return Err(ExecError::Stdin(err));
        }
    }

    Ok(ExecOutput { stdout, stderr, status })
}

fn join<T>(thread: Option<ScopedJoinHandle<'_, io::Result<T>>>, default: T) -> io::Result<T> {
    match thread {
        Some(thread) => thread.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
        None => Ok(default),
    }
}

fn drain_stderr(
    mut stderr: ChildStderr,
    echo: bool,
    limit: Option<usize>,
) -> io::Result<Vec<u8>> {
    let mut deque = VecDeque::new();
    let mut buffer = [0u8; 4096];
    loop {
        let n = stderr.read(&mut buffer)?;
        if n == 0 {
            return Ok(deque.into());
        }
        if echo {
            let _ = io::stderr().lock().write_all(&buffer[..n]);
        }
        deque.extend(buffer[..n].iter().copied());
        let excess = deque.len().saturating_sub(limit.unwrap_or(usize::MAX));
        if excess > 0 {
            deque.drain(..excess);
        }
    }
}
