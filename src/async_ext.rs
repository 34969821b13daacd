use std::future::Future;
use std::io;
use std::pin::Pin;
use std::process::Output;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::Cmd;
use crate::Error;
use crate::Report;
use crate::Result;

impl Cmd {
    // region:running
    /// Runs the command **asynchronously**.
    ///
    /// Behaves like [`Cmd::run`], except that stderr is forwarded once the
    /// command has finished rather than as it arrives.
    pub fn run_async(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if !self.quiet && self.sh.config.echo {
                eprintln!("$ {}", self);
            }
            self.output_impl_async(false, false).await.map(|_| ())
        })
    }

    /// Run the command **asynchronously** and return its stdout as a string.
    ///
    /// Any trailing newline or carriage return will be trimmed.
    pub fn read_async(&self) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async move { self.read_stream_async(false).await })
    }

    /// Run the command **asynchronously** and return its stderr as a string.
    ///
    /// Any trailing newline or carriage return will be trimmed.
    pub fn read_stderr_async(&self) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async move { self.read_stream_async(true).await })
    }

    /// Run the command **asynchronously** and return its output.
    pub fn output_async(&self) -> Pin<Box<dyn Future<Output = Result<Output>> + Send + '_>> {
        Box::pin(async move { self.output_impl_async(true, true).await })
    }

    /// Asynchronous flavor of [`Cmd::run_reported`].
    pub fn run_reported_async(&self) -> Pin<Box<dyn Future<Output = Report> + Send + '_>> {
        Box::pin(async move { Report::new(self, self.run_async().await) })
    }
    // endregion:running

    async fn read_stream_async(&self, read_stderr: bool) -> Result<String> {
        let read_stdout = !read_stderr;
        let output = self.output_impl_async(read_stdout, read_stderr).await?;

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

    async fn output_impl_async(&self, read_stdout: bool, read_stderr: bool) -> Result<Output> {
        let mut command = tokio::process::Command::from(self.to_command());
        command.kill_on_drop(true);

        if !self.ignore_stdout {
            command.stdout(if read_stdout { Stdio::piped() } else { Stdio::inherit() });
        }
        if !self.ignore_stderr {
            command.stderr(Stdio::piped());
        }
        command.stdin(match &self.stdin_contents {
            Some(_) => Stdio::piped(),
            None => Stdio::null(),
        });

        tracing::debug!(cmd = %self, "running command asynchronously");
        let mut child = command.spawn().map_err(|err| {
            if matches!(err.kind(), io::ErrorKind::NotFound) {
                if let Err(err) = self.sh.cwd.metadata() {
                    return Error::new_current_dir(err, Some(self.sh.cwd.to_path_buf()));
                }
            }
            Error::new_cmd_io(self, err)
        })?;

        let stdin = child.stdin.take();
        let run = async {
            let (in_res, out_res) = tokio::join!(
                write_stdin(stdin, self.stdin_contents.as_deref()),
                child.wait_with_output()
            );
            (in_res, out_res)
        };
        let (in_res, out_res) = match self.effective_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, run)
                .await
                .map_err(|_| Error::new_cmd_timeout(self, timeout))?,
            None => run.await,
        };

        let output = out_res.map_err(|err| Error::new_cmd_io(self, err))?;
        in_res.map_err(|err| Error::new_cmd_stdin(self, err))?;
        tracing::debug!(cmd = %self, status = %output.status, "command finished");

        if !read_stderr && !output.stderr.is_empty() {
            let mut stderr = tokio::io::stderr();
            let _ = stderr.write_all(&output.stderr).await;
        }

        self.check_status(output.status, &output.stderr)?;
        Ok(output)
    }

    /// Async flavor of [`Cmd::run_timeout`].
    pub async fn run_timeout_async(&self, timeout: Duration) -> Result<()> {
        self.clone().timeout(timeout).run_async().await
    }
}

async fn write_stdin(
    stdin: Option<impl AsyncWrite + Unpin>,
    contents: Option<&[u8]>,
) -> io::Result<()> {
    let (Some(mut stdin), Some(contents)) = (stdin, contents) else {
        return Ok(());
    };
    match stdin.write_all(contents).await {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        res => {
            res?;
            stdin.flush().await
        }
    }
}
