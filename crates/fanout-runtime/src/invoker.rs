//! Command invocation.
//!
//! Arguments are joined with single spaces and re-split on whitespace before
//! the process is spawned. No quoting is performed, so an argument containing
//! spaces reaches the child as several arguments.
//!
//! Standard error from every child is forwarded line by line to this
//! process's stderr as it arrives. Lines are not prefixed with the target
//! that produced them, so concurrent invocations may interleave.

use std::fmt;
use std::io::Write;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, trace};

use crate::config::RunConfig;
use crate::error::{Result, RuntimeError};

/// Runs one invocation and returns its captured output.
#[async_trait]
pub trait CommandInvoker: Send + Sync {
    /// Invokes the command with `args` and returns the trimmed stdout text.
    async fn invoke(&self, args: &[String]) -> Result<String>;
}

/// A program plus its space-joined argument string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    arguments: String,
}

impl CommandLine {
    /// Assembles a command line from a program and its arguments.
    pub fn new(program: impl Into<String>, args: &[String]) -> Self {
        Self {
            program: program.into(),
            arguments: args.join(" "),
        }
    }

    /// The program to execute.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The joined argument string.
    pub fn arguments(&self) -> &str {
        &self.arguments
    }

    /// Arguments as the child will receive them.
    pub fn argv(&self) -> Vec<&str> {
        self.arguments.split_whitespace().collect()
    }

    /// Full command line as echoed in verbose mode.
    pub fn render(&self) -> String {
        if self.arguments.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.arguments)
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Spawns the configured executable for each invocation.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    command: String,
    dry_run: bool,
    verbose: bool,
}

impl ProcessRunner {
    /// Creates a runner for `command`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            dry_run: false,
            verbose: false,
        }
    }

    /// Creates a runner from a run configuration.
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            command: config.command.clone(),
            dry_run: config.dry_run,
            verbose: config.verbose,
        }
    }

    /// Skip spawning and return empty output.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Echo each command line to stderr before running it.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// The executable this runner spawns.
    pub fn command(&self) -> &str {
        &self.command
    }

    async fn spawn_and_capture(&self, line: &CommandLine) -> Result<String> {
        let mut child = Command::new(line.program())
            .args(line.argv())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RuntimeError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Both pipes are drained on this task so a chatty stderr cannot block
        // the child while we wait on stdout.
        let (captured, forwarded) = tokio::join!(
            async {
                let mut out = String::new();
                if let Some(stdout) = stdout {
                    read_lines(stdout, |line| {
                        out.push_str(line);
                        out.push('\n');
                    })
                    .await?;
                }
                Ok::<_, std::io::Error>(out)
            },
            async {
                match stderr {
                    Some(stderr) => read_lines(stderr, forward_stderr_line).await,
                    None => Ok(()),
                }
            }
        );

        let status = child.wait().await.map_err(|source| RuntimeError::Process {
            command: self.command.clone(),
            source,
        })?;
        debug!(command = %self.command, status = %status, "process exited");

        let process_err = |source| RuntimeError::Process {
            command: self.command.clone(),
            source,
        };
        forwarded.map_err(process_err)?;
        let captured = captured.map_err(process_err)?;

        Ok(captured.trim().to_string())
    }
}

#[async_trait]
impl CommandInvoker for ProcessRunner {
    async fn invoke(&self, args: &[String]) -> Result<String> {
        let line = CommandLine::new(self.command.as_str(), args);

        if self.verbose {
            eprintln!("{}", line);
        }
        trace!(command_line = %line, dry_run = self.dry_run, "invoking");

        if self.dry_run {
            return Ok(String::new());
        }

        self.spawn_and_capture(&line).await
    }
}

/// Reads `reader` line by line, decoding lossily and stripping the line
/// terminator before handing each line to `on_line`.
async fn read_lines<R, F>(reader: R, mut on_line: F) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        on_line(&String::from_utf8_lossy(&buf));
    }

    Ok(())
}

fn forward_stderr_line(line: &str) {
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = writeln!(handle, "{}", line);
}
