use crate::trace::TraceWriter;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// Error type for non-zero process exit codes.
#[derive(Debug, thiserror::Error)]
#[error(
    "Exit code {exit_code} returned from process: file name '{file_name}', arguments '{arguments}'."
)]
pub struct ProcessExitCodeError {
    pub exit_code: i32,
    pub file_name: String,
    pub arguments: String,
}

/// Which stream a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// A line received from a child process.
#[derive(Debug, Clone)]
pub struct ProcessOutputLine {
    pub stream: OutputStream,
    pub data: String,
}

/// Spawns a child process, pumps stdout/stderr line by line into the trace
/// (and optionally an output channel), and waits for it to exit.
///
/// There is no timeout and no cancellation: the caller waits until the child
/// exits on its own.
pub struct ProcessInvoker {
    trace: Arc<dyn TraceWriter>,
    output_tx: Option<mpsc::UnboundedSender<ProcessOutputLine>>,
}

impl ProcessInvoker {
    /// Create a new `ProcessInvoker` with the given trace writer.
    pub fn new(trace: Arc<dyn TraceWriter>) -> Self {
        Self {
            trace,
            output_tx: None,
        }
    }

    /// Subscribe to the child's output. Every line is delivered in addition to
    /// being traced. The receiver closes once the invoker is dropped.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ProcessOutputLine> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.output_tx = Some(tx);
        rx
    }

    /// Execute `file_name` with `arguments` in `working_directory`.
    ///
    /// Arguments are passed verbatim, never through a shell.
    /// Returns the process exit code; when `require_exit_code_zero` is set a
    /// non-zero code becomes a [`ProcessExitCodeError`].
    pub async fn execute(
        &self,
        working_directory: &Path,
        file_name: &str,
        arguments: &[String],
        environment: Option<&HashMap<String, String>>,
        require_exit_code_zero: bool,
        display_arguments: Option<&str>,
    ) -> Result<i32> {
        anyhow::ensure!(!file_name.is_empty(), "file_name must not be empty");

        // Callers pass a redacted rendering when arguments carry secrets.
        let rendered = display_arguments
            .map(str::to_string)
            .unwrap_or_else(|| arguments.join(" "));

        self.trace.info("Starting process:");
        self.trace.info(&format!("  File name: '{file_name}'"));
        self.trace.info(&format!("  Arguments: '{rendered}'"));
        self.trace.info(&format!(
            "  Working directory: '{}'",
            working_directory.display()
        ));
        self.trace.info(&format!(
            "  Require exit code zero: '{require_exit_code_zero}'"
        ));

        let mut cmd = Command::new(file_name);
        cmd.args(arguments);

        if working_directory.is_dir() {
            cmd.current_dir(working_directory);
        }

        if let Some(env) = environment {
            for (key, value) in env {
                cmd.env(key, value);
            }
        }

        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd.stdin(std::process::Stdio::null());

        let start = std::time::Instant::now();
        let mut child = cmd.spawn().with_context(|| {
            format!("Failed to start process '{file_name}' with arguments '{rendered}'")
        })?;

        let pid = child.id().unwrap_or(0);
        self.trace.info(&format!(
            "Process started with process id {pid}, waiting for process exit."
        ));

        let stdout_task = child.stdout.take().map(|stdout| {
            tokio::spawn(pump_lines(
                stdout,
                OutputStream::Stdout,
                self.trace.clone(),
                self.output_tx.clone(),
            ))
        });
        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(pump_lines(
                stderr,
                OutputStream::Stderr,
                self.trace.clone(),
                self.output_tx.clone(),
            ))
        });

        let status = child
            .wait()
            .await
            .context("Failed to wait for process")?;
        let exit_code = status.code().unwrap_or(-1);

        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        if let Some(task) = stderr_task {
            let _ = task.await;
        }

        let elapsed = start.elapsed();
        self.trace.info(&format!(
            "Finished process {pid} with exit code {exit_code}, and elapsed time {elapsed:.2?}."
        ));

        if exit_code != 0 && require_exit_code_zero {
            return Err(ProcessExitCodeError {
                exit_code,
                file_name: file_name.to_string(),
                arguments: rendered,
            }
            .into());
        }

        Ok(exit_code)
    }
}

async fn pump_lines<R>(
    reader: R,
    stream: OutputStream,
    trace: Arc<dyn TraceWriter>,
    output_tx: Option<mpsc::UnboundedSender<ProcessOutputLine>>,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        trace.verbose(&line);
        if let Some(ref tx) = output_tx {
            let _ = tx.send(ProcessOutputLine { stream, data: line });
        }
    }
    trace.verbose(&format!("{stream:?} stream read finished."));
}
