// ProcessInvokerService: the service-layer wrapper around the SDK
// ProcessInvoker, used to drive the runner's own scripts.

use crate::host_context::HostContext;
use crate::tracing::Tracing;

use anyhow::Result;
use macrunner_sdk::process_invoker::OutputStream;
use macrunner_sdk::ProcessInvoker as SdkProcessInvoker;
use macrunner_sdk::TraceWriter;
use std::path::Path;
use std::sync::Arc;

/// Runs child processes with the context's trace source.
///
/// When `echo_output` is on, every line the child writes is mirrored to the
/// console as it arrives (stderr lines go to stderr).
pub struct ProcessInvokerService {
    trace: Tracing,
    echo_output: bool,
}

impl ProcessInvokerService {
    pub fn new(context: &HostContext, echo_output: bool) -> Self {
        Self {
            trace: context.get_trace("ProcessInvoker"),
            echo_output,
        }
    }

    /// Run `file_name` in `working_directory` and require exit code zero.
    ///
    /// `display_arguments` replaces the argument list in traces and errors
    /// when the arguments carry a secret.
    pub async fn execute(
        &self,
        working_directory: &Path,
        file_name: &str,
        arguments: &[String],
        display_arguments: Option<&str>,
    ) -> Result<i32> {
        let mut invoker =
            SdkProcessInvoker::new(Arc::new(self.trace.clone()) as Arc<dyn TraceWriter>);

        let echo_task = if self.echo_output {
            let mut rx = invoker.subscribe();
            Some(tokio::spawn(async move {
                while let Some(line) = rx.recv().await {
                    match line.stream {
                        OutputStream::Stdout => println!("{}", line.data),
                        OutputStream::Stderr => eprintln!("{}", line.data),
                    }
                }
            }))
        } else {
            None
        };

        let result = invoker
            .execute(
                working_directory,
                file_name,
                arguments,
                None,
                true,
                display_arguments,
            )
            .await;

        // Dropping the invoker closes the output channel so the echo task ends.
        drop(invoker);
        if let Some(task) = echo_task {
            let _ = task.await;
        }

        result
    }
}
