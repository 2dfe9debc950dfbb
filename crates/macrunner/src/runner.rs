// Runner: dispatches the parsed command to its handler.

use anyhow::{Context, Result};
use macrunner_common::constants;
use macrunner_common::{HostContext, Tracing, WorkspaceStore};
use macrunner_sdk::TraceWriter;
use std::sync::Arc;

use crate::command_settings::{CommandSettings, CreateSettings, MacrunnerCommand, ScaleArgs};
use crate::configuration::config_manager::ConfigManager;

/// Top-level command dispatcher.
pub struct Runner {
    context: Arc<HostContext>,
    trace: Tracing,
}

impl Runner {
    pub fn new(context: Arc<HostContext>) -> Self {
        let trace = context.get_trace("Runner");
        Self { context, trace }
    }

    /// Run the command and return the process exit code.
    pub async fn execute_command(&self, settings: CommandSettings) -> Result<i32> {
        match settings.command {
            MacrunnerCommand::Create(args) => self.create(&CreateSettings::from(args)).await,
            MacrunnerCommand::List => self.list(),
            MacrunnerCommand::Scale(args) => self.scale(&args),
        }
    }

    async fn create(&self, settings: &CreateSettings) -> Result<i32> {
        self.trace
            .info(&format!("Executing 'create' command: {}", settings.sanitized()));

        let config_manager = ConfigManager::for_console(self.context.clone(), settings.verbose)?;
        let workspace = config_manager
            .create_async(settings)
            .await
            .context("Create failed")?;

        self.trace.info(&format!(
            "Workspace '{}' now has {} runner(s)",
            workspace.name(),
            workspace.runners().len()
        ));
        Ok(constants::return_code::SUCCESS)
    }

    fn list(&self) -> Result<i32> {
        let known = WorkspaceStore::new(&self.context).list()?;
        self.trace.info(&format!(
            "Executing 'list' command ({} workspace record(s) on disk)",
            known.len()
        ));
        println!("list: not available yet");
        Ok(constants::return_code::SUCCESS)
    }

    fn scale(&self, args: &ScaleArgs) -> Result<i32> {
        self.trace.info(&format!(
            "Executing 'scale' command: workspace={:?}, count={:?}",
            args.workspace, args.count
        ));
        println!("scale: not available yet");
        Ok(constants::return_code::SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn list_and_scale_are_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(HostContext::with_root(dir.path()));

        for args in [vec!["macrunner", "list"], vec!["macrunner", "scale", "-w", "mac1", "-c", "2"]] {
            let settings = CommandSettings::try_parse_from(args).unwrap();
            assert_eq!(
                runner.execute_command(settings).await.unwrap(),
                constants::return_code::SUCCESS
            );
        }
    }
}
