// ConfigManager: the `create` wizard. Collects and verifies the inputs,
// persists the workspace and provisions its first runner.

use crate::command_settings::CreateSettings;
use crate::configuration::permission_validator::PermissionValidator;
use crate::configuration::prompt_manager::{PromptManager, UserInput};
use crate::configuration::registration_pipeline::RegistrationPipeline;
use crate::configuration::runner_host::{LocalRunnerHost, RunnerHost};
use crate::github::{GithubApi, GithubClient, RunnerPlatform};
use crate::workspace::Workspace;

use anyhow::{Context, Result};
use macrunner_common::{ConsoleColor, HostContext, Terminal, Tracing, WorkspaceStore};
use macrunner_sdk::TraceWriter;
use std::sync::Arc;

fn workspace_created_message(name: &str) -> String {
    format!(
        "\n{}\n\n\
         Now you could scale up/down the workspace later by using the following command\n\n  {}\n\n\
         To list all your workspaces, you could use the follow command\n\n  {}\n",
        ConsoleColor::Green.paint("Create a new workspace for Macrunner successfully"),
        ConsoleColor::Green.paint(&format!(
            "macrunner scale --workspace {} --count <count>",
            name
        )),
        ConsoleColor::Green.paint("macrunner list"),
    )
}

/// Drives the `create` command.
pub struct ConfigManager {
    context: Arc<HostContext>,
    api: Arc<dyn GithubApi>,
    host: Arc<dyn RunnerHost>,
    input: Arc<dyn UserInput>,
    platform: RunnerPlatform,
    trace: Tracing,
}

impl ConfigManager {
    pub fn new(
        context: Arc<HostContext>,
        api: Arc<dyn GithubApi>,
        host: Arc<dyn RunnerHost>,
        input: Arc<dyn UserInput>,
    ) -> Self {
        let trace = context.get_trace("ConfigManager");
        Self {
            context,
            api,
            host,
            input,
            platform: RunnerPlatform::current(),
            trace,
        }
    }

    /// Wire the manager to GitHub, the local machine and the terminal.
    pub fn for_console(context: Arc<HostContext>, verbose: bool) -> Result<Self> {
        let api = Arc::new(GithubClient::new(&context)?);
        let host = Arc::new(LocalRunnerHost::new(&context, verbose)?);
        let input = Arc::new(PromptManager::new(Terminal::new(&context), verbose));
        Ok(Self::new(context, api, host, input))
    }

    /// Run the wizard: token, address, workspace name, save, first runner.
    pub async fn create_async(&self, settings: &CreateSettings) -> Result<Workspace> {
        let validator =
            PermissionValidator::new(&self.context, self.api.clone(), self.input.clone());

        let credential = validator.resolve_credential(settings.token.clone()).await?;
        self.input.clear();

        let address = validator
            .resolve_address(settings.repo.clone(), Some(&credential))
            .await?;
        self.input.clear();

        let name = validator.resolve_workspace_name(settings.name.clone())?;
        self.trace.info(&format!(
            "Creating workspace '{}' for {}",
            name,
            address.describe()
        ));

        let store = WorkspaceStore::new(&self.context);
        let mut workspace = Workspace::open(&store, &name, address, credential)?;
        let path = workspace.save(&store)?;
        self.trace
            .info(&format!("Workspace '{}' saved to {:?}", name, path));
        self.input.show_message(&workspace_created_message(&name));

        let pipeline = RegistrationPipeline::new(
            self.context.clone(),
            self.api.clone(),
            self.host.clone(),
            self.platform,
        );
        let runner = workspace
            .create_runner(&pipeline, &store)
            .await
            .with_context(|| format!("Failed to create a runner for workspace '{}'", name))?;

        self.input.show_message(&format!(
            "{} Runner {} is installed as service {}",
            ConsoleColor::Green.paint("√"),
            runner.id,
            runner.service_name
        ));
        Ok(workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeGithubApi, FakeRunnerHost, ScriptedInput};

    fn manager(
        root: &std::path::Path,
        api: FakeGithubApi,
        host: &Arc<FakeRunnerHost>,
        input: &Arc<ScriptedInput>,
    ) -> ConfigManager {
        ConfigManager::new(
            HostContext::with_root(root),
            Arc::new(api),
            host.clone(),
            input.clone(),
        )
    }

    #[tokio::test]
    async fn create_with_supplied_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(FakeRunnerHost::new());
        let input = Arc::new(ScriptedInput::new(&[]));
        let api = FakeGithubApi::new()
            .with_token("ghp_good", &["repo"])
            .with_address("kiennt/macrunner", true);
        let manager = manager(dir.path(), api, &host, &input);

        let workspace = manager
            .create_async(&CreateSettings {
                name: Some("mac1".to_string()),
                repo: Some("kiennt/macrunner".to_string()),
                token: Some("ghp_good".to_string()),
                verbose: true,
            })
            .await
            .unwrap();

        assert_eq!(workspace.runners().len(), 1);
        assert!(input.questions().is_empty());
        assert!(input.messages()[0].contains("Create a new workspace for Macrunner successfully"));

        let store = WorkspaceStore::new(&HostContext::with_root(dir.path()));
        let saved = store.load("mac1").unwrap().unwrap();
        assert_eq!(saved.runners[0].id, "1");
        assert_eq!(saved.address, "kiennt/macrunner");
    }

    #[tokio::test]
    async fn create_prompts_for_missing_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(FakeRunnerHost::new());
        let input = Arc::new(ScriptedInput::new(&["ghp_good", "tikivn", "farm"]));
        let api = FakeGithubApi::new()
            .with_token("ghp_good", &["repo", "admin:org"])
            .with_address("tikivn", true);
        let manager = manager(dir.path(), api, &host, &input);

        let workspace = manager
            .create_async(&CreateSettings::default())
            .await
            .unwrap();

        assert_eq!(workspace.name(), "farm");
        assert!(workspace.address().is_organization());
        assert_eq!(input.questions().len(), 3);
        assert_eq!(host.registrations()[0].1.url, "https://github.com/tikivn");
    }

    #[tokio::test]
    async fn pipeline_failure_keeps_the_saved_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(FakeRunnerHost::failing_on("configure"));
        let input = Arc::new(ScriptedInput::new(&[]));
        let api = FakeGithubApi::new()
            .with_token("ghp_good", &["repo"])
            .with_address("kiennt/macrunner", true);
        let manager = manager(dir.path(), api, &host, &input);

        let result = manager
            .create_async(&CreateSettings {
                name: Some("mac1".to_string()),
                repo: Some("kiennt/macrunner".to_string()),
                token: Some("ghp_good".to_string()),
                verbose: false,
            })
            .await;

        assert!(result.is_err());
        let store = WorkspaceStore::new(&HostContext::with_root(dir.path()));
        assert!(store.load("mac1").unwrap().unwrap().runners.is_empty());
    }
}
