// CommandSettings: the macrunner command line.
// Every `create` input falls back to a MACRUNNER_INPUT_* environment
// variable when the flag is absent.

use clap::{Args, Parser, Subcommand};
use macrunner_sdk::MacrunnerPackage;

/// Parsed command line.
#[derive(Parser, Debug)]
#[command(
    name = MacrunnerPackage::NAME,
    about = MacrunnerPackage::LABEL,
    version = MacrunnerPackage::VERSION
)]
pub struct CommandSettings {
    #[command(subcommand)]
    pub command: MacrunnerCommand,
}

#[derive(Subcommand, Debug)]
pub enum MacrunnerCommand {
    /// Create a workspace and provision its first runner.
    Create(CreateArgs),
    /// List workspaces.
    List,
    /// Scale the runners of a workspace.
    Scale(ScaleArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct CreateArgs {
    /// Workspace name.
    #[arg(short, long, env = "MACRUNNER_INPUT_NAME")]
    pub name: Option<String>,

    /// Target organization (`org`) or repository (`owner/repo`).
    #[arg(short, long, env = "MACRUNNER_INPUT_REPO")]
    pub repo: Option<String>,

    /// GitHub token with the `repo` scope.
    #[arg(short, long, env = "MACRUNNER_INPUT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Hide the help text shown above each question and the output of the
    /// runner scripts.
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ScaleArgs {
    /// Workspace name.
    #[arg(short, long)]
    pub workspace: Option<String>,

    /// Desired number of runners.
    #[arg(short, long)]
    pub count: Option<u32>,
}

/// Inputs of the `create` wizard. Missing values are prompted for.
#[derive(Debug, Clone, Default)]
pub struct CreateSettings {
    pub name: Option<String>,
    pub repo: Option<String>,
    pub token: Option<String>,
    pub verbose: bool,
}

impl CreateSettings {
    /// Rendering for logs with the token masked.
    pub fn sanitized(&self) -> String {
        format!(
            "name={:?}, repo={:?}, token={}, verbose={}",
            self.name,
            self.repo,
            if self.token.is_some() { "***" } else { "None" },
            self.verbose
        )
    }
}

impl From<CreateArgs> for CreateSettings {
    fn from(args: CreateArgs) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            name: non_empty(args.name),
            repo: non_empty(args.repo),
            token: non_empty(args.token),
            verbose: !args.quiet,
        }
    }
}
