// HostContext: the application context shared by every component.
// Resolves the per-user base directory, hands out trace sources and owns the
// process-wide SecretMasker.

use crate::constants::{self, WellKnownDirectory};
use crate::secret_masker::SecretMasker;
use crate::tracing::{TraceManager, TraceSetting, Tracing};

use anyhow::{Context, Result};
use macrunner_sdk::{MacrunnerPackage, StringUtil};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The central application context.
///
/// Everything macrunner writes lives below one base directory:
///
/// ```text
/// <root>/runners/<version>/runner.tar.gz
/// <root>/workspaces/<name>/config.json
/// <root>/workspaces/<name>/runner<id>/
/// ```
pub struct HostContext {
    root: PathBuf,

    /// Base URL of the GitHub REST API.
    github_api_url: String,

    /// Secret masker shared across the whole process.
    pub secret_masker: SecretMasker,

    trace_manager: TraceManager,
}

impl HostContext {
    /// Create the context from the environment.
    ///
    /// The base directory is `$MACRUNNER_HOME` when set, otherwise
    /// `~/.macrunner`.
    pub fn new() -> Result<Arc<Self>> {
        let root = match env::var(constants::variables::HOME) {
            Ok(home) if !home.trim().is_empty() => PathBuf::from(home),
            _ => dirs::home_dir()
                .context("Could not determine the home directory")?
                .join(constants::path::BASE_DIRECTORY),
        };

        let github_api_url = env::var(constants::variables::GITHUB_API_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| constants::github::API_URL.to_string());

        let print_to_stdout = env::var(constants::variables::PRINT_LOG_TO_STDOUT)
            .ok()
            .and_then(|v| StringUtil::convert_to_bool(&v))
            .unwrap_or(false);

        Ok(Self::build(root, github_api_url, print_to_stdout))
    }

    /// Create a context rooted at an explicit directory (tests, tooling).
    pub fn with_root(root: impl Into<PathBuf>) -> Arc<Self> {
        Self::build(root.into(), constants::github::API_URL.to_string(), false)
    }

    fn build(root: PathBuf, github_api_url: String, print_to_stdout: bool) -> Arc<Self> {
        let secret_masker = SecretMasker::new();
        let trace_setting = TraceSetting {
            print_to_stdout,
            ..TraceSetting::default()
        };
        let trace_manager = TraceManager::new(secret_masker.clone(), trace_setting);

        Arc::new(Self {
            root,
            github_api_url: github_api_url.trim_end_matches('/').to_string(),
            secret_masker,
            trace_manager,
        })
    }

    // -----------------------------------------------------------------------
    // Directory resolution
    // -----------------------------------------------------------------------

    /// Resolve the path for a well-known directory.
    pub fn get_directory(&self, directory: WellKnownDirectory) -> PathBuf {
        match directory {
            WellKnownDirectory::Root => self.root.clone(),
            WellKnownDirectory::Runners => self.root.join(constants::path::RUNNERS_DIRECTORY),
            WellKnownDirectory::Workspaces => {
                self.root.join(constants::path::WORKSPACES_DIRECTORY)
            }
        }
    }

    /// Directory holding the cached archive of one runner release.
    pub fn runner_cache_directory(&self, version: &str) -> PathBuf {
        self.get_directory(WellKnownDirectory::Runners).join(version)
    }

    /// Directory of one workspace; derived from the workspace name only.
    pub fn workspace_directory(&self, workspace_name: &str) -> PathBuf {
        self.get_directory(WellKnownDirectory::Workspaces)
            .join(workspace_name)
    }

    /// Path of the persisted record of one workspace.
    pub fn workspace_config_file(&self, workspace_name: &str) -> PathBuf {
        self.workspace_directory(workspace_name)
            .join(constants::path::WORKSPACE_CONFIG_FILE)
    }

    /// Install directory of one runner inside its workspace.
    pub fn runner_directory(&self, workspace_name: &str, runner_id: &str) -> PathBuf {
        self.workspace_directory(workspace_name).join(format!(
            "{}{}",
            constants::path::RUNNER_DIRECTORY_PREFIX,
            runner_id
        ))
    }

    /// Whether `path` lives inside the base directory.
    pub fn is_managed_path(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
    }

    // -----------------------------------------------------------------------
    // Misc
    // -----------------------------------------------------------------------

    /// Base URL of the GitHub REST API, without a trailing slash.
    pub fn github_api_url(&self) -> &str {
        &self.github_api_url
    }

    /// User agent sent with every HTTP request.
    pub fn user_agent(&self) -> String {
        format!("{}/{}", MacrunnerPackage::NAME, MacrunnerPackage::VERSION)
    }

    /// Get a trace source for the given component name.
    pub fn get_trace(&self, name: &str) -> Tracing {
        self.trace_manager.get(name)
    }
}
