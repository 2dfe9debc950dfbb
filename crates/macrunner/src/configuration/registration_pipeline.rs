// RegistrationPipeline: turns a cached runner archive into a registered,
// running background service.
//
//   Idle -> BinaryReady -> Unpacked -> RegisteredWithProvider
//        -> ServiceInstalled -> Complete
//
// Steps run strictly in order. The first failure aborts the run; nothing is
// retried or rolled back.

use crate::configuration::runner_cache::RunnerCache;
use crate::configuration::runner_host::{RunnerHost, RunnerRegistration};
use crate::github::{Credential, GithubAddress, GithubApi, RunnerPlatform};

use macrunner_common::constants;
use macrunner_common::{HostContext, RunnerRecord, Tracing};
use macrunner_sdk::{IOUtil, MacrunnerPackage, TraceWriter};
use std::fmt;
use std::sync::Arc;

/// Progress of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    Idle,
    BinaryReady,
    Unpacked,
    RegisteredWithProvider,
    ServiceInstalled,
    Complete,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "Idle",
            PipelineState::BinaryReady => "BinaryReady",
            PipelineState::Unpacked => "Unpacked",
            PipelineState::RegisteredWithProvider => "RegisteredWithProvider",
            PipelineState::ServiceInstalled => "ServiceInstalled",
            PipelineState::Complete => "Complete",
        };
        f.write_str(name)
    }
}

/// A pipeline run that stopped early. `state` is the last state reached.
#[derive(Debug, thiserror::Error)]
#[error("Runner provisioning stopped in state {state}")]
pub struct PipelineError {
    pub state: PipelineState,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl PipelineError {
    fn new(state: PipelineState, source: anyhow::Error) -> Self {
        Self {
            state,
            source: source.into(),
        }
    }
}

/// What to provision.
pub struct RunnerRequest<'a> {
    pub workspace_name: &'a str,
    pub runner_id: &'a str,
    pub credential: &'a Credential,
    pub address: &'a GithubAddress,
}

impl RunnerRequest<'_> {
    /// `macrunner.<workspace>.runner<id>`
    pub fn runner_name(&self) -> String {
        format!(
            "{}.{}.{}{}",
            MacrunnerPackage::NAME,
            self.workspace_name,
            constants::path::RUNNER_DIRECTORY_PREFIX,
            self.runner_id
        )
    }

    /// Name of the background service `svc.sh` installs for the runner.
    pub fn service_name(&self) -> String {
        format!(
            "actions.runner.{}.{}",
            self.address.to_canonical_path().replace('/', "-"),
            self.runner_name()
        )
    }
}

/// Labels attached to every runner of a workspace.
pub fn runner_labels(platform: &RunnerPlatform, workspace_name: &str) -> Vec<String> {
    vec![
        "self-hosted".to_string(),
        platform.os.to_string(),
        platform.architecture.to_string(),
        MacrunnerPackage::NAME.to_string(),
        workspace_name.to_string(),
    ]
}

/// Provisions one runner per `run`.
pub struct RegistrationPipeline {
    context: Arc<HostContext>,
    api: Arc<dyn GithubApi>,
    host: Arc<dyn RunnerHost>,
    cache: RunnerCache,
    platform: RunnerPlatform,
    trace: Tracing,
}

impl RegistrationPipeline {
    pub fn new(
        context: Arc<HostContext>,
        api: Arc<dyn GithubApi>,
        host: Arc<dyn RunnerHost>,
        platform: RunnerPlatform,
    ) -> Self {
        let cache = RunnerCache::new(context.clone(), api.clone(), host.clone(), platform);
        let trace = context.get_trace("RegistrationPipeline");
        Self {
            context,
            api,
            host,
            cache,
            platform,
            trace,
        }
    }

    fn enter(&self, state: PipelineState, request: &RunnerRequest<'_>) -> PipelineState {
        self.trace
            .info(&format!("[{}] {}", request.runner_name(), state));
        state
    }

    /// Download (if needed), unpack, register and start one runner.
    pub async fn run(&self, request: &RunnerRequest<'_>) -> Result<RunnerRecord, PipelineError> {
        let mut state = self.enter(PipelineState::Idle, request);

        let archive = self
            .cache
            .ensure_binary(request.credential, request.address)
            .await
            .map_err(|e| PipelineError::new(state, e))?;
        state = self.enter(PipelineState::BinaryReady, request);

        let directory = self
            .context
            .runner_directory(request.workspace_name, request.runner_id);
        IOUtil::recreate_directory(&directory).map_err(|e| PipelineError::new(state, e))?;
        self.host
            .extract(&archive, &directory)
            .await
            .map_err(|e| PipelineError::new(state, e))?;
        state = self.enter(PipelineState::Unpacked, request);

        let token = self
            .api
            .create_registration_token(request.credential, request.address)
            .await
            .map_err(|e| PipelineError::new(state, e))?;
        self.context.secret_masker.add_value(&token);

        let registration = RunnerRegistration {
            url: request.address.html_url(constants::github::HTML_URL),
            token,
            name: request.runner_name(),
            labels: runner_labels(&self.platform, request.workspace_name),
        };
        self.host
            .configure(&directory, &registration)
            .await
            .map_err(|e| PipelineError::new(state, e))?;
        state = self.enter(PipelineState::RegisteredWithProvider, request);

        self.host
            .install_service(&directory)
            .await
            .map_err(|e| PipelineError::new(state, e))?;
        self.enter(PipelineState::ServiceInstalled, request);

        let record = RunnerRecord {
            id: request.runner_id.to_string(),
            path: directory,
            service_name: request.service_name(),
        };
        self.enter(PipelineState::Complete, request);
        Ok(record)
    }
}
