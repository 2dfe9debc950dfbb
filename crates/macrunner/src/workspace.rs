// Workspace: a named group of runners serving one GitHub address with one
// token, persisted after every change.

use crate::configuration::registration_pipeline::{RegistrationPipeline, RunnerRequest};
use crate::github::{Credential, GithubAddress};

use anyhow::{Context, Result};
use macrunner_common::{RunnerRecord, WorkspaceSettings, WorkspaceStore};
use std::path::PathBuf;

/// In-memory state of a workspace.
#[derive(Debug)]
pub struct Workspace {
    id: String,
    name: String,
    address: GithubAddress,
    credential: Credential,
    runners: Vec<RunnerRecord>,
}

impl Workspace {
    /// A brand new workspace with a fresh id and no runners.
    pub fn new(name: impl Into<String>, address: GithubAddress, credential: Credential) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            address,
            credential,
            runners: Vec::new(),
        }
    }

    /// Open `name`: when a record already exists its id and runners are kept
    /// and the address and token are replaced; otherwise a new workspace.
    pub fn open(
        store: &WorkspaceStore,
        name: &str,
        address: GithubAddress,
        credential: Credential,
    ) -> Result<Self> {
        let workspace = match store.load(name)? {
            Some(existing) => Self {
                id: existing.id,
                name: existing.name,
                address,
                credential,
                runners: existing.runners,
            },
            None => Self::new(name, address, credential),
        };
        Ok(workspace)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &GithubAddress {
        &self.address
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn runners(&self) -> &[RunnerRecord] {
        &self.runners
    }

    /// The persisted form of this workspace.
    pub fn to_settings(&self) -> WorkspaceSettings {
        WorkspaceSettings {
            id: self.id.clone(),
            name: self.name.clone(),
            address: self.address.to_canonical_path(),
            token: self.credential.token().to_string(),
            runners: self.runners.clone(),
        }
    }

    /// Overwrite the on-disk record with the current state.
    pub fn save(&self, store: &WorkspaceStore) -> Result<PathBuf> {
        store
            .save(&self.to_settings())
            .with_context(|| format!("Failed to save workspace '{}'", self.name))
    }

    /// Provision one more runner, append it and save.
    ///
    /// When the pipeline fails the record keeps its previous content.
    pub async fn create_runner(
        &mut self,
        pipeline: &RegistrationPipeline,
        store: &WorkspaceStore,
    ) -> Result<RunnerRecord> {
        let runner_id = self.to_settings().next_runner_id();
        let record = pipeline
            .run(&RunnerRequest {
                workspace_name: &self.name,
                runner_id: &runner_id,
                credential: &self.credential,
                address: &self.address,
            })
            .await?;

        self.runners.push(record.clone());
        self.save(store)?;
        Ok(record)
    }
}
