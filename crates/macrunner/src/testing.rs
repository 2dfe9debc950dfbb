// Test doubles for the GitHub API, the runner host and the console.

use crate::configuration::prompt_manager::UserInput;
use crate::configuration::runner_host::{RunnerHost, RunnerRegistration};
use crate::github::{Credential, GithubAddress, GithubApi, RunnerPlatform};

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

pub const DOWNLOAD_URL: &str =
    "https://github.com/actions/runner/releases/download/v2.164.0/actions-runner-osx-x64-2.164.0.tar.gz";

pub const REGISTRATION_TOKEN: &str = "AABBCCDDEEFF-registration";

// ---------------------------------------------------------------------------
// FakeGithubApi
// ---------------------------------------------------------------------------

/// In-memory GitHub. Unknown tokens have no scopes and unknown addresses do
/// not exist.
pub struct FakeGithubApi {
    scopes: HashMap<String, Vec<String>>,
    existing: HashSet<String>,
    accessible: HashSet<String>,
    download_url: String,
    fail_scopes: bool,
    unreachable: bool,
    fail_registration: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeGithubApi {
    pub fn new() -> Self {
        Self {
            scopes: HashMap::new(),
            existing: HashSet::new(),
            accessible: HashSet::new(),
            download_url: DOWNLOAD_URL.to_string(),
            fail_scopes: false,
            unreachable: false,
            fail_registration: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_token(mut self, token: &str, scopes: &[&str]) -> Self {
        self.scopes
            .insert(token.to_string(), scopes.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Register an existing address; `accessible` controls the runners probe.
    pub fn with_address(mut self, canonical: &str, accessible: bool) -> Self {
        self.existing.insert(canonical.to_string());
        if accessible {
            self.accessible.insert(canonical.to_string());
        }
        self
    }

    pub fn with_download_url(mut self, url: &str) -> Self {
        self.download_url = url.to_string();
        self
    }

    /// Scope lookups fail with a transport error.
    pub fn failing_scopes(mut self) -> Self {
        self.fail_scopes = true;
        self
    }

    /// Address probes fail with a transport error.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn failing_registration(mut self) -> Self {
        self.fail_registration = true;
        self
    }

    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }
}

#[async_trait]
impl GithubApi for FakeGithubApi {
    async fn token_scopes(&self, token: &str) -> Result<Vec<String>> {
        self.record("token_scopes");
        if self.fail_scopes {
            anyhow::bail!("connection refused");
        }
        Ok(self.scopes.get(token).cloned().unwrap_or_default())
    }

    async fn address_exists(&self, _credential: &Credential, address: &GithubAddress) -> Result<bool> {
        self.record("address_exists");
        if self.unreachable {
            anyhow::bail!("connection refused");
        }
        Ok(self.existing.contains(&address.to_canonical_path()))
    }

    async fn can_manage_runners(
        &self,
        _credential: &Credential,
        address: &GithubAddress,
    ) -> Result<bool> {
        self.record("can_manage_runners");
        if self.unreachable {
            anyhow::bail!("connection refused");
        }
        Ok(self.accessible.contains(&address.to_canonical_path()))
    }

    async fn create_registration_token(
        &self,
        _credential: &Credential,
        _address: &GithubAddress,
    ) -> Result<String> {
        self.record("create_registration_token");
        if self.fail_registration {
            anyhow::bail!("403 Forbidden");
        }
        Ok(REGISTRATION_TOKEN.to_string())
    }

    async fn runner_download_url(
        &self,
        _credential: &Credential,
        _address: &GithubAddress,
        _platform: &RunnerPlatform,
    ) -> Result<String> {
        self.record("runner_download_url");
        Ok(self.download_url.clone())
    }
}

// ---------------------------------------------------------------------------
// FakeRunnerHost
// ---------------------------------------------------------------------------

/// Records host operations and writes marker files instead of running the
/// real runner scripts.
pub struct FakeRunnerHost {
    fail_on: Option<&'static str>,
    calls: Mutex<Vec<String>>,
    registrations: Mutex<Vec<(PathBuf, RunnerRegistration)>>,
}

impl FakeRunnerHost {
    pub fn new() -> Self {
        Self {
            fail_on: None,
            calls: Mutex::new(Vec::new()),
            registrations: Mutex::new(Vec::new()),
        }
    }

    /// Fail the named operation (`download`, `extract`, `configure`,
    /// `install_service`).
    pub fn failing_on(operation: &'static str) -> Self {
        Self {
            fail_on: Some(operation),
            ..Self::new()
        }
    }

    fn record(&self, call: &str) -> Result<()> {
        self.calls.lock().push(call.to_string());
        if self.fail_on == Some(call) {
            anyhow::bail!("{} failed", call);
        }
        Ok(())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    pub fn registrations(&self) -> Vec<(PathBuf, RunnerRegistration)> {
        self.registrations.lock().clone()
    }
}

#[async_trait]
impl RunnerHost for FakeRunnerHost {
    async fn download(&self, _url: &str, destination: &Path) -> Result<()> {
        self.record("download")?;
        std::fs::write(destination, b"runner archive")?;
        Ok(())
    }

    async fn extract(&self, _archive: &Path, directory: &Path) -> Result<()> {
        self.record("extract")?;
        std::fs::write(directory.join("config.sh"), b"#!/bin/sh\n")?;
        Ok(())
    }

    async fn configure(&self, directory: &Path, registration: &RunnerRegistration) -> Result<()> {
        self.record("configure")?;
        self.registrations
            .lock()
            .push((directory.to_path_buf(), registration.clone()));
        Ok(())
    }

    async fn install_service(&self, _directory: &Path) -> Result<()> {
        self.record("install_service")
    }
}

// ---------------------------------------------------------------------------
// ScriptedInput
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Question(String),
    Clear,
    Error(String),
    Message(String),
}

/// Answers prompts from a fixed script and records everything shown.
/// Running out of answers is an error, which ends any retry loop.
pub struct ScriptedInput {
    answers: Mutex<VecDeque<String>>,
    events: Mutex<Vec<InputEvent>>,
}

impl ScriptedInput {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            events: Mutex::new(Vec::new()),
        }
    }

    fn next_answer(&self, question: &str) -> Result<String> {
        self.events
            .lock()
            .push(InputEvent::Question(question.to_string()));
        self.answers
            .lock()
            .pop_front()
            .map(|a| a.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("no scripted answer for '{}'", question))
    }

    pub fn events(&self) -> Vec<InputEvent> {
        self.events.lock().clone()
    }

    pub fn questions(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                InputEvent::Question(q) => Some(q),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                InputEvent::Error(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                InputEvent::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn clear_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| **e == InputEvent::Clear)
            .count()
    }
}

impl UserInput for ScriptedInput {
    fn ask(&self, _help: &str, question: &str) -> Result<String> {
        self.next_answer(question)
    }

    fn ask_secret(&self, _help: &str, question: &str) -> Result<String> {
        self.next_answer(question)
    }

    fn clear(&self) {
        self.events.lock().push(InputEvent::Clear);
    }

    fn show_error(&self, message: &str) {
        self.events.lock().push(InputEvent::Error(message.to_string()));
    }

    fn show_message(&self, message: &str) {
        self.events
            .lock()
            .push(InputEvent::Message(message.to_string()));
    }
}
