// PermissionValidator: turns raw (or missing) token, address and workspace
// name inputs into verified values, re-prompting until they are usable.

use crate::configuration::checklist::{first_failure, Checklist};
use crate::configuration::prompt_manager::UserInput;
use crate::github::{Credential, GithubAddress, GithubApi};

use anyhow::Result;
use macrunner_common::constants;
use macrunner_common::{ConsoleColor, HostContext, SecretMasker, Tracing};
use macrunner_sdk::TraceWriter;
use std::sync::Arc;

/// Longest accepted workspace name.
pub const MAX_WORKSPACE_NAME_LENGTH: usize = 64;

const TOKEN_QUESTION: &str = "What is your github token?";
const REUSE_TOKEN_QUESTION: &str = "Do you want to use the old token [y], or create a new one [n]?";
const ADDRESS_QUESTION: &str = "What is your github repo/org?";
const WORKSPACE_QUESTION: &str = "What is your workspace name?";

const SCOPE_ERROR: &str = "\nPlease enter a valid github token with repo scope.\nMacrunner needs repo scope to manage the self hosted runner.\n";

fn token_help() -> String {
    format!(
        "\nIn order to manage your runner, Macrunner needs to use a github token.\n\
         The github token needs to have these scopes:\n\n\
         + {}:\n  this scope allows Macrunner to manage self hosted runners for a repository\n\n\
         + {}: (optional)\n  this scope allows Macrunner to manage self hosted runners for an organization\n\n\
         To create a new github token, please use the following link\n{}\n",
        ConsoleColor::Green.paint(constants::github::REQUIRED_SCOPE),
        ConsoleColor::Green.paint("admin:org"),
        ConsoleColor::Cyan.paint(constants::github::TOKEN_SETTINGS_URL),
    )
}

fn detected_token_help() -> String {
    format!(
        "{}{}",
        token_help(),
        ConsoleColor::Green.paint("\nWe detect a github token already defined in your system.\n")
    )
}

fn address_help() -> String {
    format!(
        "\nPlease enter an organization or a repo in which you want to manage self hosted runners.\n\
         The repo could be in following format:\n\n\
         + {}, e.g: kakaolabs\n  use this if you want set up self hosted runners for all repositories of an organization\n\n\
         + {}, e.g: kiennt/macrunner\n  use this if you want to set up self hosted runners for a specified repository.\n",
        ConsoleColor::Green.paint("<org_name>"),
        ConsoleColor::Green.paint("<owner>/<repo>"),
    )
}

fn workspace_help() -> String {
    format!(
        "\nPlease enter a name for workspace.\n\
         By naming the workspace, you could scale up/down the workspace later by using the following command\n\n  {}\n\n\
         To list all your workspaces, you could use the follow command\n\n  {}\n",
        ConsoleColor::Green.paint("macrunner scale --workspace <name> --count <count>"),
        ConsoleColor::Green.paint("macrunner list"),
    )
}

/// Check that `name` can be embedded in runner names and labels.
pub fn validate_workspace_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("The workspace name must not be empty.".to_string());
    }
    if name.len() > MAX_WORKSPACE_NAME_LENGTH {
        return Err(format!(
            "The workspace name must be at most {} characters long.",
            MAX_WORKSPACE_NAME_LENGTH
        ));
    }
    if name == "." || name == ".." {
        return Err(format!("'{}' is not a valid workspace name.", name));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(format!(
            "The workspace name may only contain letters, digits, '-', '_' and '.' (found '{}').",
            c
        ));
    }
    Ok(())
}

/// Resolves and verifies the inputs of the `create` wizard.
///
/// Every retry is an explicit loop; a wrong answer never ends the wizard.
pub struct PermissionValidator {
    api: Arc<dyn GithubApi>,
    input: Arc<dyn UserInput>,
    /// Token found in the environment, offered once on the first prompt.
    environment_token: Option<String>,
    secret_masker: SecretMasker,
    trace: Tracing,
}

impl PermissionValidator {
    pub fn new(context: &HostContext, api: Arc<dyn GithubApi>, input: Arc<dyn UserInput>) -> Self {
        let environment_token = std::env::var(constants::variables::GITHUB_TOKEN)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Self {
            api,
            input,
            environment_token,
            secret_masker: context.secret_masker.clone(),
            trace: context.get_trace("PermissionValidator"),
        }
    }

    /// Replace the token picked up from the environment.
    pub fn with_environment_token(mut self, token: Option<String>) -> Self {
        self.environment_token = token;
        self
    }

    // -----------------------------------------------------------------------
    // Token
    // -----------------------------------------------------------------------

    /// Produce a credential carrying the `repo` scope.
    ///
    /// `supplied` is tried first. Environment detection only happens on the
    /// first prompt; after a rejected token the user is asked again without it.
    pub async fn resolve_credential(&self, supplied: Option<String>) -> Result<Credential> {
        let mut supplied = supplied.filter(|t| !t.trim().is_empty());
        let mut detect = true;

        loop {
            let token = match supplied.take() {
                Some(token) => token.trim().to_string(),
                None => self.ask_token(detect).await?,
            };
            detect = false;

            if !token.is_empty() {
                self.secret_masker.add_value(&token);
                let credential = Credential::new(token);
                if self.has_required_scope(&credential).await {
                    self.trace.info("Token accepted");
                    return Ok(credential);
                }
            }

            self.trace.info("Token rejected: missing repo scope");
            self.input.clear();
            self.input.show_error(SCOPE_ERROR);
        }
    }

    async fn ask_token(&self, detect: bool) -> Result<String> {
        if detect {
            if let Some(token) = self.detected_token().await {
                let answer = self.input.ask(&detected_token_help(), REUSE_TOKEN_QUESTION)?;
                if answer.eq_ignore_ascii_case("y") {
                    self.trace.info("Reusing the token from the environment");
                    return Ok(token);
                }
                self.input.clear();
            }
        }

        self.input.ask_secret(&token_help(), TOKEN_QUESTION)
    }

    /// The environment token, if it carries the required scope.
    async fn detected_token(&self) -> Option<String> {
        let token = self.environment_token.clone()?;
        self.secret_masker.add_value(&token);
        let credential = Credential::new(token.clone());
        self.has_required_scope(&credential).await.then_some(token)
    }

    async fn has_required_scope(&self, credential: &Credential) -> bool {
        match credential
            .has_scope(self.api.as_ref(), constants::github::REQUIRED_SCOPE)
            .await
        {
            Ok(has_scope) => has_scope,
            Err(e) => {
                self.trace
                    .warning(&format!("Could not verify token scopes: {:#}", e));
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Address
    // -----------------------------------------------------------------------

    /// Produce a parsed address that passes the checklist for `credential`.
    /// Without a credential a successful parse is enough.
    pub async fn resolve_address(
        &self,
        supplied: Option<String>,
        credential: Option<&Credential>,
    ) -> Result<GithubAddress> {
        let mut supplied = supplied;
        let checklist = Checklist::for_address();

        loop {
            let raw = match supplied.take() {
                Some(raw) => raw,
                None => self.input.ask(&address_help(), ADDRESS_QUESTION)?,
            };

            let address = match GithubAddress::parse(&raw) {
                Ok(address) => address,
                Err(e) => {
                    self.trace.info(&format!("Address rejected: {}", e));
                    self.input.clear();
                    self.input.show_error(&e.to_string());
                    continue;
                }
            };

            let Some(credential) = credential else {
                return Ok(address);
            };

            let results = checklist
                .run(self.api.as_ref(), credential, &address, &self.trace)
                .await;
            match first_failure(&results) {
                None => return Ok(address),
                Some(failed) => {
                    self.input.clear();
                    self.input
                        .show_error(failed.detail.as_deref().unwrap_or_default());
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Workspace name
    // -----------------------------------------------------------------------

    /// Produce a valid workspace name from `supplied` or the prompt.
    pub fn resolve_workspace_name(&self, supplied: Option<String>) -> Result<String> {
        let mut supplied = supplied;

        loop {
            let name = match supplied.take() {
                Some(name) => name.trim().to_string(),
                None => self.input.ask(&workspace_help(), WORKSPACE_QUESTION)?,
            };

            match validate_workspace_name(&name) {
                Ok(()) => return Ok(name),
                Err(message) => {
                    self.trace
                        .info(&format!("Workspace name '{}' rejected", name));
                    self.input.show_error(&message);
                }
            }
        }
    }
}
