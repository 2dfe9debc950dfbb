// GithubClient: the GitHub REST calls macrunner needs, behind the GithubApi
// trait so the wizard and the pipeline can run against a fake.

use crate::github::{Credential, GithubAddress};

use anyhow::{Context, Result};
use async_trait::async_trait;
use macrunner_common::constants::{self, Architecture, OsPlatform};
use macrunner_common::{HostContext, HttpClientFactory, SecretMasker, Tracing};
use macrunner_sdk::TraceWriter;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// The OS and architecture a runner is provisioned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerPlatform {
    pub os: OsPlatform,
    pub architecture: Architecture,
}

impl RunnerPlatform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        Self {
            os: constants::CURRENT_PLATFORM,
            architecture: constants::CURRENT_ARCHITECTURE,
        }
    }
}

impl fmt::Display for RunnerPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.os.download_os(),
            self.architecture.download_architecture()
        )
    }
}

/// One entry of the `actions/runners/downloads` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerDownload {
    pub os: String,
    pub architecture: String,
    pub download_url: String,
    #[serde(default)]
    pub filename: String,
}

/// Pick the download for `platform`: the entry matching both OS and
/// architecture, else the first entry for the OS.
pub fn select_download<'a>(
    downloads: &'a [RunnerDownload],
    platform: &RunnerPlatform,
) -> Option<&'a RunnerDownload> {
    let os = platform.os.download_os();
    let architecture = platform.architecture.download_architecture();

    downloads
        .iter()
        .find(|d| d.os == os && d.architecture == architecture)
        .or_else(|| downloads.iter().find(|d| d.os == os))
}

/// Split the `x-oauth-scopes` header value into scope names.
pub fn parse_scopes(header: &str) -> Vec<String> {
    header
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// GithubApi
// ---------------------------------------------------------------------------

/// The GitHub operations the provisioning flow depends on.
#[async_trait]
pub trait GithubApi: Send + Sync {
    /// Scopes granted to `token`. An unauthorized token has none.
    async fn token_scopes(&self, token: &str) -> Result<Vec<String>>;

    /// Whether the organization or repository exists and is visible.
    async fn address_exists(&self, credential: &Credential, address: &GithubAddress)
        -> Result<bool>;

    /// Whether the credential may list the target's self-hosted runners.
    async fn can_manage_runners(
        &self,
        credential: &Credential,
        address: &GithubAddress,
    ) -> Result<bool>;

    /// Obtain a short-lived runner registration token.
    async fn create_registration_token(
        &self,
        credential: &Credential,
        address: &GithubAddress,
    ) -> Result<String>;

    /// Download URL of the runner package for `platform`.
    async fn runner_download_url(
        &self,
        credential: &Credential,
        address: &GithubAddress,
        platform: &RunnerPlatform,
    ) -> Result<String>;
}

// ---------------------------------------------------------------------------
// GithubClient
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RegistrationTokenResponse {
    token: String,
}

/// `GithubApi` over the GitHub REST API.
pub struct GithubClient {
    client: Client,
    api_url: String,
    secret_masker: SecretMasker,
    trace: Tracing,
}

impl GithubClient {
    pub fn new(context: &HostContext) -> Result<Self> {
        Ok(Self {
            client: HttpClientFactory::create_client(context)?,
            api_url: context.github_api_url().to_string(),
            secret_masker: context.secret_masker.clone(),
            trace: context.get_trace("GithubClient"),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        let url = self.url(path);
        self.trace.verbose(&format!("{} {}", method, url));
        self.client
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, format!("token {}", token))
    }

    /// GET `path` and report whether GitHub answered with a success status.
    async fn probe(&self, path: &str, credential: &Credential) -> Result<bool> {
        let response = self
            .request(Method::GET, path, credential.token())
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.url(path)))?;

        let status = response.status();
        self.trace
            .verbose(&format!("GET {} returned {}", path, status.as_u16()));
        Ok(status.is_success())
    }
}

#[async_trait]
impl GithubApi for GithubClient {
    async fn token_scopes(&self, token: &str) -> Result<Vec<String>> {
        let response = self
            .request(Method::HEAD, "user", token)
            .send()
            .await
            .context("Failed to query token scopes")?;

        if !response.status().is_success() {
            self.trace.warning(&format!(
                "Token scope query returned {}",
                response.status().as_u16()
            ));
            return Ok(Vec::new());
        }

        let scopes = response
            .headers()
            .get(constants::github::OAUTH_SCOPES_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(parse_scopes)
            .unwrap_or_default();

        self.trace
            .info(&format!("Token scopes: [{}]", scopes.join(", ")));
        Ok(scopes)
    }

    async fn address_exists(
        &self,
        credential: &Credential,
        address: &GithubAddress,
    ) -> Result<bool> {
        self.probe(&address.api_prefix(), credential).await
    }

    async fn can_manage_runners(
        &self,
        credential: &Credential,
        address: &GithubAddress,
    ) -> Result<bool> {
        let path = format!("{}/actions/runners", address.api_prefix());
        self.probe(&path, credential).await
    }

    async fn create_registration_token(
        &self,
        credential: &Credential,
        address: &GithubAddress,
    ) -> Result<String> {
        let path = format!("{}/actions/runners/registration-token", address.api_prefix());
        let response = self
            .request(Method::POST, &path, credential.token())
            .send()
            .await
            .context("Failed to request a runner registration token")?
            .error_for_status()
            .with_context(|| {
                format!("GitHub refused a registration token for {}", address.describe())
            })?;

        let body: RegistrationTokenResponse = response
            .json()
            .await
            .context("Failed to parse the registration token response")?;

        self.secret_masker.add_value(&body.token);
        self.trace
            .info(&format!("Obtained a registration token for {}", address));
        Ok(body.token)
    }

    async fn runner_download_url(
        &self,
        credential: &Credential,
        address: &GithubAddress,
        platform: &RunnerPlatform,
    ) -> Result<String> {
        let path = format!("{}/actions/runners/downloads", address.api_prefix());
        let downloads: Vec<RunnerDownload> = self
            .request(Method::GET, &path, credential.token())
            .send()
            .await
            .context("Failed to list runner downloads")?
            .error_for_status()
            .with_context(|| format!("GitHub refused the runner downloads of {}", address))?
            .json()
            .await
            .context("Failed to parse the runner downloads listing")?;

        let download = select_download(&downloads, platform).with_context(|| {
            format!("No runner download is published for platform {}", platform)
        })?;

        self.trace.info(&format!(
            "Selected runner package {} ({}/{})",
            download.download_url, download.os, download.architecture
        ));
        Ok(download.download_url.clone())
    }
}
