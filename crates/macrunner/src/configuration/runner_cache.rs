// RunnerCache: keeps one copy of each runner release on disk
// (`<base>/runners/<version>/runner.tar.gz`).

use crate::configuration::runner_host::RunnerHost;
use crate::github::{Credential, GithubAddress, GithubApi, RunnerPlatform};

use anyhow::{Context, Result};
use macrunner_common::constants;
use macrunner_common::{HostContext, Tracing};
use macrunner_sdk::{IOUtil, TraceWriter};
use std::path::PathBuf;
use std::sync::Arc;

/// The release version of a runner download URL: its second-to-last path
/// segment (`.../download/v2.164.0/actions-runner-osx-x64-2.164.0.tar.gz`).
pub fn version_from_download_url(download_url: &str) -> Result<String> {
    let url = url::Url::parse(download_url)
        .with_context(|| format!("Invalid runner download URL '{}'", download_url))?;

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();

    match segments.as_slice() {
        [.., version, file] if !version.is_empty() && !file.is_empty() => {
            Ok(version.to_string())
        }
        _ => anyhow::bail!(
            "Cannot determine the runner version from '{}'",
            download_url
        ),
    }
}

/// Makes sure the runner archive for a platform is present locally.
///
/// The presence of the archive file is the only cache-hit signal; its
/// content is not verified.
pub struct RunnerCache {
    context: Arc<HostContext>,
    api: Arc<dyn GithubApi>,
    host: Arc<dyn RunnerHost>,
    platform: RunnerPlatform,
    trace: Tracing,
}

impl RunnerCache {
    pub fn new(
        context: Arc<HostContext>,
        api: Arc<dyn GithubApi>,
        host: Arc<dyn RunnerHost>,
        platform: RunnerPlatform,
    ) -> Self {
        let trace = context.get_trace("RunnerCache");
        Self {
            context,
            api,
            host,
            platform,
            trace,
        }
    }

    /// Archive path for a release version.
    pub fn archive_path(&self, version: &str) -> PathBuf {
        self.context
            .runner_cache_directory(version)
            .join(constants::path::RUNNER_ARCHIVE_FILE)
    }

    /// Return the local archive of the current runner release, downloading
    /// it when this version has not been fetched before.
    pub async fn ensure_binary(
        &self,
        credential: &Credential,
        address: &GithubAddress,
    ) -> Result<PathBuf> {
        let download_url = self
            .api
            .runner_download_url(credential, address, &self.platform)
            .await
            .context("Failed to resolve the runner download")?;
        let version = version_from_download_url(&download_url)?;

        let archive = self.archive_path(&version);
        if let Some(parent) = archive.parent() {
            IOUtil::ensure_directory_exists(parent)?;
        }

        if archive.is_file() {
            self.trace.info(&format!(
                "Runner {} for {} is cached at {:?}",
                version, self.platform, archive
            ));
            return Ok(archive);
        }

        self.trace.info(&format!(
            "Runner {} for {} is not cached; downloading",
            version, self.platform
        ));
        self.host
            .download(&download_url, &archive)
            .await
            .with_context(|| format!("Failed to download runner {}", version))?;

        Ok(archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeGithubApi, FakeRunnerHost, DOWNLOAD_URL};

    #[test]
    fn version_is_the_second_to_last_segment() {
        assert_eq!(version_from_download_url(DOWNLOAD_URL).unwrap(), "v2.164.0");
        assert_eq!(
            version_from_download_url("https://example.com/a/b/c/v3/runner.tgz").unwrap(),
            "v3"
        );
    }

    #[test]
    fn version_requires_two_segments() {
        assert!(version_from_download_url("https://example.com/runner.tar.gz").is_err());
        assert!(version_from_download_url("https://example.com/v1/").is_err());
        assert!(version_from_download_url("not a url").is_err());
    }

    fn cache(root: &std::path::Path, host: &Arc<FakeRunnerHost>) -> RunnerCache {
        RunnerCache::new(
            HostContext::with_root(root),
            Arc::new(FakeGithubApi::new()),
            host.clone(),
            RunnerPlatform::current(),
        )
    }

    #[tokio::test]
    async fn downloads_each_version_once() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(FakeRunnerHost::new());
        let cache = cache(dir.path(), &host);
        let credential = Credential::new("ghp_token");
        let address = GithubAddress::repository("kiennt", "macrunner");

        let first = cache.ensure_binary(&credential, &address).await.unwrap();
        let second = cache.ensure_binary(&credential, &address).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, dir.path().join("runners/v2.164.0/runner.tar.gz"));
        assert!(first.is_file());
        assert_eq!(host.call_count("download"), 1);
    }

    #[tokio::test]
    async fn failed_download_leaves_no_cache_entry() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(FakeRunnerHost::failing_on("download"));
        let cache = cache(dir.path(), &host);
        let credential = Credential::new("ghp_token");
        let address = GithubAddress::organization("tikivn");

        assert!(cache.ensure_binary(&credential, &address).await.is_err());
        assert!(!cache.archive_path("v2.164.0").exists());
        assert!(dir.path().join("runners/v2.164.0").is_dir());
    }
}
