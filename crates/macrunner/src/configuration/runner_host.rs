// RunnerHost: the local side effects of provisioning a runner (download,
// unpack, `config.sh`, `svc.sh`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use macrunner_common::constants;
use macrunner_common::{HostContext, HttpClientFactory, ProcessInvokerService, Tracing};
use macrunner_sdk::{IOUtil, TraceWriter};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Arguments for binding an unpacked runner to GitHub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerRegistration {
    /// `https://github.com/<owner>[/<repo>]`
    pub url: String,
    pub token: String,
    pub name: String,
    pub labels: Vec<String>,
}

impl RunnerRegistration {
    /// Arguments passed to `config.sh`.
    pub fn config_arguments(&self) -> Vec<String> {
        vec![
            "--unattended".to_string(),
            "--url".to_string(),
            self.url.clone(),
            "--token".to_string(),
            self.token.clone(),
            "--name".to_string(),
            self.name.clone(),
            "--labels".to_string(),
            self.labels.join(","),
        ]
    }

    /// `config_arguments` with the token replaced, for logs and errors.
    pub fn display_arguments(&self) -> String {
        format!(
            "--unattended --url {} --token *** --name {} --labels {}",
            self.url,
            self.name,
            self.labels.join(",")
        )
    }
}

/// Host operations the registration pipeline drives.
#[async_trait]
pub trait RunnerHost: Send + Sync {
    /// Fetch `url` into `destination`. The file only appears once the whole
    /// body has been written.
    async fn download(&self, url: &str, destination: &Path) -> Result<()>;

    /// Unpack a gzip compressed tarball into `directory`.
    async fn extract(&self, archive: &Path, directory: &Path) -> Result<()>;

    /// Run `config.sh` of the runner unpacked in `directory`.
    async fn configure(&self, directory: &Path, registration: &RunnerRegistration) -> Result<()>;

    /// Install and start the runner's background service with `svc.sh`.
    async fn install_service(&self, directory: &Path) -> Result<()>;
}

// ---------------------------------------------------------------------------
// LocalRunnerHost
// ---------------------------------------------------------------------------

/// `RunnerHost` on the local machine.
pub struct LocalRunnerHost {
    client: reqwest::Client,
    invoker: ProcessInvokerService,
    trace: Tracing,
}

impl LocalRunnerHost {
    /// With `verbose` on, output of the runner scripts is echoed to the console.
    pub fn new(context: &HostContext, verbose: bool) -> Result<Self> {
        Ok(Self {
            client: HttpClientFactory::create_client(context)?,
            invoker: ProcessInvokerService::new(context, verbose),
            trace: context.get_trace("LocalRunnerHost"),
        })
    }

    fn script(directory: &Path, name: &str) -> Result<PathBuf> {
        let path = directory.join(name);
        anyhow::ensure!(
            path.is_file(),
            "'{}' not found in {:?}; the runner archive may be damaged",
            name,
            directory
        );
        Ok(path)
    }

    async fn run_script(
        &self,
        directory: &Path,
        name: &str,
        arguments: &[String],
        display_arguments: Option<&str>,
    ) -> Result<()> {
        let script = Self::script(directory, name)?;
        let script = script.to_string_lossy();
        self.invoker
            .execute(directory, &script, arguments, display_arguments)
            .await?;
        Ok(())
    }
}

/// Path used while a download is in flight.
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(constants::path::PARTIAL_DOWNLOAD_SUFFIX);
    PathBuf::from(name)
}

#[async_trait]
impl RunnerHost for LocalRunnerHost {
    async fn download(&self, url: &str, destination: &Path) -> Result<()> {
        self.trace
            .info(&format!("Downloading {} to {:?}", url, destination));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send download request")?
            .error_for_status()
            .context("Runner download was refused")?;

        let partial = partial_path(destination);
        let mut file = tokio::fs::File::create(&partial)
            .await
            .with_context(|| format!("Failed to create {:?}", partial))?;

        let mut written: u64 = 0;
        let mut body = std::pin::pin!(response.bytes_stream());
        while let Some(chunk) = body.next().await {
            let chunk = chunk.context("Failed to read download response body")?;
            file.write_all(&chunk)
                .await
                .context("Failed to write downloaded file to disk")?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&partial, destination)
            .await
            .with_context(|| format!("Failed to move {:?} into place", partial))?;

        self.trace
            .info(&format!("Downloaded {} bytes to {:?}", written, destination));
        Ok(())
    }

    async fn extract(&self, archive: &Path, directory: &Path) -> Result<()> {
        self.trace
            .info(&format!("Extracting {:?} into {:?}", archive, directory));

        let archive = archive.to_path_buf();
        let directory = directory.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<()> {
            IOUtil::ensure_directory_exists(&directory)?;
            let file = std::fs::File::open(&archive)
                .with_context(|| format!("Failed to open archive {:?}", archive))?;
            let decoder = flate2::read::GzDecoder::new(file);
            let mut tarball = tar::Archive::new(decoder);
            tarball
                .unpack(&directory)
                .context("Failed to extract tar.gz archive")?;
            Ok(())
        })
        .await
        .context("Extraction task panicked")??;

        Ok(())
    }

    async fn configure(&self, directory: &Path, registration: &RunnerRegistration) -> Result<()> {
        self.trace
            .info(&format!("Registering runner '{}'", registration.name));
        self.run_script(
            directory,
            constants::path::CONFIG_SCRIPT,
            &registration.config_arguments(),
            Some(&registration.display_arguments()),
        )
        .await
        .with_context(|| format!("Failed to configure runner '{}'", registration.name))
    }

    async fn install_service(&self, directory: &Path) -> Result<()> {
        for action in ["install", "start"] {
            self.trace
                .info(&format!("Running svc.sh {} in {:?}", action, directory));
            self.run_script(
                directory,
                constants::path::SERVICE_SCRIPT,
                &[action.to_string()],
                None,
            )
            .await
            .with_context(|| format!("svc.sh {} failed", action))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RunnerRegistration {
        RunnerRegistration {
            url: "https://github.com/kiennt/macrunner".to_string(),
            token: "REGTOKEN123".to_string(),
            name: "macrunner.mac1.runner1".to_string(),
            labels: vec![
                "self-hosted".to_string(),
                "OSX".to_string(),
                "X64".to_string(),
                "macrunner".to_string(),
                "mac1".to_string(),
            ],
        }
    }

    #[test]
    fn config_arguments_follow_the_runner_cli() {
        assert_eq!(
            registration().config_arguments().join(" "),
            "--unattended --url https://github.com/kiennt/macrunner --token REGTOKEN123 \
             --name macrunner.mac1.runner1 --labels self-hosted,OSX,X64,macrunner,mac1"
        );
        assert!(!registration().display_arguments().contains("REGTOKEN123"));
    }

    #[test]
    fn partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/tmp/runners/v2/runner.tar.gz")),
            PathBuf::from("/tmp/runners/v2/runner.tar.gz.partial")
        );
    }

    #[tokio::test]
    async fn extracts_a_gzipped_tarball() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("runner.tar.gz");
        {
            let file = std::fs::File::create(&archive).unwrap();
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            let mut builder = tar::Builder::new(encoder);
            let data = b"#!/bin/sh\necho configured\n";
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder
                .append_data(&mut header, "config.sh", &data[..])
                .unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }

        let ctx = HostContext::with_root(dir.path());
        let host = LocalRunnerHost::new(&ctx, false).unwrap();
        let target = dir.path().join("runner1");
        host.extract(&archive, &target).await.unwrap();

        let content = std::fs::read_to_string(target.join("config.sh")).unwrap();
        assert!(content.contains("configured"));
    }

    #[tokio::test]
    async fn extracting_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("runner.tar.gz");
        std::fs::write(&archive, b"not an archive").unwrap();

        let ctx = HostContext::with_root(dir.path());
        let host = LocalRunnerHost::new(&ctx, false).unwrap();
        assert!(host.extract(&archive, &dir.path().join("out")).await.is_err());
    }

    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn configure_runs_config_script_with_arguments() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "config.sh", "echo \"$@\" > configured.txt");

        let ctx = HostContext::with_root(dir.path());
        let host = LocalRunnerHost::new(&ctx, false).unwrap();
        host.configure(dir.path(), &registration()).await.unwrap();

        let args = std::fs::read_to_string(dir.path().join("configured.txt")).unwrap();
        assert!(args.starts_with("--unattended --url https://github.com/kiennt/macrunner"));
        assert!(args.contains("--labels self-hosted,OSX,X64,macrunner,mac1"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn install_service_runs_install_then_start() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "svc.sh", "echo \"$1\" >> service.log");

        let ctx = HostContext::with_root(dir.path());
        let host = LocalRunnerHost::new(&ctx, false).unwrap();
        host.install_service(dir.path()).await.unwrap();

        let log = std::fs::read_to_string(dir.path().join("service.log")).unwrap();
        assert_eq!(log, "install\nstart\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_script_stops_the_service_sequence() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "svc.sh", "echo \"$1\" >> service.log; exit 1");

        let ctx = HostContext::with_root(dir.path());
        let host = LocalRunnerHost::new(&ctx, false).unwrap();
        let err = host.install_service(dir.path()).await.unwrap_err();

        assert!(format!("{:#}", err).contains("svc.sh install failed"));
        let log = std::fs::read_to_string(dir.path().join("service.log")).unwrap();
        assert_eq!(log, "install\n");
    }

    #[tokio::test]
    async fn missing_script_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = HostContext::with_root(dir.path());
        let host = LocalRunnerHost::new(&ctx, false).unwrap();
        let err = host.configure(dir.path(), &registration()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("config.sh"));
    }
}
