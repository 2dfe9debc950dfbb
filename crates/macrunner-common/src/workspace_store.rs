// WorkspaceStore: loads and saves the per-workspace JSON record
// (`<base>/workspaces/<name>/config.json`).

use crate::constants::{self, WellKnownDirectory};
use crate::host_context::HostContext;
use crate::tracing::Tracing;

use anyhow::{Context, Result};
use macrunner_sdk::{IOUtil, TraceWriter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One installed runner as it is persisted in the workspace record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerRecord {
    /// Numeric id rendered as a string (`"1"`, `"2"`, ...).
    pub id: String,

    /// Install directory of the runner.
    pub path: PathBuf,

    /// Name of the background service `svc.sh` installed.
    #[serde(default)]
    pub service_name: String,
}

/// Persisted workspace record.
///
/// The token is stored in clear text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    /// Generated once when the workspace is first created.
    pub id: String,

    /// Storage key; unique per host.
    pub name: String,

    /// Canonical address path (`owner` or `owner/repo`).
    pub address: String,

    pub token: String,

    #[serde(default)]
    pub runners: Vec<RunnerRecord>,
}

impl WorkspaceSettings {
    /// The id the next runner of this workspace gets: one past the largest
    /// numeric id recorded so far, `"1"` for an empty workspace.
    pub fn next_runner_id(&self) -> String {
        let max = self
            .runners
            .iter()
            .filter_map(|r| r.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        (max + 1).to_string()
    }
}

// ---------------------------------------------------------------------------
// WorkspaceStore
// ---------------------------------------------------------------------------

/// Reads and writes workspace records.
///
/// There is no locking; when two processes save the same workspace the last
/// writer wins.
pub struct WorkspaceStore {
    workspaces_directory: PathBuf,
    trace: Tracing,
}

impl WorkspaceStore {
    pub fn new(context: &HostContext) -> Self {
        Self {
            workspaces_directory: context.get_directory(WellKnownDirectory::Workspaces),
            trace: context.get_trace("WorkspaceStore"),
        }
    }

    /// Path of the record for `name`.
    pub fn config_file(&self, name: &str) -> PathBuf {
        self.workspaces_directory
            .join(name)
            .join(constants::path::WORKSPACE_CONFIG_FILE)
    }

    /// Whether a record for `name` exists on disk.
    pub fn exists(&self, name: &str) -> bool {
        self.config_file(name).is_file()
    }

    /// Load the record for `name`, or `None` when there is none.
    pub fn load(&self, name: &str) -> Result<Option<WorkspaceSettings>> {
        let path = self.config_file(name);
        if !path.is_file() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read workspace from {:?}", path))?;
        let settings: WorkspaceSettings = serde_json::from_str(&json)
            .with_context(|| format!("Failed to deserialize workspace '{}'", name))?;

        self.trace.verbose(&format!(
            "Loaded workspace '{}' with {} runner(s)",
            settings.name,
            settings.runners.len()
        ));
        Ok(Some(settings))
    }

    /// Overwrite the record with the full state of `settings`, creating
    /// parent directories as needed.
    pub fn save(&self, settings: &WorkspaceSettings) -> Result<PathBuf> {
        let path = self.config_file(&settings.name);
        if let Some(parent) = path.parent() {
            IOUtil::ensure_directory_exists(parent)?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write workspace to {:?}", path))?;

        self.trace.info(&format!(
            "Saved workspace '{}' ({} runner(s)) to {:?}",
            settings.name,
            settings.runners.len(),
            path
        ));
        Ok(path)
    }

    /// Names of every workspace that has a record, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.workspaces_directory.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.workspaces_directory).with_context(|| {
            format!("Failed to read {:?}", self.workspaces_directory)
        })? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.exists(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(name: &str) -> WorkspaceSettings {
        WorkspaceSettings {
            id: "2f1c7a4e-9a57-4f57-8d38-5c1d8f1e0b11".to_string(),
            name: name.to_string(),
            address: "kiennt/macrunner".to_string(),
            token: "ghp_token".to_string(),
            runners: Vec::new(),
        }
    }

    #[test]
    fn save_creates_parent_directories_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = HostContext::with_root(dir.path());
        let store = WorkspaceStore::new(&ctx);

        assert!(store.load("mac1").unwrap().is_none());

        let mut ws = settings("mac1");
        ws.runners.push(RunnerRecord {
            id: "1".to_string(),
            path: dir.path().join("workspaces/mac1/runner1"),
            service_name: "actions.runner.kiennt-macrunner.macrunner.mac1.runner1".to_string(),
        });
        let path = store.save(&ws).unwrap();

        assert_eq!(path, dir.path().join("workspaces/mac1/config.json"));
        assert_eq!(store.load("mac1").unwrap(), Some(ws));
    }

    #[test]
    fn save_overwrites_the_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = HostContext::with_root(dir.path());
        let store = WorkspaceStore::new(&ctx);

        store.save(&settings("mac1")).unwrap();
        let mut changed = settings("mac1");
        changed.token = "ghp_other".to_string();
        store.save(&changed).unwrap();

        assert_eq!(store.load("mac1").unwrap().unwrap().token, "ghp_other");
    }

    #[test]
    fn record_uses_plain_field_names() {
        let json = serde_json::to_value(settings("mac1")).unwrap();
        for field in ["id", "name", "address", "token", "runners"] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
    }

    #[test]
    fn list_returns_sorted_names_with_records() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = HostContext::with_root(dir.path());
        let store = WorkspaceStore::new(&ctx);

        assert!(store.list().unwrap().is_empty());
        store.save(&settings("zeta")).unwrap();
        store.save(&settings("alpha")).unwrap();
        fs::create_dir_all(dir.path().join("workspaces/empty")).unwrap();

        assert_eq!(store.list().unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn next_runner_id_is_monotonic() {
        let mut ws = settings("mac1");
        assert_eq!(ws.next_runner_id(), "1");

        for id in ["1", "3", "not-a-number"] {
            ws.runners.push(RunnerRecord {
                id: id.to_string(),
                path: PathBuf::from("/tmp"),
                service_name: String::new(),
            });
        }
        assert_eq!(ws.next_runner_id(), "4");
    }
}
