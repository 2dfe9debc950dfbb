// GithubAddress: the target of a workspace, either an organization or a
// single repository.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raised when a raw string cannot name an organization or a repository.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    #[error("'{0}' is not a valid github address. Use <org_name> or <owner>/<repo>.")]
    InvalidAddressFormat(String),
}

/// An organization (`owner`) or a repository (`owner/repo`).
///
/// Serialized as its canonical path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GithubAddress {
    owner: String,
    repo: Option<String>,
}

impl GithubAddress {
    /// Parse `org` or `owner/repo`. Any other number of `/`-separated
    /// segments, or an empty segment, is rejected.
    pub fn parse(raw: &str) -> Result<Self, AddressParseError> {
        let invalid = || AddressParseError::InvalidAddressFormat(raw.to_string());

        let segments: Vec<&str> = raw.trim().split('/').collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(invalid());
        }

        match segments.as_slice() {
            [owner] => Ok(Self::organization(*owner)),
            [owner, repo] => Ok(Self::repository(*owner, *repo)),
            _ => Err(invalid()),
        }
    }

    pub fn organization(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: None,
        }
    }

    pub fn repository(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: Some(repo.into()),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> Option<&str> {
        self.repo.as_deref()
    }

    /// True when no repository is set.
    pub fn is_organization(&self) -> bool {
        self.repo.is_none()
    }

    /// `owner` for an organization, `owner/repo` for a repository.
    pub fn to_canonical_path(&self) -> String {
        match &self.repo {
            Some(repo) => format!("{}/{}", self.owner, repo),
            None => self.owner.clone(),
        }
    }

    /// Human readable form used in console messages.
    pub fn describe(&self) -> String {
        match &self.repo {
            Some(repo) => format!("repo {}/{}", self.owner, repo),
            None => format!("organization {}", self.owner),
        }
    }

    /// REST path prefix: `orgs/<org>` or `repos/<owner>/<repo>`.
    pub fn api_prefix(&self) -> String {
        match &self.repo {
            Some(repo) => format!("repos/{}/{}", self.owner, repo),
            None => format!("orgs/{}", self.owner),
        }
    }

    /// Web URL of the target under `base` (e.g. `https://github.com`).
    pub fn html_url(&self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.to_canonical_path())
    }
}

impl fmt::Display for GithubAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_path())
    }
}

impl FromStr for GithubAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for GithubAddress {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<GithubAddress> for String {
    fn from(address: GithubAddress) -> Self {
        address.to_canonical_path()
    }
}
