// Credential: a GitHub token together with its lazily fetched scope set.

use crate::github::GithubApi;
use anyhow::Result;
use std::fmt;
use tokio::sync::OnceCell;

/// An access token plus the scopes GitHub reports for it.
///
/// Scopes are fetched on first use and cached for the lifetime of the value.
/// A failed fetch is not cached.
pub struct Credential {
    token: String,
    scopes: OnceCell<Vec<String>>,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            scopes: OnceCell::new(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// The scopes granted to the token.
    pub async fn scopes(&self, api: &dyn GithubApi) -> Result<&[String]> {
        let scopes = self
            .scopes
            .get_or_try_init(|| api.token_scopes(&self.token))
            .await?;
        Ok(scopes.as_slice())
    }

    /// Whether the token carries `scope`.
    pub async fn has_scope(&self, api: &dyn GithubApi, scope: &str) -> Result<bool> {
        Ok(self.scopes(api).await?.iter().any(|s| s == scope))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"***")
            .field("scopes", &self.scopes.get())
            .finish()
    }
}
