// HttpClientFactory: builds the reqwest client used for GitHub API calls
// and runner archive downloads.

use crate::host_context::HostContext;
use anyhow::Result;
use macrunner_sdk::StringUtil;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;

/// Creates configured HTTP clients.
///
/// Proxy settings come from the standard `HTTP_PROXY` / `HTTPS_PROXY` /
/// `NO_PROXY` variables, which reqwest honours on its own.
pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Create a new `reqwest::Client` for the given context.
    ///
    /// If `MACRUNNER_TLS_NO_VERIFY` is set, TLS certificate verification is
    /// disabled (dangerous!).
    pub fn create_client(context: &HostContext) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );

        let mut builder = Client::builder()
            .user_agent(context.user_agent())
            .default_headers(headers);

        if let Ok(val) = std::env::var("MACRUNNER_TLS_NO_VERIFY") {
            if StringUtil::convert_to_bool(&val) == Some(true) {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_client() {
        let ctx = HostContext::with_root("/tmp/mr");
        assert!(HttpClientFactory::create_client(&ctx).is_ok());
    }
}
