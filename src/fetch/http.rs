//! HTTP transport for the search API.

use super::{FetchError, SearchPage, SearchTransport};
use crate::config::ApiCredentials;
use crate::error::{ReportError, Result};
use reqwest::blocking::Client;
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest error body kept in a [`FetchError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Blocking `reqwest` transport authenticating with a credential pair.
pub struct HttpTransport {
    client: Client,
    url: String,
    username: String,
    password: String,
}

impl HttpTransport {
    /// Build a transport for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(credentials: &ApiCredentials, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dfr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ReportError::Http(e.to_string()))?;

        Ok(Self {
            client,
            url: credentials.api_url.clone(),
            username: credentials.api_username.clone(),
            password: credentials.api_password.clone(),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SearchTransport for HttpTransport {
    fn search(
        &self,
        query: &str,
        start_at: usize,
        max_results: usize,
    ) -> Result<SearchPage, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&[
                ("jql", query.to_string()),
                ("startAt", start_at.to_string()),
                ("maxResults", max_results.to_string()),
            ])
            .send()
            .map_err(|e| FetchError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        response
            .json::<SearchPage>()
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
