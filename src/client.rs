// SPDX-License-Identifier: MIT

//! GitHub API access shared by the aggregation queries.
//!
//! Owns an octocrab instance for authenticated GraphQL calls and a plain
//! reqwest client for the unauthenticated REST listing and avatar downloads.
//! The bearer token is injected once at construction; no query reads it from
//! the environment ad hoc.

use masterror::AppError;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Error;

/// Base URL for GitHub REST endpoints.
const GITHUB_API_BASE: &str = "https://api.github.com";
/// User agent presented on raw REST requests; GitHub rejects anonymous ones.
const USER_AGENT: &str = concat!("gh-wrapped/", env!("CARGO_PKG_VERSION"));

/// Client wrapper for the GitHub GraphQL and REST endpoints.
#[derive(Clone)]
pub struct GithubClient {
    octocrab:  octocrab::Octocrab,
    rest:      reqwest::Client,
    has_token: bool
}

impl GithubClient {
    /// Builds a client, attaching the bearer token when one is configured.
    ///
    /// # Parameters
    ///
    /// * `token` - Personal access token for the GraphQL queries. The REST
    ///   listing works without one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`](Error::Upstream) when the underlying HTTP
    /// clients cannot be initialized.
    pub fn new(token: Option<&str>) -> Result<Self, Error> {
        let mut builder = octocrab::Octocrab::builder();
        if let Some(token) = token {
            builder = builder.personal_token(token.to_owned());
        }
        let octocrab = builder
            .build()
            .map_err(|e| AppError::service(format!("failed to initialize GitHub client: {e}")))?;

        let rest = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::service(format!("failed to initialize HTTP client: {e}")))?;

        Ok(Self {
            octocrab,
            rest,
            has_token: token.is_some()
        })
    }

    /// Whether a bearer token was supplied at construction.
    pub fn has_token(&self) -> bool {
        self.has_token
    }

    /// Posts a GraphQL payload and returns the `data` portion of the reply.
    ///
    /// A single attempt is made; transport failures and GraphQL `errors`
    /// entries surface immediately with the upstream message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`](Error::Validation) when no token is
    /// configured and [`Error::Upstream`](Error::Upstream) for transport or
    /// query failures.
    pub async fn graphql(&self, payload: &serde_json::Value) -> Result<serde_json::Value, Error> {
        if !self.has_token {
            return Err(Error::validation(
                "a GitHub token is required for GraphQL queries; pass --token or set GITHUB_TOKEN"
            ));
        }

        debug!("Posting GraphQL query");
        let response: serde_json::Value = self
            .octocrab
            .graphql(payload)
            .await
            .map_err(|e| Error::upstream(format!("GraphQL request failed: {e}")))?;

        if let Some(errors) = response.get("errors").and_then(serde_json::Value::as_array) {
            let message = errors
                .iter()
                .filter_map(|entry| entry.get("message").and_then(serde_json::Value::as_str))
                .collect::<Vec<_>>()
                .join("; ");
            let message = if message.is_empty() {
                "GraphQL query returned errors".to_owned()
            } else {
                message
            };
            return Err(Error::upstream(message));
        }

        response
            .get("data")
            .cloned()
            .ok_or_else(|| Error::upstream("GraphQL response carried no data"))
    }

    /// Performs an unauthenticated REST GET against the GitHub API.
    ///
    /// # Parameters
    ///
    /// * `path` - Path portion of the endpoint, starting with `/`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`](Error::Upstream) for transport failures,
    /// non-success statuses, and undecodable bodies.
    pub async fn rest_get<T>(&self, path: &str) -> Result<T, Error>
    where
        T: DeserializeOwned
    {
        let url = format!("{GITHUB_API_BASE}{path}");
        debug!("GET {}", url);

        let response = self
            .rest
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::upstream(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(format!("{url} returned {status}: {body}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::upstream(format!("failed to decode response from {url}: {e}")))
    }

    /// Downloads raw bytes, used for embedding the user's avatar in the card.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`](Error::Upstream) for transport failures
    /// and non-success statuses.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, Error> {
        debug!("GET {}", url);
        let response = self
            .rest
            .get(url)
            .send()
            .await
            .map_err(|e| Error::upstream(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(format!("{url} returned {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::upstream(format!("failed to read body from {url}: {e}")))?;

        Ok(bytes.to_vec())
    }
}
