// SPDX-License-Identifier: MIT

//! Configuration document types describing a wrapped-report request.
//!
//! The types in this module mirror the structure of the YAML documents
//! consumed by the CLI. They intentionally keep optional values flexible so
//! command-line flags can override file-supplied defaults, and provide a
//! resolution step that derives validated values satisfying downstream
//! invariants.

use std::{fs, path::Path};

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{self, Error};

/// Directory receiving exported card artifacts by default.
const DEFAULT_OUTPUT_DIR: &str = ".";
/// GitHub launched in 2008; earlier years cannot hold contributions.
const MIN_YEAR: i32 = 2008;

/// Raw configuration document describing a wrapped-report request before
/// resolution.
///
/// Instances are typically created by deserializing YAML documents. All
/// fields are optional so the document only needs to pin the values the user
/// wants to persist between runs.
///
/// # Examples
///
/// ```
/// use gh_wrapped::WrappedConfig;
///
/// let yaml = r#"
/// username: octocat
/// year: 2024
/// "#;
/// let config: WrappedConfig = serde_yaml::from_str(yaml).expect("valid configuration");
/// assert_eq!(config.username.as_deref(), Some("octocat"));
/// ```
#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct WrappedConfig {
    /// GitHub account the report is generated for.
    #[serde(default, alias = "user")]
    pub username: Option<String>,

    /// Target calendar year for the contribution calendar.
    #[serde(default)]
    pub year: Option<i32>,

    /// Bearer token presented to the GraphQL endpoint.
    #[serde(default, alias = "github_token")]
    pub token: Option<String>,

    /// Directory receiving the exported card artifact.
    #[serde(default, alias = "output")]
    pub output_dir: Option<String>
}

/// Fully resolved configuration consumed by the aggregator and exporter.
///
/// The token is carried here and injected into the GitHub client at
/// construction; no module reads it from the environment ad hoc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Validated GitHub account name.
    pub username:   String,
    /// Validated target year.
    pub year:       i32,
    /// Optional bearer token for the GraphQL queries.
    pub token:      Option<String>,
    /// Directory receiving exported artifacts.
    pub output_dir: String
}

impl ResolvedConfig {
    /// Returns the artifact filename for the exported card.
    ///
    /// # Examples
    ///
    /// ```
    /// use gh_wrapped::ResolvedConfig;
    ///
    /// let config = ResolvedConfig {
    ///     username:   "octocat".to_owned(),
    ///     year:       2024,
    ///     token:      None,
    ///     output_dir: ".".to_owned()
    /// };
    /// assert_eq!(config.card_filename(), "octocat-github-wrapped-2024.png");
    /// ```
    pub fn card_filename(&self) -> String {
        format!("{}-github-wrapped-{}.png", self.username, self.year)
    }
}

/// Loads a configuration document from the provided YAML file path.
///
/// # Errors
///
/// Returns an [`Error`] when the file cannot be read or the YAML cannot be
/// deserialized.
pub fn load_config(path: &Path) -> Result<WrappedConfig, Error> {
    let contents = fs::read_to_string(path).map_err(|source| error::io_error(path, source))?;
    parse_config(&contents)
}

/// Parses a configuration document from the provided YAML string.
///
/// This function is suitable for unit tests and higher-level callers that
/// already obtained the configuration contents.
///
/// # Errors
///
/// Propagates [`Error::Parse`](Error::Parse) when the YAML cannot be decoded.
pub fn parse_config(contents: &str) -> Result<WrappedConfig, Error> {
    let config: WrappedConfig = serde_yaml::from_str(contents)?;
    Ok(config)
}

/// Resolves a configuration document and CLI overrides into validated values.
///
/// Overrides always win over file-supplied values. The target year defaults
/// to the current UTC year when neither source provides one.
///
/// # Parameters
///
/// * `file` - Configuration loaded from disk, or default when absent.
/// * `username` - CLI username override.
/// * `year` - CLI year override.
/// * `token` - Token from the CLI flag or process environment.
/// * `output_dir` - CLI output directory override.
///
/// # Errors
///
/// Returns [`Error::Validation`](Error::Validation) when no username is
/// supplied, the username contains whitespace, or the year falls outside the
/// supported range.
pub fn resolve_config(
    file: &WrappedConfig,
    username: Option<&str>,
    year: Option<i32>,
    token: Option<&str>,
    output_dir: Option<&str>
) -> Result<ResolvedConfig, Error> {
    let raw_username = username
        .or(file.username.as_deref())
        .ok_or_else(|| Error::validation("username must be provided"))?;
    let username = normalize_username(raw_username)?;

    let year = validate_year(year.or(file.year).unwrap_or_else(current_year))?;

    let token = token
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .or_else(|| file.token.clone());

    let output_dir = output_dir
        .or(file.output_dir.as_deref())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_OUTPUT_DIR)
        .to_owned();

    Ok(ResolvedConfig {
        username,
        year,
        token,
        output_dir
    })
}

/// Current calendar year in UTC, used when no year is configured.
pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Validates and trims a GitHub account name.
///
/// # Errors
///
/// Returns [`Error::Validation`](Error::Validation) when the value is empty
/// or contains whitespace.
fn normalize_username(input: &str) -> Result<String, Error> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("username cannot be empty"));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(Error::validation("username cannot contain whitespace"));
    }
    Ok(trimmed.to_owned())
}

/// Validates that the target year can hold GitHub contributions.
///
/// # Errors
///
/// Returns [`Error::Validation`](Error::Validation) when the year predates
/// GitHub or lies in the future.
fn validate_year(year: i32) -> Result<i32, Error> {
    if year < MIN_YEAR {
        return Err(Error::validation(format!("year must be {MIN_YEAR} or later")));
    }
    if year > current_year() {
        return Err(Error::validation("year cannot be in the future"));
    }
    Ok(year)
}
