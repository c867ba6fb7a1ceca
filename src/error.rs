#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the crate."]
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free while still
//! exposing a thoroughly documented error surface for library consumers.

use std::path::{Path, PathBuf};

/// Unified error type returned by the aggregator, renderer, and CLI.
///
/// Each variant captures sufficient context for diagnostics while avoiding
/// accidental exposure of the configured access token. Instances are
/// typically constructed through the helper constructors or by converting
/// from serde error types via the provided `From` implementations.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Wraps I/O errors that occur while reading configuration files.
    #[error("failed to read configuration from {path:?}: {source}")]
    Io {
        /// Location of the configuration file.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps YAML decoding errors.
    #[error("failed to parse configuration: {source}")]
    Parse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Returned when inputs or configuration violate invariants.
    #[error("invalid configuration: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// Wraps serialization errors when writing JSON output.
    #[error("failed to serialize output: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
    },
    /// Failures reported by the GitHub GraphQL or REST endpoints.
    ///
    /// Upstream queries are single-attempt: the first transport error or
    /// non-success response is surfaced here with the upstream message, and
    /// the caller decides how to present it.
    #[error("upstream query failed: {message}")]
    Upstream {
        /// Message reported by the upstream endpoint or transport.
        message: String
    },
    /// Wraps I/O errors that occur while writing the exported card.
    #[error("failed to write card artifact at {path:?}: {source}")]
    ExportIo {
        /// Location of the artifact being produced.
        path:   PathBuf,
        /// Underlying I/O error reported by the operating system.
        source: std::io::Error
    },
    /// Failures while rasterizing the card layout to a bitmap.
    #[error("failed to render card: {message}")]
    Render {
        /// Human readable message describing the rendering failure.
        message: String
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the validation failure.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs an upstream error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Message reported by the upstream endpoint.
    pub fn upstream<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Upstream {
            message: message.into()
        }
    }

    /// Constructs a render error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the rendering failure.
    pub fn render<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Render {
            message: message.into()
        }
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// This method is primarily intended for CLI contexts where the variant
    /// name does not add value to end users. The returned string matches the
    /// [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Parse {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

impl From<masterror::AppError> for Error {
    fn from(error: masterror::AppError) -> Self {
        Self::Upstream {
            message: error.to_string()
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the configuration file that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}

/// Creates an [`Error::ExportIo`] variant capturing the failing path and
/// source.
///
/// # Parameters
///
/// * `path` - Location of the card artifact that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn export_io_error(path: &Path, source: std::io::Error) -> Error {
    Error::ExportIo {
        path: path.to_path_buf(),
        source
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn validation_constructor_populates_message() {
        let error = Error::validation("something went wrong");
        match error {
            Error::Validation {
                ref message
            } => {
                assert_eq!(message, "something went wrong");
            }
            other => panic!("expected validation error, got {other:?}")
        }
    }

    #[test]
    fn upstream_constructor_populates_message() {
        let error = Error::upstream("could not resolve user");
        match error {
            Error::Upstream {
                ref message
            } => {
                assert_eq!(message, "could not resolve user");
            }
            other => panic!("expected upstream error, got {other:?}")
        }
    }

    #[test]
    fn to_display_string_matches_display() {
        let error = Error::validation("display me");
        assert_eq!(error.to_string(), error.to_display_string());
    }

    #[test]
    fn io_error_helper_wraps_path_and_source() {
        let path = std::path::Path::new("/tmp/example.yaml");
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = super::io_error(path, io_error);

        match error {
            Error::Io {
                path: ref stored_path,
                ref source
            } => {
                assert_eq!(stored_path, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected io error, got {other:?}")
        }
    }

    #[test]
    fn serde_yaml_conversion_maps_to_parse_variant() {
        let error = serde_yaml::from_str::<usize>("not-a-number").unwrap_err();
        let mapped: Error = error.into();
        assert!(matches!(mapped, Error::Parse { .. }));
    }

    #[test]
    fn serde_json_conversion_maps_to_serialize_variant() {
        let invalid = serde_json::from_str::<serde_json::Value>("not-json").unwrap_err();
        let mapped: Error = invalid.into();
        assert!(matches!(mapped, Error::Serialize { .. }));
    }

    #[test]
    fn app_error_conversion_maps_to_upstream_variant() {
        let app_error = masterror::AppError::service("rate limited");
        let mapped: Error = app_error.into();
        match mapped {
            Error::Upstream {
                ref message
            } => {
                assert!(message.contains("rate limited"));
            }
            other => panic!("expected upstream error, got {other:?}")
        }
    }

    #[test]
    fn export_io_error_helper_wraps_path_and_source() {
        let path = std::path::Path::new("/tmp/octocat-github-wrapped-2024.png");
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = super::export_io_error(path, io_error);

        match error {
            Error::ExportIo {
                path: ref stored_path,
                ref source
            } => {
                assert_eq!(stored_path, path);
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected export io error, got {other:?}")
        }
    }
}
