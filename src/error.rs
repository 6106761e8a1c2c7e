//! Error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::fieldpath::Path;

/// Error is returned by the operations of this crate that can genuinely fail.
///
/// Skipped bumps (already current, invalid version, image not found) are
/// outcomes reported in a [`crate::image::BumpReport`], not errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{path}: {message}")]
    InvalidDocument { path: String, message: String },

    #[error("invalid update {0:?} (expected repo=version)")]
    InvalidUpdate(String),

    #[error("{path}: matched node is no longer a map")]
    StructureChanged { path: Path },

    #[error("values file not found in chart: {}", path.display())]
    MissingValuesFile { path: PathBuf },
}

impl Error {
    /// Creates an I/O error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid document error.
    pub fn invalid_document(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidDocument {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fieldpath::PathElement;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_document(".spec.values", "missing");
        assert_eq!(err.to_string(), ".spec.values: missing");

        let err = Error::StructureChanged {
            path: Path::from_elements(vec![PathElement::field_name("image")]),
        };
        assert!(err.to_string().starts_with(".image:"));

        let err = Error::InvalidUpdate("nginx".into());
        assert!(err.to_string().contains("repo=version"));
    }
}
