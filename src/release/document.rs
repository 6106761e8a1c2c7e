//! HelmRelease envelope around a values tree.

use std::fs;
use std::path::Path as FsPath;

use tracing::warn;

use crate::error::{Error, Result};
use crate::value::{self, Map, Value};

/// Kind expected at the top of a release document.
pub const HELM_RELEASE_KIND: &str = "HelmRelease";

/// ReleaseDocument is a parsed HelmRelease manifest.
///
/// The document is kept as an untyped [`Value`]; only the fields this crate
/// touches are interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseDocument {
    root: Map,
}

impl ReleaseDocument {
    /// Parses a release from YAML. The top level must be a map.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        match value::from_yaml(yaml)? {
            Value::Map(root) => {
                let doc = ReleaseDocument { root };
                match doc.kind() {
                    Some(HELM_RELEASE_KIND) => {}
                    Some(kind) => warn!("document kind is {}, expected {}", kind, HELM_RELEASE_KIND),
                    None => warn!("document has no kind, expected {}", HELM_RELEASE_KIND),
                }
                Ok(doc)
            }
            other => Err(Error::invalid_document(
                ".",
                format!("expected a map, got {}", other.type_name()),
            )),
        }
    }

    /// Reads and parses a release file.
    pub fn load(path: impl AsRef<FsPath>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        ReleaseDocument::from_yaml(&content)
    }

    /// Returns the document's `kind`, if it is a string.
    pub fn kind(&self) -> Option<&str> {
        self.root.get_str("kind")
    }

    /// Returns the whole document.
    pub fn root(&self) -> &Map {
        &self.root
    }

    /// Returns `.spec.values` without removing it.
    pub fn values(&self) -> Result<&Map> {
        let spec = self
            .root
            .get("spec")
            .and_then(Value::as_map)
            .ok_or_else(|| Error::invalid_document(".spec", "missing or not a map"))?;
        match spec.get("values") {
            Some(Value::Map(values)) => Ok(values),
            Some(other) => Err(Error::invalid_document(
                ".spec.values",
                format!("expected a map, got {}", other.type_name()),
            )),
            None => Err(Error::invalid_document(".spec.values", "missing")),
        }
    }

    /// Removes `.spec.values` from the document and returns it.
    ///
    /// The document is left unchanged when this fails.
    pub fn take_values(&mut self) -> Result<Value> {
        self.values()?;
        let spec = self
            .root
            .get_mut("spec")
            .and_then(Value::as_map_mut)
            .ok_or_else(|| Error::invalid_document(".spec", "missing or not a map"))?;
        spec.delete("values")
            .ok_or_else(|| Error::invalid_document(".spec.values", "missing"))
    }

    /// Stores `values` at `.spec.values`, creating `spec` if needed.
    pub fn put_values(&mut self, values: Value) -> Result<()> {
        if !self.root.has("spec") {
            self.root.set("spec", Value::Map(Map::new()));
        }
        let spec = self
            .root
            .get_mut("spec")
            .and_then(Value::as_map_mut)
            .ok_or_else(|| Error::invalid_document(".spec", "not a map"))?;
        spec.set("values", values);
        Ok(())
    }

    /// Drops fields the API server adds that should not be committed:
    /// `.metadata.creationTimestamp` and an empty `.status`.
    pub fn sanitize(&mut self) {
        if let Some(metadata) = self.root.get_mut("metadata").and_then(Value::as_map_mut) {
            metadata.delete("creationTimestamp");
        }

        let empty_status = match self.root.get("status") {
            Some(Value::Map(status)) => status.is_empty(),
            Some(Value::Null) => true,
            _ => false,
        };
        if empty_status {
            self.root.delete("status");
        }
    }

    /// Serializes the document to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.root)?)
    }

    /// Writes the document to `path`.
    pub fn save(&self, path: impl AsRef<FsPath>) -> Result<()> {
        let path = path.as_ref();
        let yaml = self.to_yaml()?;
        fs::write(path, yaml).map_err(|e| Error::io(path, e))
    }
}
