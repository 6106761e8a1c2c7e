//! Update directives: which image should move to which version.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// UpdateDirective maps image names to the versions they should be bumped to.
///
/// Callers must not depend on the order images are processed in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateDirective {
    updates: BTreeMap<String, String>,
}

impl UpdateDirective {
    /// Creates an empty directive.
    pub fn new() -> Self {
        UpdateDirective::default()
    }

    /// Builds a directive from `repo=version` arguments. A repeated image keeps
    /// the last version given for it.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut directive = UpdateDirective::new();
        for arg in args {
            let (image, version) = parse_update_arg(arg.as_ref())?;
            directive.insert(image, version);
        }
        Ok(directive)
    }

    /// Sets the version for an image, returning the previous one.
    pub fn insert(&mut self, image: impl Into<String>, version: impl Into<String>) -> Option<String> {
        self.updates.insert(image.into(), version.into())
    }

    pub fn get(&self, image: &str) -> Option<&str> {
        self.updates.get(image).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Iterates over `(image, version)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.updates.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UpdateDirective {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut directive = UpdateDirective::new();
        for (k, v) in iter {
            directive.insert(k, v);
        }
        directive
    }
}

/// Splits `repo=version` on the first `=`. Both sides are trimmed and must be non-empty.
pub fn parse_update_arg(arg: &str) -> Result<(String, String)> {
    let (image, version) = arg
        .split_once('=')
        .ok_or_else(|| Error::InvalidUpdate(arg.to_string()))?;
    let (image, version) = (image.trim(), version.trim());
    if image.is_empty() || version.is_empty() {
        return Err(Error::InvalidUpdate(arg.to_string()));
    }
    Ok((image.to_string(), version.to_string()))
}
