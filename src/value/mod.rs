//! Value module - In-memory representation of YAML/JSON documents.
//!
//! Values are untyped trees of maps, lists and scalars, as produced by
//! deserializing a HelmRelease or a chart's values file.

mod value;

pub use value::*;
