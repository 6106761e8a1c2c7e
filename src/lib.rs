//! # Flux Helpers
//!
//! Tools for maintaining Flux GitOps manifests.
//!
//! The core of this library bumps container image tags inside the untyped
//! `values` tree of a HelmRelease. Images may be written as structured blocks
//! (`repository` + `tag`) or as inline `"image:tag"` strings; both are found
//! in one walk and rewritten in place, or only reported in a dry run.
//!
//! ## Modules
//!
//! - [`value`] - In-memory representation of YAML/JSON documents
//! - [`fieldpath`] - Paths that locate nodes inside a value tree
//! - [`semver`] - Format check for requested versions
//! - [`image`] - Matching and rewriting image references
//! - [`release`] - Loading, bumping and saving HelmRelease files
//! - [`chart`] - Injecting an image pull secret into a Helm chart

pub mod chart;
pub mod error;
pub mod fieldpath;
pub mod image;
pub mod release;
pub mod semver;
pub mod value;

pub use error::{Error, Result};
pub use fieldpath::{Path, PathElement};
pub use image::{apply, apply_all, bump_image, find_matches, BumpReport, Match, Outcome, UpdateDirective};
pub use release::{bump_release_file, BumpSummary, ReleaseDocument};
pub use semver::is_valid_semver;
pub use value::Value;
