//! Release module - Loading, bumping and saving HelmRelease manifests.

mod document;

pub use document::*;

use std::path::Path as FsPath;

use tracing::info;

use crate::error::Result;
use crate::image::{apply_all, UpdateDirective};

/// BumpSummary reports what [`bump_release_file`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BumpSummary {
    /// Images with at least one applied (or, in a dry run, simulated) bump.
    pub updated: usize,
    /// Whether the file was rewritten.
    pub written: bool,
}

/// Bumps the image tags in a HelmRelease file's `.spec.values`.
///
/// The file is rewritten only when at least one image changed and this is not
/// a dry run. Before writing, the document is sanitized (see
/// [`ReleaseDocument::sanitize`]).
pub fn bump_release_file(
    path: impl AsRef<FsPath>,
    updates: &UpdateDirective,
    dry_run: bool,
) -> Result<BumpSummary> {
    let path = path.as_ref();
    let mut doc = ReleaseDocument::load(path)?;
    let mut values = doc.take_values()?;

    let updated = apply_all(&mut values, updates, dry_run)?;

    if dry_run {
        info!("dry-run complete, {} potential updates found", updated);
        return Ok(BumpSummary { updated, written: false });
    }
    if updated == 0 {
        info!("no image tags were updated");
        return Ok(BumpSummary { updated, written: false });
    }

    doc.put_values(values)?;
    doc.sanitize();
    doc.save(path)?;

    info!("updated {} image(s) in {}", updated, path.display());
    Ok(BumpSummary { updated, written: true })
}
