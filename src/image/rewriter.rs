//! Applying a new version to matched image references.

use std::fmt;

use tracing::{info, warn};

use super::directive::UpdateDirective;
use super::matcher::{find_matches, Match, TAG_KEY};
use crate::error::{Error, Result};
use crate::semver::is_valid_semver;
use crate::value::Value;

/// Outcome records what happened to a single match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The tree was rewritten.
    Applied,
    /// Dry run: the tree would have been rewritten.
    Simulated,
    /// The match already carries the requested version.
    AlreadyCurrent,
    /// The requested version is not a semantic version.
    InvalidVersion,
}

impl Outcome {
    /// Returns true for outcomes that count as a change.
    pub fn is_change(self) -> bool {
        matches!(self, Outcome::Applied | Outcome::Simulated)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Applied => "applied",
            Outcome::Simulated => "simulated",
            Outcome::AlreadyCurrent => "already current",
            Outcome::InvalidVersion => "invalid version",
        };
        f.write_str(s)
    }
}

/// BumpReport collects the outcome of bumping one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpReport {
    pub image: String,
    pub version: String,
    pub dry_run: bool,
    pub entries: Vec<(Match, Outcome)>,
}

impl BumpReport {
    fn new(image: &str, version: &str, dry_run: bool) -> Self {
        BumpReport {
            image: image.to_string(),
            version: version.to_string(),
            dry_run,
            entries: Vec::new(),
        }
    }

    /// True if at least one match was applied, or would have been in a dry run.
    pub fn changed(&self) -> bool {
        self.entries.iter().any(|(_, outcome)| outcome.is_change())
    }

    /// True if the image does not occur in the tree at all.
    pub fn is_not_found(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of matches that ended with `outcome`.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.entries.iter().filter(|(_, o)| *o == outcome).count()
    }

    /// Iterates over the outcomes in match order.
    pub fn outcomes(&self) -> impl Iterator<Item = Outcome> + '_ {
        self.entries.iter().map(|(_, o)| *o)
    }
}

/// Applies `new_version` to each match.
///
/// Matches are evaluated independently: one that is already current or that
/// cannot take the version does not stop the others. The requested version is
/// compared with the current one before it is validated, so re-requesting the
/// current value is always a no-op. In a dry run the tree is left untouched.
///
/// Inline references are rewritten to exactly `image_name:new_version`; any
/// prefix beyond `image_name` is not preserved because `image_name` is the
/// prefix that was matched.
///
/// Fails with [`Error::StructureChanged`] if a match no longer points at a map.
pub fn apply(
    tree: &mut Value,
    matches: Vec<Match>,
    image_name: &str,
    new_version: &str,
    dry_run: bool,
) -> Result<BumpReport> {
    let mut report = BumpReport::new(image_name, new_version, dry_run);

    for m in matches {
        let outcome = match &m {
            Match::Structured { path } => {
                let map = path
                    .resolve_map_mut(tree)
                    .ok_or_else(|| Error::StructureChanged { path: path.clone() })?;
                let old_tag = map.get_str(TAG_KEY).unwrap_or_default().to_string();

                if old_tag == new_version {
                    info!("{} already at {}, skipping", image_name, new_version);
                    Outcome::AlreadyCurrent
                } else if !is_valid_semver(new_version) {
                    warn!("invalid version: {} (skipping {})", new_version, image_name);
                    Outcome::InvalidVersion
                } else if dry_run {
                    info!("[dry-run] would bump {}:{} -> {}", image_name, old_tag, new_version);
                    Outcome::Simulated
                } else {
                    map.set(TAG_KEY, Value::from(new_version));
                    info!("bumped {}:{} -> {}", image_name, old_tag, new_version);
                    Outcome::Applied
                }
            }
            Match::Inline { path, key, value } => {
                let map = path
                    .resolve_map_mut(tree)
                    .ok_or_else(|| Error::StructureChanged { path: path.clone() })?;
                let old_tag = value.rsplit(':').next().unwrap_or_default();

                if old_tag == new_version {
                    info!("{} already at {}, skipping", image_name, new_version);
                    Outcome::AlreadyCurrent
                } else if !is_valid_semver(new_version) {
                    warn!("invalid version: {} (skipping {})", new_version, image_name);
                    Outcome::InvalidVersion
                } else {
                    let new_image = format!("{}:{}", image_name, new_version);
                    if dry_run {
                        info!("[dry-run] would bump {} -> {}", value, new_image);
                        Outcome::Simulated
                    } else {
                        info!("bumped {} -> {}", value, new_image);
                        map.set(key.clone(), Value::String(new_image));
                        Outcome::Applied
                    }
                }
            }
        };
        report.entries.push((m, outcome));
    }

    Ok(report)
}

/// Finds and bumps every reference to `image_name` in `tree`.
///
/// An image that does not occur in the tree is not an error: the report is
/// empty and [`BumpReport::is_not_found`] is true.
pub fn bump_image(
    tree: &mut Value,
    image_name: &str,
    new_version: &str,
    dry_run: bool,
) -> Result<BumpReport> {
    let matches = find_matches(tree, image_name);
    if matches.is_empty() {
        warn!("no image block found for {}", image_name);
    }
    apply(tree, matches, image_name, new_version, dry_run)
}

/// Bumps every image of `updates` and returns how many images changed.
///
/// Stops at the first error; images bumped before it stay bumped.
pub fn apply_all(tree: &mut Value, updates: &UpdateDirective, dry_run: bool) -> Result<usize> {
    let mut updated = 0;
    for (image_name, new_version) in updates.iter() {
        let report = bump_image(tree, image_name, new_version, dry_run)?;
        if report.changed() {
            updated += 1;
        }
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fieldpath::{Path, PathElement};
    use crate::value::from_yaml;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_old_tag_is_after_last_colon() {
        let mut tree = from_yaml("images:\n  app: registry:5000/team/app:1.2.3\n").unwrap();
        let report = bump_image(&mut tree, "registry:5000/team/app", "1.2.3", false).unwrap();
        assert_eq!(report.outcomes().collect::<Vec<_>>(), vec![Outcome::AlreadyCurrent]);

        let report = bump_image(&mut tree, "registry:5000/team/app", "1.2.4", false).unwrap();
        assert!(report.changed());
        let images = tree.as_map().unwrap().get("images").unwrap().as_map().unwrap();
        assert_eq!(images.get_str("app"), Some("registry:5000/team/app:1.2.4"));
    }

    #[test]
    fn test_missing_tag_is_empty() {
        let mut tree = from_yaml("image:\n  repository: nginx\n").unwrap();
        let report = bump_image(&mut tree, "nginx", "1.25.1", false).unwrap();
        assert_eq!(report.count(Outcome::Applied), 1);
        let image = tree.as_map().unwrap().get("image").unwrap().as_map().unwrap();
        assert_eq!(image.get_str("tag"), Some("1.25.1"));
    }

    #[test]
    fn test_non_string_tag_is_replaced() {
        let mut tree = from_yaml("image:\n  repository: nginx\n  tag: 1.25\n").unwrap();
        let report = bump_image(&mut tree, "nginx", "1.25.0", false).unwrap();
        assert!(report.changed());
        let image = tree.as_map().unwrap().get("image").unwrap().as_map().unwrap();
        assert_eq!(image.get("tag"), Some(&Value::from("1.25.0")));
    }

    #[test]
    fn test_equality_checked_before_validation() {
        // The current tag is not semver, but asking for it again is still a no-op.
        let mut tree = from_yaml("image:\n  repository: nginx\n  tag: latest\n").unwrap();
        let report = bump_image(&mut tree, "nginx", "latest", false).unwrap();
        assert_eq!(report.outcomes().collect::<Vec<_>>(), vec![Outcome::AlreadyCurrent]);
        assert!(!report.changed());
    }

    #[test]
    fn test_non_ascii_digits_are_invalid() {
        let mut tree = from_yaml("image:\n  repository: nginx\n  tag: 1.2.3\nimages:\n  web: nginx:1.2.3\n").unwrap();
        let before = tree.clone();
        for version in ["１.２.３", "١.٢.٣", "1.2.३"] {
            let report = bump_image(&mut tree, "nginx", version, false).unwrap();
            assert_eq!(report.count(Outcome::InvalidVersion), 2, "{version}");
            assert!(!report.changed());
        }
        assert_eq!(tree, before);
    }

    #[test]
    fn test_no_normalization_of_v_prefix() {
        let mut tree = from_yaml("image:\n  repository: nginx\n  tag: 1.2.3\n").unwrap();
        let report = bump_image(&mut tree, "nginx", "v1.2.3", false).unwrap();
        assert_eq!(report.count(Outcome::Applied), 1);
    }

    #[test]
    fn test_stale_match_is_an_error() {
        let mut tree = from_yaml("image:\n  repository: nginx\n  tag: 1.0.0\n").unwrap();
        let matches = find_matches(&tree, "nginx");
        tree.as_map_mut().unwrap().set("image", Value::from("gone"));

        let err = apply(&mut tree, matches, "nginx", "1.0.1", false).unwrap_err();
        match err {
            Error::StructureChanged { path } => {
                assert_eq!(path, Path::from_elements(vec![PathElement::field_name("image")]))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_match_list() {
        let mut tree = from_yaml("a: b\n").unwrap();
        let report = apply(&mut tree, Vec::new(), "nginx", "1.0.0", false).unwrap();
        assert!(report.is_not_found());
        assert!(!report.changed());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::InvalidVersion.to_string(), "invalid version");
        assert!(Outcome::Simulated.is_change());
        assert!(!Outcome::AlreadyCurrent.is_change());
    }
}
