//! Semver module - Format gate for requested image versions.
//!
//! Only the shape of the string is checked. Versions are never parsed into
//! numbers or compared with each other.

use once_cell::sync::Lazy;
use regex::Regex;

static SEMVER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^v?[0-9]+\.[0-9]+\.[0-9]+(-[a-zA-Z0-9.-]+)?(\+[a-zA-Z0-9.-]+)?$")
        .expect("semver regex is valid")
});

/// Returns true if `tag` looks like `[v]MAJOR.MINOR.PATCH[-prerelease][+build]`.
pub fn is_valid_semver(tag: &str) -> bool {
    SEMVER_RE.is_match(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_release_versions() {
        for tag in ["1.2.3", "v1.2.3", "0.0.0", "10.20.30", "1.3.999"] {
            assert!(is_valid_semver(tag), "{tag} should be valid");
        }
    }

    #[test]
    fn test_accepts_prerelease_and_build() {
        for tag in [
            "1.2.3-alpha",
            "1.2.3-rc.1",
            "1.2.3-beta-2",
            "1.2.3+build123",
            "v1.2.3-rc.1+build.5",
            "1.0.0+20130313144700",
        ] {
            assert!(is_valid_semver(tag), "{tag} should be valid");
        }
    }

    #[test]
    fn test_rejects_malformed() {
        for tag in [
            "",
            "latest",
            "not-a-version",
            "invalid-version",
            "1.2",
            "1.2.3.4",
            "a.b.c",
            "V1.2.3",
            "1.2.3-",
            "1.2.3+",
            "1.2.3-rc_1",
            "1.2.3+build!",
            " 1.2.3",
            "1.2.3\n",
            "１.２.３",
            "١.٢.٣",
            "1.2.३",
        ] {
            assert!(!is_valid_semver(tag), "{tag:?} should be invalid");
        }
    }
}
