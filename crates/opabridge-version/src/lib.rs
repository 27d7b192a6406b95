//! OPA version parsing and compatibility decisions.
//!
//! OPA grew its bundle-style calling convention in 0.14.0-dev; callers pick
//! invocation flags by asking whether the installed version is the same or
//! newer than that threshold. A version string that does not parse is
//! treated as new enough (the `permissive-version-default` policy), so an
//! odd build string never blocks the tool.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Minimum OPA version for the bundle-style calling convention.
pub const BUNDLE_FLAGS_MIN_VERSION: &str = "0.14.0-dev";

/// A parsed `<major>.<minor>.<point>[-<patch>]` version.
///
/// Numeric parts are `None` when the corresponding piece is not a number,
/// and `None` orders below every number, so a garbled component never makes
/// a version look newer than it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaVersion {
    pub major: Option<u64>,
    pub minor: Option<u64>,
    pub point: Option<u64>,
    /// Pre-release tag after the first `-`, empty when absent.
    pub patch: String,
}

impl OpaVersion {
    /// Parse a version string.
    ///
    /// Returns `None` when the string does not split into at least three
    /// dot-separated pieces. Pieces past the third are ignored; the third
    /// piece splits on the first `-` into point and patch.
    pub fn parse(s: &str) -> Option<Self> {
        let mut pieces = s.split('.');
        let (major, minor, rest) = match (pieces.next(), pieces.next(), pieces.next()) {
            (Some(major), Some(minor), Some(rest)) => (major, minor, rest),
            _ => return None,
        };
        let (point, patch) = match rest.split_once('-') {
            Some((point, patch)) => (point, patch),
            None => (rest, ""),
        };
        Some(Self {
            major: numeric(major),
            minor: numeric(minor),
            point: numeric(point),
            patch: patch.to_string(),
        })
    }
}

impl Ord for OpaVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.point.cmp(&other.point))
            .then_with(|| patch_order(&self.patch, &other.patch))
    }
}

impl PartialOrd for OpaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// True when version string `a` is the same as `b` or newer.
///
/// Either side failing to parse yields `true`: an unknown version is
/// treated as new enough rather than blocking the caller.
pub fn same_or_newer(a: &str, b: &str) -> bool {
    match (OpaVersion::parse(a), OpaVersion::parse(b)) {
        (Some(a), Some(b)) => a >= b,
        _ => true,
    }
}

/// Bundle-flag decision for an installed version string.
pub fn supports_bundle_flags(installed: &str) -> bool {
    same_or_newer(installed, BUNDLE_FLAGS_MIN_VERSION)
}

// An empty patch is a release build and outranks any pre-release tag.
fn patch_order(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => a.cmp(b),
    }
}

fn numeric(piece: &str) -> Option<u64> {
    piece.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_point_and_patch() {
        let v = OpaVersion::parse("0.14.2-dev").unwrap();
        assert_eq!(v.major, Some(0));
        assert_eq!(v.minor, Some(14));
        assert_eq!(v.point, Some(2));
        assert_eq!(v.patch, "dev");

        let v = OpaVersion::parse("1.2.3").unwrap();
        assert_eq!(v.point, Some(3));
        assert_eq!(v.patch, "");
    }

    #[test]
    fn parse_rejects_fewer_than_three_pieces() {
        assert_eq!(OpaVersion::parse("not-a-version"), None);
        assert_eq!(OpaVersion::parse("0.14"), None);
        assert_eq!(OpaVersion::parse(""), None);
    }

    #[test]
    fn parse_ignores_pieces_past_the_third() {
        let v = OpaVersion::parse("1.2.3.4").unwrap();
        assert_eq!(v.point, Some(3));
        assert_eq!(v.patch, "");
    }

    #[test]
    fn same_version_is_same_or_newer() {
        assert!(same_or_newer("0.14.0-dev", "0.14.0-dev"));
        assert!(same_or_newer("1.2.3", "1.2.3"));
    }

    #[test]
    fn numeric_fields_decide_first() {
        assert!(same_or_newer("0.15.0", "0.14.0-dev"));
        assert!(!same_or_newer("0.13.0", "0.14.0-dev"));
        assert!(same_or_newer("1.0.0", "0.99.99"));
        assert!(!same_or_newer("0.14.1", "0.15.0"));
    }

    #[test]
    fn empty_patch_beats_pre_release() {
        assert!(same_or_newer("0.14.0", "0.14.0-dev"));
        assert!(!same_or_newer("0.14.0-dev", "0.14.0"));
    }

    #[test]
    fn pre_release_tags_compare_lexicographically() {
        assert!(same_or_newer("0.14.0-beta", "0.14.0-alpha"));
        assert!(!same_or_newer("0.14.0-alpha", "0.14.0-beta"));
        assert!(same_or_newer("0.14.0-rc1", "0.14.0-rc1"));
    }

    #[test]
    fn malformed_input_is_permissive() {
        assert!(same_or_newer("not-a-version", "0.14.0-dev"));
        assert!(same_or_newer("0.14.0-dev", "garbage"));
        assert!(same_or_newer("", ""));
    }

    #[test]
    fn non_numeric_piece_orders_below_every_number() {
        // Parseable on both sides, so the permissive default does not kick
        // in; the `None` component decides.
        assert!(!same_or_newer("0.x.0", "0.0.0"));
        assert!(same_or_newer("0.0.0", "0.x.0"));
    }

    #[test]
    fn bundle_flag_threshold() {
        assert!(supports_bundle_flags("0.14.0-dev"));
        assert!(supports_bundle_flags("0.14.0"));
        assert!(supports_bundle_flags("1.0.1"));
        assert!(!supports_bundle_flags("0.13.9"));
        // Unknown installed version: fail open.
        assert!(supports_bundle_flags(""));
    }
}
