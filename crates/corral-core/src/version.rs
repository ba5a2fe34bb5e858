//! Feature-set version comparison.
//!
//! Feature sets are dotted numeric strings (`"3.2.0"`, `"2.1"`). They are
//! not semver: components may be missing and count as zero.

use std::cmp::Ordering;

/// Feature set stamped on records written by this build.
pub const CURRENT_FEATURE_SET: &str = "3.2.0";

/// First feature set whose records carry timing attributes.
pub const TIMING_FEATURE_SET: &str = "2.1";

fn components(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| part.trim().parse().unwrap_or(0))
        .collect()
}

/// Compare two dotted versions component by component.
pub fn compare_version(a: &str, b: &str) -> Ordering {
    let (a, b) = (components(a), components(b));
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Whether `version` is at least `minimum`.
pub fn at_least(version: &str, minimum: &str) -> bool {
    compare_version(version, minimum) != Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_components_are_zero() {
        assert_eq!(compare_version("2.1", "2.1.0"), Ordering::Equal);
        assert_eq!(compare_version("2.1", "2.0.9"), Ordering::Greater);
        assert_eq!(compare_version("3.0.14", "3.2"), Ordering::Less);
    }

    #[test]
    fn numeric_not_lexicographic() {
        assert_eq!(compare_version("3.10", "3.9"), Ordering::Greater);
    }

    #[test]
    fn timing_threshold() {
        assert!(at_least(CURRENT_FEATURE_SET, TIMING_FEATURE_SET));
        assert!(!at_least("2.0", TIMING_FEATURE_SET));
    }
}
