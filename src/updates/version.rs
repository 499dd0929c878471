//! Version string comparison.
//!
//! Versions are compared component by component on their leading numeric
//! part (`8.1.2-1ubuntu` → `8.1.2`), with missing components treated as
//! zero, so `7.4` and `7.4.0` are equal and `7.10` is newer than `7.9`.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

/// Leading dotted-numeric part of a version string.
static NUMERIC_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)*").expect("NUMERIC_PREFIX must compile"));

/// Parse the numeric components of a version string.
///
/// A leading `v` (as in release tags) is ignored. Returns an empty list if
/// the string does not start with a number.
pub fn parse_version(version: &str) -> Vec<u64> {
    let version = version.trim().trim_start_matches('v');
    NUMERIC_PREFIX
        .find(version)
        .map(|m| {
            m.as_str()
                .split('.')
                .filter_map(|part| part.parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Compare two version strings semantically.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = parse_version(a);
    let b = parse_version(b);
    let len = a.len().max(b.len());

    for i in 0..len {
        let l = a.get(i).copied().unwrap_or(0);
        let r = b.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    Ordering::Equal
}

/// Whether `latest` is strictly newer than `current`.
pub fn is_newer_version(latest: &str, current: &str) -> bool {
    compare_versions(latest, current) == Ordering::Greater
}

/// Whether `running` satisfies a `minimum` version requirement.
///
/// An unparseable running version never satisfies the requirement.
pub fn satisfies_minimum(running: &str, minimum: &str) -> bool {
    !parse_version(running).is_empty() && compare_versions(running, minimum) != Ordering::Less
}

/// Version as shown to users: everything before the first `-`.
pub fn display_version(version: &str) -> &str {
    version.split('-').next().unwrap_or(version)
}
