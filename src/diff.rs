//! Reduces the merged candidate stream to net-new domains.

use crate::domains::KnownDomains;
use std::collections::HashSet;

/// Drop candidates already in `known`, then keep only the first occurrence of each
/// remaining domain. Order of first appearance is preserved.
///
/// Comparison is exact and case-sensitive: no lowercasing, no trailing-dot or `www.`
/// stripping. Both inputs arrive already trimmed of surrounding whitespace.
pub fn diff<I, S>(candidates: I, known: &KnownDomains) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::new();

    for candidate in candidates {
        let candidate = candidate.into();
        if known.contains(&candidate) || seen.contains(&candidate) {
            continue;
        }
        seen.insert(candidate.clone());
        result.push(candidate);
    }
    result
}
