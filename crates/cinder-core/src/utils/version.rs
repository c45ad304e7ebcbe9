/// Dotted game-version ordering used for feature cutoffs
use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Part {
    Numeric(u64),
    Text(String),
}

fn split_parts(s: &str) -> Vec<Part> {
    let mut parts = Vec::new();
    for chunk in s.split(['.', '-']) {
        if chunk.is_empty() {
            continue;
        }
        match chunk.parse::<u64>() {
            Ok(n) => parts.push(Part::Numeric(n)),
            Err(_) => parts.push(Part::Text(chunk.to_string())),
        }
    }
    parts
}

/// Compare two dotted version ids ("1.7.10" vs "1.12"). Snapshot-style ids
/// with no numeric structure compare as text chunks, which is good enough for
/// the cutoff checks this launcher performs.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_parts = split_parts(a);
    let b_parts = split_parts(b);

    for (ap, bp) in a_parts.iter().zip(b_parts.iter()) {
        match ap.cmp(bp) {
            Ordering::Equal => continue,
            ord => return ord,
        }
    }
    a_parts.len().cmp(&b_parts.len())
}

/// True when `id` sorts strictly below `cutoff`. Ids that don't parse as a
/// dotted release ("23w14a") are treated as not-below, so new snapshot
/// formats get the modern behavior.
pub fn is_lower_than(id: &str, cutoff: &str) -> bool {
    let numeric = id
        .split(['.', '-'])
        .next()
        .map(|c| c.chars().all(|ch| ch.is_ascii_digit()))
        .unwrap_or(false);
    numeric && compare_versions(id, cutoff) == Ordering::Less
}

pub fn is_at_least(id: &str, cutoff: &str) -> bool {
    !is_lower_than(id, cutoff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_releases() {
        assert_eq!(compare_versions("1.7.10", "1.12"), Ordering::Less);
        assert_eq!(compare_versions("1.12", "1.12"), Ordering::Equal);
        assert_eq!(compare_versions("1.20.1", "1.12"), Ordering::Greater);
        assert_eq!(compare_versions("1.20", "1.20.1"), Ordering::Less);
    }

    #[test]
    fn cutoff_checks() {
        assert!(is_lower_than("1.7.10", "1.12"));
        assert!(!is_lower_than("1.12", "1.12"));
        assert!(!is_lower_than("1.20.4", "1.12"));
        // snapshots fall through to the modern side
        assert!(!is_lower_than("23w14a", "1.12"));
        assert!(is_at_least("1.20.1", "1.20"));
        assert!(!is_at_least("1.19.4", "1.20"));
    }
}
