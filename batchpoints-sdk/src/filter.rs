//! Path matching against include/exclude glob lists.
//!
//! Patterns are compared segment by segment on the dot-delimited path:
//!
//! - a literal segment must equal the path segment;
//! - a `*` segment in the last position matches one or more remaining segments;
//! - a `*` segment anywhere else matches exactly one segment.
//!
//! So `environment.*` selects `environment.wind.speedApparent` but neither
//! `environment` nor `environment2.depth`. Patterns that are empty, contain
//! empty segments, or use `*` inside a segment (`env*`) never match.

use batchpoints_types::{FilterMode, FilterSpec};

const WILDCARD: &str = "*";

/// Decide whether `path` is selected by `filter`.
///
/// Under [`FilterMode::Include`] a path is selected when some pattern
/// matches it (an empty list selects nothing); under
/// [`FilterMode::Exclude`] when no pattern matches (an empty list selects
/// everything).
///
/// # Example
///
/// ```rust
/// use batchpoints_sdk::matches;
/// use batchpoints_types::FilterSpec;
///
/// let filter = FilterSpec::include(["environment.*"]);
/// assert!(matches("environment.wind.speedApparent", &filter));
/// assert!(!matches("navigation.speedThroughWater", &filter));
/// ```
pub fn matches(path: &str, filter: &FilterSpec) -> bool {
    let hit = filter
        .patterns
        .iter()
        .any(|pattern| pattern_matches(pattern, path));

    match filter.mode {
        FilterMode::Include => hit,
        FilterMode::Exclude => !hit,
    }
}

/// Whether a single glob pattern matches a path.
pub fn pattern_matches(pattern: &str, path: &str) -> bool {
    if !is_well_formed(pattern) || path.is_empty() {
        return false;
    }

    let mut pattern_segments = pattern.split('.').peekable();
    let mut path_segments = path.split('.');

    while let Some(expected) = pattern_segments.next() {
        let is_last = pattern_segments.peek().is_none();
        match path_segments.next() {
            // trailing wildcard swallows this segment and whatever follows
            Some(_) if expected == WILDCARD && is_last => return true,
            Some(_) if expected == WILDCARD => continue,
            Some(actual) if actual == expected => continue,
            _ => return false,
        }
    }

    // every pattern segment consumed; the path must be too
    path_segments.next().is_none()
}

fn is_well_formed(pattern: &str) -> bool {
    !pattern.is_empty()
        && pattern
            .split('.')
            .all(|segment| !segment.is_empty() && (segment == WILDCARD || !segment.contains('*')))
}
