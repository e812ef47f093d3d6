//! Snapshot extraction: flatten one owner's measurement tree into
//! `(metric key, value)` pairs.

use batchpoints_types::{FilterSpec, MeasurementTree, MetricKey, NodeKind, Reading, TreeNode};
use thiserror::Error;

use crate::filter::matches;

/// One extracted value.
pub type Pair = (MetricKey, f64);

/// Errors that can occur while extracting a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The tree holds no subtree for the requested owner.
    #[error("no data for owner '{0}'")]
    UnknownOwner(String),
}

/// Extract every selected numeric value of `owner`'s subtree.
///
/// The tree is walked depth first. At each measurement node the filter is
/// applied once to the node's path; a selected node then emits one pair per
/// source, and composite readings emit one pair per numeric field with the
/// field name appended to the path. Non-numeric and missing values emit
/// nothing.
///
/// # Example
///
/// ```rust
/// use batchpoints_sdk::extract;
/// use batchpoints_types::{FilterSpec, MeasurementTree, NodeKind, Reading};
///
/// let tree = MeasurementTree::builder()
///     .owner("self", |o| {
///         o.measurement(
///             "navigation.position",
///             NodeKind::simple("gps", Reading::composite([("longitude", -122.4), ("latitude", 47.67)])),
///         )
///     })
///     .build();
///
/// let pairs = extract(&tree, "self", &FilterSpec::all()).unwrap();
/// let keys: Vec<_> = pairs.iter().map(|(k, _)| k.as_str()).collect();
/// assert_eq!(
///     keys,
///     ["navigation.position.latitude|gps", "navigation.position.longitude|gps"]
/// );
/// ```
pub fn extract(
    tree: &MeasurementTree,
    owner: &str,
    filter: &FilterSpec,
) -> Result<Vec<Pair>, ExtractError> {
    let root = tree
        .owner(owner)
        .ok_or_else(|| ExtractError::UnknownOwner(owner.to_string()))?;

    let mut pairs = Vec::new();
    let mut path = String::new();
    walk(root, &mut path, filter, &mut pairs);
    Ok(pairs)
}

fn walk(node: &TreeNode, path: &mut String, filter: &FilterSpec, out: &mut Vec<Pair>) {
    match node {
        TreeNode::Group(children) => {
            for (segment, child) in children {
                let len = path.len();
                push_segment(path, segment);
                walk(child, path, filter, out);
                path.truncate(len);
            }
        }
        TreeNode::Measurement(kind) => {
            if matches(path, filter) {
                emit_measurement(path, kind, out);
            }
        }
    }
}

fn emit_measurement(path: &str, kind: &NodeKind, out: &mut Vec<Pair>) {
    for (source, reading) in kind.readings() {
        let mut reading_path = path.to_string();
        emit_reading(&mut reading_path, source, reading, out);
    }
}

fn emit_reading(path: &mut String, source: &str, reading: &Reading, out: &mut Vec<Pair>) {
    match reading {
        Reading::Number(value) => out.push((MetricKey::new(path, source), *value)),
        Reading::Composite(fields) => {
            for (field, sub) in fields {
                let len = path.len();
                push_segment(path, field);
                emit_reading(path, source, sub, out);
                path.truncate(len);
            }
        }
        Reading::Absent => {}
    }
}

fn push_segment(path: &mut String, segment: &str) {
    if !path.is_empty() {
        path.push('.');
    }
    path.push_str(segment);
}
