//! Parsing of Signal K style full-model JSON documents.
//!
//! The document looks like:
//!
//! ```json
//! {
//!   "self": "vessels.urn:mrn:signalk:uuid:c0d79334",
//!   "vessels": {
//!     "urn:mrn:signalk:uuid:c0d79334": {
//!       "environment": {
//!         "wind": {
//!           "speedApparent": { "value": 3.2, "$source": "nmea.II" }
//!         }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Any object carrying a `value` or `values` key is a measurement; other
//! objects are groups; scalars that are not measurements (vessel name, mmsi)
//! are dropped.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::{MeasurementTree, NodeKind, Reading, TreeNode, DEFAULT_SOURCE};

/// Top-level collection holding the owners.
const OWNERS_KEY: &str = "vessels";

/// Errors raised while parsing a full-model document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document (or its owner collection) is not a JSON object.
    #[error("{0} is not a JSON object")]
    NotAnObject(&'static str),
}

impl MeasurementTree {
    /// Parse a full-model document from a string.
    pub fn from_json_str(s: &str) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_json(&value)
    }

    /// Parse a full-model document from bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_json(&value)
    }

    /// Convert an already-parsed full-model document.
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        let root = value.as_object().ok_or(ParseError::NotAnObject("document"))?;

        let self_ref = root.get("self").and_then(Value::as_str).map(String::from);

        let owners = match root.get(OWNERS_KEY) {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(owners)) => owners
                .iter()
                .map(|(id, subtree)| (id.clone(), parse_group(subtree)))
                .collect(),
            Some(_) => return Err(ParseError::NotAnObject(OWNERS_KEY)),
        };

        Ok(Self { self_ref, owners })
    }
}

/// Parse an owner subtree. Non-object owners become empty groups.
fn parse_group(value: &Value) -> TreeNode {
    match value.as_object() {
        Some(obj) => TreeNode::Group(parse_children(obj)),
        None => TreeNode::group(),
    }
}

fn parse_children(obj: &Map<String, Value>) -> BTreeMap<String, TreeNode> {
    obj.iter()
        .filter_map(|(key, child)| parse_node(child).map(|node| (key.clone(), node)))
        .collect()
}

fn parse_node(value: &Value) -> Option<TreeNode> {
    let obj = value.as_object()?;
    if obj.contains_key("value") || obj.contains_key("values") {
        Some(TreeNode::Measurement(parse_measurement(obj)))
    } else {
        Some(TreeNode::Group(parse_children(obj)))
    }
}

fn parse_measurement(obj: &Map<String, Value>) -> NodeKind {
    if let Some(Value::Object(values)) = obj.get("values") {
        if !values.is_empty() {
            return NodeKind::MultiSource(
                values
                    .iter()
                    .map(|(source, entry)| {
                        let reading = match entry {
                            Value::Object(e) => parse_reading(e.get("value")),
                            other => parse_reading(Some(other)),
                        };
                        (source.clone(), reading)
                    })
                    .collect(),
            );
        }
    }

    NodeKind::Simple {
        source: source_of(obj),
        reading: parse_reading(obj.get("value")),
    }
}

/// `$source` when present, otherwise the label of a legacy `source` object.
fn source_of(obj: &Map<String, Value>) -> String {
    obj.get("$source")
        .and_then(Value::as_str)
        .or_else(|| {
            obj.get("source")
                .and_then(|s| s.get("label"))
                .and_then(Value::as_str)
        })
        .unwrap_or(DEFAULT_SOURCE)
        .to_string()
}

fn parse_reading(value: Option<&Value>) -> Reading {
    match value {
        Some(Value::Number(n)) => n.as_f64().map(Reading::Number).unwrap_or(Reading::Absent),
        Some(Value::Object(fields)) => Reading::Composite(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), parse_reading(Some(v))))
                .collect(),
        ),
        _ => Reading::Absent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELF_ID: &str = "urn:mrn:signalk:uuid:c0d79334-4e25-4245-8892-54e8ccc8021d";

    fn document(vessel: Value) -> Value {
        serde_json::json!({
            "self": format!("vessels.{}", SELF_ID),
            "version": "1.0.0",
            "vessels": { SELF_ID: vessel },
            "sources": { "test-source": {} }
        })
    }

    #[test]
    fn parses_simple_value() {
        let doc = document(serde_json::json!({
            "uuid": SELF_ID,
            "environment": { "wind": { "speedApparent": {
                "value": 0, "$source": "test-source", "timestamp": "2020-12-05T21:20:51.539Z"
            }}}
        }));

        let tree = MeasurementTree::from_json(&doc).unwrap();
        assert_eq!(tree.self_id(), Some(SELF_ID));

        let owner = tree.owner(SELF_ID).unwrap();
        let node = owner.get("environment.wind.speedApparent").unwrap();
        assert_eq!(
            node,
            &TreeNode::Measurement(NodeKind::simple("test-source", 0.0))
        );
        // scalar vessel properties are not measurements
        assert!(owner.get("uuid").is_none());
    }

    #[test]
    fn values_map_becomes_multi_source() {
        let doc = document(serde_json::json!({
            "environment": { "wind": { "speedApparent": {
                "value": 0.5,
                "$source": "test-source-2",
                "values": {
                    "test-source-1": { "value": 0, "timestamp": "2020-12-05T21:20:51.539Z" },
                    "test-source-2": { "value": 0.5, "timestamp": "2020-12-05T21:20:51.539Z" }
                }
            }}}
        }));

        let tree = MeasurementTree::from_json(&doc).unwrap();
        let node = tree
            .owner(SELF_ID)
            .unwrap()
            .get("environment.wind.speedApparent")
            .unwrap();
        assert_eq!(
            node,
            &TreeNode::Measurement(NodeKind::multi_source([
                ("test-source-1", 0.0),
                ("test-source-2", 0.5)
            ]))
        );
    }

    #[test]
    fn object_value_becomes_composite() {
        let doc = document(serde_json::json!({
            "navigation": { "position": {
                "value": { "longitude": -122.40, "latitude": 47.67, "note": "fix" },
                "$source": "test-source"
            }}
        }));

        let tree = MeasurementTree::from_json(&doc).unwrap();
        let node = tree.owner(SELF_ID).unwrap().get("navigation.position").unwrap();

        let TreeNode::Measurement(NodeKind::Simple { source, reading }) = node else {
            panic!("expected a simple measurement, got {:?}", node);
        };
        assert_eq!(source, "test-source");
        let Reading::Composite(fields) = reading else {
            panic!("expected a composite reading");
        };
        assert_eq!(fields["longitude"], Reading::Number(-122.40));
        assert_eq!(fields["latitude"], Reading::Number(47.67));
        assert_eq!(fields["note"], Reading::Absent);
    }

    #[test]
    fn missing_source_uses_legacy_label_or_default() {
        let doc = document(serde_json::json!({
            "a": { "value": 1, "source": { "label": "legacy", "type": "NMEA0183" } },
            "b": { "value": 2 }
        }));

        let tree = MeasurementTree::from_json(&doc).unwrap();
        let owner = tree.owner(SELF_ID).unwrap();
        assert_eq!(
            owner.get("a"),
            Some(&TreeNode::Measurement(NodeKind::simple("legacy", 1.0)))
        );
        assert_eq!(
            owner.get("b"),
            Some(&TreeNode::Measurement(NodeKind::unsourced(2.0)))
        );
    }

    #[test]
    fn non_numeric_value_is_absent() {
        let doc = document(serde_json::json!({
            "navigation": { "state": { "value": "sailing", "$source": "s" } }
        }));

        let tree = MeasurementTree::from_json(&doc).unwrap();
        assert_eq!(
            tree.owner(SELF_ID).unwrap().get("navigation.state"),
            Some(&TreeNode::Measurement(NodeKind::simple("s", Reading::Absent)))
        );
    }

    #[test]
    fn document_without_vessels_is_empty() {
        let tree = MeasurementTree::from_json_str(r#"{"version": "1.0.0"}"#).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.self_id(), None);
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(matches!(
            MeasurementTree::from_json_str("[1, 2, 3]"),
            Err(ParseError::NotAnObject("document"))
        ));
        assert!(matches!(
            MeasurementTree::from_json_str(r#"{"vessels": 3}"#),
            Err(ParseError::NotAnObject("vessels"))
        ));
        assert!(matches!(
            MeasurementTree::from_json_str("not json"),
            Err(ParseError::Json(_))
        ));
    }

    #[test]
    fn parse_errors_describe_the_problem() {
        use std::error::Error as _;

        let err = MeasurementTree::from_json_str(r#"{"vessels": []}"#).unwrap_err();
        assert_eq!(err.to_string(), "vessels is not a JSON object");
        assert!(err.source().is_none());

        let err = MeasurementTree::from_json_str("{").unwrap_err();
        assert!(err.to_string().starts_with("invalid JSON: "));
        assert!(err.source().is_some());
    }
}
