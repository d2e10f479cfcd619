//! Flattened edge records produced from `(a, r, b)` result rows

use crate::graph::{ExecutorError, ExecutorResult, Orientation, Properties, Row};
use crate::types::DateTime;

/// A relationship seen from the service layer: the ids at both ends plus the
/// relationship's own properties. Never persisted.
///
/// The ids live outside the property map, so a relationship property named
/// `originId` or `targetId` cannot replace them.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub origin_id: String,
    pub target_id: String,
    pub properties: Properties,
}

impl EdgeRecord {
    /// Map one row whose anchor is aliased `a`, relationship `r` and far end
    /// `b`. Origin and target follow the relationship's own direction, not
    /// the direction of travel.
    pub fn from_row(row: &Row, orientation: Orientation) -> ExecutorResult<Self> {
        let anchor = node_id(row, "a")?;
        let other = node_id(row, "b")?;
        let edge = row.edge("r")?;

        let (origin_id, target_id) = match orientation {
            Orientation::Outgoing => (anchor, other),
            Orientation::Incoming => (other, anchor),
        };

        Ok(Self {
            origin_id,
            target_id,
            properties: edge.properties.clone(),
        })
    }

    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.get(name).filter(|v| !v.is_null())
    }

    pub fn str_property(&self, name: &str) -> Option<String> {
        self.property(name)
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    }

    pub fn bool_property(&self, name: &str) -> Option<bool> {
        self.property(name).and_then(serde_json::Value::as_bool)
    }

    pub fn i64_property(&self, name: &str) -> Option<i64> {
        self.property(name).and_then(serde_json::Value::as_i64)
    }

    /// An RFC 3339 timestamp property. Present but unparsable values are a
    /// malformed row.
    pub fn datetime_property(&self, name: &str) -> ExecutorResult<Option<DateTime>> {
        match self.property(name) {
            None => Ok(None),
            Some(value) => DateTime::from_json(value)
                .map(Some)
                .ok_or_else(|| ExecutorError::MalformedRow(format!("`{}` is not a timestamp: {}", name, value))),
        }
    }
}

fn node_id(row: &Row, alias: &str) -> ExecutorResult<String> {
    row.node(alias)?
        .id()
        .map(str::to_string)
        .ok_or_else(|| ExecutorError::MalformedRow(format!("node `{}` has no id", alias)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, EdgeType, Node, NodeLabel, RowValue};
    use serde_json::json;

    fn row(edge: Edge) -> Row {
        Row::new()
            .with("a", RowValue::Node(Node::new(NodeLabel::Book, "book1")))
            .with("r", RowValue::Edge(edge))
            .with("b", RowValue::Node(Node::new(NodeLabel::Author, "author1")))
    }

    #[test]
    fn test_incoming_row_keeps_edge_direction() {
        let edge = Edge::new(EdgeType::WritedBook, "author1", "book1");
        let record = EdgeRecord::from_row(&row(edge), Orientation::Incoming).unwrap();
        assert_eq!(record.origin_id, "author1");
        assert_eq!(record.target_id, "book1");

        let record = EdgeRecord::from_row(&row(Edge::new(EdgeType::WritedBook, "x", "y")), Orientation::Outgoing).unwrap();
        assert_eq!(record.origin_id, "book1");
        assert_eq!(record.target_id, "author1");
    }

    #[test]
    fn test_colliding_property_names_do_not_replace_ids() {
        let edge = Edge::new(EdgeType::WritedBook, "author1", "book1")
            .with_properties(json!({"originId": "spoofed", "role": "editor"}));
        let record = EdgeRecord::from_row(&row(edge), Orientation::Incoming).unwrap();

        assert_eq!(record.origin_id, "author1");
        assert_eq!(record.str_property("originId").as_deref(), Some("spoofed"));
        assert_eq!(record.str_property("role").as_deref(), Some("editor"));
    }

    #[test]
    fn test_missing_alias_is_malformed() {
        let row = Row::new().with("a", RowValue::Node(Node::new(NodeLabel::Book, "book1")));
        assert!(matches!(
            EdgeRecord::from_row(&row, Orientation::Outgoing),
            Err(ExecutorError::MalformedRow(_))
        ));
    }

    #[test]
    fn test_typed_properties() {
        let edge = Edge::new(EdgeType::HasBook, "u", "b").with_properties(json!({
            "have": true,
            "volume": 3,
            "updatedAt": "2021-03-04T05:06:07Z",
            "broken": "yesterday",
            "gone": null
        }));
        let record = EdgeRecord::from_row(&row(edge), Orientation::Outgoing).unwrap();
        assert_eq!(record.bool_property("have"), Some(true));
        assert_eq!(record.i64_property("volume"), Some(3));
        assert!(record.datetime_property("updatedAt").unwrap().is_some());
        assert!(record.datetime_property("missing").unwrap().is_none());
        assert!(record.datetime_property("gone").unwrap().is_none());
        assert!(record.datetime_property("broken").is_err());
    }
}
