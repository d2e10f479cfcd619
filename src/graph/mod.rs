//! Property-graph value model and the query executor seam.
//!
//! Everything above this module talks to the store through
//! [`GraphQueryExecutor`]: a structured [`GraphQuery`] template plus bound
//! [`Params`] go in, an ordered sequence of [`Row`]s comes out.

pub mod memory;
pub mod query;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

pub use memory::{MemoryGraph, Seed};
pub use query::{ChainWalk, EdgePattern, GraphQuery, Orientation, Refinement, RelationshipShape};

/// Property mapping carried by nodes and edges
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Node labels known to the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeLabel {
    Author,
    Book,
    Label,
    Series,
    User,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Author => "Author",
            NodeLabel::Book => "Book",
            NodeLabel::Label => "Label",
            NodeLabel::Series => "Series",
            NodeLabel::User => "User",
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship types known to the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    WritedBook,
    LabeledBook,
    HasBook,
    IsReadingBook,
    WishesToReadBook,
    ReadBook,
    PartOfSeries,
    NextBook,
    HeadOfSeries,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::WritedBook => "WRITED_BOOK",
            EdgeType::LabeledBook => "LABELED_BOOK",
            EdgeType::HasBook => "HAS_BOOK",
            EdgeType::IsReadingBook => "IS_READING_BOOK",
            EdgeType::WishesToReadBook => "WISHES_TO_READ_BOOK",
            EdgeType::ReadBook => "READ_BOOK",
            EdgeType::PartOfSeries => "PART_OF_SERIES",
            EdgeType::NextBook => "NEXT_BOOK",
            EdgeType::HeadOfSeries => "HEAD_OF_SERIES",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labeled entity. Its identity is the `id` property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub label: NodeLabel,
    #[serde(default)]
    pub properties: Properties,
}

impl Node {
    pub fn new(label: NodeLabel, id: impl Into<String>) -> Self {
        let mut properties = Properties::new();
        properties.insert("id".to_string(), serde_json::Value::String(id.into()));
        Self { label, properties }
    }

    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = properties {
            for (key, value) in map {
                if key != "id" {
                    self.properties.insert(key, value);
                }
            }
        }
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.properties.get("id").and_then(serde_json::Value::as_str)
    }

    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.get(name)
    }
}

/// A directed, typed relationship. Identity is `(origin, edge_type, target)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub origin: String,
    pub target: String,
    #[serde(default)]
    pub properties: Properties,
}

impl Edge {
    pub fn new(edge_type: EdgeType, origin: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            edge_type,
            origin: origin.into(),
            target: target.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = properties {
            self.properties = map;
        }
        self
    }

    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.get(name)
    }
}

/// One value of a result row
#[derive(Debug, Clone, PartialEq)]
pub enum RowValue {
    Node(Node),
    Edge(Edge),
    Scalar(serde_json::Value),
}

impl RowValue {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            RowValue::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            RowValue::Edge(edge) => Some(edge),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&serde_json::Value> {
        match self {
            RowValue::Scalar(value) => Some(value),
            _ => None,
        }
    }
}

/// A result row, keyed by the output alias declared in the query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(HashMap<String, RowValue>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, alias: &str, value: RowValue) -> Self {
        self.0.insert(alias.to_string(), value);
        self
    }

    pub fn get(&self, alias: &str) -> Option<&RowValue> {
        self.0.get(alias)
    }

    pub fn node(&self, alias: &str) -> ExecutorResult<&Node> {
        self.get(alias)
            .and_then(RowValue::as_node)
            .ok_or_else(|| ExecutorError::MalformedRow(format!("expected node at `{}`", alias)))
    }

    pub fn edge(&self, alias: &str) -> ExecutorResult<&Edge> {
        self.get(alias)
            .and_then(RowValue::as_edge)
            .ok_or_else(|| ExecutorError::MalformedRow(format!("expected edge at `{}`", alias)))
    }

    pub fn scalar(&self, alias: &str) -> ExecutorResult<&serde_json::Value> {
        self.get(alias)
            .and_then(RowValue::as_scalar)
            .ok_or_else(|| ExecutorError::MalformedRow(format!("expected scalar at `{}`", alias)))
    }
}

/// Parameters bound to a query template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(BTreeMap<String, serde_json::Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> ExecutorResult<&serde_json::Value> {
        self.0
            .get(name)
            .ok_or_else(|| ExecutorError::MissingParameter(name.to_string()))
    }

    pub fn str(&self, name: &str) -> ExecutorResult<&str> {
        self.get(name)?
            .as_str()
            .ok_or_else(|| ExecutorError::InvalidParameter(name.to_string(), "string"))
    }

    pub fn u64(&self, name: &str) -> ExecutorResult<u64> {
        self.get(name)?
            .as_u64()
            .ok_or_else(|| ExecutorError::InvalidParameter(name.to_string(), "non-negative integer"))
    }

    pub fn str_list(&self, name: &str) -> ExecutorResult<Vec<&str>> {
        let list = self
            .get(name)?
            .as_array()
            .ok_or_else(|| ExecutorError::InvalidParameter(name.to_string(), "list of strings"))?;
        list.iter()
            .map(|v| {
                v.as_str()
                    .ok_or_else(|| ExecutorError::InvalidParameter(name.to_string(), "list of strings"))
            })
            .collect()
    }

    pub fn object(&self, name: &str) -> ExecutorResult<&Properties> {
        self.get(name)?
            .as_object()
            .ok_or_else(|| ExecutorError::InvalidParameter(name.to_string(), "map"))
    }
}

/// Failures raised by a graph store executor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutorError {
    #[error("Mutating query submitted for read-only execution: {0}")]
    ReadOnly(String),

    #[error("Missing query parameter: ${0}")]
    MissingParameter(String),

    #[error("Query parameter ${0} must be a {1}")]
    InvalidParameter(String, &'static str),

    #[error("Malformed result row: {0}")]
    MalformedRow(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Graph store unavailable: {0}")]
    Unavailable(String),
}

pub type ExecutorResult<T> = std::result::Result<T, ExecutorError>;

/// Executes query templates against the property graph.
///
/// Read and write execution are distinct; the pagination core only ever
/// reads.
#[async_trait]
pub trait GraphQueryExecutor: Send + Sync {
    async fn read(&self, query: &GraphQuery, params: &Params) -> ExecutorResult<Vec<Row>>;

    async fn write(&self, query: &GraphQuery, params: &Params) -> ExecutorResult<Vec<Row>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_keeps_id_over_properties() {
        let node = Node::new(NodeLabel::Book, "book1").with_properties(json!({"id": "x", "title": "A"}));
        assert_eq!(node.id(), Some("book1"));
        assert_eq!(node.property("title"), Some(&json!("A")));
    }

    #[test]
    fn test_params_typed_access() {
        let params = Params::new()
            .bind("skip", 2u64)
            .bind("except", json!(["b1", "b2"]))
            .bind("anchorId", "a1");
        assert_eq!(params.u64("skip").unwrap(), 2);
        assert_eq!(params.str_list("except").unwrap(), vec!["b1", "b2"]);
        assert_eq!(params.str("anchorId").unwrap(), "a1");
        assert!(matches!(params.u64("anchorId"), Err(ExecutorError::InvalidParameter(..))));
        assert!(matches!(params.get("limit"), Err(ExecutorError::MissingParameter(_))));
    }

    #[test]
    fn test_edge_type_serde_names() {
        let edge: Edge = serde_json::from_value(json!({
            "type": "WISHES_TO_READ_BOOK",
            "origin": "u1",
            "target": "b1"
        }))
        .unwrap();
        assert_eq!(edge.edge_type, EdgeType::WishesToReadBook);
        assert_eq!(edge.edge_type.to_string(), "WISHES_TO_READ_BOOK");
        assert!(edge.properties.is_empty());
    }
}
