//! In-process graph store.
//!
//! `MemoryGraph` evaluates [`GraphQuery`] templates directly against nodes and
//! edges held behind a lock. It backs the standalone binary and the test
//! suites. Sorting follows this store's native null policy: a missing sort
//! value orders after every present value in either direction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use tokio::sync::RwLock;

use super::query::{self, ChainWalk, EdgePattern, GraphQuery, Orientation, Refinement, RelationshipShape};
use super::{
    Edge, EdgeType, ExecutorError, ExecutorResult, GraphQueryExecutor, Node, NodeLabel, Params,
    Properties, Row, RowValue,
};
use crate::order::{Binding, Direction, OrderClause};
use crate::{CatalogError, Result};

/// Initial graph contents, loadable from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Seed {
    pub fn node(mut self, label: NodeLabel, id: &str, properties: serde_json::Value) -> Self {
        self.nodes.push(Node::new(label, id).with_properties(properties));
        self
    }

    pub fn edge(
        mut self,
        edge_type: EdgeType,
        origin: &str,
        target: &str,
        properties: serde_json::Value,
    ) -> Self {
        self.edges
            .push(Edge::new(edge_type, origin, target).with_properties(properties));
        self
    }
}

#[derive(Debug, Default)]
struct Store {
    nodes: HashMap<String, Node>,
    edges: Vec<Edge>,
}

/// One traversal match: anchor, relationship, far end
type Match<'s> = (&'s Node, &'s Edge, &'s Node);

impl Store {
    fn node(&self, label: NodeLabel, id: &str) -> Option<&Node> {
        self.nodes.get(id).filter(|n| n.label == label)
    }

    fn has_edge(&self, edge_type: EdgeType, origin: &str, target: &str) -> bool {
        self.edges
            .iter()
            .any(|e| e.edge_type == edge_type && e.origin == origin && e.target == target)
    }

    fn matches<'s>(&'s self, pattern: &EdgePattern, params: &Params) -> ExecutorResult<Vec<Match<'s>>> {
        let shape = &pattern.shape;
        let anchor_id = params.str(query::ANCHOR_ID)?;
        let except = if pattern.exclusion {
            params.str_list(query::EXCEPT)?
        } else {
            Vec::new()
        };

        let anchor = match self.node(shape.anchor, anchor_id) {
            Some(anchor) => anchor,
            None => return Ok(Vec::new()),
        };

        let mut found = Vec::new();
        for edge in self.edges.iter().filter(|e| e.edge_type == shape.edge) {
            let (near, far) = endpoints(shape, edge);
            if near != anchor_id || except.contains(&far) {
                continue;
            }
            let target = match self.node(shape.target, far) {
                Some(target) => target,
                None => continue,
            };
            if pattern
                .refinements
                .iter()
                .all(|refinement| self.satisfies(shape, refinement, edge, near, far))
            {
                found.push((anchor, edge, target));
            }
        }
        Ok(found)
    }

    fn satisfies(
        &self,
        shape: &RelationshipShape,
        refinement: &Refinement,
        edge: &Edge,
        near: &str,
        far: &str,
    ) -> bool {
        match refinement {
            Refinement::EdgeFlag { property, value } => {
                edge.property(property) == Some(&serde_json::Value::Bool(*value))
            }
            Refinement::MissingEdge(other) => match shape.orientation {
                Orientation::Outgoing => !self.has_edge(*other, near, far),
                Orientation::Incoming => !self.has_edge(*other, far, near),
            },
            Refinement::OffChain { head, step } => !self.chain_from(near, *head, *step).contains(far),
        }
    }

    /// Ids on the chain entered through `origin`'s `head` relationships and
    /// followed through outgoing `step` relationships
    fn chain_from(&self, origin: &str, head: EdgeType, step: EdgeType) -> HashSet<&str> {
        let starts = self
            .edges
            .iter()
            .filter(|e| e.edge_type == head && e.origin == origin)
            .map(|e| e.target.as_str());
        let mut seen: HashSet<&str> = HashSet::new();
        let mut pending: Vec<&str> = starts.collect();
        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            pending.extend(
                self.edges
                    .iter()
                    .filter(|e| e.edge_type == step && e.origin == id)
                    .map(|e| e.target.as_str()),
            );
        }
        seen
    }

    /// Nodes reached by `walk` from the anchor with their shortest distance,
    /// nearest first and by id within one distance. The anchor itself is
    /// never part of the result.
    fn walk(&self, walk: &ChainWalk, params: &Params) -> ExecutorResult<Vec<(&Node, u64)>> {
        let anchor_id = params.str(query::ANCHOR_ID)?;
        if self.node(walk.label, anchor_id).is_none() {
            return Ok(Vec::new());
        }

        let mut distances: HashMap<&str, u64> = HashMap::new();
        let mut queue = VecDeque::from([(anchor_id, 0u64)]);
        while let Some((id, distance)) = queue.pop_front() {
            for edge in self.edges.iter().filter(|e| e.edge_type == walk.step) {
                let next = match walk.toward {
                    Orientation::Outgoing if edge.origin == id => edge.target.as_str(),
                    Orientation::Incoming if edge.target == id => edge.origin.as_str(),
                    _ => continue,
                };
                if next == anchor_id || distances.contains_key(next) || self.node(walk.label, next).is_none() {
                    continue;
                }
                distances.insert(next, distance + 1);
                queue.push_back((next, distance + 1));
            }
        }

        let mut reached: Vec<(&Node, u64)> = distances
            .into_iter()
            .filter_map(|(id, distance)| self.node(walk.label, id).map(|node| (node, distance)))
            .collect();
        reached.sort_by(|(a, x), (b, y)| x.cmp(y).then_with(|| a.id().cmp(&b.id())));
        Ok(reached)
    }

    fn series_of_book(&self, params: &Params) -> ExecutorResult<Vec<Row>> {
        let book_id = params.str(query::ID)?;
        let book = match self.node(NodeLabel::Book, book_id) {
            Some(book) => book,
            None => return Ok(Vec::new()),
        };

        let mut series: Vec<&Node> = self
            .nodes
            .values()
            .filter(|n| n.label == NodeLabel::Series)
            .filter_map(|n| n.id().map(|id| (n, id)))
            .filter(|(_, id)| {
                self.has_edge(EdgeType::PartOfSeries, id, book_id)
                    || self
                        .chain_from(id, EdgeType::HeadOfSeries, EdgeType::NextBook)
                        .contains(book_id)
            })
            .map(|(n, _)| n)
            .collect();
        series.sort_by(|a, b| {
            let title = |n: &Node| n.property("title").and_then(serde_json::Value::as_str).map(str::to_string);
            match (title(a), title(b)) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(|| a.id().cmp(&b.id()))
        });

        Ok(series
            .into_iter()
            .map(|s| {
                let row = Row::new()
                    .with("a", RowValue::Node(s.clone()))
                    .with("b", RowValue::Node(book.clone()));
                let part = self.edges.iter().find(|e| {
                    e.edge_type == EdgeType::PartOfSeries && Some(e.origin.as_str()) == s.id() && e.target == book_id
                });
                match part {
                    Some(edge) => row.with("r", RowValue::Edge(edge.clone())),
                    None => row,
                }
            })
            .collect())
    }

    fn merge_edge(
        &mut self,
        shape: &RelationshipShape,
        merge_anchor: bool,
        params: &Params,
    ) -> ExecutorResult<Vec<Row>> {
        let target_id = params.str(query::TARGET_ID)?;
        let anchor_id = params.str(query::ANCHOR_ID)?;
        let props = params.object(query::PROPS)?.clone();

        let target = match self.node(shape.target, target_id) {
            Some(target) => target.clone(),
            None => return Ok(Vec::new()),
        };
        let anchor = match self.node(shape.anchor, anchor_id) {
            Some(anchor) => anchor.clone(),
            None if merge_anchor => {
                if self.nodes.contains_key(anchor_id) {
                    return Err(ExecutorError::Constraint(format!(
                        "id `{}` already belongs to another label",
                        anchor_id
                    )));
                }
                let anchor = Node::new(shape.anchor, anchor_id);
                self.nodes.insert(anchor_id.to_string(), anchor.clone());
                anchor
            }
            None => return Ok(Vec::new()),
        };

        let (origin, destination) = match shape.orientation {
            Orientation::Outgoing => (anchor_id, target_id),
            Orientation::Incoming => (target_id, anchor_id),
        };
        let position = self.edges.iter().position(|e| {
            e.edge_type == shape.edge && e.origin == origin && e.target == destination
        });
        let edge = match position {
            Some(idx) => {
                self.edges[idx].properties = props;
                self.edges[idx].clone()
            }
            None => {
                let mut edge = Edge::new(shape.edge, origin, destination);
                edge.properties = props;
                self.edges.push(edge.clone());
                edge
            }
        };

        Ok(vec![Row::new()
            .with("a", RowValue::Node(anchor))
            .with("r", RowValue::Edge(edge))
            .with("b", RowValue::Node(target))])
    }
}

/// `(near, far)` ids of an edge as seen from the anchor side of `shape`
fn endpoints<'e>(shape: &RelationshipShape, edge: &'e Edge) -> (&'e str, &'e str) {
    match shape.orientation {
        Orientation::Outgoing => (&edge.origin, &edge.target),
        Orientation::Incoming => (&edge.target, &edge.origin),
    }
}

/// Total order over property values: booleans, then numbers, then strings,
/// then anything else.
fn compare_values(a: &serde_json::Value, b: &serde_json::Value) -> Ordering {
    use serde_json::Value;

    fn rank(value: &Value) -> u8 {
        match value {
            Value::Bool(_) => 0,
            Value::Number(_) => 1,
            Value::String(_) => 2,
            _ => 3,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn sort_key<'m>(found: &Match<'m>, binding: Binding, property: &str) -> Option<&'m serde_json::Value> {
    let value = match binding {
        Binding::Edge => found.1.property(property),
        Binding::Target => found.2.property(property),
    };
    value.filter(|v| !v.is_null())
}

fn sort_matches(found: &mut [Match<'_>], order: &OrderClause) {
    // sort_by is stable, so equal keys keep insertion order
    found.sort_by(|left, right| {
        for (expr, direction) in order.keys() {
            let ordering = match (
                sort_key(left, expr.binding, expr.property),
                sort_key(right, expr.binding, expr.property),
            ) {
                (Some(x), Some(y)) => match direction {
                    Direction::Asc => compare_values(x, y),
                    Direction::Desc => compare_values(y, x),
                },
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn edge_row(found: &Match<'_>) -> Row {
    Row::new()
        .with("a", RowValue::Node(found.0.clone()))
        .with("r", RowValue::Edge(found.1.clone()))
        .with("b", RowValue::Node(found.2.clone()))
}

fn node_row(node: &Node) -> Row {
    Row::new().with("n", RowValue::Node(node.clone()))
}

/// Lock-guarded in-memory property graph
#[derive(Debug, Default)]
pub struct MemoryGraph {
    store: RwLock<Store>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from seed data. Every node needs a string id and every
    /// edge must join two seeded nodes.
    pub fn from_seed(seed: Seed) -> Result<Self> {
        let mut store = Store::default();

        for node in seed.nodes {
            let id = node
                .id()
                .ok_or_else(|| CatalogError::Seed(format!("{} node without a string id", node.label)))?
                .to_string();
            if store.nodes.insert(id.clone(), node).is_some() {
                return Err(CatalogError::Seed(format!("duplicate node id `{}`", id)));
            }
        }

        for edge in seed.edges {
            for end in [&edge.origin, &edge.target] {
                if !store.nodes.contains_key(end) {
                    return Err(CatalogError::Seed(format!(
                        "{} edge references unknown node `{}`",
                        edge.edge_type, end
                    )));
                }
            }
            // merge semantics: the last occurrence of a pair wins
            match store.edges.iter_mut().find(|e| {
                e.edge_type == edge.edge_type && e.origin == edge.origin && e.target == edge.target
            }) {
                Some(existing) => existing.properties = edge.properties,
                None => store.edges.push(edge),
            }
        }

        Ok(Self {
            store: RwLock::new(store),
        })
    }

    /// Load a JSON seed file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CatalogError::Seed(format!("{}: {}", path.display(), e)))?;
        let seed: Seed = serde_json::from_str(&raw)
            .map_err(|e| CatalogError::Seed(format!("{}: {}", path.display(), e)))?;
        Self::from_seed(seed)
    }

    pub async fn node_count(&self) -> usize {
        self.store.read().await.nodes.len()
    }

    pub async fn edge_count(&self) -> usize {
        self.store.read().await.edges.len()
    }

    fn evaluate(store: &Store, graph_query: &GraphQuery, params: &Params) -> ExecutorResult<Vec<Row>> {
        match graph_query {
            GraphQuery::FindNode(label) => {
                let id = params.str(query::ID)?;
                Ok(store.node(*label, id).map(node_row).into_iter().collect())
            }
            GraphQuery::FindNodes(label) => {
                let ids = params.str_list(query::IDS)?;
                Ok(ids
                    .into_iter()
                    .filter_map(|id| store.node(*label, id))
                    .map(node_row)
                    .collect())
            }
            GraphQuery::AllNodes(label) => {
                let mut nodes: Vec<&Node> =
                    store.nodes.values().filter(|n| n.label == *label).collect();
                nodes.sort_by(|a, b| a.id().cmp(&b.id()));
                Ok(nodes.into_iter().map(node_row).collect())
            }
            GraphQuery::EdgePage { pattern, order } => {
                let skip = params.u64(query::SKIP)? as usize;
                let limit = params.u64(query::LIMIT)? as usize;
                let mut found = store.matches(pattern, params)?;
                sort_matches(&mut found, order);
                Ok(found.iter().skip(skip).take(limit).map(edge_row).collect())
            }
            GraphQuery::EdgeList { pattern, order } => {
                let mut found = store.matches(pattern, params)?;
                sort_matches(&mut found, order);
                Ok(found.iter().map(edge_row).collect())
            }
            GraphQuery::EdgeCount(pattern) => {
                let count = store.matches(pattern, params)?.len() as u64;
                Ok(vec![
                    Row::new().with("count", RowValue::Scalar(serde_json::Value::from(count)))
                ])
            }
            GraphQuery::ChainPage(walk) => {
                let skip = params.u64(query::SKIP)? as usize;
                let limit = params.u64(query::LIMIT)? as usize;
                Ok(store
                    .walk(walk, params)?
                    .into_iter()
                    .skip(skip)
                    .take(limit)
                    .map(|(node, distance)| {
                        Row::new()
                            .with("b", RowValue::Node(node.clone()))
                            .with("distance", RowValue::Scalar(serde_json::Value::from(distance)))
                    })
                    .collect())
            }
            GraphQuery::ChainCount(walk) => {
                let count = store.walk(walk, params)?.len() as u64;
                Ok(vec![
                    Row::new().with("count", RowValue::Scalar(serde_json::Value::from(count)))
                ])
            }
            GraphQuery::SeriesOfBook => store.series_of_book(params),
            GraphQuery::CreateNode(_) | GraphQuery::MergeEdge { .. } => {
                Err(ExecutorError::ReadOnly(graph_query.to_string()))
            }
        }
    }
}

#[async_trait]
impl GraphQueryExecutor for MemoryGraph {
    async fn read(&self, graph_query: &GraphQuery, params: &Params) -> ExecutorResult<Vec<Row>> {
        if graph_query.is_mutating() {
            return Err(ExecutorError::ReadOnly(graph_query.to_string()));
        }
        let store = self.store.read().await;
        Self::evaluate(&store, graph_query, params)
    }

    async fn write(&self, graph_query: &GraphQuery, params: &Params) -> ExecutorResult<Vec<Row>> {
        let mut store = self.store.write().await;
        match graph_query {
            GraphQuery::CreateNode(label) => {
                let id = params.str(query::ID)?;
                if store.nodes.contains_key(id) {
                    return Err(ExecutorError::Constraint(format!("node `{}` already exists", id)));
                }
                let mut properties: Properties = params.object(query::PROPS)?.clone();
                properties.insert("id".to_string(), serde_json::Value::String(id.to_string()));
                let node = Node {
                    label: *label,
                    properties,
                };
                store.nodes.insert(id.to_string(), node.clone());
                Ok(vec![node_row(&node)])
            }
            GraphQuery::MergeEdge {
                shape,
                merge_anchor,
            } => store.merge_edge(shape, *merge_anchor, params),
            _ => Self::evaluate(&store, graph_query, params),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderSpec, PropertyRef, SortableField};
    use serde_json::json;

    const TITLE: &[SortableField] = &[SortableField::new("title", PropertyRef::target("title"))];
    const HAVE: &[Refinement] = &[Refinement::EdgeFlag {
        property: "have",
        value: true,
    }];

    fn labeled() -> MemoryGraph {
        MemoryGraph::from_seed(
            Seed::default()
                .node(NodeLabel::Label, "label1", json!({"name": "A"}))
                .node(NodeLabel::Book, "book1", json!({"title": "A"}))
                .node(NodeLabel::Book, "book2", json!({"title": "B"}))
                .node(NodeLabel::Book, "book3", json!({"title": "C"}))
                .edge(EdgeType::LabeledBook, "label1", "book3", json!({}))
                .edge(EdgeType::LabeledBook, "label1", "book1", json!({}))
                .edge(EdgeType::LabeledBook, "label1", "book2", json!({})),
        )
        .unwrap()
    }

    fn pattern() -> EdgePattern {
        EdgePattern {
            shape: RelationshipShape::outgoing(NodeLabel::Label, EdgeType::LabeledBook, NodeLabel::Book),
            refinements: &[],
            exclusion: true,
        }
    }

    fn params(skip: u64, limit: u64, except: &[&str]) -> Params {
        Params::new()
            .bind(query::ANCHOR_ID, "label1")
            .bind(query::SKIP, skip)
            .bind(query::LIMIT, limit)
            .bind(query::EXCEPT, json!(except))
    }

    fn target_ids(rows: &[Row]) -> Vec<String> {
        rows.iter()
            .map(|row| row.node("b").unwrap().id().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_edge_page_orders_skips_and_limits() {
        let graph = labeled();
        let order = OrderSpec::new().then("title", Direction::Desc).resolve(TITLE).unwrap();
        let query = GraphQuery::EdgePage {
            pattern: pattern(),
            order,
        };

        let rows = graph.read(&query, &params(1, 5, &[])).await.unwrap();
        assert_eq!(target_ids(&rows), vec!["book2", "book1"]);

        let rows = graph.read(&query, &params(0, 0, &[])).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_edge_count_applies_exclusion() {
        let graph = labeled();
        let rows = graph
            .read(&GraphQuery::EdgeCount(pattern()), &params(0, 0, &["book2", "nope"]))
            .await
            .unwrap();
        assert_eq!(rows[0].scalar("count").unwrap(), &json!(2));
    }

    #[tokio::test]
    async fn test_missing_anchor_matches_nothing() {
        let graph = labeled();
        let params = params(0, 10, &[]).bind(query::ANCHOR_ID, "label9");
        let rows = graph.read(&GraphQuery::EdgeCount(pattern()), &params).await.unwrap();
        assert_eq!(rows[0].scalar("count").unwrap(), &json!(0));
    }

    #[tokio::test]
    async fn test_missing_sort_values_order_last() {
        let graph = MemoryGraph::from_seed(
            Seed::default()
                .node(NodeLabel::User, "user1", json!({}))
                .node(NodeLabel::Book, "book1", json!({}))
                .node(NodeLabel::Book, "book2", json!({}))
                .node(NodeLabel::Book, "book3", json!({}))
                .edge(EdgeType::HasBook, "user1", "book1", json!({"have": true}))
                .edge(EdgeType::HasBook, "user1", "book2", json!({"have": true, "updatedAt": "2000-01-01"}))
                .edge(EdgeType::HasBook, "user1", "book3", json!({"have": false, "updatedAt": "2000-01-02"})),
        )
        .unwrap();
        let pattern = EdgePattern {
            shape: RelationshipShape::outgoing(NodeLabel::User, EdgeType::HasBook, NodeLabel::Book),
            refinements: HAVE,
            exclusion: false,
        };
        let allowed = [SortableField::new("updatedAt", PropertyRef::edge("updatedAt"))];
        for direction in [Direction::Asc, Direction::Desc] {
            let order = OrderSpec::new().then("updatedAt", direction).resolve(&allowed).unwrap();
            let rows = graph
                .read(
                    &GraphQuery::EdgeList { pattern, order },
                    &Params::new().bind(query::ANCHOR_ID, "user1"),
                )
                .await
                .unwrap();
            assert_eq!(target_ids(&rows), vec!["book2", "book1"]);
        }
    }

    #[tokio::test]
    async fn test_read_rejects_writes() {
        let graph = labeled();
        let err = graph
            .read(&GraphQuery::CreateNode(NodeLabel::Author), &Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::ReadOnly(_)));

        let merge = GraphQuery::MergeEdge {
            shape: RelationshipShape::outgoing(NodeLabel::Label, EdgeType::LabeledBook, NodeLabel::Book),
            merge_anchor: false,
        };
        let params = Params::new()
            .bind(query::ANCHOR_ID, "label1")
            .bind(query::TARGET_ID, "book1")
            .bind(query::PROPS, json!({"x": 1}));
        assert!(matches!(graph.read(&merge, &params).await, Err(ExecutorError::ReadOnly(_))));
        assert_eq!(graph.edge_count().await, 3);
    }

    /// book1 -> book2 -> book3 -> book4, with book0 -> book2 joining midway
    fn chain() -> MemoryGraph {
        let mut seed = Seed::default().node(NodeLabel::Series, "series1", json!({"title": "S"}));
        for id in ["book0", "book1", "book2", "book3", "book4", "book5"] {
            seed = seed.node(NodeLabel::Book, id, json!({}));
        }
        MemoryGraph::from_seed(
            seed.edge(EdgeType::NextBook, "book1", "book2", json!({}))
                .edge(EdgeType::NextBook, "book2", "book3", json!({}))
                .edge(EdgeType::NextBook, "book3", "book4", json!({}))
                .edge(EdgeType::NextBook, "book0", "book2", json!({}))
                .edge(EdgeType::HeadOfSeries, "series1", "book1", json!({}))
                .edge(EdgeType::PartOfSeries, "series1", "book3", json!({"numberingAs": "III"}))
                .edge(EdgeType::PartOfSeries, "series1", "book5", json!({})),
        )
        .unwrap()
    }

    fn walk_ids(rows: &[Row]) -> Vec<(String, u64)> {
        rows.iter()
            .map(|row| {
                (
                    row.node("b").unwrap().id().unwrap().to_string(),
                    row.scalar("distance").unwrap().as_u64().unwrap(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_chain_walks_both_ways() {
        let graph = chain();
        let walk = |toward| ChainWalk {
            label: NodeLabel::Book,
            step: EdgeType::NextBook,
            toward,
        };
        let params = |anchor: &str, skip: u64, limit: u64| {
            Params::new()
                .bind(query::ANCHOR_ID, anchor)
                .bind(query::SKIP, skip)
                .bind(query::LIMIT, limit)
        };

        let rows = graph
            .read(&GraphQuery::ChainPage(walk(Orientation::Outgoing)), &params("book1", 0, 10))
            .await
            .unwrap();
        assert_eq!(
            walk_ids(&rows),
            vec![("book2".to_string(), 1), ("book3".to_string(), 2), ("book4".to_string(), 3)]
        );

        let rows = graph
            .read(&GraphQuery::ChainPage(walk(Orientation::Incoming)), &params("book3", 1, 10))
            .await
            .unwrap();
        assert_eq!(walk_ids(&rows), vec![("book0".to_string(), 2), ("book1".to_string(), 2)]);

        let rows = graph
            .read(&GraphQuery::ChainCount(walk(Orientation::Incoming)), &params("book3", 0, 0))
            .await
            .unwrap();
        assert_eq!(rows[0].scalar("count").unwrap(), &json!(3));

        let rows = graph
            .read(&GraphQuery::ChainCount(walk(Orientation::Outgoing)), &params("book9", 0, 0))
            .await
            .unwrap();
        assert_eq!(rows[0].scalar("count").unwrap(), &json!(0));
    }

    #[tokio::test]
    async fn test_series_of_book_follows_chain_and_parts() {
        let graph = chain();
        let lookup = |id: &str| Params::new().bind(query::ID, id);

        for (book, numbering) in [("book1", None), ("book3", Some("III")), ("book5", None)] {
            let rows = graph.read(&GraphQuery::SeriesOfBook, &lookup(book)).await.unwrap();
            assert_eq!(rows.len(), 1, "{}", book);
            assert_eq!(rows[0].node("a").unwrap().id(), Some("series1"));
            let part = rows[0].get("r").and_then(RowValue::as_edge);
            assert_eq!(
                part.and_then(|edge| edge.property("numberingAs")).and_then(|v| v.as_str()),
                numbering
            );
        }

        assert!(graph.read(&GraphQuery::SeriesOfBook, &lookup("book0")).await.unwrap().is_empty());
        assert!(graph.read(&GraphQuery::SeriesOfBook, &lookup("book9")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_off_chain_refinement() {
        let graph = chain();
        let pattern = EdgePattern {
            shape: RelationshipShape::outgoing(NodeLabel::Series, EdgeType::PartOfSeries, NodeLabel::Book),
            refinements: &[Refinement::OffChain {
                head: EdgeType::HeadOfSeries,
                step: EdgeType::NextBook,
            }],
            exclusion: false,
        };
        let rows = graph
            .read(
                &GraphQuery::EdgeList {
                    pattern,
                    order: OrderSpec::new().resolve(TITLE).unwrap(),
                },
                &Params::new().bind(query::ANCHOR_ID, "series1"),
            )
            .await
            .unwrap();
        assert_eq!(target_ids(&rows), vec!["book5"]);
    }

    #[tokio::test]
    async fn test_merge_edge_overwrites_properties() {
        let graph = labeled();
        let shape = RelationshipShape::outgoing(NodeLabel::User, EdgeType::HasBook, NodeLabel::Book);
        let query = GraphQuery::MergeEdge {
            shape,
            merge_anchor: true,
        };
        let bind = |props: serde_json::Value| {
            Params::new()
                .bind(query::ANCHOR_ID, "user1")
                .bind(query::TARGET_ID, "book1")
                .bind(query::PROPS, props)
        };

        graph.write(&query, &bind(json!({"have": true, "note": "x"}))).await.unwrap();
        let rows = graph.write(&query, &bind(json!({"have": false}))).await.unwrap();

        let edge = rows[0].edge("r").unwrap();
        assert_eq!(edge.property("have"), Some(&json!(false)));
        assert_eq!(edge.property("note"), None);
        assert_eq!(graph.edge_count().await, 4);
        assert_eq!(graph.node_count().await, 5);
    }

    #[tokio::test]
    async fn test_merge_edge_requires_target() {
        let graph = labeled();
        let query = GraphQuery::MergeEdge {
            shape: RelationshipShape::outgoing(NodeLabel::User, EdgeType::HasBook, NodeLabel::Book),
            merge_anchor: true,
        };
        let rows = graph
            .write(
                &query,
                &Params::new()
                    .bind(query::ANCHOR_ID, "user1")
                    .bind(query::TARGET_ID, "book9")
                    .bind(query::PROPS, json!({})),
            )
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(graph.node_count().await, 4);
    }

    #[test]
    fn test_seed_rejects_dangling_edges() {
        let seed = Seed::default()
            .node(NodeLabel::Author, "a1", json!({}))
            .edge(EdgeType::WritedBook, "a1", "b1", json!({}));
        assert!(matches!(MemoryGraph::from_seed(seed), Err(CatalogError::Seed(_))));
    }
}
