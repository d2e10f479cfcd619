//! Query templates.
//!
//! A [`GraphQuery`] is a structured template whose `Display` impl renders the
//! Cypher text sent to a graph database. Values never appear in the text;
//! they are bound through [`Params`](super::Params) under the names below.

use std::fmt;

use super::{EdgeType, NodeLabel};
use crate::order::OrderClause;

pub const ID: &str = "id";
pub const IDS: &str = "ids";
pub const ANCHOR_ID: &str = "anchorId";
pub const TARGET_ID: &str = "targetId";
pub const EXCEPT: &str = "except";
pub const SKIP: &str = "skip";
pub const LIMIT: &str = "limit";
pub const PROPS: &str = "props";

/// Direction of travel from the anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// `(a)-[r]->(b)`
    Outgoing,
    /// `(a)<-[r]-(b)`
    Incoming,
}

/// Fixed per call site: which labels and relationship a traversal follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipShape {
    pub anchor: NodeLabel,
    pub edge: EdgeType,
    pub orientation: Orientation,
    pub target: NodeLabel,
}

impl RelationshipShape {
    pub const fn outgoing(anchor: NodeLabel, edge: EdgeType, target: NodeLabel) -> Self {
        Self {
            anchor,
            edge,
            orientation: Orientation::Outgoing,
            target,
        }
    }

    pub const fn incoming(anchor: NodeLabel, edge: EdgeType, target: NodeLabel) -> Self {
        Self {
            anchor,
            edge,
            orientation: Orientation::Incoming,
            target,
        }
    }

    fn arrow(&self, edge: &str) -> String {
        match self.orientation {
            Orientation::Outgoing => format!("-[{}]->", edge),
            Orientation::Incoming => format!("<-[{}]-", edge),
        }
    }
}

/// Predicate refinements applied on top of the basic traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refinement {
    /// The relationship carries `property = value`
    EdgeFlag { property: &'static str, value: bool },
    /// No relationship of the given type joins anchor and target in the
    /// same orientation
    MissingEdge(EdgeType),
    /// The target is not on the chain that starts at the anchor's `head`
    /// relationship and continues through any number of `step` relationships
    OffChain { head: EdgeType, step: EdgeType },
}

/// The shared predicate of the page and count queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgePattern {
    pub shape: RelationshipShape,
    pub refinements: &'static [Refinement],
    /// Filter targets whose id is listed in `$except`
    pub exclusion: bool,
}

impl fmt::Display for EdgePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = &self.shape;
        writeln!(f, "MATCH (a:{} {{id: ${}}})", shape.anchor, ANCHOR_ID)?;
        writeln!(
            f,
            "MATCH (a){}(b:{})",
            shape.arrow(&format!("r:{}", shape.edge)),
            shape.target
        )?;

        let mut conditions = Vec::new();
        if self.exclusion {
            conditions.push(format!("NOT b.id IN ${}", EXCEPT));
        }
        for refinement in self.refinements {
            conditions.push(match refinement {
                Refinement::EdgeFlag { property, value } => format!("r.{} = {}", property, value),
                Refinement::MissingEdge(edge) => {
                    format!("NOT EXISTS ((a){}(b))", shape.arrow(&format!(":{}", edge)))
                }
                Refinement::OffChain { head, step } => format!(
                    "NOT EXISTS ((a)-[:{}]->(:{})-[:{}*0..]->(b))",
                    head, shape.target, step
                ),
            });
        }
        if !conditions.is_empty() {
            writeln!(f, "WHERE {}", conditions.join(" AND "))?;
        }
        Ok(())
    }
}

/// A walk along repeated relationships of one type between nodes of one
/// label, away from the anchor in `toward` direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainWalk {
    pub label: NodeLabel,
    pub step: EdgeType,
    pub toward: Orientation,
}

impl fmt::Display for ChainWalk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self.toward {
            Orientation::Outgoing => format!("-[:{}*1..]->", self.step),
            Orientation::Incoming => format!("<-[:{}*1..]-", self.step),
        };
        writeln!(
            f,
            "MATCH p = (a:{} {{id: ${}}}){}(b:{})",
            self.label, ANCHOR_ID, arrow, self.label
        )?;
        writeln!(f, "WHERE b.id <> a.id")
    }
}

/// Structured query template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphQuery {
    /// One node by `$id`, aliased `n`
    FindNode(NodeLabel),
    /// Nodes whose id is in `$ids`, aliased `n`
    FindNodes(NodeLabel),
    /// Every node of a label, aliased `n`
    AllNodes(NodeLabel),
    /// Ordered `(a, r, b)` rows after `$skip`, at most `$limit` of them
    EdgePage {
        pattern: EdgePattern,
        order: OrderClause,
    },
    /// Every ordered `(a, r, b)` row
    EdgeList {
        pattern: EdgePattern,
        order: OrderClause,
    },
    /// One row with the number of matches, aliased `count`
    EdgeCount(EdgePattern),
    /// Nodes reached by a [`ChainWalk`] with their shortest distance,
    /// aliased `b` and `distance`, nearest first, after `$skip`, at most
    /// `$limit` of them
    ChainPage(ChainWalk),
    /// One row with the number of distinct nodes a walk reaches
    ChainCount(ChainWalk),
    /// Series containing the book `$id`, aliased `a`, either through a
    /// `PART_OF_SERIES` relationship or because the book lies on the
    /// `NEXT_BOOK` chain starting at the series head. The book is `b` and the
    /// `PART_OF_SERIES` relationship, when there is one, is `r`.
    SeriesOfBook,
    /// Create a node with `$id` and `$props`
    CreateNode(NodeLabel),
    /// Merge `(a)-[r]->(b)` between `$anchorId` and an existing `$targetId`
    /// and replace the relationship's properties with `$props`. With
    /// `merge_anchor` the anchor is created when absent.
    MergeEdge {
        shape: RelationshipShape,
        merge_anchor: bool,
    },
}

impl GraphQuery {
    pub fn is_mutating(&self) -> bool {
        matches!(self, GraphQuery::CreateNode(_) | GraphQuery::MergeEdge { .. })
    }
}

impl fmt::Display for GraphQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphQuery::FindNode(label) => {
                write!(f, "MATCH (n:{} {{id: ${}}}) RETURN n", label, ID)
            }
            GraphQuery::FindNodes(label) => {
                write!(f, "MATCH (n:{}) WHERE n.id IN ${} RETURN n", label, IDS)
            }
            GraphQuery::AllNodes(label) => write!(f, "MATCH (n:{}) RETURN n", label),
            GraphQuery::EdgePage { pattern, order } => {
                write!(f, "{}", pattern)?;
                writeln!(f, "RETURN a, r, b")?;
                writeln!(f, "{}", order)?;
                write!(f, "SKIP ${} LIMIT ${}", SKIP, LIMIT)
            }
            GraphQuery::EdgeList { pattern, order } => {
                write!(f, "{}", pattern)?;
                writeln!(f, "RETURN a, r, b")?;
                write!(f, "{}", order)
            }
            GraphQuery::EdgeCount(pattern) => {
                write!(f, "{}", pattern)?;
                write!(f, "RETURN count(r) AS count")
            }
            GraphQuery::ChainPage(walk) => {
                write!(f, "{}", walk)?;
                writeln!(f, "WITH b, min(length(p)) AS distance")?;
                writeln!(f, "RETURN b, distance")?;
                writeln!(f, "ORDER BY distance ASC, b.id ASC")?;
                write!(f, "SKIP ${} LIMIT ${}", SKIP, LIMIT)
            }
            GraphQuery::ChainCount(walk) => {
                write!(f, "{}", walk)?;
                write!(f, "RETURN count(DISTINCT b) AS count")
            }
            GraphQuery::SeriesOfBook => {
                writeln!(f, "MATCH (b:{} {{id: ${}}})", NodeLabel::Book, ID)?;
                writeln!(f, "MATCH (a:{})", NodeLabel::Series)?;
                writeln!(
                    f,
                    "WHERE EXISTS ((a)-[:{}]->(:{})-[:{}*0..]->(b)) OR EXISTS ((a)-[:{}]->(b))",
                    EdgeType::HeadOfSeries,
                    NodeLabel::Book,
                    EdgeType::NextBook,
                    EdgeType::PartOfSeries
                )?;
                writeln!(f, "OPTIONAL MATCH (a)-[r:{}]->(b)", EdgeType::PartOfSeries)?;
                writeln!(f, "RETURN a, r, b")?;
                write!(f, "ORDER BY a.title ASC, a.id ASC")
            }
            GraphQuery::CreateNode(label) => write!(
                f,
                "CREATE (n:{} {{id: ${}}}) SET n += ${} RETURN n",
                label, ID, PROPS
            ),
            GraphQuery::MergeEdge {
                shape,
                merge_anchor,
            } => {
                writeln!(f, "MATCH (b:{} {{id: ${}}})", shape.target, TARGET_ID)?;
                let anchor_clause = if *merge_anchor { "MERGE" } else { "MATCH" };
                writeln!(f, "{} (a:{} {{id: ${}}})", anchor_clause, shape.anchor, ANCHOR_ID)?;
                writeln!(f, "MERGE (a){}(b)", shape.arrow(&format!("r:{}", shape.edge)))?;
                writeln!(f, "SET r = ${}", PROPS)?;
                write!(f, "RETURN a, r, b")
            }
        }
    }
}
