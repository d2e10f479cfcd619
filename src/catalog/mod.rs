//! Per-entity catalog services.
//!
//! Each service owns the [`EdgeListing`](crate::engine::EdgeListing)s anchored
//! at its entity, the direct lookups, and the merge-style writes.

pub mod authors;
pub mod books;
pub mod labels;
pub mod records;
pub mod series;
pub mod users;

use async_graphql::{SimpleObject, ID};
use std::sync::Arc;
use uuid::Uuid;

use crate::edge::EdgeRecord;
use crate::graph::query::{self, GraphQuery, RelationshipShape};
use crate::graph::{ExecutorError, ExecutorResult, GraphQueryExecutor, Node, NodeLabel, Params, Properties};
use crate::{CatalogError, Result};

pub use authors::AuthorsService;
pub use books::BooksService;
pub use labels::LabelsService;
pub use series::SeriesService;
pub use users::UsersService;

/// Entities materialised from a graph node
pub trait FromNode: Sized {
    const LABEL: NodeLabel;

    fn from_node(node: &Node) -> ExecutorResult<Self>;

    /// The node's `id` property
    fn key(&self) -> &str;
}

fn required_id(node: &Node) -> ExecutorResult<ID> {
    node.id()
        .map(ID::from)
        .ok_or_else(|| ExecutorError::MalformedRow(format!("{} node has no id", node.label)))
}

fn optional_str(node: &Node, name: &str) -> Option<String> {
    node.property(name)
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct Author {
    pub id: ID,
    pub name: Option<String>,
}

impl FromNode for Author {
    const LABEL: NodeLabel = NodeLabel::Author;

    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn from_node(node: &Node) -> ExecutorResult<Self> {
        Ok(Self {
            id: required_id(node)?,
            name: optional_str(node, "name"),
        })
    }
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct Book {
    pub id: ID,
    pub title: Option<String>,
}

impl FromNode for Book {
    const LABEL: NodeLabel = NodeLabel::Book;

    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn from_node(node: &Node) -> ExecutorResult<Self> {
        Ok(Self {
            id: required_id(node)?,
            title: optional_str(node, "title"),
        })
    }
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct Label {
    pub id: ID,
    pub name: Option<String>,
}

impl FromNode for Label {
    const LABEL: NodeLabel = NodeLabel::Label;

    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn from_node(node: &Node) -> ExecutorResult<Self> {
        Ok(Self {
            id: required_id(node)?,
            name: optional_str(node, "name"),
        })
    }
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct Series {
    pub id: ID,
    pub title: Option<String>,
}

impl FromNode for Series {
    const LABEL: NodeLabel = NodeLabel::Series;

    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn from_node(node: &Node) -> ExecutorResult<Self> {
        Ok(Self {
            id: required_id(node)?,
            title: optional_str(node, "title"),
        })
    }
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct User {
    pub id: ID,
}

impl FromNode for User {
    const LABEL: NodeLabel = NodeLabel::User;

    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn from_node(node: &Node) -> ExecutorResult<Self> {
        Ok(Self {
            id: required_id(node)?,
        })
    }
}

/// `MATCH (n:Label {id: $id}) RETURN n`, failing with `NotFound` on a miss
pub(crate) async fn find_by_id<E: FromNode>(executor: &dyn GraphQueryExecutor, id: &str) -> Result<E> {
    let rows = executor
        .read(&GraphQuery::FindNode(E::LABEL), &Params::new().bind(query::ID, id))
        .await?;
    let row = rows.first().ok_or_else(|| CatalogError::NotFound {
        label: E::LABEL,
        id: id.to_string(),
    })?;
    Ok(E::from_node(row.node("n")?)?)
}

pub(crate) async fn find_all<E: FromNode>(executor: &dyn GraphQueryExecutor) -> Result<Vec<E>> {
    let rows = executor.read(&GraphQuery::AllNodes(E::LABEL), &Params::new()).await?;
    rows.iter()
        .map(|row| row.node("n").and_then(E::from_node).map_err(CatalogError::from))
        .collect()
}

/// Every node of `E`'s label among `ids`; unknown ids are skipped
pub(crate) async fn find_many<E: FromNode>(
    executor: &dyn GraphQueryExecutor,
    ids: &[String],
) -> ExecutorResult<Vec<E>> {
    let rows = executor
        .read(&GraphQuery::FindNodes(E::LABEL), &Params::new().bind(query::IDS, ids.to_vec()))
        .await?;
    rows.iter().map(|row| row.node("n").and_then(E::from_node)).collect()
}

/// Create a node with a fresh uuid
pub(crate) async fn create<E: FromNode>(executor: &dyn GraphQueryExecutor, props: Properties) -> Result<E> {
    let id = Uuid::new_v4().to_string();
    let rows = executor
        .write(
            &GraphQuery::CreateNode(E::LABEL),
            &Params::new()
                .bind(query::ID, id.clone())
                .bind(query::PROPS, serde_json::Value::Object(props)),
        )
        .await?;
    let row = rows
        .first()
        .ok_or_else(|| ExecutorError::MalformedRow(format!("creating {} {} returned no rows", E::LABEL, id)))?;
    Ok(E::from_node(row.node("n")?)?)
}

/// Find-or-create `(anchor)-[edge]->(target)` and overwrite its properties.
///
/// The target must exist. The anchor must exist unless `merge_anchor` is
/// set, in which case it is created on demand. A missing endpoint is
/// reported as `NotFound` for that endpoint.
pub(crate) async fn merge_edge(
    executor: &dyn GraphQueryExecutor,
    shape: RelationshipShape,
    merge_anchor: bool,
    anchor_id: &str,
    target_id: &str,
    props: Properties,
) -> Result<EdgeRecord> {
    let rows = executor
        .write(
            &GraphQuery::MergeEdge {
                shape,
                merge_anchor,
            },
            &Params::new()
                .bind(query::ANCHOR_ID, anchor_id)
                .bind(query::TARGET_ID, target_id)
                .bind(query::PROPS, serde_json::Value::Object(props)),
        )
        .await?;

    match rows.first() {
        Some(row) => Ok(EdgeRecord::from_row(row, shape.orientation)?),
        None => {
            let target_exists = !executor
                .read(
                    &GraphQuery::FindNode(shape.target),
                    &Params::new().bind(query::ID, target_id),
                )
                .await?
                .is_empty();
            let (label, id) = if target_exists {
                (shape.anchor, anchor_id)
            } else {
                (shape.target, target_id)
            };
            Err(CatalogError::NotFound {
                label,
                id: id.to_string(),
            })
        }
    }
}

/// All catalog services over one graph store
#[derive(Clone)]
pub struct Catalog {
    pub authors: AuthorsService,
    pub books: BooksService,
    pub labels: LabelsService,
    pub series: SeriesService,
    pub users: UsersService,
    executor: Arc<dyn GraphQueryExecutor>,
}

impl Catalog {
    pub fn new(executor: Arc<dyn GraphQueryExecutor>) -> Self {
        Self {
            authors: AuthorsService::new(executor.clone()),
            books: BooksService::new(executor.clone()),
            labels: LabelsService::new(executor.clone()),
            series: SeriesService::new(executor.clone()),
            users: UsersService::new(executor.clone()),
            executor,
        }
    }

    pub fn executor(&self) -> Arc<dyn GraphQueryExecutor> {
        self.executor.clone()
    }
}
