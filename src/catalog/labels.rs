use async_graphql::ID;
use std::sync::Arc;
use tracing::info;

use super::records::LabelingRecord;
use super::{create, find_all, find_by_id, merge_edge, Label};
use crate::engine::{AnchorPolicy, EdgeListing, PaginatedEdgeQuery};
use crate::graph::{EdgeType, GraphQueryExecutor, NodeLabel, Properties, RelationshipShape};
use crate::order::{OrderSpec, PropertyRef, SortableField};
use crate::pagination::{PageEnvelope, Pagination};
use crate::Result;

/// Books carrying a label
pub const LABELED_BOOKS: EdgeListing = EdgeListing {
    shape: RelationshipShape::outgoing(NodeLabel::Label, EdgeType::LabeledBook, NodeLabel::Book),
    refinements: &[],
    sortable: &[SortableField::new("title", PropertyRef::target("title"))],
    anchor_policy: AnchorPolicy::RequireExisting,
};

/// Labels on a book
pub const BOOK_LABELS: EdgeListing = EdgeListing {
    shape: RelationshipShape::incoming(NodeLabel::Book, EdgeType::LabeledBook, NodeLabel::Label),
    refinements: &[],
    sortable: &[],
    anchor_policy: AnchorPolicy::EmptyWhenMissing,
};

#[derive(Clone)]
pub struct LabelsService {
    executor: Arc<dyn GraphQueryExecutor>,
    edges: PaginatedEdgeQuery,
}

impl LabelsService {
    pub fn new(executor: Arc<dyn GraphQueryExecutor>) -> Self {
        Self {
            edges: PaginatedEdgeQuery::new(executor.clone()),
            executor,
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Label> {
        find_by_id(self.executor.as_ref(), id).await
    }

    pub async fn find_all(&self) -> Result<Vec<Label>> {
        find_all(self.executor.as_ref()).await
    }

    pub async fn create(&self, name: &str) -> Result<Label> {
        let mut props = Properties::new();
        props.insert("name".to_string(), name.into());
        let label: Label = create(self.executor.as_ref(), props).await?;
        info!(label_id = %label.id.as_str(), "created label");
        Ok(label)
    }

    pub async fn labeled_books(
        &self,
        label_id: &str,
        pagination: Pagination,
        except: &[String],
        order: &OrderSpec,
    ) -> Result<PageEnvelope<LabelingRecord>> {
        let page = self
            .edges
            .page(label_id, &LABELED_BOOKS, pagination, except, order)
            .await?;
        Ok(page.map(LabelingRecord::from))
    }

    /// Id of the label on `book_id`, `None` when the book is unlabeled or
    /// does not exist
    pub async fn label_id_of_book(&self, book_id: &str) -> Result<Option<ID>> {
        let records = self.edges.list(book_id, &BOOK_LABELS, &OrderSpec::new()).await?;
        Ok(records.into_iter().next().map(|r| ID::from(r.origin_id)))
    }

    pub async fn labeled_book(&self, label_id: &str, book_id: &str) -> Result<LabelingRecord> {
        let record = merge_edge(
            self.executor.as_ref(),
            LABELED_BOOKS.shape,
            false,
            label_id,
            book_id,
            Properties::new(),
        )
        .await?;
        info!(label_id, book_id, "labeled book");
        Ok(record.into())
    }
}
