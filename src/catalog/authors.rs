use std::sync::Arc;
use tracing::info;

use super::records::WritingRecord;
use super::{create, find_all, find_by_id, merge_edge, Author};
use crate::engine::{AnchorPolicy, EdgeListing, PaginatedEdgeQuery};
use crate::graph::{EdgeType, GraphQueryExecutor, NodeLabel, Properties, RelationshipShape};
use crate::order::{OrderSpec, PropertyRef, SortableField};
use crate::pagination::{PageEnvelope, Pagination};
use crate::Result;

/// Books written by an author
pub const AUTHOR_WRITES: EdgeListing = EdgeListing {
    shape: RelationshipShape::outgoing(NodeLabel::Author, EdgeType::WritedBook, NodeLabel::Book),
    refinements: &[],
    sortable: &[SortableField::new("title", PropertyRef::target("title"))],
    anchor_policy: AnchorPolicy::RequireExisting,
};

/// Authors of a book
pub const BOOK_WRITERS: EdgeListing = EdgeListing {
    shape: RelationshipShape::incoming(NodeLabel::Book, EdgeType::WritedBook, NodeLabel::Author),
    refinements: &[],
    sortable: &[SortableField::new("name", PropertyRef::target("name"))],
    anchor_policy: AnchorPolicy::EmptyWhenMissing,
};

#[derive(Clone)]
pub struct AuthorsService {
    executor: Arc<dyn GraphQueryExecutor>,
    edges: PaginatedEdgeQuery,
}

impl AuthorsService {
    pub fn new(executor: Arc<dyn GraphQueryExecutor>) -> Self {
        Self {
            edges: PaginatedEdgeQuery::new(executor.clone()),
            executor,
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Author> {
        find_by_id(self.executor.as_ref(), id).await
    }

    pub async fn find_all(&self) -> Result<Vec<Author>> {
        find_all(self.executor.as_ref()).await
    }

    pub async fn create(&self, name: &str) -> Result<Author> {
        let mut props = Properties::new();
        props.insert("name".to_string(), name.into());
        let author: Author = create(self.executor.as_ref(), props).await?;
        info!(author_id = %author.id.as_str(), "created author");
        Ok(author)
    }

    pub async fn writes(
        &self,
        author_id: &str,
        pagination: Pagination,
        except: &[String],
        order: &OrderSpec,
    ) -> Result<PageEnvelope<WritingRecord>> {
        let page = self
            .edges
            .page(author_id, &AUTHOR_WRITES, pagination, except, order)
            .await?;
        Ok(page.map(WritingRecord::from))
    }

    pub async fn writers_of_book(&self, book_id: &str, order: &OrderSpec) -> Result<Vec<WritingRecord>> {
        let records = self.edges.list(book_id, &BOOK_WRITERS, order).await?;
        Ok(records.into_iter().map(WritingRecord::from).collect())
    }

    /// Record that `author_id` wrote `book_id`. Both must exist.
    pub async fn writed_book(&self, author_id: &str, book_id: &str) -> Result<WritingRecord> {
        let record = merge_edge(
            self.executor.as_ref(),
            AUTHOR_WRITES.shape,
            false,
            author_id,
            book_id,
            Properties::new(),
        )
        .await?;
        info!(author_id, book_id, "linked author and book");
        Ok(record.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{MemoryGraph, Seed};
    use crate::order::Direction;
    use crate::CatalogError;
    use serde_json::json;

    fn service() -> AuthorsService {
        AuthorsService::new(Arc::new(
            MemoryGraph::from_seed(
                Seed::default()
                    .node(NodeLabel::Author, "author1", json!({"name": "B"}))
                    .node(NodeLabel::Author, "author2", json!({"name": "A"}))
                    .node(NodeLabel::Book, "book1", json!({"title": "A"}))
                    .node(NodeLabel::Book, "book2", json!({"title": "B"}))
                    .node(NodeLabel::Book, "book3", json!({"title": "C"}))
                    .edge(EdgeType::WritedBook, "author1", "book1", json!({}))
                    .edge(EdgeType::WritedBook, "author1", "book2", json!({}))
                    .edge(EdgeType::WritedBook, "author1", "book3", json!({}))
                    .edge(EdgeType::WritedBook, "author2", "book1", json!({})),
            )
            .unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_writes_excludes_and_counts() {
        let service = service();
        let page = service
            .writes(
                "author1",
                Pagination::new(0, 3),
                &["book2".to_string()],
                &OrderSpec::new().then("title", Direction::Asc),
            )
            .await
            .unwrap();
        let books: Vec<&str> = page.nodes.iter().map(|r| r.book_id.as_str()).collect();
        assert_eq!(books, vec!["book1", "book3"]);
        assert!(page.nodes.iter().all(|r| r.author_id.as_str() == "author1"));
        assert_eq!(page.count, 2);
        assert!(!page.has_previous);
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn test_writes_requires_author() {
        let err = service()
            .writes("author9", Pagination::new(0, 3), &[], &OrderSpec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { label: NodeLabel::Author, .. }));
    }

    #[tokio::test]
    async fn test_writers_of_book_ordered_by_name() {
        let service = service();
        let writers = service
            .writers_of_book("book1", &OrderSpec::new().then("name", Direction::Asc))
            .await
            .unwrap();
        let authors: Vec<&str> = writers.iter().map(|r| r.author_id.as_str()).collect();
        assert_eq!(authors, vec!["author2", "author1"]);
        assert!(writers.iter().all(|r| r.book_id.as_str() == "book1"));

        assert!(service
            .writers_of_book("book9", &OrderSpec::new())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_create_then_link() {
        let service = service();
        let author = service.create("Octavia").await.unwrap();
        let record = service.writed_book(&author.id, "book3").await.unwrap();
        assert_eq!(record.author_id, author.id);

        let page = service
            .writes(&author.id, Pagination::new(0, 10), &[], &OrderSpec::new())
            .await
            .unwrap();
        assert_eq!(page.count, 1);

        assert!(service.writed_book(&author.id, "book9").await.is_err());
    }
}
