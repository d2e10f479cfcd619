use std::sync::Arc;
use tracing::info;

use super::records::{HaveBookRecord, ReadBookRecord, ReadingBookRecord, StackedBookRecord, WishReadBookRecord};
use super::{find_all, find_by_id, merge_edge, User};
use crate::edge::EdgeRecord;
use crate::engine::{AnchorPolicy, EdgeListing, PaginatedEdgeQuery};
use crate::graph::{EdgeType, GraphQueryExecutor, NodeLabel, Properties, Refinement, RelationshipShape};
use crate::order::{OrderSpec, PropertyRef, SortableField};
use crate::pagination::{PageEnvelope, Pagination};
use crate::types::DateTime;
use crate::Result;

const BY_UPDATED_AT: &[SortableField] = &[SortableField::new("updatedAt", PropertyRef::edge("updatedAt"))];

// User nodes are merged lazily by the first reading-state write, so every
// user listing treats a missing user as an empty shelf.

pub const HAVE_BOOKS: EdgeListing = EdgeListing {
    shape: RelationshipShape::outgoing(NodeLabel::User, EdgeType::HasBook, NodeLabel::Book),
    refinements: &[Refinement::EdgeFlag {
        property: "have",
        value: true,
    }],
    sortable: BY_UPDATED_AT,
    anchor_policy: AnchorPolicy::EmptyWhenMissing,
};

pub const READING_BOOKS: EdgeListing = EdgeListing {
    shape: RelationshipShape::outgoing(NodeLabel::User, EdgeType::IsReadingBook, NodeLabel::Book),
    refinements: &[Refinement::EdgeFlag {
        property: "reading",
        value: true,
    }],
    sortable: BY_UPDATED_AT,
    anchor_policy: AnchorPolicy::EmptyWhenMissing,
};

pub const WISH_READ_BOOKS: EdgeListing = EdgeListing {
    shape: RelationshipShape::outgoing(NodeLabel::User, EdgeType::WishesToReadBook, NodeLabel::Book),
    refinements: &[Refinement::EdgeFlag {
        property: "wish",
        value: true,
    }],
    sortable: BY_UPDATED_AT,
    anchor_policy: AnchorPolicy::EmptyWhenMissing,
};

/// Books the user has a `HAS_BOOK` edge to but no `READ_BOOK` edge
pub const STACKED_BOOKS: EdgeListing = EdgeListing {
    shape: RelationshipShape::outgoing(NodeLabel::User, EdgeType::HasBook, NodeLabel::Book),
    refinements: &[Refinement::MissingEdge(EdgeType::ReadBook)],
    sortable: BY_UPDATED_AT,
    anchor_policy: AnchorPolicy::EmptyWhenMissing,
};

pub const READ_BOOKS: EdgeListing = EdgeListing {
    shape: RelationshipShape::outgoing(NodeLabel::User, EdgeType::ReadBook, NodeLabel::Book),
    refinements: &[],
    sortable: &[
        SortableField::new("date", PropertyRef::edge("recentReadAt")),
        SortableField::new("title", PropertyRef::target("title")),
    ],
    anchor_policy: AnchorPolicy::EmptyWhenMissing,
};

#[derive(Clone)]
pub struct UsersService {
    executor: Arc<dyn GraphQueryExecutor>,
    edges: PaginatedEdgeQuery,
}

impl UsersService {
    pub fn new(executor: Arc<dyn GraphQueryExecutor>) -> Self {
        Self {
            edges: PaginatedEdgeQuery::new(executor.clone()),
            executor,
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<User> {
        find_by_id(self.executor.as_ref(), id).await
    }

    pub async fn find_all(&self) -> Result<Vec<User>> {
        find_all(self.executor.as_ref()).await
    }

    pub async fn have_books(
        &self,
        user_id: &str,
        pagination: Pagination,
        order: &OrderSpec,
    ) -> Result<PageEnvelope<HaveBookRecord>> {
        let page = self.edges.page(user_id, &HAVE_BOOKS, pagination, &[], order).await?;
        Ok(page.try_map(HaveBookRecord::try_from)?)
    }

    pub async fn reading_books(
        &self,
        user_id: &str,
        pagination: Pagination,
        order: &OrderSpec,
    ) -> Result<PageEnvelope<ReadingBookRecord>> {
        let page = self.edges.page(user_id, &READING_BOOKS, pagination, &[], order).await?;
        Ok(page.try_map(ReadingBookRecord::try_from)?)
    }

    pub async fn wish_read_books(
        &self,
        user_id: &str,
        pagination: Pagination,
        order: &OrderSpec,
    ) -> Result<PageEnvelope<WishReadBookRecord>> {
        let page = self.edges.page(user_id, &WISH_READ_BOOKS, pagination, &[], order).await?;
        Ok(page.try_map(WishReadBookRecord::try_from)?)
    }

    pub async fn stacked_books(
        &self,
        user_id: &str,
        pagination: Pagination,
        order: &OrderSpec,
    ) -> Result<PageEnvelope<StackedBookRecord>> {
        let page = self.edges.page(user_id, &STACKED_BOOKS, pagination, &[], order).await?;
        Ok(page.map(StackedBookRecord::from))
    }

    pub async fn read_books(
        &self,
        user_id: &str,
        pagination: Pagination,
        order: &OrderSpec,
    ) -> Result<PageEnvelope<ReadBookRecord>> {
        let page = self.edges.page(user_id, &READ_BOOKS, pagination, &[], order).await?;
        Ok(page.map(ReadBookRecord::from))
    }

    pub async fn set_have_book(&self, user_id: &str, book_id: &str, have: bool) -> Result<HaveBookRecord> {
        let record = self.set_flag(&HAVE_BOOKS, "have", user_id, book_id, have).await?;
        Ok(HaveBookRecord::try_from(record)?)
    }

    pub async fn set_reading_book(&self, user_id: &str, book_id: &str, reading: bool) -> Result<ReadingBookRecord> {
        let record = self.set_flag(&READING_BOOKS, "reading", user_id, book_id, reading).await?;
        Ok(ReadingBookRecord::try_from(record)?)
    }

    pub async fn set_wish_read_book(&self, user_id: &str, book_id: &str, wish: bool) -> Result<WishReadBookRecord> {
        let record = self.set_flag(&WISH_READ_BOOKS, "wish", user_id, book_id, wish).await?;
        Ok(WishReadBookRecord::try_from(record)?)
    }

    /// Replace the relationship's properties with `{flag: value, updatedAt: now}`.
    /// The user is created if absent, the book must exist.
    async fn set_flag(
        &self,
        listing: &EdgeListing,
        flag: &str,
        user_id: &str,
        book_id: &str,
        value: bool,
    ) -> Result<EdgeRecord> {
        let mut props = Properties::new();
        props.insert(flag.to_string(), value.into());
        props.insert("updatedAt".to_string(), DateTime::now().to_property());

        let record = merge_edge(self.executor.as_ref(), listing.shape, true, user_id, book_id, props).await?;
        info!(user_id, book_id, edge = %listing.shape.edge, value, "updated reading state");
        Ok(record)
    }
}
