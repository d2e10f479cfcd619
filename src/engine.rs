//! Paginated relationship traversal.
//!
//! Every paginated listing in the catalog is an [`EdgeListing`]: a fixed
//! relationship shape, optional predicate refinements, a sort allow-list and
//! a policy for a missing anchor. [`PaginatedEdgeQuery`] turns one listing
//! plus request arguments into a page query and a count query over the same
//! predicate, runs both, and assembles a [`PageEnvelope`].
//!
//! The two reads are not isolated from each other. A concurrent write can
//! land between them, so `count` may briefly disagree with the page
//! contents.

use std::sync::Arc;

use crate::edge::EdgeRecord;
use crate::graph::query::{self, EdgePattern, GraphQuery, Refinement, RelationshipShape};
use crate::graph::{ExecutorError, GraphQueryExecutor, Params, Row};
use crate::order::{OrderSpec, SortableField};
use crate::pagination::{PageEnvelope, PageMeta, Pagination};
use crate::{CatalogError, Result};

/// What a listing does when its anchor node does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorPolicy {
    /// Fail with [`CatalogError::NotFound`]
    RequireExisting,
    /// Return an empty page with `count = 0`
    EmptyWhenMissing,
}

/// Static configuration of one paginated relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeListing {
    pub shape: RelationshipShape,
    pub refinements: &'static [Refinement],
    pub sortable: &'static [SortableField],
    pub anchor_policy: AnchorPolicy,
}

impl EdgeListing {
    fn pattern(&self, exclusion: bool) -> EdgePattern {
        EdgePattern {
            shape: self.shape,
            refinements: self.refinements,
            exclusion,
        }
    }
}

/// Runs [`EdgeListing`]s against a graph store
#[derive(Clone)]
pub struct PaginatedEdgeQuery {
    executor: Arc<dyn GraphQueryExecutor>,
}

impl PaginatedEdgeQuery {
    pub fn new(executor: Arc<dyn GraphQueryExecutor>) -> Self {
        Self { executor }
    }

    /// One page of `listing` from `anchor_id`.
    ///
    /// `exclude` removes target ids from both the page and the count. The
    /// ordering is validated against the listing's allow-list before any
    /// query runs.
    pub async fn page(
        &self,
        anchor_id: &str,
        listing: &EdgeListing,
        pagination: Pagination,
        exclude: &[String],
        order: &OrderSpec,
    ) -> Result<PageEnvelope<EdgeRecord>> {
        let order = order.resolve(listing.sortable)?;

        if anchor_id.is_empty() {
            return self.missing_anchor(listing, anchor_id);
        }

        let pattern = listing.pattern(!exclude.is_empty());
        let page_query = GraphQuery::EdgePage { pattern, order };
        let count_query = GraphQuery::EdgeCount(pattern);
        let params = Params::new()
            .bind(query::ANCHOR_ID, anchor_id)
            .bind(query::EXCEPT, exclude.to_vec())
            .bind(query::SKIP, pagination.skip)
            .bind(query::LIMIT, pagination.limit);

        let (anchor_exists, rows, counted) = tokio::try_join!(
            self.anchor_exists(listing, anchor_id),
            self.executor.read(&page_query, &params),
            self.executor.read(&count_query, &params),
        )?;

        if !anchor_exists {
            return self.missing_anchor(listing, anchor_id);
        }

        let count = read_count(&counted)?;

        let nodes = rows
            .iter()
            .map(|row| EdgeRecord::from_row(row, listing.shape.orientation))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(PageEnvelope::new(nodes, PageMeta::compute(count, pagination)))
    }

    /// Every matching record of `listing`, ordered, without pagination
    pub async fn list(
        &self,
        anchor_id: &str,
        listing: &EdgeListing,
        order: &OrderSpec,
    ) -> Result<Vec<EdgeRecord>> {
        let order = order.resolve(listing.sortable)?;
        let list_query = GraphQuery::EdgeList {
            pattern: listing.pattern(false),
            order,
        };
        let params = Params::new().bind(query::ANCHOR_ID, anchor_id);

        let (anchor_exists, rows) = tokio::try_join!(
            self.anchor_exists(listing, anchor_id),
            self.executor.read(&list_query, &params),
        )?;

        if !anchor_exists {
            return self.missing_anchor(listing, anchor_id).map(|page| page.nodes);
        }

        rows.iter()
            .map(|row| EdgeRecord::from_row(row, listing.shape.orientation))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(CatalogError::from)
    }

    async fn anchor_exists(
        &self,
        listing: &EdgeListing,
        anchor_id: &str,
    ) -> std::result::Result<bool, ExecutorError> {
        match listing.anchor_policy {
            AnchorPolicy::EmptyWhenMissing => Ok(true),
            AnchorPolicy::RequireExisting => self
                .executor
                .read(
                    &GraphQuery::FindNode(listing.shape.anchor),
                    &Params::new().bind(query::ID, anchor_id),
                )
                .await
                .map(|rows| !rows.is_empty()),
        }
    }

    fn missing_anchor(
        &self,
        listing: &EdgeListing,
        anchor_id: &str,
    ) -> Result<PageEnvelope<EdgeRecord>> {
        match listing.anchor_policy {
            AnchorPolicy::RequireExisting => Err(CatalogError::NotFound {
                label: listing.shape.anchor,
                id: anchor_id.to_string(),
            }),
            AnchorPolicy::EmptyWhenMissing => Ok(PageEnvelope::empty()),
        }
    }
}

/// The `count` of a count query's single row
pub(crate) fn read_count(rows: &[Row]) -> std::result::Result<u64, ExecutorError> {
    rows.first()
        .ok_or_else(|| ExecutorError::MalformedRow("count query returned no rows".to_string()))?
        .scalar("count")?
        .as_u64()
        .ok_or_else(|| ExecutorError::MalformedRow("count is not a non-negative integer".to_string()))
}
