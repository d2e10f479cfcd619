use std::sync::Arc;
use tracing::info;

use super::records::{ChainedBookRecord, NextBookRecord, SeriesHeadRecord, SeriesPartRecord};
use super::{create, find_all, find_by_id, merge_edge, Book, Series};
use crate::edge::EdgeRecord;
use crate::engine::{read_count, AnchorPolicy, EdgeListing, PaginatedEdgeQuery};
use crate::graph::query::{self, ChainWalk, GraphQuery, Orientation, Refinement};
use crate::graph::{
    EdgeType, ExecutorError, ExecutorResult, GraphQueryExecutor, NodeLabel, Params, Properties,
    RelationshipShape, Row,
};
use crate::order::{OrderSpec, PropertyRef, SortableField};
use crate::pagination::{PageEnvelope, PageMeta, Pagination};
use crate::Result;

/// Books that are parts of a series
pub const SERIES_PARTS: EdgeListing = EdgeListing {
    shape: RelationshipShape::outgoing(NodeLabel::Series, EdgeType::PartOfSeries, NodeLabel::Book),
    refinements: &[],
    sortable: &[
        SortableField::new("volume", PropertyRef::edge("volume")),
        SortableField::new("title", PropertyRef::target("title")),
    ],
    anchor_policy: AnchorPolicy::RequireExisting,
};

/// Parts that are not on the chain starting at the series head
pub const SERIES_SUB_PARTS: EdgeListing = EdgeListing {
    refinements: &[Refinement::OffChain {
        head: EdgeType::HeadOfSeries,
        step: EdgeType::NextBook,
    }],
    ..SERIES_PARTS
};

/// The first book of a series chain
pub const SERIES_HEAD: EdgeListing = EdgeListing {
    shape: RelationshipShape::outgoing(NodeLabel::Series, EdgeType::HeadOfSeries, NodeLabel::Book),
    refinements: &[],
    sortable: &[],
    anchor_policy: AnchorPolicy::RequireExisting,
};

pub const NEXT_BOOK: RelationshipShape =
    RelationshipShape::outgoing(NodeLabel::Book, EdgeType::NextBook, NodeLabel::Book);

fn chain(toward: Orientation) -> ChainWalk {
    ChainWalk {
        label: NodeLabel::Book,
        step: EdgeType::NextBook,
        toward,
    }
}

fn node_id(row: &Row, alias: &str) -> ExecutorResult<String> {
    row.node(alias)?
        .id()
        .map(str::to_string)
        .ok_or_else(|| ExecutorError::MalformedRow(format!("node `{}` has no id", alias)))
}

#[derive(Clone)]
pub struct SeriesService {
    executor: Arc<dyn GraphQueryExecutor>,
    edges: PaginatedEdgeQuery,
}

impl SeriesService {
    pub fn new(executor: Arc<dyn GraphQueryExecutor>) -> Self {
        Self {
            edges: PaginatedEdgeQuery::new(executor.clone()),
            executor,
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Series> {
        find_by_id(self.executor.as_ref(), id).await
    }

    pub async fn find_all(&self) -> Result<Vec<Series>> {
        find_all(self.executor.as_ref()).await
    }

    pub async fn create(&self, title: &str) -> Result<Series> {
        let mut props = Properties::new();
        props.insert("title".to_string(), title.into());
        let series: Series = create(self.executor.as_ref(), props).await?;
        info!(series_id = %series.id.as_str(), "created series");
        Ok(series)
    }

    pub async fn parts(
        &self,
        series_id: &str,
        pagination: Pagination,
        except: &[String],
        order: &OrderSpec,
    ) -> Result<PageEnvelope<SeriesPartRecord>> {
        let page = self
            .edges
            .page(series_id, &SERIES_PARTS, pagination, except, order)
            .await?;
        Ok(page.map(SeriesPartRecord::from))
    }

    /// Parts of `series_id` off its head chain, such as side stories
    pub async fn sub_parts(
        &self,
        series_id: &str,
        pagination: Pagination,
        except: &[String],
        order: &OrderSpec,
    ) -> Result<PageEnvelope<SeriesPartRecord>> {
        let page = self
            .edges
            .page(series_id, &SERIES_SUB_PARTS, pagination, except, order)
            .await?;
        Ok(page.map(SeriesPartRecord::from))
    }

    /// The first book of the series chain, `None` when no head is set
    pub async fn head(&self, series_id: &str) -> Result<Option<SeriesHeadRecord>> {
        let heads = self.edges.list(series_id, &SERIES_HEAD, &OrderSpec::new()).await?;
        Ok(heads.into_iter().next().map(SeriesHeadRecord::from))
    }

    /// Every series `book_id` belongs to, by series title.
    ///
    /// A book belongs to a series when the series lists it as a part, or when
    /// it lies on the `NEXT_BOOK` chain starting at the series head. Volume
    /// and numbering come from the part relationship and are empty without
    /// one.
    pub async fn series_of_book(&self, book_id: &str) -> Result<Vec<SeriesPartRecord>> {
        let rows = self
            .executor
            .read(&GraphQuery::SeriesOfBook, &Params::new().bind(query::ID, book_id))
            .await?;
        let records = rows
            .iter()
            .map(|row| -> ExecutorResult<SeriesPartRecord> {
                let part = match row.get("r") {
                    Some(_) => Some(EdgeRecord::from_row(row, Orientation::Outgoing)?),
                    None => None,
                };
                Ok(SeriesPartRecord::on_chain(node_id(row, "a")?, node_id(row, "b")?, part))
            })
            .collect::<ExecutorResult<Vec<_>>>()?;
        Ok(records)
    }

    /// Books after `book_id` along `NEXT_BOOK`, nearest first
    pub async fn next_books(&self, book_id: &str, pagination: Pagination) -> Result<PageEnvelope<ChainedBookRecord>> {
        self.walk(book_id, chain(Orientation::Outgoing), pagination).await
    }

    /// Books before `book_id` along `NEXT_BOOK`, nearest first
    pub async fn previous_books(
        &self,
        book_id: &str,
        pagination: Pagination,
    ) -> Result<PageEnvelope<ChainedBookRecord>> {
        self.walk(book_id, chain(Orientation::Incoming), pagination).await
    }

    async fn walk(
        &self,
        book_id: &str,
        walk: ChainWalk,
        pagination: Pagination,
    ) -> Result<PageEnvelope<ChainedBookRecord>> {
        let params = Params::new()
            .bind(query::ANCHOR_ID, book_id)
            .bind(query::SKIP, pagination.skip)
            .bind(query::LIMIT, pagination.limit);
        let page_query = GraphQuery::ChainPage(walk);
        let count_query = GraphQuery::ChainCount(walk);
        let (rows, counted) = tokio::try_join!(
            self.executor.read(&page_query, &params),
            self.executor.read(&count_query, &params),
        )?;

        let nodes = rows
            .iter()
            .map(|row| -> ExecutorResult<ChainedBookRecord> {
                let distance = row
                    .scalar("distance")?
                    .as_i64()
                    .ok_or_else(|| ExecutorError::MalformedRow("distance is not an integer".to_string()))?;
                Ok(ChainedBookRecord {
                    book_id: node_id(row, "b")?.into(),
                    distance,
                })
            })
            .collect::<ExecutorResult<Vec<_>>>()?;
        Ok(PageEnvelope::new(nodes, PageMeta::compute(read_count(&counted)?, pagination)))
    }

    /// Create a series whose chain starts at `book_id`
    pub async fn create_from_book(&self, book_id: &str, title: &str) -> Result<SeriesHeadRecord> {
        find_by_id::<Book>(self.executor.as_ref(), book_id).await?;
        let series = self.create(title).await?;
        let record = merge_edge(
            self.executor.as_ref(),
            SERIES_HEAD.shape,
            false,
            &series.id,
            book_id,
            Properties::new(),
        )
        .await?;
        Ok(record.into())
    }

    /// Link `next_id` as the book directly after `previous_id`
    pub async fn connect_books_as_next_book(&self, previous_id: &str, next_id: &str) -> Result<NextBookRecord> {
        let record = merge_edge(
            self.executor.as_ref(),
            NEXT_BOOK,
            false,
            previous_id,
            next_id,
            Properties::new(),
        )
        .await?;
        info!(previous_id, next_id, "connected books as next book");
        Ok(record.into())
    }

    /// Make `book_id` a part of `series_id`, replacing any previous volume
    /// and numbering of that pair.
    pub async fn connect_series_and_book(
        &self,
        series_id: &str,
        book_id: &str,
        volume: Option<i64>,
        numbering_as: Option<String>,
    ) -> Result<SeriesPartRecord> {
        let mut props = Properties::new();
        if let Some(volume) = volume {
            props.insert("volume".to_string(), volume.into());
        }
        if let Some(numbering_as) = numbering_as {
            props.insert("numberingAs".to_string(), numbering_as.into());
        }
        let record = merge_edge(
            self.executor.as_ref(),
            SERIES_PARTS.shape,
            false,
            series_id,
            book_id,
            props,
        )
        .await?;
        info!(series_id, book_id, "connected series and book");
        Ok(record.into())
    }
}
