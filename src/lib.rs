//! # bookshelf-catalog
//!
//! Federated GraphQL catalog service over a property graph of books,
//! authors, series, labels and users.
//!
//! ## Features
//!
//! - **Paginated Edge Queries** - one engine behind every `skip`/`limit` relationship listing
//! - **Allow-listed Ordering** - composite sort keys resolved against fixed per-listing tables
//! - **Federation** - every entity type resolvable by reference
//! - **DataLoader** - one batched node lookup per label for each page a request resolves
//! - **In-memory Graph** - a merge-semantics store for tests and standalone runs
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bookshelf_catalog::{Catalog, MemoryGraph, OrderSpec, Direction, Pagination};
//!
//! # async fn example() -> bookshelf_catalog::Result<()> {
//! let catalog = Catalog::new(Arc::new(MemoryGraph::new()));
//! let page = catalog
//!     .labels
//!     .labeled_books("label1", Pagination::new(0, 10), &[], &OrderSpec::new().then("title", Direction::Asc))
//!     .await?;
//! println!("{} of {}", page.nodes.len(), page.count);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod dataloaders;
pub mod edge;
pub mod engine;
pub mod federation;
pub mod graph;
pub mod order;
pub mod pagination;
pub mod schema;
pub mod server;
pub mod types;

pub use catalog::Catalog;
pub use config::CatalogConfig;
pub use dataloaders::{NodeBatchLoader, NodeLoader, NodeLoaders};
pub use edge::EdgeRecord;
pub use engine::{AnchorPolicy, EdgeListing, PaginatedEdgeQuery};
pub use federation::EntityResolver;
pub use graph::{GraphQueryExecutor, MemoryGraph, NodeLabel};
pub use order::{Direction, OrderSpec, SortableField};
pub use pagination::{PageEnvelope, PageMeta, Pagination};
pub use schema::{build_schema, CatalogSchema};
pub use types::DateTime;

use async_graphql::ErrorExtensions;
use thiserror::Error;

use graph::ExecutorError;

/// Catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Not Found: {label} {id}")]
    NotFound { label: NodeLabel, id: String },

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("Graph store failure: {0}")]
    Executor(#[from] ExecutorError),

    #[error("Invalid seed data: {0}")]
    Seed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// Machine-readable code attached to GraphQL errors
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::NotFound { .. } => "NOT_FOUND",
            CatalogError::InvalidOrder(_) => "INVALID_ORDER",
            CatalogError::InvalidPagination(_) => "INVALID_PAGINATION",
            CatalogError::Executor(_) => "EXECUTOR_FAILURE",
            CatalogError::Seed(_) => "SEED",
            CatalogError::Config(_) => "CONFIG",
            CatalogError::Io(_) => "IO",
        }
    }
}

impl ErrorExtensions for CatalogError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", self.code()))
    }
}

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;
