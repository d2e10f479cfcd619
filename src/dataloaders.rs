//! DataLoader utilities for batch loading
//!
//! Resolvers that fan out from a page of records to the nodes at either end
//! go through a per-request [`NodeLoader`]. Loads issued while one page is
//! resolving are collected by async-graphql's [`DataLoader`] and sent as a
//! single `FindNodes` read per node label.

use async_graphql::dataloader::{DataLoader, HashMapCache, Loader};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use crate::catalog::{self, Author, Book, FromNode, Label, Series, User};
use crate::graph::{ExecutorError, GraphQueryExecutor};

/// Loads entities of one node label by id
pub struct NodeBatchLoader<E> {
    executor: Arc<dyn GraphQueryExecutor>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> NodeBatchLoader<E> {
    pub fn new(executor: Arc<dyn GraphQueryExecutor>) -> Self {
        Self {
            executor,
            _entity: PhantomData,
        }
    }
}

impl<E> Loader<String> for NodeBatchLoader<E>
where
    E: FromNode + Clone + Send + Sync + 'static,
{
    type Value = E;
    type Error = ExecutorError;

    /// Keys with no node of this label are left out of the map
    async fn load(&self, keys: &[String]) -> Result<HashMap<String, E>, ExecutorError> {
        debug!(label = %E::LABEL, keys = keys.len(), "batched node lookup");
        let entities: Vec<E> = catalog::find_many(self.executor.as_ref(), keys).await?;
        Ok(entities
            .into_iter()
            .map(|entity| (entity.key().to_string(), entity))
            .collect())
    }
}

/// Batching, caching loader for one node label. Caches for its own
/// lifetime, so build one per request.
pub type NodeLoader<E> = DataLoader<NodeBatchLoader<E>, HashMapCache>;

fn node_loader<E>(executor: Arc<dyn GraphQueryExecutor>) -> NodeLoader<E>
where
    E: FromNode + Clone + Send + Sync + 'static,
{
    DataLoader::with_cache(NodeBatchLoader::new(executor), tokio::spawn, HashMapCache::default())
}

/// One loader per node label, attached to each GraphQL request
pub struct NodeLoaders {
    pub authors: NodeLoader<Author>,
    pub books: NodeLoader<Book>,
    pub labels: NodeLoader<Label>,
    pub series: NodeLoader<Series>,
    pub users: NodeLoader<User>,
}

impl NodeLoaders {
    pub fn new(executor: Arc<dyn GraphQueryExecutor>) -> Self {
        Self {
            authors: node_loader(executor.clone()),
            books: node_loader(executor.clone()),
            labels: node_loader(executor.clone()),
            series: node_loader(executor.clone()),
            users: node_loader(executor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ExecutorResult, GraphQuery, MemoryGraph, NodeLabel, Params, Row, Seed};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts `FindNodes` reads on the way to a [`MemoryGraph`]
    struct CountingGraph {
        inner: MemoryGraph,
        batches: AtomicUsize,
    }

    #[async_trait]
    impl GraphQueryExecutor for CountingGraph {
        async fn read(&self, graph_query: &GraphQuery, params: &Params) -> ExecutorResult<Vec<Row>> {
            if matches!(graph_query, GraphQuery::FindNodes(_)) {
                self.batches.fetch_add(1, Ordering::SeqCst);
            }
            self.inner.read(graph_query, params).await
        }

        async fn write(&self, graph_query: &GraphQuery, params: &Params) -> ExecutorResult<Vec<Row>> {
            self.inner.write(graph_query, params).await
        }
    }

    struct BrokenGraph;

    #[async_trait]
    impl GraphQueryExecutor for BrokenGraph {
        async fn read(&self, _graph_query: &GraphQuery, _params: &Params) -> ExecutorResult<Vec<Row>> {
            Err(ExecutorError::Unavailable("no store".to_string()))
        }

        async fn write(&self, _graph_query: &GraphQuery, _params: &Params) -> ExecutorResult<Vec<Row>> {
            Err(ExecutorError::Unavailable("no store".to_string()))
        }
    }

    fn counting() -> Arc<CountingGraph> {
        Arc::new(CountingGraph {
            inner: MemoryGraph::from_seed(
                Seed::default()
                    .node(NodeLabel::Book, "book1", json!({"title": "A"}))
                    .node(NodeLabel::Book, "book2", json!({"title": "B"}))
                    .node(NodeLabel::Book, "book3", json!({"title": "C"}))
                    .node(NodeLabel::Author, "author1", json!({"name": "N"})),
            )
            .unwrap(),
            batches: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_batch() {
        let graph = counting();
        let loaders = NodeLoaders::new(graph.clone());

        let (a, b, c) = tokio::join!(
            loaders.books.load_one("book1".to_string()),
            loaders.books.load_one("book2".to_string()),
            loaders.books.load_one("book3".to_string()),
        );
        assert_eq!(a.unwrap().and_then(|b| b.title).as_deref(), Some("A"));
        assert_eq!(b.unwrap().and_then(|b| b.title).as_deref(), Some("B"));
        assert_eq!(c.unwrap().and_then(|b| b.title).as_deref(), Some("C"));
        assert_eq!(graph.batches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_keys_skip_the_store() {
        let graph = counting();
        let loaders = NodeLoaders::new(graph.clone());

        loaders.books.load_one("book1".to_string()).await.unwrap();
        loaders.books.load_one("book1".to_string()).await.unwrap();
        assert_eq!(graph.batches.load(Ordering::SeqCst), 1);

        let books = loaders
            .books
            .load_many(vec!["book1".to_string(), "book2".to_string(), "author1".to_string()])
            .await
            .unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books["book2"].title.as_deref(), Some("B"));
        assert_eq!(graph.batches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_labels_are_kept_apart() {
        let loaders = NodeLoaders::new(counting());
        assert!(loaders.authors.load_one("book1".to_string()).await.unwrap().is_none());
        let author = loaders.authors.load_one("author1".to_string()).await.unwrap();
        assert_eq!(author.and_then(|a| a.name), Some("N".to_string()));
    }

    #[tokio::test]
    async fn test_store_failures_propagate() {
        let loaders = NodeLoaders::new(Arc::new(BrokenGraph));
        assert!(matches!(
            loaders.books.load_one("book1".to_string()).await,
            Err(ExecutorError::Unavailable(_))
        ));
    }

    #[test]
    fn test_blocking_load() {
        let graph = counting();
        let value = tokio_test::block_on(async {
            let loaders = NodeLoaders::new(graph.clone());
            loaders.books.load_one("book3".to_string()).await
        })
        .unwrap();
        assert_eq!(value.and_then(|b| b.title).as_deref(), Some("C"));
    }
}
