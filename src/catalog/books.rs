use std::sync::Arc;
use tracing::info;

use super::{create, find_all, find_by_id, Book};
use crate::graph::{GraphQueryExecutor, Properties};
use crate::Result;

#[derive(Clone)]
pub struct BooksService {
    executor: Arc<dyn GraphQueryExecutor>,
}

impl BooksService {
    pub fn new(executor: Arc<dyn GraphQueryExecutor>) -> Self {
        Self { executor }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Book> {
        find_by_id(self.executor.as_ref(), id).await
    }

    pub async fn find_all(&self) -> Result<Vec<Book>> {
        find_all(self.executor.as_ref()).await
    }

    pub async fn create(&self, title: &str) -> Result<Book> {
        let mut props = Properties::new();
        props.insert("title".to_string(), title.into());
        let book: Book = create(self.executor.as_ref(), props).await?;
        info!(book_id = %book.id.as_str(), "created book");
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{MemoryGraph, NodeLabel, Seed};
    use crate::CatalogError;
    use serde_json::json;

    #[tokio::test]
    async fn test_lookups() {
        let service = BooksService::new(Arc::new(
            MemoryGraph::from_seed(
                Seed::default()
                    .node(NodeLabel::Book, "1", json!({"title": "one"}))
                    .node(NodeLabel::Book, "2", json!({"title": "two"})),
            )
            .unwrap(),
        ));

        assert_eq!(service.find_by_id("1").await.unwrap().title.as_deref(), Some("one"));
        assert!(matches!(
            service.find_by_id("3").await,
            Err(CatalogError::NotFound { label: NodeLabel::Book, .. })
        ));

        service.create("three").await.unwrap();
        let all = service.find_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|b| b.title.as_deref() == Some("three")));
    }
}
