//! Apollo Federation v2 utilities

use async_trait::async_trait;

use crate::catalog::FromNode;
use crate::dataloaders::NodeLoader;
use crate::{CatalogError, Result};

/// Entity resolver trait for Apollo Federation
#[async_trait]
pub trait EntityResolver<E>: Send + Sync {
    /// Resolve an entity reference by its `id` key
    async fn resolve_reference(&self, id: &str) -> Result<E>;
}

#[async_trait]
impl<E> EntityResolver<E> for NodeLoader<E>
where
    E: FromNode + Clone + Send + Sync + 'static,
{
    async fn resolve_reference(&self, id: &str) -> Result<E> {
        self.load_one(id.to_string())
            .await?
            .ok_or_else(|| CatalogError::NotFound {
                label: E::LABEL,
                id: id.to_string(),
            })
    }
}
