//! HTTP surface: axum router, GraphQL handler and viewer extraction

use async_graphql::http::GraphiQLSource;
use async_graphql::{Request, Response};
use axum::{
    extract::Extension,
    http::HeaderMap,
    response::Html,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::catalog::Catalog;
use crate::config::CatalogConfig;
use crate::graph::GraphQueryExecutor;
use crate::schema::{self, build_schema, CatalogSchema, Viewer};
use crate::Result;

pub const VIEWER_HEADER: &str = "x-user-id";

/// Extract the viewer id from the `x-user-id` header
pub fn extract_viewer(headers: &HeaderMap) -> Option<Viewer> {
    headers
        .get(VIEWER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Viewer(s.to_string()))
}

/// GraphQL handler attaching request loaders and the viewer
pub async fn graphql_handler(
    Extension(schema): Extension<CatalogSchema>,
    Extension(catalog): Extension<Catalog>,
    headers: HeaderMap,
    Json(request): Json<Request>,
) -> Json<Response> {
    let viewer = extract_viewer(&headers);
    Json(schema::execute(&schema, &catalog, request, viewer).await)
}

pub fn router(graphql_path: &str, catalog: Catalog) -> Router {
    let schema = build_schema(catalog.clone());
    let graphiql = GraphiQLSource::build().endpoint(graphql_path).finish();

    Router::new()
        .route(
            graphql_path,
            get(move || {
                let page = graphiql.clone();
                async move { Html(page) }
            })
            .post(graphql_handler),
        )
        .layer(Extension(schema))
        .layer(Extension(catalog))
}

/// Bind and serve until the process is stopped
pub async fn serve(config: &CatalogConfig, executor: Arc<dyn GraphQueryExecutor>) -> Result<()> {
    config.validate()?;

    let app = router(&config.graphql_path, Catalog::new(executor));
    let listener = TcpListener::bind(config.listen).await?;
    info!(listen = %config.listen, path = %config.graphql_path, "catalog listening");

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_viewer() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_viewer(&headers), None);

        headers.insert(VIEWER_HEADER, HeaderValue::from_static("  "));
        assert_eq!(extract_viewer(&headers), None);

        headers.insert(VIEWER_HEADER, HeaderValue::from_static("user1"));
        assert_eq!(extract_viewer(&headers), Some(Viewer("user1".to_string())));
    }
}
