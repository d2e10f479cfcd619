//! Command line and environment configuration

pub use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::{CatalogError, Result};

pub const DEFAULT_LISTEN: &str = "127.0.0.1:4001";
pub const DEFAULT_GRAPHQL_PATH: &str = "/graphql";

#[derive(Debug, Parser, Clone)]
#[command(
    name = "bookshelf-catalog",
    about = "Federated GraphQL catalog of books, authors, series, labels and reading state"
)]
pub struct CatalogConfig {
    #[arg(long, env = "CATALOG_LISTEN", default_value = DEFAULT_LISTEN, help = "Address the GraphQL server binds to.")]
    pub listen: SocketAddr,
    #[arg(long, env = "CATALOG_SEED", help = "JSON file of nodes and edges loaded into the graph at startup.")]
    pub seed: Option<PathBuf>,
    #[arg(long, env = "CATALOG_GRAPHQL_PATH", default_value = DEFAULT_GRAPHQL_PATH, help = "Route serving GraphQL and GraphiQL.")]
    pub graphql_path: String,
}

impl CatalogConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.graphql_path.starts_with('/') {
            return Err(CatalogError::Config(format!(
                "graphql path must start with '/', got `{}`",
                self.graphql_path
            )));
        }
        Ok(())
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 4001)),
            seed: None,
            graphql_path: DEFAULT_GRAPHQL_PATH.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::try_parse_from(["bookshelf-catalog"]).unwrap();
        assert_eq!(config.listen, DEFAULT_LISTEN.parse().unwrap());
        assert_eq!(config.listen, CatalogConfig::default().listen);
        assert_eq!(config.graphql_path, "/graphql");
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags() {
        let config = CatalogConfig::try_parse_from([
            "bookshelf-catalog",
            "--listen",
            "0.0.0.0:8080",
            "--seed",
            "fixtures/shelf.json",
            "--graphql-path",
            "/api",
        ])
        .unwrap();
        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.seed, Some(PathBuf::from("fixtures/shelf.json")));
        assert_eq!(config.graphql_path, "/api");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(CatalogConfig::try_parse_from(["bookshelf-catalog", "--listen", "nowhere"]).is_err());

        let config = CatalogConfig::try_parse_from(["bookshelf-catalog", "--graphql-path", "graphql"]).unwrap();
        assert!(matches!(config.validate(), Err(CatalogError::Config(_))));
    }
}
