use thiserror::Error;

pub type Result<T> = std::result::Result<T, MotofixError>;

#[derive(Error, Debug)]
pub enum MotofixError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Index error: {0}")]
    Index(#[from] store::IndexError),

    #[error("Provider error: {0}")]
    Provider(#[from] embeddings::ProviderError),

    #[error("{0}")]
    Resolve(#[from] resolver::ResolveError),

    #[error("Search error: {0}")]
    Search(#[from] search::SearchError),

    #[error("Build error: {0}")]
    Build(#[from] indexer::BuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod answer;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod indexer;
pub mod resolver;
pub mod search;
pub mod server;
pub mod store;
