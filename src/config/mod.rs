// Configuration management module
// TOML settings stored under the application base directory

pub mod display;
pub mod settings;

pub use display::show_config;
pub use settings::{
    AnswerConfig, BASE_DIR_ENV, CatalogConfig, Config, ConfigError, CredentialsConfig,
    EmbeddingBackend, EmbeddingConfig, ServerConfig, StorageConfig,
};

