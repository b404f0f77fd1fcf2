use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use super::{Config, EmbeddingBackend};

#[inline]
pub fn show_config(base_dir: &Path) -> Result<()> {
    let config = Config::load(base_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Embeddings:").bold().yellow());
    let provider = match config.embedding.provider {
        EmbeddingBackend::OpenAi => "openai",
        EmbeddingBackend::Ollama => "ollama",
    };
    eprintln!("  Provider: {}", style(provider).cyan());
    eprintln!("  Model: {}", style(&config.embedding.model).cyan());
    match config.embedding_url() {
        Ok(url) => eprintln!("  Endpoint: {}", style(url).cyan()),
        Err(e) => eprintln!("  Endpoint: {} ({})", style("Invalid").red(), e),
    }
    eprintln!("  Batch Size: {}", style(config.embedding.batch_size).cyan());

    eprintln!();
    eprintln!("{}", style("Answers:").bold().yellow());
    eprintln!("  Model: {}", style(&config.answer.model).cyan());
    eprintln!("  Temperature: {}", style(config.answer.temperature).cyan());
    eprintln!("  Max Tokens: {}", style(config.answer.max_tokens).cyan());

    eprintln!();
    eprintln!("{}", style("Retrieval:").bold().yellow());
    eprintln!(
        "  Chunking: {} chars, {} overlap",
        style(config.chunking.chunk_size).cyan(),
        style(config.chunking.chunk_overlap).cyan()
    );
    eprintln!("  Top K: {}", style(config.server.top_k).cyan());
    eprintln!(
        "  Brand Prefix: {}",
        style(&config.catalog.brand_prefix).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Server:").bold().yellow());
    eprintln!(
        "  Listen: {}:{}",
        style(&config.server.host).cyan(),
        style(config.server.port).cyan()
    );
    if config.server.cors_origins.is_empty() {
        eprintln!("  CORS: {}", style("any origin").cyan());
    } else {
        eprintln!(
            "  CORS: {}",
            style(config.server.cors_origins.join(", ")).cyan()
        );
    }

    eprintln!();
    eprintln!("{}", style("Storage:").bold().yellow());
    eprintln!(
        "  Indexes: {}",
        style(config.vectors_path().display()).cyan()
    );
    eprintln!(
        "  Manuals: {}",
        style(config.manuals_path().display()).cyan()
    );

    eprintln!();
    let credential = if config.api_key().is_ok() {
        style("set").green()
    } else {
        style("missing").red()
    };
    eprintln!(
        "API key ({}): {}",
        config.credentials.api_key_env, credential
    );
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}
