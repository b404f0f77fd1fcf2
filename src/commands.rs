use anyhow::{Context, Result, bail};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::answer::OpenAiChatClient;
use crate::config::Config;
use crate::embeddings::provider_from_config;
use crate::indexer::{BuildReport, IndexBuilder, discover_manuals};
use crate::server::{AppState, serve};
use crate::store::IndexStore;

/// Load and validate the configuration stored in `base_dir`
#[inline]
pub fn load_config(base_dir: &Path) -> Result<Config> {
    Config::load(base_dir).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            base_dir.display()
        )
    })
}

/// Build indexes for the manuals found in `manuals_dir` (or the configured directory).
///
/// With `model` set, only that manual is rebuilt. Fails when any manual fails to build.
#[inline]
pub fn build_indexes(
    base_dir: &Path,
    manuals_dir: Option<PathBuf>,
    model: Option<String>,
) -> Result<BuildReport> {
    let config = load_config(base_dir)?;
    let manuals_dir = manuals_dir.unwrap_or_else(|| config.manuals_path());

    let provider = provider_from_config(&config).context("Failed to initialize embedding provider")?;
    let store = IndexStore::new(config.vectors_path());

    let mut catalog = discover_manuals(&manuals_dir)
        .with_context(|| format!("Failed to scan manuals in {}", manuals_dir.display()))?;
    if let Some(model) = &model {
        catalog = catalog.select(model);
        if catalog.is_empty() {
            bail!(
                "No manual for model '{}' in {}",
                model,
                manuals_dir.display()
            );
        }
    }

    if catalog.is_empty() {
        println!("No manuals found in {}", manuals_dir.display());
        println!("Add one .txt file per model and run 'motofix build' again.");
        return Ok(BuildReport::default());
    }

    info!(
        "Building {} indexes with {} into {}",
        catalog.len(),
        provider.model_id(),
        store.base_dir().display()
    );

    let bar = if console::user_attended_stderr() {
        let bar = ProgressBar::new(catalog.len() as u64);
        if let Ok(bar_style) = ProgressStyle::with_template("{bar:30} [{pos}/{len}] {msg}") {
            bar.set_style(bar_style);
        }
        bar
    } else {
        ProgressBar::hidden()
    };

    let builder = IndexBuilder::new(provider.as_ref(), &store, config.chunking);
    let report = builder.build_all_with_progress(&catalog, |name| {
        bar.set_message(name.to_string());
        bar.inc(1);
    });
    bar.finish_and_clear();

    for name in &report.succeeded {
        println!("{} {}", style("✓").green(), name);
    }
    for (name, reason) in &report.failed {
        println!("{} {}: {}", style("✗").red(), name, reason);
    }
    println!();
    println!(
        "Built {} of {} manuals into {}",
        report.succeeded.len(),
        report.succeeded.len() + report.failed.len(),
        store.base_dir().display()
    );

    if !report.is_success() {
        bail!("{} manual(s) failed to build", report.failed.len());
    }

    Ok(report)
}

/// List the persisted indexes that load successfully
#[inline]
pub fn list_indexes(base_dir: &Path) -> Result<()> {
    let config = load_config(base_dir)?;
    let store = IndexStore::new(config.vectors_path());

    if !store.exists() {
        println!("No indexes have been built yet.");
        println!("Use 'motofix build' to index the manuals in {}", config.manuals_path().display());
        return Ok(());
    }

    let registry = store
        .load_all()
        .context("Failed to read index directory")?;

    if registry.is_empty() {
        println!("No loadable indexes in {}", store.base_dir().display());
        return Ok(());
    }

    println!("Model indexes ({} total):", registry.len());
    println!();
    for (name, index) in registry.iter() {
        println!("🏍  {}", style(name).bold());
        println!("   Documents: {}", index.len());
        println!("   Embedding: {} ({} dims)", index.embedding_model(), index.dimension());
        println!(
            "   Built: {}",
            index.created_at().format("%Y-%m-%d %H:%M:%S")
        );
        println!();
    }

    Ok(())
}

/// Load every index and serve the HTTP API
#[inline]
pub async fn serve_api(base_dir: &Path, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_config(base_dir)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    config.api_key().context("The answer service needs an API key")?;
    let embedder = provider_from_config(&config).context("Failed to initialize embedding provider")?;
    let answerer = OpenAiChatClient::new(&config).context("Failed to initialize answer service")?;

    let store = IndexStore::new(config.vectors_path());
    let registry = store
        .load_all()
        .with_context(|| format!("Cannot read index directory {}", store.base_dir().display()))?;

    if registry.is_empty() {
        info!("No models loaded; run 'motofix build' to create indexes");
    }

    let state = AppState {
        registry: Arc::new(registry),
        embedder: Arc::from(embedder),
        answerer: Arc::new(answerer),
        store,
        catalog: config.catalog.clone(),
        top_k: config.server.top_k,
    };

    serve(state, &config.server).await
}
