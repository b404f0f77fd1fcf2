use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Embeds text by character statistics; fails on any text containing "FALLA"
struct StatsEmbedder {
    batches: AtomicUsize,
}

impl StatsEmbedder {
    fn new() -> Self {
        Self {
            batches: AtomicUsize::new(0),
        }
    }
}

impl EmbeddingProvider for StatsEmbedder {
    fn model_id(&self) -> &str {
        "test:stats"
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        if text.contains("FALLA") {
            return Err(ProviderError::Transient {
                attempts: 3,
                message: "HTTP 503".to_string(),
            });
        }
        let chars = text.chars().count() as f32;
        let digits = text.chars().filter(char::is_ascii_digit).count() as f32;
        let spaces = text.chars().filter(|c| c.is_whitespace()).count() as f32;
        Ok(vec![chars, digits, spaces])
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Returns vectors of growing length, one per input
struct RaggedEmbedder;

impl EmbeddingProvider for RaggedEmbedder {
    fn model_id(&self) -> &str {
        "test:ragged"
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
        Ok(vec![0.0])
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok((0..texts.len()).map(|i| vec![0.5; i + 1]).collect())
    }
}

/// Drops the last vector of every batch
struct ShortEmbedder;

impl EmbeddingProvider for ShortEmbedder {
    fn model_id(&self) -> &str {
        "test:short"
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
        Ok(vec![1.0])
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(vec![vec![1.0]; texts.len().saturating_sub(1)])
    }
}

fn small_window() -> ChunkingConfig {
    ChunkingConfig {
        chunk_size: 30,
        chunk_overlap: 5,
    }
}

const OIL_NOTE: &str = "Cambio de aceite cada 3000 km. Revisar frenos cada 6 meses.";

#[test]
fn build_saves_index_pinned_to_provider() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = IndexStore::new(temp_dir.path().join("vectores"));
    let provider = StatsEmbedder::new();
    let builder = IndexBuilder::new(&provider, &store, small_window());

    let index = builder.build("cs150", OIL_NOTE).expect("build should succeed");

    assert_eq!(index.name(), "CS150");
    assert_eq!(index.embedding_model(), "test:stats");
    assert_eq!(index.dimension(), 3);
    assert!(index.len() >= 2);
    assert_eq!(provider.batches.load(Ordering::SeqCst), 1);

    let loaded = store.load("CS150").expect("index should be persisted");
    assert_eq!(loaded, index);
}

#[test]
fn chunks_keep_build_order_in_index() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = IndexStore::new(temp_dir.path());
    let provider = StatsEmbedder::new();
    let builder = IndexBuilder::new(&provider, &store, small_window());

    let index = builder.build("DM150", OIL_NOTE).expect("build should succeed");

    let positions: Vec<usize> = index
        .entries()
        .iter()
        .map(|e| e.document.metadata.chunk_index)
        .collect();
    let expected: Vec<usize> = (0..index.len()).collect();
    assert_eq!(positions, expected);
    assert_eq!(
        index.entries()[0].document.content,
        "Cambio de aceite cada 3000 km."
    );
}

#[test]
fn empty_manual_is_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = IndexStore::new(temp_dir.path());
    let provider = StatsEmbedder::new();
    let builder = IndexBuilder::new(&provider, &store, small_window());

    match builder.build("ft125", " \r\n\t ") {
        Err(BuildError::EmptyManual(name)) => assert_eq!(name, "FT125"),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(store.listing().expect("listing").is_empty());
}

#[test]
fn provider_failure_aborts_build_without_saving() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = IndexStore::new(temp_dir.path());
    let provider = StatsEmbedder::new();
    let builder = IndexBuilder::new(&provider, &store, small_window());

    let result = builder.build("WS175", "FALLA en el sistema de encendido");
    assert!(matches!(
        result,
        Err(BuildError::Provider(ProviderError::Transient { .. }))
    ));
    assert!(matches!(
        store.load("WS175"),
        Err(IndexError::NotFound { .. })
    ));
}

#[test]
fn inconsistent_dimensions_are_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = IndexStore::new(temp_dir.path());
    let builder = IndexBuilder::new(&RaggedEmbedder, &store, small_window());

    match builder.build("CS150", OIL_NOTE) {
        Err(BuildError::DimensionMismatch {
            position,
            expected,
            actual,
            ..
        }) => {
            assert_eq!(position, 1);
            assert_eq!(expected, 1);
            assert_eq!(actual, 2);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn short_embedding_response_is_a_provider_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = IndexStore::new(temp_dir.path());
    let builder = IndexBuilder::new(&ShortEmbedder, &store, small_window());

    assert!(matches!(
        builder.build("CS150", OIL_NOTE),
        Err(BuildError::Provider(ProviderError::InvalidResponse(_)))
    ));
}

#[test]
fn invalid_window_is_a_chunking_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = IndexStore::new(temp_dir.path());
    let provider = StatsEmbedder::new();
    let builder = IndexBuilder::new(
        &provider,
        &store,
        ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 10,
        },
    );

    assert!(matches!(
        builder.build("CS150", OIL_NOTE),
        Err(BuildError::Chunking(_))
    ));
}

#[test]
fn rebuild_replaces_previous_index() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = IndexStore::new(temp_dir.path());
    let provider = StatsEmbedder::new();
    let builder = IndexBuilder::new(&provider, &store, small_window());

    builder.build("CS150", OIL_NOTE).expect("first build");
    let second = builder
        .build("CS150", "Presión de llantas: 29 psi.")
        .expect("second build");

    let loaded = store.load("CS150").expect("load");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded, second);
}

#[test]
fn build_all_isolates_failures() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let manuals_dir = temp_dir.path().join("manuales_txt");
    std::fs::create_dir(&manuals_dir).expect("create manuals dir");
    std::fs::write(manuals_dir.join("cs150.txt"), OIL_NOTE).expect("write manual");
    std::fs::write(manuals_dir.join("dm150.txt"), "FALLA de lectura").expect("write manual");
    std::fs::write(manuals_dir.join("ft125.txt"), "Tensión de cadena: 25 mm.").expect("write");

    let store = IndexStore::new(temp_dir.path().join("vectores"));
    let provider = StatsEmbedder::new();
    let builder = IndexBuilder::new(&provider, &store, small_window());
    let catalog = discover_manuals(&manuals_dir).expect("discovery should succeed");

    let mut seen = Vec::new();
    let report = builder.build_all_with_progress(&catalog, |name| seen.push(name.to_string()));

    assert_eq!(report.succeeded, vec!["CS150".to_string(), "FT125".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "DM150");
    assert!(!report.is_success());
    assert_eq!(seen, vec!["CS150", "DM150", "FT125"]);

    let registry = store.load_all().expect("load_all");
    assert_eq!(registry.names(), vec!["CS150".to_string(), "FT125".to_string()]);
}

#[test]
fn build_all_reports_name_collisions() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let manuals_dir = temp_dir.path().join("manuales_txt");
    std::fs::create_dir(&manuals_dir).expect("create manuals dir");
    std::fs::write(manuals_dir.join("CS150.TXT"), OIL_NOTE).expect("write manual");
    std::fs::write(manuals_dir.join("cs150.txt"), "Otra versión del manual").expect("write");

    let store = IndexStore::new(temp_dir.path().join("vectores"));
    let provider = StatsEmbedder::new();
    let builder = IndexBuilder::new(&provider, &store, small_window());
    let catalog = discover_manuals(&manuals_dir).expect("discovery should succeed");

    let report = builder.build_all(&catalog);

    assert_eq!(report.succeeded, vec!["CS150".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "CS150");
    assert!(report.failed[0].1.contains("cs150.txt"));

    let index = store.load("CS150").expect("load");
    assert_eq!(
        index.entries()[0].document.content,
        "Cambio de aceite cada 3000 km."
    );
}
