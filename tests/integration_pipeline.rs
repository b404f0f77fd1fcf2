#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

//! Integration tests for the retrieval pipeline
//!
//! These tests run the full offline flow against a temporary directory:
//! - manual discovery and batch builds with per-model isolation
//! - persistence and reloading through the index store
//! - resolution and similarity search over the reloaded registry
//!
//! A deterministic bag-of-words embedder stands in for the remote provider.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use motofix::embeddings::{ChunkingConfig, EmbeddingProvider, ProviderError};
use motofix::indexer::{IndexBuilder, discover_manuals};
use motofix::resolver::resolve;
use motofix::search::search;
use motofix::store::IndexStore;

const DIMENSION: usize = 32;

/// Hashes lowercase words into a fixed number of buckets
struct BagOfWordsEmbedder;

impl EmbeddingProvider for BagOfWordsEmbedder {
    fn model_id(&self) -> &str {
        "test:bag-of-words"
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        if text.contains("ERROR_DE_PROVEEDOR") {
            return Err(ProviderError::Rejected {
                status: 400,
                message: "invalid input".to_string(),
            });
        }

        let mut vector = vec![0.0; DIMENSION];
        for word in text.split_whitespace() {
            let word = word.to_lowercase();
            let bucket = word
                .bytes()
                .fold(2_166_136_261_u32, |hash, byte| {
                    (hash ^ u32::from(byte)).wrapping_mul(16_777_619)
                }) as usize
                % DIMENSION;
            vector[bucket] += 1.0;
        }
        Ok(vector)
    }
}

const CS150_MANUAL: &str = "\
Cambio de aceite cada 3000 km con aceite 20W-50.
Revisar frenos cada 6 meses y ajustar el juego libre de la palanca.
La cadena debe lubricarse cada 500 km y tensarse con 25 mm de holgura.
La presión de llantas recomendada es de 29 psi delantera y 33 psi trasera.
La bujía se reemplaza cada 8000 km; usar calibración de 0.7 mm.";

const FT125_MANUAL: &str = "\
El filtro de aire se limpia cada 2000 km en caminos polvorientos.
La batería requiere revisión del nivel de electrolito cada mes.
El carburador se ajusta con el tornillo de mezcla a una vuelta y media.";

fn write_manual(dir: &Path, file: &str, text: &str) {
    fs::write(dir.join(file), text).expect("Failed to write manual");
}

fn window() -> ChunkingConfig {
    ChunkingConfig {
        chunk_size: 80,
        chunk_overlap: 10,
    }
}

#[test]
fn build_persist_load_and_search_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let manuals = temp_dir.path().join("manuales_txt");
    fs::create_dir(&manuals).expect("create manuals dir");
    write_manual(&manuals, "cs150.txt", CS150_MANUAL);
    write_manual(&manuals, "ft125.txt", FT125_MANUAL);

    let store = IndexStore::new(temp_dir.path().join("vectores"));
    let provider = BagOfWordsEmbedder;
    let builder = IndexBuilder::new(&provider, &store, window());

    let catalog = discover_manuals(&manuals).expect("discovery should succeed");
    let report = builder.build_all(&catalog);
    assert!(report.is_success(), "failures: {:?}", report.failed);
    assert_eq!(report.succeeded, vec!["CS150", "FT125"]);

    let registry = store.load_all().expect("load_all should succeed");
    assert_eq!(registry.names(), vec!["CS150", "FT125"]);

    let names = registry.names();
    let canonical = resolve("Italika cs-150", &names, "ITALIKA").expect("model should resolve");
    let index = registry.get(&canonical).expect("index should be loaded");
    assert!(index.len() > 1);

    for entry in index.entries() {
        let results =
            search(&index, &provider, &entry.document.content, 3).expect("search should succeed");
        assert!(
            results
                .iter()
                .any(|r| r.document.content == entry.document.content),
            "chunk {} not found in its own top-3",
            entry.document.metadata.chunk_index
        );
        assert_eq!(results[0].distance, 0.0);
    }
}

#[test]
fn one_failing_manual_does_not_stop_the_batch() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let manuals = temp_dir.path().join("manuales_txt");
    fs::create_dir(&manuals).expect("create manuals dir");
    write_manual(&manuals, "cs150.txt", CS150_MANUAL);
    write_manual(&manuals, "dm150.txt", "ERROR_DE_PROVEEDOR en este manual");
    write_manual(&manuals, "ft125.txt", FT125_MANUAL);
    write_manual(&manuals, "vacio.txt", "   \n  ");

    let store = IndexStore::new(temp_dir.path().join("vectores"));
    let provider = BagOfWordsEmbedder;
    let builder = IndexBuilder::new(&provider, &store, window());

    let catalog = discover_manuals(&manuals).expect("discovery should succeed");
    let report = builder.build_all(&catalog);

    assert_eq!(report.succeeded, vec!["CS150", "FT125"]);
    let failed: Vec<&str> = report.failed.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(failed, vec!["DM150", "VACIO"]);

    let registry = store.load_all().expect("load_all should succeed");
    assert_eq!(registry.names(), vec!["CS150", "FT125"]);
}

#[test]
fn corrupt_index_is_skipped_on_load() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = IndexStore::new(temp_dir.path().join("vectores"));
    let provider = BagOfWordsEmbedder;
    let builder = IndexBuilder::new(&provider, &store, window());

    builder
        .build("cs150", CS150_MANUAL)
        .expect("build should succeed");
    let broken = builder
        .build("ft125", FT125_MANUAL)
        .expect("build should succeed");
    fs::write(
        store.index_path(broken.name()).join("documents.json"),
        "[{\"document\": 1}]",
    )
    .expect("corrupt documents");

    let registry = store.load_all().expect("load_all should succeed");
    assert_eq!(registry.names(), vec!["CS150"]);
    assert_eq!(
        store.listing().expect("listing"),
        vec!["CS150".to_string(), "FT125".to_string()]
    );
}

#[test]
fn unknown_model_lists_what_is_available() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = IndexStore::new(temp_dir.path().join("vectores"));
    let provider = BagOfWordsEmbedder;
    IndexBuilder::new(&provider, &store, window())
        .build("CS150", CS150_MANUAL)
        .expect("build should succeed");

    let registry = store.load_all().expect("load_all should succeed");
    let error = resolve("XYZ999", &registry.names(), "ITALIKA").expect_err("should not resolve");

    assert!(error.to_string().contains("CS150"));
}
