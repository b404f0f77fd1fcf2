use super::*;

fn entry(index: usize, vector: Vec<f32>) -> IndexEntry {
    IndexEntry {
        document: Document {
            content: format!("chunk {}", index),
            metadata: DocumentMetadata {
                chunk_index: index,
                start_offset: index * 100,
                token_count: 2,
            },
        },
        vector,
    }
}

#[test]
fn nearest_returns_k_closest_in_ascending_distance() {
    let entries: Vec<IndexEntry> = (0..10)
        .map(|i| entry(i, vec![i as f32, 0.0]))
        .collect();
    let index = VectorIndex::new("CS150", "test:model", entries).expect("valid index");

    let results = index.nearest(&[6.2, 0.0], 3);

    assert_eq!(results.len(), 3);
    let contents: Vec<&str> = results.iter().map(|r| r.document.content.as_str()).collect();
    assert_eq!(contents, vec!["chunk 6", "chunk 7", "chunk 5"]);
    assert!(results[0].distance <= results[1].distance);
    assert!(results[1].distance <= results[2].distance);
    assert!(results[0].similarity_score >= results[2].similarity_score);
}

#[test]
fn nearest_keeps_build_order_for_ties() {
    let entries = vec![
        entry(0, vec![1.0, 0.0]),
        entry(1, vec![0.0, 1.0]),
        entry(2, vec![-1.0, 0.0]),
    ];
    let index = VectorIndex::new("DM150", "test:model", entries).expect("valid index");

    let results = index.nearest(&[0.0, 0.0], 3);

    let order: Vec<usize> = results
        .iter()
        .map(|r| r.document.metadata.chunk_index)
        .collect();
    assert_eq!(order, vec![0, 1, 2]);
    assert!(results.iter().all(|r| (r.distance - 1.0).abs() < f32::EPSILON));
}

#[test]
fn nearest_caps_at_index_size_and_handles_zero_k() {
    let index = VectorIndex::new(
        "FT125",
        "test:model",
        vec![entry(0, vec![0.5]), entry(1, vec![1.5])],
    )
    .expect("valid index");

    assert_eq!(index.nearest(&[0.0], 5).len(), 2);
    assert!(index.nearest(&[0.0], 0).is_empty());
}

#[test]
fn exact_match_scores_one() {
    let index =
        VectorIndex::new("WS175", "test:model", vec![entry(0, vec![0.3, 0.4])]).expect("valid");

    let results = index.nearest(&[0.3, 0.4], 1);
    assert_eq!(results[0].distance, 0.0);
    assert_eq!(results[0].similarity_score, 1.0);
}

#[test]
fn rejects_empty_index() {
    let error = VectorIndex::new("CS150", "test:model", Vec::new()).expect_err("must fail");
    assert!(matches!(error, IndexError::Invalid { .. }));
}

#[test]
fn rejects_zero_dimension_vectors() {
    let error =
        VectorIndex::new("CS150", "test:model", vec![entry(0, Vec::new())]).expect_err("must fail");
    assert!(matches!(error, IndexError::Invalid { .. }));
}

#[test]
fn rejects_inconsistent_dimensions() {
    let error = VectorIndex::new(
        "CS150",
        "test:model",
        vec![entry(0, vec![1.0, 2.0]), entry(1, vec![1.0])],
    )
    .expect_err("must fail");

    match error {
        IndexError::Invalid { name, reason } => {
            assert_eq!(name, "CS150");
            assert!(reason.contains("entry 1"), "unexpected reason: {}", reason);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn document_from_chunk_keeps_metadata() {
    let chunk = ContentChunk {
        content: "Revisar la cadena".to_string(),
        chunk_index: 4,
        start_offset: 900,
        token_count: 5,
    };

    let document = Document::from(chunk);
    assert_eq!(document.content, "Revisar la cadena");
    assert_eq!(document.metadata.chunk_index, 4);
    assert_eq!(document.metadata.start_offset, 900);
    assert_eq!(document.metadata.token_count, 5);
}
