use lexi_core::index::count_lengths;
use lexi_core::persist::{load_index, save_index};
use lexi_core::{build_index, Corpus, IndexHandle, Pipeline, SearchError, StopWords, Strategy};
use std::collections::BTreeMap;
use std::fs;
use tempfile::tempdir;

fn sample_index() -> lexi_core::PositionalIndex {
    let pipeline = Pipeline::new(StopWords::parse("the\nand"));
    build_index(&Corpus::from_documents(["the cat sat", "the dog ran", "cats and dogs play"]), &pipeline)
}

#[test]
fn json_snapshot_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index").join("positional_inverted_index.json");
    let index = sample_index();
    save_index(&path, &index).unwrap();
    assert_eq!(load_index(&path).unwrap(), index);
    assert!(!dir.path().join("index").join("positional_inverted_index.json.tmp").exists());
}

#[test]
fn json_snapshot_is_nested_term_doc_positions() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pii.json");
    save_index(&path, &sample_index()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["cat"]["1"], serde_json::json!([0]));
    assert_eq!(value["cat"]["3"], serde_json::json!([0]));
    assert_eq!(value["pla"]["3"], serde_json::json!([2]));
}

#[test]
fn bincode_snapshot_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pii.bin");
    let index = sample_index();
    save_index(&path, &index).unwrap();
    assert_eq!(load_index(&path).unwrap(), index);
}

#[test]
fn hand_written_snapshot_loads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pii.json");
    fs::write(&path, r#"{"rust": {"1": [0, 2], "2": [0]}, "fast": {"1": [1]}}"#).unwrap();
    let index = load_index(&path).unwrap();
    assert_eq!(index.doc_count(), 2);
    assert_eq!(index.doc_lengths().get(&1), Some(&3));
}

#[test]
fn malformed_snapshot_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pii.json");
    fs::write(&path, r#"{"rust": {"1": [2, 1]}}"#).unwrap();
    assert!(matches!(load_index(&path), Err(SearchError::MalformedIndex { .. })));

    fs::write(&path, r#"{"rust": {"1": []}}"#).unwrap();
    assert!(matches!(load_index(&path), Err(SearchError::MalformedIndex { .. })));

    fs::write(&path, r#"{"rust": ["#).unwrap();
    assert!(matches!(load_index(&path), Err(SearchError::Json(_))));
}

#[test]
fn wrongly_typed_snapshot_is_malformed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pii.json");
    fs::write(&path, r#"{"rust": {"1": [-1]}}"#).unwrap();
    assert!(matches!(load_index(&path), Err(SearchError::MalformedIndex { .. })));

    fs::write(&path, r#"{"rust": {"first": [0]}}"#).unwrap();
    assert!(matches!(load_index(&path), Err(SearchError::MalformedIndex { .. })));

    fs::write(&path, r#"{"rust": {"1": [0.5]}}"#).unwrap();
    assert!(matches!(load_index(&path), Err(SearchError::MalformedIndex { .. })));
}

#[test]
fn loaded_statistics_match_recomputed_ones() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pii.json");
    let index = sample_index();
    save_index(&path, &index).unwrap();
    let loaded = load_index(&path).unwrap();

    let mut recomputed: BTreeMap<u32, usize> = BTreeMap::new();
    for (_, postings) in loaded.terms() {
        for (&doc_id, positions) in postings {
            *recomputed.entry(doc_id).or_insert(0) += positions.len();
        }
    }
    assert_eq!(loaded.doc_lengths(), &recomputed);
    assert_eq!(loaded.doc_lengths(), &count_lengths_of(&index));
    assert_eq!(loaded.doc_count(), recomputed.len());
    let avg = recomputed.values().sum::<usize>() as f64 / recomputed.len() as f64;
    assert_eq!(loaded.avg_doc_length(), avg);
    assert_eq!(loaded.doc_length(3), 3);
    assert_eq!(loaded.doc_length(42), 0);
}

fn count_lengths_of(index: &lexi_core::PositionalIndex) -> BTreeMap<u32, usize> {
    let terms = index.terms().map(|(t, p)| (t.to_string(), p.clone())).collect();
    count_lengths(&terms)
}

#[test]
fn handle_reloads_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pii.json");
    save_index(&path, &sample_index()).unwrap();

    let handle = IndexHandle::empty();
    assert!(matches!(handle.snapshot(), Err(SearchError::IndexUnavailable)));
    handle.reload_from(&path).unwrap();
    let hits = handle.rank(Strategy::Tf, &["cat"]).unwrap();
    assert_eq!(hits, vec![(1, 1.0), (3, 1.0)]);

    fs::write(&path, r#"{"cat": {"7": [0]}}"#).unwrap();
    handle.reload_from(&path).unwrap();
    assert_eq!(handle.rank(Strategy::Tf, &["cat"]).unwrap(), vec![(7, 1.0)]);
}
