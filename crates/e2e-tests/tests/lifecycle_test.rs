//! Persistent lifecycle E2E tests.
//!
//! build (create-fresh) -> index -> shutdown -> rebuild (create-or-append)
//! -> match on the indexed field.

use pretty_assertions::assert_eq;

use e2e_tests::{index_all, sample_books, Book, TestHarness};
use search_core::OpenMode;

#[test]
fn test_new_location_is_create_fresh_then_append() {
    let harness = TestHarness::new();

    let config = harness.persistent::<Book>("catalog").build_config().unwrap();
    assert_eq!(config.open_mode(), OpenMode::CreateFresh);
    drop(config);

    let mut core = harness.persistent::<Book>("catalog").build().unwrap();
    // build_config created an empty directory, which is still a new location
    assert_eq!(core.open_mode(), OpenMode::CreateFresh);
    index_all(&mut core, &sample_books()).unwrap();
    core.shutdown().unwrap();

    let config = harness.persistent::<Book>("catalog").build_config().unwrap();
    assert_eq!(config.open_mode(), OpenMode::CreateOrAppend);
    assert_eq!(
        config.location(),
        Some(harness.indexes_path.join("catalog").as_path())
    );
}

#[test]
fn test_reopened_core_retrieves_documents() {
    let harness = TestHarness::new();

    let mut core = harness.persistent::<Book>("catalog").build().unwrap();
    let indexed = index_all(&mut core, &sample_books()).unwrap();
    let report = core.shutdown().unwrap();
    assert_eq!(report.documents_added, indexed as u64);

    let core = harness.persistent::<Book>("catalog").build().unwrap();
    assert_eq!(core.num_docs(), indexed as u64);
    assert_eq!(core.segment_count(), 1);

    let hits = core.match_text("title", "snow", 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(
        hits[0].get("title").and_then(|v| v.as_text()),
        Some("Snow Crash")
    );
    assert_eq!(hits[0].get("year").and_then(|v| v.as_integer()), Some(1992));
    assert!(harness.sink.is_empty());
}

#[test]
fn test_document_count_accumulates_across_sessions() {
    let harness = TestHarness::new();

    let mut core = harness.persistent::<Book>("catalog").build().unwrap();
    index_all(&mut core, &sample_books()[..2]).unwrap();
    core.shutdown().unwrap();

    let mut core = harness.persistent::<Book>("catalog").build().unwrap();
    assert_eq!(core.num_docs(), 2);
    index_all(&mut core, &sample_books()[2..]).unwrap();
    // Snapshot taken at open does not see this session's documents
    assert_eq!(core.num_docs(), 2);
    core.shutdown().unwrap();

    let core = harness.persistent::<Book>("catalog").build().unwrap();
    assert_eq!(core.num_docs(), 4);
    assert_eq!(core.segment_count(), 1);
}

#[test]
fn test_range_query_after_reopen() {
    let harness = TestHarness::new();

    let mut core = harness.persistent::<Book>("catalog").build().unwrap();
    index_all(&mut core, &sample_books()).unwrap();
    core.shutdown().unwrap();

    let core = harness.persistent::<Book>("catalog").build().unwrap();
    let hits = core.match_range("year", 1980..2000, 10).unwrap();
    let mut years: Vec<i64> = hits
        .iter()
        .filter_map(|d| d.get("year").and_then(|v| v.as_integer()))
        .collect();
    years.sort_unstable();
    assert_eq!(years, vec![1984, 1992]);
}

#[test]
fn test_exact_strategy_round_trip() {
    let harness = TestHarness::new();

    let mut core = harness.persistent_exact::<Book>("exact").build().unwrap();
    index_all(&mut core, &sample_books()).unwrap();
    core.shutdown().unwrap();

    let core = harness.persistent_exact::<Book>("exact").build().unwrap();
    assert!(core.match_text("title", "snow", 10).unwrap().is_empty());
    assert_eq!(core.match_text("title", "Snow Crash", 10).unwrap().len(), 1);
}
