//! End-to-end runs: list, filter, ingest, check.

use archival_zone::diagnostics::{run_diagnostics, time_zero_check, water_year_check, WaterYear};
use archival_zone::filter::filter_by_pattern;
use archival_zone::ingestion::{ingest, ingest_collecting, ingest_parallel, IngestionOptions};
use archival_zone::remote::{list_file_paths, list_files, LocalStore, MemoryStore};
use archival_zone::ErrorKind;

fn fixtures() -> LocalStore {
    LocalStore::new("tests/fixtures")
}

#[test]
fn local_listing_is_recursive_and_files_only() {
    let paths = list_file_paths(&fixtures(), "/QualityZone2").unwrap();
    assert_eq!(
        paths,
        [
            "/QualityZone2/flow_wy20.csv",
            "/QualityZone2/notes.txt",
            "/QualityZone2/raw/UPPER.CSV",
            "/QualityZone2/raw/bad_index.csv",
            "/QualityZone2/stage_wy20.csv",
        ]
    );
}

#[test]
fn filter_then_ingest_then_diagnose() {
    let store = fixtures();
    let paths = list_file_paths(&store, "/QualityZone2").unwrap();
    let matched = filter_by_pattern(&paths, "*_wy20.csv").unwrap();
    assert_eq!(
        matched,
        ["/QualityZone2/flow_wy20.csv", "/QualityZone2/stage_wy20.csv"]
    );

    let tables = ingest(&store, &matched, &IngestionOptions::default()).unwrap();
    let wy = WaterYear::from_two_digit(20).unwrap();

    let flow = &tables[0];
    assert!(time_zero_check(flow).is_aligned());
    assert_eq!(water_year_check(flow, wy).outside_count, 0);

    let stage = &tables[1];
    let tz = time_zero_check(stage);
    assert_eq!(tz.misaligned_count, 2);
    assert_eq!(tz.first_example.unwrap().to_string(), "2019-09-30 23:45:00");

    let outside = water_year_check(stage, wy);
    assert_eq!(outside.outside_count, 2);
    let stamps: Vec<String> = outside
        .outside
        .timestamps()
        .iter()
        .map(|t| t.to_string())
        .collect();
    assert_eq!(stamps, ["2019-09-30 23:45:00", "2020-10-01 01:00:00"]);

    let report = run_diagnostics(stage, Some(wy));
    assert!(report.to_string().contains("2 row(s) outside WY2020"));
}

#[test]
fn batch_aborts_on_malformed_file() {
    let store = fixtures();
    let paths = list_file_paths(&store, "/QualityZone2").unwrap();
    let matched = filter_by_pattern(&paths, "*.csv").unwrap();
    assert_eq!(matched.len(), 3);

    let err = ingest(&store, &matched, &IngestionOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedIndex);
    assert!(err.to_string().contains("bad_index.csv"));
}

#[test]
fn collecting_batch_keeps_good_files() {
    let store = fixtures();
    let paths = list_file_paths(&store, "/QualityZone2").unwrap();
    let report = ingest_collecting(&store, &paths, &IngestionOptions::default());

    let ingested: Vec<&str> = report.ingested.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        ingested,
        ["/QualityZone2/flow_wy20.csv", "/QualityZone2/stage_wy20.csv"]
    );
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, "/QualityZone2/raw/bad_index.csv");
    assert_eq!(
        report.skipped,
        ["/QualityZone2/notes.txt", "/QualityZone2/raw/UPPER.CSV"]
    );
}

fn paged_store(page_size: usize) -> MemoryStore {
    let mut store = MemoryStore::new().with_page_size(page_size);
    for i in 0..7 {
        store = store.with_file(
            format!("/QualityZone2/site{i}/stage.csv"),
            format!("ts,v\n2020-0{}-01 00:00:00,{i}\n", i + 1),
        );
    }
    store.with_file("/QualityZone2/readme.md", "notes")
}

#[test]
fn listing_is_independent_of_page_size() {
    let expected = list_files(&paged_store(1000), "/QualityZone2").unwrap();
    assert_eq!(expected.len(), 8);
    for page_size in [1, 2, 3, 5] {
        let listed = list_files(&paged_store(page_size), "/QualityZone2").unwrap();
        assert_eq!(listed, expected, "page_size={page_size}");
    }
}

#[test]
fn parallel_ingest_matches_sequential() {
    let store = paged_store(2);
    let paths = list_file_paths(&store, "/QualityZone2").unwrap();
    let matched = filter_by_pattern(&paths, "*.csv").unwrap();

    let sequential = ingest(&store, &matched, &IngestionOptions::default()).unwrap();
    for workers in [1, 3, 8] {
        let parallel =
            ingest_parallel(&store, &matched, &IngestionOptions::default(), workers).unwrap();
        assert_eq!(parallel, sequential, "workers={workers}");
    }
    let first_months: Vec<u32> = sequential
        .iter()
        .map(|t| chrono::Datelike::month(&t.timestamps()[0]))
        .collect();
    assert_eq!(first_months, [1, 2, 3, 4, 5, 6, 7]);
}
