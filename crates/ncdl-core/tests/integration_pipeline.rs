//! Integration tests: curl-backed inspector and fetcher against a local server.
//!
//! Each test starts its own page server, runs the pipeline into a temp dir and
//! checks the ordered report and the files on disk.

mod common;

use common::page_server::{self, Route};
use ncdl_core::fetch::{CurlFetcher, FetchError, Fetcher};
use ncdl_core::control::AbortToken;
use ncdl_core::inspect::{CurlInspector, InspectRequest, InspectionError, Locator, PageInspector};
use ncdl_core::pipeline::{EventKind, MemoryReport, Pipeline, PipelineSettings};
use ncdl_core::task::Stage;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::tempdir;

const LOCATOR: &str = "div.audio > button";

fn page(data_src: &str) -> String {
    format!(
        r#"<!doctype html><html><body><div class="audio"><button data-src="{}">play</button></div></body></html>"#,
        data_src
    )
}

fn audio_bytes(seed: u8) -> Vec<u8> {
    (0u8..=250).cycle().skip(seed as usize).take(32 * 1024).collect()
}

fn pipeline(dir: &Path, workers: usize, element_wait: Duration) -> Pipeline {
    let settings = PipelineSettings {
        workers,
        locator: Locator::parse(LOCATOR).unwrap(),
        output_dir: dir.to_path_buf(),
        page_load_timeout: Duration::from_secs(5),
        element_wait_timeout: element_wait,
    };
    Pipeline::new(
        settings,
        Arc::new(CurlInspector::new("data-src")),
        Arc::new(CurlFetcher::new(Duration::from_secs(5))),
    )
}

fn no_part_files(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .unwrap()
        .flatten()
        .all(|e| !e.file_name().to_string_lossy().ends_with(".part"))
}

#[tokio::test]
async fn relative_asset_reference_is_downloaded() {
    let body = audio_bytes(1);
    let base = page_server::start(vec![
        ("/word/hello", Route::html(&page("/media/hello_us.mp3"))),
        ("/media/hello_us.mp3", Route::audio(body.clone())),
    ]);
    let dir = tempdir().unwrap();

    let mut sink = MemoryReport::new();
    let summary = pipeline(dir.path(), 2, Duration::from_secs(5))
        .run(&[format!("{}/word/hello", base)], &mut sink)
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 1);
    let stored = dir.path().join("hello_us.mp3");
    assert_eq!(sink.events[0].stored_path(), Some(stored.as_path()));
    assert_eq!(std::fs::read(&stored).unwrap(), body);
    assert!(no_part_files(dir.path()));
}

#[tokio::test]
async fn mixed_results_are_reported_in_input_order() {
    let base = page_server::start(vec![
        ("/word/a", Route::html(&page("/media/a.mp3"))),
        ("/media/a.mp3", Route::audio(audio_bytes(2))),
        ("/word/none", Route::html("<html><body><p>no audio here</p></body></html>")),
        ("/word/gone", Route::html(&page("/media/gone.mp3"))),
        ("/word/broken", Route::status(500)),
    ]);
    let dir = tempdir().unwrap();
    let urls: Vec<String> = ["/word/a", "/word/none", "/word/gone", "/word/broken"]
        .iter()
        .map(|p| format!("{}{}", base, p))
        .collect();

    let mut sink = MemoryReport::new();
    let summary = pipeline(dir.path(), 3, Duration::from_secs(5))
        .run(&urls, &mut sink)
        .await
        .unwrap();

    assert_eq!((summary.succeeded, summary.failed, summary.total), (1, 3, 4));
    let kinds: Vec<EventKind> = sink.events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Fetched,
            EventKind::InspectionFailed,
            EventKind::FetchFailed,
            EventKind::InspectionFailed,
        ]
    );
    assert!(sink.events[1].cause().unwrap().contains("not found"));
    assert_eq!(sink.events[2].stage(), Some(Stage::Fetch));
    assert!(sink.events[2].cause().unwrap().contains("(status 404)"));
    assert!(sink.events[3].cause().unwrap().contains("HTTP 500"));
    for (ev, url) in sink.events.iter().zip(&urls) {
        assert_eq!(&ev.page_ref, url);
    }
    assert!(!dir.path().join("gone.mp3").exists());
    assert!(no_part_files(dir.path()));
}

#[tokio::test]
async fn slow_page_times_out_without_blocking_the_run() {
    let base = page_server::start(vec![
        ("/word/slow", Route::html(&page("/media/slow.mp3")).delayed(Duration::from_secs(3))),
        ("/word/fast", Route::html(&page("/media/fast.mp3"))),
        ("/media/fast.mp3", Route::audio(audio_bytes(3))),
    ]);
    let dir = tempdir().unwrap();
    let urls = vec![format!("{}/word/slow", base), format!("{}/word/fast", base)];

    let started = Instant::now();
    let mut sink = MemoryReport::new();
    let summary = pipeline(dir.path(), 1, Duration::from_millis(200))
        .run(&urls, &mut sink)
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!((summary.succeeded, summary.failed), (1, 1));
    assert_eq!(sink.events[0].kind, EventKind::InspectionFailed);
    assert!(sink.events[0].cause().unwrap().contains("timed out"));
    assert!(sink.events[1].is_success());
}

#[tokio::test]
async fn colliding_filenames_leave_one_intact_file() {
    let first = audio_bytes(4);
    let second = audio_bytes(5);
    let base = page_server::start(vec![
        ("/word/one", Route::html(&page("/us/word.mp3"))),
        ("/word/two", Route::html(&page("/uk/word.mp3"))),
        ("/us/word.mp3", Route::audio(first.clone())),
        ("/uk/word.mp3", Route::audio(second.clone())),
    ]);
    let dir = tempdir().unwrap();
    let urls = vec![format!("{}/word/one", base), format!("{}/word/two", base)];

    let mut sink = MemoryReport::new();
    let summary = pipeline(dir.path(), 2, Duration::from_secs(5))
        .run(&urls, &mut sink)
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 2);
    let content = std::fs::read(dir.path().join("word.mp3")).unwrap();
    assert!(content == first || content == second);
    assert!(no_part_files(dir.path()));
}

#[tokio::test]
async fn fetcher_reports_size_and_digest() {
    let body = audio_bytes(6);
    let base = page_server::start(vec![("/media/x.mp3", Route::audio(body.clone()))]);
    let dir = tempdir().unwrap();
    let fetcher = CurlFetcher::new(Duration::from_secs(5));

    let file = fetcher
        .fetch(&format!("{}/media/x.mp3?v=2", base), dir.path())
        .await
        .unwrap();
    assert_eq!(file.path, dir.path().join("x.mp3"));
    assert_eq!(file.bytes, body.len() as u64);
    assert_eq!(file.sha256, hex::encode(Sha256::digest(&body)));

    let err = fetcher
        .fetch(&format!("{}/media/missing.mp3", base), dir.path())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(404));
    assert!(matches!(err, FetchError::NonSuccessStatus { .. }));
    assert!(!dir.path().join("missing.mp3").exists());
}

#[tokio::test]
async fn inspector_reports_empty_reference() {
    let base = page_server::start(vec![("/word/blank", Route::html(&page("  ")))]);
    let request = InspectRequest {
        page_ref: format!("{}/word/blank", base),
        locator: Locator::parse(LOCATOR).unwrap(),
        page_load_timeout: Duration::from_secs(5),
        element_wait_timeout: Duration::from_secs(5),
        abort: AbortToken::new(),
    };
    let err = CurlInspector::new("data-src").inspect(&request).await.unwrap_err();
    assert!(matches!(err, InspectionError::EmptyAssetReference { .. }), "{:?}", err);
}

fn inspect_request(page_ref: String, page_load: Duration, abort: AbortToken) -> InspectRequest {
    InspectRequest {
        page_ref,
        locator: Locator::parse(LOCATOR).unwrap(),
        page_load_timeout: page_load,
        element_wait_timeout: Duration::from_secs(10),
        abort,
    }
}

#[tokio::test]
async fn page_load_timeout_fails_before_element_wait() {
    let base = page_server::start(vec![(
        "/word/sluggish",
        Route::html(&page("/media/s.mp3")).delayed(Duration::from_secs(2)),
    )]);
    let dir = tempdir().unwrap();
    let settings = PipelineSettings {
        workers: 1,
        locator: Locator::parse(LOCATOR).unwrap(),
        output_dir: dir.path().to_path_buf(),
        page_load_timeout: Duration::from_millis(200),
        element_wait_timeout: Duration::from_secs(5),
    };
    let pipeline = Pipeline::new(
        settings,
        Arc::new(CurlInspector::new("data-src")),
        Arc::new(CurlFetcher::new(Duration::from_secs(5))),
    );

    let started = Instant::now();
    let mut sink = MemoryReport::new();
    let summary = pipeline
        .run(&[format!("{}/word/sluggish", base)], &mut sink)
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(summary.failed, 1);
    assert_eq!(sink.events[0].kind, EventKind::InspectionFailed);
    let cause = sink.events[0].cause().unwrap();
    assert!(cause.contains("page load timed out after 200ms"), "{}", cause);
}

#[tokio::test]
async fn tripped_token_abandons_page_load() {
    let base = page_server::start(vec![(
        "/word/stalled",
        Route::html(&page("/media/s.mp3")).delayed(Duration::from_secs(4)),
    )]);
    let abort = AbortToken::new();
    let request = inspect_request(
        format!("{}/word/stalled", base),
        Duration::from_secs(10),
        abort.clone(),
    );

    let started = Instant::now();
    let handle = tokio::spawn(async move {
        CurlInspector::new("data-src").inspect(&request).await
    });
    tokio::time::sleep(Duration::from_millis(200)).await;
    abort.abort();
    let err = handle.await.unwrap().unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(4));
    match err {
        InspectionError::Navigation { reason, .. } => {
            assert!(reason.contains("page load abandoned"), "{}", reason)
        }
        other => panic!("expected Navigation, got {:?}", other),
    }
}

#[tokio::test]
async fn oversize_page_is_navigation_error() {
    let filler = "<p>filler</p>".repeat(2048);
    let html = format!(
        "<html><body>{}<div class=\"audio\"><button data-src=\"/a.mp3\">x</button></div></body></html>",
        filler
    );
    let base = page_server::start(vec![("/word/huge", Route::html(&html))]);
    let request = inspect_request(
        format!("{}/word/huge", base),
        Duration::from_secs(5),
        AbortToken::new(),
    );

    let err = CurlInspector::new("data-src")
        .with_max_page_bytes(1024)
        .inspect(&request)
        .await
        .unwrap_err();
    match err {
        InspectionError::Navigation { reason, .. } => {
            assert!(reason.contains("exceeds 1024 bytes"), "{}", reason)
        }
        other => panic!("expected Navigation, got {:?}", other),
    }
}

#[tokio::test]
async fn long_asset_filename_is_stored() {
    let body = audio_bytes(7);
    let name = format!("{}.mp3", "a".repeat(246));
    let asset_path = format!("/media/{}", name);
    let base = page_server::start(vec![(asset_path.as_str(), Route::audio(body.clone()))]);
    let dir = tempdir().unwrap();

    let file = CurlFetcher::new(Duration::from_secs(5))
        .fetch(&format!("{}{}", base, asset_path), dir.path())
        .await
        .unwrap();
    assert_eq!(file.path, dir.path().join(&name));
    assert_eq!(std::fs::read(&file.path).unwrap(), body);
    assert!(no_part_files(dir.path()));
}
