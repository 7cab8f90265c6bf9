//! Integration test: full sync cycles over real HTTP with the curl client.
//!
//! Starts a local catalog server, points the engine at it and asserts on the
//! download and export directories.

mod common;

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use common::catalog_server::{CatalogServer, Route};
use dsync_core::http::CurlClient;
use dsync_core::sync::{DecompressStatus, TransferStatus};
use dsync_core::transfer::NoProgress;
use dsync_core::{SyncEngine, SyncOptions};
use flate2::write::GzEncoder;
use tempfile::{tempdir, TempDir};

const KEY: &str = "integration-key";

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

fn setup(server: &CatalogServer) -> (TempDir, SyncOptions) {
    let root = tempdir().unwrap();
    let mut options = SyncOptions::new(
        server.url("/api/files"),
        KEY,
        root.path().join("downloads"),
        root.path().join("exports"),
    );
    options.request_timeout = Duration::from_secs(5);
    (root, options)
}

fn names(dir: &Path) -> Vec<String> {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut v: Vec<String> = rd
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    v.sort();
    v
}

#[test]
fn sync_downloads_and_exports_over_http() {
    let server = CatalogServer::start();
    let plain: Vec<u8> = b"id,value\n".iter().copied().cycle().take(20_000).collect();
    server.manifest(
        "/api/files",
        &[("a.txt.gz", "/files/a"), ("b.bin", "/files/b")],
    );
    server.route("/files/a", Route::Ok(gzip(&plain)));
    server.route("/files/b", Route::Ok(vec![7u8; 3000]));
    let (_root, options) = setup(&server);

    let report = SyncEngine::new(CurlClient::new(), options.clone())
        .run(&mut NoProgress)
        .expect("run");

    assert_eq!(report.catalog_len, 2);
    assert_eq!(report.downloaded(), 2);
    assert!(!report.has_failures());
    let dl = &options.download_dir;
    assert_eq!(names(dl), ["a.txt.gz", "b.bin"]);
    assert_eq!(std::fs::read(dl.join("a.txt.gz")).unwrap(), gzip(&plain));
    assert_eq!(std::fs::read(dl.join("b.bin")).unwrap(), vec![7u8; 3000]);
    assert_eq!(names(&options.export_dir), ["a.txt"]);
    assert_eq!(std::fs::read(options.export_dir.join("a.txt")).unwrap(), plain);
}

#[test]
fn second_cycle_only_fetches_the_manifest() {
    let server = CatalogServer::start();
    server.manifest("/api/files", &[("one.gz", "/files/1"), ("two", "/files/2")]);
    server.route("/files/1", Route::Ok(gzip(b"first")));
    server.route("/files/2", Route::Ok(b"second".to_vec()));
    let (_root, options) = setup(&server);
    let engine = SyncEngine::new(CurlClient::new(), options);

    let first = engine.run(&mut NoProgress).unwrap();
    assert_eq!(first.downloaded(), 2);
    let second = engine.run(&mut NoProgress).unwrap();
    assert_eq!(second.planned(), 0);
    assert_eq!(
        server.paths(),
        ["/api/files", "/files/1", "/files/2", "/api/files"]
    );
}

#[test]
fn failed_transfers_are_isolated() {
    let server = CatalogServer::start();
    server.manifest(
        "/api/files",
        &[("ok1", "/files/ok1"), ("gone", "/files/gone"), ("cut", "/files/cut"), ("ok2", "/files/ok2")],
    );
    server.route("/files/ok1", Route::Ok(b"1".to_vec()));
    server.route("/files/gone", Route::Status(404));
    server.route(
        "/files/cut",
        Route::Truncated {
            declared: 10_000,
            body: vec![0u8; 100],
        },
    );
    server.route("/files/ok2", Route::Ok(b"2".to_vec()));
    let (_root, options) = setup(&server);

    let report = SyncEngine::new(CurlClient::new(), options.clone())
        .run(&mut NoProgress)
        .unwrap();

    assert_eq!(report.planned(), 4);
    assert_eq!(report.downloaded(), 2);
    assert_eq!(report.failed_transfers(), 2);
    assert!(matches!(report.outcomes[1].transfer, TransferStatus::Failed { .. }));
    assert!(matches!(report.outcomes[2].transfer, TransferStatus::Failed { .. }));
    // No partial or temp files are left for the failures.
    assert_eq!(names(&options.download_dir), ["ok1", "ok2"]);

    // The next cycle retries exactly the failed ones.
    let plan = SyncEngine::new(CurlClient::new(), options).plan().unwrap();
    let pending: Vec<_> = plan.work.iter().map(|w| w.file_name.as_str()).collect();
    assert_eq!(pending, ["gone", "cut"]);
}

#[test]
fn empty_catalog_makes_no_writes() {
    for body in [r#"{"download_status":[]}"#, r#"{"other":1}"#] {
        let server = CatalogServer::start();
        server.route("/api/files", Route::Ok(body.as_bytes().to_vec()));
        let (root, options) = setup(&server);

        let report = SyncEngine::new(CurlClient::new(), options)
            .run(&mut NoProgress)
            .unwrap();
        assert_eq!(report.catalog_len, 0);
        assert!(names(root.path()).is_empty());
    }
}

#[test]
fn rejected_manifest_request_is_a_noop() {
    let server = CatalogServer::start();
    server.route("/api/files", Route::Status(401));
    let (root, options) = setup(&server);

    let report = SyncEngine::new(CurlClient::new(), options)
        .run(&mut NoProgress)
        .unwrap();
    assert!(report.outcomes.is_empty());
    assert!(names(root.path()).is_empty());
    assert_eq!(server.paths(), ["/api/files"]);
}

#[test]
fn api_key_goes_to_the_manifest_only_by_default() {
    let server = CatalogServer::start();
    server.manifest("/api/files", &[("a", "/files/a")]);
    server.route("/files/a", Route::Ok(b"a".to_vec()));
    let (_root, options) = setup(&server);

    SyncEngine::new(CurlClient::new(), options.clone())
        .run(&mut NoProgress)
        .unwrap();
    let seen = server.requests();
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer integration-key"));
    assert_eq!(seen[1].path, "/files/a");
    assert_eq!(seen[1].authorization, None);

    // Opt in, with a fresh download dir so the file is planned again.
    let (_root2, mut authed) = setup(&server);
    authed.authenticate_downloads = true;
    SyncEngine::new(CurlClient::new().with_buffer_size(1024), authed)
        .run(&mut NoProgress)
        .unwrap();
    let seen = server.requests();
    assert_eq!(seen[3].path, "/files/a");
    assert_eq!(seen[3].authorization.as_deref(), Some("Bearer integration-key"));
}

#[test]
fn corrupt_gzip_is_reported_and_kept() {
    let server = CatalogServer::start();
    let mut broken = gzip(&[42u8; 8192]);
    broken.truncate(broken.len() / 2);
    server.manifest("/api/files", &[("broken.gz", "/files/broken")]);
    server.route("/files/broken", Route::Ok(broken.clone()));
    let (_root, options) = setup(&server);

    let report = SyncEngine::new(CurlClient::new(), options.clone())
        .run(&mut NoProgress)
        .unwrap();
    assert!(report.outcomes[0].is_downloaded());
    assert!(matches!(
        report.outcomes[0].decompress,
        Some(DecompressStatus::Failed { .. })
    ));
    assert_eq!(std::fs::read(options.download_dir.join("broken.gz")).unwrap(), broken);
    assert!(names(&options.export_dir).is_empty());
}
