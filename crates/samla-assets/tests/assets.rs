//! Integration tests for the photo lifecycle against a real catalog on disk.

use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use samla_assets::{AssetError, AssetInput, AssetStore, Cleanup};
use samla_core::model::{NewLocation, NewSet, SetId};
use samla_core::photo::{PhotoReference, PhotoSource};
use samla_core::{AppPaths, Database};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    db: Database,
    store: AssetStore,
    set: SetId,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::new(dir.path().join("catalog"));
        paths.ensure_dirs().unwrap();
        let db = Database::open(&paths.db_path).unwrap();

        let loc = db.create_location(&NewLocation::new("L1")).unwrap();
        let bx = db.create_box(loc, "B1", "").unwrap();
        let set = db
            .create_bag_with_set(&NewSet::new(bx, "0001", "Castle Set"))
            .unwrap();

        Self {
            dir,
            db,
            store: AssetStore::new(paths),
            set,
        }
    }

    fn images(&self) -> PathBuf {
        self.store.paths().images_dir.clone()
    }

    fn image_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<_> = fs::read_dir(self.images())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        files.sort();
        files
    }

    /// A source file outside the catalog.
    fn source_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn stored_path(&self) -> Option<String> {
        self.db.photo(self.set).unwrap().map(|p| p.path)
    }
}

/// Serve exactly one HTTP response on a random local port.
fn serve_once(status_line: &'static str, content_type: &'static str, body: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = [0_u8; 2048];
            let _ = stream.read(&mut request);
            let head = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body);
        }
    });
    format!("http://{addr}")
}

/// Send the headers and a few body bytes, then go quiet.
fn serve_stalled(stall: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = [0_u8; 2048];
            let _ = stream.read(&mut request);
            let head = "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 1000\r\n\r\n";
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(b"png");
            let _ = stream.flush();
            thread::sleep(stall);
        }
    });
    format!("http://{addr}")
}

#[test]
fn test_replacing_photo_deletes_previous_file() {
    let fx = Fixture::new();
    let a = fx.source_file("a.png", b"first");
    let b = fx.source_file("b.JPG", b"second");

    let first = fx
        .store
        .set_asset(&fx.db, fx.set, AssetInput::File(a))
        .unwrap();
    assert_eq!(first.previous, Cleanup::NotNeeded);
    assert!(first.path.starts_with("Images/"));
    assert!(first.path.ends_with(".png"));

    let second = fx
        .store
        .set_asset(&fx.db, fx.set, AssetInput::File(b))
        .unwrap();
    assert_eq!(
        second.previous,
        Cleanup::Removed {
            path: first.path.clone()
        }
    );
    assert!(second.path.ends_with(".jpg"));

    let files = fx.image_files();
    assert_eq!(files.len(), 1);
    assert_eq!(fs::read(&files[0]).unwrap(), b"second");
    assert_eq!(fx.stored_path(), Some(second.path.clone()));
    assert_eq!(fx.store.resolve(&second.path), files[0]);
}

#[test]
fn test_clear_removes_row_then_file() {
    let fx = Fixture::new();
    let a = fx.source_file("a.png", b"first");
    let update = fx
        .store
        .set_asset(&fx.db, fx.set, AssetInput::File(a))
        .unwrap();

    let cleanup = fx.store.clear_asset(&fx.db, fx.set).unwrap();
    assert_eq!(cleanup, Cleanup::Removed { path: update.path });
    assert_eq!(fx.stored_path(), None);
    assert!(fx.image_files().is_empty());

    assert_eq!(
        fx.store.clear_asset(&fx.db, fx.set).unwrap(),
        Cleanup::NotNeeded
    );
}

#[test]
fn test_invalid_set_rejected_before_io() {
    let fx = Fixture::new();
    let a = fx.source_file("a.png", b"first");
    let err = fx
        .store
        .set_asset(&fx.db, SetId::new(0), AssetInput::File(a))
        .unwrap_err();
    assert!(err.is_validation());
    assert!(fx.image_files().is_empty());
}

#[test]
fn test_failed_commit_removes_new_file() {
    let fx = Fixture::new();
    let err = fx
        .store
        .set_asset(
            &fx.db,
            SetId::new(4242),
            AssetInput::Bytes {
                bytes: b"orphan".to_vec(),
                ext: Some("png".to_string()),
                source: PhotoSource::File,
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        AssetError::Core(samla_core::Error::NotFound { .. })
    ));
    assert!(fx.image_files().is_empty());
}

#[test]
fn test_missing_source_file() {
    let fx = Fixture::new();
    let err = fx
        .store
        .set_asset(
            &fx.db,
            fx.set,
            AssetInput::File(fx.dir.path().join("nope.png")),
        )
        .unwrap_err();
    assert!(matches!(err, AssetError::MissingFile { .. }));
    assert!(fx.image_files().is_empty());
    assert_eq!(fx.stored_path(), None);
}

#[test]
fn test_cropped_base64_with_data_url() {
    let fx = Fixture::new();
    let update = fx
        .store
        .set_asset(
            &fx.db,
            fx.set,
            AssetInput::Cropped {
                data: "data:image/webp;base64,aGVsbG8=".to_string(),
                ext: Some("webp".to_string()),
            },
        )
        .unwrap();
    assert!(update.path.ends_with(".webp"));
    assert_eq!(update.source, PhotoSource::Cropped);
    assert_eq!(fs::read(fx.store.resolve(&update.path)).unwrap(), b"hello");
}

#[test]
fn test_bad_base64_writes_nothing() {
    let fx = Fixture::new();
    let err = fx
        .store
        .set_asset(
            &fx.db,
            fx.set,
            AssetInput::Cropped {
                data: "%%%".to_string(),
                ext: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, AssetError::Decode(_)));
    assert!(fx.image_files().is_empty());
}

#[test]
fn test_scanned_file_referenced_in_place() {
    let fx = Fixture::new();
    let scan = fx.images().join("scan-0001.png");
    fs::write(&scan, b"scan").unwrap();

    let update = fx
        .store
        .set_asset(
            &fx.db,
            fx.set,
            AssetInput::Scanned("Images/scan-0001.png".to_string()),
        )
        .unwrap();
    assert_eq!(update.path, "Images/scan-0001.png");
    assert_eq!(update.source, PhotoSource::Scan);
    assert_eq!(fx.image_files(), vec![scan.clone()]);

    // replacing a scan removes the scanned file like any other
    fx.store
        .set_asset(
            &fx.db,
            fx.set,
            AssetInput::Bytes {
                bytes: b"new".to_vec(),
                ext: None,
                source: PhotoSource::File,
            },
        )
        .unwrap();
    assert!(!scan.exists());
}

#[test]
fn test_scanned_file_outside_root_refused() {
    let fx = Fixture::new();
    let outside = fx.source_file("outside.png", b"x");
    let err = fx
        .store
        .set_asset(
            &fx.db,
            fx.set,
            AssetInput::Scanned(outside.to_string_lossy().into_owned()),
        )
        .unwrap_err();
    assert!(matches!(err, AssetError::OutsideRoot { .. }));
    assert_eq!(fx.stored_path(), None);
}

#[test]
fn test_previous_path_outside_root_is_not_deleted() {
    let fx = Fixture::new();
    let secret = fx.dir.path().join("secret.png");
    fs::write(&secret, b"keep me").unwrap();
    fx.db
        .replace_photo(
            fx.set,
            &PhotoReference::new("../secret.png", PhotoSource::File),
        )
        .unwrap();

    let a = fx.source_file("a.png", b"first");
    let update = fx
        .store
        .set_asset(&fx.db, fx.set, AssetInput::File(a))
        .unwrap();

    assert_eq!(
        update.previous,
        Cleanup::Refused {
            path: "../secret.png".to_string()
        }
    );
    assert!(!update.previous.is_clean());
    assert!(secret.exists());
    assert_eq!(fx.stored_path(), Some(update.path));
}

#[test]
fn test_url_download_uses_content_type() {
    let fx = Fixture::new();
    let base = serve_once("200 OK", "image/jpeg", b"jpeg-bytes");

    let update = fx
        .store
        .set_asset(&fx.db, fx.set, AssetInput::Url(format!("{base}/photo")))
        .unwrap();
    assert!(update.path.ends_with(".jpg"));
    assert_eq!(update.source, PhotoSource::Url);
    assert_eq!(
        fs::read(fx.store.resolve(&update.path)).unwrap(),
        b"jpeg-bytes"
    );
}

#[test]
fn test_url_error_status_creates_no_file() {
    let fx = Fixture::new();
    let base = serve_once("404 Not Found", "text/plain", b"missing");

    let err = fx
        .store
        .set_asset(&fx.db, fx.set, AssetInput::Url(format!("{base}/a.png")))
        .unwrap_err();
    assert!(matches!(err, AssetError::HttpStatus { status: 404, .. }));
    assert!(err.is_transient());
    assert!(fx.image_files().is_empty());
    assert_eq!(fx.stored_path(), None);
}

#[test]
fn test_stalled_body_is_a_transient_timeout() {
    let fx = Fixture::new();
    let store = fx.store.clone().with_timeout(Duration::from_secs(1));
    let base = serve_stalled(Duration::from_secs(4));

    let err = store
        .set_asset(&fx.db, fx.set, AssetInput::Url(format!("{base}/slow.png")))
        .unwrap_err();
    assert!(matches!(err, AssetError::Timeout { .. }), "{err:?}");
    assert!(err.is_transient());
    assert!(fx.image_files().is_empty());
    assert_eq!(fx.stored_path(), None);
}

#[test]
fn test_file_shared_through_scan_survives_replacement() {
    let fx = Fixture::new();
    let loc = fx.db.list_locations().unwrap()[0].id;
    let bx = fx.db.list_boxes(Some(loc)).unwrap()[0].id;
    let other = fx
        .db
        .create_bag_with_set(&NewSet::new(bx, "0002", "Garden Set"))
        .unwrap();

    let a = fx.source_file("a.png", b"first");
    let first = fx
        .store
        .set_asset(&fx.db, fx.set, AssetInput::File(a))
        .unwrap();
    fx.store
        .set_asset(&fx.db, other, AssetInput::Scanned(first.path.clone()))
        .unwrap();

    let b = fx.source_file("b.png", b"second");
    let second = fx
        .store
        .set_asset(&fx.db, fx.set, AssetInput::File(b))
        .unwrap();
    assert_eq!(
        second.previous,
        Cleanup::Shared {
            path: first.path.clone()
        }
    );
    assert!(second.previous.is_clean());

    let shared = fx.db.photo(other).unwrap().unwrap().path;
    assert_eq!(shared, first.path);
    assert!(fx.store.resolve(&shared).is_file());

    // the last set to let go removes the file
    let cleanup = fx.store.delete_set(&fx.db, other).unwrap();
    assert_eq!(cleanup, Cleanup::Removed { path: shared.clone() });
    assert!(!fx.store.resolve(&shared).exists());
}

#[test]
fn test_delete_set_removes_photo() {
    let fx = Fixture::new();
    let a = fx.source_file("a.png", b"first");
    fx.store
        .set_asset(&fx.db, fx.set, AssetInput::File(a))
        .unwrap();

    let cleanup = fx.store.delete_set(&fx.db, fx.set).unwrap();
    assert!(matches!(cleanup, Cleanup::Removed { .. }));
    assert!(!fx.db.set_exists(fx.set).unwrap());
    assert!(fx.image_files().is_empty());
}

#[test]
fn test_delete_location_releases_every_photo() {
    let fx = Fixture::new();
    let a = fx.source_file("a.png", b"first");
    fx.store
        .set_asset(&fx.db, fx.set, AssetInput::File(a))
        .unwrap();
    let location = fx.db.list_locations().unwrap()[0].id;

    let cleanups = fx.store.delete_location(&fx.db, location).unwrap();
    assert_eq!(cleanups.len(), 1);
    assert!(cleanups.iter().all(Cleanup::is_clean));
    assert!(fx.image_files().is_empty());
    assert_eq!(fx.db.stats().unwrap().sets, 0);
}

#[test]
fn test_audit_and_prune() {
    let fx = Fixture::new();
    let a = fx.source_file("a.png", b"first");
    fx.store
        .set_asset(&fx.db, fx.set, AssetInput::File(a))
        .unwrap();
    let stray = fx.images().join("stray.png");
    fs::write(&stray, b"stray").unwrap();

    let report = fx.store.audit(&fx.db).unwrap();
    assert_eq!(report.files, 2);
    assert_eq!(report.referenced, 1);
    assert_eq!(report.orphans, vec![fx.store.resolve(&stray)]);
    assert!(report.dangling.is_empty());

    assert_eq!(fx.store.prune_orphans(&fx.db).unwrap(), 1);
    assert!(!stray.exists());
    assert!(fx.store.audit(&fx.db).unwrap().is_consistent());
}

#[test]
fn test_audit_reports_dangling_reference() {
    let fx = Fixture::new();
    fx.db
        .replace_photo(
            fx.set,
            &PhotoReference::new("Images/gone.png", PhotoSource::File),
        )
        .unwrap();

    let report = fx.store.audit(&fx.db).unwrap();
    assert_eq!(report.dangling.len(), 1);
    assert_eq!(report.dangling[0].set_id, fx.set);
    assert_eq!(report.dangling[0].path, "Images/gone.png");
    assert!(!Path::new(&fx.store.resolve("Images/gone.png")).exists());
}
