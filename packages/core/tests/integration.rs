use std::io::Read;
use std::sync::Arc;
use std::thread;

use serde_json::json;

use cabinet_core::{Body, FileManager, OperationRequest, Response, Upload};
use cabinet_stores::{LocalBackend, MemoryBackend, ReadOnly};

/// Two memory adapters with a small seeded tree on the first.
fn manager() -> FileManager {
    let fm = FileManager::new();

    let m1 = MemoryBackend::new();
    m1.put("/foo.txt", "foo");
    m1.put("/bar.txt", "bar");
    m1.put("/dir/baz.txt", "baz");
    m1.put("/dir/nested/deep.txt", "deep");
    fm.add_backend("m1", Arc::new(m1));

    fm.add_backend("m2", Arc::new(MemoryBackend::new()));
    fm
}

fn body_json(resp: &Response) -> &serde_json::Value {
    resp.json_body().expect("expected a JSON body")
}

fn body_bytes(resp: Response) -> Vec<u8> {
    match resp.body {
        Body::Stream { mut reader, .. } => {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf).unwrap();
            buf
        }
        other => panic!("expected a stream body, got {:?}", other),
    }
}

fn file_names(listing: &serde_json::Value) -> Vec<&str> {
    listing["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["basename"].as_str().unwrap())
        .collect()
}

#[test]
fn test_index_lists_default_adapter() {
    let fm = manager();
    let resp = fm.handle(OperationRequest::get("index"));
    assert!(resp.is_success());

    let v = body_json(&resp);
    assert_eq!(v["adapter"], "m1");
    assert_eq!(v["storages"], json!(["m1", "m2"]));
    assert_eq!(v["storage_info"]["m1"]["filesystem"], "memory");
    assert_eq!(v["dirname"], "m1://");
    // Directories come first, then files, case-insensitive by name.
    assert_eq!(file_names(v), vec!["dir", "bar.txt", "foo.txt"]);
}

#[test]
fn test_index_resource_shape() {
    let fm = manager();
    let resp = fm.handle(OperationRequest::get("index"));
    let v = body_json(&resp);

    let foo = v["files"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["basename"] == "foo.txt")
        .unwrap();
    assert_eq!(foo["type"], "file");
    assert_eq!(foo["path"], "m1://foo.txt");
    assert_eq!(foo["storage"], "m1");
    assert_eq!(foo["extension"], "txt");
    assert_eq!(foo["mime_type"], "text/plain");
    assert_eq!(foo["visibility"], "public");
    assert_eq!(foo["file_size"], 3);
    assert!(foo["last_modified"].as_f64().is_some());
    assert_eq!(foo["extra_metadata"], json!([]));

    let dir = v["files"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["basename"] == "dir")
        .unwrap();
    assert_eq!(dir["type"], "dir");
    assert_eq!(dir["path"], "m1://dir");
    // Directories go through the same name-based projection as files.
    assert_eq!(dir["extension"], "dir");
    assert!(dir["mime_type"].is_null());
    assert!(dir["file_size"].is_null());
}

#[test]
fn test_index_of_subdirectory() {
    let fm = manager();
    let resp = fm.handle(OperationRequest::get("index").with_query("path", "m1://dir"));
    let v = body_json(&resp);

    assert_eq!(v["dirname"], "m1://dir");
    assert_eq!(file_names(v), vec!["nested", "baz.txt"]);
    let baz = &v["files"][1];
    assert_eq!(baz["path"], "m1://dir/baz.txt");
}

#[test]
fn test_unknown_adapter_falls_back_to_default() {
    let fm = manager();
    let resp = fm.handle(OperationRequest::get("index").with_query("adapter", "nope"));
    assert!(resp.is_success());
    assert_eq!(body_json(&resp)["adapter"], "m1");

    // Same for an unknown key in the path itself.
    let resp = fm.handle(OperationRequest::get("index").with_query("path", "nope://dir"));
    assert!(resp.is_success());
    assert_eq!(body_json(&resp)["dirname"], "nope://dir");
    assert_eq!(file_names(body_json(&resp)), vec!["nested", "baz.txt"]);
}

#[test]
fn test_search_filters_case_sensitively() {
    let fm = manager();
    let m1 = MemoryBackend::new();
    m1.put("/Readme.txt", "");
    m1.put("/reader.txt", "");
    m1.put("/other.txt", "");
    fm.add_backend("m3", Arc::new(m1));

    let resp = fm.handle(
        OperationRequest::get("search")
            .with_query("adapter", "m3")
            .with_query("path", "m3://")
            .with_query("filter", "read"),
    );
    assert_eq!(file_names(body_json(&resp)), vec!["reader.txt"]);
}

#[test]
fn test_subfolders() {
    let fm = manager();
    let resp = fm.handle(OperationRequest::get("subfolders").with_query("path", "m1://"));
    let v = body_json(&resp);
    let folders = v["folders"].as_array().unwrap();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0]["basename"], "dir");
    assert_eq!(folders[0]["type"], "dir");
}

#[test]
fn test_preview_and_download() {
    let fm = manager();

    let resp = fm.handle(OperationRequest::get("preview").with_query("path", "m1://foo.txt"));
    assert_eq!(resp.header("Content-Type"), Some("text/plain"));
    assert_eq!(resp.header("Content-Length"), Some("3"));
    assert_eq!(body_bytes(resp), b"foo");

    let resp = fm.handle(OperationRequest::get("download").with_query("path", "m1://foo.txt"));
    assert_eq!(resp.header("Content-Type"), Some("application/octet-stream"));
    assert_eq!(
        resp.header("Content-Disposition"),
        Some("attachment; filename=\"foo.txt\"")
    );
    assert_eq!(body_bytes(resp), b"foo");
}

#[test]
fn test_preview_missing_file_is_400() {
    let fm = manager();
    let resp = fm.handle(OperationRequest::get("preview").with_query("path", "m1://nope.txt"));
    assert_eq!(resp.status, 400);
    assert_eq!(body_json(&resp)["status"], false);
}

#[test]
fn test_save_overwrites_and_previews() {
    let fm = manager();
    let resp = fm.handle(
        OperationRequest::post("save")
            .with_query("path", "m1://foo.txt")
            .with_body(json!({"content": "rewritten"})),
    );
    assert!(resp.is_success());
    assert_eq!(body_bytes(resp), b"rewritten");

    let resp = fm.handle(OperationRequest::get("preview").with_query("path", "m1://foo.txt"));
    assert_eq!(body_bytes(resp), b"rewritten");
}

#[test]
fn test_newfolder_and_newfile() {
    let fm = manager();
    let resp = fm.handle(
        OperationRequest::post("newfolder")
            .with_query("path", "m2://")
            .with_body(json!({"name": "docs"})),
    );
    assert!(resp.is_success());
    assert_eq!(file_names(body_json(&resp)), vec!["docs"]);

    let resp = fm.handle(
        OperationRequest::post("newfile")
            .with_query("path", "m2://docs")
            .with_body(json!({"name": "empty.txt"})),
    );
    assert!(resp.is_success());
    assert_eq!(file_names(body_json(&resp)), vec!["empty.txt"]);

    // Creating the same file again is refused.
    let resp = fm.handle(
        OperationRequest::post("newfile")
            .with_query("path", "m2://docs")
            .with_body(json!({"name": "empty.txt"})),
    );
    assert_eq!(resp.status, 400);

    // Names cannot carry separators.
    let resp = fm.handle(
        OperationRequest::post("newfolder")
            .with_query("path", "m2://")
            .with_body(json!({"name": "a/b"})),
    );
    assert_eq!(resp.status, 400);
}

#[test]
fn test_rename() {
    let fm = manager();
    let resp = fm.handle(
        OperationRequest::post("rename")
            .with_query("path", "m1://")
            .with_body(json!({"item": "m1://foo.txt", "name": "renamed.txt"})),
    );
    assert!(resp.is_success());
    let names = file_names(body_json(&resp));
    assert!(names.contains(&"renamed.txt"));
    assert!(!names.contains(&"foo.txt"));

    let resp = fm.handle(OperationRequest::get("preview").with_query("path", "m1://renamed.txt"));
    assert_eq!(body_bytes(resp), b"foo");
}

#[test]
fn test_move_across_adapters() {
    let fm = manager();
    let resp = fm.handle(
        OperationRequest::post("move")
            .with_query("path", "m1://")
            .with_body(json!({
                "item": "m2://",
                "items": [
                    {"path": "m1://foo.txt", "type": "file"},
                    {"path": "m1://dir", "type": "dir"},
                ],
            })),
    );
    assert!(resp.is_success());
    // The response re-lists the source directory.
    assert_eq!(file_names(body_json(&resp)), vec!["bar.txt"]);

    let resp = fm.handle(OperationRequest::get("index").with_query("path", "m2://"));
    assert_eq!(file_names(body_json(&resp)), vec!["dir", "foo.txt"]);

    // The whole tree came along.
    let resp = fm.handle(
        OperationRequest::get("preview").with_query("path", "m2://dir/nested/deep.txt"),
    );
    assert_eq!(body_bytes(resp), b"deep");
}

#[test]
fn test_copy_keeps_source() {
    let fm = manager();
    let resp = fm.handle(
        OperationRequest::post("copy")
            .with_query("path", "m1://")
            .with_body(json!({
                "item": "m2://",
                "items": [{"path": "m1://dir", "type": "dir"}],
            })),
    );
    assert!(resp.is_success());
    assert_eq!(file_names(body_json(&resp)), vec!["dir", "bar.txt", "foo.txt"]);

    let resp = fm.handle(
        OperationRequest::get("preview").with_query("path", "m2://dir/baz.txt"),
    );
    assert_eq!(body_bytes(resp), b"baz");
    let resp = fm.handle(
        OperationRequest::get("preview").with_query("path", "m1://dir/baz.txt"),
    );
    assert_eq!(body_bytes(resp), b"baz");
}

#[test]
fn test_delete() {
    let fm = manager();
    let resp = fm.handle(
        OperationRequest::post("delete")
            .with_query("path", "m1://")
            .with_body(json!({
                "items": [
                    {"path": "m1://foo.txt"},
                    {"path": "m1://dir"},
                ],
            })),
    );
    assert!(resp.is_success());
    assert_eq!(file_names(body_json(&resp)), vec!["bar.txt"]);
}

#[test]
fn test_delete_ignores_declared_type() {
    let fm = manager();
    // The backend's own answer decides the removal mode; a directory
    // mislabeled as a file still goes away with its whole subtree.
    let resp = fm.handle(
        OperationRequest::post("delete")
            .with_query("path", "m1://")
            .with_body(json!({
                "items": [{"path": "m1://dir", "type": "file"}],
            })),
    );
    assert!(resp.is_success());
    assert_eq!(file_names(body_json(&resp)), vec!["bar.txt", "foo.txt"]);

    let resp = fm.handle(
        OperationRequest::get("preview").with_query("path", "m1://dir/nested/deep.txt"),
    );
    assert_eq!(resp.status, 400);
}

#[test]
fn test_transfer_into_itself_is_rejected() {
    let fm = manager();

    // Into itself (the destination lands inside the source tree).
    for action in ["copy", "move"] {
        let resp = fm.handle(
            OperationRequest::post(action)
                .with_query("path", "m1://")
                .with_body(json!({
                    "item": "m1://dir",
                    "items": [{"path": "m1://dir", "type": "dir"}],
                })),
        );
        assert_eq!(resp.status, 400, "{} should be refused", action);
    }

    // Onto itself (destination directory is the item's own parent).
    let resp = fm.handle(
        OperationRequest::post("copy")
            .with_query("path", "m1://")
            .with_body(json!({
                "item": "m1://",
                "items": [{"path": "m1://dir", "type": "dir"}],
            })),
    );
    assert_eq!(resp.status, 400);

    // Nothing was created inside the source tree.
    let resp = fm.handle(OperationRequest::get("index").with_query("path", "m1://dir"));
    assert_eq!(file_names(body_json(&resp)), vec!["nested", "baz.txt"]);
}

#[test]
fn test_rename_targets_resolved_directory() {
    let fm = manager();
    let resp = fm.handle(
        OperationRequest::post("rename")
            .with_query("path", "m1://dir")
            .with_body(json!({"item": "m1://foo.txt", "name": "moved.txt"})),
    );
    assert!(resp.is_success());
    // The response re-lists the resolved directory, which now holds the item.
    assert!(file_names(body_json(&resp)).contains(&"moved.txt"));

    let resp = fm.handle(
        OperationRequest::get("preview").with_query("path", "m1://dir/moved.txt"),
    );
    assert_eq!(body_bytes(resp), b"foo");
    let resp = fm.handle(OperationRequest::get("preview").with_query("path", "m1://foo.txt"));
    assert_eq!(resp.status, 400);
}

#[test]
fn test_upload_creates_parents() {
    let fm = manager();
    let mut req = OperationRequest::post("upload").with_query("path", "m2://");
    req = req.with_upload(Upload::from_bytes("album/cover.png", b"png".to_vec()));
    req = req.with_upload(Upload::from_bytes("notes.md", b"# hi".to_vec()));

    let resp = fm.handle(req);
    assert!(resp.is_success());
    assert_eq!(body_json(&resp), &json!("ok"));

    let resp = fm.handle(
        OperationRequest::get("preview").with_query("path", "m2://album/cover.png"),
    );
    assert_eq!(body_bytes(resp), b"png");
}

#[test]
fn test_upload_cannot_escape_target() {
    let fm = manager();
    let req = OperationRequest::post("upload")
        .with_query("path", "m1://dir")
        .with_upload(Upload::from_bytes("../escape.txt", b"x".to_vec()));
    assert_eq!(fm.handle(req).status, 400);
}

#[test]
fn test_archive_then_unarchive_roundtrip() {
    let fm = manager();
    let resp = fm.handle(
        OperationRequest::post("archive")
            .with_query("path", "m1://")
            .with_body(json!({
                "name": "bundle",
                "items": [
                    {"path": "m1://foo.txt"},
                    {"path": "m1://dir"},
                ],
            })),
    );
    assert!(resp.is_success());
    assert!(file_names(body_json(&resp)).contains(&"bundle.zip"));

    // Repeating the archive hits the existing destination.
    let resp = fm.handle(
        OperationRequest::post("archive")
            .with_query("path", "m1://")
            .with_body(json!({"name": "bundle", "items": [{"path": "m1://foo.txt"}]})),
    );
    assert_eq!(resp.status, 400);

    let resp = fm.handle(
        OperationRequest::post("unarchive")
            .with_query("path", "m2://")
            .with_body(json!({"item": "m1://bundle.zip"})),
    );
    assert!(resp.is_success());

    let resp = fm.handle(OperationRequest::get("preview").with_query("path", "m2://foo.txt"));
    assert_eq!(body_bytes(resp), b"foo");
    let resp = fm.handle(
        OperationRequest::get("preview").with_query("path", "m2://dir/nested/deep.txt"),
    );
    assert_eq!(body_bytes(resp), b"deep");
}

#[test]
fn test_archive_name_validation() {
    let fm = manager();
    for bad in ["", "..", ".hidden", "a/b"] {
        let resp = fm.handle(
            OperationRequest::post("archive")
                .with_query("path", "m1://")
                .with_body(json!({"name": bad, "items": [{"path": "m1://foo.txt"}]})),
        );
        assert_eq!(resp.status, 400, "name {:?} should be rejected", bad);
    }
}

#[test]
fn test_unarchive_collision_writes_nothing() {
    let fm = manager();
    fm.handle(
        OperationRequest::post("archive")
            .with_query("path", "m1://")
            .with_body(json!({
                "name": "bundle",
                "items": [{"path": "m1://foo.txt"}, {"path": "m1://bar.txt"}],
            })),
    );

    // Seed a collision for bar.txt in the destination.
    let m2 = MemoryBackend::new();
    m2.put("/bar.txt", "already here");
    fm.add_backend("dest", Arc::new(m2));

    let resp = fm.handle(
        OperationRequest::post("unarchive")
            .with_query("path", "dest://")
            .with_body(json!({"item": "m1://bundle.zip"})),
    );
    assert_eq!(resp.status, 400);

    // Nothing was written, not even the non-colliding entry.
    let resp = fm.handle(OperationRequest::get("index").with_query("path", "dest://"));
    assert_eq!(file_names(body_json(&resp)), vec!["bar.txt"]);
    let resp = fm.handle(OperationRequest::get("preview").with_query("path", "dest://bar.txt"));
    assert_eq!(body_bytes(resp), b"already here");
}

#[test]
fn test_download_archive_streams_a_zip() {
    let fm = manager();
    let resp = fm.handle(
        OperationRequest::get("download-archive")
            .with_query("path", "m1://")
            .with_query("paths", r#"["m1://foo.txt", "m1://dir"]"#),
    );
    assert_eq!(resp.header("Content-Type"), Some("application/zip"));
    assert_eq!(
        resp.header("Content-Disposition"),
        Some("attachment; filename=\"archive.zip\"")
    );

    let bytes = body_bytes(resp);
    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let names: Vec<String> = (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect();
    assert!(names.contains(&"foo.txt".to_string()));
    assert!(names.iter().any(|n| n.trim_end_matches('/') == "dir"));
    assert!(names.contains(&"dir/baz.txt".to_string()));
    assert!(names.contains(&"dir/nested/deep.txt".to_string()));

    let mut content = String::new();
    zip.by_name("dir/baz.txt")
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert_eq!(content, "baz");
}

#[test]
fn test_read_only_adapter_rejects_writes() {
    let fm = FileManager::new();
    let inner = MemoryBackend::new();
    inner.put("/a.txt", "a");
    fm.add_backend("ro", Arc::new(ReadOnly::new(Arc::new(inner))));

    let resp = fm.handle(OperationRequest::get("index"));
    assert!(resp.is_success());

    let resp = fm.handle(
        OperationRequest::post("newfolder")
            .with_query("path", "ro://")
            .with_body(json!({"name": "d"})),
    );
    assert_eq!(resp.status, 400);
    assert_eq!(body_json(&resp)["status"], false);
    assert!(body_json(&resp)["message"]
        .as_str()
        .unwrap()
        .contains("read-only"));
}

#[test]
fn test_unknown_endpoint_is_404() {
    let fm = manager();
    let resp = fm.handle(OperationRequest::get("bogus"));
    assert_eq!(resp.status, 404);
    assert_eq!(body_json(&resp)["status"], false);

    // Right action on the wrong method is unknown too.
    let resp = fm.handle(OperationRequest::post("index"));
    assert_eq!(resp.status, 404);

    let resp = fm.handle(OperationRequest::new(cabinet_core::Method::Get));
    assert_eq!(resp.status, 400);
}

#[test]
fn test_options_short_circuits_with_cors() {
    let fm = FileManager::new().with_cors();
    let resp = fm.handle(OperationRequest::options());
    assert!(resp.is_success());
    assert_eq!(resp.header("Access-Control-Allow-Origin"), Some("*"));
    assert_eq!(resp.header("Access-Control-Allow-Headers"), Some("*"));
    assert!(matches!(resp.body, Body::Empty));

    // CORS headers ride on error responses as well.
    let resp = fm.handle(OperationRequest::get("bogus"));
    assert_eq!(resp.header("Access-Control-Allow-Origin"), Some("*"));
}

#[test]
fn test_empty_registry_is_a_clean_error() {
    let fm = FileManager::new();
    let resp = fm.handle(OperationRequest::get("index"));
    assert_eq!(resp.status, 400);
    assert_eq!(body_json(&resp)["status"], false);
}

#[test]
fn test_local_disk_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("photos")).unwrap();
    std::fs::write(dir.path().join("photos/cat.jpg"), b"jpeg").unwrap();

    let fm = FileManager::new();
    fm.add_backend(
        "disk",
        Arc::new(LocalBackend::new(dir.path().to_path_buf()).unwrap()),
    );

    let resp = fm.handle(OperationRequest::get("index"));
    let v = body_json(&resp);
    assert_eq!(v["storage_info"]["disk"]["filesystem"], "local");
    assert_eq!(file_names(v), vec!["photos"]);

    let resp = fm.handle(
        OperationRequest::get("preview").with_query("path", "disk://photos/cat.jpg"),
    );
    assert_eq!(resp.header("Content-Type"), Some("image/jpeg"));
    assert_eq!(body_bytes(resp), b"jpeg");
}

#[test]
fn test_concurrent_registry_churn() {
    let fm = Arc::new(manager());

    let mut handles = Vec::new();
    for i in 0..1000 {
        let fm = Arc::clone(&fm);
        handles.push(thread::spawn(move || {
            let key = format!("t{}", i);
            let mem = MemoryBackend::new();
            mem.put("/x.txt", "x");
            fm.add_backend(&key, Arc::new(mem));

            let resp = fm.handle(
                OperationRequest::get("index")
                    .with_query("adapter", &key)
                    .with_query("path", &format!("{}://", key)),
            );
            assert!(resp.is_success());
            assert_eq!(file_names(body_json(&resp)), vec!["x.txt"]);

            fm.remove_backend(&key);
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    // The seeded adapters are untouched by the churn.
    let resp = fm.handle(OperationRequest::get("index"));
    assert_eq!(body_json(&resp)["adapter"], "m1");
    assert_eq!(body_json(&resp)["storages"], json!(["m1", "m2"]));
}
