//! Projection of backend metadata into the wire resource shape.

use std::time::{SystemTime, UNIX_EPOCH};

use cabinet_backend::Metadata;
use serde::Serialize;

use crate::vpath;

/// Resource kind on the wire: `"dir"` or `"file"`.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Dir,
    File,
}

/// One directory entry as clients see it.
///
/// Every field is always present in the JSON output; optional values
/// serialize as `null`. The `path` is a full virtual path including the
/// adapter key prefix.
#[derive(Serialize, Debug, Clone)]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub path: String,
    pub visibility: String,
    pub last_modified: Option<f64>,
    pub mime_type: Option<String>,
    pub extra_metadata: Vec<serde_json::Value>,
    pub basename: String,
    pub extension: String,
    pub storage: String,
    pub file_size: Option<u64>,
}

/// Build the wire resource for an entry named by `meta` inside `dir_path`
/// of the adapter `storage`. Pure: no backend calls.
pub fn project(storage: &str, dir_path: &str, meta: &Metadata) -> Resource {
    // The root directory collapses to an empty segment so root entries read
    // "key://name" rather than "key:///name". `dir` keeps its leading slash,
    // which supplies the second slash of the separator.
    let dir = if dir_path == "/" { "" } else { dir_path };
    let path = format!("{}:/{}/{}", storage, dir, meta.name);

    let kind = if meta.is_dir {
        ResourceKind::Dir
    } else {
        ResourceKind::File
    };
    // Extension and MIME come from the name alone, directories included;
    // a dir named "photos" reports extension "photos" (the dot-less quirk).
    let mime_type = mime_guess::from_path(&meta.name).first().map(|m| m.to_string());
    let extension = vpath::extension_of(&meta.name).to_string();

    Resource {
        kind,
        path,
        visibility: "public".to_string(),
        last_modified: meta.modified.map(unix_seconds),
        mime_type,
        extra_metadata: Vec::new(),
        basename: meta.name.clone(),
        extension,
        storage: storage.to_string(),
        file_size: if meta.is_dir { None } else { meta.size },
    }
}

fn unix_seconds(t: SystemTime) -> f64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}
