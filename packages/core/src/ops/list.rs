//! Directory listings: index, search, subfolders.

use cabinet_backend::Metadata;
use serde_json::json;

use super::{target, Target};
use crate::registry::AdapterRegistry;
use crate::request::OperationRequest;
use crate::resource::{self, Resource};
use crate::response::Response;
use crate::Error;

/// Directories first, then case-insensitive by name.
fn sort_entries(entries: &mut [Metadata]) {
    entries.sort_by_key(|m| (!m.is_dir, m.name.to_lowercase()));
}

fn project_all(t: &Target, entries: &[Metadata]) -> Vec<Resource> {
    entries
        .iter()
        .map(|m| resource::project(&t.adapter.key, &t.path, m))
        .collect()
}

fn envelope(registry: &AdapterRegistry, t: &Target, entries: &[Metadata]) -> serde_json::Value {
    let mut storage_info = serde_json::Map::new();
    for (key, kind) in registry.snapshot() {
        storage_info.insert(key, json!({ "filesystem": kind }));
    }

    json!({
        "adapter": t.adapter.key,
        "storages": registry.keys(),
        "storage_info": storage_info,
        "dirname": t.dirname,
        "files": project_all(t, entries),
    })
}

/// The standard listing envelope. Mutating operations return this for their
/// target directory so clients can refresh in place.
pub(crate) fn listing(registry: &AdapterRegistry, t: &Target) -> Result<serde_json::Value, Error> {
    let mut entries = t.adapter.backend.list(&t.path)?;
    sort_entries(&mut entries);
    Ok(envelope(registry, t, &entries))
}

pub(crate) fn index(
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
) -> Result<Response, Error> {
    let t = target(registry, req)?;
    Ok(Response::json(listing(registry, &t)?))
}

/// Like index, but entries are filtered by a case-sensitive substring match
/// on the name before sorting.
pub(crate) fn search(
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
) -> Result<Response, Error> {
    let t = target(registry, req)?;
    let filter = req.query("filter").unwrap_or("");

    let mut entries = t.adapter.backend.list(&t.path)?;
    entries.retain(|m| m.name.contains(filter));
    sort_entries(&mut entries);

    Ok(Response::json(envelope(registry, &t, &entries)))
}

/// Only the directories of the target, as `{"folders": [...]}`.
pub(crate) fn subfolders(
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
) -> Result<Response, Error> {
    let t = target(registry, req)?;
    let mut entries = t.adapter.backend.list(&t.path)?;
    entries.retain(|m| m.is_dir);
    sort_entries(&mut entries);

    Ok(Response::json(json!({
        "folders": project_all(&t, &entries),
    })))
}
