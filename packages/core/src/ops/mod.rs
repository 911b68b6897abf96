//! Operation handlers and the endpoint table.

mod archive;
mod fetch;
mod list;
mod mutate;
mod transfer;

use cabinet_backend::BackendError;

use crate::registry::{Adapter, AdapterRegistry};
use crate::request::{Method, OperationRequest};
use crate::response::Response;
use crate::vpath;
use crate::Error;

/// The closed set of routable operations. Anything not in this table is an
/// unknown endpoint; there is no extension hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Index,
    Search,
    Subfolders,
    Preview,
    Download,
    DownloadArchive,
    NewFolder,
    NewFile,
    Rename,
    Move,
    Copy,
    Delete,
    Upload,
    Save,
    Archive,
    Unarchive,
}

impl Endpoint {
    /// Map a method and `q` action to an endpoint.
    pub fn resolve(method: Method, action: &str) -> Option<Endpoint> {
        use Endpoint::*;
        let endpoint = match (method, action) {
            (Method::Get, "index") => Index,
            (Method::Get, "search") => Search,
            (Method::Get, "subfolders") => Subfolders,
            (Method::Get, "preview") => Preview,
            (Method::Get, "download") => Download,
            (Method::Get, "download-archive") => DownloadArchive,
            (Method::Post, "newfolder") => NewFolder,
            (Method::Post, "newfile") => NewFile,
            (Method::Post, "rename") => Rename,
            (Method::Post, "move") => Move,
            (Method::Post, "copy") => Copy,
            (Method::Post, "delete") => Delete,
            (Method::Post, "upload") => Upload,
            (Method::Post, "save") => Save,
            (Method::Post, "archive") => Archive,
            (Method::Post, "unarchive") => Unarchive,
            _ => return None,
        };
        Some(endpoint)
    }
}

/// Run one endpoint against the registry.
pub fn dispatch(
    endpoint: Endpoint,
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
) -> Result<Response, Error> {
    match endpoint {
        Endpoint::Index => list::index(registry, req),
        Endpoint::Search => list::search(registry, req),
        Endpoint::Subfolders => list::subfolders(registry, req),
        Endpoint::Preview => fetch::preview(registry, req),
        Endpoint::Download => fetch::download(registry, req),
        Endpoint::DownloadArchive => archive::download_archive(registry, req),
        Endpoint::NewFolder => mutate::new_folder(registry, req),
        Endpoint::NewFile => mutate::new_file(registry, req),
        Endpoint::Rename => transfer::rename(registry, req),
        Endpoint::Move => transfer::move_items(registry, req),
        Endpoint::Copy => transfer::copy_items(registry, req),
        Endpoint::Delete => mutate::delete(registry, req),
        Endpoint::Upload => mutate::upload(registry, req),
        Endpoint::Save => fetch::save(registry, req),
        Endpoint::Archive => archive::archive(registry, req),
        Endpoint::Unarchive => archive::unarchive(registry, req),
    }
}

/// The directory (or file) a request operates on: the resolved adapter, the
/// normalized in-backend path, and the raw `path` parameter echoed back in
/// listing responses.
pub(crate) struct Target {
    pub adapter: Adapter,
    pub path: String,
    pub dirname: String,
}

pub(crate) fn target(
    registry: &AdapterRegistry,
    req: &OperationRequest,
) -> Result<Target, Error> {
    let (adapter, path, dirname) =
        vpath::resolve_target(registry, req.query("adapter"), req.query("path"))?;
    Ok(Target {
        adapter,
        path,
        dirname,
    })
}

/// A required string field of the JSON body.
pub(crate) fn body_str<'a>(req: &'a OperationRequest, key: &str) -> Result<&'a str, Error> {
    req.body
        .as_ref()
        .and_then(|b| b.get(key))
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::bad_request(format!("missing '{}' in request body", key)))
}

/// Create `path` and any missing ancestors, one level at a time.
pub(crate) fn ensure_dir_all(adapter: &Adapter, path: &str) -> Result<(), Error> {
    if path == "/" {
        return Ok(());
    }
    let mut built = String::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        built.push('/');
        built.push_str(segment);
        match adapter.backend.make_dir(&built) {
            Ok(()) | Err(BackendError::AlreadyExists { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
