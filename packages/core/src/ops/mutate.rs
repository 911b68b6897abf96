//! Creation and deletion: newfolder, newfile, delete, upload.

use std::io::{self, Write};

use cabinet_backend::BackendError;
use serde::Deserialize;

use super::{body_str, ensure_dir_all, list, target};
use crate::registry::AdapterRegistry;
use crate::request::OperationRequest;
use crate::response::Response;
use crate::vpath;
use crate::Error;

/// A single entry name must be non-empty and stay inside the directory.
fn checked_name(name: &str) -> Result<&str, Error> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains('\0') {
        return Err(Error::bad_request(format!("invalid name: '{}'", name)));
    }
    Ok(name)
}

pub(crate) fn new_folder(
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
) -> Result<Response, Error> {
    let t = target(registry, req)?;
    let name = checked_name(body_str(req, "name")?)?;

    t.adapter.backend.make_dir(&vpath::join(&t.path, name))?;
    Ok(Response::json(list::listing(registry, &t)?))
}

pub(crate) fn new_file(
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
) -> Result<Response, Error> {
    let t = target(registry, req)?;
    let name = checked_name(body_str(req, "name")?)?;
    let path = vpath::join(&t.path, name);

    if t.adapter.backend.exists(&path)? {
        return Err(BackendError::already_exists(&path).into());
    }
    let mut sink = t.adapter.backend.open_write(&path, true)?;
    sink.flush().map_err(Error::Io)?;
    drop(sink);

    Ok(Response::json(list::listing(registry, &t)?))
}

#[derive(Deserialize)]
struct DeleteItem {
    path: String,
}

#[derive(Deserialize)]
struct DeleteBody {
    items: Vec<DeleteItem>,
}

/// Remove each listed item. What the backend says the path is decides
/// between file and tree removal; any type a client declares is ignored.
pub(crate) fn delete(
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
) -> Result<Response, Error> {
    let t = target(registry, req)?;
    let body = req
        .body
        .take()
        .ok_or_else(|| Error::bad_request("missing request body"))?;
    let body: DeleteBody =
        serde_json::from_value(body).map_err(|e| Error::bad_request(e.to_string()))?;

    for item in &body.items {
        let (adapter, path) = vpath::resolve(registry, &item.path, &t.adapter);
        if adapter.backend.is_dir(&path)? {
            adapter.backend.remove_tree(&path)?;
        } else {
            adapter.backend.remove_file(&path)?;
        }
    }
    Ok(Response::json(list::listing(registry, &t)?))
}

/// Store each uploaded file under the target directory. Upload names may
/// carry relative folder parts (folder uploads); missing parents are
/// created, and a name may never escape the target.
pub(crate) fn upload(
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
) -> Result<Response, Error> {
    let t = target(registry, req)?;
    if req.uploads.is_empty() {
        return Err(Error::bad_request("no files uploaded"));
    }

    for mut item in req.uploads.drain(..) {
        if item.name.is_empty() {
            return Err(Error::bad_request("uploaded file has no name"));
        }
        let dest = vpath::join(&t.path, &item.name);
        if t.path != "/" && !dest.starts_with(&format!("{}/", t.path)) {
            return Err(Error::bad_request(format!("invalid name: '{}'", item.name)));
        }

        let parent = vpath::join(&dest, "..");
        ensure_dir_all(&t.adapter, &parent)?;

        let mut sink = t.adapter.backend.open_write(&dest, true)?;
        io::copy(&mut item.content, &mut sink).map_err(Error::Io)?;
        sink.flush().map_err(Error::Io)?;
    }
    Ok(Response::ok())
}
