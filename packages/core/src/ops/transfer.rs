//! Relocation: rename, move, copy. Sources and destinations may live on
//! different adapters; content is pumped through the backend streams rather
//! than assuming a shared filesystem.

use std::io::{self, Write};

use serde::Deserialize;

use super::{body_str, ensure_dir_all, list, target};
use crate::registry::{Adapter, AdapterRegistry};
use crate::request::OperationRequest;
use crate::response::Response;
use crate::vpath;
use crate::Error;

#[derive(Deserialize)]
struct TransferItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct TransferBody {
    /// Destination directory, as a virtual path.
    item: String,
    items: Vec<TransferItem>,
}

fn copy_file(src: &Adapter, src_path: &str, dst: &Adapter, dst_path: &str) -> Result<(), Error> {
    let mut reader = src.backend.open_read(src_path)?;
    let mut sink = dst.backend.open_write(dst_path, true)?;
    io::copy(&mut reader, &mut sink).map_err(Error::Io)?;
    sink.flush().map_err(Error::Io)?;
    Ok(())
}

/// Replicate a directory tree with an explicit stack so deep trees cannot
/// overflow the call stack.
///
/// A destination inside the source is refused before anything is created;
/// the walk lists the source while writing, so such a copy would otherwise
/// keep discovering its own output forever.
fn copy_tree(src: &Adapter, src_path: &str, dst: &Adapter, dst_path: &str) -> Result<(), Error> {
    if src.key == dst.key
        && (dst_path == src_path || dst_path.starts_with(&format!("{}/", src_path)))
    {
        return Err(Error::bad_request(format!(
            "cannot copy '{}' into itself",
            src_path
        )));
    }
    ensure_dir_all(dst, dst_path)?;

    let mut stack = vec![(src_path.to_string(), dst_path.to_string())];
    while let Some((from, to)) = stack.pop() {
        for entry in src.backend.list(&from)? {
            let child_from = vpath::join(&from, &entry.name);
            let child_to = vpath::join(&to, &entry.name);
            if entry.is_dir {
                ensure_dir_all(dst, &child_to)?;
                stack.push((child_from, child_to));
            } else {
                copy_file(src, &child_from, dst, &child_to)?;
            }
        }
    }
    Ok(())
}

fn remove(adapter: &Adapter, path: &str, is_dir: bool) -> Result<(), Error> {
    if is_dir {
        adapter.backend.remove_tree(path)?;
    } else {
        adapter.backend.remove_file(path)?;
    }
    Ok(())
}

/// Shared body of move and copy: place every item under the destination
/// directory, then (for move) remove the source.
fn transfer(
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
    remove_source: bool,
) -> Result<Response, Error> {
    let t = target(registry, req)?;
    let body = req
        .body
        .take()
        .ok_or_else(|| Error::bad_request("missing request body"))?;
    let body: TransferBody =
        serde_json::from_value(body).map_err(|e| Error::bad_request(e.to_string()))?;

    let (dst, dst_dir) = vpath::resolve(registry, &body.item, &t.adapter);

    for item in &body.items {
        let (src, src_path) = vpath::resolve(registry, &item.path, &t.adapter);
        let name = vpath::basename(&src_path);
        if name.is_empty() {
            return Err(Error::bad_request("cannot move the adapter root"));
        }
        let dst_path = vpath::join(&dst_dir, name);
        let is_dir = item.kind == "dir";

        if is_dir {
            copy_tree(&src, &src_path, &dst, &dst_path)?;
        } else {
            copy_file(&src, &src_path, &dst, &dst_path)?;
        }
        if remove_source {
            remove(&src, &src_path, is_dir)?;
        }
    }
    Ok(Response::json(list::listing(registry, &t)?))
}

pub(crate) fn move_items(
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
) -> Result<Response, Error> {
    transfer(registry, req, true)
}

pub(crate) fn copy_items(
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
) -> Result<Response, Error> {
    transfer(registry, req, false)
}

/// Give one item a new name under the request's resolved directory. The
/// item usually lives in that directory already, making this a sibling
/// move, but the destination is always `<resolved-dir>/<name>`.
pub(crate) fn rename(
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
) -> Result<Response, Error> {
    let t = target(registry, req)?;
    let item = body_str(req, "item")?.to_string();
    let name = body_str(req, "name")?;
    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return Err(Error::bad_request(format!("invalid name: '{}'", name)));
    }

    let (adapter, src_path) = vpath::resolve(registry, &item, &t.adapter);
    let dst_path = vpath::join(&t.path, name);
    let is_dir = adapter.backend.is_dir(&src_path)?;

    if is_dir {
        copy_tree(&adapter, &src_path, &t.adapter, &dst_path)?;
    } else {
        copy_file(&adapter, &src_path, &t.adapter, &dst_path)?;
    }
    remove(&adapter, &src_path, is_dir)?;

    Ok(Response::json(list::listing(registry, &t)?))
}
