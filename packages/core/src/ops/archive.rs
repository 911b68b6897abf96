//! Zip packing and unpacking: archive, unarchive, download-archive.
//!
//! Archives are assembled and unpacked through an in-memory buffer. That
//! keeps the handlers backend-agnostic (no temp files on any particular
//! filesystem) at the cost of holding one archive in memory at a time.

use std::io::{self, Cursor, Read, Write};

use lazy_static::lazy_static;
use regex::Regex;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{body_str, ensure_dir_all, list, target};
use crate::registry::{Adapter, AdapterRegistry};
use crate::request::OperationRequest;
use crate::response::Response;
use crate::vpath;
use crate::Error;

lazy_static! {
    static ref ARCHIVE_NAME: Regex = Regex::new(r"^[^/\\\x00]+$").unwrap();
}

/// Validate a client-supplied archive name and force the `.zip` suffix.
/// Separators, traversal, and hidden names are rejected outright.
fn checked_archive_name(name: &str) -> Result<String, Error> {
    if name.is_empty() || name.starts_with('.') || !ARCHIVE_NAME.is_match(name) {
        return Err(Error::InvalidArchiveName {
            name: name.to_string(),
        });
    }
    if name.ends_with(".zip") {
        Ok(name.to_string())
    } else {
        Ok(format!("{}.zip", name))
    }
}

/// Pack the given virtual paths into a zip held in memory. Entry names are
/// relative to `base`; directories are walked with an explicit stack.
fn build_zip(
    registry: &AdapterRegistry,
    fallback: &Adapter,
    base: &str,
    paths: &[String],
) -> Result<Vec<u8>, Error> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for raw in paths {
        let (adapter, path) = vpath::resolve(registry, raw, fallback);
        let rel = vpath::relative_to(base, &path);

        if adapter.backend.is_dir(&path)? {
            let mut stack = vec![(path.clone(), rel)];
            while let Some((dir, rel)) = stack.pop() {
                if !rel.is_empty() {
                    zip.add_directory(rel.as_str(), options)?;
                }
                for entry in adapter.backend.list(&dir)? {
                    let child = vpath::join(&dir, &entry.name);
                    let child_rel = if rel.is_empty() {
                        entry.name.clone()
                    } else {
                        format!("{}/{}", rel, entry.name)
                    };
                    if entry.is_dir {
                        stack.push((child, child_rel));
                    } else {
                        zip.start_file(child_rel.as_str(), options)?;
                        let mut reader = adapter.backend.open_read(&child)?;
                        io::copy(&mut reader, &mut zip).map_err(Error::Io)?;
                    }
                }
            }
        } else {
            zip.start_file(rel.as_str(), options)?;
            let mut reader = adapter.backend.open_read(&path)?;
            io::copy(&mut reader, &mut zip).map_err(Error::Io)?;
        }
    }

    Ok(zip.finish()?.into_inner())
}

/// Pack the body's items into a new zip file inside the target directory.
pub(crate) fn archive(
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
) -> Result<Response, Error> {
    let t = target(registry, req)?;
    let name = checked_archive_name(body_str(req, "name")?)?;
    let dest = vpath::join(&t.path, &name);
    if t.adapter.backend.exists(&dest)? {
        return Err(Error::DestinationExists { path: dest });
    }

    let body = req
        .body
        .as_ref()
        .ok_or_else(|| Error::bad_request("missing request body"))?;
    let paths: Vec<String> = body
        .get("items")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.get("path").and_then(|p| p.as_str()))
                .map(|p| p.to_string())
                .collect()
        })
        .unwrap_or_default();
    if paths.is_empty() {
        return Err(Error::bad_request("nothing to archive"));
    }

    let bytes = build_zip(registry, &t.adapter, &t.path, &paths)?;
    let mut sink = t.adapter.backend.open_write(&dest, true)?;
    sink.write_all(&bytes).map_err(Error::Io)?;
    sink.flush().map_err(Error::Io)?;
    drop(sink);

    Ok(Response::json(list::listing(registry, &t)?))
}

/// Unpack the body's `item` archive into the target directory.
///
/// A pre-flight pass validates every entry and checks for collisions with
/// existing files before anything is written; on any conflict the
/// destination is left exactly as it was.
pub(crate) fn unarchive(
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
) -> Result<Response, Error> {
    let t = target(registry, req)?;
    let item = body_str(req, "item")?.to_string();
    let (src, archive_path) = vpath::resolve(registry, &item, &t.adapter);

    let mut buf = Vec::new();
    src.backend
        .open_read(&archive_path)?
        .read_to_end(&mut buf)
        .map_err(Error::Io)?;
    let mut archive = ZipArchive::new(Cursor::new(buf))?;

    // Pre-flight: validate names and detect collisions before writing.
    let mut plan: Vec<(usize, String, bool)> = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        let rel = entry.enclosed_name().ok_or_else(|| {
            Error::bad_request(format!("unsafe archive entry: '{}'", entry.name()))
        })?;
        let rel = rel.to_string_lossy().replace('\\', "/");
        let dest = vpath::join(&t.path, &rel);
        if !entry.is_dir() && t.adapter.backend.exists(&dest)? {
            return Err(Error::Collision { path: dest });
        }
        plan.push((i, dest, entry.is_dir()));
    }

    for (i, dest, is_dir) in plan {
        if is_dir {
            ensure_dir_all(&t.adapter, &dest)?;
        } else {
            ensure_dir_all(&t.adapter, &vpath::join(&dest, ".."))?;
            let mut entry = archive.by_index(i)?;
            let mut sink = t.adapter.backend.open_write(&dest, true)?;
            io::copy(&mut entry, &mut sink).map_err(Error::Io)?;
            sink.flush().map_err(Error::Io)?;
        }
    }

    Ok(Response::json(list::listing(registry, &t)?))
}

/// Stream an ad-hoc zip of the `paths` query parameter (a JSON list of
/// virtual paths) without persisting it anywhere.
pub(crate) fn download_archive(
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
) -> Result<Response, Error> {
    let t = target(registry, req)?;
    let raw = req
        .query("paths")
        .ok_or_else(|| Error::bad_request("missing 'paths' parameter"))?;
    let paths: Vec<String> =
        serde_json::from_str(raw).map_err(|e| Error::bad_request(e.to_string()))?;
    if paths.is_empty() {
        return Err(Error::bad_request("nothing to archive"));
    }

    let bytes = build_zip(registry, &t.adapter, &t.path, &paths)?;
    let len = bytes.len() as u64;
    Ok(Response::stream(Box::new(Cursor::new(bytes)), Some(len))
        .with_header("Content-Type", "application/zip")
        .with_header("Content-Disposition", "attachment; filename=\"archive.zip\""))
}
