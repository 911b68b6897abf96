//! Single-file content: preview, download, save.

use std::io::Write;

use super::{body_str, target};
use crate::registry::AdapterRegistry;
use crate::request::OperationRequest;
use crate::response::Response;
use crate::vpath;
use crate::Error;

/// Stream a file inline with its guessed MIME type.
pub(crate) fn preview(
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
) -> Result<Response, Error> {
    let t = target(registry, req)?;
    let name = vpath::basename(&t.path);
    let mime = mime_guess::from_path(name).first_or_octet_stream();

    let meta = t.adapter.backend.stat(&t.path)?;
    let reader = t.adapter.backend.open_read(&t.path)?;
    Ok(Response::stream(reader, meta.size)
        .with_header("Content-Type", mime.as_ref())
        .with_header(
            "Content-Disposition",
            &format!("inline; filename=\"{}\"", name),
        ))
}

/// Stream a file as an attachment. The MIME type is deliberately opaque so
/// browsers save rather than render.
pub(crate) fn download(
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
) -> Result<Response, Error> {
    let t = target(registry, req)?;
    let name = vpath::basename(&t.path).to_string();

    let meta = t.adapter.backend.stat(&t.path)?;
    let reader = t.adapter.backend.open_read(&t.path)?;
    Ok(Response::stream(reader, meta.size)
        .with_header("Content-Type", "application/octet-stream")
        .with_header(
            "Content-Disposition",
            &format!("attachment; filename=\"{}\"", name),
        ))
}

/// Overwrite the target file with the body's `content`, then answer like
/// preview so the editor can refresh from what was actually stored.
pub(crate) fn save(
    registry: &AdapterRegistry,
    req: &mut OperationRequest,
) -> Result<Response, Error> {
    let content = body_str(req, "content")?.to_string();
    {
        let t = target(registry, req)?;
        let mut sink = t.adapter.backend.open_write(&t.path, true)?;
        sink.write_all(content.as_bytes()).map_err(Error::Io)?;
        sink.flush().map_err(Error::Io)?;
    }
    preview(registry, req)
}
