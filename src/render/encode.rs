//! Image embedding: PNG file on disk → base64 data URI.
//!
//! Embedding keeps a booklet self-contained: the session's image folder is
//! deleted when the session ends, so links to it would dangle.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

/// Read a PNG and return it as `data:image/png;base64,...`.
pub fn png_data_uri(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let b64 = STANDARD.encode(&bytes);
    debug!("Encoded {} → {} bytes base64", path.display(), b64.len());
    Ok(format!("data:image/png;base64,{b64}"))
}
