//! Input resolution: a user-supplied path, URL or byte buffer → a local PDF.
//!
//! ## Why validate here?
//!
//! The extractor never fails past its boundary; a file that is not a PDF
//! would simply come back as "no extractable text". Checking the `%PDF`
//! magic up front lets the caller report the real problem instead.
//!
//! Downloads and in-memory uploads land in a `TempDir` owned by
//! [`ResolvedInput`], so the temporary copy disappears when the value is
//! dropped, whether the run succeeded or not.

use crate::error::Pdf2McqError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// The resolved input: a local path, or a temp copy kept alive by its `TempDir`.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; the body was downloaded into `_temp_dir`.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
    /// Input was a byte buffer written into `_temp_dir`.
    Uploaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Path to the PDF regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } | ResolvedInput::Uploaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to a local, magic-checked PDF path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2McqError> {
    if input.trim().is_empty() {
        return Err(Pdf2McqError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Write an uploaded PDF to a private temp dir after checking its magic.
pub fn resolve_bytes(bytes: &[u8]) -> Result<ResolvedInput, Pdf2McqError> {
    let temp_dir = TempDir::new().map_err(|e| Pdf2McqError::Internal(format!("tempdir: {e}")))?;
    let path = temp_dir.path().join("upload.pdf");
    check_magic(bytes, &path)?;
    std::fs::write(&path, bytes).map_err(|e| Pdf2McqError::Internal(format!("tempfile write: {e}")))?;
    debug!("Buffered upload of {} bytes at {}", bytes.len(), path.display());
    Ok(ResolvedInput::Uploaded {
        path,
        _temp_dir: temp_dir,
    })
}

fn check_magic(head: &[u8], path: &Path) -> Result<(), Pdf2McqError> {
    if head.starts_with(PDF_MAGIC) {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = head.len().min(4);
    magic[..n].copy_from_slice(&head[..n]);
    Err(Pdf2McqError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, Pdf2McqError> {
    let path = PathBuf::from(path_str);

    if !path.is_file() {
        return Err(Pdf2McqError::FileNotFound { path });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2McqError::PermissionDenied { path });
        }
        Err(_) => return Err(Pdf2McqError::FileNotFound { path }),
    };

    let mut head = Vec::with_capacity(4);
    file.by_ref()
        .take(4)
        .read_to_end(&mut head)
        .map_err(|e| Pdf2McqError::Internal(format!("read {}: {e}", path.display())))?;
    check_magic(&head, &path)?;

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2McqError> {
    info!("Downloading PDF from: {}", url);

    let failed = |reason: String| Pdf2McqError::DownloadFailed {
        url: url.to_string(),
        reason,
    };
    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            Pdf2McqError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let mut response = client.get(url).send().await.map_err(classify)?;
    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let temp_dir = TempDir::new().map_err(|e| Pdf2McqError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(filename_from_url(url));
    let mut file = tokio::fs::File::create(&file_path)
        .await
        .map_err(|e| Pdf2McqError::Internal(format!("Failed to create temp file: {e}")))?;

    let mut head: Vec<u8> = Vec::with_capacity(4);
    let mut total = 0usize;
    while let Some(chunk) = response.chunk().await.map_err(classify)? {
        if head.len() < 4 {
            let need = (4 - head.len()).min(chunk.len());
            head.extend_from_slice(&chunk[..need]);
            if head.len() == 4 {
                check_magic(&head, &file_path)?;
            }
        }
        file.write_all(&chunk)
            .await
            .map_err(|e| Pdf2McqError::Internal(format!("Failed to write temp file: {e}")))?;
        total += chunk.len();
    }
    file.flush()
        .await
        .map_err(|e| Pdf2McqError::Internal(format!("Failed to write temp file: {e}")))?;
    check_magic(&head, &file_path)?;

    info!("Downloaded {} bytes to: {}", total, file_path.display());
    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last URL path segment when it looks like a file name, else `downloaded.pdf`.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}
