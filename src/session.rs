//! Per-request session: a short unique id and a private workspace.
//!
//! The workspace is a `TempDir`, so it is removed when the [`Session`] is
//! dropped, whether the run succeeded, failed or panicked. Its `images/`
//! subfolder is handed to the extractor, which resets it on entry.

use crate::error::Pdf2McqError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// One generation request's identity and scratch space.
#[derive(Debug)]
pub struct Session {
    id: String,
    workspace: TempDir,
}

impl Session {
    /// Create a session with a fresh id and workspace under the system temp dir.
    pub fn new() -> Result<Self, Pdf2McqError> {
        let id = new_session_id();
        let workspace = tempfile::Builder::new()
            .prefix(&format!("pdf2mcq-{id}-"))
            .tempdir()
            .map_err(|e| Pdf2McqError::Internal(format!("session workspace: {e}")))?;
        debug!("Session {} workspace {}", id, workspace.path().display());
        Ok(Self { id, workspace })
    }

    /// Eight lowercase hex characters.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }

    /// Exclusive image output folder for this session.
    pub fn image_folder(&self) -> PathBuf {
        self.workspace.path().join("images")
    }

    /// `{stem}_{id}.{ext}`, e.g. `mcqs_1a2b3c4d.md`.
    pub fn artifact_name(&self, stem: &str, ext: &str) -> String {
        format!("{stem}_{}.{ext}", self.id)
    }
}

/// First eight hex digits of a random UUID.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_eight_hex_chars() {
        let id = new_session_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn sessions_are_distinct() {
        let a = Session::new().unwrap();
        let b = Session::new().unwrap();
        assert_ne!(a.id(), b.id());
        assert_ne!(a.image_folder(), b.image_folder());
    }

    #[test]
    fn workspace_is_removed_on_drop() {
        let session = Session::new().unwrap();
        std::fs::create_dir_all(session.image_folder()).unwrap();
        let root = session.workspace().to_path_buf();
        assert!(root.exists());
        drop(session);
        assert!(!root.exists());
    }

    #[test]
    fn artifact_names_carry_the_id() {
        let session = Session::new().unwrap();
        let name = session.artifact_name("answers", "md");
        assert_eq!(name, format!("answers_{}.md", session.id()));
    }
}
