//! Document rendering: question set → booklet and answer key on disk.
//!
//! A [`DocumentRenderer`] only turns a [`QuestionSet`] into bytes.
//! [`write_artifacts`] owns the file system side: both artifacts are rendered
//! in memory first, then each is written to a temporary sibling and renamed
//! into place. If anything fails, every artifact already placed is removed,
//! so a failed run never leaves half a pair behind.

pub mod encode;
pub mod markdown;

pub use markdown::MarkdownRenderer;

use crate::error::Pdf2McqError;
use crate::output::{QuestionSet, SessionReport};
use crate::session::Session;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Produces the two printable artifacts for a question set.
///
/// Implementations must treat `options[answer]` as the correct choice.
pub trait DocumentRenderer: Send + Sync {
    /// File extension of both artifacts, without the dot.
    fn extension(&self) -> &str;

    fn render_booklet(&self, set: &QuestionSet) -> Result<Vec<u8>, Pdf2McqError>;

    fn render_answer_key(&self, set: &QuestionSet) -> Result<Vec<u8>, Pdf2McqError>;
}

/// Render and atomically write `mcqs_{id}` and `answers_{id}` (plus
/// `mcqs_{id}.json` when `json` is set) into `out_dir`.
pub fn write_artifacts(
    renderer: &dyn DocumentRenderer,
    set: &QuestionSet,
    session: &Session,
    out_dir: &Path,
    json: bool,
) -> Result<SessionReport, Pdf2McqError> {
    let ext = renderer.extension();
    let booklet = renderer.render_booklet(set)?;
    let answers = renderer.render_answer_key(set)?;

    let mut files: Vec<(PathBuf, Vec<u8>)> = vec![
        (out_dir.join(session.artifact_name("mcqs", ext)), booklet),
        (out_dir.join(session.artifact_name("answers", ext)), answers),
    ];
    if json {
        let body = serde_json::to_vec_pretty(set)
            .map_err(|e| Pdf2McqError::Internal(format!("JSON serialisation: {e}")))?;
        files.push((out_dir.join(session.artifact_name("mcqs", "json")), body));
    }

    std::fs::create_dir_all(out_dir).map_err(|e| Pdf2McqError::ArtifactWriteFailed {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    let mut placed: Vec<PathBuf> = Vec::with_capacity(files.len());
    for (path, bytes) in &files {
        if let Err(e) = write_atomic(path, bytes) {
            for done in &placed {
                if let Err(rm) = std::fs::remove_file(done) {
                    warn!("Could not roll back {}: {}", done.display(), rm);
                }
            }
            return Err(e);
        }
        debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        placed.push(path.clone());
    }

    let mut placed = placed.into_iter();
    let booklet_path = placed.next().unwrap_or_default();
    let answer_key_path = placed.next().unwrap_or_default();
    let json_path = placed.next();
    info!(
        "Artifacts: {}, {}",
        booklet_path.display(),
        answer_key_path.display()
    );

    Ok(SessionReport {
        session_id: session.id().to_string(),
        booklet_path,
        answer_key_path,
        json_path,
        stats: set.stats.clone(),
    })
}

/// Write to `{path}.tmp`, then rename over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Pdf2McqError> {
    let fail = |e| Pdf2McqError::ArtifactWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    if let Err(e) = std::fs::write(&tmp, bytes) {
        let _ = std::fs::remove_file(&tmp);
        return Err(fail(e));
    }
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        fail(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{AnswerKey, Complexity, GenerationStats, QuestionRecord};

    fn one_question_set() -> QuestionSet {
        let questions = vec![QuestionRecord {
            question: "2 + 2?".into(),
            options: ["3", "4", "5", "6"].map(String::from),
            answer: AnswerKey::B,
            explanation: "Arithmetic.".into(),
            complexity: Complexity::Easy,
            images: Vec::new(),
        }];
        let mut stats = GenerationStats::default();
        stats.tally(&questions);
        QuestionSet {
            session_id: "cafebabe".into(),
            questions,
            images: Vec::new(),
            request_errors: Vec::new(),
            stats,
        }
    }

    /// Booklet renders, answer key fails.
    struct HalfBroken;

    impl DocumentRenderer for HalfBroken {
        fn extension(&self) -> &str {
            "txt"
        }
        fn render_booklet(&self, _set: &QuestionSet) -> Result<Vec<u8>, Pdf2McqError> {
            Ok(b"booklet".to_vec())
        }
        fn render_answer_key(&self, _set: &QuestionSet) -> Result<Vec<u8>, Pdf2McqError> {
            Err(Pdf2McqError::RenderFailed {
                artifact: "answer key".into(),
                detail: "font missing".into(),
            })
        }
    }

    #[test]
    fn writes_both_artifacts_and_json() {
        let session = Session::new().unwrap();
        let out = tempfile::tempdir().unwrap();
        let report = write_artifacts(
            &MarkdownRenderer::default(),
            &one_question_set(),
            &session,
            out.path(),
            true,
        )
        .unwrap();

        assert!(report.booklet_path.ends_with(format!("mcqs_{}.md", session.id())));
        assert!(report.answer_key_path.ends_with(format!("answers_{}.md", session.id())));
        assert_eq!(report.artifacts().count(), 3);
        for p in report.artifacts() {
            assert!(p.exists(), "missing {}", p.display());
        }
        let json = std::fs::read_to_string(report.json_path.unwrap()).unwrap();
        assert!(json.contains("\"answer\": \"B\""), "got: {json}");
        // No temp files remain.
        let leftovers = std::fs::read_dir(out.path())
            .unwrap()
            .filter(|e| e.as_ref().unwrap().path().extension().is_some_and(|x| x == "tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn render_failure_leaves_nothing_behind() {
        let session = Session::new().unwrap();
        let out = tempfile::tempdir().unwrap();
        let err = write_artifacts(&HalfBroken, &one_question_set(), &session, out.path(), false)
            .unwrap_err();
        assert!(matches!(err, Pdf2McqError::RenderFailed { .. }));
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn write_failure_rolls_back_placed_artifacts() {
        let session = Session::new().unwrap();
        let out = tempfile::tempdir().unwrap();
        // A directory squatting on the answer key's name makes its rename fail.
        std::fs::create_dir(out.path().join(session.artifact_name("answers", "md"))).unwrap();
        std::fs::write(
            out.path()
                .join(session.artifact_name("answers", "md"))
                .join("occupied"),
            b"x",
        )
        .unwrap();

        let err = write_artifacts(
            &MarkdownRenderer::default(),
            &one_question_set(),
            &session,
            out.path(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, Pdf2McqError::ArtifactWriteFailed { .. }), "got: {err}");
        assert!(!out.path().join(session.artifact_name("mcqs", "md")).exists());
    }
}
