//! Markdown booklet and answer key.

use crate::error::Pdf2McqError;
use crate::output::{AnswerKey, QuestionRecord, QuestionSet};
use crate::render::{encode, DocumentRenderer};
use std::fmt::Write as _;
use tracing::warn;

/// Characters of question text repeated in the answer key.
const ANSWER_KEY_QUESTION_CHARS: usize = 80;

/// Renders both artifacts as GitHub-flavoured Markdown.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    /// Embed figures as data URIs (default) or link to their files.
    pub embed_images: bool,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self { embed_images: true }
    }
}

impl MarkdownRenderer {
    fn figure(&self, q: &QuestionRecord, out: &mut String) {
        for img in &q.images {
            let caption = img.caption();
            let target = if self.embed_images {
                match encode::png_data_uri(&img.path) {
                    Ok(uri) => uri,
                    Err(e) => {
                        warn!("Omitting {} from booklet: {}", img.filename, e);
                        continue;
                    }
                }
            } else {
                img.path.display().to_string()
            };
            let _ = writeln!(out, "![{caption}]({target})\n");
            let _ = writeln!(out, "*{caption}*\n");
        }
    }
}

fn ensure_questions(set: &QuestionSet, artifact: &str) -> Result<(), Pdf2McqError> {
    if set.questions.is_empty() {
        return Err(Pdf2McqError::RenderFailed {
            artifact: artifact.to_string(),
            detail: "no questions to render".into(),
        });
    }
    Ok(())
}

fn tag(q: &QuestionRecord) -> String {
    q.complexity.as_str().to_uppercase()
}

/// First `max` characters, with `...` when cut.
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}

impl DocumentRenderer for MarkdownRenderer {
    fn extension(&self) -> &str {
        "md"
    }

    fn render_booklet(&self, set: &QuestionSet) -> Result<Vec<u8>, Pdf2McqError> {
        ensure_questions(set, "question booklet")?;
        let stats = &set.stats;
        let mut out = String::new();

        out.push_str("# Generated MCQs\n\n");
        let _ = write!(
            out,
            "Total: {} questions (Easy: {}, Medium: {}, Hard: {})",
            set.questions.len(),
            stats.easy,
            stats.medium,
            stats.hard
        );
        if stats.images_attached > 0 {
            let _ = write!(out, " | Images: {}", stats.images_attached);
        }
        out.push_str("\n\n");

        for (i, q) in set.questions.iter().enumerate() {
            let _ = writeln!(out, "### {}. [{}] {}\n", i + 1, tag(q), q.question);
            self.figure(q, &mut out);
            for (letter, option) in [AnswerKey::A, AnswerKey::B, AnswerKey::C, AnswerKey::D]
                .iter()
                .zip(&q.options)
            {
                let _ = writeln!(out, "- {letter}) {option}");
            }
            out.push('\n');
        }

        Ok(out.into_bytes())
    }

    fn render_answer_key(&self, set: &QuestionSet) -> Result<Vec<u8>, Pdf2McqError> {
        ensure_questions(set, "answer key")?;
        let mut out = String::from("# Answer Key & Explanations\n\n");

        for (i, q) in set.questions.iter().enumerate() {
            let _ = writeln!(
                out,
                "### {}. [{}] Correct Answer: {}\n",
                i + 1,
                tag(q),
                q.answer
            );
            let _ = writeln!(
                out,
                "Question: {}\n",
                truncate_chars(&q.question, ANSWER_KEY_QUESTION_CHARS)
            );
            let _ = writeln!(out, "**{}) {}**\n", q.answer, q.correct_option());
            let _ = writeln!(out, "Explanation: {}\n", q.explanation);
        }

        Ok(out.into_bytes())
    }
}
