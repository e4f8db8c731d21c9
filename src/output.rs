//! Records produced by the pipeline.
//!
//! Everything here is plain data: `Serialize`/`Deserialize` so a question set
//! can be dumped as JSON, handed to a renderer, or diffed between runs.

use crate::error::RequestError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One image extracted from the source document and written to disk.
///
/// `page` is where the extractor found it while visiting pages; `source_page`
/// is the first page on which the underlying image object is referenced
/// anywhere in the document. Both are 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub page: usize,
    pub source_page: usize,
    /// 1-indexed position of the image among the images of `page`.
    pub index: usize,
    pub filename: String,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// PDF object number of the image XObject.
    pub xref: u32,
}

impl ImageRecord {
    /// Caption used by renderers: `Figure {index} from Page {source_page}`.
    pub fn caption(&self) -> String {
        format!("Figure {} from Page {}", self.index, self.source_page)
    }
}

/// The extractor's only output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Page-marked text of the visited pages, trimmed.
    pub text: String,
    pub images: Vec<ImageRecord>,
    /// Folder holding the image files; empty when extraction aborted.
    pub image_folder: PathBuf,
    /// Pages in the whole document (0 when extraction aborted).
    pub page_count: usize,
    /// Pages actually visited for text and images.
    pub pages_extracted: usize,
}

impl ExtractionResult {
    /// The result returned whenever extraction cannot proceed.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Difficulty bucket requested of the text-completion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Easy,
    Medium,
    Hard,
}

impl Complexity {
    /// Generation order: easy first, hard last.
    pub const ALL: [Complexity; 3] = [Complexity::Easy, Complexity::Medium, Complexity::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Easy => "easy",
            Complexity::Medium => "medium",
            Complexity::Hard => "hard",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Letter of the correct option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerKey {
    A,
    B,
    C,
    D,
}

impl AnswerKey {
    /// Parse a single letter, case-insensitively.
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(AnswerKey::A),
            'B' => Some(AnswerKey::B),
            'C' => Some(AnswerKey::C),
            'D' => Some(AnswerKey::D),
            _ => None,
        }
    }

    /// `ord(answer) - ord('A')`.
    pub fn index(&self) -> usize {
        match self {
            AnswerKey::A => 0,
            AnswerKey::B => 1,
            AnswerKey::C => 2,
            AnswerKey::D => 3,
        }
    }

    pub fn letter(&self) -> char {
        (b'A' + self.index() as u8) as char
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One multiple-choice item.
///
/// The parser guarantees four non-empty options, a valid answer letter and a
/// non-empty explanation. `images` starts empty and is set once by
/// [`crate::pipeline::assign::assign_images`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question: String,
    pub options: [String; 4],
    pub answer: AnswerKey,
    pub explanation: String,
    pub complexity: Complexity,
    #[serde(default)]
    pub images: Vec<ImageRecord>,
}

impl QuestionRecord {
    /// The canonical correct choice, `options[answer]`.
    pub fn correct_option(&self) -> &str {
        &self.options[self.answer.index()]
    }
}

/// Aggregate numbers for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationStats {
    pub requested_questions: usize,
    pub produced_questions: usize,
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
    pub images_extracted: usize,
    pub images_attached: usize,
    pub page_count: usize,
    pub pages_extracted: usize,
    pub text_chars: usize,
    pub chunks: usize,
    pub requests: usize,
    pub failed_requests: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub extraction_duration_ms: u64,
    pub generation_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl GenerationStats {
    /// Recount per-difficulty and attached-image totals from `questions`.
    pub fn tally(&mut self, questions: &[QuestionRecord]) {
        self.produced_questions = questions.len();
        self.easy = 0;
        self.medium = 0;
        self.hard = 0;
        for q in questions {
            match q.complexity {
                Complexity::Easy => self.easy += 1,
                Complexity::Medium => self.medium += 1,
                Complexity::Hard => self.hard += 1,
            }
        }
        self.images_attached = questions.iter().map(|q| q.images.len()).sum();
    }

    /// `Generated N MCQs with M images! (Easy: a, Medium: b, Hard: c)`
    pub fn summary(&self) -> String {
        format!(
            "Generated {} MCQs with {} images! (Easy: {}, Medium: {}, Hard: {})",
            self.produced_questions, self.images_attached, self.easy, self.medium, self.hard
        )
    }
}

/// The final question set, ready for a renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    pub session_id: String,
    pub questions: Vec<QuestionRecord>,
    /// Every image the extractor kept, attached or not.
    pub images: Vec<ImageRecord>,
    pub request_errors: Vec<RequestError>,
    pub stats: GenerationStats,
}

/// Paths of the artifacts written for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: String,
    pub booklet_path: PathBuf,
    pub answer_key_path: PathBuf,
    pub json_path: Option<PathBuf>,
    pub stats: GenerationStats,
}

impl SessionReport {
    pub fn artifacts(&self) -> impl Iterator<Item = &Path> {
        [self.booklet_path.as_path(), self.answer_key_path.as_path()]
            .into_iter()
            .chain(self.json_path.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(complexity: Complexity, answer: AnswerKey) -> QuestionRecord {
        QuestionRecord {
            question: "Which city is the capital of France?".into(),
            options: ["Lyon".into(), "Paris".into(), "Nice".into(), "Lille".into()],
            answer,
            explanation: "Paris is the capital.".into(),
            complexity,
            images: Vec::new(),
        }
    }

    #[test]
    fn answer_key_letters() {
        assert_eq!(AnswerKey::from_letter('c'), Some(AnswerKey::C));
        assert_eq!(AnswerKey::from_letter('E'), None);
        assert_eq!(AnswerKey::D.index(), 3);
        assert_eq!(AnswerKey::B.letter(), 'B');
    }

    #[test]
    fn correct_option_follows_answer_letter() {
        let q = record(Complexity::Easy, AnswerKey::B);
        assert_eq!(q.correct_option(), "Paris");
    }

    #[test]
    fn complexity_serialises_lowercase() {
        let json = serde_json::to_string(&Complexity::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }

    #[test]
    fn tally_counts_buckets_and_images() {
        let mut with_image = record(Complexity::Hard, AnswerKey::A);
        with_image.images.push(ImageRecord {
            page: 1,
            source_page: 1,
            index: 1,
            filename: "source_page_1_img_1.png".into(),
            path: PathBuf::from("/tmp/source_page_1_img_1.png"),
            width: 200,
            height: 150,
            xref: 7,
        });
        let questions = vec![
            record(Complexity::Easy, AnswerKey::A),
            record(Complexity::Easy, AnswerKey::B),
            with_image,
        ];

        let mut stats = GenerationStats::default();
        stats.tally(&questions);
        assert_eq!((stats.easy, stats.medium, stats.hard), (2, 0, 1));
        assert_eq!(stats.images_attached, 1);
        assert_eq!(
            stats.summary(),
            "Generated 3 MCQs with 1 images! (Easy: 2, Medium: 0, Hard: 1)"
        );
    }

    #[test]
    fn image_caption_uses_source_page() {
        let img = ImageRecord {
            page: 2,
            source_page: 1,
            index: 3,
            filename: "source_page_1_img_3.png".into(),
            path: PathBuf::from("x.png"),
            width: 100,
            height: 100,
            xref: 12,
        };
        assert_eq!(img.caption(), "Figure 3 from Page 1");
    }
}
