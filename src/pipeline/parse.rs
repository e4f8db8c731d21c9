//! Response parsing: completion text → validated [`QuestionRecord`]s.
//!
//! ## Why so defensive?
//!
//! The prompt fixes a five-field template, but models still add preambles,
//! emphasis markers, stray blank lines, or drop a field when they run out of
//! tokens. The parser never repairs a block: a block either carries a
//! question, exactly four options, an answer letter and an explanation, or it
//! is discarded whole.
//!
//! ## Block grammar
//!
//! ```text
//! Question <n>: ...          ← split marker (case-insensitive), preamble dropped
//! <question text>            ← first non-empty line
//! A) ... / B) ... / C) ... / D) ...
//! Answer: <A-D>
//! Explanation: <text>
//! ```
//!
//! Lines that match none of these shapes are ignored.

use crate::output::{AnswerKey, Complexity, QuestionRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Inline correctness markers models emit despite being told not to.
static RE_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\*\*(CORRECT|WRONG|RIGHT)\*\*").unwrap());

static RE_QUESTION_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Question\s+\d+\s*:").unwrap());

static RE_OPTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[A-D]\)\s*").unwrap());

static RE_ANSWER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)answer:\s*([A-D])").unwrap());

/// Minimum non-empty lines in a block: question, four options, answer.
const MIN_BLOCK_LINES: usize = 6;

/// Parse every well-formed block in `raw`, tagging each with `complexity`.
///
/// `images` is always empty on the returned records.
pub fn parse_response(raw: &str, complexity: Complexity) -> Vec<QuestionRecord> {
    let cleaned = RE_MARKERS.replace_all(raw, "");
    let mut out = Vec::new();

    for (i, block) in RE_QUESTION_SPLIT.split(&cleaned).enumerate().skip(1) {
        match parse_block(block, complexity) {
            Some(q) => out.push(q),
            None => debug!("Dropped malformed {} block {}", complexity, i),
        }
    }

    out
}

fn parse_block(block: &str, complexity: Complexity) -> Option<QuestionRecord> {
    let lines: Vec<&str> = block
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() < MIN_BLOCK_LINES {
        return None;
    }

    let question = lines[0].trim_matches('*').trim();
    let mut options: Vec<String> = Vec::with_capacity(4);
    let mut answer: Option<AnswerKey> = None;
    let mut explanation: Option<String> = None;

    for line in &lines[1..] {
        let lower = line.to_lowercase();
        if RE_OPTION.is_match(line) {
            options.push(RE_OPTION.replace(line, "").trim().to_string());
        } else if lower.starts_with("answer:") {
            // A later line without a letter must not clear an earlier answer.
            if let Some(key) = RE_ANSWER
                .captures(line)
                .and_then(|c| c[1].chars().next())
                .and_then(AnswerKey::from_letter)
            {
                answer = Some(key);
            }
        } else if lower.starts_with("explanation:") {
            explanation = line.split_once(':').map(|(_, rest)| rest.trim().to_string());
        }
    }

    let options: [String; 4] = options.try_into().ok()?;
    if question.is_empty() || options.iter().any(String::is_empty) {
        return None;
    }
    let explanation = explanation.filter(|e| !e.is_empty())?;

    Some(QuestionRecord {
        question: question.to_string(),
        options,
        answer: answer?,
        explanation,
        complexity,
        images: Vec::new(),
    })
}
