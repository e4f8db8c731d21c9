//! One-pass heuristic association of extracted images to questions.

use crate::output::{ImageRecord, QuestionRecord};

/// Terms suggesting a question refers to something visual.
pub const VISUAL_KEYWORDS: [&str; 18] = [
    "figure",
    "diagram",
    "graph",
    "chart",
    "table",
    "image",
    "picture",
    "illustration",
    "example",
    "shown",
    "following",
    "given",
    "tower",
    "building",
    "angle",
    "triangle",
    "circle",
    "line",
];

/// Whether `question` contains any of [`VISUAL_KEYWORDS`], case-insensitively.
///
/// Substring match, so "outlined" matches "line".
pub fn references_visual(question: &str) -> bool {
    let lower = question.to_lowercase();
    VISUAL_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Attach at most one image to each visually-flagged question, consuming
/// `images` front to back with a single cursor.
///
/// Every question's `images` is overwritten: flagged questions get the next
/// unused image while any remain, all others get an empty list. Returns the
/// number of images consumed.
pub fn assign_images(questions: &mut [QuestionRecord], images: &[ImageRecord]) -> usize {
    let mut cursor = 0;
    for q in questions.iter_mut() {
        q.images.clear();
        if cursor < images.len() && references_visual(&q.question) {
            q.images.push(images[cursor].clone());
            cursor += 1;
        }
    }
    cursor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{AnswerKey, Complexity};
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn question(text: &str) -> QuestionRecord {
        QuestionRecord {
            question: text.to_string(),
            options: ["a", "b", "c", "d"].map(String::from),
            answer: AnswerKey::A,
            explanation: "because".into(),
            complexity: Complexity::Medium,
            images: Vec::new(),
        }
    }

    fn image(xref: u32) -> ImageRecord {
        ImageRecord {
            page: 1,
            source_page: 1,
            index: xref as usize,
            filename: format!("source_page_1_img_{xref}.png"),
            path: PathBuf::from(format!("/tmp/source_page_1_img_{xref}.png")),
            width: 200,
            height: 200,
            xref,
        }
    }

    #[test]
    fn keyword_matching_is_case_insensitive() {
        assert!(references_visual("What does the DIAGRAM show?"));
        assert!(references_visual("Which one is outlined?"));
        assert!(!references_visual("Who wrote Hamlet?"));
    }

    #[test]
    fn cursor_moves_forward_only() {
        let mut qs = vec![
            question("Look at the figure."),
            question("Who wrote Hamlet?"),
            question("Measure the angle."),
            question("What is in the chart?"),
        ];
        let used = assign_images(&mut qs, &[image(1), image(2)]);
        assert_eq!(used, 2);
        assert_eq!(qs[0].images[0].xref, 1);
        assert!(qs[1].images.is_empty());
        assert_eq!(qs[2].images[0].xref, 2);
        assert!(qs[3].images.is_empty());
    }

    #[test]
    fn empty_image_list_is_noop() {
        let mut qs = vec![question("Look at the figure.")];
        assert_eq!(assign_images(&mut qs, &[]), 0);
        assert!(qs[0].images.is_empty());
    }

    #[test]
    fn surplus_images_are_left_unused() {
        let mut qs = vec![question("The graph shows...")];
        assert_eq!(assign_images(&mut qs, &[image(1), image(2), image(3)]), 1);
    }

    proptest! {
        #[test]
        fn assignment_invariants(
            texts in proptest::collection::vec(
                prop_oneof![Just("See the figure"), Just("Plain question"), Just("A circle"), Just("Who?")],
                0..20,
            ),
            n_images in 0u32..10,
        ) {
            let mut qs: Vec<_> = texts.iter().map(|t| question(t)).collect();
            let imgs: Vec<_> = (1..=n_images).map(image).collect();
            let used = assign_images(&mut qs, &imgs);
            prop_assert!(used <= imgs.len());

            let mut seen = HashSet::new();
            for q in &qs {
                prop_assert!(q.images.len() <= 1);
                if !references_visual(&q.question) {
                    prop_assert!(q.images.is_empty());
                }
                for img in &q.images {
                    prop_assert!(seen.insert(img.xref));
                }
            }
            prop_assert_eq!(seen.len(), used);
        }
    }
}
