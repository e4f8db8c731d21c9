//! Prompt template for question generation.
//!
//! The output template spelled out here is exactly what
//! [`crate::pipeline::parse`] expects. Change one, change the other; the
//! tests below pin the lines the parser depends on.

use crate::output::Complexity;

/// What each difficulty bucket asks of the model.
pub fn complexity_instruction(complexity: Complexity) -> &'static str {
    match complexity {
        Complexity::Easy => {
            "Create simple questions focusing on basic facts, definitions, and direct recall from the text."
        }
        Complexity::Medium => {
            "Create questions requiring understanding of relationships, basic analysis, and application of concepts."
        }
        Complexity::Hard => {
            "Create challenging questions requiring deep analysis, evaluation, synthesis, and critical thinking."
        }
    }
}

/// Fixed five-field answer template.
pub const OUTPUT_TEMPLATE: &str = "Format each question exactly as:
Question 1: [Your question here]
A) [Option 1]
B) [Option 2]
C) [Option 3]
D) [Option 4]
Answer: [A/B/C/D]
Explanation: [Brief explanation why this answer is correct]";

/// Build the prompt asking for `count` questions of `complexity` from `chunk`.
pub fn build_question_prompt(count: usize, complexity: Complexity, chunk: &str) -> String {
    format!(
        "Create {count} {complexity} difficulty multiple choice questions from this text.\n\n\
         {instruction}\n\n\
         Text: {chunk}\n\n\
         {OUTPUT_TEMPLATE}\n\n\
         Requirements:\n\
         - Generate exactly {count} questions\n\
         - Each question must have 4 options (A, B, C, D)\n\
         - Do NOT include markers like **CORRECT** or **WRONG** in options\n\
         - Provide clear explanations for each answer\n\
         - Base questions strictly on the provided text",
        instruction = complexity_instruction(complexity),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_count_and_bucket() {
        let p = build_question_prompt(3, Complexity::Hard, "Some text.");
        assert!(p.starts_with("Create 3 hard difficulty"), "got: {p}");
        assert!(p.contains("Text: Some text."));
        assert!(p.contains("Generate exactly 3 questions"));
        assert!(p.contains("critical thinking"));
    }

    #[test]
    fn prompt_forbids_inline_markers() {
        let p = build_question_prompt(1, Complexity::Easy, "x");
        assert!(p.contains("Do NOT include markers like **CORRECT** or **WRONG**"));
    }

    #[test]
    fn template_lines_match_parser_shape() {
        for needle in ["Question 1:", "A) ", "D) ", "Answer:", "Explanation:"] {
            assert!(OUTPUT_TEMPLATE.contains(needle), "missing {needle}");
        }
    }
}
