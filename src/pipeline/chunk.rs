//! Word-bounded chunking of extracted text.

/// Split `text` into contiguous groups of at most `max_words`
/// whitespace-delimited words, each group re-joined with single spaces.
///
/// Empty (or all-whitespace) input yields no chunks. `max_words == 0` is
/// treated as 1 so the function never loops forever or drops words.
pub fn split_into_chunks(text: &str, max_words: usize) -> Vec<String> {
    let max_words = max_words.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    words.chunks(max_words).map(|c| c.join(" ")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(split_into_chunks("", 600).is_empty());
        assert!(split_into_chunks("  \n\t ", 600).is_empty());
    }

    #[test]
    fn last_chunk_may_be_shorter() {
        let chunks = split_into_chunks("a b c d e", 2);
        assert_eq!(chunks, vec!["a b", "c d", "e"]);
    }

    #[test]
    fn page_markers_are_just_words() {
        let chunks = split_into_chunks("\n--- Page 1 ---\nHello world", 600);
        assert_eq!(chunks, vec!["--- Page 1 --- Hello world"]);
    }

    proptest! {
        #[test]
        fn chunking_preserves_word_sequence(
            words in proptest::collection::vec("[a-zA-Z0-9]{1,8}", 0..300),
            max_words in 1usize..50,
        ) {
            let text = words.join(" \n ");
            let chunks = split_into_chunks(&text, max_words);
            let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.split_whitespace()).collect();
            prop_assert_eq!(rejoined, words.iter().map(String::as_str).collect::<Vec<_>>());
            for c in &chunks {
                let n = c.split_whitespace().count();
                prop_assert!(n >= 1 && n <= max_words);
            }
        }
    }
}
