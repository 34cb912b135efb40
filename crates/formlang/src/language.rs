//! Operations on finite languages, used for bounded-length equivalence
//! checks across every representation.

use std::collections::BTreeSet;

use indexmap::IndexSet;

use crate::symbol::Symbol;

/// All words over `alphabet` of length exactly `n`.
pub fn words_of_length(alphabet: &IndexSet<Symbol>, n: usize) -> BTreeSet<String> {
    let mut words = BTreeSet::from([String::new()]);
    for _ in 0..n {
        words = words
            .iter()
            .flat_map(|w| {
                alphabet
                    .iter()
                    .map(move |a| format!("{w}{}", a.as_str()))
            })
            .collect();
    }
    words
}

/// All words over `alphabet` of length at most `n`, the empty word
/// included.
pub fn words_up_to(alphabet: &IndexSet<Symbol>, n: usize) -> BTreeSet<String> {
    (0..=n)
        .flat_map(|k| words_of_length(alphabet, k))
        .collect()
}

/// Pairwise concatenation { vw | v ∈ left, w ∈ right }.
pub fn concatenation(left: &BTreeSet<String>, right: &BTreeSet<String>) -> BTreeSet<String> {
    left.iter()
        .flat_map(|v| right.iter().map(move |w| format!("{v}{w}")))
        .collect()
}

/// Every word reversed.
pub fn reverse(language: &BTreeSet<String>) -> BTreeSet<String> {
    language
        .iter()
        .map(|w| w.chars().rev().collect())
        .collect()
}

/// The words of the language none of whose proper prefixes are in the
/// language.
pub fn no_prefix(language: &BTreeSet<String>) -> BTreeSet<String> {
    let has_proper_prefix = |w: &str| {
        w.char_indices()
            .any(|(k, _)| language.contains(&w[..k]))
    };
    language
        .iter()
        .filter(|w| !has_proper_prefix(w))
        .cloned()
        .collect()
}

/// The words of the language that are not a proper prefix of another word
/// in the language.
pub fn no_extend(language: &BTreeSet<String>) -> BTreeSet<String> {
    language
        .iter()
        .filter(|w| {
            !language
                .iter()
                .any(|v| v.len() > w.len() && v.starts_with(w.as_str()))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alphabet() -> IndexSet<Symbol> {
        [Symbol::from("a"), Symbol::from("b")].into_iter().collect()
    }

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_words_of_length() {
        assert_eq!(words_of_length(&alphabet(), 0), set(&[""]));
        assert_eq!(words_of_length(&alphabet(), 2), set(&["aa", "ab", "ba", "bb"]));
    }

    #[test]
    fn test_words_up_to_counts() {
        // 1 + 2 + 4 + 8 words
        assert_eq!(words_up_to(&alphabet(), 3).len(), 15);
        assert!(words_up_to(&alphabet(), 3).contains(""));
    }

    #[test]
    fn test_concatenation() {
        let left = set(&["a", "b"]);
        let right = set(&["", "c"]);
        assert_eq!(concatenation(&left, &right), set(&["a", "ac", "b", "bc"]));
    }

    #[test]
    fn test_reverse() {
        assert_eq!(reverse(&set(&["ab", "ba", "a"])), set(&["ba", "ab", "a"]));
    }

    #[test]
    fn test_no_prefix_and_no_extend() {
        let language = set(&["a", "ab", "b"]);
        assert_eq!(no_prefix(&language), set(&["a", "b"]));
        assert_eq!(no_extend(&language), set(&["ab", "b"]));
    }
}
