//! Plain lexical overlap scoring.

use std::collections::HashSet;

/// Lower-case `text` and split it on whitespace into a set of words.
///
/// Punctuation stays attached to its word, so `meeting,` and `meeting` differ.
pub fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Number of distinct words shared by the two sets. Not normalized by length.
pub fn overlap_score(query: &HashSet<String>, template: &HashSet<String>) -> usize {
    // Iterate the smaller set
    let (small, large) = if query.len() <= template.len() {
        (query, template)
    } else {
        (template, query)
    };
    small.iter().filter(|word| large.contains(*word)).count()
}
