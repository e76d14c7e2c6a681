//! Keyword tokenization and Jaccard overlap.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

// ASCII letters only, 3+ long, bounded by non-word characters.
static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z]{3,}\b").expect("valid keyword regex"));

/// Lower-case `text` and collect its distinct keywords.
///
/// No stopword removal: "the" and "and" count like any other word.
#[must_use]
pub fn tokenize(text: &str) -> BTreeSet<String> {
    let lowered = text.to_lowercase();
    WORD_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Jaccard overlap of the keyword sets of `a` and `b`, in `[0, 1]`.
///
/// Returns `0.0` when neither text has any keyword.
#[must_use]
pub fn overlap_score(a: &str, b: &str) -> f32 {
    let left = tokenize(a);
    let right = tokenize(b);
    jaccard(&left, &right)
}

/// Jaccard index of two token sets.
#[must_use]
pub fn jaccard(left: &BTreeSet<String>, right: &BTreeSet<String>) -> f32 {
    let union = left.union(right).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = left.intersection(right).count();
    intersection as f32 / union as f32
}
