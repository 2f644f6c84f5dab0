//! Case folding and collation keys for string matching and sorting.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Unicode lowercase folding used for case-insensitive comparison.
pub fn case_fold(text: &str) -> String {
    text.to_lowercase()
}

/// Collation key: folded, compatibility-decomposed, with combining marks
/// stripped, so "Café" and "cafe" sort and match together.
pub fn sort_key(text: &str) -> String {
    case_fold(text)
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}
