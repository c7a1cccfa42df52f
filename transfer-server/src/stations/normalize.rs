//! Name normalization for station search.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Fold a station name for comparison: accents stripped, lowercase,
/// whitespace collapsed to single spaces.
///
/// # Examples
///
/// ```
/// use transfer_server::stations::normalize;
///
/// assert_eq!(normalize("  Zürich  HB "), "zurich hb");
/// assert_eq!(normalize("Genève"), normalize("geneve"));
/// ```
pub fn normalize(name: &str) -> String {
    let folded: String = name
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
