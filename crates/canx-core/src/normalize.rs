//! Text canonicalization applied before rule matching.

/// Canonicalize policy text.
///
/// Line endings are unified, whitespace runs collapse to a single space, the
/// result is trimmed and uppercased so rule patterns need not care about case.
/// The function is total and idempotent.
pub fn normalize(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    collapse_whitespace(&unified).to_uppercase()
}

/// Collapse every whitespace run into one space and trim both ends.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
