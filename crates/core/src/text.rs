//! Small casing helpers shared by the template provider, the mock sources
//! and the result assembler.

/// Uppercase the first character, leaving the rest untouched.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Uppercase the first character of each whitespace-separated word.
///
/// Runs of whitespace collapse to one space and the remaining characters
/// keep their case, so acronyms like "HIV" or "COPD" survive.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}
