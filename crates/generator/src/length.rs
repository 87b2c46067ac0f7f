//! Word counting, sentence splitting and the length tolerance band.

use clinidraft_config::GenerationConfig;

/// Abbreviations whose trailing period does not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "Dr.", "Mr.", "Mrs.", "Ms.", "Prof.", "vs.", "etc.", "e.g.", "i.e.", "approx.", "pt.", "no.",
];

/// Whitespace-delimited token count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn ends_with_abbreviation(prefix: &str) -> bool {
    ABBREVIATIONS.iter().any(|abbr| {
        prefix.len() >= abbr.len()
            && prefix.is_char_boundary(prefix.len() - abbr.len())
            && prefix[prefix.len() - abbr.len()..].eq_ignore_ascii_case(abbr)
            && prefix[..prefix.len() - abbr.len()]
                .chars()
                .next_back()
                .is_none_or(|c| !c.is_alphanumeric())
    })
}

/// Split text into trimmed sentences.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace or the end of
/// the text. Periods inside numbers and after common abbreviations do not
/// split. Trailing text without a terminator is its own sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let end = i + c.len_utf8();
        let at_boundary = text[end..].chars().next().is_none_or(char::is_whitespace);
        if !at_boundary || (c == '.' && ends_with_abbreviation(&text[start..end])) {
            continue;
        }
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = end;
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// Cut `text` back to the longest run of leading whole sentences whose word
/// count does not exceed `target`. If the first sentence alone is longer than
/// `target`, it is kept on its own.
pub fn truncate_to_sentences(text: &str, target: usize) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut words = 0;

    for sentence in split_sentences(text) {
        let n = word_count(sentence);
        if words + n > target {
            if kept.is_empty() {
                kept.push(sentence);
            }
            break;
        }
        kept.push(sentence);
        words += n;
    }

    kept.join(" ")
}

/// Where a draft sits relative to the tolerance band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthCheck {
    Short,
    Within,
    Long,
}

/// Tolerance band around the target word count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthPolicy {
    pub lower_tolerance: f64,
    pub upper_tolerance: f64,
    pub max_expansion_passes: u32,
}

impl Default for LengthPolicy {
    fn default() -> Self {
        Self {
            lower_tolerance: 0.9,
            upper_tolerance: 1.1,
            max_expansion_passes: 1,
        }
    }
}

impl LengthPolicy {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            lower_tolerance: config.lower_tolerance,
            upper_tolerance: config.upper_tolerance,
            max_expansion_passes: config.max_expansion_passes,
        }
    }

    pub fn check(&self, actual: usize, target: u32) -> LengthCheck {
        let actual = actual as f64;
        let target = f64::from(target);
        if actual > target * self.upper_tolerance {
            LengthCheck::Long
        } else if actual < target * self.lower_tolerance {
            LengthCheck::Short
        } else {
            LengthCheck::Within
        }
    }
}
