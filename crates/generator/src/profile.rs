//! Static reading-level profile table.

use clinidraft_core::ReadingLevel;

/// How a draft should read at a given level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingProfile {
    pub level: ReadingLevel,
    /// Instruction rendered into the system prompt.
    pub instruction: &'static str,
    pub max_sentence_words: u32,
    pub vocabulary: &'static str,
    /// Whether medical terminology may appear without a plain-language gloss.
    pub terminology_allowed: bool,
}

static PROFILES: [ReadingProfile; 5] = [
    ReadingProfile {
        level: ReadingLevel::Elementary,
        instruction: "Write for a reader at a 3rd to 5th grade level.",
        max_sentence_words: 12,
        vocabulary: "Use everyday words of one or two syllables; avoid medical jargon entirely.",
        terminology_allowed: false,
    },
    ReadingProfile {
        level: ReadingLevel::MiddleSchool,
        instruction: "Write for a reader at a 6th to 8th grade level.",
        max_sentence_words: 15,
        vocabulary: "Use simple words; explain any medical term the first time it appears.",
        terminology_allowed: false,
    },
    ReadingProfile {
        level: ReadingLevel::HighSchool,
        instruction: "Write for a reader at a 9th to 12th grade level.",
        max_sentence_words: 20,
        vocabulary: "Use clear language; common medical terms are fine with a short explanation.",
        terminology_allowed: true,
    },
    ReadingProfile {
        level: ReadingLevel::College,
        instruction: "Write for a college-educated reader.",
        max_sentence_words: 25,
        vocabulary: "Medical terminology is acceptable where it adds precision.",
        terminology_allowed: true,
    },
    ReadingProfile {
        level: ReadingLevel::Professional,
        instruction: "Write for healthcare professionals.",
        max_sentence_words: 30,
        vocabulary: "Use standard clinical terminology and abbreviations.",
        terminology_allowed: true,
    },
];

/// The profile for `level`.
pub fn profile(level: ReadingLevel) -> &'static ReadingProfile {
    match level {
        ReadingLevel::Elementary => &PROFILES[0],
        ReadingLevel::MiddleSchool => &PROFILES[1],
        ReadingLevel::HighSchool => &PROFILES[2],
        ReadingLevel::College => &PROFILES[3],
        ReadingLevel::Professional => &PROFILES[4],
    }
}
