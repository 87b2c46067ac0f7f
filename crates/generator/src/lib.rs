//! Draft generation for Clinidraft.
//!
//! ```text
//!  PromptContext ──▶ ContentGenerator ──▶ Provider::complete (draft)
//!                          │
//!                          ├─ too long  ──▶ truncate at a sentence boundary
//!                          ├─ too short ──▶ one expansion pass, then accept
//!                          └─ in band   ──▶ keep
//! ```
//!
//! The reading-level [`profile`] table is static and shared by every request.
//! [`highlights`] derives titles, key points and findings from the final draft.

pub mod generator;
pub mod highlights;
pub mod length;
pub mod profile;

pub use generator::{ContentGenerator, Draft, PromptContext};
pub use highlights::details_for;
pub use length::{LengthCheck, LengthPolicy, split_sentences, truncate_to_sentences, word_count};
pub use profile::{ReadingProfile, profile};
