//! Deterministic mock literature backend.
//!
//! Records are synthesized from a SHA-256 digest of the query, so the same
//! query always yields the same records in the same order, across runs and
//! processes. Nothing here touches the network.

use async_trait::async_trait;
use clinidraft_core::{EvidenceSource, SourceBackend, SourceError, title_case};
use sha2::{Digest, Sha256};

/// Upper bound on records the mock will synthesize for one query.
const MAX_RECORDS: usize = 10;

const TITLE_TEMPLATES: &[&str] = &[
    "Clinical Guidelines for {q}",
    "Evidence-Based Management of {q}: A Systematic Review",
    "Outcomes in {q}: A Randomized Controlled Trial",
    "Patient-Centered Approaches to {q}",
    "Recent Advances in {q}",
    "{q} in Primary Care: A Narrative Review",
];

const AUTHORS: &[&str] = &[
    "Smith, J.",
    "Johnson, M.",
    "Brown, K.",
    "Wilson, R.",
    "Garcia, L.",
    "Nguyen, T.",
    "Okafor, C.",
    "Kowalski, A.",
    "Haddad, S.",
    "Lindqvist, E.",
];

const JOURNALS: &[&str] = &[
    "Journal of Clinical Medicine",
    "Clinical Practice",
    "Patient Education and Counseling",
    "BMJ Open",
    "Annals of Internal Medicine",
    "Family Practice",
];

/// A literature backend that needs no network.
#[derive(Debug, Default)]
pub struct MockLiteratureSource;

impl MockLiteratureSource {
    pub fn new() -> Self {
        Self
    }

    fn record(query: &str, index: usize) -> EvidenceSource {
        let digest = Sha256::digest(format!("{}#{index}", query.to_lowercase()).as_bytes());
        let pick = |byte: usize, len: usize| digest[byte] as usize % len;

        let subject = title_case(query);
        let title = TITLE_TEMPLATES[(index + pick(0, TITLE_TEMPLATES.len())) % TITLE_TEMPLATES.len()]
            .replace("{q}", &subject);

        let first = pick(1, AUTHORS.len());
        let second = (first + 1 + pick(2, AUTHORS.len() - 1)) % AUTHORS.len();
        let authors = vec![AUTHORS[first].to_string(), AUTHORS[second].to_string()];

        let journal = JOURNALS[pick(3, JOURNALS.len())].to_string();
        let year = 2015 + u16::from(digest[4] % 10);

        let identifier = format!("10.5555/{}", hex::encode(&digest[8..12]));
        let url = Some(format!("https://doi.org/{identifier}"));

        // Two decimal places in [0.50, 0.99].
        let raw = u16::from_be_bytes([digest[5], digest[6]]) as u32 % 50;
        let relevance_score = (50 + raw) as f32 / 100.0;

        EvidenceSource {
            title,
            authors,
            journal,
            year,
            identifier,
            url,
            relevance_score,
        }
    }
}

#[async_trait]
impl SourceBackend for MockLiteratureSource {
    fn name(&self) -> &str {
        "literature"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<EvidenceSource>, SourceError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok((0..limit.min(MAX_RECORDS))
            .map(|i| Self::record(query, i))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_query_same_records() {
        let source = MockLiteratureSource::new();
        let a = source.search("diabetes management", 5).await.unwrap();
        let b = source.search("Diabetes Management", 5).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
    }

    #[tokio::test]
    async fn records_are_well_formed() {
        let source = MockLiteratureSource::new();
        for record in source.search("asthma", MAX_RECORDS).await.unwrap() {
            assert!(record.title.contains("Asthma"), "{}", record.title);
            assert_eq!(record.authors.len(), 2);
            assert_ne!(record.authors[0], record.authors[1]);
            assert!((2015..=2024).contains(&record.year));
            assert!((0.5..=0.99).contains(&record.relevance_score));
            assert!(record.identifier.starts_with("10.5555/"));
            assert!(record.url.as_deref().unwrap().ends_with(&record.identifier));
        }
    }

    #[tokio::test]
    async fn limit_is_capped() {
        let source = MockLiteratureSource::new();
        assert_eq!(source.search("asthma", 100).await.unwrap().len(), MAX_RECORDS);
        assert!(source.search("asthma", 0).await.unwrap().is_empty());
        assert!(source.search("   ", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn titles_keep_acronyms() {
        let source = MockLiteratureSource::new();
        let records = source.search("hiv prevention", 3).await.unwrap();
        let upper = source.search("HIV prevention", 3).await.unwrap();
        assert!(records.iter().all(|r| r.title.contains("Hiv Prevention")));
        assert!(upper.iter().all(|r| r.title.contains("HIV Prevention")));
        assert_eq!(
            records.iter().map(|r| &r.identifier).collect::<Vec<_>>(),
            upper.iter().map(|r| &r.identifier).collect::<Vec<_>>()
        );
    }
}
