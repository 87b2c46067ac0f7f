//! Deterministic mock gene annotation service.
//!
//! Only consulted for genetics queries: [`SourceBackend::handles`] checks
//! the query for gene-related terms before the aggregator spends a
//! lookup on it.

use async_trait::async_trait;
use clinidraft_core::{EvidenceSource, SourceBackend, SourceError, title_case};
use sha2::{Digest, Sha256};

const MAX_RECORDS: usize = 2;

const DATABASE: &str = "MyGene.info";

const GENE_TERMS: &[&str] = &[
    "gene",
    "genes",
    "genetic",
    "genetics",
    "genomic",
    "hereditary",
    "mutation",
    "mutations",
    "protein",
    "proteins",
    "variant",
    "variants",
];

/// A gene annotation backend that needs no network.
#[derive(Debug, Default)]
pub struct MockGeneSource;

impl MockGeneSource {
    pub fn new() -> Self {
        Self
    }

    fn record(query: &str, index: usize) -> EvidenceSource {
        let digest = Sha256::digest(format!("gene:{}#{index}", query.to_lowercase()).as_bytes());
        let entrez = u32::from_be_bytes([0, 0, digest[0], digest[1]]) + 1;

        EvidenceSource {
            title: format!("Gene Annotation Summary: {}", title_case(query)),
            authors: vec!["MyGene.info Consortium".to_string()],
            journal: DATABASE.to_string(),
            year: 2020 + u16::from(digest[2] % 5),
            identifier: format!("entrez:{entrez}"),
            url: Some(format!("https://mygene.info/v3/gene/{entrez}")),
            relevance_score: (60 + u32::from(digest[3]) % 30) as f32 / 100.0,
        }
    }
}

#[async_trait]
impl SourceBackend for MockGeneSource {
    fn name(&self) -> &str {
        "genes"
    }

    fn handles(&self, query: &str) -> bool {
        query
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| GENE_TERMS.iter().any(|t| word.eq_ignore_ascii_case(t)))
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

    #[test]
    fn only_handles_genetics_queries() {
        let source = MockGeneSource::new();
        assert!(source.handles("BRCA1 gene testing"));
        assert!(source.handles("Genetic counseling"));
        assert!(source.handles("cystic fibrosis mutations"));
        assert!(!source.handles("asthma"));
        assert!(!source.handles("general wellness"));
        assert!(!source.handles("discharge summary fluid status"));
    }

    #[tokio::test]
    async fn records_point_at_gene_database() {
        let source = MockGeneSource::new();
        let records = source.search("BRCA1 gene", 5).await.unwrap();
        assert_eq!(records.len(), MAX_RECORDS);
        for record in records {
            assert_eq!(record.journal, DATABASE);
            assert!(record.identifier.starts_with("entrez:"));
            assert!(record.title.ends_with("BRCA1 Gene"));
        }
    }
}
