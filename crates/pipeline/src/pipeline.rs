//! The guardrail pipeline.

use std::sync::Arc;

use chrono::Utc;
use clinidraft_compliance::{ComplianceError, RuleEngine, first_blocking};
use clinidraft_config::AppConfig;
use clinidraft_core::result::{CLINICAL_DISCLAIMER, EDUCATION_DISCLAIMER};
use clinidraft_core::{
    CallerIdentity, ComplianceFinding, EvidenceSource, GenerationMetadata, GenerationRequest,
    GenerationResult, Phase, Provider, ProviderError, SourceBackend, SourceError,
};
use clinidraft_evidence::{EvidenceAggregator, query_for};
use clinidraft_generator::{ContentGenerator, PromptContext, details_for};
use clinidraft_providers::RetryingProvider;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audit::{AuditLogger, AuditOutcome, TracingSink};
use crate::cache::{Fetched, Lookup, ResponseCache};
use crate::fingerprint::fingerprint;
use crate::rejection::{Rejection, RejectionReason, Stage};

/// Safety flag added when the evidence lookup fails or times out.
pub const SOURCES_UNAVAILABLE_FLAG: &str =
    "Evidence sources unavailable; draft returned without citations";

/// Pre-check rule that switches the generator to conservative phrasing.
const SENSITIVE_TOPIC_RULE: &str = "topic.sensitive";

/// Errors building a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("compliance rules: {0}")]
    Compliance(#[from] ComplianceError),

    #[error("language model: {0}")]
    Provider(#[from] ProviderError),

    #[error("evidence sources: {0}")]
    Source(#[from] SourceError),
}

/// Health of one external capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub healthy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheHealth {
    pub enabled: bool,
    pub entries: usize,
    pub in_flight: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub generator: ComponentHealth,
    pub sources: ComponentHealth,
    pub cache: CacheHealth,
}

impl HealthReport {
    /// Sources are optional, so only the generator decides overall health.
    pub fn is_healthy(&self) -> bool {
        self.generator.healthy
    }
}

type Outcome = Result<Arc<GenerationResult>, Rejection>;

struct Inner {
    rules: RuleEngine,
    generator: ContentGenerator,
    evidence: EvidenceAggregator,
}

/// Pre-check → generation (with evidence lookup) → post-check → assembly,
/// behind a single-flight response cache.
///
/// Cheap to clone; clones share rules, cache and audit log.
#[derive(Clone)]
pub struct GuardrailPipeline {
    inner: Arc<Inner>,
    cache: Arc<ResponseCache<Arc<GenerationResult>, Rejection>>,
    audit: Arc<AuditLogger>,
}

impl GuardrailPipeline {
    /// Build the configured provider, source backends and rule set.
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let provider = clinidraft_providers::build_from_config(config)?;
        let sources = clinidraft_evidence::build_from_config(config)?;
        Self::with_components(config, provider, sources)
    }

    /// Build around explicit capabilities. The provider is wrapped in the
    /// configured retry and timeout policy.
    pub fn with_components(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        sources: Vec<Arc<dyn SourceBackend>>,
    ) -> Result<Self, PipelineError> {
        let rules = RuleEngine::with_extra_terms(
            &config.compliance.extra_unsafe_terms,
            &config.compliance.extra_sensitive_terms,
        )?;
        let provider: Arc<dyn Provider> = Arc::new(
            RetryingProvider::new(provider, config.generation.timeout())
                .with_retries(config.generation.max_retries, config.generation.backoff()),
        );

        Ok(Self {
            inner: Arc::new(Inner {
                rules,
                generator: ContentGenerator::from_config(provider, config),
                evidence: EvidenceAggregator::from_config(sources, &config.sources),
            }),
            cache: Arc::new(ResponseCache::from_config(&config.cache)),
            audit: Arc::new(AuditLogger::with_sinks(vec![Box::new(TracingSink)])),
        })
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.inner.rules
    }

    /// Run a request on behalf of an anonymous caller.
    pub async fn run(&self, request: GenerationRequest) -> Outcome {
        self.run_as(&CallerIdentity::anonymous(), request).await
    }

    /// Run a request, recording `caller` in the audit log.
    pub async fn run_as(&self, caller: &CallerIdentity, request: GenerationRequest) -> Outcome {
        let request_id = Uuid::new_v4();
        debug!(%request_id, caller = %caller, stage = %Stage::Received, "Request received");

        if let Err(error) = request.validate() {
            return Err(self.reject(
                caller,
                None,
                Rejection::new(request_id, Stage::Received, RejectionReason::Validation { error }),
            ));
        }

        let display = request.display_form();
        let request = request.normalized();
        let fp = match fingerprint(&request) {
            Ok(fp) => fp,
            Err(e) => {
                return Err(self.reject(
                    caller,
                    None,
                    Rejection::new(
                        request_id,
                        Stage::Received,
                        RejectionReason::Internal {
                            detail: format!("fingerprint: {e}"),
                        },
                    ),
                ));
            }
        };

        let inner = Arc::clone(&self.inner);
        let key = fp.clone();
        let fetched = self
            .cache
            .get_or_compute(&fp, move || async move {
                inner.execute(request_id, key, request, display).await
            })
            .await;

        match fetched {
            Ok(Fetched {
                lookup,
                result: Ok(result),
            }) => {
                let (outcome, detail) = match lookup {
                    Lookup::Computed => (AuditOutcome::Completed, None),
                    Lookup::Hit => (AuditOutcome::CacheHit, None),
                    Lookup::Joined => (AuditOutcome::CacheHit, Some("joined in-flight run".to_string())),
                };
                info!(
                    %request_id,
                    result_id = %result.request_id,
                    fingerprint = %fp,
                    stage = %Stage::Completed,
                    lookup = ?lookup,
                    "Request completed"
                );
                self.audit.log(request_id, caller, Some(&fp), outcome, detail);
                Ok(result)
            }
            Ok(Fetched {
                lookup,
                result: Err(shared),
            }) => {
                if shared.request_id != request_id {
                    debug!(
                        %request_id,
                        leader_id = %shared.request_id,
                        lookup = ?lookup,
                        "Sharing rejection from in-flight run"
                    );
                }
                let rejection = Rejection {
                    request_id,
                    ..shared
                };
                Err(self.reject(caller, Some(&fp), rejection))
            }
            Err(abandoned) => Err(self.reject(
                caller,
                Some(&fp),
                Rejection::new(
                    request_id,
                    Stage::Received,
                    RejectionReason::Internal {
                        detail: abandoned.to_string(),
                    },
                ),
            )),
        }
    }

    fn reject(&self, caller: &CallerIdentity, fp: Option<&str>, rejection: Rejection) -> Rejection {
        warn!(
            request_id = %rejection.request_id,
            fingerprint = fp.unwrap_or("-"),
            stage = %rejection.stage,
            code = rejection.reason.code(),
            "Request rejected"
        );
        let detail = match &rejection.reason {
            RejectionReason::ComplianceBlocked { rule_id, .. } => rule_id.clone(),
            other => other.code().to_string(),
        };
        self.audit.log(
            rejection.request_id,
            caller,
            fp,
            AuditOutcome::Rejected,
            Some(detail),
        );
        rejection
    }

    /// Check the language model and the source backends.
    pub async fn health(&self) -> HealthReport {
        let (generator_ok, sources_ok) = tokio::join!(
            self.inner.generator.health_check(),
            self.inner.evidence.health_check()
        );
        HealthReport {
            generator: ComponentHealth {
                name: self.inner.generator.provider_name().to_string(),
                healthy: generator_ok,
            },
            sources: ComponentHealth {
                name: self.inner.evidence.backend_name().to_string(),
                healthy: sources_ok,
            },
            cache: CacheHealth {
                enabled: self.cache.is_enabled(),
                entries: self.cache.len(),
                in_flight: self.cache.in_flight(),
            },
        }
    }
}

impl Inner {
    /// The uncached run: everything after validation and fingerprinting.
    ///
    /// `request` is the normalized form and drives screening; `display`
    /// keeps the caller's casing for the prompt, the evidence query and
    /// the result fields.
    async fn execute(
        self: Arc<Self>,
        request_id: Uuid,
        fingerprint: String,
        request: GenerationRequest,
        display: GenerationRequest,
    ) -> Outcome {
        let kind = request.kind();

        let pre = self.rules.evaluate(request.screened_input(), Phase::Pre, kind);
        if let Some(block) = first_blocking(&pre) {
            return Err(Rejection::new(
                request_id,
                Stage::Received,
                RejectionReason::ComplianceBlocked {
                    rule_id: block.rule_id.clone(),
                    message: block.message.clone(),
                },
            ));
        }
        let conservative = pre.iter().any(|f| f.rule_id == SENSITIVE_TOPIC_RULE);
        debug!(%request_id, %fingerprint, stage = %Stage::PreChecked, findings = pre.len(), conservative);

        let context = PromptContext::from_request(&display, conservative);
        let query = query_for(&display);
        let (draft, (sources, source_flag)) = tokio::join!(
            self.generator
                .generate(&context, request.reading_level(), request.word_count()),
            self.fetch_sources(query.as_deref())
        );
        let draft = draft.map_err(|e| {
            Rejection::new(
                request_id,
                Stage::PreChecked,
                RejectionReason::GenerationUnavailable {
                    detail: e.to_string(),
                },
            )
        })?;
        debug!(
            %request_id,
            %fingerprint,
            stage = %Stage::Generated,
            word_count = draft.word_count,
            sources = sources.len()
        );

        let post = self.rules.evaluate(&draft.text, Phase::Post, kind);
        debug!(%request_id, %fingerprint, stage = %Stage::PostChecked, findings = post.len());

        let safety_flags = collect_flags(&pre, &post, source_flag);
        let disclaimer = match &request {
            GenerationRequest::PatientEducation(_) => EDUCATION_DISCLAIMER,
            GenerationRequest::ClinicalSummary(_) => CLINICAL_DISCLAIMER,
        };

        let result = GenerationResult {
            request_id,
            fingerprint: fingerprint.clone(),
            details: details_for(&display, &draft.text),
            sources,
            metadata: GenerationMetadata {
                generated_at: Utc::now(),
                actual_word_count: draft.word_count,
                target_word_count: request.word_count(),
                reading_level: request.reading_level(),
                model_used: draft.model,
                length_outcome: draft.length_outcome,
                safety_flags,
                requires_review: true,
            },
            content: draft.text,
            disclaimer: disclaimer.to_string(),
        };
        debug!(%request_id, %fingerprint, stage = %Stage::Assembled);

        Ok(Arc::new(result))
    }

    async fn fetch_sources(&self, query: Option<&str>) -> (Vec<EvidenceSource>, Option<&'static str>) {
        let Some(query) = query else {
            return (Vec::new(), None);
        };
        match self.evidence.fetch(query).await {
            Ok(sources) => (sources, None),
            Err(_) => (Vec::new(), Some(SOURCES_UNAVAILABLE_FLAG)),
        }
    }
}

/// Non-blocking pre-check messages, then post-check messages, then the
/// source flag; first occurrence wins.
fn collect_flags(
    pre: &[ComplianceFinding],
    post: &[ComplianceFinding],
    source_flag: Option<&str>,
) -> Vec<String> {
    let mut flags: Vec<String> = Vec::new();
    let messages = pre
        .iter()
        .chain(post)
        .filter(|f| !f.is_blocking())
        .map(|f| f.message.as_str())
        .chain(source_flag);
    for message in messages {
        if !flags.iter().any(|f| f == message) {
            flags.push(message.to_string());
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clinidraft_compliance::HEDGING_FLAG;
    use clinidraft_core::{
        ClinicalSummaryRequest, ContentDetails, LengthOutcome, PatientEducationRequest,
        ProviderRequest, ProviderResponse, ReadingLevel, Severity, SummaryType, ValidationError,
    };
    use clinidraft_evidence::MockLiteratureSource;
    use clinidraft_providers::TemplateProvider;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Counts calls and delegates to the template model.
    struct CountingProvider {
        inner: TemplateProvider,
        call_count: Mutex<usize>,
    }

    impl CountingProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: TemplateProvider::new("template-v1"),
                call_count: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl Provider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            self.inner.complete(request).await
        }
    }

    struct DownSource;

    #[async_trait]
    impl SourceBackend for DownSource {
        fn name(&self) -> &str {
            "down"
        }

        async fn search(&self, _: &str, _: usize) -> Result<Vec<EvidenceSource>, SourceError> {
            Err(SourceError::Unavailable {
                backend: "down".into(),
                reason: "maintenance".into(),
            })
        }

        async fn health_check(&self) -> bool {
            false
        }
    }

    fn pipeline(provider: Arc<dyn Provider>) -> GuardrailPipeline {
        GuardrailPipeline::with_components(
            &AppConfig::default(),
            provider,
            vec![Arc::new(MockLiteratureSource::new())],
        )
        .unwrap()
    }

    fn education(topic: &str) -> GenerationRequest {
        GenerationRequest::PatientEducation(PatientEducationRequest::new(topic))
    }

    #[tokio::test]
    async fn education_request_completes() {
        let provider = CountingProvider::new();
        let pipeline = pipeline(provider.clone());

        let result = pipeline.run(education("Diabetes Management")).await.unwrap();
        assert!(result.metadata.requires_review);
        assert_eq!(result.metadata.reading_level, ReadingLevel::HighSchool);
        assert_eq!(result.metadata.length_outcome, LengthOutcome::WithinTolerance);
        assert_eq!(result.disclaimer, EDUCATION_DISCLAIMER);
        assert_eq!(result.sources.len(), 5);
        assert!(result.metadata.safety_flags.is_empty(), "{:?}", result.metadata.safety_flags);
        match &result.details {
            ContentDetails::PatientEducation { title, key_points } => {
                assert_eq!(title, "Understanding Diabetes Management: A Patient Guide");
                assert!(!key_points.is_empty());
            }
            other => panic!("Expected PatientEducation, got: {other:?}"),
        }
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn acronym_topics_keep_their_casing() {
        let provider = CountingProvider::new();
        let pipeline = pipeline(provider.clone());

        let result = pipeline.run(education("  HIV ")).await.unwrap();
        match &result.details {
            ContentDetails::PatientEducation { title, .. } => {
                assert_eq!(title, "Understanding HIV: A Patient Guide");
            }
            other => panic!("Expected PatientEducation, got: {other:?}"),
        }
        assert!(result.content.contains("HIV"));
        assert!(!result.content.contains("hiv"));

        let again = pipeline.run(education("hiv")).await.unwrap();
        assert_eq!(again.fingerprint, result.fingerprint);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_before_any_work() {
        let provider = CountingProvider::new();
        let pipeline = pipeline(provider.clone());
        let mut req = PatientEducationRequest::new("asthma");
        req.word_count = 10;

        let rejection = pipeline
            .run(GenerationRequest::PatientEducation(req))
            .await
            .unwrap_err();
        assert_eq!(rejection.stage, Stage::Received);
        assert!(matches!(
            rejection.reason,
            RejectionReason::Validation {
                error: ValidationError::WordCountOutOfRange { value: 10, .. }
            }
        ));
        assert_eq!(provider.calls(), 0);
        assert_eq!(pipeline.audit().entries_by_outcome(AuditOutcome::Rejected).len(), 1);
    }

    #[tokio::test]
    async fn pii_in_patient_data_blocks_without_generation() {
        let provider = CountingProvider::new();
        let pipeline = pipeline(provider.clone());
        let req = ClinicalSummaryRequest::new(
            "Chest pain, troponin negative. Contact 555-123-4567.",
            SummaryType::Admission,
        );

        let rejection = pipeline
            .run(GenerationRequest::ClinicalSummary(req))
            .await
            .unwrap_err();
        match &rejection.reason {
            RejectionReason::ComplianceBlocked { rule_id, .. } => {
                assert_eq!(rule_id, "pii.phone_number")
            }
            other => panic!("Expected ComplianceBlocked, got: {other:?}"),
        }
        assert_eq!(provider.calls(), 0);

        let entries = pipeline.audit().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].detail.as_deref(), Some("pii.phone_number"));
    }

    #[tokio::test]
    async fn sensitive_topic_warns_and_runs_conservatively() {
        let pipeline = pipeline(CountingProvider::new());
        let result = pipeline.run(education("opioid overdose")).await.unwrap();
        assert_eq!(
            result.metadata.safety_flags,
            vec!["Sensitive topic requires enhanced review".to_string()]
        );
        assert!(result.content.starts_with("This topic can be hard to talk about"));
    }

    #[tokio::test]
    async fn clinical_summary_is_hedged_and_professional() {
        let pipeline = pipeline(CountingProvider::new());
        let mut req = ClinicalSummaryRequest::new(
            "72yo admitted with CHF exacerbation, diuresed with IV furosemide.",
            SummaryType::Discharge,
        );
        req.focus_areas = vec!["fluid status".into()];

        let result = pipeline.run(GenerationRequest::ClinicalSummary(req)).await.unwrap();
        assert_eq!(result.metadata.reading_level, ReadingLevel::Professional);
        assert_eq!(result.disclaimer, CLINICAL_DISCLAIMER);
        assert!(!result.metadata.safety_flags.iter().any(|f| f == HEDGING_FLAG));
        assert!(!result.content.contains("furosemide"));
        match &result.details {
            ContentDetails::ClinicalSummary {
                recommendations, ..
            } => assert!(recommendations.is_some()),
            other => panic!("Expected ClinicalSummary, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn source_outage_degrades_with_flag() {
        let pipeline = GuardrailPipeline::with_components(
            &AppConfig::default(),
            CountingProvider::new(),
            vec![Arc::new(DownSource)],
        )
        .unwrap();

        let result = pipeline.run(education("asthma")).await.unwrap();
        assert!(result.sources.is_empty());
        assert_eq!(result.metadata.safety_flags, vec![SOURCES_UNAVAILABLE_FLAG.to_string()]);

        let health = pipeline.health().await;
        assert!(health.is_healthy());
        assert!(!health.sources.healthy);
    }

    #[tokio::test]
    async fn no_sources_requested_means_no_lookup_flag() {
        let pipeline = GuardrailPipeline::with_components(
            &AppConfig::default(),
            CountingProvider::new(),
            vec![Arc::new(DownSource)],
        )
        .unwrap();
        let mut req = PatientEducationRequest::new("asthma");
        req.include_sources = false;

        let result = pipeline.run(GenerationRequest::PatientEducation(req)).await.unwrap();
        assert!(result.sources.is_empty());
        assert!(result.metadata.safety_flags.is_empty());
    }

    #[tokio::test]
    async fn repeat_request_is_served_from_cache() {
        let provider = CountingProvider::new();
        let pipeline = pipeline(provider.clone());
        let caller = CallerIdentity::new("nurse-3");

        let first = pipeline.run_as(&caller, education("asthma")).await.unwrap();
        let second = pipeline.run_as(&caller, education("  ASTHMA ")).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.calls(), 1);
        let outcomes: Vec<_> = pipeline.audit().entries().iter().map(|e| e.outcome).collect();
        assert_eq!(outcomes, vec![AuditOutcome::Completed, AuditOutcome::CacheHit]);
        assert_eq!(pipeline.health().await.cache.entries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_triggers_fresh_run() {
        let provider = CountingProvider::new();
        let pipeline = pipeline(provider.clone());

        pipeline.run(education("asthma")).await.unwrap();
        tokio::time::advance(AppConfig::default().cache.ttl() + Duration::from_secs(1)).await;
        pipeline.run(education("asthma")).await.unwrap();

        assert_eq!(provider.calls(), 2);
    }

    /// Never answers; every attempt runs into the per-call timeout.
    struct HangingProvider {
        call_count: Mutex<usize>,
    }

    #[async_trait]
    impl Provider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ProviderError::Timeout("unreachable".into()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_waiters_share_timeout_under_their_own_ids() {
        let provider = Arc::new(HangingProvider {
            call_count: Mutex::new(0),
        });
        let pipeline = pipeline(provider.clone());

        let runs = (0..4).map(|_| {
            let pipeline = pipeline.clone();
            async move { pipeline.run(education("asthma")).await }
        });
        let rejections: Vec<Rejection> = futures::future::join_all(runs)
            .await
            .into_iter()
            .map(|outcome| outcome.unwrap_err())
            .collect();

        for rejection in &rejections {
            assert!(matches!(
                rejection.reason,
                RejectionReason::GenerationUnavailable { .. }
            ));
            assert_eq!(rejection.stage, Stage::PreChecked);
        }
        let max_retries = AppConfig::default().generation.max_retries as usize;
        assert_eq!(*provider.call_count.lock().unwrap(), 1 + max_retries);

        let ids: std::collections::HashSet<Uuid> =
            rejections.iter().map(|r| r.request_id).collect();
        assert_eq!(ids.len(), 4);

        let audited: std::collections::HashSet<Uuid> = pipeline
            .audit()
            .entries_by_outcome(AuditOutcome::Rejected)
            .into_iter()
            .map(|e| e.request_id)
            .collect();
        assert_eq!(audited, ids);

        let health = pipeline.health().await;
        assert_eq!(health.cache.entries, 0);
        assert_eq!(health.cache.in_flight, 0);
    }

    #[test]
    fn flags_are_deduplicated_in_order() {
        let finding = |rule: &str, message: &str, severity| ComplianceFinding {
            rule_id: rule.into(),
            severity,
            message: message.into(),
            matched_span: None,
        };
        let pre = vec![finding("topic.sensitive", "sensitive", Severity::Warn)];
        let post = vec![
            finding("pii.phone_number", "phone", Severity::Warn),
            finding("pii.email_address", "phone", Severity::Warn),
        ];
        assert_eq!(
            collect_flags(&pre, &post, Some("sources")),
            vec!["sensitive", "phone", "sources"]
        );
    }
}
