//! Built-in rule table.
//!
//! Declaration order here is the order findings are reported in.

use clinidraft_core::{ContentKind, Phase, Severity};

use crate::ComplianceError;
use crate::rule::{Rule, RuleCategory, Scope, lexicon_pattern};

/// Exact flag raised when a clinical draft contains no hedging markers.
pub const HEDGING_FLAG: &str = "Clinical summary lacks appropriate hedging language";

const NAME_WITH_TITLE: &str = r"\b(?:Mr|Mrs|Ms|Miss|Mx|Dr|Prof)\.?\s+[A-Z][a-z]+";

const PHONE_NUMBER: &str = r"(?i)\b(?:phone|tel|cell|mobile)\s*[:#]?\s*\d{3}[\s.-]?\d{3}[\s.-]?\d{4}\b|(?:\(\d{3}\)\s*|\b\d{3}[\s.-])\d{3}[\s.-]\d{4}\b";

const DATE_OF_BIRTH: &str = r"(?i)\b(?:DOB|D\.O\.B\.?|date of birth|born(?: on)?)\s*[-:]?\s*(?:\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4}|\d{4}-\d{2}-\d{2})";

const MEDICAL_RECORD_NUMBER: &str =
    r"(?i)\b(?:MRN|medical record (?:number|no\.?|#))\s*[:#]?\s*[A-Z]{0,3}\d{4,}";

const EMAIL_ADDRESS: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";

const NATIONAL_ID: &str = r"\b\d{3}-\d{2}-\d{4}\b";

const PAYMENT_CARD: &str = r"\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{4}\b";

/// Clinical input longer than this many characters gets a completeness advisory.
pub(crate) const LONG_PATIENT_DATA_CHARS: usize = 5000;

const SENSITIVE_TOPICS: &str = r"\b(?:self[- ]?harm\w*|suicid\w*|overdos\w*|abus\w*|addict\w*)";

const INAPPROPRIATE_FRAMING: &str =
    r"\b(?:miracle|secret cure|hidden cure|conspiracy|big pharma|guaranteed cure)\b";

const UNSAFE_CLAIMS: &str = r"\b(?:will cure|cures? (?:all|every)|guaranteed to|guarantees?|is definitely|definitely (?:will|cures?)|miracle|100% effective|completely safe|no side effects|risk[- ]free)\b";

const PRESCRIPTIVE: &str = r"\b(?:you must|you should|you will|must take|should receive|stop taking|no need to see a doctor)\b";

const SELF_DIRECTED: &str = r"\b(?:diagnose[sd]?|prescribe[sd]?)\b";

const UNQUALIFIED_CERTAINTY: &str = r"\b(?:certainly|obviously|clearly|undoubtedly|without (?:a )?doubt)\b";

const HEDGING_MARKERS: &str = r"(?i)\b(?:may|might|could|consistent with|consider(?:ed|ing)?|suggests?|suggestive of|possible|possibly|probable|probably|likely|appears?|cannot be excluded)\b";

/// PII rules block before generation (clinical input) and warn after it (any draft).
fn pii_scopes() -> Vec<Scope> {
    vec![
        Scope::new(Phase::Pre, Some(ContentKind::ClinicalSummary), Severity::Block),
        Scope::new(Phase::Post, None, Severity::Warn),
    ]
}

/// Compile the built-in rules, extending the claim and topic lexicons.
pub(crate) fn builtin_rules(
    extra_unsafe_terms: &[String],
    extra_sensitive_terms: &[String],
) -> Result<Vec<Rule>, ComplianceError> {
    let pre_any = || vec![Scope::new(Phase::Pre, None, Severity::Warn)];
    let pre_clinical = || {
        vec![Scope::new(
            Phase::Pre,
            Some(ContentKind::ClinicalSummary),
            Severity::Warn,
        )]
    };
    let post_any = || vec![Scope::new(Phase::Post, None, Severity::Warn)];
    let post_education = || {
        vec![Scope::new(
            Phase::Post,
            Some(ContentKind::PatientEducation),
            Severity::Warn,
        )]
    };
    let post_clinical = || {
        vec![Scope::new(
            Phase::Post,
            Some(ContentKind::ClinicalSummary),
            Severity::Warn,
        )]
    };

    Ok(vec![
        Rule::new(
            "pii.name_with_title",
            RuleCategory::Pii,
            "Potential patient name detected - ensure data is properly de-identified",
            NAME_WITH_TITLE,
            false,
            pii_scopes(),
        )?,
        Rule::new(
            "pii.phone_number",
            RuleCategory::Pii,
            "Potential phone number detected - ensure data is properly de-identified",
            PHONE_NUMBER,
            false,
            pii_scopes(),
        )?,
        Rule::new(
            "pii.date_of_birth",
            RuleCategory::Pii,
            "Potential date of birth detected - ensure data is properly de-identified",
            DATE_OF_BIRTH,
            false,
            pii_scopes(),
        )?,
        Rule::new(
            "pii.medical_record_number",
            RuleCategory::Pii,
            "Potential medical record number detected - ensure data is properly de-identified",
            MEDICAL_RECORD_NUMBER,
            false,
            pii_scopes(),
        )?,
        Rule::new(
            "pii.email_address",
            RuleCategory::Pii,
            "Potential email address detected - ensure data is properly de-identified",
            EMAIL_ADDRESS,
            false,
            pii_scopes(),
        )?,
        Rule::new(
            "pii.national_id",
            RuleCategory::Pii,
            "Potential national identifier detected - ensure data is properly de-identified",
            NATIONAL_ID,
            false,
            pii_scopes(),
        )?,
        Rule::new(
            "pii.payment_card",
            RuleCategory::Pii,
            "Potential payment card number detected - ensure data is properly de-identified",
            PAYMENT_CARD,
            false,
            pii_scopes(),
        )?,
        Rule::longer_than(
            "input.long_patient_data",
            RuleCategory::ClinicalLanguage,
            "Patient data unusually long - review for completeness",
            LONG_PATIENT_DATA_CHARS,
            pre_clinical(),
        ),
        Rule::new(
            "topic.sensitive",
            RuleCategory::SensitiveTopic,
            "Sensitive topic requires enhanced review",
            &lexicon_pattern(SENSITIVE_TOPICS, extra_sensitive_terms),
            false,
            pre_any(),
        )?,
        Rule::new(
            "topic.inappropriate_framing",
            RuleCategory::SensitiveTopic,
            "Request uses sensational or misleading framing",
            &lexicon_pattern(INAPPROPRIATE_FRAMING, &[]),
            false,
            pre_any(),
        )?,
        Rule::new(
            "claims.unsafe_absolute",
            RuleCategory::UnsafeClaim,
            "Content contains absolute or guaranteed medical claims",
            &lexicon_pattern(UNSAFE_CLAIMS, extra_unsafe_terms),
            false,
            post_any(),
        )?,
        Rule::new(
            "claims.prescriptive",
            RuleCategory::UnsafeClaim,
            "Content contains definitive treatment recommendations",
            &lexicon_pattern(PRESCRIPTIVE, &[]),
            false,
            post_any(),
        )?,
        Rule::new(
            "claims.self_directed",
            RuleCategory::UnsafeClaim,
            "Content may be too prescriptive",
            &lexicon_pattern(SELF_DIRECTED, &[]),
            false,
            post_education(),
        )?,
        Rule::new(
            "clinical.unqualified_certainty",
            RuleCategory::ClinicalLanguage,
            "Content contains unqualified diagnostic statements",
            &lexicon_pattern(UNQUALIFIED_CERTAINTY, &[]),
            false,
            post_clinical(),
        )?,
        Rule::new(
            "clinical.hedging_required",
            RuleCategory::ClinicalLanguage,
            HEDGING_FLAG,
            HEDGING_MARKERS,
            true,
            post_clinical(),
        )?,
    ])
}
