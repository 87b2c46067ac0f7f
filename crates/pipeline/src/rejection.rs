//! Pipeline states and rejections.

use clinidraft_core::ValidationError;
use serde::Serialize;
use uuid::Uuid;

/// States a request moves through.
///
/// `Received → PreChecked → Generated → PostChecked → Assembled → Completed`,
/// or `Rejected` from any state before `Assembled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    PreChecked,
    Generated,
    PostChecked,
    Assembled,
    Completed,
    Rejected,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::PreChecked => "pre_checked",
            Stage::Generated => "generated",
            Stage::PostChecked => "post_checked",
            Stage::Assembled => "assembled",
            Stage::Completed => "completed",
            Stage::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a request produced no result.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("invalid request: {error}")]
    Validation { error: ValidationError },

    #[error("blocked by compliance rule '{rule_id}': {message}")]
    ComplianceBlocked { rule_id: String, message: String },

    #[error("generation unavailable: {detail}")]
    GenerationUnavailable { detail: String },

    #[error("internal error: {detail}")]
    Internal { detail: String },
}

impl RejectionReason {
    /// Short stable code for logs and audit entries.
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::Validation { .. } => "validation",
            RejectionReason::ComplianceBlocked { .. } => "compliance_blocked",
            RejectionReason::GenerationUnavailable { .. } => "generation_unavailable",
            RejectionReason::Internal { .. } => "internal",
        }
    }
}

/// A rejected request. `stage` is the last state the request reached.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("request {request_id} rejected after {stage}: {reason}")]
pub struct Rejection {
    pub request_id: Uuid,
    pub stage: Stage,
    pub reason: RejectionReason,
}

impl Rejection {
    pub fn new(request_id: Uuid, stage: Stage, reason: RejectionReason) -> Self {
        Self {
            request_id,
            stage,
            reason,
        }
    }
}
