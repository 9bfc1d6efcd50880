//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.
//!
//! The schema wrappers mirror the structure of their corresponding domain
//! types but live in the inbound adapter layer where framework concerns belong.

#![expect(
    dead_code,
    reason = "Mirror types are used only for OpenAPI schema generation via utoipa"
)]

use std::collections::BTreeMap;

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    #[schema(rename = "bad_request")]
    BadRequest,
    #[schema(rename = "phi_not_allowed")]
    PhiNotAllowed,
    #[schema(rename = "unknown_provider")]
    UnknownProvider,
    #[schema(rename = "provider_disabled")]
    ProviderDisabled,
    /// The provider lacks credentials or settings.
    #[schema(rename = "configuration_error")]
    ConfigurationError,
    /// The vendor answered with a failure status or was unreachable.
    #[schema(rename = "upstream_http_error")]
    UpstreamHttpError,
    /// The vendor payload could not be understood.
    #[schema(rename = "upstream_parse_error")]
    UpstreamParseError,
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// API error response payload with machine-readable code and human-readable
/// message.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "provider_disabled")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "provider 'isabel' is disabled")]
    message: String,
    /// Correlation identifier, also sent as the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
}

/// OpenAPI schema for [`crate::domain::Demographics`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Demographics)]
pub struct DemographicsSchema {
    #[schema(example = 44)]
    age: Option<u32>,
    #[schema(example = "female")]
    sex: Option<String>,
}

/// OpenAPI schema for [`crate::domain::DiagnosticCase`].
#[derive(ToSchema)]
#[schema(as = crate::domain::DiagnosticCase)]
pub struct DiagnosticCaseSchema {
    /// Required, non-blank presenting complaint.
    #[schema(example = "fever, cough, pleuritic chest pain")]
    chief_complaint: String,
    demographics: Option<DemographicsSchema>,
    symptoms: Option<Vec<String>>,
    notes: Option<String>,
    /// Caller-side reference; must not identify the patient.
    patient_id: Option<String>,
}

/// OpenAPI schema for [`crate::domain::TriageLevel`].
#[derive(ToSchema)]
#[schema(as = crate::domain::TriageLevel)]
pub enum TriageLevelSchema {
    #[schema(rename = "low")]
    Low,
    #[schema(rename = "moderate")]
    Moderate,
    #[schema(rename = "high")]
    High,
}

/// OpenAPI schema for [`crate::domain::Triage`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Triage)]
pub struct TriageSchema {
    level: TriageLevelSchema,
    #[schema(example = "possible ACS")]
    why: String,
}

/// OpenAPI schema for [`crate::domain::Engine`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Engine)]
pub struct EngineSchema {
    #[schema(example = "local_rules")]
    name: String,
    #[schema(example = "0.1")]
    version: Option<String>,
}

/// OpenAPI schema for [`crate::domain::DifferentialEntry`].
#[derive(ToSchema)]
#[schema(as = crate::domain::DifferentialEntry)]
pub struct DifferentialEntrySchema {
    #[schema(example = "Unstable angina")]
    condition: String,
    #[schema(minimum = 0.0, maximum = 1.0, example = 0.6)]
    confidence: Option<f64>,
    rationale: Option<String>,
    /// Code system to code, e.g. `icd10`.
    codes: Option<BTreeMap<String, String>>,
}

/// OpenAPI schema for [`crate::domain::Provenance`].
///
/// Engine-specific metadata may appear alongside `generated_at`.
#[derive(ToSchema)]
#[schema(as = crate::domain::Provenance)]
pub struct ProvenanceSchema {
    #[schema(example = "2026-01-01T00:00:00Z")]
    generated_at: String,
}

/// OpenAPI schema for [`crate::domain::CanonicalResult`].
#[derive(ToSchema)]
#[schema(as = crate::domain::CanonicalResult)]
pub struct CanonicalResultSchema {
    engine: EngineSchema,
    differential: Vec<DifferentialEntrySchema>,
    triage: TriageSchema,
    recommended_tests: Vec<String>,
    red_flags: Vec<String>,
    provenance: ProvenanceSchema,
}

/// OpenAPI schema for [`crate::domain::BatchSummary`].
#[derive(ToSchema)]
#[schema(as = crate::domain::BatchSummary)]
pub struct BatchSummarySchema {
    total: usize,
    ok: usize,
    failed: usize,
}

/// OpenAPI schema for [`crate::domain::BatchResult`].
#[derive(ToSchema)]
#[schema(as = crate::domain::BatchResult)]
pub struct BatchResultSchema {
    index: usize,
    ok: bool,
    output: Option<CanonicalResultSchema>,
    /// Error code when `ok` is false.
    #[schema(example = "provider_disabled")]
    error: Option<String>,
    detail: Option<String>,
    /// Caller metadata echoed unchanged.
    meta: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::BatchReport`].
#[derive(ToSchema)]
#[schema(as = crate::domain::BatchReport)]
pub struct BatchReportSchema {
    summary: BatchSummarySchema,
    results: Vec<BatchResultSchema>,
}
