//! Domain primitives and services.
//!
//! Purpose: define the canonical diagnostic vocabulary, the provider port and
//! the pure pipeline stages shared by every provider. Types stay free of
//! framework concerns; invariants and serde contracts are documented on each
//! type.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - DiagnosticCase / CanonicalResult: provider input and output.
//! - ProviderRegistry: immutable name → provider table.
//! - DiagnosisService: single and batch routing.
//! - RetryExecutor: transient-fault retry for outbound calls.

pub mod case;
pub mod diagnosis;
pub mod diagnosis_service;
pub mod differential;
pub mod error;
pub mod ports;
pub mod registry;
pub mod retry;
pub mod trace_id;
pub mod triage;

pub use self::case::{Demographics, DiagnosticCase, DiagnosticCaseValidationError};
pub use self::diagnosis::{
    CanonicalResult, Confidence, ConfidenceOutOfRange, DifferentialEntry, Engine, Provenance,
    Triage, TriageLevel,
};
pub use self::diagnosis_service::{
    BatchItem, BatchReport, BatchRequest, BatchResult, BatchSummary, DEFAULT_BATCH_CONCURRENCY,
    DiagnosisService,
};
pub use self::differential::{RawDifferential, normalize_differential};
pub use self::error::{Error, ErrorCode};
pub use self::registry::{ProviderRegistration, ProviderRegistry, RegistryConfig, RegistryError};
pub use self::retry::{
    BackoffJitter, RandomJitter, RetryExecutor, RetryPolicy, RetryRuntime, RetrySleeper,
    RetryableFailure, TokioSleeper,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::triage::{VendorTriage, map_triage};
