//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on the diagnosis service and remain testable without I/O.

use crate::domain::DiagnosisService;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub service: DiagnosisService,
    /// Accept requests that do not declare `deidentified: true`.
    pub allow_phi: bool,
}

impl HttpState {
    pub fn new(service: DiagnosisService, allow_phi: bool) -> Self {
        Self { service, allow_phi }
    }
}
