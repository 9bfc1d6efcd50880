//! Infermedica adapter.
//!
//! Live mode needs both an API key and an application identifier. Mock mode
//! returns a single example condition.

mod dto;

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;

use self::dto::{DiagnosisRequestDto, DiagnosisResponseDto};
use super::vendor_http::{VendorMode, body_preview};
use crate::domain::ports::{DiagnoseOptions, DiagnosisProvider, DiagnosisProviderError};
use crate::domain::{
    CanonicalResult, Confidence, DiagnosticCase, DifferentialEntry, Engine, Provenance,
    RetryExecutor, VendorTriage, map_triage,
};

/// Registry name of this provider.
pub const INFERMEDICA: &str = "infermedica";
/// Default API base URL.
pub const DEFAULT_BASE: &str = "https://api.infermedica.com";
/// Default diagnosis endpoint path.
pub const DEFAULT_PATH: &str = "/v3/diagnosis";
/// Header carrying the application identifier.
pub const APP_ID_HEADER: &str = "App-Id";

/// Infermedica provider.
pub struct InfermedicaProvider {
    mode: VendorMode,
    retry: RetryExecutor,
    clock: Arc<dyn Clock>,
}

impl InfermedicaProvider {
    pub fn new(mode: VendorMode, retry: RetryExecutor, clock: Arc<dyn Clock>) -> Self {
        Self { mode, retry, clock }
    }

    fn mock_result(&self) -> CanonicalResult {
        let mut entry =
            DifferentialEntry::new("Example condition (Infermedica)").with_rationale("Stubbed adapter output.");
        if let Ok(confidence) = Confidence::new(0.42) {
            entry = entry.with_confidence(confidence);
        }

        CanonicalResult {
            engine: Engine::new(INFERMEDICA, "mock"),
            differential: vec![entry],
            triage: map_triage(VendorTriage::tag(Some("routine"))),
            recommended_tests: Vec::new(),
            red_flags: Vec::new(),
            provenance: Provenance::at(self.clock.utc())
                .with_metadata("prompt_profile", json!("infermedica_stub")),
        }
    }
}

#[async_trait]
impl DiagnosisProvider for InfermedicaProvider {
    async fn diagnose(
        &self,
        case: &DiagnosticCase,
        _options: &DiagnoseOptions,
    ) -> Result<CanonicalResult, DiagnosisProviderError> {
        let client = match &self.mode {
            VendorMode::Mock => return Ok(self.mock_result()),
            VendorMode::Unconfigured { reason } => {
                return Err(DiagnosisProviderError::configuration(reason.as_str()));
            }
            VendorMode::Live(client) => client,
        };

        let payload = DiagnosisRequestDto::from_case(case);
        let body = self
            .retry
            .run(INFERMEDICA, || client.post_json(&payload))
            .await?;
        let response: DiagnosisResponseDto = serde_json::from_slice(&body).map_err(|error| {
            DiagnosisProviderError::upstream_parse(format!(
                "invalid Infermedica JSON payload: {error} (body: {})",
                body_preview(&body)
            ))
        })?;
        Ok(response.into_result(INFERMEDICA, self.clock.utc()))
    }
}
