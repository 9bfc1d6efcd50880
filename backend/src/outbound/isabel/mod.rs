//! Isabel DDx Companion adapter.
//!
//! Live mode posts the case to the configured endpoint under the retry
//! executor. Mock mode answers offline with a pneumonia heuristic so the
//! gateway can be exercised without credentials.

mod dto;

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use self::dto::{IsabelRequestDto, IsabelResponseDto};
use super::vendor_http::{VendorMode, body_preview};
use crate::domain::ports::{DiagnoseOptions, DiagnosisProvider, DiagnosisProviderError};
use crate::domain::{
    CanonicalResult, Confidence, DiagnosticCase, DifferentialEntry, Engine, Provenance,
    RetryExecutor, Triage, TriageLevel,
};

/// Registry name of this provider.
pub const ISABEL: &str = "isabel";
/// Default API base URL.
pub const DEFAULT_BASE: &str = "https://api.isabelhealthcare.com";
/// Default DDx endpoint path.
pub const DEFAULT_PATH: &str = "/ddx/companion";
const MOCK_VERSION: &str = "mock-0.1";

/// Isabel provider.
pub struct IsabelProvider {
    mode: VendorMode,
    retry: RetryExecutor,
    clock: Arc<dyn Clock>,
}

impl IsabelProvider {
    pub fn new(mode: VendorMode, retry: RetryExecutor, clock: Arc<dyn Clock>) -> Self {
        Self { mode, retry, clock }
    }

    fn mock_result(&self, case: &DiagnosticCase) -> CanonicalResult {
        let text = case.chief_complaint().to_lowercase();
        let pneumonia_like = text.contains("fever")
            && text.contains("cough")
            && (text.contains("pleuritic") || text.contains("chest pain"));

        let (differential, triage, tests) = if pneumonia_like {
            (
                vec![
                    mock_entry("Community-acquired pneumonia", 0.6),
                    mock_entry("Viral bronchitis", 0.3),
                ],
                Triage::new(TriageLevel::Moderate, "mock: pneumonia-ish"),
                vec!["CXR".to_owned(), "CBC".to_owned()],
            )
        } else {
            (
                vec![
                    mock_entry("Viral URI", 0.5),
                    mock_entry("Influenza-like illness", 0.2),
                ],
                Triage::new(TriageLevel::Low, "mock"),
                vec!["Symptomatic care".to_owned()],
            )
        };

        CanonicalResult {
            engine: Engine::new(ISABEL, MOCK_VERSION),
            differential,
            triage,
            recommended_tests: tests,
            red_flags: Vec::new(),
            provenance: Provenance::at(self.clock.utc()),
        }
    }
}

fn mock_entry(condition: &str, confidence: f64) -> DifferentialEntry {
    let entry = DifferentialEntry::new(condition);
    match Confidence::new(confidence) {
        Ok(confidence) => entry.with_confidence(confidence),
        Err(_) => entry,
    }
}

fn parse_response(body: &[u8]) -> Result<IsabelResponseDto, DiagnosisProviderError> {
    serde_json::from_slice(body).map_err(|error| {
        DiagnosisProviderError::upstream_parse(format!(
            "invalid Isabel JSON payload: {error} (body: {})",
            body_preview(body)
        ))
    })
}

#[async_trait]
impl DiagnosisProvider for IsabelProvider {
    async fn diagnose(
        &self,
        case: &DiagnosticCase,
        _options: &DiagnoseOptions,
    ) -> Result<CanonicalResult, DiagnosisProviderError> {
        let client = match &self.mode {
            VendorMode::Mock => return Ok(self.mock_result(case)),
            VendorMode::Unconfigured { reason } => {
                return Err(DiagnosisProviderError::configuration(reason.as_str()));
            }
            VendorMode::Live(client) => client,
        };

        let payload = IsabelRequestDto::from_case(case);
        let body = self
            .retry
            .run(ISABEL, || client.post_json(&payload))
            .await?;
        let response = parse_response(&body)?;
        Ok(response.into_result(ISABEL, self.clock.utc()))
    }
}
