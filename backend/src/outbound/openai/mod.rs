//! OpenAI chat-completions adapter.

mod dto;

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;

use self::dto::{ChatRequestDto, ChatResponseDto, ModelOutputDto, TEMPERATURE};
use super::vendor_http::{VendorMode, body_preview};
use crate::domain::ports::{DiagnoseOptions, DiagnosisProvider, DiagnosisProviderError};
use crate::domain::{
    CanonicalResult, Confidence, DiagnosticCase, DifferentialEntry, Engine, Provenance,
    RetryExecutor, Triage, TriageLevel,
};

/// Registry name of this provider.
pub const OPENAI: &str = "openai";
/// Default API base URL.
pub const DEFAULT_BASE: &str = "https://api.openai.com/v1";
/// Chat-completions path appended to the base.
pub const DEFAULT_PATH: &str = "/chat/completions";
/// Model used when neither the request nor `OPENAI_MODEL` names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Generative-model provider.
pub struct OpenAiProvider {
    mode: VendorMode,
    default_model: String,
    retry: RetryExecutor,
    clock: Arc<dyn Clock>,
}

impl OpenAiProvider {
    pub fn new(
        mode: VendorMode,
        default_model: impl Into<String>,
        retry: RetryExecutor,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            mode,
            default_model: default_model.into(),
            retry,
            clock,
        }
    }

    fn model<'a>(&'a self, options: &'a DiagnoseOptions) -> &'a str {
        options
            .model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .unwrap_or(&self.default_model)
    }

    fn provenance(&self, model: &str) -> Provenance {
        Provenance::at(self.clock.utc())
            .with_metadata("model", json!(model))
            .with_metadata("temperature", json!(TEMPERATURE))
    }

    fn mock_result(&self, model: &str) -> CanonicalResult {
        let mut entry = DifferentialEntry::new("Viral URI").with_rationale("mock model output");
        if let Ok(confidence) = Confidence::new(0.5) {
            entry = entry.with_confidence(confidence);
        }

        CanonicalResult {
            engine: Engine::new(OPENAI, "mock"),
            differential: vec![entry],
            triage: Triage::new(TriageLevel::Low, "mock"),
            recommended_tests: vec!["Symptomatic care".to_owned()],
            red_flags: Vec::new(),
            provenance: self.provenance(model),
        }
    }
}

fn parse_completion(body: &[u8]) -> Result<ModelOutputDto, DiagnosisProviderError> {
    let response: ChatResponseDto = serde_json::from_slice(body).map_err(|error| {
        DiagnosisProviderError::upstream_parse(format!(
            "invalid chat completion payload: {error} (body: {})",
            body_preview(body)
        ))
    })?;
    let content = response.into_content().ok_or_else(|| {
        DiagnosisProviderError::upstream_parse("chat completion carried no message content")
    })?;
    serde_json::from_str(&content).map_err(|error| {
        DiagnosisProviderError::upstream_parse(format!(
            "model content is not valid JSON: {error} (content: {})",
            body_preview(content.as_bytes())
        ))
    })
}

#[async_trait]
impl DiagnosisProvider for OpenAiProvider {
    async fn diagnose(
        &self,
        case: &DiagnosticCase,
        options: &DiagnoseOptions,
    ) -> Result<CanonicalResult, DiagnosisProviderError> {
        let model = self.model(options);
        let client = match &self.mode {
            VendorMode::Mock => return Ok(self.mock_result(model)),
            VendorMode::Unconfigured { reason } => {
                return Err(DiagnosisProviderError::configuration(reason.as_str()));
            }
            VendorMode::Live(client) => client,
        };

        let payload = ChatRequestDto::new(model, case);
        let body = self.retry.run(OPENAI, || client.post_json(&payload)).await?;
        let output = parse_completion(&body)?;
        output.into_result(Engine::new(OPENAI, model), self.provenance(model))
    }
}
