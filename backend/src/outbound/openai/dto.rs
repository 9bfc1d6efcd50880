//! Chat-completions request and response shapes.
//!
//! The model is asked for a JSON object; its content string is decoded into
//! [`ModelOutputDto`] and validated before it becomes a canonical result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::ports::DiagnosisProviderError;
use crate::domain::{
    CanonicalResult, Confidence, DiagnosticCase, DifferentialEntry, Engine, Provenance, Triage,
    TriageLevel, VendorTriage, map_triage,
};

pub(super) const TEMPERATURE: f64 = 0.2;
const MAX_TOKENS: u32 = 800;
const TASK: &str = "clinical_differential_v1";
const REQUIRED_FIELDS: [&str; 4] = ["differential", "triage", "recommended_tests", "red_flags"];
const SYSTEM_PROMPT: &str = "You output ONLY valid JSON matching the requested fields.";

#[derive(Debug, Serialize)]
pub(super) struct ChatRequestDto<'a> {
    model: &'a str,
    response_format: ResponseFormatDto,
    temperature: f64,
    max_tokens: u32,
    messages: Vec<MessageDto>,
}

#[derive(Debug, Serialize)]
struct ResponseFormatDto {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct MessageDto {
    role: &'static str,
    content: String,
}

impl<'a> ChatRequestDto<'a> {
    pub(super) fn new(model: &'a str, case: &DiagnosticCase) -> Self {
        let prompt = json!({
            "task": TASK,
            "required_fields": REQUIRED_FIELDS,
            "input": case,
        });
        Self {
            model,
            response_format: ResponseFormatDto { kind: "json_object" },
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            messages: vec![
                MessageDto {
                    role: "system",
                    content: SYSTEM_PROMPT.to_owned(),
                },
                MessageDto {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatResponseDto {
    #[serde(default)]
    choices: Vec<ChoiceDto>,
}

#[derive(Debug, Deserialize)]
struct ChoiceDto {
    message: ChoiceMessageDto,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessageDto {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponseDto {
    /// Content of the first choice, if the model produced any.
    pub(super) fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ModelOutputDto {
    #[serde(default)]
    differential: Vec<ModelEntryDto>,
    #[serde(default)]
    triage: Option<ModelTriageDto>,
    #[serde(default)]
    recommended_tests: Vec<String>,
    #[serde(default)]
    red_flags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ModelEntryDto {
    condition: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    rationale: Option<String>,
    #[serde(default)]
    codes: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ModelTriageDto {
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    why: Option<String>,
}

impl ModelOutputDto {
    /// Validate the model output and lift it into a canonical result.
    ///
    /// # Errors
    /// Returns `UpstreamParse` when any confidence lies outside `[0, 1]`.
    pub(super) fn into_result(
        self,
        engine: Engine,
        provenance: Provenance,
    ) -> Result<CanonicalResult, DiagnosisProviderError> {
        let differential = self
            .differential
            .into_iter()
            .map(ModelEntryDto::into_entry)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CanonicalResult {
            engine,
            differential,
            triage: self.triage.map_or_else(
                || map_triage(VendorTriage::default()),
                ModelTriageDto::into_triage,
            ),
            recommended_tests: self.recommended_tests,
            red_flags: self.red_flags,
            provenance,
        })
    }
}

impl ModelEntryDto {
    fn into_entry(self) -> Result<DifferentialEntry, DiagnosisProviderError> {
        let mut entry = DifferentialEntry::new(self.condition);
        if let Some(raw) = self.confidence {
            let confidence = Confidence::new(raw).map_err(|error| {
                DiagnosisProviderError::upstream_parse(format!(
                    "model output for '{}': {error}",
                    entry.condition
                ))
            })?;
            entry = entry.with_confidence(confidence);
        }
        entry.rationale = self.rationale;
        entry.codes = self.codes;
        Ok(entry)
    }
}

impl ModelTriageDto {
    fn into_triage(self) -> Triage {
        match self.level.as_deref().and_then(TriageLevel::from_canonical) {
            Some(level) => Triage::new(level, self.why.unwrap_or_default()),
            None => map_triage(VendorTriage::tag(self.level.as_deref())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixed_instant;
    use rstest::rstest;

    fn lift(value: serde_json::Value) -> Result<CanonicalResult, DiagnosisProviderError> {
        let dto: ModelOutputDto = serde_json::from_value(value).expect("decode");
        dto.into_result(Engine::new("openai", "gpt-4o-mini"), Provenance::at(fixed_instant()))
    }

    #[rstest]
    fn request_carries_prompt_and_sampling_settings() {
        let case = DiagnosticCase::new("fever").expect("valid");

        let value = serde_json::to_value(ChatRequestDto::new("gpt-4o-mini", &case)).expect("serialise");

        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["response_format"], json!({ "type": "json_object" }));
        assert_eq!(value["temperature"], 0.2);
        assert_eq!(value["max_tokens"], 800);
        assert_eq!(value["messages"][0]["role"], "system");

        let user = value["messages"][1]["content"].as_str().expect("user content");
        let prompt: serde_json::Value = serde_json::from_str(user).expect("prompt is JSON");
        assert_eq!(prompt["task"], "clinical_differential_v1");
        assert_eq!(prompt["required_fields"][3], "red_flags");
        assert_eq!(prompt["input"]["chief_complaint"], "fever");
    }

    #[rstest]
    #[case::no_choices(json!({ "choices": [] }))]
    #[case::null_content(json!({ "choices": [{ "message": { "content": null } }] }))]
    #[case::blank_content(json!({ "choices": [{ "message": { "content": "  " } }] }))]
    fn missing_content_yields_none(#[case] value: serde_json::Value) {
        let dto: ChatResponseDto = serde_json::from_value(value).expect("decode");
        assert_eq!(dto.into_content(), None);
    }

    #[rstest]
    fn valid_output_is_lifted() {
        let result = lift(json!({
            "differential": [
                { "condition": "Pneumonia", "confidence": 0.7, "rationale": "focal crackles" }
            ],
            "triage": { "level": "Moderate", "why": "hypoxia absent" },
            "recommended_tests": ["CXR"],
            "red_flags": []
        }))
        .expect("valid output");

        assert_eq!(result.differential[0].confidence.map(Confidence::value), Some(0.7));
        assert_eq!(result.triage, Triage::new(TriageLevel::Moderate, "hypoxia absent"));
        assert_eq!(result.recommended_tests, vec!["CXR"]);
    }

    #[rstest]
    fn non_canonical_triage_goes_through_mapper() {
        let result = lift(json!({ "differential": [], "triage": { "level": "emergent" } }))
            .expect("valid output");
        assert_eq!(result.triage, Triage::new(TriageLevel::High, "vendor: emergent"));
    }

    #[rstest]
    #[case(1.5)]
    #[case(-0.2)]
    fn out_of_range_confidence_is_a_parse_error(#[case] confidence: f64) {
        let error = lift(json!({
            "differential": [{ "condition": "Sepsis", "confidence": confidence }]
        }))
        .expect_err("must fail");
        assert!(matches!(error, DiagnosisProviderError::UpstreamParse { .. }));
    }
}
