//! Wire DTOs for the Infermedica diagnosis API.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    CanonicalResult, DiagnosticCase, Engine, Provenance, RawDifferential, VendorTriage,
    map_triage, normalize_differential,
};

const API_VERSION: &str = "v3";

#[derive(Debug, Serialize)]
pub(super) struct DiagnosisRequestDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    sex: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    age: Option<AgeDto>,
    evidence: Vec<serde_json::Value>,
    extras: ExtrasDto,
}

#[derive(Debug, Serialize)]
struct AgeDto {
    value: u32,
}

#[derive(Debug, Serialize)]
struct ExtrasDto {
    free_text: String,
}

impl<'a> DiagnosisRequestDto<'a> {
    pub(super) fn from_case(case: &'a DiagnosticCase) -> Self {
        Self {
            sex: case.sex(),
            age: case.age().map(|value| AgeDto { value }),
            evidence: Vec::new(),
            extras: ExtrasDto {
                free_text: case.free_text(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct DiagnosisResponseDto {
    #[serde(default)]
    conditions: Vec<ConditionDto>,
    #[serde(default)]
    triage_level: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConditionDto {
    id: String,
    name: String,
    #[serde(default)]
    common_name: Option<String>,
    #[serde(default)]
    probability: Option<f64>,
}

impl DiagnosisResponseDto {
    pub(super) fn into_result(self, engine_name: &str, generated_at: DateTime<Utc>) -> CanonicalResult {
        let triage = map_triage(VendorTriage::tag(self.triage_level.as_deref()));
        let raw = self
            .conditions
            .into_iter()
            .map(|condition| RawDifferential {
                condition: condition.name,
                probability: condition.probability,
                score: None,
                rationale: condition.common_name,
                codes: BTreeMap::from([("infermedica".to_owned(), condition.id)]),
            })
            .collect();

        CanonicalResult {
            engine: Engine::new(engine_name, API_VERSION),
            differential: normalize_differential(raw),
            triage,
            recommended_tests: Vec::new(),
            red_flags: Vec::new(),
            provenance: Provenance::at(generated_at),
        }
    }
}
