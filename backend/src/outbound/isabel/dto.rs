//! Wire DTOs for the Isabel DDx Companion API.
//!
//! Requests are built from a domain case; responses decode into these DTOs
//! first and are then mapped through the normaliser and triage mapper in one
//! pass.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    CanonicalResult, DiagnosticCase, Engine, Provenance, RawDifferential, VendorTriage,
    map_triage, normalize_differential,
};

const REGION: &str = "US";
const MAX_RESULTS: u32 = 12;
const DEFAULT_ENGINE_VERSION: &str = "ddx";

#[derive(Debug, Serialize)]
pub(super) struct IsabelRequestDto<'a> {
    patient: PatientDto<'a>,
    presentation: PresentationDto,
    options: OptionsDto,
}

#[derive(Debug, Serialize)]
struct PatientDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sex: Option<&'a str>,
    region: &'static str,
}

#[derive(Debug, Serialize)]
struct PresentationDto {
    free_text: String,
}

#[derive(Debug, Serialize)]
struct OptionsDto {
    max_results: u32,
}

impl<'a> IsabelRequestDto<'a> {
    pub(super) fn from_case(case: &'a DiagnosticCase) -> Self {
        Self {
            patient: PatientDto {
                age: case.age(),
                sex: case.sex(),
                region: REGION,
            },
            presentation: PresentationDto {
                free_text: case.free_text(),
            },
            options: OptionsDto {
                max_results: MAX_RESULTS,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct IsabelResponseDto {
    #[serde(default)]
    engine: Option<EngineDto>,
    #[serde(default)]
    differential: Vec<DifferentialDto>,
    #[serde(default)]
    triage: Option<TriageDto>,
}

#[derive(Debug, Deserialize)]
struct EngineDto {
    #[serde(default)]
    build: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DifferentialDto {
    name: String,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    probability: Option<f64>,
    #[serde(default)]
    icd10: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TriageDto {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    urgency: Option<String>,
}

impl IsabelResponseDto {
    pub(super) fn into_result(self, engine_name: &str, generated_at: DateTime<Utc>) -> CanonicalResult {
        let version = self
            .engine
            .and_then(|engine| engine.build)
            .filter(|build| !build.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENGINE_VERSION.to_owned());

        let triage = map_triage(match &self.triage {
            Some(triage) => VendorTriage {
                category: triage.category.as_deref(),
                urgency: triage.urgency.as_deref(),
            },
            None => VendorTriage::default(),
        });

        let raw = self
            .differential
            .into_iter()
            .map(|entry| RawDifferential {
                condition: entry.name,
                probability: entry.probability,
                score: entry.score,
                rationale: None,
                codes: entry
                    .icd10
                    .map(|code| BTreeMap::from([("icd10".to_owned(), code)]))
                    .unwrap_or_default(),
            })
            .collect();

        CanonicalResult {
            engine: Engine::new(engine_name, version),
            differential: normalize_differential(raw),
            triage,
            recommended_tests: Vec::new(),
            red_flags: Vec::new(),
            provenance: Provenance::at(generated_at),
        }
    }
}
