//! Offline rule engine used as the default provider.
//!
//! A single cardiac keyword rule; no network access.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};

use crate::domain::ports::{DiagnoseOptions, DiagnosisProvider, DiagnosisProviderError};
use crate::domain::{
    CanonicalResult, Confidence, DiagnosticCase, DifferentialEntry, Engine, Provenance, Triage,
    TriageLevel,
};

/// Registry name of this provider.
pub const LOCAL_RULES: &str = "local_rules";
const VERSION: &str = "0.1";
const CARDIAC_TERMS: [&str; 3] = ["chest", "diaphoresis", "pressure"];

/// Keyword-driven local provider.
pub struct LocalRulesProvider {
    clock: Arc<dyn Clock>,
}

impl LocalRulesProvider {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Default for LocalRulesProvider {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

fn entry(condition: &str, confidence: f64, rationale: &str) -> DifferentialEntry {
    let entry = DifferentialEntry::new(condition).with_rationale(rationale);
    match Confidence::new(confidence) {
        Ok(confidence) => entry.with_confidence(confidence),
        Err(_) => entry,
    }
}

fn is_cardiac(complaint: &str) -> bool {
    let complaint = complaint.to_lowercase();
    CARDIAC_TERMS.iter().any(|term| complaint.contains(term))
}

#[async_trait]
impl DiagnosisProvider for LocalRulesProvider {
    async fn diagnose(
        &self,
        case: &DiagnosticCase,
        _options: &DiagnoseOptions,
    ) -> Result<CanonicalResult, DiagnosisProviderError> {
        let (differential, triage, recommended_tests, red_flags) =
            if is_cardiac(case.chief_complaint()) {
                (
                    vec![
                        entry("Unstable angina", 0.6, "ischemic-sounding chest pain"),
                        entry("Myocardial infarction", 0.2, "consider ACS"),
                    ],
                    Triage::new(TriageLevel::High, "possible ACS"),
                    vec!["ECG".to_owned(), "Troponin".to_owned()],
                    vec!["ischemic-sounding chest pain".to_owned()],
                )
            } else {
                (
                    vec![entry("Viral URI", 0.4, "self-limited symptoms")],
                    Triage::new(TriageLevel::Low, "no red flags"),
                    vec!["Symptomatic care".to_owned()],
                    Vec::new(),
                )
            };

        Ok(CanonicalResult {
            engine: Engine::new(LOCAL_RULES, VERSION),
            differential,
            triage,
            recommended_tests,
            red_flags,
            provenance: Provenance::at(self.clock.utc()),
        })
    }
}
