//! Canonical diagnostic output shared by every provider.
//!
//! Whatever a provider speaks on the wire, callers only ever see a
//! [`CanonicalResult`]. Confidences are validated on construction and triage
//! levels are restricted to three values.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raised when a confidence falls outside `[0, 1]` or is not finite.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("confidence {0} is outside [0, 1]")]
pub struct ConfidenceOutOfRange(pub f64);

/// Probability-like score in `[0, 1]`.
///
/// # Examples
/// ```
/// use ddx_gateway::domain::Confidence;
///
/// assert!(Confidence::new(0.6).is_ok());
/// assert!(Confidence::new(1.2).is_err());
/// assert!(Confidence::new(f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Validate and wrap a confidence value.
    ///
    /// # Errors
    /// Returns [`ConfidenceOutOfRange`] for non-finite values or values
    /// outside `[0, 1]`.
    pub fn new(value: f64) -> Result<Self, ConfidenceOutOfRange> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfidenceOutOfRange(value))
        }
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Confidence {
    type Error = ConfidenceOutOfRange;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(value: Confidence) -> Self {
        value.0
    }
}

/// Canonical acuity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageLevel {
    Low,
    Moderate,
    High,
}

impl TriageLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }

    /// Parse an already-canonical level, ignoring case and surrounding
    /// whitespace.
    #[must_use]
    pub fn from_canonical(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "moderate" => Some(Self::Moderate),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for TriageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Triage decision with its justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triage {
    pub level: TriageLevel,
    pub why: String,
}

impl Triage {
    pub fn new(level: TriageLevel, why: impl Into<String>) -> Self {
        Self {
            level,
            why: why.into(),
        }
    }
}

/// Identity of the engine that produced a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engine {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Engine {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
        }
    }
}

/// One candidate condition in a differential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferentialEntry {
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    /// Code system → code, e.g. `icd10 → I20.0`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub codes: BTreeMap<String, String>,
}

impl DifferentialEntry {
    pub fn new(condition: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            confidence: None,
            rationale: None,
            codes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    #[must_use]
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    #[must_use]
    pub fn with_code(mut self, system: impl Into<String>, code: impl Into<String>) -> Self {
        self.codes.insert(system.into(), code.into());
        self
    }
}

/// Where and when a result was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub generated_at: DateTime<Utc>,
    /// Optional engine metadata, flattened next to `generated_at`.
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Provenance {
    pub fn at(generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            metadata: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Provider-independent diagnostic output.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use ddx_gateway::domain::{
///     CanonicalResult, Engine, Provenance, Triage, TriageLevel,
/// };
///
/// let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("valid");
/// let result = CanonicalResult {
///     engine: Engine::new("local_rules", "0.1"),
///     differential: Vec::new(),
///     triage: Triage::new(TriageLevel::Low, "no red flags"),
///     recommended_tests: Vec::new(),
///     red_flags: Vec::new(),
///     provenance: Provenance::at(at),
/// };
/// let json = serde_json::to_value(&result).expect("serialise");
/// assert_eq!(json["triage"]["level"], "low");
/// assert_eq!(json["provenance"]["generated_at"], "2026-01-01T00:00:00Z");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResult {
    pub engine: Engine,
    pub differential: Vec<DifferentialEntry>,
    pub triage: Triage,
    #[serde(default)]
    pub recommended_tests: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    pub provenance: Provenance,
}
