//! Diagnostic case submitted by callers.
//!
//! A case is immutable once constructed. Construction validates the chief
//! complaint; everything else is optional free text handed to providers
//! untouched.

use serde::{Deserialize, Serialize};

/// Validation errors raised when constructing a [`DiagnosticCase`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiagnosticCaseValidationError {
    #[error("chief_complaint is required")]
    MissingChiefComplaint,
    #[error("chief_complaint must not be blank")]
    BlankChiefComplaint,
}

/// Optional patient demographics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
}

/// De-identified clinical presentation.
///
/// ## Invariants
/// - `chief_complaint` is present and not blank.
///
/// # Examples
/// ```
/// use ddx_gateway::domain::DiagnosticCase;
///
/// let case = DiagnosticCase::new("chest pressure")
///     .expect("valid complaint")
///     .with_symptoms(vec!["diaphoresis".into()]);
/// assert_eq!(case.chief_complaint(), "chest pressure");
/// assert!(DiagnosticCase::new("  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DiagnosticCaseDto", into = "DiagnosticCaseDto")]
pub struct DiagnosticCase {
    chief_complaint: String,
    demographics: Option<Demographics>,
    symptoms: Vec<String>,
    notes: Option<String>,
    patient_id: Option<String>,
}

impl DiagnosticCase {
    /// Build a case from its chief complaint.
    ///
    /// # Errors
    /// Returns [`DiagnosticCaseValidationError::BlankChiefComplaint`] when the
    /// complaint is empty or whitespace.
    pub fn new(chief_complaint: impl Into<String>) -> Result<Self, DiagnosticCaseValidationError> {
        let chief_complaint = chief_complaint.into();
        if chief_complaint.trim().is_empty() {
            return Err(DiagnosticCaseValidationError::BlankChiefComplaint);
        }
        Ok(Self {
            chief_complaint,
            demographics: None,
            symptoms: Vec::new(),
            notes: None,
            patient_id: None,
        })
    }

    #[must_use]
    pub fn with_demographics(mut self, demographics: Demographics) -> Self {
        self.demographics = Some(demographics);
        self
    }

    #[must_use]
    pub fn with_symptoms(mut self, symptoms: Vec<String>) -> Self {
        self.symptoms = symptoms;
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn with_patient_id(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    pub fn chief_complaint(&self) -> &str {
        self.chief_complaint.as_str()
    }

    pub fn demographics(&self) -> Option<&Demographics> {
        self.demographics.as_ref()
    }

    pub fn age(&self) -> Option<u32> {
        self.demographics.as_ref().and_then(|d| d.age)
    }

    pub fn sex(&self) -> Option<&str> {
        self.demographics.as_ref().and_then(|d| d.sex.as_deref())
    }

    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn patient_id(&self) -> Option<&str> {
        self.patient_id.as_deref()
    }

    /// Single free-text line combining complaint, symptoms and notes.
    ///
    /// Parts are joined with `"; "`, symptoms with `", "`; empty parts are
    /// skipped.
    ///
    /// # Examples
    /// ```
    /// use ddx_gateway::domain::DiagnosticCase;
    ///
    /// let case = DiagnosticCase::new("cough")
    ///     .expect("valid")
    ///     .with_symptoms(vec!["fever".into(), "chills".into()])
    ///     .with_notes("3 days");
    /// assert_eq!(case.free_text(), "cough; fever, chills; 3 days");
    /// ```
    #[must_use]
    pub fn free_text(&self) -> String {
        let symptoms = self.symptoms.join(", ");
        [
            Some(self.chief_complaint.as_str()),
            Some(symptoms.as_str()),
            self.notes.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join("; ")
    }
}

/// Wire representation of [`DiagnosticCase`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticCaseDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chief_complaint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographics: Option<Demographics>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symptoms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
}

impl TryFrom<DiagnosticCaseDto> for DiagnosticCase {
    type Error = DiagnosticCaseValidationError;

    fn try_from(value: DiagnosticCaseDto) -> Result<Self, Self::Error> {
        let DiagnosticCaseDto {
            chief_complaint,
            demographics,
            symptoms,
            notes,
            patient_id,
        } = value;
        let chief_complaint =
            chief_complaint.ok_or(DiagnosticCaseValidationError::MissingChiefComplaint)?;
        let mut case = Self::new(chief_complaint)?;
        case.demographics = demographics;
        case.symptoms = symptoms;
        case.notes = notes;
        case.patient_id = patient_id;
        Ok(case)
    }
}

impl From<DiagnosticCase> for DiagnosticCaseDto {
    fn from(value: DiagnosticCase) -> Self {
        Self {
            chief_complaint: Some(value.chief_complaint),
            demographics: value.demographics,
            symptoms: value.symptoms,
            notes: value.notes,
            patient_id: value.patient_id,
        }
    }
}
