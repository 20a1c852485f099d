use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fhir::client::FetchError;
use crate::models::{AllergyRecord, MedicationRecord, Patient};

// ---------------------------------------------------------------------------
// SafetyVerdict
// ---------------------------------------------------------------------------

/// Outcome of a prescription-safety evaluation.
///
/// `reason` is present only when `safe` is false and names the conflicting
/// substance or medication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyVerdict {
    pub safe: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SafetyVerdict {
    pub fn clear() -> Self {
        Self {
            safe: true,
            reason: None,
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self {
            safe: false,
            reason: Some(reason.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// PatientSnapshot — pre-fetched records for one evaluation
// ---------------------------------------------------------------------------

/// Pre-fetched records for one evaluation. The evaluator fetches all
/// relevant data through the record source, builds this snapshot, and
/// passes it to the detection functions. This keeps detection logic pure
/// and testable.
pub struct PatientSnapshot {
    pub patient: Patient,
    pub allergies: Vec<AllergyRecord>,
    pub medications: Vec<MedicationRecord>,
}

impl PatientSnapshot {
    /// Medications that participate in interaction checks.
    pub fn active_medications(&self) -> impl Iterator<Item = &MedicationRecord> {
        self.medications.iter().filter(|m| m.is_active())
    }
}

// ---------------------------------------------------------------------------
// SafetyError
// ---------------------------------------------------------------------------

/// Failures surfaced by an evaluation. None of these are ever converted
/// into a `safe=true` verdict; a failed fetch must not read as a clinical
/// clearance.
#[derive(Debug, Error)]
pub enum SafetyError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error("Record fetch timed out")]
    UpstreamTimeout,

    #[error("Record fetch failed: {0}")]
    Upstream(String),

    #[error("Reference data load failed ({0}): {1}")]
    ReferenceDataLoad(String, String),

    #[error("Reference data parse failed ({0}): {1}")]
    ReferenceDataParse(String, String),
}

impl From<FetchError> for SafetyError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::PatientNotFound(id) => Self::PatientNotFound(id),
            FetchError::Timeout(_) => Self::UpstreamTimeout,
            other => Self::Upstream(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_verdict_serializes_without_reason() {
        let json = serde_json::to_string(&SafetyVerdict::clear()).unwrap();
        assert_eq!(json, r#"{"safe":true}"#);
    }

    #[test]
    fn conflict_verdict_serializes_with_reason() {
        let json =
            serde_json::to_string(&SafetyVerdict::conflict("Allergy conflict: penicillin"))
                .unwrap();
        assert_eq!(
            json,
            r#"{"safe":false,"reason":"Allergy conflict: penicillin"}"#
        );
    }

    #[test]
    fn fetch_errors_map_onto_safety_errors() {
        let err: SafetyError = FetchError::PatientNotFound("p1".into()).into();
        assert!(matches!(err, SafetyError::PatientNotFound(id) if id == "p1"));

        let err: SafetyError = FetchError::Timeout(10).into();
        assert!(matches!(err, SafetyError::UpstreamTimeout));

        let err: SafetyError = FetchError::Connection("http://x".into()).into();
        assert!(matches!(err, SafetyError::Upstream(_)));
    }
}
