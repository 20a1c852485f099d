//! Minimal FHIR R4 wire shapes.
//!
//! Only the fields the evaluator consumes are modeled; everything else in
//! the upstream resources is ignored during deserialization.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::enums::{AllergyKind, Criticality, MedicationStatus};
use crate::models::{AllergyRecord, MedicationRecord, Patient};

// ---------------------------------------------------------------------------
// Shared elements
// ---------------------------------------------------------------------------

/// A FHIR search result bundle.
#[derive(Debug, Deserialize)]
pub struct Bundle<T> {
    #[serde(default = "Vec::new")]
    pub entry: Vec<BundleEntry<T>>,
}

impl<T> Bundle<T> {
    /// Entries that actually carry a resource. Search bundles may
    /// interleave OperationOutcome entries without one.
    pub fn resources(self) -> impl Iterator<Item = T> {
        self.entry.into_iter().filter_map(|e| e.resource)
    }
}

#[derive(Debug, Deserialize)]
pub struct BundleEntry<T> {
    pub resource: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CodeableConcept {
    pub coding: Vec<Coding>,
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Coding {
    pub code: Option<String>,
    pub display: Option<String>,
}

impl CodeableConcept {
    /// First coded value, if any coding carries one.
    pub fn primary_code(&self) -> Option<&str> {
        self.coding.iter().find_map(|c| c.code.as_deref())
    }

    /// Display text: the concept's own text, else the first coding display.
    pub fn display_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .or_else(|| self.coding.iter().find_map(|c| c.display.as_deref()))
    }
}

// ---------------------------------------------------------------------------
// Patient
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientResource {
    pub id: Option<String>,
    #[serde(default)]
    pub name: Vec<HumanName>,
    pub birth_date: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HumanName {
    pub text: Option<String>,
    pub family: Option<String>,
    pub given: Vec<String>,
}

impl HumanName {
    fn display(&self) -> Option<String> {
        if let Some(text) = &self.text {
            return Some(text.clone());
        }
        let mut parts: Vec<&str> = self.given.iter().map(String::as_str).collect();
        if let Some(family) = &self.family {
            parts.push(family);
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

impl PatientResource {
    /// Map onto the evaluator's patient model. `requested_id` is used when
    /// the resource omits its own id.
    pub fn into_patient(self, requested_id: &str) -> Patient {
        let name = self
            .name
            .iter()
            .find_map(HumanName::display)
            .unwrap_or_else(|| "Unknown".to_string());
        Patient {
            id: self.id.unwrap_or_else(|| requested_id.to_string()),
            name,
            birth_date: self
                .birth_date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            active: self.active.unwrap_or(true),
        }
    }
}

// ---------------------------------------------------------------------------
// AllergyIntolerance
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyIntolerance {
    pub code: Option<CodeableConcept>,
    pub criticality: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl AllergyIntolerance {
    /// Map onto the evaluator's allergy model. An absent or unrecognized
    /// criticality degrades to `unable-to-assess` rather than being
    /// dropped, so unscored allergies still block prescriptions.
    pub fn into_record(self, patient_id: &str) -> AllergyRecord {
        let code = self.code.unwrap_or_default();
        AllergyRecord {
            patient_id: patient_id.to_string(),
            substance_code: code.primary_code().map(String::from),
            substance_text: code.display_text().map(String::from),
            criticality: self
                .criticality
                .as_deref()
                .and_then(|c| c.parse().ok())
                .unwrap_or(Criticality::UnableToAssess),
            kind: self
                .kind
                .as_deref()
                .and_then(|k| k.parse().ok())
                .unwrap_or(AllergyKind::Allergy),
        }
    }
}

// ---------------------------------------------------------------------------
// MedicationStatement
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationStatement {
    pub status: Option<String>,
    pub medication_codeable_concept: Option<CodeableConcept>,
}

impl MedicationStatement {
    pub fn into_record(self, patient_id: &str) -> MedicationRecord {
        let concept = self.medication_codeable_concept.unwrap_or_default();
        MedicationRecord {
            patient_id: patient_id.to_string(),
            medication_code: concept.primary_code().map(String::from),
            medication_text: concept.display_text().map(String::from),
            status: self
                .status
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(MedicationStatus::Unknown),
        }
    }
}
