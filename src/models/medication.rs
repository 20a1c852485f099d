use serde::{Deserialize, Serialize};

use super::enums::MedicationStatus;

/// One medication statement for a patient. Only `active` records
/// participate in interaction checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub patient_id: String,
    /// Coded medication identifier, when the source record carries one.
    pub medication_code: Option<String>,
    /// Free-text medication name.
    pub medication_text: Option<String>,
    pub status: MedicationStatus,
}

impl MedicationRecord {
    pub fn is_active(&self) -> bool {
        self.status == MedicationStatus::Active
    }

    /// Identifiers used for matching, coded value first. A present code
    /// may live in a namespace the knowledge base does not key, so the
    /// free text is always tried as well.
    pub fn medication_identifiers(&self) -> impl Iterator<Item = &str> {
        self.medication_code
            .as_deref()
            .into_iter()
            .chain(self.medication_text.as_deref())
    }

    /// Human-readable medication name for verdict reasons (text preferred).
    pub fn medication_display(&self) -> &str {
        self.medication_text
            .as_deref()
            .or(self.medication_code.as_deref())
            .unwrap_or("unknown medication")
    }
}
