use serde::{Deserialize, Serialize};

use super::enums::{AllergyKind, Criticality};

/// One recorded allergy or intolerance for a patient. Maintained by the
/// clinical system of record; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllergyRecord {
    pub patient_id: String,
    /// Coded substance identifier, when the source record carries one.
    pub substance_code: Option<String>,
    /// Free-text substance name.
    pub substance_text: Option<String>,
    pub criticality: Criticality,
    pub kind: AllergyKind,
}

impl AllergyRecord {
    /// Identifiers used for matching, coded value first. A present code
    /// may live in a namespace the knowledge base does not key, so the
    /// free text is always tried as well; a record with neither can
    /// never match.
    pub fn substance_identifiers(&self) -> impl Iterator<Item = &str> {
        self.substance_code
            .as_deref()
            .into_iter()
            .chain(self.substance_text.as_deref())
    }

    /// Human-readable substance name for verdict reasons (text preferred).
    pub fn substance_display(&self) -> &str {
        self.substance_text
            .as_deref()
            .or(self.substance_code.as_deref())
            .unwrap_or("unknown substance")
    }
}
