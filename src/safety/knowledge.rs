use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::helpers::normalize_name;
use super::types::SafetyError;

/// Reference entry for one medication: the allergen classes it contains
/// and the medications it is known to interact dangerously with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub medication: String,
    #[serde(default)]
    pub allergen_classes: Vec<String>,
    #[serde(default)]
    pub interacts_with: Vec<String>,
}

impl KnowledgeEntry {
    /// Does this medication contain the given allergen class or substance?
    pub fn contains_allergen(&self, substance: &str) -> bool {
        let normalized = normalize_name(substance);
        self.allergen_classes
            .iter()
            .any(|c| normalize_name(c) == normalized)
    }

    /// Does this entry list a dangerous interaction with the given
    /// medication? Interaction links may be stored on either side of a
    /// pair, so callers must also consult the other medication's entry.
    pub fn lists_interaction(&self, medication: &str) -> bool {
        let normalized = normalize_name(medication);
        self.interacts_with
            .iter()
            .any(|m| normalize_name(m) == normalized)
    }
}

/// Static medication reference data, keyed by normalized name.
/// Not patient-specific; loaded once at startup and shared read-only.
pub struct InteractionKnowledgeBase {
    entries: HashMap<String, KnowledgeEntry>,
}

impl InteractionKnowledgeBase {
    /// Load reference data from a JSON file of `KnowledgeEntry` values.
    pub fn load(path: &Path) -> Result<Self, SafetyError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SafetyError::ReferenceDataLoad(path.display().to_string(), e.to_string())
        })?;
        let entries: Vec<KnowledgeEntry> = serde_json::from_str(&json).map_err(|e| {
            SafetyError::ReferenceDataParse(path.display().to_string(), e.to_string())
        })?;
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: Vec<KnowledgeEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| (normalize_name(&e.medication), e))
            .collect();
        Self { entries }
    }

    /// Create reference data for tests (no file I/O).
    pub fn load_test() -> Self {
        let entry = |medication: &str, classes: &[&str], interactions: &[&str]| {
            KnowledgeEntry {
                medication: medication.into(),
                allergen_classes: classes.iter().map(|s| s.to_string()).collect(),
                interacts_with: interactions.iter().map(|s| s.to_string()).collect(),
            }
        };
        Self::from_entries(vec![
            entry("penicillin", &["penicillin"], &[]),
            entry("amoxicillin", &["penicillin"], &[]),
            entry("cephalexin", &["cephalosporin"], &[]),
            entry("ibuprofen", &["nsaid"], &[]),
            // Interaction stored one-directionally on purpose: the
            // warfarin entry does not list aspirin back.
            entry("aspirin", &["nsaid", "salicylate"], &["warfarin"]),
            entry("warfarin", &[], &[]),
            entry("metformin", &[], &[]),
        ])
    }

    /// Look up a medication after normalization. Unknown medications
    /// resolve to `None`, never an error; the evaluator owns the policy
    /// for them.
    pub fn lookup(&self, name: &str) -> Option<&KnowledgeEntry> {
        self.entries.get(&normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
