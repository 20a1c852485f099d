use std::sync::Arc;
use std::time::Instant;

use crate::fhir::client::RecordSource;
use crate::models::enums::UnknownMedicationPolicy;
use crate::models::AllergyRecord;

use super::helpers::normalize_name;
use super::knowledge::{InteractionKnowledgeBase, KnowledgeEntry};
use super::types::{PatientSnapshot, SafetyError, SafetyVerdict};

/// Decides whether a proposed medication is safe for a patient.
///
/// Stateless per request: fetches a snapshot of the patient's records,
/// then runs the pure detection functions below against the knowledge
/// base. Concurrent evaluations are fully independent.
pub struct SafetyEvaluator {
    records: Arc<dyn RecordSource>,
    knowledge: Arc<InteractionKnowledgeBase>,
    unknown_policy: UnknownMedicationPolicy,
}

impl SafetyEvaluator {
    pub fn new(
        records: Arc<dyn RecordSource>,
        knowledge: Arc<InteractionKnowledgeBase>,
        unknown_policy: UnknownMedicationPolicy,
    ) -> Self {
        Self {
            records,
            knowledge,
            unknown_policy,
        }
    }

    /// Evaluate a proposed medication against a patient's records.
    ///
    /// Input validation happens before any fetch; fetch failures
    /// propagate as errors and are never folded into a verdict.
    pub async fn evaluate(
        &self,
        patient_id: &str,
        proposed_medication: &str,
    ) -> Result<SafetyVerdict, SafetyError> {
        let patient_id = patient_id.trim();
        if patient_id.is_empty() {
            return Err(SafetyError::InvalidInput(
                "patient id must not be empty".into(),
            ));
        }
        let proposed = normalize_name(proposed_medication);
        if proposed.is_empty() {
            return Err(SafetyError::InvalidInput(
                "medication name must not be empty".into(),
            ));
        }

        let start = Instant::now();
        let snapshot = self.fetch_snapshot(patient_id).await?;
        let verdict = self.evaluate_snapshot(&snapshot, &proposed);

        tracing::info!(
            patient_id,
            medication = %proposed,
            safe = verdict.safe,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Prescription safety evaluation complete"
        );

        Ok(verdict)
    }

    async fn fetch_snapshot(&self, patient_id: &str) -> Result<PatientSnapshot, SafetyError> {
        let patient = self.records.get_patient(patient_id).await?;
        let allergies = self.records.get_allergies(patient_id).await?;
        let medications = self.records.get_active_medications(patient_id).await?;
        Ok(PatientSnapshot {
            patient,
            allergies,
            medications,
        })
    }

    /// Pure verdict computation over a pre-fetched snapshot.
    ///
    /// Allergy conflicts outrank interaction conflicts: an allergic
    /// reaction is the higher-acuity outcome, so it is the one reported
    /// when both exist.
    fn evaluate_snapshot(&self, snapshot: &PatientSnapshot, proposed: &str) -> SafetyVerdict {
        let Some(entry) = self.knowledge.lookup(proposed) else {
            return match self.unknown_policy {
                UnknownMedicationPolicy::Permissive => SafetyVerdict::clear(),
                UnknownMedicationPolicy::Block => {
                    SafetyVerdict::conflict("Medication not recognized")
                }
            };
        };

        if let Some(substance) = allergy_conflict(&snapshot.allergies, entry) {
            return SafetyVerdict::conflict(format!("Allergy conflict: {substance}"));
        }

        if let Some(medication) =
            interaction_conflict(snapshot, proposed, entry, &self.knowledge)
        {
            return SafetyVerdict::conflict(format!("Interacts with {medication}"));
        }

        SafetyVerdict::clear()
    }
}

/// Find the allergy record whose substance matches one of the proposed
/// medication's allergen classes. Both the coded identifier and the free
/// text of each record are tried: a code from an unkeyed namespace must
/// not suppress a text match. Both `allergy` and `intolerance` kinds
/// trigger. The highest-criticality match is reported; ties keep record
/// order.
fn allergy_conflict(allergies: &[AllergyRecord], entry: &KnowledgeEntry) -> Option<String> {
    let mut best: Option<&AllergyRecord> = None;
    for record in allergies {
        if !record
            .substance_identifiers()
            .any(|identifier| entry.contains_allergen(identifier))
        {
            continue;
        }
        match best {
            Some(current) if record.criticality.rank() <= current.criticality.rank() => {}
            _ => best = Some(record),
        }
    }
    best.map(|record| record.substance_display().to_string())
}

/// Find an active medication that interacts with the proposed one.
/// The relation is symmetric even when the knowledge base stores the link
/// on only one side, so both entries of each pair are consulted — and
/// every identifier the record carries (code and text) is tried against
/// the knowledge base.
fn interaction_conflict(
    snapshot: &PatientSnapshot,
    proposed: &str,
    proposed_entry: &KnowledgeEntry,
    knowledge: &InteractionKnowledgeBase,
) -> Option<String> {
    for medication in snapshot.active_medications() {
        for identifier in medication.medication_identifiers() {
            if proposed_entry.lists_interaction(identifier) {
                return Some(medication.medication_display().to_string());
            }
            if let Some(active_entry) = knowledge.lookup(identifier) {
                if active_entry.lists_interaction(proposed) {
                    return Some(medication.medication_display().to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fhir::client::{MockFailure, MockRecordSource};
    use crate::models::enums::{AllergyKind, Criticality, MedicationStatus};
    use crate::models::{MedicationRecord, Patient};

    fn patient(id: &str) -> Patient {
        Patient {
            id: id.into(),
            name: "Test Patient".into(),
            birth_date: None,
            active: true,
        }
    }

    fn allergy(patient_id: &str, substance: &str, criticality: Criticality) -> AllergyRecord {
        AllergyRecord {
            patient_id: patient_id.into(),
            substance_code: None,
            substance_text: Some(substance.into()),
            criticality,
            kind: AllergyKind::Allergy,
        }
    }

    fn medication(patient_id: &str, name: &str) -> MedicationRecord {
        MedicationRecord {
            patient_id: patient_id.into(),
            medication_code: None,
            medication_text: Some(name.into()),
            status: MedicationStatus::Active,
        }
    }

    fn evaluator(source: MockRecordSource) -> SafetyEvaluator {
        evaluator_with_policy(source, UnknownMedicationPolicy::Block)
    }

    fn evaluator_with_policy(
        source: MockRecordSource,
        policy: UnknownMedicationPolicy,
    ) -> SafetyEvaluator {
        SafetyEvaluator::new(
            Arc::new(source),
            Arc::new(InteractionKnowledgeBase::load_test()),
            policy,
        )
    }

    /// P1: penicillin allergy blocks amoxicillin, naming the substance.
    #[tokio::test]
    async fn allergy_conflict_penicillin_amoxicillin() {
        let source = MockRecordSource::new()
            .with_patient(patient("P1"))
            .with_allergy(allergy("P1", "penicillin", Criticality::High));

        let verdict = evaluator(source).evaluate("P1", "amoxicillin").await.unwrap();
        assert_eq!(
            verdict,
            SafetyVerdict::conflict("Allergy conflict: penicillin")
        );
    }

    /// P2: active warfarin blocks aspirin, naming the medication.
    #[tokio::test]
    async fn interaction_conflict_warfarin_aspirin() {
        let source = MockRecordSource::new()
            .with_patient(patient("P2"))
            .with_medication(medication("P2", "warfarin"));

        let verdict = evaluator(source).evaluate("P2", "aspirin").await.unwrap();
        assert_eq!(verdict, SafetyVerdict::conflict("Interacts with warfarin"));
    }

    /// P3: a patient with no records clears any known, non-interacting drug.
    #[tokio::test]
    async fn no_records_is_safe() {
        let source = MockRecordSource::new().with_patient(patient("P3"));
        let verdict = evaluator(source).evaluate("P3", "ibuprofen").await.unwrap();
        assert_eq!(verdict, SafetyVerdict::clear());
    }

    /// The interaction link is stored on the aspirin entry only; proposing
    /// warfarin against active aspirin must still be caught.
    #[tokio::test]
    async fn interaction_check_is_symmetric() {
        let source = MockRecordSource::new()
            .with_patient(patient("P2"))
            .with_medication(medication("P2", "aspirin"));

        let verdict = evaluator(source).evaluate("P2", "warfarin").await.unwrap();
        assert_eq!(verdict, SafetyVerdict::conflict("Interacts with aspirin"));
    }

    #[tokio::test]
    async fn unknown_medication_blocked_by_default() {
        let source = MockRecordSource::new().with_patient(patient("P3"));
        let verdict = evaluator(source)
            .evaluate("P3", "experimentol")
            .await
            .unwrap();
        assert_eq!(verdict, SafetyVerdict::conflict("Medication not recognized"));
    }

    #[tokio::test]
    async fn unknown_medication_cleared_when_permissive() {
        let source = MockRecordSource::new().with_patient(patient("P3"));
        let verdict =
            evaluator_with_policy(source, UnknownMedicationPolicy::Permissive)
                .evaluate("P3", "experimentol")
                .await
                .unwrap();
        assert_eq!(verdict, SafetyVerdict::clear());
    }

    /// Allergy and interaction conflicts on the same request: the allergy
    /// is the one reported.
    #[tokio::test]
    async fn allergy_outranks_interaction() {
        let source = MockRecordSource::new()
            .with_patient(patient("P1"))
            .with_allergy(allergy("P1", "nsaid", Criticality::Low))
            .with_medication(medication("P1", "warfarin"));

        let verdict = evaluator(source).evaluate("P1", "aspirin").await.unwrap();
        assert_eq!(verdict, SafetyVerdict::conflict("Allergy conflict: nsaid"));
    }

    /// Several matching allergies: the highest criticality is reported,
    /// not the first in record order.
    #[tokio::test]
    async fn highest_criticality_match_is_reported() {
        let source = MockRecordSource::new()
            .with_patient(patient("P1"))
            .with_allergy(allergy("P1", "nsaid", Criticality::Low))
            .with_allergy(allergy("P1", "salicylate", Criticality::High));

        let verdict = evaluator(source).evaluate("P1", "aspirin").await.unwrap();
        assert_eq!(
            verdict,
            SafetyVerdict::conflict("Allergy conflict: salicylate")
        );
    }

    /// Equal criticality keeps record order.
    #[tokio::test]
    async fn criticality_tie_keeps_record_order() {
        let source = MockRecordSource::new()
            .with_patient(patient("P1"))
            .with_allergy(allergy("P1", "nsaid", Criticality::High))
            .with_allergy(allergy("P1", "salicylate", Criticality::High));

        let verdict = evaluator(source).evaluate("P1", "aspirin").await.unwrap();
        assert_eq!(verdict, SafetyVerdict::conflict("Allergy conflict: nsaid"));
    }

    /// Intolerances trigger conflicts the same way allergies do.
    #[tokio::test]
    async fn intolerance_kind_also_triggers() {
        let mut record = allergy("P1", "penicillin", Criticality::Low);
        record.kind = AllergyKind::Intolerance;
        let source = MockRecordSource::new()
            .with_patient(patient("P1"))
            .with_allergy(record);

        let verdict = evaluator(source).evaluate("P1", "amoxicillin").await.unwrap();
        assert!(!verdict.safe);
    }

    /// Matching is case-insensitive and tolerant of stray whitespace.
    #[tokio::test]
    async fn matching_normalizes_case_and_whitespace() {
        let source = MockRecordSource::new()
            .with_patient(patient("P1"))
            .with_allergy(allergy("P1", "PENICILLIN", Criticality::High));

        let verdict = evaluator(source)
            .evaluate("P1", "  Amoxicillin ")
            .await
            .unwrap();
        assert_eq!(
            verdict,
            SafetyVerdict::conflict("Allergy conflict: PENICILLIN")
        );
    }

    /// A record carrying both a code and text must still match on the
    /// text when the code belongs to a namespace the knowledge base does
    /// not key. This is the shape HAPI-style stores actually return.
    #[tokio::test]
    async fn coded_allergy_still_matches_on_text() {
        let record = AllergyRecord {
            patient_id: "P1".into(),
            substance_code: Some("70618".into()),
            substance_text: Some("penicillin".into()),
            criticality: Criticality::High,
            kind: AllergyKind::Allergy,
        };
        let source = MockRecordSource::new()
            .with_patient(patient("P1"))
            .with_allergy(record);

        let verdict = evaluator(source).evaluate("P1", "amoxicillin").await.unwrap();
        assert_eq!(
            verdict,
            SafetyVerdict::conflict("Allergy conflict: penicillin")
        );
    }

    /// Same for interactions: a coded medication statement must still be
    /// caught through its text name.
    #[tokio::test]
    async fn coded_medication_still_interacts_on_text() {
        let record = MedicationRecord {
            patient_id: "P2".into(),
            medication_code: Some("11289".into()),
            medication_text: Some("warfarin".into()),
            status: MedicationStatus::Active,
        };
        let source = MockRecordSource::new()
            .with_patient(patient("P2"))
            .with_medication(record);

        let verdict = evaluator(source).evaluate("P2", "aspirin").await.unwrap();
        assert_eq!(verdict, SafetyVerdict::conflict("Interacts with warfarin"));
    }

    /// Records that carry no substance identifier at all cannot match.
    #[tokio::test]
    async fn allergy_without_identifier_is_skipped() {
        let record = AllergyRecord {
            patient_id: "P1".into(),
            substance_code: None,
            substance_text: None,
            criticality: Criticality::High,
            kind: AllergyKind::Allergy,
        };
        let source = MockRecordSource::new()
            .with_patient(patient("P1"))
            .with_allergy(record);

        let verdict = evaluator(source).evaluate("P1", "amoxicillin").await.unwrap();
        assert_eq!(verdict, SafetyVerdict::clear());
    }

    /// Non-active medications never participate in interaction checks.
    #[tokio::test]
    async fn stopped_medication_does_not_interact() {
        let mut record = medication("P2", "warfarin");
        record.status = MedicationStatus::Stopped;
        let source = MockRecordSource::new()
            .with_patient(patient("P2"))
            .with_medication(record);

        let verdict = evaluator(source).evaluate("P2", "aspirin").await.unwrap();
        assert_eq!(verdict, SafetyVerdict::clear());
    }

    #[tokio::test]
    async fn empty_patient_id_is_rejected_before_fetch() {
        let source = MockRecordSource::new().failing_with(MockFailure::Timeout);
        let err = evaluator(source).evaluate("  ", "aspirin").await.unwrap_err();
        assert!(matches!(err, SafetyError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn empty_medication_is_rejected_before_fetch() {
        let source = MockRecordSource::new().failing_with(MockFailure::Timeout);
        let err = evaluator(source).evaluate("P1", "   ").await.unwrap_err();
        assert!(matches!(err, SafetyError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn unknown_patient_propagates_not_found() {
        let source = MockRecordSource::new();
        let err = evaluator(source)
            .evaluate("ghost", "aspirin")
            .await
            .unwrap_err();
        assert!(matches!(err, SafetyError::PatientNotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn fetch_timeout_propagates() {
        let source = MockRecordSource::new()
            .with_patient(patient("P1"))
            .failing_with(MockFailure::Timeout);
        let err = evaluator(source).evaluate("P1", "aspirin").await.unwrap_err();
        assert!(matches!(err, SafetyError::UpstreamTimeout));
    }

    /// Identical inputs over unchanged records yield identical verdicts.
    #[tokio::test]
    async fn evaluation_is_idempotent() {
        let source = MockRecordSource::new()
            .with_patient(patient("P1"))
            .with_allergy(allergy("P1", "penicillin", Criticality::High))
            .with_medication(medication("P1", "warfarin"));
        let evaluator = evaluator(source);

        let first = evaluator.evaluate("P1", "amoxicillin").await.unwrap();
        let second = evaluator.evaluate("P1", "amoxicillin").await.unwrap();
        assert_eq!(first, second);
    }
}
