use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::models::{AllergyRecord, MedicationRecord, Patient};

use super::types::{AllergyIntolerance, Bundle, MedicationStatement, PatientResource};

/// Errors from record fetches against the FHIR store.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error("FHIR store did not respond within {0}s")]
    Timeout(u64),

    #[error("Cannot reach FHIR store at {0}")]
    Connection(String),

    #[error("FHIR store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode FHIR response: {0}")]
    Decode(String),

    #[error("FHIR request failed: {0}")]
    Http(String),
}

/// Read-only access to a patient's clinical records.
///
/// All three operations are side-effect-free; implementations must fail
/// with `FetchError::PatientNotFound` for unknown patient ids rather than
/// returning empty data.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn get_patient(&self, patient_id: &str) -> Result<Patient, FetchError>;

    async fn get_allergies(&self, patient_id: &str)
        -> Result<Vec<AllergyRecord>, FetchError>;

    async fn get_active_medications(
        &self,
        patient_id: &str,
    ) -> Result<Vec<MedicationRecord>, FetchError>;
}

// ═══════════════════════════════════════════════════════════
// FhirClient — record source backed by a FHIR R4 store
// ═══════════════════════════════════════════════════════════

/// HTTP client for a FHIR R4 store.
pub struct FhirClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl FhirClient {
    /// Create a client with a per-call timeout on every record fetch.
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    fn triage(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            FetchError::Connection(self.base_url.clone())
        } else {
            FetchError::Http(e.to_string())
        }
    }

    /// Run a search (`{resource_type}?patient={id}`) and decode the bundle.
    async fn search<T: DeserializeOwned>(
        &self,
        resource_type: &str,
        patient_id: &str,
    ) -> Result<Bundle<T>, FetchError> {
        let url = format!("{}/{resource_type}?patient={patient_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.triage(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RecordSource for FhirClient {
    async fn get_patient(&self, patient_id: &str) -> Result<Patient, FetchError> {
        let url = format!("{}/Patient/{patient_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.triage(e))?;

        let status = response.status();
        // FHIR reads answer 404 for unknown ids and 410 for deleted ones.
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Err(FetchError::PatientNotFound(patient_id.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let resource: PatientResource = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(resource.into_patient(patient_id))
    }

    async fn get_allergies(
        &self,
        patient_id: &str,
    ) -> Result<Vec<AllergyRecord>, FetchError> {
        let bundle: Bundle<AllergyIntolerance> =
            self.search("AllergyIntolerance", patient_id).await?;
        Ok(bundle
            .resources()
            .map(|r| r.into_record(patient_id))
            .collect())
    }

    async fn get_active_medications(
        &self,
        patient_id: &str,
    ) -> Result<Vec<MedicationRecord>, FetchError> {
        let bundle: Bundle<MedicationStatement> =
            self.search("MedicationStatement", patient_id).await?;
        Ok(bundle
            .resources()
            .map(|r| r.into_record(patient_id))
            .filter(MedicationRecord::is_active)
            .collect())
    }
}

// ═══════════════════════════════════════════════════════════
// MockRecordSource — in-memory record source for tests
// ═══════════════════════════════════════════════════════════

/// Failure a mock fetch should simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Timeout,
    Unreachable,
}

/// In-memory record source for tests — seeded per patient.
#[derive(Default)]
pub struct MockRecordSource {
    patients: HashMap<String, Patient>,
    allergies: HashMap<String, Vec<AllergyRecord>>,
    medications: HashMap<String, Vec<MedicationRecord>>,
    failure: Option<MockFailure>,
}

impl MockRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patient(mut self, patient: Patient) -> Self {
        self.patients.insert(patient.id.clone(), patient);
        self
    }

    pub fn with_allergy(mut self, record: AllergyRecord) -> Self {
        self.allergies
            .entry(record.patient_id.clone())
            .or_default()
            .push(record);
        self
    }

    pub fn with_medication(mut self, record: MedicationRecord) -> Self {
        self.medications
            .entry(record.patient_id.clone())
            .or_default()
            .push(record);
        self
    }

    /// Make every fetch fail with the given mode.
    pub fn failing_with(mut self, failure: MockFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    fn check_failure(&self) -> Result<(), FetchError> {
        match self.failure {
            Some(MockFailure::Timeout) => Err(FetchError::Timeout(10)),
            Some(MockFailure::Unreachable) => {
                Err(FetchError::Connection("mock://fhir".to_string()))
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordSource for MockRecordSource {
    async fn get_patient(&self, patient_id: &str) -> Result<Patient, FetchError> {
        self.check_failure()?;
        self.patients
            .get(patient_id)
            .cloned()
            .ok_or_else(|| FetchError::PatientNotFound(patient_id.to_string()))
    }

    async fn get_allergies(
        &self,
        patient_id: &str,
    ) -> Result<Vec<AllergyRecord>, FetchError> {
        self.check_failure()?;
        Ok(self.allergies.get(patient_id).cloned().unwrap_or_default())
    }

    async fn get_active_medications(
        &self,
        patient_id: &str,
    ) -> Result<Vec<MedicationRecord>, FetchError> {
        self.check_failure()?;
        Ok(self
            .medications
            .get(patient_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(MedicationRecord::is_active)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{AllergyKind, Criticality, MedicationStatus};

    fn patient(id: &str) -> Patient {
        Patient {
            id: id.into(),
            name: "Test Patient".into(),
            birth_date: None,
            active: true,
        }
    }

    #[test]
    fn fhir_client_trims_trailing_slash() {
        let client = FhirClient::new("https://hapi.fhir.org/baseR4/", 10);
        assert_eq!(client.base_url, "https://hapi.fhir.org/baseR4");
        assert_eq!(client.timeout_secs, 10);
    }

    #[tokio::test]
    async fn mock_returns_seeded_patient() {
        let source = MockRecordSource::new().with_patient(patient("p1"));
        let found = source.get_patient("p1").await.unwrap();
        assert_eq!(found.id, "p1");
    }

    #[tokio::test]
    async fn mock_unknown_patient_is_not_found() {
        let source = MockRecordSource::new();
        let err = source.get_patient("nobody").await.unwrap_err();
        assert!(matches!(err, FetchError::PatientNotFound(id) if id == "nobody"));
    }

    #[tokio::test]
    async fn mock_filters_inactive_medications() {
        let source = MockRecordSource::new()
            .with_medication(MedicationRecord {
                patient_id: "p1".into(),
                medication_code: None,
                medication_text: Some("warfarin".into()),
                status: MedicationStatus::Active,
            })
            .with_medication(MedicationRecord {
                patient_id: "p1".into(),
                medication_code: None,
                medication_text: Some("amoxicillin".into()),
                status: MedicationStatus::Completed,
            });

        let meds = source.get_active_medications("p1").await.unwrap();
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0].medication_display(), "warfarin");
    }

    #[tokio::test]
    async fn mock_failure_mode_times_out() {
        let source = MockRecordSource::new()
            .with_patient(patient("p1"))
            .failing_with(MockFailure::Timeout);
        let err = source.get_patient("p1").await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
    }

    #[tokio::test]
    async fn mock_allergies_empty_for_clean_patient() {
        let source = MockRecordSource::new().with_patient(patient("p3"));
        assert!(source.get_allergies("p3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mock_allergy_seeding_round_trips() {
        let source = MockRecordSource::new().with_allergy(AllergyRecord {
            patient_id: "p1".into(),
            substance_code: None,
            substance_text: Some("penicillin".into()),
            criticality: Criticality::High,
            kind: AllergyKind::Allergy,
        });
        let allergies = source.get_allergies("p1").await.unwrap();
        assert_eq!(allergies.len(), 1);
        assert_eq!(allergies[0].substance_display(), "penicillin");
    }
}
