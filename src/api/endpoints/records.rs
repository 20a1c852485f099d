//! Read-only record endpoints backing the dashboard lists.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::enums::{AllergyKind, Criticality, MedicationStatus};
use crate::models::{AllergyRecord, MedicationRecord, Patient};

/// Allergy entry shaped for the dashboard list.
#[derive(Debug, Serialize)]
pub struct AllergyView {
    pub substance: String,
    pub code: Option<String>,
    pub criticality: Criticality,
    pub kind: AllergyKind,
}

impl From<AllergyRecord> for AllergyView {
    fn from(record: AllergyRecord) -> Self {
        Self {
            substance: record.substance_display().to_string(),
            code: record.substance_code.clone(),
            criticality: record.criticality,
            kind: record.kind,
        }
    }
}

/// Medication entry shaped for the dashboard list.
#[derive(Debug, Serialize)]
pub struct MedicationView {
    pub medication: String,
    pub code: Option<String>,
    pub status: MedicationStatus,
}

impl From<MedicationRecord> for MedicationView {
    fn from(record: MedicationRecord) -> Self {
        Self {
            medication: record.medication_display().to_string(),
            code: record.medication_code.clone(),
            status: record.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AllergyListResponse {
    pub patient_id: String,
    pub allergies: Vec<AllergyView>,
}

#[derive(Debug, Serialize)]
pub struct MedicationListResponse {
    pub patient_id: String,
    pub medications: Vec<MedicationView>,
}

/// `GET /patient/:id` — patient demographics summary.
pub async fn patient(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let patient = ctx.records.get_patient(&id).await?;
    Ok(Json(patient))
}

/// `GET /allergies/:id` — the patient's recorded allergies.
pub async fn allergies(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<AllergyListResponse>, ApiError> {
    let records = ctx.records.get_allergies(&id).await?;
    Ok(Json(AllergyListResponse {
        patient_id: id,
        allergies: records.into_iter().map(AllergyView::from).collect(),
    }))
}

/// `GET /medications/:id` — the patient's active medications.
pub async fn medications(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<MedicationListResponse>, ApiError> {
    let records = ctx.records.get_active_medications(&id).await?;
    Ok(Json(MedicationListResponse {
        patient_id: id,
        medications: records.into_iter().map(MedicationView::from).collect(),
    }))
}
