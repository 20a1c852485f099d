//! Prescription-safety check endpoint.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::safety::types::SafetyVerdict;

#[derive(Debug, Deserialize)]
pub struct CheckPrescriptionParams {
    pub patient_id: String,
    pub medication: String,
}

/// `POST /check-prescription?patient_id=..&medication=..` — is the
/// proposed medication safe for this patient?
///
/// The extractor rejection is mapped by hand so a missing parameter
/// answers with the same structured error body as every other failure.
pub async fn check_prescription(
    State(ctx): State<ApiContext>,
    params: Result<Query<CheckPrescriptionParams>, QueryRejection>,
) -> Result<Json<SafetyVerdict>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let verdict = ctx
        .evaluator
        .evaluate(&params.patient_id, &params.medication)
        .await?;
    Ok(Json(verdict))
}
