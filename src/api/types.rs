//! Shared state for the dashboard API.

use std::sync::Arc;

use crate::fhir::client::RecordSource;
use crate::safety::evaluator::SafetyEvaluator;

/// Shared context for all API routes. Everything inside is read-only per
/// request, so handlers can run with arbitrary parallelism.
#[derive(Clone)]
pub struct ApiContext {
    pub records: Arc<dyn RecordSource>,
    pub evaluator: Arc<SafetyEvaluator>,
}

impl ApiContext {
    pub fn new(records: Arc<dyn RecordSource>, evaluator: Arc<SafetyEvaluator>) -> Self {
        Self { records, evaluator }
    }
}
