//! Read-only record access against an external FHIR R4 store.
//!
//! The store owns all clinical data; this module only fetches the three
//! record kinds the safety evaluator consumes (patient, allergies,
//! medication statements) and maps them onto the crate's own models.

pub mod client;
pub mod types;

pub use client::{FetchError, FhirClient, MockRecordSource, RecordSource};
