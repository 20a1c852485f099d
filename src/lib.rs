pub mod api; // Dashboard HTTP surface
pub mod config;
pub mod fhir; // Read-only record access against the FHIR store
pub mod models;
pub mod safety; // Prescription-safety evaluation core
