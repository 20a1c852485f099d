//! Prescription-safety evaluation core.
//!
//! Given a patient's allergy and active-medication records plus a static
//! interaction knowledge base, decides whether a proposed medication is
//! safe to prescribe and explains why not when it is unsafe. Record
//! fetching is the only I/O; the verdict itself is a pure function of the
//! fetched snapshot and the knowledge-base contents.

pub mod evaluator;
pub mod helpers;
pub mod knowledge;
pub mod types;

pub use evaluator::SafetyEvaluator;
pub use knowledge::{InteractionKnowledgeBase, KnowledgeEntry};
pub use types::{PatientSnapshot, SafetyError, SafetyVerdict};
