use std::env;
use std::path::PathBuf;

use crate::models::enums::UnknownMedicationPolicy;

/// Application-level constants
pub const APP_NAME: &str = "rxguard";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tracing filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    format!("info,{APP_NAME}=debug")
}

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_FHIR_BASE_URL: &str = "https://hapi.fhir.org/baseR4";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_KNOWLEDGE_FILE: &str = "resources/interaction_kb.json";

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Base URL of the upstream FHIR R4 store.
    pub fhir_base_url: String,
    /// Per-call timeout for record fetches against the FHIR store.
    pub upstream_timeout_secs: u64,
    /// What to do when a proposed medication has no knowledge entry.
    /// `block` fails closed; `permissive` clears unknown drugs.
    pub unknown_medication_policy: UnknownMedicationPolicy,
    /// Path to the bundled interaction knowledge file.
    pub knowledge_file: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            fhir_base_url: DEFAULT_FHIR_BASE_URL.to_string(),
            upstream_timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            unknown_medication_policy: UnknownMedicationPolicy::Block,
            knowledge_file: PathBuf::from(DEFAULT_KNOWLEDGE_FILE),
        }
    }
}

impl ServiceConfig {
    /// Read configuration from `RXGUARD_*` environment variables.
    ///
    /// Anything unset or unparseable falls back to the default. The
    /// unknown-medication policy in particular defaults to `block`, so a
    /// typo in the variable never silently opens the permissive path.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env::var("RXGUARD_BIND_ADDR").unwrap_or(defaults.bind_addr),
            fhir_base_url: env::var("RXGUARD_FHIR_BASE_URL")
                .unwrap_or(defaults.fhir_base_url),
            upstream_timeout_secs: env::var("RXGUARD_UPSTREAM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.upstream_timeout_secs),
            unknown_medication_policy: env::var("RXGUARD_UNKNOWN_MEDICATION_POLICY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.unknown_medication_policy),
            knowledge_file: env::var("RXGUARD_KNOWLEDGE_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.knowledge_file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_block() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.unknown_medication_policy, UnknownMedicationPolicy::Block);
    }

    #[test]
    fn default_points_at_hapi_r4() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.fhir_base_url, "https://hapi.fhir.org/baseR4");
        assert_eq!(cfg.upstream_timeout_secs, 10);
    }

    #[test]
    fn default_log_filter_names_crate() {
        assert!(default_log_filter().contains(APP_NAME));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
