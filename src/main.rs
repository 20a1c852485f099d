use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use rxguard::api::server::start_server;
use rxguard::api::types::ApiContext;
use rxguard::config::{self, ServiceConfig};
use rxguard::fhir::client::{FhirClient, RecordSource};
use rxguard::safety::evaluator::SafetyEvaluator;
use rxguard::safety::knowledge::InteractionKnowledgeBase;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let cfg = ServiceConfig::from_env();

    let knowledge = match InteractionKnowledgeBase::load(&cfg.knowledge_file) {
        Ok(kb) => Arc::new(kb),
        Err(e) => {
            tracing::error!(error = %e, "Cannot load interaction knowledge base");
            std::process::exit(1);
        }
    };
    tracing::info!(
        entries = knowledge.len(),
        path = %cfg.knowledge_file.display(),
        "Interaction knowledge base loaded"
    );

    let records: Arc<dyn RecordSource> = Arc::new(FhirClient::new(
        &cfg.fhir_base_url,
        cfg.upstream_timeout_secs,
    ));
    let evaluator = Arc::new(SafetyEvaluator::new(
        records.clone(),
        knowledge,
        cfg.unknown_medication_policy.clone(),
    ));
    let ctx = ApiContext::new(records, evaluator);

    let mut server = match start_server(ctx, &cfg.bind_addr).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Cannot start dashboard API server");
            std::process::exit(1);
        }
    };

    tracing::info!(
        addr = %server.addr,
        fhir = %cfg.fhir_base_url,
        policy = cfg.unknown_medication_policy.as_str(),
        "Dashboard API ready"
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    server.shutdown();
}
