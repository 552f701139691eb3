use media_autopost::{
    AdapterRegistry, Config, NotificationSink, ObjectStore, Orchestrator, RunContext,
    S3ObjectStore, SlotStatus, cancel_on_signal, notify,
};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!(error = %e, "invalid configuration, no slots attempted");
            return ExitCode::FAILURE;
        }
    };
    info!(bucket = %config.storage.bucket, slots = config.slots.len(), "configuration loaded");

    let client = match reqwest::Client::builder().timeout(config.http_timeout).build() {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::from_config(&config.storage));
    let adapters =
        AdapterRegistry::from_config(&config.platforms, client, store.clone(), cancel.clone());
    let sinks: Vec<Arc<dyn NotificationSink>> = notify::sinks_from_config(&config.notifications);

    let orchestrator = Orchestrator::new(config, store, adapters)
        .with_sinks(sinks)
        .with_cancellation(cancel.clone());

    let signals = cancel_on_signal(cancel);
    let result = orchestrator.run(&RunContext::now()).await;
    signals.abort();

    match result {
        Ok(summary) => {
            info!(
                success = summary.count(SlotStatus::Success),
                failed = summary.count(SlotStatus::Failed),
                skipped = summary.count(SlotStatus::Skipped),
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "run aborted");
            ExitCode::FAILURE
        }
    }
}
