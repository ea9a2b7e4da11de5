pub mod config;
pub mod database;
pub mod generation;
pub mod interview;
pub mod proctoring;
pub mod session;
pub mod terminal;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};
use tokio::sync::mpsc;

use config::{AppConfig, DatabaseConfig};
use database::{MemoryResultStore, PostgresResultStore, ResultStore};
use generation::{OpenAIBackend, StructuredGenerationClient};
use interview::InterviewOrchestrator;
use terminal::Console;

pub fn run() -> Result<()> {
    info!("TechHire starting...");
    let config = AppConfig::load()?;
    info!(
        "Generation backend: {} (model {})",
        config.generation.base_url, config.generation.model
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(interview_session(config))
}

async fn interview_session(config: AppConfig) -> Result<()> {
    let store = result_store(config.database.as_ref()).await;
    let backend = Arc::new(OpenAIBackend::new(&config.generation));
    let client = StructuredGenerationClient::new(backend, config.generation.model.clone());
    let orchestrator = InterviewOrchestrator::new(client, store, &config.interview);

    let monitor = orchestrator.monitor();
    let (visibility_tx, visibility_rx) = mpsc::channel(32);
    let listener = monitor.spawn_listener(visibility_rx);

    let mut warnings = monitor.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(warning) = warnings.recv().await {
            println!("🚨 {} (strike {})", warning.message, warning.strike);
        }
    });

    let outcome = terminal::drive(&orchestrator, Console::new(visibility_tx)).await;

    // Dropping the console closed the visibility stream.
    listener.await?;
    printer.abort();

    let session = orchestrator.session();
    info!(
        "Session {} ended in stage {} with {} strike(s)",
        session.session_id, session.stage, session.strikes
    );
    outcome
}

/// Postgres when configured and reachable, otherwise an in-memory store.
async fn result_store(database: Option<&DatabaseConfig>) -> Arc<dyn ResultStore> {
    let Some(database) = database else {
        return Arc::new(MemoryResultStore::new());
    };

    let connected = match PostgresResultStore::connect(database).await {
        Ok(store) => store.ensure_schema().await.map(|()| store),
        Err(e) => Err(e),
    };
    match connected {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("⚠️ Database unavailable ({}); keeping results in memory", e);
            Arc::new(MemoryResultStore::new())
        }
    }
}
