use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use log::{error, info};
use tokio_postgres::NoTls;

use super::{PersistenceError, Result, ResultRecord, ResultStore};
use crate::config::DatabaseConfig;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS interview_results (
        id BIGSERIAL PRIMARY KEY,
        candidate_name TEXT NOT NULL,
        round TEXT NOT NULL,
        score DOUBLE PRECISION NOT NULL,
        passed BOOLEAN NOT NULL,
        timestamp TIMESTAMPTZ NOT NULL
    )
"#;

#[derive(Debug)]
pub struct PostgresResultStore {
    pool: Pool,
}

impl PostgresResultStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database: {}", config.describe());

        let mut cfg = Config::new();
        cfg.url = Some(config.url());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| {
                PersistenceError::ConnectionFailed(format!("Pool creation failed: {}", e))
            })?;

        // Test connection
        let _client = pool
            .get()
            .await
            .map_err(|e| {
                PersistenceError::ConnectionFailed(format!("Connection test failed: {}", e))
            })?;

        info!("Database connection established successfully");
        Ok(Self { pool })
    }

    /// Create `interview_results` if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| PersistenceError::ConnectionFailed(e.to_string()))?;

        client.batch_execute(CREATE_TABLE).await.map_err(|e| {
            error!("Failed to create interview_results: {}", e);
            PersistenceError::QueryFailed(e.to_string())
        })?;
        Ok(())
    }
}

#[async_trait]
impl ResultStore for PostgresResultStore {
    async fn append(&self, record: &ResultRecord) -> Result<()> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| PersistenceError::ConnectionFailed(e.to_string()))?;

        client
            .execute(
                r#"
                INSERT INTO interview_results (candidate_name, round, score, passed, timestamp)
                VALUES ($1, $2, $3, $4, $5)
                "#,
                &[
                    &record.candidate_name,
                    &record.round,
                    &record.score,
                    &record.passed,
                    &record.timestamp,
                ],
            )
            .await
            .map_err(|e| {
                error!("Failed to store result for {}: {}", record.candidate_name, e);
                PersistenceError::QueryFailed(e.to_string())
            })?;

        info!(
            "💾 Stored {} result for {} (score {}, passed={})",
            record.round, record.candidate_name, record.score, record.passed
        );
        Ok(())
    }
}
