pub mod memory;
pub mod models;
pub mod postgres;

pub use memory::MemoryResultStore;
pub use models::ResultRecord;
pub use postgres::PostgresResultStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Durable sink for final interview outcomes. Appends are fire-and-forget from
/// the interview's point of view: a failure is reported but never undoes the
/// report it describes.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn append(&self, record: &ResultRecord) -> Result<()>;
}
