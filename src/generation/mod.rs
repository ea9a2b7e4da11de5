pub mod client;
pub mod contract;
pub mod openai;

pub use client::StructuredGenerationClient;
pub use contract::{decode, extract_json, Contract};
pub use openai::OpenAIBackend;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Failure of a single generation call. Both variants are recoverable: the
/// caller decides whether to retry, degrade or abort the round.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("model output does not match `{shape}`: {reason}")]
    SchemaViolation { shape: String, reason: String },
    #[error("generation backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl GenerationError {
    pub fn schema(shape: impl Into<String>, reason: impl Into<String>) -> Self {
        GenerationError::SchemaViolation {
            shape: shape.into(),
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationError::BackendUnavailable(format!("request timed out: {}", err))
        } else {
            GenerationError::BackendUnavailable(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;

/// What the backend is asked to return.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedShape {
    /// Free-form text, used for HR turns only.
    FreeText,
    /// A JSON document conforming to `schema`.
    Json { name: &'static str, schema: Value },
}

impl ExpectedShape {
    pub fn of<T: Contract>() -> Self {
        ExpectedShape::Json {
            name: T::NAME,
            schema: contract::schema_value::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExpectedShape::FreeText => "text",
            ExpectedShape::Json { name, .. } => name,
        }
    }
}

/// The (model, prompt, expected shape) triple handed to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub shape: ExpectedShape,
}

/// A text-generation provider. Implementations only move bytes: they return the
/// raw completion text and classify transport, auth and quota failures as
/// `BackendUnavailable`. Shape checking happens in the client.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn complete(&self, request: &GenerationRequest) -> Result<String>;
}
