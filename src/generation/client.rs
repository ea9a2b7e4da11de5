use std::sync::Arc;

use log::{debug, info, warn};

use super::contract::{decode, Contract};
use super::{ExpectedShape, GenerationBackend, GenerationError, GenerationRequest, Result};

/// Issues one request per call to a single configured backend and validates the
/// reply at the boundary. No retries and no caching: identical prompts always go
/// back to the model.
#[derive(Clone)]
pub struct StructuredGenerationClient {
    backend: Arc<dyn GenerationBackend>,
    model: String,
}

impl StructuredGenerationClient {
    pub fn new(backend: Arc<dyn GenerationBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Request a structured result of shape `T`.
    pub async fn generate<T: Contract>(&self, prompt: impl Into<String>) -> Result<T> {
        let request = self.request(prompt.into(), ExpectedShape::of::<T>());
        let raw = self.send(&request).await?;

        decode::<T>(&raw).map_err(|err| {
            warn!("⚠️ {} reply rejected: {}", T::NAME, err);
            err
        })
    }

    /// Request free-form text. An empty reply is a schema violation.
    pub async fn generate_text(&self, prompt: impl Into<String>) -> Result<String> {
        let request = self.request(prompt.into(), ExpectedShape::FreeText);
        let raw = self.send(&request).await?;

        let text = raw.trim();
        if text.is_empty() {
            warn!("⚠️ Empty text reply from {}", self.model);
            return Err(GenerationError::schema("text", "empty reply"));
        }
        Ok(text.to_string())
    }

    fn request(&self, prompt: String, shape: ExpectedShape) -> GenerationRequest {
        GenerationRequest {
            model: self.model.clone(),
            prompt,
            shape,
        }
    }

    async fn send(&self, request: &GenerationRequest) -> Result<String> {
        info!(
            "🤖 Generation call: model={} shape={}",
            request.model,
            request.shape.name()
        );

        let raw = self.backend.complete(request).await.map_err(|err| {
            warn!("❌ Generation call for {} failed: {}", request.shape.name(), err);
            err
        })?;

        debug!("Received {} bytes for {}", raw.len(), request.shape.name());
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use schemars::JsonSchema;
    use serde::Deserialize;

    struct Canned {
        reply: Result<String>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl Canned {
        fn new(reply: Result<String>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl GenerationBackend for Canned {
        async fn complete(&self, request: &GenerationRequest) -> Result<String> {
            self.seen.lock().push(request.clone());
            self.reply.clone()
        }
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    struct Greeting {
        text: String,
    }

    impl Contract for Greeting {
        const NAME: &'static str = "Greeting";

        fn conformance(&self) -> std::result::Result<(), String> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_generate_sends_shape_and_decodes() {
        let backend = Canned::new(Ok(r#"{"text":"hi"}"#.to_string()));
        let client = StructuredGenerationClient::new(backend.clone(), "test-model");

        let greeting: Greeting = client.generate("say hi").await.unwrap();
        assert_eq!(greeting.text, "hi");

        let seen = backend.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "test-model");
        assert_eq!(seen[0].prompt, "say hi");
        assert_eq!(seen[0].shape.name(), "Greeting");
    }

    #[tokio::test]
    async fn test_identical_requests_are_not_deduplicated() {
        let backend = Canned::new(Ok(r#"{"text":"hi"}"#.to_string()));
        let client = StructuredGenerationClient::new(backend.clone(), "test-model");

        for _ in 0..3 {
            let _: Greeting = client.generate("same prompt").await.unwrap();
        }
        assert_eq!(backend.seen.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_backend_failure_passes_through_without_retry() {
        let backend = Canned::new(Err(GenerationError::BackendUnavailable("quota".into())));
        let client = StructuredGenerationClient::new(backend.clone(), "test-model");

        let err = client.generate::<Greeting>("x").await.unwrap_err();
        assert_eq!(err, GenerationError::BackendUnavailable("quota".into()));
        assert_eq!(backend.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_generate_text_rejects_blank_reply() {
        let client = StructuredGenerationClient::new(Canned::new(Ok("  \n".into())), "m");
        let err = client.generate_text("x").await.unwrap_err();
        assert_eq!(err, GenerationError::schema("text", "empty reply"));

        let client =
            StructuredGenerationClient::new(Canned::new(Ok(" Tell me more. ".into())), "m");
        assert_eq!(client.generate_text("x").await.unwrap(), "Tell me more.");
    }
}
