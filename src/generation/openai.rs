use std::time::Duration;

use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ExpectedShape, GenerationBackend, GenerationError, GenerationRequest, Result};
use crate::config::GenerationConfig;

const SYSTEM_PROMPT: &str = "You are the assessment engine of a proctored technical hiring \
platform. Follow the instructions exactly and never add commentary outside the requested output.";

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f64,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Backend for any OpenAI-compatible `/chat/completions` endpoint. Structured
/// shapes are requested through `response_format = json_schema`.
#[derive(Clone)]
pub struct OpenAIBackend {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    temperature: f64,
}

impl OpenAIBackend {
    pub fn new(config: &GenerationConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
        }
    }

    fn response_format(shape: &ExpectedShape) -> Option<Value> {
        match shape {
            ExpectedShape::FreeText => None,
            ExpectedShape::Json { name, schema } => Some(json!({
                "type": "json_schema",
                "json_schema": {
                    "name": name,
                    "schema": schema,
                    "strict": false,
                }
            })),
        }
    }

    fn build_request(&self, request: &GenerationRequest) -> OpenAIRequest {
        let user_prompt = match request.shape {
            ExpectedShape::FreeText => request.prompt.clone(),
            ExpectedShape::Json { .. } => format!(
                "{}\n\nRespond with a single JSON document and nothing else.",
                request.prompt
            ),
        };

        OpenAIRequest {
            model: request.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: Some(SYSTEM_PROMPT.to_string()),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: Some(user_prompt),
                },
            ],
            temperature: self.temperature,
            stream: false,
            response_format: Self::response_format(&request.shape),
        }
    }
}

#[async_trait]
impl GenerationBackend for OpenAIBackend {
    async fn complete(&self, request: &GenerationRequest) -> Result<String> {
        let body = self.build_request(request);

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Generation backend error: HTTP {}: {}", status, error_text);
            return Err(GenerationError::BackendUnavailable(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let completion: OpenAIResponse = response.json().await.map_err(|e| {
            GenerationError::BackendUnavailable(format!("malformed completion envelope: {}", e))
        })?;

        if let Some(usage) = &completion.usage {
            info!(
                "Token usage - Prompt: {}, Completion: {}, Total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::BackendUnavailable("no completion choices".to_string()))
    }
}
