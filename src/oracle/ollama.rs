use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::OracleError;
use crate::oracle::{error_for_status, error_for_transport, Oracle, ReformatRequest};

/// Ollama client for interacting with a local Ollama server
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model name
    model: String,
}

/// Chat message object
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    role: String,
    /// Content of the message
    content: String,
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize)]
struct ChatRequest {
    /// Model name to use for generation
    model: String,
    /// Messages of the conversation
    messages: Vec<ChatMessage>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize)]
struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Chat response from the Ollama API
#[derive(Debug, Deserialize)]
struct ChatResponse {
    /// Generated message
    message: ChatMessage,
}

/// Version response, used for connection checks
#[derive(Debug, Deserialize)]
struct VersionResponse {
    /// Server version string
    #[allow(dead_code)]
    version: String,
}

impl Ollama {
    /// Create a new Ollama client
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            model: model.into(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, OracleError> {
        let response = self
            .client
            .post(self.api_url("/api/chat"))
            .json(&request)
            .send()
            .await
            .map_err(error_for_transport)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(error_for_status(status.as_u16(), error_text));
        }

        let chat_response = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| OracleError::MalformedResponse(e.to_string()))?;

        Ok(chat_response.message.content)
    }
}

#[async_trait]
impl Oracle for Ollama {
    async fn complete(&self, request: &ReformatRequest) -> Result<String, OracleError> {
        let api_request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.payload.clone(),
                },
            ],
            options: Some(GenerationOptions {
                temperature: Some(request.temperature),
            }),
            stream: false,
        };

        self.chat(api_request).await
    }

    async fn test_connection(&self) -> Result<(), OracleError> {
        let response = self
            .client
            .get(self.api_url("/api/version"))
            .send()
            .await
            .map_err(error_for_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_for_status(
                status.as_u16(),
                "version endpoint unavailable".to_string(),
            ));
        }

        response
            .json::<VersionResponse>()
            .await
            .map_err(|e| OracleError::MalformedResponse(e.to_string()))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "Ollama"
    }
}
