/*!
 * Oracle client implementations for the reformatting service.
 *
 * This module contains client implementations for the LLM providers that
 * act as the external reformatting oracle:
 * - Ollama: Local LLM server
 * - OpenAI: OpenAI API integration
 * - Anthropic: Anthropic API integration
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::app_config::{OracleConfig, OracleProvider};
use crate::errors::OracleError;

/// One reformatting request: a system prompt carrying the display
/// constraints and a JSON payload of caption entries.
#[derive(Debug, Clone)]
pub struct ReformatRequest {
    /// System prompt with the formatting constraints baked in
    pub system_prompt: String,

    /// JSON array of `{id, text}` objects for one batch
    pub payload: String,

    /// Temperature for generation
    pub temperature: f32,
}

/// Common trait for all oracle providers
///
/// One request per batch, awaited to completion; no streaming, no retries.
#[async_trait]
pub trait Oracle: Send + Sync + Debug {
    /// Send one reformatting request and return the raw text reply
    async fn complete(&self, request: &ReformatRequest) -> Result<String, OracleError>;

    /// Test the connection to the oracle
    async fn test_connection(&self) -> Result<(), OracleError>;

    /// Human-readable provider name for logging
    fn name(&self) -> &str;
}

/// Build the configured oracle client
pub fn from_config(config: &OracleConfig) -> Box<dyn Oracle> {
    let model = config.get_model();
    let endpoint = config.get_endpoint();
    let timeout_secs = config.get_timeout_secs();

    match config.provider {
        OracleProvider::Ollama => {
            Box::new(ollama::Ollama::new(endpoint, model, timeout_secs))
        }
        OracleProvider::OpenAI => Box::new(openai::OpenAI::new(
            config.get_api_key(),
            endpoint,
            model,
            timeout_secs,
        )),
        OracleProvider::Anthropic => Box::new(anthropic::Anthropic::new(
            config.get_api_key(),
            endpoint,
            model,
            timeout_secs,
        )),
    }
}

/// Map an HTTP error status to the oracle error taxonomy
pub(crate) fn error_for_status(status_code: u16, message: String) -> OracleError {
    match status_code {
        401 | 403 => OracleError::InvalidCredential(message),
        429 => OracleError::QuotaExceeded(message),
        _ => OracleError::ApiError {
            status_code,
            message,
        },
    }
}

/// Map a transport-level failure (connect, DNS, timeout) to the taxonomy
pub(crate) fn error_for_transport(error: reqwest::Error) -> OracleError {
    OracleError::Unavailable(error.to_string())
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;
