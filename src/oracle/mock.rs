/*!
 * Mock oracle implementations for testing.
 *
 * This module provides a mock oracle that simulates different behaviors:
 * - `MockOracle::echo()` - Answers every entry with its own text unchanged
 * - `MockOracle::scripted(...)` - Replays canned responses in order
 * - `MockOracle::malformed()` - Answers with undecodable prose
 * - `MockOracle::unavailable()` / `quota_exceeded()` / `invalid_credential()`
 *   - Always fail with the matching error
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::OracleError;
use crate::oracle::{Oracle, ReformatRequest};

/// Behavior mode for the mock oracle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Every entry keeps its own text (identity decisions)
    Echo,
    /// Replays scripted responses in request order
    Scripted,
    /// Returns prose that is not valid decision JSON
    Malformed,
    /// Returns an empty response body
    Empty,
    /// Always fails as unreachable
    Unavailable,
    /// Always fails with a quota error
    QuotaExceeded,
    /// Always fails with a credential error
    InvalidCredential,
}

/// Mock oracle for testing reflow behavior without a live provider
#[derive(Debug)]
pub struct MockOracle {
    /// Behavior mode
    behavior: MockBehavior,
    /// Canned responses for `Scripted` mode
    scripted: Vec<String>,
    /// Wrap successful responses in Markdown code fences
    fenced: bool,
    /// Request counter
    request_count: Arc<AtomicUsize>,
}

impl MockOracle {
    /// Create a new mock oracle with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            scripted: Vec::new(),
            fenced: false,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock that answers every entry with its own text
    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    /// Create a mock that replays canned responses in order
    pub fn scripted(responses: Vec<String>) -> Self {
        Self {
            scripted: responses,
            ..Self::new(MockBehavior::Scripted)
        }
    }

    /// Create a mock that returns undecodable prose
    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    /// Create a mock that returns an empty response
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that always fails as unreachable
    pub fn unavailable() -> Self {
        Self::new(MockBehavior::Unavailable)
    }

    /// Create a mock that always fails with a quota error
    pub fn quota_exceeded() -> Self {
        Self::new(MockBehavior::QuotaExceeded)
    }

    /// Create a mock that always fails with a credential error
    pub fn invalid_credential() -> Self {
        Self::new(MockBehavior::InvalidCredential)
    }

    /// Wrap successful responses in ```json fences, as chatty LLMs do
    pub fn with_fences(mut self) -> Self {
        self.fenced = true;
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Build identity decisions from the request payload
    fn echo_response(payload: &str) -> Result<String, OracleError> {
        let entries: Value = serde_json::from_str(payload)
            .map_err(|e| OracleError::MalformedResponse(format!("bad mock payload: {}", e)))?;
        // Identity: the payload already has the `[{id, text}]` shape
        Ok(entries.to_string())
    }

    fn decorate(&self, response: String) -> String {
        if self.fenced {
            format!("```json\n{}\n```", response)
        } else {
            response
        }
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn complete(&self, request: &ReformatRequest) -> Result<String, OracleError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Echo => Ok(self.decorate(Self::echo_response(&request.payload)?)),
            MockBehavior::Scripted => {
                let response = self
                    .scripted
                    .get(count)
                    .or_else(|| self.scripted.last())
                    .cloned()
                    .unwrap_or_default();
                Ok(self.decorate(response))
            }
            MockBehavior::Malformed => {
                Ok("Sure! Here is the reformatted file you asked for.".to_string())
            }
            MockBehavior::Empty => Ok(String::new()),
            MockBehavior::Unavailable => Err(OracleError::Unavailable(
                "mock oracle is down".to_string(),
            )),
            MockBehavior::QuotaExceeded => Err(OracleError::QuotaExceeded(
                "mock quota exhausted".to_string(),
            )),
            MockBehavior::InvalidCredential => Err(OracleError::InvalidCredential(
                "mock key rejected".to_string(),
            )),
        }
    }

    async fn test_connection(&self) -> Result<(), OracleError> {
        match self.behavior {
            MockBehavior::Unavailable => {
                Err(OracleError::Unavailable("mock oracle is down".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "Mock"
    }
}
