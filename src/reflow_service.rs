/*!
 * Batch reflow service.
 *
 * Splits caption entries into oracle-sized batches, sends one reformatting
 * request per batch, decodes the oracle's decisions, and reallocates the
 * batch through the split-duration reallocator with the id counter threaded
 * across batches. Batches are processed sequentially; a failed oracle call
 * fails the whole run and is never partially applied.
 */

use log::{debug, error, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::app_config::Config;
use crate::caption::CaptionEntry;
use crate::errors::{OracleError, ReflowError};
use crate::oracle::{self, Oracle, ReformatRequest};
use crate::reallocator::{self, DecisionText, FormattingDecision};

// @const: Blank lines inside oracle text (blank lines terminate SRT blocks)
static EMBEDDED_BLANK_LINES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n[ \t]*\n+").unwrap()
});

/// Entry shape sent to the oracle: id and text only, timing stays local
#[derive(Debug, Serialize)]
struct OracleEntry<'a> {
    id: u64,
    text: &'a str,
}

/// Service wiring an oracle client to the reallocation machinery
pub struct ReflowService {
    /// Oracle client
    oracle: Box<dyn Oracle>,
    /// Application configuration
    config: Config,
}

impl ReflowService {
    /// Create a service with the provider configured in `config`
    pub fn new(config: Config) -> Self {
        let oracle = oracle::from_config(&config.oracle);
        Self { oracle, config }
    }

    /// Create a service with an explicit oracle, used by tests
    pub fn with_oracle(oracle: Box<dyn Oracle>, config: Config) -> Self {
        Self { oracle, config }
    }

    /// Check that the configured oracle is reachable
    pub async fn test_connection(&self) -> Result<(), OracleError> {
        self.oracle.test_connection().await
    }

    /// Reflow a whole file's entries through the oracle.
    ///
    /// Ids in the result are freshly assigned, strictly increasing across
    /// the entire output regardless of the source numbering.
    pub async fn reflow(&self, entries: &[CaptionEntry]) -> Result<Vec<CaptionEntry>, ReflowError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let batches = split_into_batches(entries, self.config.oracle.get_max_chars_per_request());
        let delay_ms = self.config.oracle.common.rate_limit_delay_ms;
        let system_prompt = self.build_system_prompt();

        let mut reflowed = Vec::with_capacity(entries.len());
        let mut next_id: u64 = 1;

        for (i, batch) in batches.iter().enumerate() {
            if i > 0 && delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            }

            debug!(
                "Sending batch {}/{} ({} entries) to {}",
                i + 1,
                batches.len(),
                batch.len(),
                self.oracle.name()
            );

            let request = ReformatRequest {
                system_prompt: system_prompt.clone(),
                payload: build_payload(batch)?,
                temperature: self.config.oracle.common.temperature,
            };

            let response = self.oracle.complete(&request).await.map_err(|e| {
                error!("Oracle call failed on batch {}/{}: {}", i + 1, batches.len(), e);
                e
            })?;

            let decisions = parse_decisions(&response)?;
            let (mut produced, id_after) = reallocator::reallocate_batch(batch, &decisions, next_id);
            next_id = id_after;
            reflowed.append(&mut produced);
        }

        Ok(reflowed)
    }

    /// Render the system prompt template with the display constraints
    fn build_system_prompt(&self) -> String {
        self.config
            .oracle
            .common
            .system_prompt
            .replace("{max_line_chars}", &self.config.reflow.max_line_chars.to_string())
            .replace(
                "{max_lines_per_caption}",
                &self.config.reflow.max_lines_per_caption.to_string(),
            )
    }
}

/// Serialize one batch as the oracle's `[{id, text}]` payload
pub fn build_payload(batch: &[CaptionEntry]) -> Result<String, ReflowError> {
    let entries: Vec<OracleEntry> = batch
        .iter()
        .map(|e| OracleEntry {
            id: e.id,
            text: &e.text,
        })
        .collect();

    serde_json::to_string(&entries)
        .map_err(|e| ReflowError::Request(format!("could not encode oracle payload: {}", e)))
}

/// Split entries into batches that fit the per-request character budget.
///
/// Entries are never dropped or reordered: an entry larger than the budget
/// gets a batch of its own, and a hard cap on entries per batch keeps the
/// oracle from silently dropping lines out of oversized arrays.
pub fn split_into_batches(entries: &[CaptionEntry], max_chars: usize) -> Vec<Vec<CaptionEntry>> {
    if entries.is_empty() {
        warn!("No caption entries to split into batches");
        return Vec::new();
    }

    let total_entries = entries.len();

    // Guard against unreasonably small budgets
    let effective_max_chars = max_chars.max(100);
    let max_entries_per_batch = 40;

    let mut batches = Vec::new();
    let mut current_batch: Vec<CaptionEntry> = Vec::with_capacity(max_entries_per_batch);
    let mut current_size = 0;

    for entry in entries {
        let entry_size = entry.text.len();

        // An entry exceeding the budget gets its own batch
        if entry_size > effective_max_chars {
            if !current_batch.is_empty() {
                batches.push(std::mem::take(&mut current_batch));
                current_size = 0;
            }
            debug!(
                "Entry {} is oversized ({} chars), placing in its own batch",
                entry.id, entry_size
            );
            batches.push(vec![entry.clone()]);
            continue;
        }

        if (current_size + entry_size > effective_max_chars
            || current_batch.len() >= max_entries_per_batch)
            && !current_batch.is_empty()
        {
            batches.push(std::mem::take(&mut current_batch));
            current_size = 0;
        }

        current_batch.push(entry.clone());
        current_size += entry_size;
    }

    if !current_batch.is_empty() {
        batches.push(current_batch);
    }

    let total_batched: usize = batches.iter().map(|b| b.len()).sum();
    if total_batched != total_entries {
        error!(
            "Lost entries during batching! Original: {}, After batching: {}",
            total_entries, total_batched
        );
    }

    batches
}

/// Decode the oracle's reply into formatting decisions.
///
/// Tolerates Markdown code fences around the JSON array; anything that still
/// fails to decode is a `MalformedResponse` for the whole batch. Decision
/// text is sanitized so no embedded blank line can terminate an SRT block
/// early on serialization.
pub fn parse_decisions(response: &str) -> Result<Vec<FormattingDecision>, OracleError> {
    let body = strip_code_fences(response);

    let decisions: Vec<FormattingDecision> = serde_json::from_str(body).map_err(|e| {
        OracleError::MalformedResponse(format!("could not decode oracle decisions: {}", e))
    })?;

    Ok(decisions.into_iter().map(sanitize_decision).collect())
}

/// Strip a surrounding Markdown code fence (with optional language tag)
fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line, if any
    match rest.split_once('\n') {
        Some((_, body)) => body.trim(),
        None => rest.trim(),
    }
}

/// Normalize decision text: CRLF to LF, collapse embedded blank lines
fn sanitize_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    EMBEDDED_BLANK_LINES
        .replace_all(&normalized, "\n")
        .trim_matches('\n')
        .to_string()
}

fn sanitize_decision(decision: FormattingDecision) -> FormattingDecision {
    let text = match decision.text {
        DecisionText::Single(text) => DecisionText::Single(sanitize_text(&text)),
        DecisionText::Split(chunks) => {
            DecisionText::Split(chunks.iter().map(|c| sanitize_text(c)).collect())
        }
    };
    FormattingDecision {
        id: decision.id,
        text,
    }
}
