/*!
 * Split-duration reallocation.
 *
 * Converts oracle formatting decisions back into valid caption entries.
 * A decision either replaces an entry's text in place or splits it into
 * several sequential captions; in the split case the original time span is
 * redistributed proportionally to each chunk's visible character count, and
 * the last chunk always ends exactly at the original end time so the union
 * of the emitted spans tiles the original span regardless of rounding drift.
 *
 * The whole module is a pure, stateless transform: the sequential id
 * counter is threaded explicitly by the caller across the batch.
 */

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::Deserialize;

use crate::caption::CaptionEntry;

/// Text part of an oracle decision: a single reflowed string (possibly with
/// internal line breaks) or an ordered split into multiple captions.
///
/// Matches the oracle wire shape `string | [string]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DecisionText {
    /// One reflowed caption, timing untouched
    Single(String),
    /// Split into sequential captions, durations redistributed
    Split(Vec<String>),
}

/// One oracle decision, keyed by the originating entry's id
#[derive(Debug, Clone, Deserialize)]
pub struct FormattingDecision {
    /// Id of the original entry this decision applies to
    pub id: u64,

    /// Replacement text
    pub text: DecisionText,
}

/// Weight of a chunk: character count with newlines removed. Newlines are
/// formatting markers, not content, and must not count toward duration.
fn chunk_weight(chunk: &str) -> u64 {
    chunk.chars().filter(|&c| c != '\n' && c != '\r').count() as u64
}

/// Emit a single replacement entry with the original timing
fn single_entry(
    original: &CaptionEntry,
    text: String,
    next_id: u64,
) -> (Vec<CaptionEntry>, u64) {
    let entry = CaptionEntry::new(
        next_id,
        original.start_time_ms,
        original.end_time_ms,
        text,
    );
    (vec![entry], next_id + 1)
}

/// Apply one formatting decision to one original entry.
///
/// Returns the replacement entries (ids assigned sequentially starting at
/// `next_id`) and the next free id. For a split of N chunks the emitted
/// spans exactly partition `[original.start_time_ms, original.end_time_ms]`.
pub fn apply_decision(
    original: &CaptionEntry,
    decision: &DecisionText,
    mut next_id: u64,
) -> (Vec<CaptionEntry>, u64) {
    let chunks = match decision {
        DecisionText::Single(text) => {
            return single_entry(original, text.clone(), next_id);
        }
        DecisionText::Split(chunks) => chunks,
    };

    // Empty and whitespace-only chunks carry no content
    let surviving: Vec<&str> = chunks
        .iter()
        .map(String::as_str)
        .filter(|c| !c.trim().is_empty())
        .collect();

    if surviving.len() < 2 {
        // Degenerate split from the oracle, collapse to the single case
        warn!(
            "Degenerate split for entry {} ({} usable of {} chunks), keeping original timing",
            original.id,
            surviving.len(),
            chunks.len()
        );
        let text = if surviving.is_empty() {
            original.text.clone()
        } else {
            surviving
                .iter()
                .map(|c| c.trim())
                .collect::<Vec<_>>()
                .join(" ")
        };
        return single_entry(original, text, next_id);
    }

    let weights: Vec<u64> = surviving.iter().map(|c| chunk_weight(c)).collect();
    let total_weight: u64 = weights.iter().sum();
    let total_duration = original.duration_ms();
    let chunk_count = surviving.len() as u64;

    let mut produced = Vec::with_capacity(surviving.len());
    let mut cursor = original.start_time_ms;
    let last_index = surviving.len() - 1;

    for (i, chunk) in surviving.iter().enumerate() {
        let end_time_ms = if i == last_index {
            // The last chunk absorbs all rounding drift so the union of
            // spans always ends exactly at the original end time
            original.end_time_ms
        } else if total_weight > 0 && total_duration > 0 {
            let share = (total_duration * weights[i] + total_weight / 2) / total_weight;
            // Accumulated round-up drift must never push past the span end
            (cursor + share).min(original.end_time_ms)
        } else {
            // Degenerate original (no content weight or zero duration)
            cursor + total_duration / chunk_count
        };

        produced.push(CaptionEntry::new(next_id, cursor, end_time_ms, (*chunk).to_string()));
        next_id += 1;
        cursor = end_time_ms;
    }

    (produced, next_id)
}

/// Reallocate a whole batch of entries against the oracle's decisions,
/// threading the sequential id counter across entries.
///
/// Decisions referencing an id absent from `entries` are dropped with a
/// warning; entries without a decision pass through with their original
/// text and timing but a fresh id, so one bad oracle answer never discards
/// the batch. Emitted ids are strictly increasing in emission order.
pub fn reallocate_batch(
    entries: &[CaptionEntry],
    decisions: &[FormattingDecision],
    mut next_id: u64,
) -> (Vec<CaptionEntry>, u64) {
    let known_ids: HashSet<u64> = entries.iter().map(|e| e.id).collect();

    let mut by_id: HashMap<u64, &DecisionText> = HashMap::new();
    for decision in decisions {
        if !known_ids.contains(&decision.id) {
            warn!(
                "Dropping oracle decision for unknown entry id {}",
                decision.id
            );
            continue;
        }
        if by_id.insert(decision.id, &decision.text).is_some() {
            warn!(
                "Duplicate oracle decision for entry id {}, keeping the last one",
                decision.id
            );
        }
    }

    let mut reallocated = Vec::with_capacity(entries.len());
    for entry in entries {
        match by_id.get(&entry.id) {
            Some(decision) => {
                let (mut produced, id_after) = apply_decision(entry, decision, next_id);
                next_id = id_after;
                reallocated.append(&mut produced);
            }
            None => {
                debug!("No oracle decision for entry {}, passing through", entry.id);
                reallocated.push(CaptionEntry::new(
                    next_id,
                    entry.start_time_ms,
                    entry.end_time_ms,
                    entry.text.clone(),
                ));
                next_id += 1;
            }
        }
    }

    (reallocated, next_id)
}

/// Reallocate with the id counter starting at 1
pub fn reallocate(
    entries: &[CaptionEntry],
    decisions: &[FormattingDecision],
) -> Vec<CaptionEntry> {
    reallocate_batch(entries, decisions, 1).0
}
