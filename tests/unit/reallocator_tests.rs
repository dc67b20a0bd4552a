/*!
 * Tests for split-duration reallocation
 */

use srtreflow::reallocator::{
    apply_decision, reallocate, reallocate_batch, DecisionText, FormattingDecision,
};

use crate::common;

fn split(chunks: &[&str]) -> DecisionText {
    DecisionText::Split(chunks.iter().map(|c| c.to_string()).collect())
}

/// Test a single-string decision keeps the original timing
#[test]
fn test_apply_decision_withSingleString_shouldKeepTiming() {
    let original = common::entry(5, 1000, 5000, "Original text here");
    let decision = DecisionText::Single("Reflowed\ntext".to_string());

    let (produced, next_id) = apply_decision(&original, &decision, 10);

    assert_eq!(produced.len(), 1);
    assert_eq!(produced[0].id, 10);
    assert_eq!(produced[0].start_time_ms, 1000);
    assert_eq!(produced[0].end_time_ms, 5000);
    assert_eq!(produced[0].text, "Reflowed\ntext");
    assert_eq!(next_id, 11);
}

/// Test the proportional split from the reference scenario:
/// weights 2 and 4 across a 4000 ms span
#[test]
fn test_apply_decision_withTwoChunks_shouldSplitProportionally() {
    let original = common::entry(5, 1000, 5000, "A");
    let decision = split(&["AB", "ABCD"]);

    let (produced, next_id) = apply_decision(&original, &decision, 1);

    assert_eq!(produced.len(), 2);
    // round(4000 * 2 / 6) = 1333
    assert_eq!(produced[0].start_time_ms, 1000);
    assert_eq!(produced[0].end_time_ms, 2333);
    assert_eq!(produced[1].start_time_ms, 2333);
    assert_eq!(produced[1].end_time_ms, 5000);
    assert_eq!(produced[0].id, 1);
    assert_eq!(produced[1].id, 2);
    assert_eq!(next_id, 3);
}

/// Test newlines inside a chunk carry no duration weight
#[test]
fn test_apply_decision_withNewlinesInChunks_shouldIgnoreThemInWeights() {
    let original = common::entry(1, 0, 4000, "ABCDABCD");
    // Both chunks weigh 4 once newlines are stripped
    let decision = split(&["AB\nCD", "XXXX"]);

    let (produced, _) = apply_decision(&original, &decision, 1);

    assert_eq!(produced.len(), 2);
    assert_eq!(produced[0].end_time_ms, 2000);
    assert_eq!(produced[1].start_time_ms, 2000);
    assert_eq!(produced[1].end_time_ms, 4000);
}

/// Duration conservation: emitted spans tile the original span exactly
#[test]
fn test_apply_decision_withManyChunks_shouldTileOriginalSpan() {
    let original = common::entry(2, 730, 9874, "irrelevant");
    let decision = split(&["one", "seventeen chars!!", "mid size", "x", "last chunk here"]);

    let (produced, _) = apply_decision(&original, &decision, 1);

    assert_eq!(produced.len(), 5);
    assert_eq!(produced[0].start_time_ms, original.start_time_ms);
    for pair in produced.windows(2) {
        assert_eq!(pair[0].end_time_ms, pair[1].start_time_ms, "gap or overlap");
        assert!(pair[0].end_time_ms >= pair[0].start_time_ms);
    }
    assert_eq!(produced.last().unwrap().end_time_ms, original.end_time_ms);
}

/// Test a degenerate split with one usable chunk collapses to the single case
#[test]
fn test_apply_decision_withOneUsableChunk_shouldCollapse() {
    let original = common::entry(3, 2000, 6000, "Keep my timing");
    let decision = split(&["", "   ", "Only survivor", "\n"]);

    let (produced, next_id) = apply_decision(&original, &decision, 7);

    assert_eq!(produced.len(), 1);
    assert_eq!(produced[0].start_time_ms, 2000);
    assert_eq!(produced[0].end_time_ms, 6000);
    assert_eq!(produced[0].text, "Only survivor");
    assert_eq!(next_id, 8);
}

/// Test an all-empty split falls back to the original text
#[test]
fn test_apply_decision_withAllEmptyChunks_shouldKeepOriginalText() {
    let original = common::entry(3, 2000, 6000, "Keep me");
    let decision = split(&["", "  ", "\n\n"]);

    let (produced, _) = apply_decision(&original, &decision, 1);

    assert_eq!(produced.len(), 1);
    assert_eq!(produced[0].text, "Keep me");
    assert_eq!(produced[0].start_time_ms, 2000);
    assert_eq!(produced[0].end_time_ms, 6000);
}

/// Test a zero-duration original still splits without panicking
#[test]
fn test_apply_decision_withZeroDuration_shouldEmitZeroLengthSpans() {
    let original = common::entry(1, 3000, 3000, "AB");
    let decision = split(&["A", "B"]);

    let (produced, _) = apply_decision(&original, &decision, 1);

    assert_eq!(produced.len(), 2);
    assert_eq!(produced[0].start_time_ms, 3000);
    assert_eq!(produced[0].end_time_ms, 3000);
    assert_eq!(produced[1].start_time_ms, 3000);
    assert_eq!(produced[1].end_time_ms, 3000);
}

/// Test batch reallocation threads the id counter across entries
#[test]
fn test_reallocate_batch_withSplitAndSingle_shouldThreadIds() {
    let entries = vec![
        common::entry(10, 0, 3000, "Split me"),
        common::entry(20, 3000, 6000, "Leave me"),
    ];
    let decisions = vec![
        FormattingDecision {
            id: 10,
            text: split(&["Split", "me"]),
        },
        FormattingDecision {
            id: 20,
            text: DecisionText::Single("Left alone".to_string()),
        },
    ];

    let (produced, next_id) = reallocate_batch(&entries, &decisions, 1);

    assert_eq!(produced.len(), 3);
    let ids: Vec<u64> = produced.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(next_id, 4);
    assert_eq!(produced[2].text, "Left alone");
}

/// Test decisions referencing unknown ids are dropped, not fatal
#[test]
fn test_reallocate_withUnknownDecisionId_shouldDropIt() {
    let entries = vec![
        common::entry(1, 0, 2000, "First"),
        common::entry(2, 2000, 4000, "Second"),
    ];
    let decisions = vec![
        FormattingDecision {
            id: 99,
            text: DecisionText::Single("Hallucinated".to_string()),
        },
        FormattingDecision {
            id: 2,
            text: DecisionText::Single("Second, reflowed".to_string()),
        },
    ];

    let produced = reallocate(&entries, &decisions);

    assert_eq!(produced.len(), 2);
    // Entry 1 had no decision and passes through with its original text
    assert_eq!(produced[0].text, "First");
    assert_eq!(produced[0].start_time_ms, 0);
    assert_eq!(produced[1].text, "Second, reflowed");
    assert_eq!(produced[0].id, 1);
    assert_eq!(produced[1].id, 2);
}

/// Monotonic ids: emission order ids are strictly increasing regardless of
/// source numbering
#[test]
fn test_reallocate_withShuffledSourceIds_shouldEmitMonotonicIds() {
    let entries = vec![
        common::entry(42, 0, 2000, "AA"),
        common::entry(7, 2000, 4000, "BB"),
        common::entry(1000, 4000, 8000, "CC DD"),
    ];
    let decisions = vec![FormattingDecision {
        id: 1000,
        text: split(&["CC", "DD"]),
    }];

    let produced = reallocate(&entries, &decisions);

    assert_eq!(produced.len(), 4);
    let ids: Vec<u64> = produced.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
}
