/*!
 * Tests for batching, oracle wiring and decision decoding
 */

use anyhow::Result;

use srtreflow::app_config::Config;
use srtreflow::errors::{OracleError, ReflowError};
use srtreflow::oracle::mock::MockOracle;
use srtreflow::reallocator::DecisionText;
use srtreflow::reflow_service::{build_payload, parse_decisions, split_into_batches, ReflowService};

use crate::common;

fn quiet_config() -> Config {
    let mut config = Config::default();
    // No artificial delay between batches in tests
    config.oracle.common.rate_limit_delay_ms = 0;
    config
}

/// Test decoding a plain JSON decision array
#[test]
fn test_parse_decisions_withPlainJson_shouldDecode() -> Result<()> {
    let response = r#"[{"id":1,"text":"reflowed"},{"id":2,"text":["part one","part two"]}]"#;

    let decisions = parse_decisions(response)?;

    assert_eq!(decisions.len(), 2);
    assert_eq!(decisions[0].id, 1);
    assert_eq!(decisions[0].text, DecisionText::Single("reflowed".to_string()));
    assert_eq!(
        decisions[1].text,
        DecisionText::Split(vec!["part one".to_string(), "part two".to_string()])
    );

    Ok(())
}

/// Test Markdown code fences around the JSON are tolerated
#[test]
fn test_parse_decisions_withCodeFences_shouldDecode() -> Result<()> {
    let fenced = "```json\n[{\"id\":3,\"text\":\"ok\"}]\n```";
    let decisions = parse_decisions(fenced)?;
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].id, 3);

    let bare_fence = "```\n[{\"id\":4,\"text\":\"ok\"}]\n```";
    let decisions = parse_decisions(bare_fence)?;
    assert_eq!(decisions[0].id, 4);

    Ok(())
}

/// Test undecodable responses fail as MalformedResponse
#[test]
fn test_parse_decisions_withProse_shouldFailMalformed() {
    let result = parse_decisions("Sure, here are your captions!");
    assert!(matches!(result, Err(OracleError::MalformedResponse(_))));

    let result = parse_decisions("");
    assert!(matches!(result, Err(OracleError::MalformedResponse(_))));
}

/// Test embedded blank lines in decision text are collapsed
#[test]
fn test_parse_decisions_withEmbeddedBlankLines_shouldSanitize() -> Result<()> {
    let response = r#"[{"id":1,"text":"line one\n\n\nline two"}]"#;

    let decisions = parse_decisions(response)?;

    assert_eq!(
        decisions[0].text,
        DecisionText::Single("line one\nline two".to_string())
    );

    Ok(())
}

/// Test the outbound payload is a JSON array of id/text pairs
#[test]
fn test_build_payload_withEntries_shouldEncodeJsonArray() -> Result<()> {
    let entries = vec![
        common::entry(7, 0, 1000, "Hi\nthere"),
        common::entry(8, 1000, 2000, "Bye"),
    ];

    let payload = build_payload(&entries)?;

    assert_eq!(
        payload,
        r#"[{"id":7,"text":"Hi\nthere"},{"id":8,"text":"Bye"}]"#
    );

    Ok(())
}

/// Test batching respects the character budget without losing entries
#[test]
fn test_split_into_batches_withVaryingLengths_shouldSplitCorrectly() {
    let entries = vec![
        common::entry(1, 0, 5000, "Short entry"),
        common::entry(2, 5500, 10000, "Medium length entry with some text"),
        common::entry(
            3,
            10500,
            15000,
            "A longer entry that should take more space in the chunk calculation",
        ),
    ];

    // The budget is clamped to a minimum of 100 chars
    let batches = split_into_batches(&entries, 50);

    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].len(), 2);
    assert_eq!(batches[1].len(), 1);

    let total: usize = batches.iter().map(|b| b.len()).sum();
    assert_eq!(total, entries.len());
}

/// Test an oversized entry gets a batch of its own
#[test]
fn test_split_into_batches_withOversizedEntry_shouldIsolateIt() {
    let long_text = "x".repeat(300);
    let entries = vec![
        common::entry(1, 0, 1000, "small"),
        common::entry(2, 1000, 2000, &long_text),
        common::entry(3, 2000, 3000, "small again"),
    ];

    let batches = split_into_batches(&entries, 100);

    assert_eq!(batches.len(), 3);
    assert_eq!(batches[1].len(), 1);
    assert_eq!(batches[1][0].id, 2);
}

/// Test the per-batch entry cap
#[test]
fn test_split_into_batches_withManyTinyEntries_shouldCapBatchSize() {
    let entries: Vec<_> = (1..=45)
        .map(|i| common::entry(i, i * 1000, i * 1000 + 500, "a"))
        .collect();

    let batches = split_into_batches(&entries, 10_000);

    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].len(), 40);
    assert_eq!(batches[1].len(), 5);
}

/// Test a full reflow with the echo oracle keeps text and timing
#[tokio::test]
async fn test_reflow_withEchoOracle_shouldRenumberOnly() -> Result<()> {
    let service = ReflowService::with_oracle(Box::new(MockOracle::echo()), quiet_config());
    let entries = vec![
        common::entry(12, 0, 2000, "First caption"),
        common::entry(15, 2500, 5000, "Second caption"),
    ];

    let reflowed = service.reflow(&entries).await?;

    assert_eq!(reflowed.len(), 2);
    assert_eq!(reflowed[0].id, 1);
    assert_eq!(reflowed[1].id, 2);
    assert_eq!(reflowed[0].text, "First caption");
    assert_eq!(reflowed[1].text, "Second caption");
    assert_eq!(reflowed[0].start_time_ms, 0);
    assert_eq!(reflowed[1].end_time_ms, 5000);

    Ok(())
}

/// Test a fenced echo response still decodes
#[tokio::test]
async fn test_reflow_withFencedEchoOracle_shouldDecode() -> Result<()> {
    let service =
        ReflowService::with_oracle(Box::new(MockOracle::echo().with_fences()), quiet_config());
    let entries = vec![common::entry(1, 0, 1000, "Caption")];

    let reflowed = service.reflow(&entries).await?;

    assert_eq!(reflowed.len(), 1);
    assert_eq!(reflowed[0].text, "Caption");

    Ok(())
}

/// Test a scripted split decision redistributes the duration
#[tokio::test]
async fn test_reflow_withScriptedSplit_shouldReallocateDurations() -> Result<()> {
    let script = vec![r#"[{"id":1,"text":["AB","ABCD"]}]"#.to_string()];
    let service = ReflowService::with_oracle(Box::new(MockOracle::scripted(script)), quiet_config());
    let entries = vec![common::entry(1, 1000, 5000, "ABABCD")];

    let reflowed = service.reflow(&entries).await?;

    assert_eq!(reflowed.len(), 2);
    assert_eq!(reflowed[0].start_time_ms, 1000);
    assert_eq!(reflowed[0].end_time_ms, 2333);
    assert_eq!(reflowed[1].start_time_ms, 2333);
    assert_eq!(reflowed[1].end_time_ms, 5000);

    Ok(())
}

/// Test empty input short-circuits without calling the oracle
#[tokio::test]
async fn test_reflow_withNoEntries_shouldReturnEmpty() -> Result<()> {
    let service = ReflowService::with_oracle(Box::new(MockOracle::unavailable()), quiet_config());

    let reflowed = service.reflow(&[]).await?;
    assert!(reflowed.is_empty());

    Ok(())
}

/// Test oracle failures propagate as a single typed error
#[tokio::test]
async fn test_reflow_withFailingOracle_shouldPropagateError() {
    let entries = vec![common::entry(1, 0, 1000, "Caption")];

    let service = ReflowService::with_oracle(Box::new(MockOracle::unavailable()), quiet_config());
    let result = service.reflow(&entries).await;
    assert!(matches!(
        result,
        Err(ReflowError::Oracle(OracleError::Unavailable(_)))
    ));

    let service =
        ReflowService::with_oracle(Box::new(MockOracle::quota_exceeded()), quiet_config());
    let result = service.reflow(&entries).await;
    assert!(matches!(
        result,
        Err(ReflowError::Oracle(OracleError::QuotaExceeded(_)))
    ));

    let service =
        ReflowService::with_oracle(Box::new(MockOracle::invalid_credential()), quiet_config());
    let result = service.reflow(&entries).await;
    assert!(matches!(
        result,
        Err(ReflowError::Oracle(OracleError::InvalidCredential(_)))
    ));
}

/// Test a malformed oracle reply fails the batch, never partially applied
#[tokio::test]
async fn test_reflow_withMalformedOracle_shouldFailWholeBatch() {
    let service = ReflowService::with_oracle(Box::new(MockOracle::malformed()), quiet_config());
    let entries = vec![common::entry(1, 0, 1000, "Caption")];

    let result = service.reflow(&entries).await;

    assert!(matches!(
        result,
        Err(ReflowError::Oracle(OracleError::MalformedResponse(_)))
    ));
}

/// Test an empty oracle reply fails the same way as a malformed one
#[tokio::test]
async fn test_reflow_withEmptyOracleReply_shouldFailMalformed() {
    let service = ReflowService::with_oracle(Box::new(MockOracle::empty()), quiet_config());
    let entries = vec![common::entry(1, 0, 1000, "Caption")];

    let result = service.reflow(&entries).await;

    assert!(matches!(
        result,
        Err(ReflowError::Oracle(OracleError::MalformedResponse(_)))
    ));
}
