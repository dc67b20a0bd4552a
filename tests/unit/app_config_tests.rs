/*!
 * Tests for app configuration functionality
 */

use std::str::FromStr;

use anyhow::Result;

use srtreflow::app_config::{Config, OracleProvider, ProviderConfig};

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoInput_shouldHaveSaneDefaults() {
    let config = Config::default();

    assert_eq!(config.oracle.provider, OracleProvider::Ollama);
    assert_eq!(config.oracle.available_providers.len(), 3);
    assert_eq!(config.reflow.max_line_chars, 18);
    assert_eq!(config.reflow.max_lines_per_caption, 2);
    assert!(config.validate().is_ok());
}

/// Test the default system prompt carries both constraint placeholders
#[test]
fn test_default_config_withSystemPrompt_shouldContainPlaceholders() {
    let config = Config::default();
    let prompt = &config.oracle.common.system_prompt;

    assert!(prompt.contains("{max_line_chars}"));
    assert!(prompt.contains("{max_lines_per_caption}"));
}

/// Test provider getters fall back per provider type
#[test]
fn test_oracle_config_withProviderSwitch_shouldResolvePerProvider() {
    let mut config = Config::default();

    assert_eq!(config.oracle.get_endpoint(), "http://localhost:11434");
    assert_eq!(config.oracle.get_model(), "llama3.2:3b");

    config.oracle.provider = OracleProvider::Anthropic;
    assert_eq!(config.oracle.get_endpoint(), "https://api.anthropic.com");
    assert_eq!(config.oracle.get_model(), "claude-3-haiku");
    assert_eq!(config.oracle.get_timeout_secs(), 60);
}

/// Test explicit provider entries override the defaults
#[test]
fn test_oracle_config_withCustomProviderEntry_shouldUseIt() {
    let mut config = Config::default();
    config.oracle.provider = OracleProvider::OpenAI;

    for provider in &mut config.oracle.available_providers {
        if provider.provider_type == "openai" {
            provider.model = "gpt-4o".to_string();
            provider.api_key = "sk-test".to_string();
            provider.endpoint = "http://proxy.local/v1".to_string();
        }
    }

    assert_eq!(config.oracle.get_model(), "gpt-4o");
    assert_eq!(config.oracle.get_api_key(), "sk-test");
    assert_eq!(config.oracle.get_endpoint(), "http://proxy.local/v1");
    assert!(config.validate().is_ok());
}

/// Test validation rejects missing API keys and zero limits
#[test]
fn test_validate_withBadValues_shouldFail() {
    let mut config = Config::default();
    config.oracle.provider = OracleProvider::OpenAI;
    assert!(config.validate().is_err(), "OpenAI without a key must fail");

    let mut config = Config::default();
    config.reflow.max_line_chars = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.reflow.max_lines_per_caption = 0;
    assert!(config.validate().is_err());
}

/// Test provider parsing and display
#[test]
fn test_provider_withStringConversions_shouldRoundTrip() -> Result<()> {
    assert_eq!(OracleProvider::from_str("ollama")?, OracleProvider::Ollama);
    assert_eq!(OracleProvider::from_str("OpenAI")?, OracleProvider::OpenAI);
    assert_eq!(
        OracleProvider::from_str("anthropic")?,
        OracleProvider::Anthropic
    );
    assert!(OracleProvider::from_str("grok").is_err());

    assert_eq!(OracleProvider::Anthropic.to_string(), "anthropic");
    assert_eq!(OracleProvider::OpenAI.display_name(), "OpenAI");

    Ok(())
}

/// Test provider config defaults per type
#[test]
fn test_provider_config_withNewPerType_shouldSetDefaults() {
    let ollama = ProviderConfig::new(OracleProvider::Ollama);
    assert_eq!(ollama.provider_type, "ollama");
    assert!(ollama.api_key.is_empty());

    let anthropic = ProviderConfig::new(OracleProvider::Anthropic);
    assert_eq!(anthropic.provider_type, "anthropic");
    assert_eq!(anthropic.timeout_secs, 60);
    assert_eq!(anthropic.max_chars_per_request, 2500);
}

/// Test configuration file round-trip
#[test]
fn test_config_withSaveAndLoad_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.reflow.max_line_chars = 24;
    config.save_to_file(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded.reflow.max_line_chars, 24);
    assert_eq!(loaded.oracle.provider, OracleProvider::Ollama);

    Ok(())
}

/// Test partial config files pick up serde defaults
#[test]
fn test_config_withMinimalJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        &temp_dir.path().to_path_buf(),
        "conf.json",
        r#"{ "oracle": { "provider": "ollama" } }"#,
    )?;

    let config = Config::from_file(&path)?;
    assert_eq!(config.reflow.max_line_chars, 18);
    assert_eq!(config.oracle.common.rate_limit_delay_ms, 500);

    Ok(())
}
