use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Display constraints for the reflowed captions
    #[serde(default)]
    pub reflow: ReflowConfig,

    /// Oracle (reformatting provider) config
    pub oracle: OracleConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Display constraints handed to the oracle per batch
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReflowConfig {
    /// Maximum visible characters per caption line
    #[serde(default = "default_max_line_chars")]
    pub max_line_chars: usize,

    /// Maximum lines per caption before the oracle should split it
    #[serde(default = "default_max_lines_per_caption")]
    pub max_lines_per_caption: usize,
}

impl Default for ReflowConfig {
    fn default() -> Self {
        Self {
            max_line_chars: default_max_line_chars(),
            max_lines_per_caption: default_max_lines_per_caption(),
        }
    }
}

/// Oracle provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OracleProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: OpenAI
    OpenAI,
    // @provider: Anthropic
    Anthropic,
}

impl OracleProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }
}

impl std::fmt::Display for OracleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for OracleProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Max caption chars per request
    #[serde(default = "default_max_chars_per_request")]
    pub max_chars_per_request: usize,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: OracleProvider) -> Self {
        match provider_type {
            OracleProvider::Ollama => Self {
                provider_type: "ollama".to_string(),
                model: default_ollama_model(),
                api_key: String::new(),
                endpoint: default_ollama_endpoint(),
                max_chars_per_request: default_max_chars_per_request(),
                timeout_secs: default_timeout_secs(),
            },
            OracleProvider::OpenAI => Self {
                provider_type: "openai".to_string(),
                model: default_openai_model(),
                api_key: String::new(),
                endpoint: default_openai_endpoint(),
                max_chars_per_request: default_max_chars_per_request(),
                timeout_secs: default_timeout_secs(),
            },
            OracleProvider::Anthropic => Self {
                provider_type: "anthropic".to_string(),
                model: default_anthropic_model(),
                api_key: String::new(),
                endpoint: default_anthropic_endpoint(),
                max_chars_per_request: default_anthropic_max_chars_per_request(),
                timeout_secs: default_anthropic_timeout_secs(),
            },
        }
    }
}

/// Oracle service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OracleConfig {
    /// Oracle provider to use
    #[serde(default)]
    pub provider: OracleProvider,

    /// Available oracle providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common oracle settings
    #[serde(default)]
    pub common: OracleCommonConfig,
}

/// Common oracle settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OracleCommonConfig {
    /// System prompt template for the reformatting request
    /// Placeholders: {max_line_chars}, {max_lines_per_caption}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Delay in milliseconds between consecutive batch requests
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for OracleCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            temperature: default_temperature(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_max_line_chars() -> usize {
    18
}

fn default_max_lines_per_caption() -> usize {
    2
}

fn default_max_chars_per_request() -> usize {
    1000
}

fn default_anthropic_max_chars_per_request() -> usize {
    2500
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_anthropic_timeout_secs() -> u64 {
    60
}

fn default_rate_limit_delay_ms() -> u64 {
    500
}

fn default_temperature() -> f32 {
    0.3
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku".to_string()
}

fn default_system_prompt() -> String {
    "You reformat video captions for a narrow vertical display. Each caption line must fit in {max_line_chars} characters and a caption must have at most {max_lines_per_caption} lines. You may rebreak lines, or split one caption into several sequential captions when the text cannot fit. Reply with a JSON array of objects {\"id\": <original id>, \"text\": <string or array of strings>} covering every input caption, and nothing else. Never change the wording, only the line and caption breaks.".to_string()
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.reflow.max_line_chars == 0 {
            return Err(anyhow!("reflow.max_line_chars must be greater than zero"));
        }
        if self.reflow.max_lines_per_caption == 0 {
            return Err(anyhow!("reflow.max_lines_per_caption must be greater than zero"));
        }

        // Validate API key for all providers except Ollama
        match self.oracle.provider {
            OracleProvider::OpenAI => {
                if self.oracle.get_api_key().is_empty() {
                    return Err(anyhow!("Oracle API key is required for OpenAI provider"));
                }
            }
            OracleProvider::Anthropic => {
                if self.oracle.get_api_key().is_empty() {
                    return Err(anyhow!("Oracle API key is required for Anthropic provider"));
                }
            }
            _ => {}
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            reflow: ReflowConfig::default(),
            oracle: OracleConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl OracleConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &OracleProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            OracleProvider::Ollama => default_ollama_model(),
            OracleProvider::OpenAI => default_openai_model(),
            OracleProvider::Anthropic => default_anthropic_model(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }

        // Default fallback - Ollama doesn't use API keys
        String::new()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            OracleProvider::Ollama => default_ollama_endpoint(),
            OracleProvider::OpenAI => default_openai_endpoint(),
            OracleProvider::Anthropic => default_anthropic_endpoint(),
        }
    }

    /// Get the max chars per request for the active provider
    pub fn get_max_chars_per_request(&self) -> usize {
        if let Some(provider_config) = self.get_active_provider_config() {
            if provider_config.max_chars_per_request > 0 {
                return provider_config.max_chars_per_request;
            }
        }

        // Default fallback
        default_max_chars_per_request()
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        if let Some(provider_config) = self.get_active_provider_config() {
            if provider_config.timeout_secs > 0 {
                return provider_config.timeout_secs;
            }
        }

        match self.provider {
            OracleProvider::Anthropic => default_anthropic_timeout_secs(),
            _ => default_timeout_secs(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        let mut config = Self {
            provider: OracleProvider::default(),
            available_providers: Vec::new(),
            common: OracleCommonConfig::default(),
        };

        // Add default providers
        config.available_providers.push(ProviderConfig::new(OracleProvider::Ollama));
        config.available_providers.push(ProviderConfig::new(OracleProvider::OpenAI));
        config.available_providers.push(ProviderConfig::new(OracleProvider::Anthropic));

        config
    }
}
