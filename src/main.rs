// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use srtreflow::app_config::{Config, LogLevel, OracleProvider};
use srtreflow::app_controller::Controller;

/// CLI Wrapper for OracleProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliOracleProvider {
    Ollama,
    OpenAI,
    Anthropic,
}

impl From<CliOracleProvider> for OracleProvider {
    fn from(cli_provider: CliOracleProvider) -> Self {
        match cli_provider {
            CliOracleProvider::Ollama => OracleProvider::Ollama,
            CliOracleProvider::OpenAI => OracleProvider::OpenAI,
            CliOracleProvider::Anthropic => OracleProvider::Anthropic,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for srtreflow
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// srtreflow - reflow SRT captions for constrained displays
///
/// Reformats SRT caption files so each caption fits a narrow display
/// (e.g. vertical short-form video), delegating the line breaking to an
/// AI oracle (Ollama, OpenAI, Anthropic) and losslessly redistributing
/// caption durations when a caption is split.
#[derive(Parser, Debug)]
#[command(name = "srtreflow")]
#[command(version = "1.0.0")]
#[command(about = "AI-assisted caption reflow tool")]
#[command(long_about = "srtreflow reformats SRT caption files so each caption fits constrained
display limits, using an AI oracle to decide the line and caption breaks.

EXAMPLES:
    srtreflow movie.srt                      # Reflow using default config
    srtreflow -f movie.srt                   # Force overwrite existing output
    srtreflow -p openai -m gpt-4o movie.srt  # Use specific provider and model
    srtreflow --max-line-chars 24 movie.srt  # Wider display budget
    srtreflow --check-connection             # Test the configured oracle
    srtreflow /captions/                     # Process a whole directory
    srtreflow completions bash               # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a
    different config file with --config. If the config file doesn't exist,
    a default one will be created automatically.

SUPPORTED PROVIDERS:
    ollama    - Local Ollama server (default: llama3.2:3b)
    openai    - OpenAI API (requires API key)
    anthropic - Anthropic Claude API (requires API key)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input caption file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Oracle provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliOracleProvider>,

    /// Model name to use for reformatting
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum characters per caption line
    #[arg(long)]
    max_line_chars: Option<usize>,

    /// Maximum lines per caption
    #[arg(long)]
    max_lines: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Test the oracle connection and exit
    #[arg(long)]
    check_connection: bool,
}

// @struct: Custom logger implementation
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    // The level lives in log::max_level so it can be raised after the
    // config file is loaded
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

/// Load the config file, creating a default one when it does not exist
fn load_or_create_config(config_path: &str) -> Result<Config> {
    if std::path::Path::new(config_path).exists() {
        Config::from_file(config_path)
    } else {
        warn!("Config file {} not found, creating a default one", config_path);
        let config = Config::default();
        config.save_to_file(config_path)?;
        Ok(config)
    }
}

/// Apply CLI overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, cli: &CommandLineOptions) {
    if let Some(provider) = &cli.provider {
        config.oracle.provider = provider.clone().into();
    }
    if let Some(model) = &cli.model {
        let provider_str = config.oracle.provider.to_lowercase_string();
        for provider_config in &mut config.oracle.available_providers {
            if provider_config.provider_type == provider_str {
                provider_config.model = model.clone();
            }
        }
    }
    if let Some(max_line_chars) = cli.max_line_chars {
        config.reflow.max_line_chars = max_line_chars;
    }
    if let Some(max_lines) = cli.max_lines {
        config.reflow.max_lines_per_caption = max_lines;
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "srtreflow", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = load_or_create_config(&cli.config_path)?;
    apply_overrides(&mut config, &cli);
    config.validate()?;

    log::set_max_level(level_filter(&config.log_level));

    let controller = Controller::with_config(config)?;

    if cli.check_connection {
        controller.test_connection().await?;
        info!("Oracle connection OK");
        return Ok(());
    }

    let input_path = cli
        .input_path
        .ok_or_else(|| anyhow!("INPUT_PATH is required unless --check-connection is used"))?;

    controller.run(input_path, cli.force_overwrite).await
}
