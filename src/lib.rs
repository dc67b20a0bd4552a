/*!
 * # srtreflow - AI-assisted caption reflow for constrained displays
 *
 * A Rust library that reformats SRT caption files so each caption fits
 * constrained display limits (e.g. short-form vertical video), using an
 * external LLM oracle to decide the line and caption breaks.
 *
 * ## Features
 *
 * - Parse and serialize SRT caption files
 * - Reformat captions through various oracle providers:
 *   - Ollama (local LLM)
 *   - OpenAI API
 *   - Anthropic API
 * - Losslessly redistribute durations when a caption is split into
 *   several sequential captions
 * - Tolerant of malformed blocks and partial oracle output
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `timecode`: SRT timestamp <-> millisecond conversion
 * - `caption`: Caption entry parsing and serialization
 * - `reallocator`: Split-duration reallocation of oracle decisions
 * - `reflow_service`: Batching, oracle requests and decision decoding
 * - `oracle`: Client implementations for the oracle providers:
 *   - `oracle::ollama`: Ollama API client
 *   - `oracle::openai`: OpenAI API client
 *   - `oracle::anthropic`: Anthropic API client
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod caption;
pub mod errors;
pub mod file_utils;
pub mod oracle;
pub mod reallocator;
pub mod reflow_service;
pub mod timecode;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use caption::{CaptionEntry, CaptionFile};
pub use errors::{AppError, CaptionError, OracleError, ReflowError};
pub use reallocator::{DecisionText, FormattingDecision};
pub use reflow_service::ReflowService;
