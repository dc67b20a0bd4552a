use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::CaptionError;
use crate::file_utils::FileManager;
use crate::timecode;

// @module: Caption entry parsing and serialization

// @const: SRT timeline regex (`<timestamp> --> <timestamp>`)
static TIMELINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}:\d{2}:\d{2},\d{3}) --> (\d{2}:\d{2}:\d{2},\d{3})$").unwrap()
});

// @const: Blank-line block separator (tolerates trailing spaces/tabs)
static BLOCK_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n[ \t]*\n").unwrap()
});

/// Single caption entry.
///
/// Immutable value object: constructed by the parser or derived by the
/// reallocator, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionEntry {
    /// Positive id, unique within a file
    pub id: u64,

    /// Start time in ms since file start
    pub start_time_ms: u64,

    /// End time in ms since file start, `end >= start`
    pub end_time_ms: u64,

    /// Display text, lines joined by `\n`; empty only when the source
    /// block carried no text lines
    pub text: String,
}

impl CaptionEntry {
    /// Create a new caption entry
    pub fn new(id: u64, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        CaptionEntry {
            id,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    /// Duration of the entry in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.end_time_ms - self.start_time_ms
    }

    /// Start time as a formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        timecode::format_timestamp(self.start_time_ms)
    }

    /// End time as a formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        timecode::format_timestamp(self.end_time_ms)
    }
}

impl fmt::Display for CaptionEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\n{} --> {}",
            self.id,
            self.format_start_time(),
            self.format_end_time()
        )?;
        if !self.text.is_empty() {
            write!(f, "\n{}", self.text)?;
        }
        Ok(())
    }
}

/// Parse raw SRT text into an ordered sequence of caption entries.
///
/// Line endings are normalized and the input is split on blank-line
/// separators. A block must carry a decimal id on its first line and a
/// `<timestamp> --> <timestamp>` timeline on its second; remaining lines
/// (possibly none) are the text, joined verbatim. Blocks failing a
/// structural check are skipped with a warning, so stray blank blocks or
/// trailing noise never abort the file. Entries come back in source order,
/// untouched — no re-sorting, no renumbering.
///
/// Empty or whitespace-only input yields an empty list; non-empty input
/// from which nothing parses fails with [`CaptionError::NoEntriesParsed`].
pub fn parse(raw: &str) -> Result<Vec<CaptionEntry>, CaptionError> {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    if normalized.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for block in BLOCK_SEPARATOR.split(&normalized) {
        let block = block.trim_matches('\n');
        if block.trim().is_empty() {
            continue;
        }
        match parse_block(block) {
            Ok(entry) => entries.push(entry),
            Err(reason) => warn!("Skipping malformed caption block: {}", reason),
        }
    }

    if entries.is_empty() {
        return Err(CaptionError::NoEntriesParsed);
    }

    Ok(entries)
}

/// Parse one caption block. The error carries the skip reason for logging.
fn parse_block(block: &str) -> Result<CaptionEntry, String> {
    let mut lines = block.lines();

    let id_line = lines.next().unwrap_or("").trim();
    let id: u64 = id_line
        .parse()
        .map_err(|_| format!("invalid id line {:?}", id_line))?;
    if id == 0 {
        return Err("id must be positive".to_string());
    }

    let timeline = lines.next().unwrap_or("").trim();
    let caps = TIMELINE_REGEX
        .captures(timeline)
        .ok_or_else(|| format!("invalid timeline {:?}", timeline))?;

    // The timeline regex guarantees both captures parse
    let start_time_ms = timecode::parse_timestamp(&caps[1]).map_err(|e| e.to_string())?;
    let end_time_ms = timecode::parse_timestamp(&caps[2]).map_err(|e| e.to_string())?;
    if end_time_ms < start_time_ms {
        return Err(format!(
            "end time {} precedes start time {}",
            end_time_ms, start_time_ms
        ));
    }

    let text = lines.collect::<Vec<_>>().join("\n");

    Ok(CaptionEntry::new(id, start_time_ms, end_time_ms, text))
}

/// Render entries back to SRT text: blocks separated by one blank line,
/// no trailing blank line after the final block.
pub fn serialize(entries: &[CaptionEntry]) -> String {
    entries
        .iter()
        .map(|entry| entry.to_string())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Caption file: an ordered sequence of entries tied to a source path
#[derive(Debug)]
pub struct CaptionFile {
    /// Source filename
    pub source_file: PathBuf,

    /// List of caption entries
    pub entries: Vec<CaptionEntry>,
}

impl CaptionFile {
    /// Create a new, empty caption file
    pub fn new(source_file: PathBuf) -> Self {
        CaptionFile {
            source_file,
            entries: Vec::new(),
        }
    }

    /// Read and parse an SRT file from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path)?;
        let entries = parse(&content)
            .with_context(|| format!("Failed to parse caption file: {}", path.display()))?;

        Ok(CaptionFile {
            source_file: path.to_path_buf(),
            entries,
        })
    }

    /// Write the entries to an SRT file
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        // Create parent directory if needed
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            FileManager::ensure_dir(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create caption file: {}", path.display()))?;
        writeln!(file, "{}", serialize(&self.entries))?;

        Ok(())
    }

    /// Total character count of all entry text, used for batch budgeting
    pub fn total_chars(&self) -> usize {
        self.entries.iter().map(|e| e.text.len()).sum()
    }
}

impl fmt::Display for CaptionFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Caption file")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}
