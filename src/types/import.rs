use serde::{Deserialize, Serialize};

use super::bookmark::Bookmark;
use super::errors::{ExportError, ImportError};

/// A bookmark record as produced by the format parsers, before required-field
/// filtering and persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateBookmark {
    pub title: String,
    pub url: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub description: Option<String>,
}

/// Supported import payload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    /// Netscape bookmark file markup, as exported by every major browser.
    NetscapeHtml,
    /// One of several browser JSON dialects, auto-detected.
    Json,
    /// Generic `<bookmark>`/`<item>` XML.
    Xml,
    /// Delimited text with a synonym-tolerant header row.
    Csv,
}

impl ImportFormat {
    /// Parses a caller-supplied format name. Unknown names are a client error.
    pub fn parse(name: &str) -> Result<Self, ImportError> {
        match name.to_lowercase().as_str() {
            "html" | "netscape" | "netscape-html" => Ok(ImportFormat::NetscapeHtml),
            "json" => Ok(ImportFormat::Json),
            "xml" => Ok(ImportFormat::Xml),
            "csv" => Ok(ImportFormat::Csv),
            _ => Err(ImportError::UnsupportedFormat(name.to_string())),
        }
    }
}

/// Supported export output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Browser-importable Netscape markup.
    NetscapeHtml,
    /// Chrome-shaped JSON with `roots` containers.
    ChromeJson,
    /// One `<bookmark>` element per entry.
    Xml,
    /// Fixed 8-column delimited text.
    Csv,
}

impl ExportFormat {
    /// Parses a caller-supplied format name. Unknown names are a client error.
    pub fn parse(name: &str) -> Result<Self, ExportError> {
        match name.to_lowercase().as_str() {
            "html" | "netscape" | "netscape-html" => Ok(ExportFormat::NetscapeHtml),
            "json" | "chrome-json" => Ok(ExportFormat::ChromeJson),
            "xml" => Ok(ExportFormat::Xml),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(ExportError::UnsupportedFormat(name.to_string())),
        }
    }
}

/// Transient grouping of bookmarks that share a normalized URL key.
/// Computed on demand, never persisted.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub key: String,
    pub bookmarks: Vec<Bookmark>,
}

/// Result of an import run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub total_parsed: usize,
    pub message: String,
}

/// Result of a link validation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_checked: usize,
    pub dead_found: usize,
}

/// Result of a bulk removal (dead-link purge, duplicate purge).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupSummary {
    pub removed: usize,
}

/// Result of a duplicate scan: groups found and members tagged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateScan {
    pub group_count: usize,
    pub marked_count: usize,
}

/// Result of a bulk move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveSummary {
    pub moved: usize,
}
