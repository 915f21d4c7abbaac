use std::fmt;

// === BookmarkError ===

/// Errors related to bookmark store operations.
#[derive(Debug)]
pub enum BookmarkError {
    /// Bookmark with the given ID was not found.
    NotFound(String),
    /// Mutation attempted on a locked bookmark.
    Locked(String),
    /// The provided status tag is not part of the closed status set.
    InvalidStatus(String),
    /// Database operation failed.
    DatabaseError(String),
}

impl fmt::Display for BookmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookmarkError::NotFound(id) => write!(f, "Bookmark not found: {}", id),
            BookmarkError::Locked(id) => write!(f, "Bookmark is locked: {}", id),
            BookmarkError::InvalidStatus(tag) => write!(f, "Invalid bookmark status: {}", tag),
            BookmarkError::DatabaseError(msg) => {
                write!(f, "Bookmark database error: {}", msg)
            }
        }
    }
}

impl std::error::Error for BookmarkError {}

// === CategoryError ===

/// Errors related to category tree operations.
#[derive(Debug)]
pub enum CategoryError {
    /// Category with the given ID was not found.
    NotFound(String),
    /// Mutation attempted on a locked category. Carries the lock reason.
    Locked { name: String, reason: String },
    /// Database operation failed.
    DatabaseError(String),
}

impl fmt::Display for CategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryError::NotFound(id) => write!(f, "Category not found: {}", id),
            CategoryError::Locked { name, reason } => {
                write!(f, "Category '{}' is locked: {}", name, reason)
            }
            CategoryError::DatabaseError(msg) => {
                write!(f, "Category database error: {}", msg)
            }
        }
    }
}

impl std::error::Error for CategoryError {}

// === ImportError ===

/// Errors related to bookmark import.
///
/// Malformed records inside a payload are never errors — the parsers log and
/// skip them. Only an unrecognized format name or a storage failure aborts an
/// import.
#[derive(Debug)]
pub enum ImportError {
    /// The requested import format is not recognized.
    UnsupportedFormat(String),
    /// Database operation failed.
    DatabaseError(String),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::UnsupportedFormat(name) => {
                write!(f, "Unsupported import format: {}", name)
            }
            ImportError::DatabaseError(msg) => write!(f, "Import database error: {}", msg),
        }
    }
}

impl std::error::Error for ImportError {}

// === ExportError ===

/// Errors related to bookmark export.
#[derive(Debug)]
pub enum ExportError {
    /// The requested export format is not recognized.
    UnsupportedFormat(String),
    /// Database operation failed.
    DatabaseError(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::UnsupportedFormat(name) => {
                write!(f, "Unsupported export format: {}", name)
            }
            ExportError::DatabaseError(msg) => write!(f, "Export database error: {}", msg),
        }
    }
}

impl std::error::Error for ExportError {}
