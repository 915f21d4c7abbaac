use serde::{Deserialize, Serialize};

/// Health/lifecycle tag carried by every bookmark.
///
/// Stored as lowercase text in the `status` column. `Locked` mirrors the
/// `is_locked` flag; `Dead` implies `is_alive == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkStatus {
    Active,
    Dead,
    Localhost,
    Duplicate,
    Locked,
    Timeout,
    Unchecked,
}

impl BookmarkStatus {
    /// Text form used in the database and in export columns.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookmarkStatus::Active => "active",
            BookmarkStatus::Dead => "dead",
            BookmarkStatus::Localhost => "localhost",
            BookmarkStatus::Duplicate => "duplicate",
            BookmarkStatus::Locked => "locked",
            BookmarkStatus::Timeout => "timeout",
            BookmarkStatus::Unchecked => "unchecked",
        }
    }

    /// Parses the text form. Unknown tags map to `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(BookmarkStatus::Active),
            "dead" => Some(BookmarkStatus::Dead),
            "localhost" => Some(BookmarkStatus::Localhost),
            "duplicate" => Some(BookmarkStatus::Duplicate),
            "locked" => Some(BookmarkStatus::Locked),
            "timeout" => Some(BookmarkStatus::Timeout),
            "unchecked" => Some(BookmarkStatus::Unchecked),
            _ => None,
        }
    }
}

/// Represents a saved bookmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub title: String,
    pub url: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub description: Option<String>,
    pub created_at: i64,
    pub last_checked: Option<i64>,
    pub is_alive: bool,
    pub is_locked: bool,
    pub status: BookmarkStatus,
}
