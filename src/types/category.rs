use serde::{Deserialize, Serialize};

/// Represents a category (or subcategory, when `parent` is set) that
/// bookmarks are filed under.
///
/// `bookmark_count` is derived — it is recomputed by a full aggregation pass
/// after every mutation and never accepted from callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub parent: Option<String>,
    pub bookmark_count: i64,
    pub is_locked: bool,
    pub lock_reason: Option<String>,
    pub locked_at: Option<i64>,
}

impl Category {
    /// Reserved category that absorbs bookmarks whose category is deleted.
    pub const UNCATEGORIZED: &'static str = "Uncategorized";
}
