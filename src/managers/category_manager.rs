//! Category tree for Linkvault.
//!
//! Maintains the category/subcategory hierarchy with per-node bookmark
//! counts and lock state, backed by SQLite via `rusqlite`. Bookmarks
//! reference categories by name, so renames cascade the new name to member
//! bookmarks — otherwise their rows would orphan from the renamed node's
//! count.

use rusqlite::{params, Connection, OptionalExtension};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::types::category::Category;
use crate::types::errors::CategoryError;

/// Trait defining category tree operations.
pub trait CategoryManagerTrait {
    /// Create-if-absent. Returns the id of the new or existing node.
    fn create_category(&mut self, name: &str, parent: Option<&str>) -> Result<String, CategoryError>;
    fn rename_category(&mut self, id: &str, new_name: &str) -> Result<(), CategoryError>;
    /// Deletes a node and returns the number of member bookmarks reassigned.
    fn delete_category(&mut self, id: &str) -> Result<usize, CategoryError>;
    fn lock_category(&mut self, id: &str, reason: &str) -> Result<(), CategoryError>;
    fn unlock_category(&mut self, id: &str) -> Result<(), CategoryError>;
    fn get_category(&self, id: &str) -> Result<Category, CategoryError>;
    fn list_categories(&self) -> Result<Vec<Category>, CategoryError>;
    /// Full aggregation pass over all bookmarks; idempotent and
    /// order-independent.
    fn recompute_counts(&mut self) -> Result<(), CategoryError>;
}

/// Category manager backed by a SQLite connection.
pub struct CategoryManager<'a> {
    conn: &'a Connection,
}

impl<'a> CategoryManager<'a> {
    /// Creates a new `CategoryManager` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Returns the current UNIX timestamp in seconds.
    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    /// Reads a single `Category` row into a struct.
    fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            parent: row.get(2)?,
            bookmark_count: row.get(3)?,
            is_locked: row.get(4)?,
            lock_reason: row.get(5)?,
            locked_at: row.get(6)?,
        })
    }

    /// Fetches a category, failing with `Locked` (carrying the lock reason)
    /// when it cannot be mutated.
    fn require_unlocked(&self, id: &str) -> Result<Category, CategoryError> {
        let category = self.get_category(id)?;
        if category.is_locked {
            return Err(CategoryError::Locked {
                name: category.name,
                reason: category
                    .lock_reason
                    .unwrap_or_else(|| "no reason recorded".to_string()),
            });
        }
        Ok(category)
    }
}

const SELECT_COLUMNS: &str =
    "id, name, parent, bookmark_count, is_locked, lock_reason, locked_at";

impl<'a> CategoryManagerTrait for CategoryManager<'a> {
    /// Creates a category (or subcategory when `parent` is given) unless one
    /// with the same name already exists under that parent.
    fn create_category(
        &mut self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<String, CategoryError> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM categories WHERE name = ?1 AND parent IS ?2",
                params![name, parent],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| CategoryError::DatabaseError(e.to_string()))?;
        if let Some(id) = existing {
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        self.conn
            .execute(
                "INSERT INTO categories (id, name, parent) VALUES (?1, ?2, ?3)",
                params![id, name, parent],
            )
            .map_err(|e| CategoryError::DatabaseError(e.to_string()))?;
        Ok(id)
    }

    /// Renames a category and cascades the new name to every bookmark (and
    /// subcategory row) that referenced the old one.
    fn rename_category(&mut self, id: &str, new_name: &str) -> Result<(), CategoryError> {
        let category = self.require_unlocked(id)?;

        match &category.parent {
            None => {
                self.conn
                    .execute(
                        "UPDATE bookmarks SET category = ?1 WHERE category = ?2",
                        params![new_name, category.name],
                    )
                    .map_err(|e| CategoryError::DatabaseError(e.to_string()))?;
                self.conn
                    .execute(
                        "UPDATE categories SET parent = ?1 WHERE parent = ?2",
                        params![new_name, category.name],
                    )
                    .map_err(|e| CategoryError::DatabaseError(e.to_string()))?;
            }
            Some(parent) => {
                self.conn
                    .execute(
                        "UPDATE bookmarks SET subcategory = ?1 \
                         WHERE category = ?2 AND subcategory = ?3",
                        params![new_name, parent, category.name],
                    )
                    .map_err(|e| CategoryError::DatabaseError(e.to_string()))?;
            }
        }

        self.conn
            .execute(
                "UPDATE categories SET name = ?1 WHERE id = ?2",
                params![new_name, id],
            )
            .map_err(|e| CategoryError::DatabaseError(e.to_string()))?;

        self.recompute_counts()
    }

    /// Deletes a category. Member bookmarks of a top-level category are
    /// reassigned to the reserved `Uncategorized` category; members of a
    /// subcategory are lifted into the parent category. Returns the number of
    /// bookmarks moved.
    fn delete_category(&mut self, id: &str) -> Result<usize, CategoryError> {
        let category = self.require_unlocked(id)?;

        let moved = match &category.parent {
            None => {
                self.create_category(Category::UNCATEGORIZED, None)?;
                let moved = self
                    .conn
                    .execute(
                        "UPDATE bookmarks SET category = ?1, subcategory = NULL \
                         WHERE category = ?2",
                        params![Category::UNCATEGORIZED, category.name],
                    )
                    .map_err(|e| CategoryError::DatabaseError(e.to_string()))?;
                // subcategory rows go with their parent
                self.conn
                    .execute(
                        "DELETE FROM categories WHERE parent = ?1",
                        params![category.name],
                    )
                    .map_err(|e| CategoryError::DatabaseError(e.to_string()))?;
                moved
            }
            Some(parent) => self
                .conn
                .execute(
                    "UPDATE bookmarks SET subcategory = NULL \
                     WHERE category = ?1 AND subcategory = ?2",
                    params![parent, category.name],
                )
                .map_err(|e| CategoryError::DatabaseError(e.to_string()))?,
        };

        self.conn
            .execute("DELETE FROM categories WHERE id = ?1", params![id])
            .map_err(|e| CategoryError::DatabaseError(e.to_string()))?;

        self.recompute_counts()?;
        Ok(moved)
    }

    /// Locks a category against rename and delete, recording the reason.
    fn lock_category(&mut self, id: &str, reason: &str) -> Result<(), CategoryError> {
        let affected = self
            .conn
            .execute(
                "UPDATE categories SET is_locked = 1, lock_reason = ?1, locked_at = ?2 \
                 WHERE id = ?3",
                params![reason, Self::now(), id],
            )
            .map_err(|e| CategoryError::DatabaseError(e.to_string()))?;
        if affected == 0 {
            return Err(CategoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Clears the lock. This is the only mutation a locked category accepts.
    fn unlock_category(&mut self, id: &str) -> Result<(), CategoryError> {
        let affected = self
            .conn
            .execute(
                "UPDATE categories SET is_locked = 0, lock_reason = NULL, locked_at = NULL \
                 WHERE id = ?1",
                params![id],
            )
            .map_err(|e| CategoryError::DatabaseError(e.to_string()))?;
        if affected == 0 {
            return Err(CategoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn get_category(&self, id: &str) -> Result<Category, CategoryError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM categories WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                Self::row_to_category,
            )
            .optional()
            .map_err(|e| CategoryError::DatabaseError(e.to_string()))?
            .ok_or_else(|| CategoryError::NotFound(id.to_string()))
    }

    /// Lists all categories, top-level nodes before subcategories, each level
    /// name-ordered.
    fn list_categories(&self) -> Result<Vec<Category>, CategoryError> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM categories \
                 ORDER BY CASE WHEN parent IS NULL THEN 0 ELSE 1 END, name",
                SELECT_COLUMNS
            ))
            .map_err(|e| CategoryError::DatabaseError(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_category)
            .map_err(|e| CategoryError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| CategoryError::DatabaseError(e.to_string()))?);
        }
        Ok(results)
    }

    /// Recomputes every node's bookmark count from scratch: load all
    /// (category, subcategory) pairs, aggregate in memory, write each row.
    /// Explicit recompute-on-write instead of incremental counters that can
    /// drift.
    fn recompute_counts(&mut self) -> Result<(), CategoryError> {
        use std::collections::HashMap;

        let mut stmt = self
            .conn
            .prepare("SELECT category, subcategory FROM bookmarks")
            .map_err(|e| CategoryError::DatabaseError(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })
            .map_err(|e| CategoryError::DatabaseError(e.to_string()))?;

        let mut category_counts: HashMap<String, i64> = HashMap::new();
        let mut subcategory_counts: HashMap<(String, String), i64> = HashMap::new();
        for row in rows {
            let (category, subcategory) =
                row.map_err(|e| CategoryError::DatabaseError(e.to_string()))?;
            *category_counts.entry(category.clone()).or_insert(0) += 1;
            if let Some(sub) = subcategory {
                *subcategory_counts.entry((category, sub)).or_insert(0) += 1;
            }
        }
        drop(stmt);

        for category in self.list_categories()? {
            let count = match &category.parent {
                None => category_counts.get(&category.name).copied().unwrap_or(0),
                Some(parent) => subcategory_counts
                    .get(&(parent.clone(), category.name.clone()))
                    .copied()
                    .unwrap_or(0),
            };
            self.conn
                .execute(
                    "UPDATE categories SET bookmark_count = ?1 WHERE id = ?2",
                    params![count, category.id],
                )
                .map_err(|e| CategoryError::DatabaseError(e.to_string()))?;
        }
        Ok(())
    }
}
