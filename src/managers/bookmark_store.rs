//! Bookmark store for Linkvault.
//!
//! The orchestrator of the import/export and integrity pipeline: receives raw
//! import payloads and coordinates parse → dedupe → persist → recount;
//! receives export, validation and cleanup requests and coordinates
//! read → transform → respond. Backed by SQLite via `rusqlite`; composes the
//! stateless pipeline services.

use rusqlite::{params, Connection, OptionalExtension};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};
use uuid::Uuid;

use crate::managers::category_manager::{CategoryManager, CategoryManagerTrait};
use crate::services::duplicate_resolver::{DuplicateResolver, DuplicateResolverTrait};
use crate::services::export_serializer::{ExportSerializer, ExportSerializerTrait};
use crate::services::format_parser::{FormatParser, FormatParserTrait};
use crate::services::link_validator::{is_local_url, LinkValidator, ValidatorConfig, Verdict};
use crate::types::bookmark::{Bookmark, BookmarkStatus};
use crate::types::errors::{BookmarkError, ExportError, ImportError};
use crate::types::import::{
    CandidateBookmark, CleanupSummary, DuplicateScan, ExportFormat, ImportFormat, ImportSummary,
    MoveSummary, ValidationSummary,
};

const SELECT_COLUMNS: &str = "id, title, url, category, subcategory, description, \
     created_at, last_checked, is_alive, is_locked, status";

/// Bookmark store backed by a SQLite connection.
///
/// Every operation re-reads what it needs from the database; the store keeps
/// no cross-request state beyond its stateless service helpers.
pub struct BookmarkStore<'a> {
    conn: &'a Connection,
    parser: FormatParser,
    resolver: DuplicateResolver,
    serializer: ExportSerializer,
    validator: LinkValidator,
}

impl<'a> BookmarkStore<'a> {
    /// Creates a store with default validator settings.
    pub fn new(conn: &'a Connection) -> Self {
        Self::with_config(conn, ValidatorConfig::default())
    }

    /// Creates a store with the given validator settings.
    pub fn with_config(conn: &'a Connection, config: ValidatorConfig) -> Self {
        Self {
            conn,
            parser: FormatParser::new(),
            resolver: DuplicateResolver::new(),
            serializer: ExportSerializer::new(),
            validator: LinkValidator::new(config),
        }
    }

    /// Returns the current UNIX timestamp in seconds.
    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    /// Reads a single `Bookmark` row into a struct.
    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        let status: String = row.get(10)?;
        Ok(Bookmark {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            category: row.get(3)?,
            subcategory: row.get(4)?,
            description: row.get(5)?,
            created_at: row.get(6)?,
            last_checked: row.get(7)?,
            is_alive: row.get(8)?,
            is_locked: row.get(9)?,
            status: BookmarkStatus::parse(&status).unwrap_or(BookmarkStatus::Unchecked),
        })
    }

    /// Fetches a bookmark, failing with `Locked` when it cannot be mutated.
    fn require_unlocked(&self, id: &str) -> Result<Bookmark, BookmarkError> {
        let bookmark = self.get_bookmark(id)?;
        if bookmark.is_locked {
            return Err(BookmarkError::Locked(id.to_string()));
        }
        Ok(bookmark)
    }

    /// Creates the category (and subcategory) rows a bookmark references.
    fn ensure_category(
        &self,
        category: &str,
        subcategory: Option<&str>,
    ) -> Result<(), BookmarkError> {
        let mut categories = CategoryManager::new(self.conn);
        categories
            .create_category(category, None)
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        if let Some(sub) = subcategory {
            categories
                .create_category(sub, Some(category))
                .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        }
        Ok(())
    }

    /// Recomputes category counts after a membership-changing mutation.
    fn recount(&self) -> Result<(), BookmarkError> {
        CategoryManager::new(self.conn)
            .recompute_counts()
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))
    }

    // === Manual CRUD ===

    /// Adds a bookmark, creating its category nodes if absent.
    pub fn add_bookmark(
        &mut self,
        title: &str,
        url: &str,
        category: &str,
        subcategory: Option<&str>,
        description: Option<&str>,
    ) -> Result<Bookmark, BookmarkError> {
        self.ensure_category(category, subcategory)?;

        let id = Uuid::new_v4().to_string();
        self.conn
            .execute(
                "INSERT INTO bookmarks \
                 (id, title, url, category, subcategory, description, created_at, status) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id,
                    title,
                    url,
                    category,
                    subcategory,
                    description,
                    Self::now(),
                    BookmarkStatus::Unchecked.as_str(),
                ],
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        self.recount()?;
        self.get_bookmark(&id)
    }

    pub fn get_bookmark(&self, id: &str) -> Result<Bookmark, BookmarkError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM bookmarks WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                Self::row_to_bookmark,
            )
            .optional()
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?
            .ok_or_else(|| BookmarkError::NotFound(id.to_string()))
    }

    /// Updates title, url and/or description of an unlocked bookmark.
    pub fn update_bookmark(
        &mut self,
        id: &str,
        title: Option<&str>,
        url: Option<&str>,
        description: Option<&str>,
    ) -> Result<Bookmark, BookmarkError> {
        let current = self.require_unlocked(id)?;

        self.conn
            .execute(
                "UPDATE bookmarks SET title = ?1, url = ?2, description = ?3 WHERE id = ?4",
                params![
                    title.unwrap_or(&current.title),
                    url.unwrap_or(&current.url),
                    description.or(current.description.as_deref()),
                    id,
                ],
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        self.get_bookmark(id)
    }

    /// Deletes an unlocked bookmark.
    pub fn delete_bookmark(&mut self, id: &str) -> Result<(), BookmarkError> {
        self.require_unlocked(id)?;

        self.conn
            .execute("DELETE FROM bookmarks WHERE id = ?1", params![id])
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        self.recount()
    }

    /// Locks a bookmark; the status tag follows the lock flag.
    pub fn lock_bookmark(&mut self, id: &str) -> Result<Bookmark, BookmarkError> {
        let affected = self
            .conn
            .execute(
                "UPDATE bookmarks SET is_locked = 1, status = ?1 WHERE id = ?2",
                params![BookmarkStatus::Locked.as_str(), id],
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        if affected == 0 {
            return Err(BookmarkError::NotFound(id.to_string()));
        }
        self.get_bookmark(id)
    }

    /// Unlocks a bookmark. Its health is unknown again until the next
    /// validation pass.
    pub fn unlock_bookmark(&mut self, id: &str) -> Result<Bookmark, BookmarkError> {
        let affected = self
            .conn
            .execute(
                "UPDATE bookmarks SET is_locked = 0, status = ?1 WHERE id = ?2",
                params![BookmarkStatus::Unchecked.as_str(), id],
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        if affected == 0 {
            return Err(BookmarkError::NotFound(id.to_string()));
        }
        self.get_bookmark(id)
    }

    /// Lists bookmarks, optionally restricted to a category name.
    pub fn list_bookmarks(&self, category: Option<&str>) -> Result<Vec<Bookmark>, BookmarkError> {
        let mut stmt = match category {
            Some(_) => self.conn.prepare(&format!(
                "SELECT {} FROM bookmarks WHERE category = ?1 ORDER BY category, title",
                SELECT_COLUMNS
            )),
            None => self.conn.prepare(&format!(
                "SELECT {} FROM bookmarks ORDER BY category, title",
                SELECT_COLUMNS
            )),
        }
        .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        let rows = match category {
            Some(name) => stmt.query_map(params![name], Self::row_to_bookmark),
            None => stmt.query_map([], Self::row_to_bookmark),
        }
        .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| BookmarkError::DatabaseError(e.to_string()))?);
        }
        Ok(results)
    }

    /// Searches bookmarks by title, URL or description using SQL LIKE.
    pub fn search_bookmarks(&self, query: &str) -> Result<Vec<Bookmark>, BookmarkError> {
        let pattern = format!("%{}%", query);
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM bookmarks \
                 WHERE title LIKE ?1 OR url LIKE ?1 OR description LIKE ?1 \
                 ORDER BY category, title",
                SELECT_COLUMNS
            ))
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        let rows = stmt
            .query_map(params![pattern], Self::row_to_bookmark)
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| BookmarkError::DatabaseError(e.to_string()))?);
        }
        Ok(results)
    }

    // === Import pipeline ===

    /// Imports a raw payload: parse → drop records missing required fields →
    /// collapse in-batch duplicates → persist → recount. An empty but
    /// well-formed payload yields a zero summary, not an error. Duplicates
    /// against already-stored bookmarks are left alone — cross-batch dedup is
    /// the explicit two-phase operation.
    pub fn import_bookmarks(
        &mut self,
        bytes: &[u8],
        format_name: &str,
    ) -> Result<ImportSummary, ImportError> {
        let format = ImportFormat::parse(format_name)?;
        let candidates = self.parser.parse(bytes, format);
        let total_parsed = candidates.len();

        if candidates.is_empty() {
            return Ok(ImportSummary {
                imported: 0,
                total_parsed: 0,
                message: "No bookmarks found in import payload".to_string(),
            });
        }

        let complete: Vec<CandidateBookmark> = candidates
            .into_iter()
            .filter(|candidate| {
                let keep = !candidate.title.trim().is_empty() && !candidate.url.trim().is_empty();
                if !keep {
                    debug!(url = %candidate.url, "dropping candidate missing required fields");
                }
                keep
            })
            .collect();
        let deduped = self.resolver.dedupe_batch(complete);

        let now = Self::now();
        let mut imported = 0;
        for candidate in &deduped {
            self.ensure_category(&candidate.category, candidate.subcategory.as_deref())
                .map_err(|e| ImportError::DatabaseError(e.to_string()))?;
            self.conn
                .execute(
                    "INSERT INTO bookmarks \
                     (id, title, url, category, subcategory, description, created_at, status) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        Uuid::new_v4().to_string(),
                        candidate.title,
                        candidate.url,
                        candidate.category,
                        candidate.subcategory,
                        candidate.description,
                        now,
                        BookmarkStatus::Unchecked.as_str(),
                    ],
                )
                .map_err(|e| ImportError::DatabaseError(e.to_string()))?;
            imported += 1;
        }

        CategoryManager::new(self.conn)
            .recompute_counts()
            .map_err(|e| ImportError::DatabaseError(e.to_string()))?;

        info!(imported, total_parsed, "import finished");
        Ok(ImportSummary {
            imported,
            total_parsed,
            message: format!("Imported {} of {} parsed bookmarks", imported, total_parsed),
        })
    }

    // === Export ===

    /// Renders stored bookmarks (optionally one category) into the requested
    /// format. Unknown format names are a client error.
    pub fn export_bookmarks(
        &self,
        category: Option<&str>,
        format_name: &str,
    ) -> Result<Vec<u8>, ExportError> {
        let format = ExportFormat::parse(format_name)?;
        let bookmarks = self
            .list_bookmarks(category)
            .map_err(|e| ExportError::DatabaseError(e.to_string()))?;
        Ok(self.serializer.export(&bookmarks, format))
    }

    // === Link validation ===

    /// Probes every non-locked bookmark concurrently and records the verdicts.
    /// Loopback URLs are tagged `localhost` without being probed. Timeouts
    /// keep their own status tag; `dead_found` counts every non-Active
    /// verdict.
    pub async fn validate_all_links(&mut self) -> Result<ValidationSummary, BookmarkError> {
        let candidates: Vec<(String, String)> = {
            let mut stmt = self
                .conn
                .prepare("SELECT id, url FROM bookmarks WHERE is_locked = 0")
                .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
                .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
            let mut pairs = Vec::new();
            for row in rows {
                pairs.push(row.map_err(|e| BookmarkError::DatabaseError(e.to_string()))?);
            }
            pairs
        };

        let now = Self::now();
        let mut total_checked = 0;
        let mut dead_found = 0;
        let mut to_probe: Vec<(String, String)> = Vec::new();

        for (id, url) in candidates {
            if is_local_url(&url) {
                self.conn
                    .execute(
                        "UPDATE bookmarks SET status = ?1, last_checked = ?2 WHERE id = ?3",
                        params![BookmarkStatus::Localhost.as_str(), now, id],
                    )
                    .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
                total_checked += 1;
            } else {
                to_probe.push((id, url));
            }
        }

        let verdicts = self
            .validator
            .validate(to_probe.iter().map(|(_, url)| url.clone()).collect())
            .await;

        for (id, url) in to_probe {
            let verdict = verdicts.get(&url).copied().unwrap_or(Verdict::Dead);
            let (status, alive) = match verdict {
                Verdict::Active => (BookmarkStatus::Active, true),
                Verdict::Dead => (BookmarkStatus::Dead, false),
                Verdict::Timeout => (BookmarkStatus::Timeout, false),
            };
            if verdict != Verdict::Active {
                dead_found += 1;
            }
            self.conn
                .execute(
                    "UPDATE bookmarks SET status = ?1, is_alive = ?2, last_checked = ?3 \
                     WHERE id = ?4",
                    params![status.as_str(), alive, now, id],
                )
                .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
            total_checked += 1;
        }

        info!(total_checked, dead_found, "link validation finished");
        Ok(ValidationSummary {
            total_checked,
            dead_found,
        })
    }

    // === Cleanup ===

    /// Purges bookmarks the last validation pass declared dead. Locked
    /// bookmarks and `localhost`/`timeout` tags survive the purge.
    pub fn remove_dead_links(&mut self) -> Result<CleanupSummary, BookmarkError> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM bookmarks WHERE status = ?1 AND is_locked = 0",
                params![BookmarkStatus::Dead.as_str()],
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        self.recount()?;
        info!(removed, "dead-link purge finished");
        Ok(CleanupSummary { removed })
    }

    /// Scans the whole store for normalized-URL duplicate groups and tags
    /// every non-kept, non-locked member `duplicate`. Marks only — deletion
    /// is the separate explicit follow-up so callers can review first.
    pub fn find_duplicates(&mut self) -> Result<DuplicateScan, BookmarkError> {
        let all = self.list_bookmarks(None)?;
        let groups = self.resolver.find_groups(&all);

        let mut marked_count = 0;
        for group in &groups {
            let (_, remove) = self.resolver.resolve(group);
            for bookmark in remove {
                marked_count += self
                    .conn
                    .execute(
                        "UPDATE bookmarks SET status = ?1 WHERE id = ?2 AND is_locked = 0",
                        params![BookmarkStatus::Duplicate.as_str(), bookmark.id],
                    )
                    .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
            }
        }

        Ok(DuplicateScan {
            group_count: groups.len(),
            marked_count,
        })
    }

    /// Deletes bookmarks tagged `duplicate` by a previous scan.
    pub fn delete_marked_duplicates(&mut self) -> Result<CleanupSummary, BookmarkError> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM bookmarks WHERE status = ?1 AND is_locked = 0",
                params![BookmarkStatus::Duplicate.as_str()],
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        self.recount()?;
        Ok(CleanupSummary { removed })
    }

    // === Bulk mutation ===

    /// Moves bookmarks to a target category/subcategory. Locked bookmarks are
    /// skipped; the returned count covers the rows actually moved.
    pub fn move_bookmarks(
        &mut self,
        ids: &[String],
        category: &str,
        subcategory: Option<&str>,
    ) -> Result<MoveSummary, BookmarkError> {
        self.ensure_category(category, subcategory)?;

        let mut moved = 0;
        for id in ids {
            moved += self
                .conn
                .execute(
                    "UPDATE bookmarks SET category = ?1, subcategory = ?2 \
                     WHERE id = ?3 AND is_locked = 0",
                    params![category, subcategory, id],
                )
                .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        }

        self.recount()?;
        Ok(MoveSummary { moved })
    }

    /// Sets a bookmark's status tag, keeping the lock and liveness flags
    /// consistent: `locked` raises the lock flag, any other tag clears it;
    /// `dead`/`timeout` clear the liveness flag, `active` sets it.
    pub fn set_status(&mut self, id: &str, status_tag: &str) -> Result<Bookmark, BookmarkError> {
        let status = BookmarkStatus::parse(status_tag)
            .ok_or_else(|| BookmarkError::InvalidStatus(status_tag.to_string()))?;
        let current = self.get_bookmark(id)?;

        let is_locked = status == BookmarkStatus::Locked;
        let is_alive = match status {
            BookmarkStatus::Active => true,
            BookmarkStatus::Dead | BookmarkStatus::Timeout => false,
            _ => current.is_alive,
        };

        self.conn
            .execute(
                "UPDATE bookmarks SET status = ?1, is_locked = ?2, is_alive = ?3 WHERE id = ?4",
                params![status.as_str(), is_locked, is_alive, id],
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        self.get_bookmark(id)
    }
}
