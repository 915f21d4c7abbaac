//! App core for Linkvault.
//!
//! Central struct holding the database handle and validator settings,
//! managing application lifecycle.

use std::sync::Arc;

use crate::database::connection::Database;
use crate::services::link_validator::ValidatorConfig;

/// Central application struct.
///
/// `BookmarkStore` and `CategoryManager` are created on-demand via
/// `db.connection()` because they borrow the connection with a lifetime
/// parameter.
pub struct App {
    pub db: Arc<Database>,
    pub validator_config: ValidatorConfig,
}

impl App {
    /// Creates a new App backed by a database file.
    ///
    /// Use `db.connection()` to create managers on demand via
    /// `BookmarkStore::with_config(app.db.connection(), app.validator_config.clone())`.
    pub fn new(db_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(Database::open(db_path)?);
        Ok(Self {
            db,
            validator_config: ValidatorConfig::default(),
        })
    }

    /// Creates a new App backed by an in-memory database. Useful for demos
    /// and tests.
    pub fn new_in_memory() -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(Database::open_in_memory()?);
        Ok(Self {
            db,
            validator_config: ValidatorConfig::default(),
        })
    }
}
