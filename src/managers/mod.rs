// Linkvault state managers
// Managers handle stateful operations against the database: the category
// tree and the bookmark store orchestrator.

pub mod bookmark_store;
pub mod category_manager;
