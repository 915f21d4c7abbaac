//! Linkvault — a personal bookmark manager.
//!
//! Entry point: runs a console demo of the import/export pipeline against an
//! in-memory database. Point `LINKVAULT_DB` at a file path to persist.

use linkvault::app::App;
use linkvault::managers::bookmark_store::BookmarkStore;
use linkvault::managers::category_manager::{CategoryManager, CategoryManagerTrait};
use tracing_subscriber::EnvFilter;

const SAMPLE_IMPORT: &str = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<DL><p>
    <DT><H3>Dev → Tools</H3>
    <DL><p>
        <DT><A HREF="https://github.com" ADD_DATE="1700000000">GitHub</A>
        <DT><A HREF="https://crates.io" ADD_DATE="1700000000">crates.io</A>
    </DL><p>
    <DT><H3>Reading</H3>
    <DL><p>
        <DT><A HREF="https://this-week-in-rust.org" ADD_DATE="1700000000">This Week in Rust</A>
    </DL><p>
</DL><p>
"#;

// a second batch whose crates.io entry duplicates the first import
const SAMPLE_CSV: &str = "Name,Link,Folder\ncrates.io mirror,https://WWW.crates.io/,Reading\n";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let app = match std::env::var("LINKVAULT_DB") {
        Ok(path) => App::new(&path),
        Err(_) => App::new_in_memory(),
    }
    .expect("failed to open database");

    let mut store = BookmarkStore::with_config(app.db.connection(), app.validator_config.clone());

    let summary = store
        .import_bookmarks(SAMPLE_IMPORT.as_bytes(), "netscape")
        .expect("sample import failed");
    println!("{}", summary.message);

    let summary = store
        .import_bookmarks(SAMPLE_CSV.as_bytes(), "csv")
        .expect("sample CSV import failed");
    println!("{}", summary.message);

    let scan = store.find_duplicates().expect("duplicate scan failed");
    println!(
        "Duplicate scan: {} group(s), {} bookmark(s) marked",
        scan.group_count, scan.marked_count
    );

    let categories = CategoryManager::new(app.db.connection())
        .list_categories()
        .expect("listing categories failed");
    println!("Categories:");
    for category in categories {
        match category.parent {
            Some(parent) => println!(
                "  {} → {} ({} bookmarks)",
                parent, category.name, category.bookmark_count
            ),
            None => println!("  {} ({} bookmarks)", category.name, category.bookmark_count),
        }
    }

    let csv = store
        .export_bookmarks(None, "csv")
        .expect("CSV export failed");
    println!();
    println!("{}", String::from_utf8_lossy(&csv));
}
