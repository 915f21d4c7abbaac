//! Export rendering for Linkvault.
//!
//! Renders a bookmark collection into one of four consumer-specific shapes:
//! Netscape bookmark markup, Chrome-style JSON, generic XML, and delimited
//! text. Each renderer round-trips through the matching import parser.

use std::collections::BTreeMap;

use serde_json::json;

use crate::types::bookmark::Bookmark;
use crate::types::import::ExportFormat;

/// Trait defining export rendering operations.
pub trait ExportSerializerTrait {
    fn export(&self, bookmarks: &[Bookmark], format: ExportFormat) -> Vec<u8>;
}

/// Export serializer implementation.
pub struct ExportSerializer;

impl ExportSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExportSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportSerializerTrait for ExportSerializer {
    fn export(&self, bookmarks: &[Bookmark], format: ExportFormat) -> Vec<u8> {
        match format {
            ExportFormat::NetscapeHtml => render_netscape(bookmarks).into_bytes(),
            ExportFormat::ChromeJson => render_chrome_json(bookmarks).into_bytes(),
            ExportFormat::Xml => render_xml(bookmarks).into_bytes(),
            ExportFormat::Csv => render_csv(bookmarks).into_bytes(),
        }
    }
}

/// Groups bookmarks by (category, subcategory) with a stable order.
fn group_by_category(
    bookmarks: &[Bookmark],
) -> BTreeMap<(String, Option<String>), Vec<&Bookmark>> {
    let mut groups: BTreeMap<(String, Option<String>), Vec<&Bookmark>> = BTreeMap::new();
    for bookmark in bookmarks {
        groups
            .entry((bookmark.category.clone(), bookmark.subcategory.clone()))
            .or_default()
            .push(bookmark);
    }
    groups
}

// === Netscape bookmark markup ===

/// Browser-importable markup. Subcategory groups render as `Cat → Sub`
/// headings so the Netscape parser reconstructs both levels on re-import.
fn render_netscape(bookmarks: &[Bookmark]) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE NETSCAPE-Bookmark-file-1>\n");
    out.push_str("<!-- This is an automatically generated file. Do not edit! -->\n");
    out.push_str("<META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=UTF-8\">\n");
    out.push_str("<TITLE>Bookmarks</TITLE>\n");
    out.push_str("<H1>Bookmarks</H1>\n");
    out.push_str("<DL><p>\n");

    for ((category, subcategory), members) in group_by_category(bookmarks) {
        let heading = match &subcategory {
            Some(sub) => format!("{} → {}", category, sub),
            None => category.clone(),
        };
        out.push_str(&format!("    <DT><H3>{}</H3>\n", escape_markup(&heading)));
        out.push_str("    <DL><p>\n");
        for bookmark in members {
            out.push_str(&format!(
                "        <DT><A HREF=\"{}\" ADD_DATE=\"{}\">{}</A>\n",
                escape_markup(&bookmark.url),
                bookmark.created_at,
                escape_markup(&bookmark.title),
            ));
        }
        out.push_str("    </DL><p>\n");
    }

    out.push_str("</DL><p>\n");
    out
}

// === Chrome-style JSON ===

/// Chrome's three-root layout: one synthetic folder per category nested
/// under `bookmark_bar`, sequential numeric string ids throughout.
fn render_chrome_json(bookmarks: &[Bookmark]) -> String {
    let mut next_id: u64 = 1;
    let mut take_id = move || {
        let id = next_id;
        next_id += 1;
        id.to_string()
    };

    // category → (direct urls, subcategory → urls)
    let mut tree: BTreeMap<String, (Vec<&Bookmark>, BTreeMap<String, Vec<&Bookmark>>)> =
        BTreeMap::new();
    for bookmark in bookmarks {
        let entry = tree.entry(bookmark.category.clone()).or_default();
        match &bookmark.subcategory {
            Some(sub) => entry.1.entry(sub.clone()).or_default().push(bookmark),
            None => entry.0.push(bookmark),
        }
    }

    let url_node = |bookmark: &Bookmark, id: String| {
        json!({
            "date_added": bookmark.created_at.to_string(),
            "id": id,
            "name": bookmark.title,
            "type": "url",
            "url": bookmark.url,
        })
    };

    let bar_id = take_id();
    let other_id = take_id();
    let synced_id = take_id();

    let mut category_folders = Vec::new();
    for (category, (direct, subs)) in &tree {
        let folder_id = take_id();
        let mut children: Vec<serde_json::Value> = direct
            .iter()
            .map(|bookmark| url_node(bookmark, take_id()))
            .collect();
        for (sub, members) in subs {
            let sub_id = take_id();
            let sub_children: Vec<serde_json::Value> = members
                .iter()
                .map(|bookmark| url_node(bookmark, take_id()))
                .collect();
            children.push(json!({
                "children": sub_children,
                "id": sub_id,
                "name": sub,
                "type": "folder",
            }));
        }
        category_folders.push(json!({
            "children": children,
            "id": folder_id,
            "name": category,
            "type": "folder",
        }));
    }

    let document = json!({
        "checksum": "",
        "version": 1,
        "roots": {
            "bookmark_bar": {
                "children": category_folders,
                "id": bar_id,
                "name": "Bookmarks bar",
                "type": "folder",
            },
            "other": {
                "children": [],
                "id": other_id,
                "name": "Other bookmarks",
                "type": "folder",
            },
            "synced": {
                "children": [],
                "id": synced_id,
                "name": "Mobile bookmarks",
                "type": "folder",
            },
        },
    });

    serde_json::to_string_pretty(&document).unwrap_or_else(|_| "{}".to_string())
}

// === XML ===

/// One `<bookmark>` element per bookmark; subcategory, description and
/// last-checked children are emitted only when present.
fn render_xml(bookmarks: &[Bookmark]) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<bookmarks>\n");
    for bookmark in bookmarks {
        out.push_str("  <bookmark>\n");
        out.push_str(&format!(
            "    <title>{}</title>\n",
            escape_markup(&bookmark.title)
        ));
        out.push_str(&format!("    <url>{}</url>\n", escape_markup(&bookmark.url)));
        out.push_str(&format!(
            "    <category>{}</category>\n",
            escape_markup(&bookmark.category)
        ));
        if let Some(sub) = &bookmark.subcategory {
            out.push_str(&format!(
                "    <subcategory>{}</subcategory>\n",
                escape_markup(sub)
            ));
        }
        if let Some(description) = &bookmark.description {
            out.push_str(&format!(
                "    <description>{}</description>\n",
                escape_markup(description)
            ));
        }
        if let Some(last_checked) = bookmark.last_checked {
            out.push_str(&format!(
                "    <last_checked>{}</last_checked>\n",
                last_checked
            ));
        }
        out.push_str("  </bookmark>\n");
    }
    out.push_str("</bookmarks>\n");
    out
}

// === Delimited text ===

/// Fixed 8-column header matching the delimited import parser's synonyms.
const CSV_HEADER: &str = "title,url,category,subcategory,description,created_at,status,is_alive";

fn render_csv(bookmarks: &[Bookmark]) -> String {
    let mut out = String::new();
    out.push_str(CSV_HEADER);
    out.push('\n');
    for bookmark in bookmarks {
        let row = [
            quote_csv(&bookmark.title),
            quote_csv(&bookmark.url),
            quote_csv(&bookmark.category),
            quote_csv(bookmark.subcategory.as_deref().unwrap_or("")),
            quote_csv(bookmark.description.as_deref().unwrap_or("")),
            bookmark.created_at.to_string(),
            bookmark.status.as_str().to_string(),
            bookmark.is_alive.to_string(),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Quotes a field when it contains a delimiter, quote, or newline.
fn quote_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Escapes text for both the Netscape markup and XML renderers.
fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
