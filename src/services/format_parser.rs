//! Import format parsing for Linkvault.
//!
//! Decodes raw import payloads in one of four formats — Netscape bookmark
//! markup, several browser JSON dialects, generic XML, and delimited text —
//! into a flat list of candidate bookmarks. Parsing never fails: malformed
//! records are logged and skipped so one corrupt entry cannot abort a whole
//! import.

use serde_json::Value;
use tracing::{debug, warn};

use crate::types::category::Category;
use crate::types::import::{CandidateBookmark, ImportFormat};

/// Trait defining import parsing operations.
pub trait FormatParserTrait {
    /// Decodes `bytes` as `format`, salvaging whatever records it can.
    fn parse(&self, bytes: &[u8], format: ImportFormat) -> Vec<CandidateBookmark>;
}

/// Format parser implementation.
pub struct FormatParser;

impl FormatParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FormatParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatParserTrait for FormatParser {
    fn parse(&self, bytes: &[u8], format: ImportFormat) -> Vec<CandidateBookmark> {
        let text = String::from_utf8_lossy(bytes);
        let parsed = match format {
            ImportFormat::NetscapeHtml => parse_netscape(&text),
            ImportFormat::Json => parse_json(&text),
            ImportFormat::Xml => parse_xml(&text),
            ImportFormat::Csv => parse_csv(&text),
        };
        debug!(count = parsed.len(), ?format, "parsed import payload");
        parsed
    }
}

// === Netscape bookmark markup ===

/// Walks `<H3>` headings and `<A>` anchors in document order. A heading
/// containing an arrow separator (`→` or `->`) names a category/subcategory
/// pair; any other heading sets the category and clears the subcategory.
/// Only `http(s)` anchors are kept.
fn parse_netscape(html: &str) -> Vec<CandidateBookmark> {
    let mut out = Vec::new();
    let mut category = Category::UNCATEGORIZED.to_string();
    let mut subcategory: Option<String> = None;

    let mut pos = 0;
    loop {
        let next_heading = find_tag(html, pos, "h3");
        let next_anchor = find_tag(html, pos, "a");
        let (idx, is_heading) = match (next_heading, next_anchor) {
            (None, None) => break,
            (Some(h), None) => (h, true),
            (None, Some(a)) => (a, false),
            (Some(h), Some(a)) => {
                if h < a {
                    (h, true)
                } else {
                    (a, false)
                }
            }
        };

        let Some(open_len) = html[idx..].find('>') else {
            break;
        };
        let content_start = idx + open_len + 1;
        let close = if is_heading { "</h3>" } else { "</a>" };
        let Some(close_idx) = find_ci(html, content_start, close) else {
            // unterminated element; nothing more can be salvaged
            break;
        };
        let text = unescape_entities(html[content_start..close_idx].trim());

        if is_heading {
            match split_heading(&text) {
                Some((cat, sub)) => {
                    category = cat;
                    subcategory = Some(sub);
                }
                None => {
                    if !text.is_empty() {
                        category = text;
                    }
                    subcategory = None;
                }
            }
        } else {
            match extract_attr(&html[idx..content_start], "href") {
                Some(href) if has_http_scheme(&href) => {
                    let url = unescape_entities(&href);
                    out.push(CandidateBookmark {
                        // may be empty; the store discards records missing
                        // required fields at the parsed stage
                        title: text,
                        url,
                        category: category.clone(),
                        subcategory: subcategory.clone(),
                        description: None,
                    });
                }
                Some(href) => debug!(href = %href, "skipping non-http anchor"),
                None => debug!("skipping anchor without href"),
            }
        }

        pos = close_idx + close.len();
    }

    out
}

/// Splits heading text at the first arrow separator, if both halves are
/// non-empty.
fn split_heading(text: &str) -> Option<(String, String)> {
    let (left, right) = text
        .split_once('→')
        .or_else(|| text.split_once("->"))?;
    let (left, right) = (left.trim(), right.trim());
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some((left.to_string(), right.to_string()))
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.trim_start().to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

// === JSON dialects ===

/// Root container names that hold bookmarks without being categories
/// themselves. Children of these folders inherit the surrounding category.
const RESERVED_FOLDERS: &[&str] = &[
    "",
    "menu",
    "toolbar",
    "unfiled",
    "mobile",
    "bookmarks menu",
    "bookmarks toolbar",
    "bookmarks bar",
    "other bookmarks",
    "mobile bookmarks",
];

fn is_reserved_folder(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    RESERVED_FOLDERS.iter().any(|reserved| *reserved == lower)
}

/// Detects the JSON dialect and dispatches to its walker. Detection order is
/// significant and fixed: Firefox tree, Chrome roots, Safari flat list, then
/// a generic fallback walker.
fn parse_json(raw: &str) -> Vec<CandidateBookmark> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            warn!("import payload is not valid JSON: {}", err);
            return Vec::new();
        }
    };

    let mut out = Vec::new();
    if value.get("children").is_some() && value.get("title").is_some() {
        walk_firefox(&value, None, None, &mut out);
    } else if value.get("roots").map_or(false, Value::is_object) {
        if let Some(roots) = value.get("roots").and_then(Value::as_object) {
            for root in roots.values() {
                walk_chrome(root, None, None, true, &mut out);
            }
        }
    } else if is_flat_list(&value) {
        if let Some(items) = value.as_array() {
            for item in items {
                let url = item
                    .get("URLString")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if url.trim().is_empty() {
                    continue;
                }
                let title = item
                    .get("Title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                out.push(CandidateBookmark {
                    title,
                    url: url.to_string(),
                    category: Category::UNCATEGORIZED.to_string(),
                    subcategory: None,
                    description: None,
                });
            }
        }
    } else {
        walk_generic(&value, None, None, &mut out);
    }
    out
}

/// Every element is an object carrying a `Title`/`URLString` pair.
fn is_flat_list(value: &Value) -> bool {
    match value.as_array() {
        Some(items) if !items.is_empty() => items
            .iter()
            .all(|item| item.get("URLString").is_some() && item.get("Title").is_some()),
        _ => false,
    }
}

/// Firefox backup tree: folder nodes hold `children`, leaves hold `uri` (or
/// `url`). Reserved root containers are skipped — their children inherit the
/// surrounding category instead of becoming a new one.
fn walk_firefox(
    node: &Value,
    category: Option<&str>,
    subcategory: Option<&str>,
    out: &mut Vec<CandidateBookmark>,
) {
    if let Some(children) = node.get("children").and_then(Value::as_array) {
        let title = node.get("title").and_then(Value::as_str).unwrap_or("");
        let (next_category, next_sub) = if is_reserved_folder(title) {
            (category, subcategory)
        } else if category.is_none() {
            (Some(title), None)
        } else {
            (category, Some(title))
        };
        for child in children {
            walk_firefox(child, next_category, next_sub, out);
        }
        return;
    }

    let uri = node
        .get("uri")
        .or_else(|| node.get("url"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    if !has_http_scheme(uri) {
        return;
    }
    let title = node.get("title").and_then(Value::as_str).unwrap_or_default();
    out.push(CandidateBookmark {
        title: title.to_string(),
        url: uri.to_string(),
        category: category.unwrap_or(Category::UNCATEGORIZED).to_string(),
        subcategory: subcategory.map(str::to_string),
        description: None,
    });
}

/// Chrome `roots` tree: folder nodes are keyed by `children` + `name`,
/// leaves carry `type == "url"`. The top node of each named root is a
/// container, not a category.
fn walk_chrome(
    node: &Value,
    category: Option<&str>,
    subcategory: Option<&str>,
    is_root: bool,
    out: &mut Vec<CandidateBookmark>,
) {
    if node.get("type").and_then(Value::as_str) == Some("url") {
        let url = node.get("url").and_then(Value::as_str).unwrap_or_default();
        if !has_http_scheme(url) {
            return;
        }
        let name = node.get("name").and_then(Value::as_str).unwrap_or_default();
        out.push(CandidateBookmark {
            title: name.to_string(),
            url: url.to_string(),
            category: category.unwrap_or(Category::UNCATEGORIZED).to_string(),
            subcategory: subcategory.map(str::to_string),
            description: None,
        });
        return;
    }

    if let Some(children) = node.get("children").and_then(Value::as_array) {
        let name = node.get("name").and_then(Value::as_str).unwrap_or("");
        let (next_category, next_sub) = if is_root || is_reserved_folder(name) {
            (category, subcategory)
        } else if category.is_none() {
            (Some(name), None)
        } else {
            (category, Some(name))
        };
        for child in children {
            walk_chrome(child, next_category, next_sub, false, out);
        }
    }
}

/// Fallback tree walker over `name`/`title` and `url` keys for JSON shapes no
/// specific dialect claims.
fn walk_generic(
    value: &Value,
    category: Option<&str>,
    subcategory: Option<&str>,
    out: &mut Vec<CandidateBookmark>,
) {
    match value {
        Value::Array(items) => {
            for item in items {
                walk_generic(item, category, subcategory, out);
            }
        }
        Value::Object(map) => {
            let label = map
                .get("name")
                .or_else(|| map.get("title"))
                .and_then(Value::as_str);
            let url = map
                .get("url")
                .or_else(|| map.get("uri"))
                .and_then(Value::as_str);

            if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
                out.push(CandidateBookmark {
                    title: label.unwrap_or_default().to_string(),
                    url: url.to_string(),
                    category: category.unwrap_or(Category::UNCATEGORIZED).to_string(),
                    subcategory: subcategory.map(str::to_string),
                    description: None,
                });
                return;
            }

            let (next_category, next_sub) = match label.filter(|l| !l.trim().is_empty()) {
                None => (category, subcategory),
                Some(label) if category.is_none() => (Some(label), None),
                Some(label) => (category, Some(label)),
            };
            for child in map.values() {
                if child.is_array() || child.is_object() {
                    walk_generic(child, next_category, next_sub, out);
                }
            }
        }
        _ => {}
    }
}

// === XML ===

/// Scans repeated `<bookmark>` elements with `title`/`url`/`category`/
/// `subcategory`/`description` children; falls back to `<item>` elements with
/// `name`/`href` when no `<bookmark>` is present. Records without a non-empty
/// URL are dropped.
fn parse_xml(xml: &str) -> Vec<CandidateBookmark> {
    let mut out = Vec::new();

    for block in element_blocks(xml, "bookmark") {
        let url = element_text(block, "url").unwrap_or_default();
        if url.trim().is_empty() {
            debug!("skipping <bookmark> element without url");
            continue;
        }
        let title = element_text(block, "title").unwrap_or_default();
        out.push(CandidateBookmark {
            title,
            url,
            category: element_text(block, "category")
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| Category::UNCATEGORIZED.to_string()),
            subcategory: element_text(block, "subcategory").filter(|s| !s.trim().is_empty()),
            description: element_text(block, "description").filter(|d| !d.trim().is_empty()),
        });
    }

    if !out.is_empty() {
        return out;
    }

    // secondary shape: <item><name>…</name><href>…</href></item>
    for block in element_blocks(xml, "item") {
        let url = element_text(block, "href").unwrap_or_default();
        if url.trim().is_empty() {
            continue;
        }
        let title = element_text(block, "name").unwrap_or_default();
        out.push(CandidateBookmark {
            title,
            url,
            category: Category::UNCATEGORIZED.to_string(),
            subcategory: None,
            description: None,
        });
    }

    out
}

/// Returns the inner slices of every `<name>…</name>` element.
fn element_blocks<'a>(xml: &'a str, name: &str) -> Vec<&'a str> {
    let close = format!("</{}>", name);
    let mut blocks = Vec::new();
    let mut pos = 0;
    while let Some(idx) = find_tag(xml, pos, name) {
        let Some(open_len) = xml[idx..].find('>') else {
            break;
        };
        let content_start = idx + open_len + 1;
        let Some(close_idx) = find_ci(xml, content_start, &close) else {
            break;
        };
        blocks.push(&xml[content_start..close_idx]);
        pos = close_idx + close.len();
    }
    blocks
}

/// Extracts the text of the first `<name>…</name>` child, entities unescaped.
fn element_text(block: &str, name: &str) -> Option<String> {
    let idx = find_tag(block, 0, name)?;
    let open_len = block[idx..].find('>')?;
    let content_start = idx + open_len + 1;
    let close = format!("</{}>", name);
    let close_idx = find_ci(block, content_start, &close)?;
    Some(unescape_entities(block[content_start..close_idx].trim()))
}

// === Delimited text ===

/// Column indexes resolved from a synonym-tolerant header row.
struct ColumnMap {
    title: Option<usize>,
    url: Option<usize>,
    category: Option<usize>,
    subcategory: Option<usize>,
    description: Option<usize>,
}

const TITLE_SYNONYMS: &[&str] = &["title", "name", "bookmark name"];
const URL_SYNONYMS: &[&str] = &["url", "link", "href", "address"];
const CATEGORY_SYNONYMS: &[&str] = &["category", "folder", "group", "tag"];
const SUBCATEGORY_SYNONYMS: &[&str] = &["subcategory", "subfolder", "subgroup", "sub category"];
const DESCRIPTION_SYNONYMS: &[&str] = &["description", "notes", "comment", "desc"];

fn map_header(header: &[String]) -> ColumnMap {
    let find = |synonyms: &[&str]| {
        header.iter().position(|cell| {
            let cell = cell.trim().to_lowercase();
            synonyms.iter().any(|synonym| *synonym == cell)
        })
    };
    ColumnMap {
        title: find(TITLE_SYNONYMS),
        url: find(URL_SYNONYMS),
        category: find(CATEGORY_SYNONYMS),
        subcategory: find(SUBCATEGORY_SYNONYMS),
        description: find(DESCRIPTION_SYNONYMS),
    }
}

/// Parses delimited text with a header row. Exporter conventions vary, so the
/// header is matched case-insensitively against per-field synonym sets. Rows
/// without a URL are skipped; scheme-less URLs default to `https://`.
fn parse_csv(input: &str) -> Vec<CandidateBookmark> {
    let records = parse_csv_records(input);
    if records.is_empty() {
        return Vec::new();
    }

    let columns = map_header(&records[0]);
    let Some(url_column) = columns.url else {
        warn!("delimited import has no recognizable URL column");
        return Vec::new();
    };

    let cell = |record: &[String], index: Option<usize>| -> Option<String> {
        index
            .and_then(|i| record.get(i))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let mut out = Vec::new();
    for record in &records[1..] {
        let Some(mut url) = cell(record, Some(url_column)) else {
            debug!("skipping delimited row without url");
            continue;
        };
        if !url.contains("://") {
            url = format!("https://{}", url);
        }
        let title = cell(record, columns.title).unwrap_or_default();
        out.push(CandidateBookmark {
            title,
            url,
            category: cell(record, columns.category)
                .unwrap_or_else(|| Category::UNCATEGORIZED.to_string()),
            subcategory: cell(record, columns.subcategory),
            description: cell(record, columns.description),
        });
    }
    out
}

/// Minimal RFC-style record reader: quoted fields may contain commas,
/// doubled quotes, and newlines. Blank records are dropped.
fn parse_csv_records(input: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                if record.iter().any(|value| !value.trim().is_empty()) {
                    records.push(std::mem::take(&mut record));
                } else {
                    record.clear();
                }
            }
            _ => field.push(ch),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        if record.iter().any(|value| !value.trim().is_empty()) {
            records.push(record);
        }
    }
    records
}

// === Shared scanning helpers ===

/// ASCII case-insensitive substring search starting at `from`. Works on the
/// original string so returned indexes stay valid for slicing.
fn find_ci(haystack: &str, from: usize, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let ned = needle.as_bytes();
    if ned.is_empty() || from >= hay.len() || hay.len() < ned.len() {
        return None;
    }
    let mut i = from;
    while i + ned.len() <= hay.len() {
        if hay[i..i + ned.len()].eq_ignore_ascii_case(ned) {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Finds the next `<name…` tag open, requiring a delimiter after the tag name
/// so `<a` does not match `<abbr`.
fn find_tag(haystack: &str, from: usize, name: &str) -> Option<usize> {
    let open = format!("<{}", name);
    let mut search = from;
    while let Some(idx) = find_ci(haystack, search, &open) {
        match haystack.as_bytes().get(idx + open.len()) {
            Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') | Some(b'/') => {
                return Some(idx)
            }
            _ => search = idx + open.len(),
        }
    }
    None
}

/// Extracts a quoted attribute value from a tag's open slice,
/// case-insensitively.
fn extract_attr(tag: &str, name: &str) -> Option<String> {
    let idx = find_ci(tag, 0, name)?;
    let rest = &tag[idx + name.len()..];
    let eq = rest.find('=')?;
    let after_eq = rest[eq + 1..].trim_start();
    let quote = after_eq.chars().next()?;
    if quote != '"' && quote != '\'' {
        // unquoted value: read to the next whitespace or tag end
        let end = after_eq
            .find(|c: char| c.is_ascii_whitespace() || c == '>')
            .unwrap_or(after_eq.len());
        return Some(after_eq[..end].to_string());
    }
    let inner = &after_eq[quote.len_utf8()..];
    let end = inner.find(quote)?;
    Some(inner[..end].to_string())
}

/// Decodes the handful of entities browser exports actually emit.
fn unescape_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
