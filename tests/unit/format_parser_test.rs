//! Unit tests for the import format parsers.
//!
//! Each format gets well-formed, malformed and edge-case payloads; the parser
//! must salvage whatever it can and never fail outright.

use linkvault::services::format_parser::{FormatParser, FormatParserTrait};
use linkvault::types::import::ImportFormat;
use rstest::rstest;

fn parse(bytes: &str, format: ImportFormat) -> Vec<linkvault::types::import::CandidateBookmark> {
    FormatParser::new().parse(bytes.as_bytes(), format)
}

// === Netscape markup ===

#[test]
fn netscape_headings_set_category_and_anchors_follow() {
    let html = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<DL><p>
    <DT><H3>Dev</H3>
    <DL><p>
        <DT><A HREF="https://github.com" ADD_DATE="1700000000">GitHub</A>
        <DT><A HREF="https://crates.io">crates.io</A>
    </DL><p>
</DL><p>"#;

    let parsed = parse(html, ImportFormat::NetscapeHtml);
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].title, "GitHub");
    assert_eq!(parsed[0].url, "https://github.com");
    assert_eq!(parsed[0].category, "Dev");
    assert_eq!(parsed[0].subcategory, None);
    assert_eq!(parsed[1].title, "crates.io");
}

#[rstest]
#[case("Dev → Tools")]
#[case("Dev -> Tools")]
#[case("  Dev →   Tools  ")]
fn netscape_arrow_heading_splits_category_and_subcategory(#[case] heading: &str) {
    let html = format!(
        r#"<DT><H3>{}</H3>
<DL><p><DT><A HREF="https://github.com">GitHub</A></DL><p>"#,
        heading
    );

    let parsed = parse(&html, ImportFormat::NetscapeHtml);
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].category, "Dev");
    assert_eq!(parsed[0].subcategory.as_deref(), Some("Tools"));
}

#[test]
fn netscape_plain_heading_clears_subcategory() {
    let html = r#"
<DT><H3>Dev → Tools</H3>
<DL><p><DT><A HREF="https://github.com">GitHub</A></DL><p>
<DT><H3>Reading</H3>
<DL><p><DT><A HREF="https://example.com">Example</A></DL><p>"#;

    let parsed = parse(html, ImportFormat::NetscapeHtml);
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[1].category, "Reading");
    assert_eq!(parsed[1].subcategory, None);
}

#[test]
fn netscape_skips_non_http_anchors() {
    let html = r#"
<DT><A HREF="ftp://old.example.com/file">FTP thing</A>
<DT><A HREF="javascript:void(0)">Bookmarklet</A>
<DT><A HREF="place:sort=8">Firefox internal</A>
<DT><A HREF="https://example.com">Kept</A>"#;

    let parsed = parse(html, ImportFormat::NetscapeHtml);
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].url, "https://example.com");
}

#[test]
fn netscape_unescapes_entities() {
    let html = r#"<DT><A HREF="https://example.com/?a=1&amp;b=2">Ben &amp; Jerry &lt;3</A>"#;

    let parsed = parse(html, ImportFormat::NetscapeHtml);
    assert_eq!(parsed[0].url, "https://example.com/?a=1&b=2");
    assert_eq!(parsed[0].title, "Ben & Jerry <3");
}

#[test]
fn netscape_salvages_around_unclosed_anchor() {
    // the second anchor is never closed; the first must still come through
    let html = r#"
<DT><A HREF="https://good.example.com">Good</A>
<DT><A HREF="https://bad.example.com">Never closed"#;

    let parsed = parse(html, ImportFormat::NetscapeHtml);
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].url, "https://good.example.com");
}

#[test]
fn netscape_uppercase_tags_are_recognized() {
    let html = r#"<DT><H3>DEV</H3><DL><DT><A HREF="https://x.example.com">X</A></DL>"#
        .to_uppercase()
        .replace("HTTPS://X.EXAMPLE.COM", "https://x.example.com");

    let parsed = parse(&html, ImportFormat::NetscapeHtml);
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].category, "DEV");
}

// === JSON dialects ===

#[test]
fn json_firefox_tree_with_reserved_roots() {
    let json = r#"{
      "title": "",
      "children": [
        {
          "title": "Bookmarks Menu",
          "children": [
            { "title": "Rust", "children": [
              { "title": "The Book", "uri": "https://doc.rust-lang.org/book/" }
            ]}
          ]
        }
      ]
    }"#;

    let parsed = parse(json, ImportFormat::Json);
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].title, "The Book");
    assert_eq!(parsed[0].category, "Rust");
    assert_eq!(parsed[0].subcategory, None);
}

#[test]
fn json_firefox_nested_folder_becomes_subcategory() {
    let json = r#"{
      "title": "",
      "children": [
        { "title": "Dev", "children": [
          { "title": "Tools", "children": [
            { "title": "GitHub", "uri": "https://github.com" }
          ]}
        ]}
      ]
    }"#;

    let parsed = parse(json, ImportFormat::Json);
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].category, "Dev");
    assert_eq!(parsed[0].subcategory.as_deref(), Some("Tools"));
}

#[test]
fn json_chrome_roots_walked_with_folders_as_categories() {
    let json = r#"{
      "checksum": "abc",
      "version": 1,
      "roots": {
        "bookmark_bar": {
          "name": "Bookmarks bar",
          "type": "folder",
          "children": [
            { "name": "News", "type": "folder", "children": [
              { "name": "Lobsters", "type": "url", "url": "https://lobste.rs" }
            ]}
          ]
        },
        "other": { "name": "Other bookmarks", "type": "folder", "children": [] }
      }
    }"#;

    let parsed = parse(json, ImportFormat::Json);
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].title, "Lobsters");
    assert_eq!(parsed[0].category, "News");
}

#[test]
fn json_flat_title_urlstring_list() {
    let json = r#"[
      { "Title": "Example", "URLString": "https://example.com" },
      { "Title": "Another", "URLString": "https://another.example.com" }
    ]"#;

    let parsed = parse(json, ImportFormat::Json);
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].title, "Example");
    assert_eq!(parsed[1].url, "https://another.example.com");
}

#[test]
fn json_generic_fallback_walker() {
    let json = r#"{
      "name": "Saved",
      "items": [
        { "name": "Example", "url": "https://example.com" },
        { "title": "Titled", "url": "https://titled.example.com" }
      ]
    }"#;

    let parsed = parse(json, ImportFormat::Json);
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].category, "Saved");
}

#[test]
fn json_invalid_payload_yields_empty() {
    let parsed = parse("{not json at all", ImportFormat::Json);
    assert!(parsed.is_empty());
}

// === XML ===

#[test]
fn xml_bookmark_elements_parsed_with_all_children() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<bookmarks>
  <bookmark>
    <title>GitHub</title>
    <url>https://github.com</url>
    <category>Dev</category>
    <subcategory>Tools</subcategory>
    <description>Code hosting</description>
  </bookmark>
  <bookmark>
    <title>No URL — must be dropped</title>
    <url></url>
  </bookmark>
</bookmarks>"#;

    let parsed = parse(xml, ImportFormat::Xml);
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].title, "GitHub");
    assert_eq!(parsed[0].category, "Dev");
    assert_eq!(parsed[0].subcategory.as_deref(), Some("Tools"));
    assert_eq!(parsed[0].description.as_deref(), Some("Code hosting"));
}

#[test]
fn xml_falls_back_to_item_elements() {
    let xml = r#"<feed>
  <item><name>Example</name><href>https://example.com</href></item>
  <item><name>Empty</name><href></href></item>
</feed>"#;

    let parsed = parse(xml, ImportFormat::Xml);
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].title, "Example");
    assert_eq!(parsed[0].url, "https://example.com");
}

#[test]
fn xml_unescapes_entities() {
    let xml = r#"<bookmarks><bookmark>
      <title>Q&amp;A</title>
      <url>https://example.com/?q=rust&amp;page=1</url>
      <category>Reading</category>
    </bookmark></bookmarks>"#;

    let parsed = parse(xml, ImportFormat::Xml);
    assert_eq!(parsed[0].title, "Q&A");
    assert_eq!(parsed[0].url, "https://example.com/?q=rust&page=1");
}

// === Delimited text ===

#[test]
fn csv_standard_header_maps_all_fields() {
    let csv = "title,url,category,subcategory,description\n\
               GitHub,https://github.com,Dev,Tools,Code hosting\n";

    let parsed = parse(csv, ImportFormat::Csv);
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].title, "GitHub");
    assert_eq!(parsed[0].subcategory.as_deref(), Some("Tools"));
    assert_eq!(parsed[0].description.as_deref(), Some("Code hosting"));
}

#[rstest]
#[case("Name,Link,Folder")]
#[case("name,href,group")]
#[case("Bookmark Name,Address,Tag")]
fn csv_synonym_headers_still_map(#[case] header: &str) {
    let csv = format!("{}\nGitHub,https://github.com,Dev\n", header);

    let parsed = parse(&csv, ImportFormat::Csv);
    assert_eq!(parsed.len(), 1, "header '{}' should map", header);
    assert_eq!(parsed[0].title, "GitHub");
    assert_eq!(parsed[0].url, "https://github.com");
    assert_eq!(parsed[0].category, "Dev");
}

#[test]
fn csv_rows_without_url_are_skipped() {
    let csv = "title,url\nHas URL,https://example.com\nNo URL,\n";

    let parsed = parse(csv, ImportFormat::Csv);
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].title, "Has URL");
}

#[test]
fn csv_schemeless_url_defaults_to_https() {
    let csv = "title,url\nExample,example.com/page\n";

    let parsed = parse(csv, ImportFormat::Csv);
    assert_eq!(parsed[0].url, "https://example.com/page");
}

#[test]
fn csv_quoted_fields_with_commas_and_quotes() {
    let csv = "title,url,description\n\
               \"Rust, the language\",https://rust-lang.org,\"He said \"\"hi\"\"\"\n";

    let parsed = parse(csv, ImportFormat::Csv);
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].title, "Rust, the language");
    assert_eq!(parsed[0].description.as_deref(), Some("He said \"hi\""));
}

#[test]
fn csv_without_url_column_yields_empty() {
    let csv = "title,notes\nSomething,whatever\n";
    let parsed = parse(csv, ImportFormat::Csv);
    assert!(parsed.is_empty());
}
