//! Pattern-based extraction of the search results table
//!
//! Not a DOM parser. The page is cut down in stages (locate the table,
//! split rows, split cells, decode cell text) and each row is read by
//! fixed column position. Everything that depends on the site's markup
//! lives in [`TableLayout`].

use chrono::Local;
use regex::Regex;
use std::sync::LazyLock;

use crate::error::{ProviderError, Result};
use crate::log::Diagnostics;
use crate::normalize::{parse_date_at, timestamp_to_iso, to_iso};
use crate::types::RawTorrent;

static ANY_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<table([^>]*)>(.*?)</table>").unwrap());
static ID_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)\bid="([^"]*)""#).unwrap());
static TABLE_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tbody[^>]*>(.*?)</tbody>").unwrap());
static ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr(?:\s[^>]*)?>(.*?)</tr>").unwrap());
static CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<t[dh](?:\s[^>]*)?>(.*?)</t[dh]>").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<a[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#).unwrap());
static MAGNET_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)href="(magnet:[^"]*)""#).unwrap());
static TORRENT_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)href="([^"]*\.torrent)""#).unwrap());
static TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-timestamp="(\d+)""#).unwrap());

/// Site-specific knobs of the results table
#[derive(Debug, Clone)]
pub struct TableLayout {
    /// `id` attribute of the results table
    pub table_id: String,
    /// Rows with fewer cells are skipped
    pub min_cells: usize,
    pub category_col: usize,
    pub title_col: usize,
    pub seeders_col: usize,
    pub leechers_col: usize,
    pub size_col: usize,
    pub date_col: usize,
    /// A row is kept when its category text contains one of these
    pub categories: Vec<String>,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            table_id: "main_table".to_string(),
            min_cells: 7,
            category_col: 0,
            title_col: 1,
            seeders_col: 2,
            leechers_col: 3,
            size_col: 4,
            date_col: 5,
            categories: vec![
                "Film".to_string(),
                "Animazione".to_string(),
                "Serie TV".to_string(),
            ],
        }
    }
}

impl TableLayout {
    fn accepts_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| category.contains(c.as_str()))
    }
}

/// One `<tr>`: full markup (opening tag included) and inner content
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    pub markup: &'a str,
    pub inner: &'a str,
}

/// Inner markup of the results table, falling back to the first table on the page
pub fn locate_table<'a>(html: &'a str, layout: &TableLayout) -> Option<&'a str> {
    let has_id = |attrs: &str| {
        ID_ATTR
            .captures(attrs)
            .is_some_and(|id| id[1] == layout.table_id)
    };

    ANY_TABLE
        .captures_iter(html)
        .find(|c| has_id(&c[1]))
        .or_else(|| ANY_TABLE.captures(html))
        .and_then(|c| c.get(2))
        .map(|m| m.as_str())
}

/// Narrow a table to its `<tbody>` when it has one
pub fn scope_body(table: &str) -> &str {
    TABLE_BODY
        .captures(table)
        .and_then(|c| c.get(1))
        .map_or(table, |m| m.as_str())
}

pub fn split_rows(body: &str) -> Vec<Row<'_>> {
    ROW.captures_iter(body)
        .filter_map(|c| {
            Some(Row {
                markup: c.get(0)?.as_str(),
                inner: c.get(1)?.as_str(),
            })
        })
        .collect()
}

/// Header and data cells alike, trimmed, in column order
pub fn split_cells(row: &str) -> Vec<&str> {
    CELL.captures_iter(row)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .collect()
}

/// Text content of a cell: tags removed, trimmed
pub fn strip_tags(cell: &str) -> String {
    TAG.replace_all(cell, "").trim().to_string()
}

/// Decode the handful of entities the site emits in titles
pub fn decode_entities(text: &str) -> String {
    text.replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Leading digits as an integer, 0 when there are none
fn parse_count(cell: &str) -> u32 {
    let text = strip_tags(cell);
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// First magnet href in a chunk of markup, `&amp;` decoded
pub fn find_magnet(markup: &str) -> Option<String> {
    MAGNET_HREF
        .captures(markup)
        .map(|c| c[1].replace("&amp;", "&"))
}

fn find_torrent_file(markup: &str) -> Option<String> {
    TORRENT_HREF.captures(markup).map(|c| c[1].to_string())
}

fn row_date(row: &Row<'_>, date_cell: &str, diag: &dyn Diagnostics) -> String {
    let timestamp = TIMESTAMP
        .captures(row.markup)
        .and_then(|c| c[1].parse::<i64>().ok())
        .and_then(timestamp_to_iso);
    if let Some(date) = timestamp {
        return date;
    }

    let now = Local::now();
    let text = strip_tags(date_cell);
    match parse_date_at(&text, now) {
        Some(date) => to_iso(date),
        None => {
            diag.warn("parse", "Unable to parse date, using current date", &[("text", text.as_str())]);
            to_iso(now)
        }
    }
}

/// Read one row, or `None` when it is malformed, off-category or has no link
pub fn extract_row(row: &Row<'_>, layout: &TableLayout, diag: &dyn Diagnostics) -> Option<RawTorrent> {
    let cells = split_cells(row.inner);
    if cells.len() < layout.min_cells {
        return None;
    }

    let category = strip_tags(cells.get(layout.category_col)?);
    if !layout.accepts_category(&category) {
        return None;
    }

    let title_cell = *cells.get(layout.title_col)?;
    let (link, title) = match ANCHOR.captures(title_cell) {
        Some(caps) => (caps[1].to_string(), strip_tags(&caps[2])),
        None => (String::new(), strip_tags(title_cell)),
    };
    if link.is_empty() {
        return None;
    }

    let size = strip_tags(cells.get(layout.size_col)?);
    let seeders = parse_count(cells.get(layout.seeders_col)?);
    let leechers = parse_count(cells.get(layout.leechers_col)?);
    let date_cell = *cells.get(layout.date_col)?;

    Some(RawTorrent {
        title: decode_entities(&title),
        link,
        size,
        seeders,
        leechers,
        downloads: 0,
        magnet: find_magnet(row.markup).unwrap_or_default(),
        torrent_url: find_torrent_file(row.markup).unwrap_or_default(),
        date: row_date(row, date_cell, diag),
    })
}

/// Parse a search results page.
///
/// Fails only when the page has no table at all; rows that do not fit
/// the layout are dropped silently.
pub fn parse_search_page(html: &str, layout: &TableLayout, diag: &dyn Diagnostics) -> Result<Vec<RawTorrent>> {
    let table = locate_table(html, layout)
        .ok_or_else(|| ProviderError::Parse("results table not found".to_string()))?;

    Ok(split_rows(scope_body(table))
        .iter()
        .filter_map(|row| extract_row(row, layout, diag))
        .collect())
}
