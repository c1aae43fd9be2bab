// src/extractors/table.rs
//! Gamelog table location and normalization.
//!
//! A basketball-reference gamelog page keeps its per-game table inside
//! `div#all_pgl_basic`. Header cells carry a display label in `aria-label`
//! and a stable column key in `data-stat`; body cells carry the same
//! `data-stat` keys, so columns are aligned by key rather than by position.

use std::collections::HashSet;

use scraper::ElementRef;

use crate::extractors::search::{attribute, child_elements, describe, first_text, has_tag, search};
use crate::utils::Diagnostics;

// --- Constants ---
pub const CONTAINER_TAG: &str = "div";
pub const CONTAINER_ID: &str = "all_pgl_basic";
const TABLE_TAG: &str = "table";
const HEAD_SECTION_TAG: &str = "thead";
const BODY_SECTION_TAG: &str = "tbody";
const ROW_TAG: &str = "tr";
const HEADER_CELL_TAG: &str = "th";
const DATA_CELL_TAG: &str = "td";

const LABEL_ATTR: &str = "aria-label";
const STAT_KEY_ATTR: &str = "data-stat";
const COLSPAN_ATTR: &str = "colspan";
// Browsers clamp colspan to the same value
const MAX_COLSPAN: i64 = 1000;
// Class on the header rows the site repeats every 20 games or so
const DIVIDER_CLASS: &str = "thead";

// --- Data Structures ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    pub label: String,    // e.g. "Points"
    pub stat_key: String, // e.g. "pts"
}

/// Header labels and stat keys, co-indexed in document column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableHeaders {
    labels: Vec<String>,
    stat_keys: Vec<String>,
}

impl TableHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: HeaderEntry) {
        self.labels.push(entry.label);
        self.stat_keys.push(entry.stat_key);
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn stat_keys(&self) -> &[String] {
        &self.stat_keys
    }

    pub fn len(&self) -> usize {
        self.stat_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stat_keys.is_empty()
    }
}

impl FromIterator<HeaderEntry> for TableHeaders {
    fn from_iter<I: IntoIterator<Item = HeaderEntry>>(iter: I) -> Self {
        let mut headers = TableHeaders::new();
        for entry in iter {
            headers.push(entry);
        }
        headers
    }
}

/// Stat keys of the header, used for membership tests while reading rows.
#[derive(Debug, Clone, Default)]
pub struct StatKeySet<'a> {
    keys: HashSet<&'a str>,
}

impl<'a> StatKeySet<'a> {
    pub fn from_keys(stat_keys: &'a [String]) -> Self {
        Self {
            keys: stat_keys.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, stat_key: &str) -> bool {
        self.keys.contains(stat_key)
    }
}

pub type Row = Vec<String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GamelogTable {
    pub headers: TableHeaders,
    pub rows: Vec<Row>,
}

// --- Location ---

/// Finds the gamelog `<table>` under `div#all_pgl_basic`.
///
/// `None` means the page has no gamelog data. Only the first table inside the
/// container is considered.
pub fn locate_table<'a>(root: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let container = search(root, |el| {
        has_tag(el, CONTAINER_TAG) && attribute(el, "id") == Some(CONTAINER_ID)
    })?;
    tracing::trace!("Found gamelog container {}", describe(&container));

    search(container, |el| has_tag(el, TABLE_TAG))
}

// --- Headers ---

/// Reads `(aria-label, data-stat)` pairs from every `th` of every direct `tr`
/// child of `thead`, in row-then-column order.
///
/// A cell missing either attribute is dropped from both sequences.
pub fn parse_headers(thead: ElementRef<'_>, diagnostics: &dyn Diagnostics) -> TableHeaders {
    let mut headers = TableHeaders::new();

    for row in child_elements(thead, ROW_TAG) {
        for th in child_elements(row, HEADER_CELL_TAG) {
            let Some(label) = attribute(&th, LABEL_ATTR) else {
                diagnostics.warn(format_args!(
                    "skipping table header without {} attribute: {}", LABEL_ATTR, describe(&th)
                ));
                continue;
            };

            let Some(stat_key) = attribute(&th, STAT_KEY_ATTR) else {
                diagnostics.warn(format_args!(
                    "skipping table header without {} attribute: {}", STAT_KEY_ATTR, describe(&th)
                ));
                continue;
            };

            headers.push(HeaderEntry {
                label: label.to_string(),
                stat_key: stat_key.to_string(),
            });
        }
    }

    headers
}

// --- Rows ---

fn is_divider_row(row: &ElementRef<'_>) -> bool {
    attribute(row, "class") == Some(DIVIDER_CLASS)
}

/// Extracts the body rows of a gamelog table.
///
/// Cells are appended in document order. A cell whose stat key is not in
/// `stat_keys` (e.g. the "Inactive" / "Did Not Play" cell that spans the stat
/// columns) is expanded to `colspan` copies of its text.
pub fn extract_rows(tbody: ElementRef<'_>, stat_keys: &[String], diagnostics: &dyn Diagnostics) -> Vec<Row> {
    let known = StatKeySet::from_keys(stat_keys);
    let mut rows = Vec::new();

    for tr in child_elements(tbody, ROW_TAG) {
        if is_divider_row(&tr) {
            tracing::trace!("Skipping repeated header row");
            continue;
        }

        let mut row = Row::with_capacity(stat_keys.len());
        let cells = tr
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| has_tag(cell, HEADER_CELL_TAG) || has_tag(cell, DATA_CELL_TAG));

        for cell in cells {
            let Some(stat_key) = attribute(&cell, STAT_KEY_ATTR) else {
                diagnostics.warn(format_args!(
                    "{} attribute not present in table cell {}", STAT_KEY_ATTR, describe(&cell)
                ));
                continue;
            };

            if known.contains(stat_key) {
                match first_text(&cell) {
                    Some(text) => row.push(text),
                    None => {
                        diagnostics.warn(format_args!("text not present for table cell {}", describe(&cell)));
                        row.push(String::new());
                    }
                }
                continue;
            }

            expand_unknown_cell(&cell, stat_key, &mut row, diagnostics);
        }

        rows.push(row);
    }

    rows
}

fn expand_unknown_cell(cell: &ElementRef<'_>, stat_key: &str, row: &mut Row, diagnostics: &dyn Diagnostics) {
    diagnostics.warn(format_args!(
        "encountered stat not included in headers: {}. filling cells with its text", stat_key
    ));
    let text = first_text(cell).unwrap_or_default();

    let Some(colspan) = attribute(cell, COLSPAN_ATTR) else {
        diagnostics.warn(format_args!(
            "{} not present for table cell {}. adding single filler cell", COLSPAN_ATTR, describe(cell)
        ));
        row.push(text);
        return;
    };

    let width = match colspan.parse::<i64>() {
        Ok(width) => width,
        Err(e) => {
            diagnostics.warn(format_args!(
                "could not convert {} of table cell {} to an integer: {}", COLSPAN_ATTR, describe(cell), e
            ));
            return;
        }
    };

    if width <= 0 {
        diagnostics.warn(format_args!(
            "non-positive {} {} on table cell {}. no filler added", COLSPAN_ATTR, width, describe(cell)
        ));
        return;
    }

    let width = if width > MAX_COLSPAN {
        diagnostics.warn(format_args!(
            "{} {} on table cell {} exceeds {}. clamping", COLSPAN_ATTR, width, describe(cell), MAX_COLSPAN
        ));
        MAX_COLSPAN
    } else {
        width
    };

    let width = usize::try_from(width).unwrap_or(0);
    row.extend(std::iter::repeat(text).take(width));
}

// --- Whole table ---

/// Runs header and row extraction over the direct `thead` / `tbody` children
/// of a located table. A later `tbody` replaces the rows of an earlier one.
pub fn parse_gamelog_table(table: ElementRef<'_>, diagnostics: &dyn Diagnostics) -> GamelogTable {
    let mut parsed = GamelogTable::default();

    for section in table.children().filter_map(ElementRef::wrap) {
        match section.value().name() {
            HEAD_SECTION_TAG => parsed.headers = parse_headers(section, diagnostics),
            BODY_SECTION_TAG => parsed.rows = extract_rows(section, parsed.headers.stat_keys(), diagnostics),
            _ => continue,
        }
    }

    tracing::debug!(
        "Parsed gamelog table: {} columns, {} rows",
        parsed.headers.len(),
        parsed.rows.len()
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::CollectingDiagnostics;
    use scraper::Html;

    fn wrap_table(thead: &str, tbody: &str) -> String {
        format!(
            r#"<html><body><div id="all_pgl_basic"><div class="table_container"><table id="pgl_basic"><thead>{}</thead><tbody>{}</tbody></table></div></div></body></html>"#,
            thead, tbody
        )
    }

    fn section<'a>(doc: &'a Html, tag: &str) -> ElementRef<'a> {
        search(doc.root_element(), |el| has_tag(el, tag)).unwrap()
    }

    const DATE_AGE_HEAD: &str =
        r#"<tr><th aria-label="Date" data-stat="date_game">Date</th><th aria-label="Age" data-stat="age">Age</th></tr>"#;

    #[test]
    fn test_locate_table_inside_container() {
        let html = r#"<body><table id="decoy"></table><div id="all_pgl_basic"><p>x</p><table id="pgl_basic"></table></div></body>"#;
        let doc = Html::parse_document(html);
        let table = locate_table(doc.root_element()).unwrap();
        assert_eq!(table.value().attr("id"), Some("pgl_basic"));
    }

    #[test]
    fn test_locate_table_requires_container() {
        let doc = Html::parse_document(r#"<body><div id="other"><table></table></div></body>"#);
        assert!(locate_table(doc.root_element()).is_none());
    }

    #[test]
    fn test_locate_table_container_without_table() {
        let doc = Html::parse_document(r#"<body><div id="all_pgl_basic"><p>No games</p></div></body>"#);
        assert!(locate_table(doc.root_element()).is_none());
    }

    #[test]
    fn test_locate_table_ignores_container_id_on_other_tags() {
        let doc = Html::parse_document(r#"<body><section id="all_pgl_basic"><table></table></section></body>"#);
        assert!(locate_table(doc.root_element()).is_none());
    }

    #[test]
    fn test_parse_headers_well_formed() {
        let doc = Html::parse_document(&wrap_table(DATE_AGE_HEAD, ""));
        let diag = CollectingDiagnostics::new();

        let headers = parse_headers(section(&doc, "thead"), &diag);
        assert_eq!(headers.labels(), ["Date", "Age"]);
        assert_eq!(headers.stat_keys(), ["date_game", "age"]);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_parse_headers_skips_incomplete_cells() {
        let head = r#"<tr><th aria-label="Rk" data-stat="ranker">Rk</th><th data-stat="x">No label</th><th aria-label="Tm">No key</th><td aria-label="Td" data-stat="td">td</td><th aria-label="Pts" data-stat="pts">PTS</th></tr>"#;
        let doc = Html::parse_document(&wrap_table(head, ""));
        let diag = CollectingDiagnostics::new();

        let headers = parse_headers(section(&doc, "thead"), &diag);
        assert_eq!(headers.labels(), ["Rk", "Pts"]);
        assert_eq!(headers.stat_keys(), ["ranker", "pts"]);
        assert_eq!(diag.warnings().len(), 2);
    }

    #[test]
    fn test_parse_headers_concatenates_rows_without_dedup() {
        let head = r#"<tr><th aria-label="A" data-stat="a"></th></tr><tr><th aria-label="B" data-stat="b"></th><th aria-label="A again" data-stat="a"></th></tr>"#;
        let doc = Html::parse_document(&wrap_table(head, ""));

        let headers = parse_headers(section(&doc, "thead"), &CollectingDiagnostics::new());
        assert_eq!(headers.stat_keys(), ["a", "b", "a"]);
        assert_eq!(headers.len(), headers.labels().len());
    }

    #[test]
    fn test_extract_rows_known_cells_match_header_length() {
        let body = r#"<tr><th data-stat="date_game"><a href="/boxscores/x.html">2022-01-01</a></th><td data-stat="age">25</td></tr>"#;
        let doc = Html::parse_document(&wrap_table(DATE_AGE_HEAD, body));
        let keys = vec!["date_game".to_string(), "age".to_string()];

        let rows = extract_rows(section(&doc, "tbody"), &keys, &CollectingDiagnostics::new());
        assert_eq!(rows, vec![vec!["2022-01-01".to_string(), "25".to_string()]]);
        assert_eq!(rows[0].len(), keys.len());
    }

    #[test]
    fn test_extract_rows_expands_merged_cell_in_place() {
        let keys: Vec<String> = ["ranker", "date_game", "fg", "pts", "plus_minus"].iter().map(|s| s.to_string()).collect();
        let body = r#"<tr><th data-stat="ranker">3</th><td data-stat="date_game">2022-01-05</td><td data-stat="reason" colspan="3">Inactive</td></tr>"#;
        let doc = Html::parse_document(&wrap_table("", body));

        let rows = extract_rows(section(&doc, "tbody"), &keys, &CollectingDiagnostics::new());
        assert_eq!(rows[0], ["3", "2022-01-05", "Inactive", "Inactive", "Inactive"]);
    }

    #[test]
    fn test_extract_rows_merged_width_adds_k_minus_one_columns() {
        let keys: Vec<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let plain = r#"<tr><td data-stat="a">1</td><td data-stat="note">n</td><td data-stat="b">2</td></tr>"#;
        let merged = r#"<tr><td data-stat="a">1</td><td data-stat="note" colspan="4">n</td><td data-stat="b">2</td></tr>"#;
        let doc = Html::parse_document(&wrap_table("", &format!("{}{}", plain, merged)));

        let rows = extract_rows(section(&doc, "tbody"), &keys, &CollectingDiagnostics::new());
        assert_eq!(rows[0], ["1", "n", "2"]);
        assert_eq!(rows[1], ["1", "n", "n", "n", "n", "2"]);
        assert_eq!(rows[1].len(), rows[0].len() + 3);
    }

    #[test]
    fn test_extract_rows_unknown_cell_without_colspan_adds_one() {
        let keys = vec!["a".to_string()];
        let body = r#"<tr><td data-stat="a">1</td><td data-stat="extra">e</td></tr>"#;
        let doc = Html::parse_document(&wrap_table("", body));
        let diag = CollectingDiagnostics::new();

        let rows = extract_rows(section(&doc, "tbody"), &keys, &diag);
        assert_eq!(rows[0], ["1", "e"]);
        assert!(!diag.is_empty());
    }

    #[test]
    fn test_extract_rows_bad_colspan_skips_cell() {
        let keys = vec!["a".to_string(), "b".to_string()];
        let body = r#"<tr><td data-stat="a">1</td><td data-stat="extra" colspan="wide">e</td><td data-stat="b">2</td></tr><tr><td data-stat="a">1</td><td data-stat="extra" colspan="0">e</td><td data-stat="b">2</td></tr>"#;
        let doc = Html::parse_document(&wrap_table("", body));
        let diag = CollectingDiagnostics::new();

        let rows = extract_rows(section(&doc, "tbody"), &keys, &diag);
        assert_eq!(rows, vec![vec!["1", "2"], vec!["1", "2"]]);
        assert!(diag.warnings().iter().any(|w| w.contains("could not convert colspan")));
        assert!(diag.warnings().iter().any(|w| w.contains("non-positive colspan 0")));
    }

    #[test]
    fn test_extract_rows_skips_cells_without_stat_key() {
        let keys = vec!["a".to_string(), "b".to_string()];
        let body = r#"<tr><td data-stat="a">1</td><td>orphan</td><td data-stat="b">2</td></tr>"#;
        let doc = Html::parse_document(&wrap_table("", body));
        let diag = CollectingDiagnostics::new();

        let rows = extract_rows(section(&doc, "tbody"), &keys, &diag);
        assert_eq!(rows[0], ["1", "2"]);
        assert_eq!(diag.warnings().len(), 1);
    }

    #[test]
    fn test_extract_rows_empty_known_cell_keeps_position() {
        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let body = r#"<tr><td data-stat="a">1</td><td data-stat="b"></td><td data-stat="c">3</td></tr>"#;
        let doc = Html::parse_document(&wrap_table("", body));
        let diag = CollectingDiagnostics::new();

        let rows = extract_rows(section(&doc, "tbody"), &keys, &diag);
        assert_eq!(rows[0], ["1", "", "3"]);
        assert!(diag.warnings()[0].contains("text not present"));
    }

    #[test]
    fn test_extract_rows_skips_divider_rows() {
        let keys = vec!["a".to_string()];
        let body = r#"<tr><td data-stat="a">1</td></tr><tr class="thead"><th aria-label="A" data-stat="a">A</th></tr><tr><td data-stat="a">2</td></tr>"#;
        let doc = Html::parse_document(&wrap_table("", body));

        let rows = extract_rows(section(&doc, "tbody"), &keys, &CollectingDiagnostics::new());
        assert_eq!(rows, vec![vec!["1"], vec!["2"]]);
    }

    #[test]
    fn test_parse_gamelog_table_end_to_end() {
        let body = r#"<tr><th data-stat="date_game">2022-01-01</th><td data-stat="age">25</td></tr><tr><th data-stat="date_game">2022-01-03</th><td data-stat="age">25</td></tr>"#;
        let doc = Html::parse_document(&wrap_table(DATE_AGE_HEAD, body));
        let diag = CollectingDiagnostics::new();

        let table = locate_table(doc.root_element()).unwrap();
        let parsed = parse_gamelog_table(table, &diag);

        assert_eq!(parsed.headers.labels(), ["Date", "Age"]);
        assert_eq!(parsed.headers.stat_keys(), ["date_game", "age"]);
        assert_eq!(parsed.rows, vec![vec!["2022-01-01", "25"], vec!["2022-01-03", "25"]]);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_header_entries_and_key_set() {
        let headers: TableHeaders = vec![
            HeaderEntry { label: "Rk".into(), stat_key: "ranker".into() },
            HeaderEntry { label: "Pts".into(), stat_key: "pts".into() },
        ]
        .into_iter()
        .collect();

        assert_eq!(headers.labels(), ["Rk", "Pts"]);

        let set = StatKeySet::from_keys(headers.stat_keys());
        assert!(set.contains("pts"));
        assert!(!set.contains("reason"));
    }

    #[test]
    fn test_extract_rows_clamps_huge_colspan() {
        let keys = vec!["a".to_string()];
        let body = r#"<tr><td data-stat="a">1</td><td data-stat="reason" colspan="100000000000000">Inactive</td></tr>"#;
        let doc = Html::parse_document(&wrap_table("", body));
        let diag = CollectingDiagnostics::new();

        let rows = extract_rows(section(&doc, "tbody"), &keys, &diag);
        assert_eq!(rows[0].len(), 1 + MAX_COLSPAN as usize);
        assert!(rows[0][1..].iter().all(|cell| cell == "Inactive"));
        assert!(diag.warnings().iter().any(|w| w.contains("exceeds 1000")));
    }

    #[test]
    fn test_divider_requires_exact_class() {
        let keys = vec!["a".to_string()];
        let body = r#"<tr class="thead"><th data-stat="a">A</th></tr><tr class="thead partial_table"><td data-stat="a">1</td></tr>"#;
        let doc = Html::parse_document(&wrap_table("", body));

        let rows = extract_rows(section(&doc, "tbody"), &keys, &CollectingDiagnostics::new());
        assert_eq!(rows, vec![vec!["1"]]);
    }

    #[test]
    fn test_parse_gamelog_table_keeps_last_tbody() {
        let html = format!(
            r#"<html><body><div id="all_pgl_basic"><table><thead>{}</thead><tbody><tr><td data-stat="date_game">2021-10-20</td><td data-stat="age">23</td></tr></tbody><tbody><tr><td data-stat="date_game">2022-04-10</td><td data-stat="age">23</td></tr></tbody></table></div></body></html>"#,
            DATE_AGE_HEAD
        );
        let doc = Html::parse_document(&html);

        let table = locate_table(doc.root_element()).unwrap();
        let parsed = parse_gamelog_table(table, &CollectingDiagnostics::new());
        assert_eq!(parsed.rows, vec![vec!["2022-04-10", "23"]]);
    }
}
