// src/extractors/mod.rs
pub mod name;
pub mod search;
pub mod table;

use scraper::Html;

use crate::utils::Diagnostics;

// Re-export key extraction types for convenience
pub use name::extract_player_name;
pub use search::search;
pub use table::{
    extract_rows, locate_table, parse_gamelog_table, parse_headers, GamelogTable, HeaderEntry, Row,
    StatKeySet, TableHeaders,
};

/// Everything taken from one gamelog page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerGamelog {
    pub name: String,
    pub table: GamelogTable,
}

/// Result of running both extractors over a page. Either half may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageExtraction {
    pub table: Option<GamelogTable>,
    pub name: Option<String>,
}

impl PageExtraction {
    /// Both halves, or `None` when the page is unusable.
    pub fn into_gamelog(self) -> Option<PlayerGamelog> {
        Some(PlayerGamelog {
            name: self.name?,
            table: self.table?,
        })
    }
}

/// Runs table and name extraction over parsed gamelog pages.
pub struct GamelogExtractor<'d> {
    diagnostics: &'d dyn Diagnostics,
}

impl<'d> GamelogExtractor<'d> {
    pub fn new(diagnostics: &'d dyn Diagnostics) -> Self {
        Self { diagnostics }
    }

    /// Parses raw page markup and extracts from it.
    pub fn extract_html(&self, html_content: &str) -> PageExtraction {
        let document = Html::parse_document(html_content);
        self.extract(&document)
    }

    pub fn extract(&self, document: &Html) -> PageExtraction {
        let root = document.root_element();

        let table = locate_table(root).map(|table| parse_gamelog_table(table, self.diagnostics));
        if table.is_none() {
            tracing::debug!("No gamelog table found in document");
        }

        let name = extract_player_name(root, self.diagnostics);
        if name.is_none() {
            tracing::debug!("No player name found in document");
        }

        PageExtraction { table, name }
    }
}
