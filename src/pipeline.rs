// src/pipeline.rs
//! Turns fetched gamelog pages into output files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bbref::models::RunSummary;
use crate::extractors::{GamelogExtractor, PageExtraction};
use crate::storage::{IdGenerator, NameRegistry, RunMetadata, StorageManager};
use crate::utils::error::{AppError, StorageError};
use crate::utils::html_debug;
use crate::utils::Diagnostics;

/// What happened to one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Written { id: u64, name: String, path: PathBuf },
    NoGamelogTable,
    NoPlayerName,
}

impl PageOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, PageOutcome::Written { .. })
    }
}

/// Extracts gamelog pages and writes them out under fresh ids.
///
/// Safe to share between crawl tasks; ids and the name index are synchronized.
pub struct GamelogRecorder {
    storage: StorageManager,
    ids: IdGenerator,
    names: NameRegistry,
    diagnostics: Arc<dyn Diagnostics>,
    debug_dir: Option<PathBuf>,
}

impl GamelogRecorder {
    pub fn new(storage: StorageManager, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            storage,
            ids: IdGenerator::new(),
            names: NameRegistry::new(),
            diagnostics,
            debug_dir: None,
        }
    }

    /// Save annotated copies of pages that fail extraction under `{output}/debug`.
    pub fn with_debug_dumps(mut self) -> Self {
        self.debug_dir = Some(self.storage.base_dir().join("debug"));
        self
    }

    pub fn diagnostics(&self) -> &dyn Diagnostics {
        self.diagnostics.as_ref()
    }

    pub fn names(&self) -> &NameRegistry {
        &self.names
    }

    /// Extracts one page and, if it holds a gamelog, writes `{id}.csv`.
    ///
    /// Pages without a table or a name are skipped with a warning. Only a
    /// failure to write output is an error.
    pub fn record_page(&self, page_key: &str, body: &str) -> Result<PageOutcome, StorageError> {
        let extraction = GamelogExtractor::new(self.diagnostics()).extract_html(body);

        let (table, name) = match extraction {
            PageExtraction { table: None, .. } => {
                self.diagnostics.warn(format_args!("unable to get gamelog table for {}", page_key));
                self.dump_failed_page(page_key, body);
                return Ok(PageOutcome::NoGamelogTable);
            }
            PageExtraction { name: None, .. } => {
                self.diagnostics.warn(format_args!("could not retrieve player name for {}", page_key));
                self.dump_failed_page(page_key, body);
                return Ok(PageOutcome::NoPlayerName);
            }
            PageExtraction { table: Some(table), name: Some(name) } => (table, name),
        };

        let id = self.ids.next_id();
        let path = match self.storage.save_gamelog(id, &table) {
            Ok(path) => path,
            Err(e) => {
                self.diagnostics.fatal(format_args!("failed to write gamelog {} for {}: {}", id, page_key, e));
                return Err(e);
            }
        };
        self.names.insert(id, &name);

        tracing::info!("Recorded {} ({} games) as {}", name, table.rows.len(), id);
        Ok(PageOutcome::Written { id, name, path })
    }

    /// Writes the name index and run metadata.
    pub fn finish(&self, run: &RunMetadata) -> Result<(), StorageError> {
        self.storage.save_name_index(&self.names)?;
        self.storage.save_run_metadata(run)?;
        Ok(())
    }

    fn dump_failed_page(&self, page_key: &str, body: &str) {
        let Some(debug_dir) = &self.debug_dir else {
            return;
        };

        match html_debug::dump_failed_page(body, debug_dir, page_key) {
            Ok(path) => tracing::info!("Saved failed page {} to {}", page_key, path.display()),
            Err(e) => self.diagnostics.warn(format_args!("failed to save debug copy of {}: {}", page_key, e)),
        }
    }
}

/// Offline mode: records gamelog pages saved on disk.
///
/// Unreadable files count as fetch failures; the run continues.
pub fn extract_files<P: AsRef<Path>>(recorder: &GamelogRecorder, paths: &[P]) -> Result<RunSummary, AppError> {
    let mut summary = RunSummary::default();

    for path in paths {
        let path = path.as_ref();
        let body = match fs::read_to_string(path) {
            Ok(body) => body,
            Err(e) => {
                recorder.diagnostics().warn(format_args!("could not read {}: {}", path.display(), e));
                summary.fetch_failures += 1;
                continue;
            }
        };
        summary.pages_fetched += 1;

        if recorder.record_page(&path.display().to_string(), &body)?.is_written() {
            summary.gamelogs_written += 1;
        } else {
            summary.skipped += 1;
        }
    }

    recorder.finish(&RunMetadata {
        mode: "extract".to_string(),
        season: None,
        summary: summary.clone(),
    })?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::CollectingDiagnostics;

    const GAMELOG_FIXTURE: &str = include_str!("../tests/fixtures/youngtr01_gamelog_2022.html");

    fn recorder_in(dir: &Path, diag: Arc<CollectingDiagnostics>) -> GamelogRecorder {
        GamelogRecorder::new(StorageManager::new(dir).unwrap(), diag)
    }

    #[test]
    fn test_record_page_writes_csv_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder_in(dir.path(), Arc::new(CollectingDiagnostics::new()));

        let outcome = recorder.record_page("youngtr01", GAMELOG_FIXTURE).unwrap();
        let (id, name, path) = match outcome {
            PageOutcome::Written { id, name, path } => (id, name, path),
            other => panic!("expected a written gamelog, got {:?}", other),
        };

        assert_eq!(id, 1);
        assert_eq!(name, "Trae Young");
        assert_eq!(recorder.names().get(1).as_deref(), Some("Trae Young"));

        let csv = fs::read_to_string(path).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("ranker,game_season,date_game,age,team_id"));
        assert!(lines.next().unwrap().starts_with("1,1,2021-10-20,23-041,ATL,,DAL"));
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn test_record_page_without_table_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let diag = Arc::new(CollectingDiagnostics::new());
        let recorder = recorder_in(dir.path(), Arc::clone(&diag)).with_debug_dumps();

        let outcome = recorder
            .record_page("empty-page", r#"<html><body><h1 itemprop="name"><span>Trae Young 2021-22 Game Log</span></h1></body></html>"#)
            .unwrap();

        assert_eq!(outcome, PageOutcome::NoGamelogTable);
        assert!(recorder.names().is_empty());
        assert!(diag.warnings().iter().any(|w| w.contains("unable to get gamelog table for empty-page")));
        assert!(dir.path().join("debug").join("empty-page.html").exists());
    }

    #[test]
    fn test_record_page_without_name_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder_in(dir.path(), Arc::new(CollectingDiagnostics::new()));
        let page = GAMELOG_FIXTURE.replace("Trae Young 2021-22 Game Log", "Trae Young Game Log");

        assert_eq!(recorder.record_page("p", &page).unwrap(), PageOutcome::NoPlayerName);
        assert!(!dir.path().join("1.csv").exists());
    }

    #[test]
    fn test_extract_files_summary_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let page = dir.path().join("youngtr01.html");
        fs::write(&page, GAMELOG_FIXTURE).unwrap();
        let missing = dir.path().join("missing.html");

        let recorder = recorder_in(&out, Arc::new(CollectingDiagnostics::new()));
        let summary = extract_files(&recorder, &[page, missing]).unwrap();

        assert_eq!(
            summary,
            RunSummary { pages_fetched: 1, fetch_failures: 1, gamelogs_written: 1, skipped: 0 }
        );

        let index: serde_json::Value = serde_json::from_str(&fs::read_to_string(out.join("index.json")).unwrap()).unwrap();
        assert_eq!(index["1"], "Trae Young");
        assert!(out.join("run_meta.json").exists());
    }
}
