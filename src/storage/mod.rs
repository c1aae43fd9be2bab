// src/storage/mod.rs
pub mod registry;

use std::fs;
use std::path::{Path, PathBuf};

use crate::bbref::models::RunSummary;
use crate::extractors::GamelogTable;
use crate::utils::error::StorageError;

pub use registry::{IdGenerator, NameRegistry};

const NAME_INDEX_FILE: &str = "index.json";
const RUN_METADATA_FILE: &str = "run_meta.json";

/// What produced an output directory.
#[derive(Debug, Clone)]
pub struct RunMetadata {
    pub mode: String, // "crawl" or "extract"
    pub season: Option<String>,
    pub summary: RunSummary,
}

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Writes `{id}.csv`: the stat keys first, then every row.
    ///
    /// Rows widened by merged cells are written as-is, so records can differ
    /// in length.
    pub fn save_gamelog(&self, id: u64, table: &GamelogTable) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(format!("{}.csv", id));

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&file_path)?;

        writer.write_record(table.headers.stat_keys())?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush().map_err(StorageError::IoError)?;

        tracing::info!("Saved gamelog to {}", file_path.display());

        Ok(file_path)
    }

    /// Writes `index.json`, mapping each output id to its player name.
    pub fn save_name_index(&self, names: &NameRegistry) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(NAME_INDEX_FILE);

        let index_str = serde_json::to_string_pretty(&names.snapshot())
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, index_str)
            .map_err(StorageError::IoError)?;

        tracing::info!("Saved name index ({} players) to {}", names.len(), file_path.display());

        Ok(file_path)
    }

    /// Saves metadata about the run in JSON format
    pub fn save_run_metadata(&self, run: &RunMetadata) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(RUN_METADATA_FILE);

        let metadata = serde_json::json!({
            "mode": run.mode,
            "season": run.season,
            "summary": run.summary,
            "finished_at": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, metadata_str)
            .map_err(StorageError::IoError)?;

        tracing::info!("Saved run metadata to {}", file_path.display());

        Ok(file_path)
    }
}
