// app/store.rs
//
// Persistence boundary. `LogStore` is the only contract the engine
// requires of a concrete database; `InMemoryLogStore` is a reference
// implementation used by the CLI demo and by tests so `core` never
// depends on a real database driver.

use crate::core::model::{LogEntry, LogFile, ProcessingState, SparkLanguage, SparkMode};
use crate::util::error::IngestError;
use std::collections::HashMap;
use std::sync::Mutex;

/// The persistence interface the ingestion pipeline requires.
pub trait LogStore: Send + Sync {
    fn save_log_file(&self, record: LogFile) -> Result<u64, IngestError>;

    fn save_entries_and_finalize(
        &self,
        file_id: u64,
        entries: Vec<LogEntry>,
        language: SparkLanguage,
        mode: SparkMode,
    ) -> Result<(), IngestError>;

    fn mark_failed(&self, file_id: u64, error_message: String) -> Result<(), IngestError>;

    fn load_log_file(&self, file_id: u64) -> Option<LogFile>;

    fn load_entries(&self, file_id: u64) -> Vec<LogEntry>;
}

#[derive(Default)]
struct Tables {
    files: HashMap<u64, LogFile>,
    entries: HashMap<u64, Vec<LogEntry>>,
    next_id: u64,
}

/// In-memory `LogStore`, guarded by a single mutex. Adequate for the CLI
/// demo and for tests; a production deployment swaps this for a real
/// relational store behind the same trait.
pub struct InMemoryLogStore {
    tables: Mutex<Tables>,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables {
                next_id: 1,
                ..Default::default()
            }),
        }
    }
}

impl Default for InMemoryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LogStore for InMemoryLogStore {
    fn save_log_file(&self, mut record: LogFile) -> Result<u64, IngestError> {
        let mut tables = self.tables.lock().map_err(|_| IngestError::PersistenceError {
            reason: "log store lock poisoned".to_string(),
        })?;
        let id = tables.next_id;
        tables.next_id += 1;
        record.id = id;
        tables.files.insert(id, record);
        Ok(id)
    }

    fn save_entries_and_finalize(
        &self,
        file_id: u64,
        entries: Vec<LogEntry>,
        language: SparkLanguage,
        mode: SparkMode,
    ) -> Result<(), IngestError> {
        let mut tables = self.tables.lock().map_err(|_| IngestError::PersistenceError {
            reason: "log store lock poisoned".to_string(),
        })?;
        let file = tables
            .files
            .get_mut(&file_id)
            .ok_or_else(|| IngestError::PersistenceError {
                reason: format!("unknown log file id {file_id}"),
            })?;
        file.state = ProcessingState::Processed;
        file.processed_at = Some(chrono::Utc::now().naive_utc());
        file.detected_language = Some(language);
        file.spark_mode = Some(mode);
        tables.entries.insert(file_id, entries);
        Ok(())
    }

    fn mark_failed(&self, file_id: u64, error_message: String) -> Result<(), IngestError> {
        let mut tables = self.tables.lock().map_err(|_| IngestError::PersistenceError {
            reason: "log store lock poisoned".to_string(),
        })?;
        let file = tables
            .files
            .get_mut(&file_id)
            .ok_or_else(|| IngestError::PersistenceError {
                reason: format!("unknown log file id {file_id}"),
            })?;
        file.state = ProcessingState::Failed;
        file.error_message = Some(error_message);
        Ok(())
    }

    fn load_log_file(&self, file_id: u64) -> Option<LogFile> {
        self.tables.lock().ok()?.files.get(&file_id).cloned()
    }

    fn load_entries(&self, file_id: u64) -> Vec<LogEntry> {
        self.tables
            .lock()
            .ok()
            .and_then(|t| t.entries.get(&file_id).cloned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::IngestionSource;
    use std::path::PathBuf;

    fn sample_file() -> LogFile {
        LogFile {
            id: 0,
            file_hash: "abc123".to_string(),
            stored_filename: "20240128_103045_abc123_app.log".to_string(),
            original_filename: "app.log".to_string(),
            path: PathBuf::from("/tmp/app.log"),
            file_size: 10,
            mime_type: None,
            source: IngestionSource::Upload,
            spark_mode: None,
            detected_language: None,
            state: ProcessingState::Pending,
            processed_at: None,
            error_message: None,
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = InMemoryLogStore::new();
        let id = store.save_log_file(sample_file()).unwrap();
        let loaded = store.load_log_file(id).unwrap();
        assert_eq!(loaded.original_filename, "app.log");
        assert_eq!(loaded.state, ProcessingState::Pending);
    }

    #[test]
    fn finalize_marks_processed_and_stores_entries() {
        let store = InMemoryLogStore::new();
        let id = store.save_log_file(sample_file()).unwrap();
        store
            .save_entries_and_finalize(id, Vec::new(), SparkLanguage::Python, SparkMode::Yarn)
            .unwrap();
        let loaded = store.load_log_file(id).unwrap();
        assert_eq!(loaded.state, ProcessingState::Processed);
        assert_eq!(loaded.detected_language, Some(SparkLanguage::Python));
    }

    #[test]
    fn mark_failed_sets_error_message() {
        let store = InMemoryLogStore::new();
        let id = store.save_log_file(sample_file()).unwrap();
        store.mark_failed(id, "boom".to_string()).unwrap();
        let loaded = store.load_log_file(id).unwrap();
        assert_eq!(loaded.state, ProcessingState::Failed);
        assert_eq!(loaded.error_message.as_deref(), Some("boom"));
    }
}
