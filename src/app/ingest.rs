// app/ingest.rs
//
// Ingestion Coordinator: validates an incoming file, fingerprints and
// stores its bytes, then drives decode -> detect -> assemble -> persist.
// This is the seam between the core parsing pipeline (which never touches
// the filesystem or a store) and the outside world.

use crate::app::store::LogStore;
use crate::core::assembler::Assembler;
use crate::core::classifier::{self, CategoryRule};
use crate::core::decoder;
use crate::core::detector::{self, LanguageRule, ModeRule};
use crate::core::fingerprint;
use crate::core::model::{IngestionSource, LogFile, ProcessingState};
use crate::util::error::IngestError;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The classification/detection tables actually in force for a parse: either
/// the built-in ones, or those compiled from a loaded rule set
/// (`app::rules_mgr::load_all_rule_sets`). Bundled together so the
/// coordinator has a single parameter to thread through the pipeline
/// instead of three independent slices.
pub struct ActiveRules<'r> {
    pub category_rules: &'r [CategoryRule],
    pub language_rules: &'r [LanguageRule],
    pub mode_rules: &'r [ModeRule],
}

impl ActiveRules<'static> {
    pub fn defaults() -> Self {
        Self {
            category_rules: classifier::default_rules(),
            language_rules: detector::default_language_rules(),
            mode_rules: detector::default_mode_rules(),
        }
    }
}

/// Everything the coordinator needs to accept and store a file, independent
/// of where the bytes came from (upload or folder watch).
pub struct IngestRequest {
    pub original_filename: String,
    pub bytes: Vec<u8>,
    pub source: IngestionSource,
}

/// Configuration governing acceptance and storage of ingested files.
pub struct IngestConfig {
    pub upload_dir: PathBuf,
    pub max_upload_size_mb: u64,
    pub supported_extensions: Vec<String>,
}

/// Validate extension and size, fingerprint the content, write it to
/// `config.upload_dir` under its stored filename, and register a new
/// `LogFile` record in `Pending` state. Does not parse; call
/// [`parse_log_file`] next.
pub fn ingest_bytes(
    req: IngestRequest,
    config: &IngestConfig,
    store: &dyn LogStore,
) -> Result<u64, IngestError> {
    validate_extension(&req.original_filename, &config.supported_extensions)?;

    let max_bytes = config.max_upload_size_mb * 1024 * 1024;
    if req.bytes.len() as u64 > max_bytes {
        return Err(IngestError::TooLarge {
            size: req.bytes.len() as u64,
            max_size: max_bytes,
        });
    }

    let hash = fingerprint::fingerprint(&req.bytes);
    let ingested_at = chrono::Utc::now().naive_utc();
    let stored_filename = fingerprint::stored_filename(ingested_at, &hash, &req.original_filename);
    let dest_path = config.upload_dir.join(&stored_filename);

    std::fs::create_dir_all(&config.upload_dir).map_err(|source| {
        IngestError::PersistenceError {
            reason: format!("failed to create upload directory: {source}"),
        }
    })?;
    std::fs::write(&dest_path, &req.bytes).map_err(|source| IngestError::PersistenceError {
        reason: format!("failed to write uploaded file: {source}"),
    })?;

    let record = LogFile {
        id: 0,
        file_hash: hash,
        stored_filename,
        original_filename: req.original_filename,
        path: dest_path,
        file_size: req.bytes.len() as u64,
        mime_type: None,
        source: req.source,
        spark_mode: None,
        detected_language: None,
        state: ProcessingState::Pending,
        processed_at: None,
        error_message: None,
    };

    let id = store.save_log_file(record)?;
    tracing::info!(log_file_id = id, "Ingested log file");
    Ok(id)
}

/// Decode, detect, and parse an already-stored `LogFile`, persisting its
/// entries and finalising its state. `cancel` is checked between lines so
/// a long-running parse of a large file can be aborted cooperatively.
pub fn parse_log_file(
    file_id: u64,
    store: &dyn LogStore,
    rules: &ActiveRules,
    cancel: Option<&Arc<AtomicBool>>,
) -> Result<usize, IngestError> {
    let record = store
        .load_log_file(file_id)
        .ok_or_else(|| IngestError::PersistenceError {
            reason: format!("unknown log file id {file_id}"),
        })?;

    let result = parse_and_persist(file_id, &record.path, store, rules, cancel);

    match &result {
        Ok(count) => {
            tracing::info!(log_file_id = file_id, entries = count, "Parsed log file");
        }
        Err(e) => {
            tracing::warn!(log_file_id = file_id, error = %e, "Failed to parse log file");
            let _ = store.mark_failed(file_id, e.to_string());
        }
    }

    result
}

fn parse_and_persist(
    file_id: u64,
    path: &Path,
    store: &dyn LogStore,
    rules: &ActiveRules,
    cancel: Option<&Arc<AtomicBool>>,
) -> Result<usize, IngestError> {
    let raw_bytes = std::fs::read(path).map_err(|source| {
        IngestError::PersistenceError {
            reason: format!("failed to read stored file: {source}"),
        }
    })?;

    let content = decoder::decode_file(path, &raw_bytes)?;

    let language = detector::detect_language_with_rules(&content, rules.language_rules);
    let mode = detector::detect_mode_with_rules(&content, rules.mode_rules);

    let mut assembler = Assembler::with_rules(file_id, rules.category_rules);
    let mut entries = Vec::new();
    let reader = BufReader::new(content.as_bytes());

    for (i, line_result) in reader.lines().enumerate() {
        if i % 4096 == 0 {
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    return Err(IngestError::ParseAbort {
                        reason: "cancelled".to_string(),
                    });
                }
            }
        }
        let line = line_result.map_err(|source| IngestError::PersistenceError {
            reason: format!("failed to read decoded content: {source}"),
        })?;
        if let Some(entry) = assembler.feed(&line) {
            entries.push(entry);
        }
    }
    if let Some(entry) = assembler.finish() {
        entries.push(entry);
    }

    let count = entries.len();
    store.save_entries_and_finalize(file_id, entries, language, mode)?;
    Ok(count)
}

fn validate_extension(filename: &str, supported: &[String]) -> Result<(), IngestError> {
    let lower = filename.to_ascii_lowercase();
    if supported.iter().any(|ext| lower.ends_with(&ext.to_ascii_lowercase())) {
        Ok(())
    } else {
        Err(IngestError::UnsupportedFormat {
            filename: filename.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::store::InMemoryLogStore;
    use crate::core::model::{Category, SparkLanguage, SparkMode};
    use tempfile::TempDir;

    fn default_config(dir: &Path) -> IngestConfig {
        IngestConfig {
            upload_dir: dir.to_path_buf(),
            max_upload_size_mb: 10,
            supported_extensions: vec![".log".to_string(), ".gz".to_string(), ".zip".to_string()],
        }
    }

    #[test]
    fn rejects_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let store = InMemoryLogStore::new();
        let req = IngestRequest {
            original_filename: "notes.docx".to_string(),
            bytes: b"hello".to_vec(),
            source: IngestionSource::Upload,
        };
        let result = ingest_bytes(req, &default_config(dir.path()), &store);
        assert!(matches!(result, Err(IngestError::UnsupportedFormat { .. })));
    }

    #[test]
    fn rejects_oversized_file() {
        let dir = TempDir::new().unwrap();
        let store = InMemoryLogStore::new();
        let mut config = default_config(dir.path());
        config.max_upload_size_mb = 0;
        let req = IngestRequest {
            original_filename: "app.log".to_string(),
            bytes: b"hello".to_vec(),
            source: IngestionSource::Upload,
        };
        let result = ingest_bytes(req, &config, &store);
        assert!(matches!(result, Err(IngestError::TooLarge { .. })));
    }

    #[test]
    fn ingest_then_parse_round_trips_entries() {
        let dir = TempDir::new().unwrap();
        let store = InMemoryLogStore::new();
        let content = "\
24/01/28 10:31:02 ERROR Executor: Exception in task 0.0 in stage 1.0 (TID 3, executor 2)
java.lang.OutOfMemoryError: Java heap space
\tat org.apache.spark.rdd.RDD.iterator(RDD.scala:289)
24/01/28 10:31:03 INFO BlockManager: Removing RDD 5";

        let req = IngestRequest {
            original_filename: "app.log".to_string(),
            bytes: content.as_bytes().to_vec(),
            source: IngestionSource::Upload,
        };
        let id = ingest_bytes(req, &default_config(dir.path()), &store).unwrap();

        let loaded = store.load_log_file(id).unwrap();
        assert_eq!(loaded.state, ProcessingState::Pending);

        let count = parse_log_file(id, &store, &ActiveRules::defaults(), None).unwrap();
        assert_eq!(count, 2);

        let loaded = store.load_log_file(id).unwrap();
        assert_eq!(loaded.state, ProcessingState::Processed);
        assert_eq!(loaded.detected_language, Some(SparkLanguage::Java));
        assert_eq!(loaded.spark_mode, Some(SparkMode::Unknown));

        let entries = store.load_entries(id);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_error);
        assert_eq!(entries[0].category, Some(Category::Memory));
    }

    #[test]
    fn parse_failure_marks_file_failed() {
        let store = InMemoryLogStore::new();
        let result = parse_log_file(999, &store, &ActiveRules::defaults(), None);
        assert!(result.is_err());
    }

    #[test]
    fn cancellation_aborts_parse() {
        let dir = TempDir::new().unwrap();
        let store = InMemoryLogStore::new();
        let req = IngestRequest {
            original_filename: "app.log".to_string(),
            bytes: b"24/01/28 10:31:02 INFO SparkContext: started\n".to_vec(),
            source: IngestionSource::Upload,
        };
        let id = ingest_bytes(req, &default_config(dir.path()), &store).unwrap();

        let cancel = Arc::new(AtomicBool::new(true));
        let result = parse_log_file(id, &store, &ActiveRules::defaults(), Some(&cancel));
        assert!(matches!(result, Err(IngestError::ParseAbort { .. })));

        let loaded = store.load_log_file(id).unwrap();
        assert_eq!(loaded.state, ProcessingState::Failed);
    }

    #[test]
    fn custom_category_rules_change_ingested_category() {
        let dir = TempDir::new().unwrap();
        let store = InMemoryLogStore::new();
        let content = "\
24/01/28 10:31:02 ERROR Executor: Exception in task 0.0 in stage 1.0
java.lang.OutOfMemoryError: Java heap space
\tat org.apache.spark.rdd.RDD.iterator(RDD.scala:289)";

        let req = IngestRequest {
            original_filename: "app.log".to_string(),
            bytes: content.as_bytes().to_vec(),
            source: IngestionSource::Upload,
        };
        let id = ingest_bytes(req, &default_config(dir.path()), &store).unwrap();

        let custom_rules = classifier::compile_rules(&[(
            Category::Permission,
            "OutOfMemoryError".to_string(),
        )])
        .unwrap();
        let rules = ActiveRules {
            category_rules: &custom_rules,
            language_rules: detector::default_language_rules(),
            mode_rules: detector::default_mode_rules(),
        };

        parse_log_file(id, &store, &rules, None).unwrap();
        let entries = store.load_entries(id);
        assert_eq!(entries[0].category, Some(Category::Permission));
    }
}
