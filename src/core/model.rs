// core/model.rs
//
// Domain types shared across the pipeline: the persisted LogFile/LogEntry
// shapes, the closed enums for level/category/mode/language, and the
// progress-message types used to report background work back to callers.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Log severity level. Closed set; unrecognised tokens leave the field unset
/// rather than mapping to a catch-all variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    pub fn all() -> &'static [Level] {
        &[
            Level::Debug,
            Level::Info,
            Level::Warn,
            Level::Error,
            Level::Fatal,
        ]
    }

    /// Parse a level token, normalising the two Spark/log4j aliases:
    /// WARNING -> WARN, SEVERE -> FATAL.
    pub fn from_token(token: &str) -> Option<Level> {
        match token.to_ascii_uppercase().as_str() {
            "DEBUG" => Some(Level::Debug),
            "INFO" => Some(Level::Info),
            "WARN" | "WARNING" => Some(Level::Warn),
            "ERROR" => Some(Level::Error),
            "FATAL" | "SEVERE" => Some(Level::Fatal),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Deployment mode inferred from log content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SparkMode {
    Standalone,
    Yarn,
    Kubernetes,
    Local,
    #[default]
    Unknown,
}

impl SparkMode {
    pub fn label(&self) -> &'static str {
        match self {
            SparkMode::Standalone => "standalone",
            SparkMode::Yarn => "yarn",
            SparkMode::Kubernetes => "kubernetes",
            SparkMode::Local => "local",
            SparkMode::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SparkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Source language inferred from log content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SparkLanguage {
    Python,
    Scala,
    Java,
    Sql,
    R,
    #[default]
    Unknown,
}

impl SparkLanguage {
    pub fn label(&self) -> &'static str {
        match self {
            SparkLanguage::Python => "python",
            SparkLanguage::Scala => "scala",
            SparkLanguage::Java => "java",
            SparkLanguage::Sql => "sql",
            SparkLanguage::R => "r",
            SparkLanguage::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SparkLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Closed-set error category assigned to entries flagged error/warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Memory,
    Shuffle,
    Network,
    Serialization,
    Configuration,
    Permission,
    Storage,
    Executor,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Memory => "memory",
            Category::Shuffle => "shuffle",
            Category::Network => "network",
            Category::Serialization => "serialization",
            Category::Configuration => "configuration",
            Category::Permission => "permission",
            Category::Storage => "storage",
            Category::Executor => "executor",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How a LogFile entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestionSource {
    Upload,
    FolderWatch,
    Api,
}

impl IngestionSource {
    pub fn label(&self) -> &'static str {
        match self {
            IngestionSource::Upload => "upload",
            IngestionSource::FolderWatch => "folder_watch",
            IngestionSource::Api => "api",
        }
    }
}

/// Processing lifecycle state of a LogFile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingState {
    Pending,
    Processed,
    Failed,
}

/// An ingested artifact: one uploaded or watched log file and the
/// metadata produced by decoding and detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogFile {
    pub id: u64,
    pub file_hash: String,
    pub stored_filename: String,
    pub original_filename: String,
    pub path: PathBuf,
    pub file_size: u64,
    pub mime_type: Option<String>,
    pub source: IngestionSource,
    pub spark_mode: Option<SparkMode>,
    pub detected_language: Option<SparkLanguage>,
    pub state: ProcessingState,
    pub processed_at: Option<NaiveDateTime>,
    pub error_message: Option<String>,
}

/// One logical event reconstructed from one or more physical lines.
/// `is_error`/`is_warning` are mutually exclusive; `exception_type` implies
/// `is_error`; `has_stack_trace` agrees with `stack_trace`'s presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub log_file_id: u64,
    pub line_number: u64,
    pub raw_line: String,
    pub message: String,
    pub timestamp: Option<NaiveDateTime>,
    pub level: Option<Level>,
    pub component: Option<String>,
    pub executor_id: Option<String>,
    pub has_stack_trace: bool,
    pub stack_trace: Option<String>,
    pub exception_type: Option<String>,
    pub category: Option<Category>,
    pub is_error: bool,
    pub is_warning: bool,
}

impl LogEntry {
    /// Enforce the field invariants above. Called once by the assembler
    /// right before a finished entry is handed back to its caller.
    pub fn assert_invariants(&self) {
        debug_assert!(
            !(self.is_error && self.is_warning),
            "entry {} is both error and warning",
            self.id
        );
        debug_assert!(
            self.exception_type.is_none() || self.is_error,
            "entry {} has exception_type but is_error=false",
            self.id
        );
        debug_assert_eq!(
            self.has_stack_trace,
            self.stack_trace.is_some(),
            "entry {} has_stack_trace disagrees with stack_trace presence",
            self.id
        );
    }
}

/// Progress message emitted by a background ingestion/watch job.
#[derive(Debug, Clone)]
pub enum IngestProgress {
    /// New files discovered by the folder watcher, not yet submitted.
    NewFiles(Vec<PathBuf>),
    /// A file finished parsing successfully.
    Parsed {
        log_file_id: u64,
        entry_count: usize,
    },
    /// A file failed to parse.
    Failed { log_file_id: u64, reason: String },
}
