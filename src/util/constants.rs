// util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "Spark Log Engine";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "SparkLogEngine";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Ingestion limits
// =============================================================================

/// Default maximum upload size in megabytes.
pub const DEFAULT_MAX_UPLOAD_SIZE_MB: u64 = 100;

/// Default supported file extensions for ingestion (upload and watch).
pub const DEFAULT_SUPPORTED_EXTENSIONS: &[&str] = &[".log", ".txt", ".gz", ".zip"];

/// Number of entries persisted per batch during finalisation.
pub const DEFAULT_ENTRY_BATCH_SIZE: usize = 500;

// =============================================================================
// Parsing limits
// =============================================================================

/// Default read chunk size in bytes for streaming file reads.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024; // 64 KB

/// Maximum size of a single log entry in bytes. Entries exceeding this are
/// truncated to prevent unbounded memory from malformed files.
pub const DEFAULT_MAX_ENTRY_SIZE: usize = 64 * 1024; // 64 KB

/// File size threshold in bytes above which ingestion logs a large-file note.
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024; // 100 MB

/// Maximum number of parse errors/stack frames tracked per file.
pub const MAX_PARSE_ERRORS_PER_FILE: usize = 1_000;

/// Hard upper bound on the total number of log entries held in memory at once.
pub const MAX_TOTAL_ENTRIES: usize = 1_000_000;

// =============================================================================
// Folder watcher limits
// =============================================================================

/// Default polling interval for the folder watcher, in seconds.
pub const DEFAULT_WATCH_POLL_INTERVAL_SECONDS: u64 = 30;

/// Minimum user-configurable watch poll interval (seconds).
pub const MIN_WATCH_POLL_INTERVAL_SECONDS: u64 = 1;

/// Maximum user-configurable watch poll interval (seconds).
pub const MAX_WATCH_POLL_INTERVAL_SECONDS: u64 = 3_600;

/// How often the cancel flag is checked within each watcher poll sleep (ms).
pub const WATCH_CANCEL_CHECK_INTERVAL_MS: u64 = 100;

/// Maximum directory recursion depth for the one-time startup scan.
pub const DEFAULT_MAX_DEPTH: usize = 10;

// =============================================================================
// Rule set limits
// =============================================================================

/// Maximum number of rule sets that can be loaded (built-in + user).
pub const MAX_RULE_SETS: usize = 100;

/// Maximum size of a rule set TOML file in bytes.
pub const MAX_RULE_SET_FILE_SIZE: u64 = 64 * 1024; // 64 KB

/// Maximum regex pattern length to prevent ReDoS.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4_096;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// User rule sets subdirectory name.
pub const RULES_DIR_NAME: &str = "rules";
