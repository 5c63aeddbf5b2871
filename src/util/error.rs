// util/error.rs
//
// Typed error hierarchy with context-preserving error chains. No
// string-based error propagation: every fallible function returns a
// `Result<T, E>` over one of these enums.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all engine operations.
#[derive(Debug)]
pub enum EngineError {
    /// Content decoding (gzip/zip/plain) failed.
    Decode(DecodeError),

    /// Rule set loading or validation failed.
    Rules(RulesError),

    /// Ingestion (upload/watch/parse) failed.
    Ingest(IngestError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "Decode error: {e}"),
            Self::Rules(e) => write!(f, "Rule set error: {e}"),
            Self::Ingest(e) => write!(f, "Ingestion error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            Self::Rules(e) => Some(e),
            Self::Ingest(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

/// Errors from the transparent gzip/zip/plain decoder.
#[derive(Debug)]
pub enum DecodeError {
    /// The `.gz` container could not be inflated.
    Gzip { source: io::Error },

    /// The `.zip` container could not be opened or read.
    Zip { source: zip::result::ZipError },

    /// I/O error reading a member of a container.
    Io { source: io::Error },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gzip { source } => write!(f, "failed to inflate gzip content: {source}"),
            Self::Zip { source } => write!(f, "failed to read zip container: {source}"),
            Self::Io { source } => write!(f, "I/O error reading container member: {source}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gzip { source } => Some(source),
            Self::Zip { source } => Some(source),
            Self::Io { source } => Some(source),
        }
    }
}

impl From<DecodeError> for EngineError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Rules errors
// ---------------------------------------------------------------------------

/// Errors related to rule set loading and validation.
#[derive(Debug)]
pub enum RulesError {
    /// TOML file could not be parsed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Rule set file exceeds the maximum allowed size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// A required field is missing from the rule set definition.
    MissingField {
        rule_set_id: String,
        field: &'static str,
    },

    /// A category name is not one of the closed set.
    UnknownCategory { rule_set_id: String, name: String },

    /// A `patterns.language` key is not one of the closed set.
    UnknownLanguage { rule_set_id: String, name: String },

    /// A `patterns.mode` key is not one of the closed set.
    UnknownMode { rule_set_id: String, name: String },

    /// A regex pattern in the rule set is invalid.
    InvalidRegex {
        rule_set_id: String,
        source: regex::Error,
    },

    /// A regex pattern exceeds the maximum allowed length.
    RegexTooLong {
        rule_set_id: String,
        length: usize,
        max_length: usize,
    },

    /// Maximum number of rule sets exceeded.
    TooManyRuleSets { count: usize, max: usize },

    /// I/O error reading a rule set file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for RulesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "failed to parse TOML '{}': {source}", path.display())
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "rule set '{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::MissingField { rule_set_id, field } => {
                write!(f, "rule set '{rule_set_id}': missing required field '{field}'")
            }
            Self::UnknownCategory { rule_set_id, name } => write!(
                f,
                "rule set '{rule_set_id}': unknown category '{name}'"
            ),
            Self::UnknownLanguage { rule_set_id, name } => write!(
                f,
                "rule set '{rule_set_id}': unknown language '{name}'"
            ),
            Self::UnknownMode { rule_set_id, name } => write!(
                f,
                "rule set '{rule_set_id}': unknown mode '{name}'"
            ),
            Self::InvalidRegex { rule_set_id, source } => {
                write!(f, "rule set '{rule_set_id}': invalid regex: {source}")
            }
            Self::RegexTooLong {
                rule_set_id,
                length,
                max_length,
            } => write!(
                f,
                "rule set '{rule_set_id}': regex is {length} chars, exceeds maximum of {max_length}"
            ),
            Self::TooManyRuleSets { count, max } => {
                write!(f, "too many rule sets loaded ({count}), maximum is {max}")
            }
            Self::Io { path, source } => {
                write!(f, "I/O error reading rule set '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for RulesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::InvalidRegex { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<RulesError> for EngineError {
    fn from(e: RulesError) -> Self {
        Self::Rules(e)
    }
}

// ---------------------------------------------------------------------------
// Ingest errors
// ---------------------------------------------------------------------------

/// Errors related to ingestion: accepting, storing, and parsing a log
/// artifact.
#[derive(Debug)]
pub enum IngestError {
    /// File extension is not in the supported set.
    UnsupportedFormat { filename: String },

    /// File size exceeds the configured maximum.
    TooLarge { size: u64, max_size: u64 },

    /// Content could not be decoded.
    Decode(DecodeError),

    /// Parsing was aborted by a cancellation signal.
    ParseAbort { reason: String },

    /// Persisting entries or finalising the LogFile record failed.
    PersistenceError { reason: String },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat { filename } => {
                write!(f, "unsupported file format: '{filename}'")
            }
            Self::TooLarge { size, max_size } => write!(
                f,
                "file is {size} bytes, exceeds maximum of {max_size} bytes"
            ),
            Self::Decode(e) => write!(f, "decode failed: {e}"),
            Self::ParseAbort { reason } => write!(f, "parse aborted: {reason}"),
            Self::PersistenceError { reason } => write!(f, "persistence failed: {reason}"),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<IngestError> for EngineError {
    fn from(e: IngestError) -> Self {
        Self::Ingest(e)
    }
}

impl From<DecodeError> for IngestError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for engine results.
pub type Result<T> = std::result::Result<T, EngineError>;
