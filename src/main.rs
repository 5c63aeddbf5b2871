// main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Logging initialisation (debug mode support)
// 3. Configuration and rule set loading (built-in + user-defined)
// 4. Dispatch into the ingestion coordinator or folder watcher

pub use spark_log_engine::app;
pub use spark_log_engine::core;
pub use spark_log_engine::platform;
pub use spark_log_engine::util;

use app::config::AppConfig;
use app::ingest::{self, ActiveRules, IngestConfig, IngestRequest};
use app::store::{InMemoryLogStore, LogStore};
use app::watcher::{FolderWatcher, WatchConfig};
use clap::{Parser, Subcommand};
use core::model::IngestionSource;
use core::rules::RuleSet;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Apache Spark log parsing, normalisation, and ingestion engine.
#[derive(Parser, Debug)]
#[command(name = "spark-log-engine", version, about)]
struct Cli {
    /// Path to config.toml (platform default if omitted).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Additional directory containing user-defined rule sets.
    #[arg(short = 'r', long = "rules-dir")]
    rules_dir: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest and parse a single log file (plain, .gz, or .zip).
    Ingest {
        /// Path to the log file to ingest.
        path: PathBuf,

        /// Print parsed entries as JSON instead of a summary line.
        #[arg(long)]
        json: bool,
    },
    /// Watch a directory for new log files, ingesting and parsing each.
    /// Defaults to the configured watch directory if omitted.
    Watch {
        /// Directory to watch.
        path: Option<PathBuf>,
    },
    /// Print resolved platform paths (config dir, rules dir, data dir).
    Paths,
}

fn main() {
    let cli = Cli::parse();

    let platform_paths = platform::config::PlatformPaths::resolve();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| platform_paths.config_dir.join(util::constants::CONFIG_FILE_NAME));
    let config = match AppConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    util::logging::init(cli.debug, Some(&config.log_level));

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "Spark Log Engine starting"
    );

    let rules_dir = cli
        .rules_dir
        .clone()
        .unwrap_or_else(|| platform_paths.user_rules_dir.clone());
    let (rule_sets, rule_errors) = app::rules_mgr::load_all_rule_sets(Some(&rules_dir));
    for err in &rule_errors {
        tracing::warn!(error = %err, "Rule set loading warning");
    }
    tracing::info!(rule_sets = rule_sets.len(), "Rule sets loaded");
    let active_rules = active_rule_set(&rule_sets);

    let store = InMemoryLogStore::new();

    let result = match cli.command {
        Command::Ingest { path, json } => run_ingest(&path, json, &config, &store, &active_rules),
        Command::Watch { path } => {
            let watch_path = path.unwrap_or_else(|| config.log_watch_dir.clone());
            run_watch(&watch_path, &config, &store, &active_rules)
        }
        Command::Paths => {
            println!("config dir: {}", platform_paths.config_dir.display());
            println!("rules dir:  {}", platform_paths.user_rules_dir.display());
            println!("data dir:   {}", platform_paths.data_dir.display());
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// The rule set that actually governs parsing: the first loaded rule set
/// (built-in, or a user override of it by id) if one loaded successfully,
/// falling back to the compiled-in defaults otherwise. A loaded rule set
/// that leaves `patterns.language`/`patterns.mode` unset still defers to the
/// built-in detector tables for those two concerns.
fn active_rule_set(rule_sets: &[RuleSet]) -> ActiveRules<'_> {
    match rule_sets.first() {
        Some(r) => ActiveRules {
            category_rules: &r.category_rules,
            language_rules: if r.language_rules.is_empty() {
                core::detector::default_language_rules()
            } else {
                &r.language_rules
            },
            mode_rules: if r.mode_rules.is_empty() {
                core::detector::default_mode_rules()
            } else {
                &r.mode_rules
            },
        },
        None => ActiveRules::defaults(),
    }
}

fn ingest_config(config: &AppConfig) -> IngestConfig {
    IngestConfig {
        upload_dir: config.log_upload_dir.clone(),
        max_upload_size_mb: config.max_upload_size_mb,
        supported_extensions: config.supported_extensions.clone(),
    }
}

fn run_ingest(
    path: &std::path::Path,
    json: bool,
    config: &AppConfig,
    store: &dyn LogStore,
    rules: &ActiveRules,
) -> Result<(), String> {
    let bytes = std::fs::read(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let original_filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    let req = IngestRequest {
        original_filename,
        bytes,
        source: IngestionSource::Upload,
    };

    let id = ingest::ingest_bytes(req, &ingest_config(config), store).map_err(|e| e.to_string())?;
    let entry_count = ingest::parse_log_file(id, store, rules, None).map_err(|e| e.to_string())?;

    let record = store.load_log_file(id).expect("just-saved log file must exist");

    if json {
        let entries = store.load_entries(id);
        let output = serde_json::json!({
            "log_file": record,
            "entries": entries,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?
        );
    } else {
        println!(
            "log_file_id={id} state={:?} mode={:?} language={:?} entries={entry_count}",
            record.state, record.spark_mode, record.detected_language
        );
    }

    Ok(())
}

fn run_watch(
    path: &std::path::Path,
    config: &AppConfig,
    store: &dyn LogStore,
    rules: &ActiveRules,
) -> Result<(), String> {
    if !path.is_dir() {
        return Err(format!("{} is not a directory", path.display()));
    }

    let known_paths: HashSet<PathBuf> = walkdir::WalkDir::new(path)
        .max_depth(util::constants::DEFAULT_MAX_DEPTH)
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .collect();

    tracing::info!(path = %path.display(), known = known_paths.len(), "Starting folder watch");

    let watch_config = WatchConfig {
        supported_extensions: config.supported_extensions.clone(),
        max_depth: util::constants::DEFAULT_MAX_DEPTH,
        poll_interval_seconds: config.watch_poll_interval_seconds,
    };

    let mut watcher = FolderWatcher::new();
    watcher.start_watch(path.to_path_buf(), known_paths, watch_config);

    println!("Watching {} (Ctrl+C to stop)", path.display());

    loop {
        for progress in watcher.poll_progress() {
            if let core::model::IngestProgress::NewFiles(paths) = progress {
                for new_path in paths {
                    if let Err(e) = ingest_and_parse(&new_path, config, store, rules) {
                        tracing::warn!(path = %new_path.display(), error = %e, "Failed to ingest watched file");
                    }
                }
            }
        }
        std::thread::sleep(Duration::from_millis(util::constants::WATCH_CANCEL_CHECK_INTERVAL_MS));
    }
}

fn ingest_and_parse(
    path: &std::path::Path,
    config: &AppConfig,
    store: &dyn LogStore,
    rules: &ActiveRules,
) -> Result<(), String> {
    let bytes = std::fs::read(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let original_filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    let req = IngestRequest {
        original_filename,
        bytes,
        source: IngestionSource::FolderWatch,
    };

    let id = ingest::ingest_bytes(req, &ingest_config(config), store).map_err(|e| e.to_string())?;
    let entry_count = ingest::parse_log_file(id, store, rules, None).map_err(|e| e.to_string())?;
    println!("watched file ingested: {} -> {entry_count} entries", path.display());
    Ok(())
}
