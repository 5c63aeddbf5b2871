// app/watcher.rs
//
// Folder watcher: polls the configured watch directory on a background
// thread and reports newly-created files matching the supported
// extensions. Implemented as a polling thread rather than an OS
// file-event API, the same mechanism this codebase already uses for
// directory watching.
//
// Architecture:
//   - `FolderWatcher` lives on the caller's thread; `run_watcher` executes
//     on a background thread polling the directory on a fixed interval.
//   - An `Arc<AtomicBool>` cancel flag allows the caller to stop the watcher.
//   - New file paths are sent as `IngestProgress::NewFiles` over an mpsc channel.
//   - `known_paths` is updated immediately after each send so a slow-draining
//     channel does not cause duplicate reports.

use crate::core::model::IngestProgress;
use crate::util::constants::WATCH_CANCEL_CHECK_INTERVAL_MS;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

/// Configuration for the folder watcher.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// File extensions (with leading dot, e.g. ".log") a file must match.
    pub supported_extensions: Vec<String>,
    /// Maximum directory recursion depth.
    pub max_depth: usize,
    /// How often to poll the directory tree for new files (seconds).
    pub poll_interval_seconds: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        use crate::util::constants;
        Self {
            supported_extensions: constants::DEFAULT_SUPPORTED_EXTENSIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            max_depth: constants::DEFAULT_MAX_DEPTH,
            poll_interval_seconds: constants::DEFAULT_WATCH_POLL_INTERVAL_SECONDS,
        }
    }
}

/// Manages a background folder-watching thread.
pub struct FolderWatcher {
    pub progress_rx: Option<mpsc::Receiver<IngestProgress>>,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl FolderWatcher {
    pub fn new() -> Self {
        Self {
            progress_rx: None,
            cancel_flag: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .map(|f| !f.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Start watching `root` for new files. `known_paths` is the set of
    /// file paths already accounted for by a prior startup scan.
    pub fn start_watch(&mut self, root: PathBuf, known_paths: HashSet<PathBuf>, config: WatchConfig) {
        self.stop_watch();

        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel_flag = Some(Arc::clone(&cancel));

        let (tx, rx) = mpsc::channel();
        self.progress_rx = Some(rx);

        std::thread::spawn(move || {
            run_watcher(root, known_paths, config, tx, cancel);
        });

        tracing::debug!("Folder watcher started");
    }

    pub fn stop_watch(&mut self) {
        if let Some(flag) = self.cancel_flag.take() {
            flag.store(true, Ordering::Relaxed);
        }
        self.progress_rx = None;
    }

    /// Drain all pending messages from the background thread without blocking.
    pub fn poll_progress(&mut self) -> Vec<IngestProgress> {
        let Some(rx) = &self.progress_rx else {
            return Vec::new();
        };
        let mut messages = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(msg) => messages.push(msg),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.progress_rx = None;
                    self.cancel_flag = None;
                    break;
                }
            }
        }
        messages
    }
}

impl Default for FolderWatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn run_watcher(
    root: PathBuf,
    mut known_paths: HashSet<PathBuf>,
    config: WatchConfig,
    tx: mpsc::Sender<IngestProgress>,
    cancel: Arc<AtomicBool>,
) {
    let poll_interval = Duration::from_secs(config.poll_interval_seconds.max(1));
    let cancel_check = Duration::from_millis(WATCH_CANCEL_CHECK_INTERVAL_MS);
    let sub_iters: u32 = (poll_interval.as_millis() / cancel_check.as_millis()).max(1) as u32;

    tracing::debug!(root = %root.display(), known = known_paths.len(), "Folder watcher thread running");

    loop {
        for _ in 0..sub_iters {
            if cancel.load(Ordering::Relaxed) {
                tracing::debug!("Folder watcher thread: cancel flag set, exiting");
                return;
            }
            std::thread::sleep(cancel_check);
        }

        if cancel.load(Ordering::Relaxed) {
            return;
        }

        let new_files = walk_for_new_files(&root, &known_paths, &config);

        if !new_files.is_empty() {
            tracing::debug!(count = new_files.len(), "Folder watcher: new files detected");
            for p in &new_files {
                known_paths.insert(p.clone());
            }
            if tx.send(IngestProgress::NewFiles(new_files)).is_err() {
                tracing::debug!("Folder watcher: receiver dropped, exiting");
                return;
            }
        }
    }
}

fn walk_for_new_files(root: &Path, known_paths: &HashSet<PathBuf>, config: &WatchConfig) -> Vec<PathBuf> {
    let mut found = Vec::new();

    let walker = walkdir::WalkDir::new(root)
        .max_depth(config.max_depth)
        .follow_links(false)
        .into_iter();

    for entry in walker.flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path().to_path_buf();
        if known_paths.contains(&path) {
            continue;
        }
        if has_supported_extension(&path, &config.supported_extensions) {
            found.push(path);
        }
    }

    found
}

fn has_supported_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|ext| name.to_ascii_lowercase().ends_with(&ext.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn walk_finds_new_supported_file_and_skips_known() {
        let dir = TempDir::new().expect("tmpdir");
        let new_path = dir.path().join("app.log");
        fs::write(&new_path, b"hello").expect("write");

        let config = WatchConfig::default();
        let known = HashSet::new();
        let found = walk_for_new_files(dir.path(), &known, &config);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], new_path);

        let mut known2 = HashSet::new();
        known2.insert(new_path.clone());
        let found2 = walk_for_new_files(dir.path(), &known2, &config);
        assert!(found2.is_empty());
    }

    #[test]
    fn unsupported_extension_is_ignored() {
        let dir = TempDir::new().expect("tmpdir");
        fs::write(dir.path().join("readme.md"), b"").expect("write");

        let config = WatchConfig::default();
        let known = HashSet::new();
        let found = walk_for_new_files(dir.path(), &known, &config);
        assert!(found.is_empty());
    }

    #[test]
    fn watcher_start_stop_does_not_panic() {
        let dir = TempDir::new().expect("tmpdir");
        let mut watcher = FolderWatcher::new();
        assert!(!watcher.is_active());
        watcher.start_watch(dir.path().to_path_buf(), HashSet::new(), WatchConfig::default());
        assert!(watcher.is_active());
        watcher.stop_watch();
    }
}
