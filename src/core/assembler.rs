// core/assembler.rs
//
// One-pass streaming state machine that coalesces HEAD + CONT lines into
// logical entries. Never buffers the whole file; callers feed lines one at
// a time via `Assembler::feed` and finish with `Assembler::finish`.
//
// States: Idle -> Open -> Collecting.

use crate::core::classifier::{self, CategoryRule};
use crate::core::extractor::{self, ExtractedHead};
use crate::core::lexer::{self, Token};
use crate::core::model::LogEntry;
use crate::util::constants;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Open,
    Collecting,
}

struct PendingEntry {
    line_number: u64,
    raw_line: String,
    message: String,
    stack_lines: Vec<String>,
    head: ExtractedHead,
}

/// Streaming entry assembler. Holds at most one buffered entry at a time.
/// `'r` is the lifetime of the category rule table backing classification;
/// `new` borrows the built-in table (`'static`), `with_rules` borrows
/// whichever rule set the caller has loaded.
pub struct Assembler<'r> {
    state: State,
    pending: Option<PendingEntry>,
    line_number: u64,
    next_entry_id: u64,
    log_file_id: u64,
    max_entry_size: usize,
    category_rules: &'r [CategoryRule],
}

impl Assembler<'static> {
    pub fn new(log_file_id: u64) -> Self {
        Self::with_rules(log_file_id, classifier::default_rules())
    }
}

impl<'r> Assembler<'r> {
    /// Build an assembler that classifies against an explicit rule table
    /// (used when a loaded rule set overrides the built-in categories).
    pub fn with_rules(log_file_id: u64, category_rules: &'r [CategoryRule]) -> Self {
        Self {
            state: State::Idle,
            pending: None,
            line_number: 0,
            next_entry_id: 1,
            log_file_id,
            max_entry_size: constants::DEFAULT_MAX_ENTRY_SIZE,
            category_rules,
        }
    }

    /// Feed one physical line. Returns a completed entry if this line's
    /// arrival finalized the previously buffered one (i.e. this line is a
    /// new HEAD and an entry was already open).
    pub fn feed(&mut self, raw_line: &str) -> Option<LogEntry> {
        self.line_number += 1;
        let line = raw_line.trim_end_matches('\r');

        let entry_open = self.pending.is_some();
        let collecting = self.state == State::Collecting;
        let token = lexer::lex(line, entry_open, collecting);

        match (self.state, token) {
            (State::Idle, Token::Cont) => None,
            (_, Token::Head) => {
                let finished = self.take_pending();
                self.open_new(line);
                finished
            }
            (State::Open, Token::Cont) => {
                if lexer::is_stack_frame(line) {
                    self.state = State::Collecting;
                    self.push_stack_line(line);
                } else if let Some(p) = self.pending.as_mut() {
                    append_message(&mut p.message, line, self.max_entry_size);
                    if p.head.exception_type.is_none() {
                        if let Some(exc) = extractor::extract(line).exception_type {
                            p.head.exception_type = Some(exc);
                            p.head.is_error = true;
                        }
                    }
                }
                None
            }
            (State::Collecting, Token::Cont) => {
                self.push_stack_line(line);
                None
            }
            (State::Idle, Token::Head) => unreachable!("Head is matched above"),
        }
    }

    /// Flush any buffered entry at end-of-stream.
    pub fn finish(&mut self) -> Option<LogEntry> {
        self.take_pending()
    }

    fn open_new(&mut self, head_line: &str) {
        let head = extractor::extract(head_line);
        self.pending = Some(PendingEntry {
            line_number: self.line_number,
            raw_line: head_line.to_string(),
            message: head_line.to_string(),
            stack_lines: Vec::new(),
            head,
        });
        self.state = State::Open;
    }

    fn push_stack_line(&mut self, line: &str) {
        if let Some(p) = self.pending.as_mut() {
            if p.stack_lines.len() < constants::MAX_PARSE_ERRORS_PER_FILE {
                p.stack_lines.push(line.to_string());
            }
        }
    }

    fn take_pending(&mut self) -> Option<LogEntry> {
        let p = self.pending.take()?;
        self.state = State::Idle;

        let has_stack_trace = !p.stack_lines.is_empty();
        let stack_trace = has_stack_trace.then(|| p.stack_lines.join("\n"));

        // Caused-by promotion: if no exception type was found on the HEAD
        // or in plain continuations, look for it in the collected stack
        // frames (a "Caused by: X.Y.ZException" line nested in the trace).
        let exception_type = p.head.exception_type.clone().or_else(|| {
            p.stack_lines.iter().find_map(|l| {
                extractor::extract(l).exception_type.filter(|_| l.contains("Caused by"))
            })
        });
        let is_error = p.head.is_error || exception_type.is_some();

        // Classify against `message` (the head line plus any plain, non-stack
        // continuation lines), not just `raw_line`: an exception line such as
        // "java.lang.OutOfMemoryError: Java heap space" following a bare
        // "Exception in task..." head is appended to `message` rather than
        // `stack_lines`, so it would otherwise be invisible to the classifier.
        let category = if is_error || p.head.is_warning {
            classifier::classify_with_rules(&p.message, self.category_rules).or_else(|| {
                stack_trace
                    .as_deref()
                    .and_then(|s| classifier::classify_with_rules(s, self.category_rules))
            })
        } else {
            None
        };

        let id = self.next_entry_id;
        self.next_entry_id += 1;

        let entry = LogEntry {
            id,
            log_file_id: self.log_file_id,
            line_number: p.line_number,
            raw_line: p.raw_line,
            message: truncate(p.message, self.max_entry_size),
            timestamp: p.head.timestamp,
            level: p.head.level,
            component: p.head.component,
            executor_id: p.head.executor_id,
            has_stack_trace,
            stack_trace,
            exception_type,
            category,
            is_error,
            is_warning: p.head.is_warning && !is_error,
        };
        entry.assert_invariants();
        Some(entry)
    }
}

fn append_message(message: &mut String, line: &str, max_size: usize) {
    if message.len() >= max_size {
        return;
    }
    message.push('\n');
    message.push_str(line);
    if message.len() > max_size {
        message.truncate(max_size);
        message.push_str("... [truncated]");
    }
}

fn truncate(mut s: String, max_size: usize) -> String {
    if s.len() > max_size {
        s.truncate(max_size);
        s.push_str("... [truncated]");
    }
    s
}

/// Assemble a full decoded text into entries in one pass. Convenience
/// wrapper around `Assembler` for callers that already hold the whole
/// string (e.g. tests); the Ingestion Coordinator drives `Assembler`
/// directly from a buffered line reader so large files are never held
/// entirely in memory as a `Vec<String>`.
pub fn assemble_str(content: &str, log_file_id: u64) -> Vec<LogEntry> {
    assemble_str_with_rules(content, log_file_id, classifier::default_rules())
}

/// Same as [`assemble_str`], against an explicit category rule table.
pub fn assemble_str_with_rules(
    content: &str,
    log_file_id: u64,
    category_rules: &[CategoryRule],
) -> Vec<LogEntry> {
    let mut assembler = Assembler::with_rules(log_file_id, category_rules);
    let mut entries = Vec::new();
    for line in content.lines() {
        if let Some(entry) = assembler.feed(line) {
            entries.push(entry);
        }
    }
    if let Some(entry) = assembler.finish() {
        entries.push(entry);
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Category;

    #[test]
    fn single_info_line_yields_one_entry() {
        let content = "24/01/28 10:30:45 INFO SparkContext: Running Spark version 3.5.0";
        let entries = assemble_str(content, 1);
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].has_stack_trace);
        assert!(!entries[0].is_error);
    }

    #[test]
    fn error_with_stack_trace_and_next_head() {
        let content = "\
24/01/28 10:31:02 ERROR Executor: Exception in task 0.0 in stage 1.0
java.lang.OutOfMemoryError: Java heap space
\tat org.apache.spark.rdd.RDD.iterator(RDD.scala:289)
\tat org.apache.spark.scheduler.Task.run(Task.scala:131)
24/01/28 10:31:03 INFO BlockManager: Removing RDD 5";
        let entries = assemble_str(content, 1);
        assert_eq!(entries.len(), 2);
        let first = &entries[0];
        assert!(first.has_stack_trace);
        assert_eq!(
            first.stack_trace.as_deref().unwrap().lines().count(),
            2
        );
        assert_eq!(
            first.exception_type.as_deref(),
            Some("java.lang.OutOfMemoryError")
        );
        assert!(first.is_error);
        assert_eq!(first.category, Some(Category::Memory));
        assert!(!entries[1].has_stack_trace);
    }

    #[test]
    fn no_head_yields_zero_entries() {
        let content = "\tat some.Frame(x.scala:1)\n\tat another.Frame(y.scala:2)";
        assert!(assemble_str(content, 1).is_empty());
    }

    #[test]
    fn empty_file_yields_zero_entries() {
        assert!(assemble_str("", 1).is_empty());
    }

    #[test]
    fn shuffle_fetch_failed_is_warning_and_shuffle_category() {
        let content = "24/01/28 10:32:00 WARN TaskSetManager: FetchFailed for shuffle 0";
        let entries = assemble_str(content, 1);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_warning);
        assert_eq!(entries[0].category, Some(Category::Shuffle));
    }

    #[test]
    fn custom_category_rules_override_classification() {
        let rules = classifier::compile_rules(&[(
            Category::Permission,
            "TotallyCustomMemoryMarker".to_string(),
        )])
        .unwrap();

        let content = "24/01/28 10:31:02 ERROR Executor: Exception in task 0.0 in stage 1.0\n\
java.lang.OutOfMemoryError: Java heap space\n\
TotallyCustomMemoryMarker";
        let entries = assemble_str_with_rules(content, 1, &rules);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, Some(Category::Permission));
    }
}
