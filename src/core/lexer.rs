// core/lexer.rs
//
// Classifies a single physical line as HEAD (begins a new logical entry) or
// CONT (continuation). The lexer never looks beyond the current line and
// the assembler's current state; it holds no buffering of its own.

use std::sync::OnceLock;

static LEVEL_PATTERN: OnceLock<regex::Regex> = OnceLock::new();
static STACK_FRAME_PATTERN: OnceLock<regex::Regex> = OnceLock::new();

fn level_pattern() -> &'static regex::Regex {
    LEVEL_PATTERN.get_or_init(|| {
        regex::Regex::new(r"(?i)\b(DEBUG|INFO|WARN|WARNING|ERROR|FATAL|SEVERE)\b").unwrap()
    })
}

fn stack_frame_pattern() -> &'static regex::Regex {
    STACK_FRAME_PATTERN.get_or_init(|| regex::Regex::new(r"^\s+at\s+[\w.$]+\(.*\)").unwrap())
}

/// Token produced for one physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Head,
    Cont,
}

/// Returns the matched level token's text, if the line contains one.
pub fn find_level_token(line: &str) -> Option<&str> {
    level_pattern().find(line).map(|m| m.as_str())
}

/// True if `line` matches the JVM-style stack frame shape
/// (`\tat package.Class.method(File.scala:NN)`).
pub fn is_stack_frame(line: &str) -> bool {
    stack_frame_pattern().is_match(line)
}

/// Classify `line` given whether an entry is currently open and whether
/// stack-frame collection is currently active.
pub fn lex(line: &str, entry_open: bool, collecting_stack_trace: bool) -> Token {
    if find_level_token(line).is_some() {
        return Token::Head;
    }
    if is_stack_frame(line) {
        return Token::Cont;
    }
    if collecting_stack_trace && !line.is_empty() {
        return Token::Cont;
    }
    if entry_open && (line.starts_with('\t') || line.starts_with(' ')) {
        return Token::Cont;
    }
    Token::Cont
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_line_has_level_token() {
        let line = "24/01/28 10:31:02 ERROR Executor: Exception in task 0.0 in stage 1.0";
        assert_eq!(lex(line, false, false), Token::Head);
    }

    #[test]
    fn stack_frame_is_cont() {
        let line = "\tat org.apache.spark.rdd.RDD.iterator(RDD.scala:289)";
        assert_eq!(lex(line, true, false), Token::Cont);
        assert!(is_stack_frame(line));
    }

    #[test]
    fn warning_normalizes_detection_but_token_text_is_original() {
        let line = "24/01/28 10:31:02 WARNING BlockManager: low on space";
        assert_eq!(find_level_token(line).unwrap(), "WARNING");
    }

    #[test]
    fn indented_line_while_collecting_is_cont_even_without_at() {
        assert_eq!(lex("\tCaused by: java.io.IOException", false, true), Token::Cont);
    }
}
