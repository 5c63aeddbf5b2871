// core/extractor.rs
//
// Pure field extraction from a HEAD line: timestamp, level, component,
// executor id, exception type. Every pattern is compiled once and shared
// immutably, mirroring the OnceLock-cached regex approach used elsewhere
// in this codebase for compiled-once pattern sets.

use crate::core::model::Level;
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::OnceLock;

struct Patterns {
    timestamp_comma_or_dot_millis: Regex,
    timestamp_slash_short_year: Regex,
    timestamp_unix: Regex,
    component_bracketed: Regex,
    component_heuristic: Regex,
    executor_id: Regex,
    exception_colon: Regex,
    error_colon: Regex,
    caused_by: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| Patterns {
        timestamp_comma_or_dot_millis: Regex::new(
            r"(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}[,.]\d{3})",
        )
        .unwrap(),
        timestamp_slash_short_year: Regex::new(r"(\d{2}/\d{2}/\d{2}\s+\d{2}:\d{2}:\d{2})")
            .unwrap(),
        timestamp_unix: Regex::new(r"timestamp[=:]\s*(\d{10,13})").unwrap(),
        component_bracketed: Regex::new(r"\[([A-Za-z][A-Za-z0-9_\-.]+)\]").unwrap(),
        component_heuristic: Regex::new(r"(\w+Context|\w+Executor|\w+Driver|\w+Manager)")
            .unwrap(),
        executor_id: Regex::new(r"(?i)executor[_\s-]?(\d+|driver)").unwrap(),
        exception_colon: Regex::new(r"([\w.]+Exception):\s*(.+)").unwrap(),
        error_colon: Regex::new(r"([\w.]+Error):\s*(.+)").unwrap(),
        caused_by: Regex::new(r"Caused by:\s*([\w.]+(?:Exception|Error))").unwrap(),
    })
}

/// All fields the Extractor can pull from a single HEAD line.
#[derive(Debug, Clone, Default)]
pub struct ExtractedHead {
    pub level: Option<Level>,
    pub is_error: bool,
    pub is_warning: bool,
    pub timestamp: Option<NaiveDateTime>,
    pub component: Option<String>,
    pub executor_id: Option<String>,
    pub exception_type: Option<String>,
}

/// Extract level, timestamp, component, executor id, and exception type from
/// a HEAD line, trying timestamp formats in order from most to least specific.
pub fn extract(line: &str) -> ExtractedHead {
    let p = patterns();
    let mut out = ExtractedHead::default();

    if let Some(token) = crate::core::lexer::find_level_token(line) {
        if let Some(level) = Level::from_token(token) {
            out.is_error = matches!(level, Level::Error | Level::Fatal);
            out.is_warning = matches!(level, Level::Warn);
            out.level = Some(level);
        }
    }

    out.timestamp = extract_timestamp(line, p);
    out.component = extract_component(line, p);
    out.executor_id = p
        .executor_id
        .captures(line)
        .map(|c| c[1].to_ascii_lowercase());

    if let Some(exc) = extract_exception_type(line, p) {
        out.exception_type = Some(exc);
        out.is_error = true;
    }

    out
}

fn extract_component(line: &str, p: &Patterns) -> Option<String> {
    if let Some(c) = p.component_bracketed.captures(line) {
        return Some(c[1].to_string());
    }
    if let Some(c) = p.component_heuristic.captures(line) {
        return Some(c[1].to_string());
    }
    None
}

fn extract_exception_type(line: &str, p: &Patterns) -> Option<String> {
    if let Some(c) = p.exception_colon.captures(line) {
        return Some(c[1].to_string());
    }
    if let Some(c) = p.error_colon.captures(line) {
        return Some(c[1].to_string());
    }
    if let Some(c) = p.caused_by.captures(line) {
        return Some(c[1].to_string());
    }
    None
}

fn extract_timestamp(line: &str, p: &Patterns) -> Option<NaiveDateTime> {
    if let Some(c) = p.timestamp_comma_or_dot_millis.captures(line) {
        let raw = c[1].replace(',', ".");
        if let Ok(ts) = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f") {
            return Some(ts);
        }
    }
    if let Some(c) = p.timestamp_slash_short_year.captures(line) {
        if let Ok(ts) = NaiveDateTime::parse_from_str(&c[1], "%y/%m/%d %H:%M:%S") {
            return Some(ts);
        }
    }
    if let Some(c) = p.timestamp_unix.captures(line) {
        if let Ok(raw) = c[1].parse::<f64>() {
            // 13-digit captures are milliseconds; anything else is seconds.
            let millis = if raw > 1e12 { raw } else { raw * 1000.0 };
            let secs = (millis / 1000.0).floor() as i64;
            let nanos = ((millis % 1000.0) * 1_000_000.0) as u32;
            if let Some(ts) = chrono::DateTime::from_timestamp(secs, nanos) {
                return Some(ts.naive_utc());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_short_year_slash_timestamp_and_level_and_component() {
        let line = "24/01/28 10:30:45 INFO SparkContext: Running Spark version 3.5.0";
        let e = extract(line);
        assert_eq!(e.level, Some(Level::Info));
        assert!(!e.is_error);
        assert_eq!(e.component.as_deref(), Some("SparkContext"));
        assert_eq!(
            e.timestamp.unwrap(),
            NaiveDateTime::parse_from_str("2024-01-28 10:30:45", "%Y-%m-%d %H:%M:%S").unwrap()
        );
    }

    #[test]
    fn extracts_comma_millis_timestamp() {
        let line = "2024-01-28 10:30:45,123 ERROR Executor: boom";
        let e = extract(line);
        assert_eq!(e.timestamp.unwrap().and_utc().timestamp_subsec_millis(), 123);
    }

    #[test]
    fn exception_sets_is_error_even_on_info_line() {
        let line = "24/01/28 10:31:02 INFO Task: java.lang.OutOfMemoryError: Java heap space";
        let e = extract(line);
        assert_eq!(e.exception_type.as_deref(), Some("java.lang.OutOfMemoryError"));
        assert!(e.is_error);
    }

    #[test]
    fn executor_id_matches_numeric_and_driver() {
        assert_eq!(
            extract("... executor_3 lost ...").executor_id.as_deref(),
            Some("3")
        );
        assert_eq!(
            extract("... Executor driver: started ...").executor_id.as_deref(),
            Some("driver")
        );
    }

    #[test]
    fn unix_millis_timestamp_disambiguated_from_seconds() {
        let e = extract("event timestamp=1706438400000 INFO Driver: tick");
        assert!(e.timestamp.is_some());
        let e2 = extract("event timestamp=1706438400 INFO Driver: tick");
        assert_eq!(e.timestamp.unwrap(), e2.timestamp.unwrap());
    }
}
