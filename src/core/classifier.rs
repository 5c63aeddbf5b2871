// core/classifier.rs
//
// Assigns a closed-set error category to entries already flagged as error
// or warning. A rule set (core::rules) may override the default pattern
// table without recompiling the binary.

use crate::core::model::Category;
use regex::Regex;
use std::sync::OnceLock;

pub struct CategoryRule {
    category: Category,
    pattern: Regex,
}

static DEFAULT_RULES: OnceLock<Vec<CategoryRule>> = OnceLock::new();

/// The built-in, hardcoded category table, used when no rule set overrides
/// it (and as the fallback for a loaded rule set with empty categories).
pub fn default_rules() -> &'static [CategoryRule] {
    DEFAULT_RULES.get_or_init(|| {
        vec![
            rule(Category::Memory, r"(?i)OutOfMemory|OOM|heap space|GC overhead"),
            rule(Category::Shuffle, r"(?i)shuffle|FetchFailed|ShuffleMapTask"),
            rule(Category::Network, r"(?i)connection|timeout|refused|network"),
            rule(
                Category::Serialization,
                r"(?i)serializ|deserializ|NotSerializable",
            ),
            rule(
                Category::Configuration,
                r"(?i)config|property|setting|parameter",
            ),
            rule(
                Category::Permission,
                r"(?i)permission|access denied|authorization",
            ),
            rule(
                Category::Storage,
                r"(?i)disk|storage|hdfs|s3|file not found",
            ),
            rule(
                Category::Executor,
                r"(?i)executor.*lost|executor.*failed|heartbeat",
            ),
        ]
    })
}

fn rule(category: Category, pattern: &str) -> CategoryRule {
    CategoryRule {
        category,
        pattern: Regex::new(pattern).unwrap(),
    }
}

/// Classify `line` against the closed category table. Only meaningful when
/// the caller has already established `is_error || is_warning`; the
/// classifier itself does not re-check that condition.
pub fn classify(line: &str) -> Option<Category> {
    classify_with_rules(line, default_rules())
}

/// Classify against an explicit, ordered rule set (used when a custom rule
/// set has been loaded). First matching rule wins.
pub fn classify_with_rules(line: &str, rules: &[CategoryRule]) -> Option<Category> {
    rules
        .iter()
        .find(|r| r.pattern.is_match(line))
        .map(|r| r.category)
}

/// Build a custom rule list from `(category, pattern)` pairs, used by
/// core::rules when a loaded rule set overrides the built-in table.
pub fn compile_rules(defs: &[(Category, String)]) -> Result<Vec<CategoryRule>, regex::Error> {
    defs.iter()
        .map(|(cat, pat)| Regex::new(pat).map(|re| CategoryRule {
            category: *cat,
            pattern: re,
        }))
        .collect()
}
