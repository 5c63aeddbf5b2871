// core/detector.rs
//
// Full-content, once-per-file scan that picks the most likely source
// language and deployment mode. Unlike the per-line Extractor, this looks
// at the whole decoded text once.

use crate::core::model::{SparkLanguage, SparkMode};
use regex::Regex;
use std::sync::OnceLock;

/// A language's compiled detector patterns. Presence of more than one
/// pattern means a content scan counts distinct matches, not occurrences.
pub struct LanguageRule {
    language: SparkLanguage,
    patterns: Vec<Regex>,
}

/// A mode's compiled detector patterns. Any pattern matching is enough.
pub struct ModeRule {
    mode: SparkMode,
    patterns: Vec<Regex>,
}

static LANGUAGE_RULES: OnceLock<Vec<LanguageRule>> = OnceLock::new();
static MODE_RULES: OnceLock<Vec<ModeRule>> = OnceLock::new();

fn language_rules() -> &'static [LanguageRule] {
    LANGUAGE_RULES.get_or_init(|| {
        vec![
            LanguageRule {
                language: SparkLanguage::Python,
                patterns: vec![
                    Regex::new(r"(?i)pyspark|python|\.py\b").unwrap(),
                    Regex::new(r"Traceback \(most recent call last\)").unwrap(),
                    Regex::new(r#"File ".*\.py""#).unwrap(),
                ],
            },
            LanguageRule {
                language: SparkLanguage::Scala,
                patterns: vec![
                    Regex::new(r"(?i)scala\.|\.scala\b").unwrap(),
                    Regex::new(r"at scala\.").unwrap(),
                ],
            },
            LanguageRule {
                language: SparkLanguage::Java,
                patterns: vec![
                    Regex::new(r"(?i)java\.|\.java\b").unwrap(),
                    Regex::new(r"at java\.").unwrap(),
                    Regex::new(r"at org\.apache\.spark").unwrap(),
                ],
            },
            LanguageRule {
                language: SparkLanguage::Sql,
                patterns: vec![
                    Regex::new(r"(?i)spark\.sql|SparkSQL").unwrap(),
                    Regex::new(r"(?i)SELECT|INSERT|UPDATE|CREATE TABLE").unwrap(),
                ],
            },
            LanguageRule {
                language: SparkLanguage::R,
                patterns: vec![Regex::new(r"(?i)sparkR|\.r\b").unwrap()],
            },
        ]
    })
}

fn mode_rules() -> &'static [ModeRule] {
    MODE_RULES.get_or_init(|| {
        vec![
            ModeRule {
                mode: SparkMode::Yarn,
                patterns: vec![Regex::new(r"(?i)yarn|ApplicationMaster|container_").unwrap()],
            },
            ModeRule {
                mode: SparkMode::Kubernetes,
                patterns: vec![Regex::new(r"(?i)kubernetes|k8s|pod_").unwrap()],
            },
            ModeRule {
                mode: SparkMode::Standalone,
                patterns: vec![Regex::new(r"(?i)spark://|master.*standalone").unwrap()],
            },
            ModeRule {
                mode: SparkMode::Local,
                patterns: vec![Regex::new(r"(?i)local\[\d*\*?\]").unwrap()],
            },
        ]
    })
}

/// The built-in language detector table.
pub fn default_language_rules() -> &'static [LanguageRule] {
    language_rules()
}

/// The built-in mode detector table.
pub fn default_mode_rules() -> &'static [ModeRule] {
    mode_rules()
}

/// Pick the language with the most distinct matching patterns (presence
/// count, not match count). Ties are broken by declared order. Zero matches
/// across every language yields `Unknown`.
pub fn detect_language(content: &str) -> SparkLanguage {
    detect_language_with_rules(content, language_rules())
}

/// First mode (in declared order yarn, kubernetes, standalone, local) whose
/// pattern matches anywhere in the content. No match yields `Unknown`.
pub fn detect_mode(content: &str) -> SparkMode {
    detect_mode_with_rules(content, mode_rules())
}

/// Same as [`detect_language`], against an explicit, ordered rule table
/// (used when a custom rule set has been loaded).
pub fn detect_language_with_rules(content: &str, rules: &[LanguageRule]) -> SparkLanguage {
    let mut best = SparkLanguage::Unknown;
    let mut best_score = 0usize;
    for rule in rules {
        let score = rule.patterns.iter().filter(|p| p.is_match(content)).count();
        if score > best_score {
            best_score = score;
            best = rule.language;
        }
    }
    best
}

/// Same as [`detect_mode`], against an explicit, ordered rule table (used
/// when a custom rule set has been loaded).
pub fn detect_mode_with_rules(content: &str, rules: &[ModeRule]) -> SparkMode {
    rules
        .iter()
        .find(|r| r.patterns.iter().any(|p| p.is_match(content)))
        .map(|r| r.mode)
        .unwrap_or(SparkMode::Unknown)
}

/// Build a custom language rule table from `(language, patterns[])` pairs,
/// used by core::rules when a loaded rule set overrides the built-in table.
pub fn compile_language_rules(
    defs: &[(SparkLanguage, Vec<String>)],
) -> Result<Vec<LanguageRule>, regex::Error> {
    defs.iter()
        .map(|(language, pats)| {
            let patterns = pats.iter().map(|p| Regex::new(p)).collect::<Result<Vec<_>, _>>()?;
            Ok(LanguageRule {
                language: *language,
                patterns,
            })
        })
        .collect()
}

/// Build a custom mode rule table from `(mode, patterns[])` pairs, used by
/// core::rules when a loaded rule set overrides the built-in table.
pub fn compile_mode_rules(defs: &[(SparkMode, Vec<String>)]) -> Result<Vec<ModeRule>, regex::Error> {
    defs.iter()
        .map(|(mode, pats)| {
            let patterns = pats.iter().map(|p| Regex::new(p)).collect::<Result<Vec<_>, _>>()?;
            Ok(ModeRule { mode: *mode, patterns })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yarn_container_log_detected() {
        let content = "container_1706438400_0001_01_000001 ApplicationMaster: starting";
        assert_eq!(detect_mode(content), SparkMode::Yarn);
    }

    #[test]
    fn python_traceback_detected() {
        let content = "Traceback (most recent call last):\n  File \"job.py\", line 10\npyspark error";
        assert_eq!(detect_language(content), SparkLanguage::Python);
    }

    #[test]
    fn unknown_when_no_pattern_matches() {
        assert_eq!(detect_language("nothing recognisable here"), SparkLanguage::Unknown);
        assert_eq!(detect_mode("nothing recognisable here"), SparkMode::Unknown);
    }

    #[test]
    fn java_scores_higher_than_scala_when_both_present() {
        let content = "at org.apache.spark.rdd.RDD\nat java.lang.Thread.run\n.scala file mentioned once";
        assert_eq!(detect_language(content), SparkLanguage::Java);
    }

    #[test]
    fn custom_rules_override_default_detection() {
        let language_rules =
            compile_language_rules(&[(SparkLanguage::R, vec!["CustomRMarker".to_string()])]).unwrap();
        let mode_rules =
            compile_mode_rules(&[(SparkMode::Kubernetes, vec!["CustomK8sMarker".to_string()])])
                .unwrap();

        assert_eq!(
            detect_language_with_rules("CustomRMarker", &language_rules),
            SparkLanguage::R
        );
        assert_eq!(
            detect_language_with_rules("pyspark traceback", &language_rules),
            SparkLanguage::Unknown
        );
        assert_eq!(
            detect_mode_with_rules("CustomK8sMarker", &mode_rules),
            SparkMode::Kubernetes
        );
    }
}
