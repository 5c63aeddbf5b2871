// app/rules_mgr.rs
//
// Manages loading of rule sets from both the built-in source (embedded in
// the binary) and user-defined TOML files on disk. User rule sets override
// the built-in rule set with the same ID.

use crate::core::rules::{self, RuleSet};
use crate::util::constants;
use crate::util::error::RulesError;
use std::path::Path;

/// Load all available rule sets: built-in first, then user-defined
/// overrides. User rule sets with the same ID as the built-in replace it.
/// Invalid rule sets are logged and skipped (non-fatal).
///
/// Returns the merged list and any non-fatal errors encountered.
pub fn load_all_rule_sets(user_rules_dir: Option<&Path>) -> (Vec<RuleSet>, Vec<RulesError>) {
    let mut rule_sets = Vec::new();
    let mut errors = Vec::new();

    if let Some(builtin) = rules::load_builtin_rule_set() {
        tracing::info!(rule_set_id = %builtin.id, "Loaded built-in rule set");
        rule_sets.push(builtin);
    }

    if let Some(dir) = user_rules_dir {
        if dir.is_dir() {
            let (user_rule_sets, user_errors) = load_user_rule_sets(dir);
            errors.extend(user_errors);

            for user_rule_set in user_rule_sets {
                if let Some(pos) = rule_sets.iter().position(|r| r.id == user_rule_set.id) {
                    tracing::info!(rule_set_id = %user_rule_set.id, "User rule set overrides built-in");
                    rule_sets[pos] = user_rule_set;
                } else {
                    tracing::info!(rule_set_id = %user_rule_set.id, "Loaded user-defined rule set");
                    rule_sets.push(user_rule_set);
                }
            }
        } else {
            tracing::debug!(dir = %dir.display(), "User rules directory does not exist (skipping)");
        }
    }

    if rule_sets.len() > constants::MAX_RULE_SETS {
        tracing::warn!(
            count = rule_sets.len(),
            max = constants::MAX_RULE_SETS,
            "Too many rule sets loaded, truncating"
        );
        errors.push(RulesError::TooManyRuleSets {
            count: rule_sets.len(),
            max: constants::MAX_RULE_SETS,
        });
        rule_sets.truncate(constants::MAX_RULE_SETS);
    }

    tracing::info!(total = rule_sets.len(), "Rule set loading complete");

    (rule_sets, errors)
}

fn load_user_rule_sets(dir: &Path) -> (Vec<RuleSet>, Vec<RulesError>) {
    let mut rule_sets = Vec::new();
    let mut errors = Vec::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            errors.push(RulesError::Io {
                path: dir.to_path_buf(),
                source: e,
            });
            return (rule_sets, errors);
        }
    };

    for entry_result in entries {
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                errors.push(RulesError::Io {
                    path: dir.to_path_buf(),
                    source: e,
                });
                continue;
            }
        };

        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            continue;
        }

        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                errors.push(RulesError::Io {
                    path: path.clone(),
                    source: e,
                });
                continue;
            }
        };

        if metadata.len() > constants::MAX_RULE_SET_FILE_SIZE {
            errors.push(RulesError::FileTooLarge {
                path: path.clone(),
                size: metadata.len(),
                max_size: constants::MAX_RULE_SET_FILE_SIZE,
            });
            continue;
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                errors.push(RulesError::Io {
                    path: path.clone(),
                    source: e,
                });
                continue;
            }
        };

        match rules::parse_rule_set_toml(&content, &path)
            .and_then(|def| rules::validate_and_compile(def, &path, false))
        {
            Ok(r) => rule_sets.push(r),
            Err(e) => errors.push(e),
        }
    }

    (rule_sets, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn loads_builtin_when_no_user_dir() {
        let (rule_sets, errors) = load_all_rule_sets(None);
        assert!(errors.is_empty());
        assert!(rule_sets.iter().any(|r| r.id == "spark-default"));
    }

    #[test]
    fn user_rule_set_overrides_builtin_by_id() {
        let dir = TempDir::new().unwrap();
        let toml = r#"
[meta]
id = "spark-default"
name = "Custom override"

[[categories]]
name = "memory"
patterns = ["CustomOOM"]
"#;
        std::fs::write(dir.path().join("custom.toml"), toml).unwrap();

        let (rule_sets, errors) = load_all_rule_sets(Some(dir.path()));
        assert!(errors.is_empty());
        let spark_default = rule_sets.iter().find(|r| r.id == "spark-default").unwrap();
        assert_eq!(spark_default.name, "Custom override");
        assert!(!spark_default.is_builtin);
    }
}
