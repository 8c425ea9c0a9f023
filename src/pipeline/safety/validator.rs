use std::collections::HashSet;
use std::path::Path;

use regex::{Regex, RegexBuilder};

use super::rules::builtin_rule_table;
use super::types::{GuardrailResult, RuleTable, SafetyError, SAFE_MESSAGE};

/// A compiled rule with its audit metadata.
struct CompiledRule {
    id: String,
    regex: Regex,
    rationale: String,
}

/// Detects prescriptive content and replaces it with [`SAFE_MESSAGE`].
///
/// Compiled once from a [`RuleTable`] and shared read-only across cases.
pub struct GuardrailValidator {
    version: String,
    rules: Vec<CompiledRule>,
}

impl GuardrailValidator {
    /// Compile a rule table. Fails on an empty table, duplicate ids, a bad
    /// pattern, or a table under which the safe message would be flagged.
    pub fn new(table: RuleTable) -> Result<Self, SafetyError> {
        if table.rules.is_empty() {
            return Err(SafetyError::EmptyRuleTable);
        }

        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(table.rules.len());
        for rule in table.rules {
            if !seen.insert(rule.id.clone()) {
                return Err(SafetyError::DuplicateRule(rule.id));
            }
            let regex = RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| SafetyError::RegexCompilation {
                    rule_id: rule.id.clone(),
                    reason: e.to_string(),
                })?;
            rules.push(CompiledRule {
                id: rule.id,
                regex,
                rationale: rule.rationale,
            });
        }

        let validator = Self {
            version: table.version,
            rules,
        };

        let self_check = validator.check(SAFE_MESSAGE);
        if !self_check.ok {
            return Err(SafetyError::SafeMessageFlagged(self_check.matched_rules));
        }

        tracing::info!(
            ruleset_version = %validator.version,
            rule_count = validator.rules.len(),
            "Guardrail rule table loaded"
        );
        Ok(validator)
    }

    /// The built-in English/Portuguese table.
    pub fn builtin() -> Result<Self, SafetyError> {
        Self::new(builtin_rule_table())
    }

    /// Load a JSON rule table from disk, or the built-in table when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, SafetyError> {
        match path {
            Some(path) => {
                let json = std::fs::read_to_string(path)?;
                Self::new(RuleTable::from_json(&json)?)
            }
            None => Self::builtin(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id.as_str()).collect()
    }

    pub fn rationale(&self, rule_id: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.id == rule_id)
            .map(|r| r.rationale.as_str())
    }

    /// Evaluate every rule against `text`. Non-mutating, side-effect free.
    pub fn check(&self, text: &str) -> GuardrailResult {
        let matched_rules: Vec<String> = self
            .rules
            .iter()
            .filter(|r| r.regex.is_match(text))
            .map(|r| r.id.clone())
            .collect();

        GuardrailResult {
            ok: matched_rules.is_empty(),
            matched_rules,
            ruleset_version: self.version.clone(),
        }
    }

    /// Return `text` unchanged when it passes, the fixed safe message otherwise.
    /// Replacement is total: nothing of a blocked text survives.
    pub fn guard(&self, text: &str) -> String {
        let result = self.check(text);
        if result.ok {
            tracing::debug!(outcome = "passed", "Guardrail: clean pass");
            return text.to_string();
        }

        tracing::warn!(
            outcome = "blocked",
            ruleset_version = %result.ruleset_version,
            rules = ?result.matched_rules,
            "Guardrail: blocked"
        );
        SAFE_MESSAGE.to_string()
    }
}
