use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome of a guardrail check. `ok` is true iff no rule fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailResult {
    pub ok: bool,
    /// Identifiers of every rule that matched, in rule-table order.
    pub matched_rules: Vec<String>,
    /// Version of the rule table that produced this decision.
    pub ruleset_version: String,
}

/// One forbidden-content rule as it appears in a rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub id: String,
    /// Regex source. Matching is always case-insensitive.
    pub pattern: String,
    /// Human-readable reason, kept for compliance review.
    pub rationale: String,
}

/// Versioned, data-driven guardrail rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    pub version: String,
    pub rules: Vec<RuleSpec>,
}

impl RuleTable {
    pub fn from_json(json: &str) -> Result<Self, SafetyError> {
        serde_json::from_str(json).map_err(|e| SafetyError::RuleTableParse(e.to_string()))
    }
}

/// Guardrail construction errors. Evaluation itself never fails.
#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Regex compilation failed for rule {rule_id}: {reason}")]
    RegexCompilation { rule_id: String, reason: String },

    #[error("Rule table could not be parsed: {0}")]
    RuleTableParse(String),

    #[error("Rule table could not be read: {0}")]
    RuleTableRead(#[from] std::io::Error),

    #[error("Rule table is empty")]
    EmptyRuleTable,

    #[error("Duplicate rule id: {0}")]
    DuplicateRule(String),

    #[error("Safe replacement message trips rules: {0:?}")]
    SafeMessageFlagged(Vec<String>),
}

/// Fixed replacement for any blocked answer. Must never trip the rule table.
pub const SAFE_MESSAGE: &str = "\u{26a0}\u{fe0f} Response blocked by a safety rule.\n\n\
The assistant detected content that resembles a treatment order \
(for example medication amounts or regimens).\n\
For safety, the assistant does not issue treatment orders.\n\n\
Safe suggestion:\n\
- Reinforce the clinical evaluation and the severity criteria\n\
- Consult the internal protocol and discuss the case with the responsible physician\n\
- Record the decision in the patient chart\n";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_table_parses_from_json() {
        let table = RuleTable::from_json(
            r#"{"version": "test-1", "rules": [
                {"id": "UNIT_MG", "pattern": "\\bmg\\b", "rationale": "unit"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(table.version, "test-1");
        assert_eq!(table.rules[0].id, "UNIT_MG");
    }

    #[test]
    fn malformed_rule_table_rejected() {
        let err = RuleTable::from_json("{\"version\": 1}").unwrap_err();
        assert!(matches!(err, SafetyError::RuleTableParse(_)));
    }

    #[test]
    fn safe_message_recommends_physician_sign_off() {
        assert!(SAFE_MESSAGE.contains("clinical evaluation"));
        assert!(SAFE_MESSAGE.contains("internal protocol"));
        assert!(SAFE_MESSAGE.contains("responsible physician"));
    }
}
