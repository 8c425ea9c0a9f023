//! Prescriptive-content guardrail.
//!
//! `check` reports which rules fire; `guard` swaps any flagged text for
//! [`SAFE_MESSAGE`]. Both are pure and may be called independently.

pub mod rules;
pub mod types;
pub mod validator;

pub use rules::{builtin_rule_table, BUILTIN_RULESET_VERSION};
pub use types::{GuardrailResult, RuleSpec, RuleTable, SafetyError, SAFE_MESSAGE};
pub use validator::GuardrailValidator;
