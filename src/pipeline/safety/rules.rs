use super::types::{RuleSpec, RuleTable};

/// Version stamped on every decision made with the built-in table.
pub const BUILTIN_RULESET_VERSION: &str = "builtin-2026.1";

/// Forbidden prescriptive content. Order is significant: `matched_rules`
/// reports hits in this order. English and Portuguese forms.
const BUILTIN_RULES: &[(&str, &str, &str)] = &[
    (
        "UNIT_MG",
        r"(?:\d\s*|\b)mg\b",
        "Medication unit: milligrams ('10mg', '10 mg', 'mg')",
    ),
    (
        "UNIT_ML",
        r"(?:\d\s*|\b)ml\b",
        "Medication unit: millilitres ('5ml', 'ml')",
    ),
    (
        "UNIT_OTHER",
        r"\d\s*(?:mcg|µg|ui|iu|gotas|drops)\b",
        "Medication unit attached to a quantity ('500 mcg', '20 gotas')",
    ),
    (
        "PILL_FORM",
        r"\b(?:comprimid\w*|c[áa]psul\w*|capsules?|tablets?|pills?)\b",
        "Pill-form word: tablet/pill/capsule/comprimido/cápsula",
    ),
    (
        "DOSE",
        r"\b(?:doses?|dosag\w*|dosing|posologia)\b",
        "Dosing vocabulary: dose/dosage/dosagem/posologia",
    ),
    (
        "PRESCRIBE",
        r"\b(?:prescrib\w*|prescri[cçp]\w*|prescrev\w*|receit\w*)\b",
        "Prescribing vocabulary: prescribe/prescription/prescrição/prescrever/receitar",
    ),
    (
        "ADMINISTER",
        r"\b(?:administer\w*|administr\w*)\b",
        "Administering vocabulary: administer/administre/administrado",
    ),
    (
        "DIRECTIVE_QUANTITY",
        r"\b(?:take|tomar|tome|tomando|give)\b[^\n]*?\d",
        "Directive followed by a numeric quantity on the same line ('take 2 ...', 'tomar o antibiótico. Repetir 3 vezes')",
    ),
];

/// The rule table shipped with the crate.
pub fn builtin_rule_table() -> RuleTable {
    RuleTable {
        version: BUILTIN_RULESET_VERSION.to_string(),
        rules: BUILTIN_RULES
            .iter()
            .map(|(id, pattern, rationale)| RuleSpec {
                id: id.to_string(),
                pattern: pattern.to_string(),
                rationale: rationale.to_string(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn builtin_ids_are_unique() {
        let table = builtin_rule_table();
        let ids: HashSet<_> = table.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), table.rules.len());
    }

    #[test]
    fn builtin_rules_have_rationale() {
        assert!(builtin_rule_table()
            .rules
            .iter()
            .all(|r| !r.rationale.trim().is_empty()));
    }

    #[test]
    fn builtin_table_serializes_with_version() {
        let json = serde_json::to_string(&builtin_rule_table()).unwrap();
        assert!(json.contains(BUILTIN_RULESET_VERSION));
        let back = RuleTable::from_json(&json).unwrap();
        assert_eq!(back, builtin_rule_table());
    }
}
