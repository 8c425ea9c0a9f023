//! Rule-based acuity classification from vital signs.
//!
//! Rules are evaluated in a fixed order and the first match wins. Missing
//! vitals never fail; they simply do not satisfy the rule that needs them.

use serde::Serialize;

use crate::models::{PatientRecord, Severity};

/// SpO2 strictly below this is high severity.
pub const HYPOXEMIA_SPO2_BELOW: f64 = 92.0;
/// Temperature at or above this (°C) is moderate severity.
pub const HIGH_FEVER_CELSIUS: f64 = 39.0;

/// Outcome of severity triage. `alert` is true iff severity is high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TriageResult {
    pub severity: Severity,
    pub alert: bool,
    /// Which rule decided the severity.
    pub rule_id: &'static str,
}

/// Condition under which a severity rule fires.
enum VitalCondition {
    SpO2Below(f64),
    TemperatureAtLeast(f64),
}

impl VitalCondition {
    fn matches(&self, patient: &PatientRecord) -> bool {
        match self {
            Self::SpO2Below(threshold) => patient
                .oxygen_saturation
                .is_some_and(|spo2| spo2 < *threshold),
            Self::TemperatureAtLeast(threshold) => {
                patient.temperature.is_some_and(|t| t >= *threshold)
            }
        }
    }
}

struct SeverityRule {
    id: &'static str,
    condition: VitalCondition,
    severity: Severity,
}

/// Precedence order matters: hypoxemia outranks fever.
const RULES: &[SeverityRule] = &[
    SeverityRule {
        id: "SEV-SPO2",
        condition: VitalCondition::SpO2Below(HYPOXEMIA_SPO2_BELOW),
        severity: Severity::High,
    },
    SeverityRule {
        id: "SEV-FEVER",
        condition: VitalCondition::TemperatureAtLeast(HIGH_FEVER_CELSIUS),
        severity: Severity::Moderate,
    },
];

const DEFAULT_RULE_ID: &str = "SEV-DEFAULT";

/// Deterministic severity classifier. No side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeverityClassifier;

impl SeverityClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, patient: &PatientRecord) -> TriageResult {
        let (severity, rule_id) = RULES
            .iter()
            .find(|rule| rule.condition.matches(patient))
            .map(|rule| (rule.severity, rule.id))
            .unwrap_or((Severity::Low, DEFAULT_RULE_ID));

        TriageResult {
            severity,
            alert: severity == Severity::High,
            rule_id,
        }
    }
}
