//! Pending-exam suggestion.
//!
//! The keyword checker stands in for a real order/record lookup; anything
//! implementing [`PendingExamsChecker`] can replace it without touching the
//! workflow engine.

use crate::models::PatientRecord;

/// Suggests exams still pending for a patient.
pub trait PendingExamsChecker: Send + Sync {
    fn pending_exams(&self, patient: &PatientRecord) -> Vec<String>;
}

/// Respiratory/infectious presentation markers (English and Portuguese).
static RESPIRATORY_KEYWORDS: &[&str] = &[
    "dyspnea",
    "dyspnoea",
    "shortness of breath",
    "fever",
    "dispneia",
    "falta de ar",
    "febre",
];

/// Panel requested when any marker is present.
static RESPIRATORY_PANEL: &[&str] = &[
    "Chest X-ray",
    "Complete blood count",
    "C-reactive protein (CRP)",
];

/// Case-insensitive substring match of symptoms against a fixed keyword set.
pub struct KeywordExamsChecker {
    keywords: Vec<String>,
    panel: Vec<String>,
}

impl KeywordExamsChecker {
    pub fn new(keywords: &[&str], panel: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            panel: panel.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Respiratory keywords mapped to chest imaging, blood count and CRP.
    pub fn respiratory() -> Self {
        Self::new(RESPIRATORY_KEYWORDS, RESPIRATORY_PANEL)
    }
}

impl Default for KeywordExamsChecker {
    fn default() -> Self {
        Self::respiratory()
    }
}

impl PendingExamsChecker for KeywordExamsChecker {
    fn pending_exams(&self, patient: &PatientRecord) -> Vec<String> {
        let symptoms = patient.symptoms.to_lowercase();
        if self.keywords.iter().any(|kw| symptoms.contains(kw.as_str())) {
            self.panel.clone()
        } else {
            Vec::new()
        }
    }
}
