use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::WorkflowError;
use super::graph::NodeId;
use crate::models::{PatientRecord, Severity};

/// Entry payload as received from a caller. Both fields are required; they
/// are optional here so absence can be reported instead of failing to parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseRequest {
    #[serde(default)]
    pub patient: Option<PatientRecord>,
    #[serde(default)]
    pub question: Option<String>,
}

impl TryFrom<CaseRequest> for CaseState {
    type Error = WorkflowError;

    fn try_from(request: CaseRequest) -> Result<Self, Self::Error> {
        let patient = request
            .patient
            .ok_or_else(|| WorkflowError::InvalidCaseInput("patient is required".into()))?;
        let question = request
            .question
            .ok_or_else(|| WorkflowError::InvalidCaseInput("question is required".into()))?;
        CaseState::new(patient, &question)
    }
}

/// The record threaded through one case traversal.
///
/// `patient` and `question` are fixed at entry. Every other field is written
/// exactly once by its owning node; a second write is an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseState {
    case_id: Uuid,
    patient: PatientRecord,
    question: String,
    /// Owner: CheckPendingExams.
    pending_exams: Option<Vec<String>>,
    /// Owner: AssessSeverity.
    severity: Option<Severity>,
    /// Owner: AssessSeverity.
    alert: Option<bool>,
    /// Owner: SynthesizeAnswer.
    answer: Option<String>,
    /// Owner: SynthesizeAnswer.
    sources: Option<BTreeSet<String>>,
    /// Nodes completed so far, in execution order.
    path: Vec<NodeId>,
}

impl CaseState {
    pub fn new(patient: PatientRecord, question: &str) -> Result<Self, WorkflowError> {
        if question.trim().is_empty() {
            return Err(WorkflowError::InvalidCaseInput("question is blank".into()));
        }
        Ok(Self {
            case_id: Uuid::new_v4(),
            patient,
            question: question.to_string(),
            pending_exams: None,
            severity: None,
            alert: None,
            answer: None,
            sources: None,
            path: Vec::new(),
        })
    }

    pub fn case_id(&self) -> Uuid {
        self.case_id
    }

    pub fn patient(&self) -> &PatientRecord {
        &self.patient
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn pending_exams(&self) -> Option<&[String]> {
        self.pending_exams.as_deref()
    }

    pub fn severity(&self) -> Option<Severity> {
        self.severity
    }

    pub fn alert(&self) -> Option<bool> {
        self.alert
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn sources(&self) -> Option<&BTreeSet<String>> {
        self.sources.as_ref()
    }

    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    pub(crate) fn set_pending_exams(&mut self, exams: Vec<String>) -> Result<(), WorkflowError> {
        write_once(&mut self.pending_exams, exams, "pending_exams")
    }

    pub(crate) fn set_severity(&mut self, severity: Severity) -> Result<(), WorkflowError> {
        write_once(&mut self.severity, severity, "severity")
    }

    pub(crate) fn set_alert(&mut self, alert: bool) -> Result<(), WorkflowError> {
        write_once(&mut self.alert, alert, "alert")
    }

    pub(crate) fn set_answer(&mut self, answer: String) -> Result<(), WorkflowError> {
        write_once(&mut self.answer, answer, "answer")
    }

    pub(crate) fn set_sources(&mut self, sources: BTreeSet<String>) -> Result<(), WorkflowError> {
        write_once(&mut self.sources, sources, "sources")
    }

    /// Names of node-owned fields that already hold a value.
    pub fn populated_fields(&self) -> Vec<&'static str> {
        [
            ("pending_exams", self.pending_exams.is_some()),
            ("severity", self.severity.is_some()),
            ("alert", self.alert.is_some()),
            ("answer", self.answer.is_some()),
            ("sources", self.sources.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }

    pub(crate) fn record_visit(&mut self, node: NodeId) {
        self.path.push(node);
    }
}

fn write_once<T>(slot: &mut Option<T>, value: T, field: &'static str) -> Result<(), WorkflowError> {
    if slot.is_some() {
        return Err(WorkflowError::FieldAlreadySet(field));
    }
    *slot = Some(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sex;

    fn patient() -> PatientRecord {
        PatientRecord::new(40, Sex::Female)
    }

    #[test]
    fn new_case_has_empty_slots() {
        let state = CaseState::new(patient(), "Next steps?").unwrap();
        assert!(state.pending_exams().is_none());
        assert!(state.severity().is_none());
        assert!(state.alert().is_none());
        assert!(state.answer().is_none());
        assert!(state.sources().is_none());
        assert!(state.path().is_empty());
    }

    #[test]
    fn populated_fields_lists_written_slots() {
        let mut state = CaseState::new(patient(), "q").unwrap();
        assert!(state.populated_fields().is_empty());
        state.set_severity(Severity::Low).unwrap();
        state.set_answer("a".into()).unwrap();
        assert_eq!(state.populated_fields(), vec!["severity", "answer"]);
    }

    #[test]
    fn each_case_gets_distinct_id() {
        let a = CaseState::new(patient(), "q").unwrap();
        let b = CaseState::new(patient(), "q").unwrap();
        assert_ne!(a.case_id(), b.case_id());
    }

    #[test]
    fn blank_question_rejected() {
        let err = CaseState::new(patient(), "   ").unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidCaseInput(_)));
    }

    #[test]
    fn fields_are_write_once() {
        let mut state = CaseState::new(patient(), "q").unwrap();
        state.set_severity(Severity::Low).unwrap();
        let err = state.set_severity(Severity::High).unwrap_err();
        assert!(matches!(err, WorkflowError::FieldAlreadySet("severity")));
        assert_eq!(state.severity(), Some(Severity::Low));

        state.set_alert(false).unwrap();
        assert!(state.set_alert(true).is_err());
        assert_eq!(state.alert(), Some(false));

        state.set_answer("first".into()).unwrap();
        assert!(state.set_answer("second".into()).is_err());
        assert_eq!(state.answer(), Some("first"));
    }

    #[test]
    fn empty_values_still_count_as_written() {
        let mut state = CaseState::new(patient(), "q").unwrap();
        state.set_pending_exams(Vec::new()).unwrap();
        assert!(matches!(
            state.set_pending_exams(vec!["Chest X-ray".into()]),
            Err(WorkflowError::FieldAlreadySet("pending_exams"))
        ));
        state.set_sources(BTreeSet::new()).unwrap();
        assert!(state.set_sources(BTreeSet::new()).is_err());
    }

    #[test]
    fn request_missing_patient_rejected() {
        let request: CaseRequest = serde_json::from_str(r#"{"question": "q"}"#).unwrap();
        let err = CaseState::try_from(request).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidCaseInput(msg) if msg.contains("patient")));
    }

    #[test]
    fn request_missing_question_rejected() {
        let request: CaseRequest =
            serde_json::from_str(r#"{"patient": {"age": 63, "sex": "M"}}"#).unwrap();
        let err = CaseState::try_from(request).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidCaseInput(msg) if msg.contains("question")));
    }

    #[test]
    fn complete_request_accepted() {
        let request: CaseRequest = serde_json::from_str(
            r#"{"patient": {"age": 63, "sex": "M", "oxygen_saturation": 91.0,
                "symptoms": "mild dyspnea"}, "question": "Next steps?"}"#,
        )
        .unwrap();
        let state = CaseState::try_from(request).unwrap();
        assert_eq!(state.question(), "Next steps?");
        assert_eq!(state.patient().oxygen_saturation, Some(91.0));
    }
}
