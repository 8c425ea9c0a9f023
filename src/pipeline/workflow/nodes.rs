//! Node implementations for the case workflow.

use std::sync::Arc;

use super::error::WorkflowError;
use super::graph::{AlertRoute, Node, NodeId};
use super::notify::{AlertNotice, AlertNotifier};
use super::state::CaseState;
use crate::audit::{AuditEvent, AuditSink, EVENT_ALERT, EVENT_ERROR, EVENT_NO_ALERT};
use crate::pipeline::rag::{AnswerSynthesizer, RagError};
use crate::pipeline::triage::{PendingExamsChecker, SeverityClassifier};

pub struct CheckPendingExamsNode {
    checker: Arc<dyn PendingExamsChecker>,
}

impl CheckPendingExamsNode {
    pub fn new(checker: Arc<dyn PendingExamsChecker>) -> Self {
        Self { checker }
    }
}

impl Node for CheckPendingExamsNode {
    fn run(&self, mut state: CaseState) -> Result<CaseState, WorkflowError> {
        let exams = self.checker.pending_exams(state.patient());
        tracing::debug!(pending_exams = exams.len(), "Pending exams checked");
        state.set_pending_exams(exams)?;
        Ok(state)
    }
}

#[derive(Default)]
pub struct AssessSeverityNode {
    classifier: SeverityClassifier,
}

impl AssessSeverityNode {
    pub fn new(classifier: SeverityClassifier) -> Self {
        Self { classifier }
    }
}

impl Node for AssessSeverityNode {
    fn run(&self, mut state: CaseState) -> Result<CaseState, WorkflowError> {
        let triage = self.classifier.classify(state.patient());
        tracing::info!(
            severity = %triage.severity,
            alert = triage.alert,
            rule = triage.rule_id,
            "Severity assessed"
        );
        state.set_severity(triage.severity)?;
        state.set_alert(triage.alert)?;
        Ok(state)
    }
}

/// Wraps [`AnswerSynthesizer`]. A collaborator failure is recorded as an
/// `ERROR` audit event and then aborts the case.
pub struct SynthesizeAnswerNode {
    synthesizer: Arc<AnswerSynthesizer>,
    audit: Arc<dyn AuditSink>,
}

impl SynthesizeAnswerNode {
    pub fn new(synthesizer: Arc<AnswerSynthesizer>, audit: Arc<dyn AuditSink>) -> Self {
        Self { synthesizer, audit }
    }

    fn record_failure(&self, state: &CaseState, error: &RagError) {
        let event = AuditEvent::typed(EVENT_ERROR)
            .with("case_id", state.case_id())
            .with("node", NodeId::SynthesizeAnswer)
            .with("error", error.to_string());
        if let Err(audit_err) = self.audit.append(event) {
            tracing::error!(
                case_id = %state.case_id(),
                error = %audit_err,
                "Failed to record collaborator failure in audit trail"
            );
        }
    }
}

impl Node for SynthesizeAnswerNode {
    fn run(&self, mut state: CaseState) -> Result<CaseState, WorkflowError> {
        let synthesis = match self
            .synthesizer
            .synthesize(state.case_id(), state.question(), state.patient())
        {
            Ok(synthesis) => synthesis,
            Err(RagError::Audit(e)) => return Err(WorkflowError::Audit(e)),
            Err(e) => {
                tracing::error!(case_id = %state.case_id(), error = %e, "Answer synthesis failed");
                self.record_failure(&state, &e);
                return Err(WorkflowError::CollaboratorFailure {
                    node: NodeId::SynthesizeAnswer,
                    source: e,
                });
            }
        };

        state.set_answer(synthesis.answer)?;
        state.set_sources(synthesis.sources)?;
        Ok(state)
    }
}

/// Routes on the `alert` flag written by AssessSeverity.
pub fn route_on_alert(state: &CaseState) -> Result<AlertRoute, WorkflowError> {
    match state.alert() {
        Some(true) => Ok(AlertRoute::EmitAlert),
        Some(false) => Ok(AlertRoute::NoAlert),
        None => Err(WorkflowError::MissingField {
            node: NodeId::SynthesizeAnswer,
            field: "alert",
        }),
    }
}

/// Append the terminal outcome record shared by both alert nodes.
fn write_outcome(
    audit: &dyn AuditSink,
    node: NodeId,
    event_type: &str,
    state: &CaseState,
) -> Result<(), WorkflowError> {
    let severity = state.severity().ok_or(WorkflowError::MissingField {
        node,
        field: "severity",
    })?;
    let pending_exams = state.pending_exams().ok_or(WorkflowError::MissingField {
        node,
        field: "pending_exams",
    })?;
    let sources = state.sources().ok_or(WorkflowError::MissingField {
        node,
        field: "sources",
    })?;

    let event = AuditEvent::typed(event_type)
        .with("case_id", state.case_id())
        .with("severity", severity)
        .with("patient", state.patient())
        .with("question", state.question())
        .with("pending_exams", pending_exams)
        .with("sources", sources);
    audit.append(event)?;
    Ok(())
}

pub struct EmitAlertNode {
    audit: Arc<dyn AuditSink>,
    notifier: Arc<dyn AlertNotifier>,
}

impl EmitAlertNode {
    pub fn new(audit: Arc<dyn AuditSink>, notifier: Arc<dyn AlertNotifier>) -> Self {
        Self { audit, notifier }
    }
}

impl Node for EmitAlertNode {
    /// The physician is notified before the outcome record is written, so a
    /// storage failure is surfaced without cancelling the alert.
    fn run(&self, state: CaseState) -> Result<CaseState, WorkflowError> {
        let notice = AlertNotice {
            case_id: state.case_id(),
            severity: state.severity().ok_or(WorkflowError::MissingField {
                node: NodeId::EmitAlert,
                field: "severity",
            })?,
            pending_exam_count: state.pending_exams().map_or(0, <[String]>::len),
        };
        self.notifier.notify(&notice);

        if let Err(e) = write_outcome(self.audit.as_ref(), NodeId::EmitAlert, EVENT_ALERT, &state)
        {
            tracing::error!(
                case_id = %state.case_id(),
                error = %e,
                "Alert delivered but its audit record was not written"
            );
            return Err(e);
        }
        Ok(state)
    }
}

pub struct NoAlertNode {
    audit: Arc<dyn AuditSink>,
}

impl NoAlertNode {
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self { audit }
    }
}

impl Node for NoAlertNode {
    fn run(&self, state: CaseState) -> Result<CaseState, WorkflowError> {
        write_outcome(self.audit.as_ref(), NodeId::NoAlert, EVENT_NO_ALERT, &state)?;
        tracing::info!(case_id = %state.case_id(), "No alert raised");
        Ok(state)
    }
}
