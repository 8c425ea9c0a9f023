use serde::Serialize;
use uuid::Uuid;

use crate::models::Severity;

/// What a pager/notification collaborator is told about an alerting case.
/// Carries no patient content; receivers look the case up by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertNotice {
    pub case_id: Uuid,
    pub severity: Severity,
    pub pending_exam_count: usize,
}

/// Hook invoked by the EmitAlert node after the ALERT record is written.
pub trait AlertNotifier: Send + Sync {
    fn notify(&self, notice: &AlertNotice);
}

/// Default notifier: writes the notice to the process log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl AlertNotifier for LogNotifier {
    fn notify(&self, notice: &AlertNotice) {
        tracing::warn!(
            case_id = %notice.case_id,
            severity = %notice.severity,
            pending_exams = notice.pending_exam_count,
            "ALERT: case requires immediate physician review"
        );
    }
}
