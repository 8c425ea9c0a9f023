pub mod exams;
pub mod severity;

pub use exams::{KeywordExamsChecker, PendingExamsChecker};
pub use severity::{SeverityClassifier, TriageResult};
