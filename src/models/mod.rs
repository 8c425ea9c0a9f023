pub mod enums;
pub mod patient;

pub use enums::{InvalidEnum, Severity, Sex};
pub use patient::PatientRecord;
