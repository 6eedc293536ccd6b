//! Enrollment validation ("check-assignment").

pub mod service;
pub mod structure;
pub mod violation;

pub use service::{
    DroppedCourse, EnrollmentRequest, EnrollmentValidator, ValidatedGrouping, ValidationInput,
    offerings_touched,
};
pub use structure::{StructureIssue, inspect};
pub use violation::{ValidationError, ValidationMode, Violation, ViolationCode};
