//! Interactive enrollment: validate-then-commit of a student's schedule.

pub mod service;

pub use service::{EnrollOutcome, EnrollmentService};
