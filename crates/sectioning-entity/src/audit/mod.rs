//! Enrollment change log.

pub mod model;

pub use model::AuditEntry;
