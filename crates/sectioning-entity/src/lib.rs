//! # sectioning-entity
//!
//! Value types for the online sectioning engine. Catalog objects
//! (offerings, configs, subparts, sections, courses, reservations) live in
//! one [`catalog::CatalogSnapshot`] arena and reference each other by id;
//! student records carry their requests and committed enrollments.
//! All entities derive `Debug`, `Clone`, `Serialize`, and `Deserialize`.

pub mod assignment;
pub mod audit;
pub mod catalog;
pub mod offering;
pub mod reservation;
pub mod student;

pub use assignment::ClassAssignment;
pub use audit::AuditEntry;
pub use catalog::{CatalogData, CatalogSnapshot};
pub use offering::{
    Course, Distribution, DistributionKind, InstrConfig, Offering, Section, Subpart, TimeLocation,
};
pub use reservation::{Reservation, ReservationScope};
pub use student::{
    CourseRequest, Enrollment, EnrollmentRecord, FreeTimeRequest, OfferingEnrollments, Request,
    RequestOverrides, RequestPriority, Student, StudentPriority,
};
