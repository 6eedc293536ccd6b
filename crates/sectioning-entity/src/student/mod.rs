//! Students, their requests, and committed enrollments.

pub mod enrollment;
pub mod model;
pub mod request;

pub use enrollment::{Approval, Enrollment, EnrollmentRecord, OfferingEnrollments};
pub use model::{Student, StudentPriority};
pub use request::{
    CourseRequest, FreeTimeRequest, Request, RequestOverrides, RequestPriority,
};
