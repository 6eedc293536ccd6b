//! Resectioning of wait-listed and disrupted students ("check-offering").

pub mod reason;
pub mod request;
pub mod search;
pub mod service;
pub mod weights;

pub use reason::{ReschedulingReason, check};
pub use request::{CandidateKind, SectioningRequest, sort_candidates};
pub use search::{SearchContext, best_enrollment};
pub use service::{CandidateOutcome, RecheckReport, ResectioningService, describe};
pub use weights::{EnrollmentWeighting, StabilityWeighting, UniformWeighting};
