//! # sectioning-engine
//!
//! Online sectioning engine services. The [`Engine`] facade owns an
//! [`EngineContext`] holding the catalog accessor, the lock manager, and the
//! injected collaborators (store, enrollment provider, notifier, clock).
//!
//! Services follow constructor injection: all dependencies are provided at
//! construction time via `Arc` references.

pub mod availability;
pub mod catalog;
pub mod context;
pub mod deadline;
pub mod engine;
pub mod enrollment;
pub mod lock;
pub mod notification;
pub mod provider;
pub mod quota;
pub mod resection;
pub mod store;
pub mod validator;

pub use catalog::Catalog;
pub use context::EngineContext;
pub use deadline::{DeadlineChecker, DeadlineKind};
pub use engine::Engine;
pub use enrollment::{EnrollOutcome, EnrollmentService};
pub use lock::{Lock, LockManager};
pub use notification::{ChannelNotifier, LogNotifier, Notifier};
pub use provider::{EnrollmentProvider, LocalProvider};
pub use resection::{RecheckReport, ResectioningService};
pub use store::{EnrollmentStore, MemoryEnrollmentStore, StudentCommit};
pub use validator::{
    EnrollmentRequest, EnrollmentValidator, ValidatedGrouping, ValidationError, ValidationMode,
    Violation, ViolationCode,
};
