//! Scoped lock guard.

use tokio::sync::{OwnedMutexGuard, OwnedRwLockReadGuard, OwnedRwLockWriteGuard};
use tracing::trace;

use sectioning_core::types::id::{OfferingId, StudentId};

/// A held set of locks, released together when dropped.
///
/// Fields drop in declaration order, so the student lock goes first, then
/// the offering locks, then the global lock.
pub struct Lock {
    student_guard: Option<OwnedMutexGuard<()>>,
    offering_guards: Vec<OwnedRwLockWriteGuard<()>>,
    global_guard: Option<GlobalGuard>,
    student: Option<StudentId>,
    offerings: Vec<OfferingId>,
    reason: String,
}

/// The global lock, held until dropped.
pub(crate) enum GlobalGuard {
    Read { _guard: OwnedRwLockReadGuard<()> },
    Write { _guard: OwnedRwLockWriteGuard<()> },
}

impl Lock {
    pub(crate) fn new(reason: &str) -> Self {
        Self {
            student_guard: None,
            offering_guards: Vec::new(),
            global_guard: None,
            student: None,
            offerings: Vec::new(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn with_global(mut self, guard: GlobalGuard) -> Self {
        self.global_guard = Some(guard);
        self
    }

    pub(crate) fn push_offering(&mut self, id: OfferingId, guard: OwnedRwLockWriteGuard<()>) {
        self.offerings.push(id);
        self.offering_guards.push(guard);
    }

    pub(crate) fn set_student(&mut self, id: StudentId, guard: OwnedMutexGuard<()>) {
        self.student = Some(id);
        self.student_guard = Some(guard);
    }

    /// Offerings held by this lock.
    pub fn offerings(&self) -> &[OfferingId] {
        &self.offerings
    }

    /// Student held by this lock.
    pub fn student(&self) -> Option<StudentId> {
        self.student
    }

    /// Whether the lock holds the global lock exclusively.
    pub fn is_exclusive(&self) -> bool {
        matches!(self.global_guard, Some(GlobalGuard::Write { .. }))
    }

    /// Why the lock was taken.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl std::fmt::Debug for Lock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lock")
            .field("student", &self.student)
            .field("offerings", &self.offerings)
            .field("reason", &self.reason)
            .finish()
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        trace!(
            student = ?self.student,
            offerings = ?self.offerings,
            reason = %self.reason,
            "Releasing lock"
        );
    }
}
