//! Lock manager: a global snapshot lock plus per-offering and per-student
//! locks.
//!
//! Acquisition order is always global lock, then offering locks in id order,
//! then the student lock. Every acquisition blocks until granted and fails
//! only once the manager has been shut down.
//!
//! Lock entries are created on first use. Once a map holds `PRUNE_AT`
//! entries, entries nobody holds or waits on are dropped before a new one is
//! added, so the maps stay bounded by the number of concurrently used ids.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use tracing::debug;

use sectioning_core::error::AppError;
use sectioning_core::result::AppResult;
use sectioning_core::types::id::{OfferingId, StudentId};

use super::guard::{GlobalGuard, Lock};

const PRUNE_AT: usize = 1024;

/// Issues scoped locks for offerings and students.
#[derive(Debug)]
pub struct LockManager {
    /// Held shared by every operation, exclusively by catalog reloads.
    global: Arc<RwLock<()>>,
    /// Offering id → offering lock.
    offerings: DashMap<OfferingId, Arc<RwLock<()>>>,
    /// Student id → student lock.
    students: DashMap<StudentId, Arc<Mutex<()>>>,
    /// Flips to `true` on shutdown.
    shutdown: watch::Sender<bool>,
}

impl LockManager {
    /// Creates a new lock manager.
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            global: Arc::new(RwLock::new(())),
            offerings: DashMap::new(),
            students: DashMap::new(),
            shutdown,
        }
    }

    /// Takes the global lock shared, for reads spanning several offerings.
    pub async fn read_lock(&self, reason: &str) -> AppResult<Lock> {
        let guard = self.guarded(self.global.clone().read_owned()).await?;
        debug!(reason = %reason, "Acquired global read lock");
        Ok(Lock::new(reason).with_global(GlobalGuard::Read { _guard: guard }))
    }

    /// Takes the global lock exclusively, for snapshot replacement.
    pub async fn write_lock(&self, reason: &str) -> AppResult<Lock> {
        let guard = self.guarded(self.global.clone().write_owned()).await?;
        debug!(reason = %reason, "Acquired global write lock");
        Ok(Lock::new(reason).with_global(GlobalGuard::Write { _guard: guard }))
    }

    /// Locks an offering together with related offerings.
    pub async fn lock_offering(
        &self,
        offering: OfferingId,
        related: &[OfferingId],
        reason: &str,
    ) -> AppResult<Lock> {
        let mut ids = related.to_vec();
        ids.push(offering);
        let lock = self.acquire_offerings(ids, reason).await?;
        debug!(offering_id = %offering, reason = %reason, "Acquired offering lock");
        Ok(lock)
    }

    /// Locks an offering only if nobody else holds it.
    pub async fn try_lock_offering(
        &self,
        offering: OfferingId,
        reason: &str,
    ) -> AppResult<Option<Lock>> {
        let global = self.guarded(self.global.clone().read_owned()).await?;
        let mut lock = Lock::new(reason).with_global(GlobalGuard::Read { _guard: global });
        match self.offering_lock(offering).try_write_owned() {
            Ok(guard) => {
                lock.push_offering(offering, guard);
                debug!(offering_id = %offering, reason = %reason, "Acquired offering lock");
                Ok(Some(lock))
            }
            Err(_) => Ok(None),
        }
    }

    /// Locks a student, preceded by the offerings the operation touches.
    pub async fn lock_student(
        &self,
        student: StudentId,
        related: &[OfferingId],
        reason: &str,
    ) -> AppResult<Lock> {
        let mut lock = self.acquire_offerings(related.to_vec(), reason).await?;
        let guard = self.guarded(self.student_lock(student).lock_owned()).await?;
        lock.set_student(student, guard);
        debug!(student_id = %student, reason = %reason, "Acquired student lock");
        Ok(lock)
    }

    /// Locks a student while `held` already covers the global and offering
    /// locks of the operation.
    pub async fn lock_student_within(
        &self,
        held: &Lock,
        student: StudentId,
        reason: &str,
    ) -> AppResult<Lock> {
        let guard = self.guarded(self.student_lock(student).lock_owned()).await?;
        let mut lock = Lock::new(reason);
        lock.set_student(student, guard);
        debug!(
            student_id = %student,
            offerings = ?held.offerings(),
            reason = %reason,
            "Acquired nested student lock"
        );
        Ok(lock)
    }

    /// Whether an operation currently holds the offering lock.
    pub fn is_offering_locked(&self, offering: OfferingId) -> bool {
        self.offering_lock(offering).try_write().is_err()
    }

    /// Wakes every pending and future acquisition with a shutdown error.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
        debug!("Lock manager shut down");
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutdown(&self) -> bool {
        *self.shutdown.borrow()
    }

    async fn acquire_offerings(&self, mut ids: Vec<OfferingId>, reason: &str) -> AppResult<Lock> {
        ids.sort();
        ids.dedup();
        let global = self.guarded(self.global.clone().read_owned()).await?;
        let mut lock = Lock::new(reason).with_global(GlobalGuard::Read { _guard: global });
        for id in ids {
            let guard = self.guarded(self.offering_lock(id).write_owned()).await?;
            lock.push_offering(id, guard);
        }
        Ok(lock)
    }

    /// Drops lock entries that no guard or waiter references.
    pub fn prune(&self) {
        self.offerings.retain(|_, lock| Arc::strong_count(lock) > 1);
        self.students.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    fn offering_lock(&self, id: OfferingId) -> Arc<RwLock<()>> {
        if self.offerings.len() >= PRUNE_AT && !self.offerings.contains_key(&id) {
            self.offerings.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        self.offerings.entry(id).or_default().value().clone()
    }

    fn student_lock(&self, id: StudentId) -> Arc<Mutex<()>> {
        if self.students.len() >= PRUNE_AT && !self.students.contains_key(&id) {
            self.students.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        self.students.entry(id).or_default().value().clone()
    }

    async fn guarded<T>(&self, acquire: impl Future<Output = T>) -> AppResult<T> {
        let mut stopped = self.shutdown.subscribe();
        tokio::select! {
            biased;
            _ = stopped.wait_for(|flag| *flag) => {
                Err(AppError::shutdown("lock manager is shutting down"))
            }
            guard = acquire => Ok(guard),
        }
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}
