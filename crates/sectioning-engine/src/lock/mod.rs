//! Cooperative locks keyed by offering and student.

pub mod guard;
pub mod manager;

pub use guard::Lock;
pub use manager::LockManager;
