//! Background processing for the sectioning engine.
//!
//! This crate provides:
//! - A de-duplicating queue of offerings waiting for a recheck
//! - A runner that drains the queue and resections wait-listed students
//! - A cron scheduler that periodically sweeps every wait-listed offering

pub mod error;
pub mod queue;
pub mod runner;
pub mod scheduler;

pub use error::RecheckError;
pub use queue::RecheckQueue;
pub use runner::RecheckRunner;
pub use scheduler::SweepScheduler;
