//! Core type definitions used across the sectioning workspace.

pub mod id;
pub mod outcome;

pub use id::*;
pub use outcome::{ResultType, WaitListType};
