//! # sectioning-core
//!
//! Core crate for the online sectioning engine. Contains configuration
//! schemas, typed identifiers, domain events, the clock seam, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other sectioning crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
