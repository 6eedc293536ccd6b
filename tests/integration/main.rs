//! Integration tests for the sectioning engine.

mod helpers;

mod enrollment_test;
mod resection_test;
mod scenario_test;
mod validation_test;
mod worker_test;
