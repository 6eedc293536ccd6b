//! Background recheck worker configuration.

use serde::{Deserialize, Serialize};

/// Background recheck worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of concurrent recheck batches.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Interval in seconds between queue polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Cron expression of the periodic wait-list sweep (empty disables it).
    #[serde(default = "default_sweep_schedule")]
    pub sweep_schedule: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            concurrency: default_concurrency(),
            poll_interval_seconds: default_poll_interval(),
            sweep_schedule: default_sweep_schedule(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    2
}

fn default_poll_interval() -> u64 {
    5
}

fn default_sweep_schedule() -> String {
    "0 */30 * * * *".to_string()
}
