//! Enrollment policy configuration.

use serde::{Deserialize, Serialize};

/// Deployment-wide policy switches read by the validator and the
/// resectioning engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Students already enrolled in a cancelled section may keep it.
    #[serde(default)]
    pub allow_keep_cancelled: bool,
    /// Time conflicts inside an existing enrollment do not force a reschedule.
    #[serde(default)]
    pub allow_keep_time_conflict: bool,
    /// Resectioning never moves a student into a section that already started.
    #[serde(default)]
    pub avoid_past_sections: bool,
    /// Notify the student when a resectioning attempt fails.
    #[serde(default)]
    pub notify_on_failure: bool,
}
