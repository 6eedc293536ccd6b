//! Wait-list eligibility configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How a student's requests participate in wait-list processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitListMode {
    /// Requests flagged `wait_list` are wait-listed.
    WaitList,
    /// Requests flagged `no_sub` are held for their listed courses only.
    NoSubs,
    /// The student never waits for a seat.
    None,
}

impl Default for WaitListMode {
    fn default() -> Self {
        Self::WaitList
    }
}

impl std::fmt::Display for WaitListMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitListMode::WaitList => write!(f, "wait_list"),
            WaitListMode::NoSubs => write!(f, "no_subs"),
            WaitListMode::None => write!(f, "none"),
        }
    }
}

/// Maps student status codes to wait-list modes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaitListConfig {
    /// Mode for students without a status or with an unmapped status.
    #[serde(default)]
    pub default_mode: WaitListMode,
    /// Per status code overrides.
    #[serde(default)]
    pub by_status: HashMap<String, WaitListMode>,
}

impl WaitListConfig {
    /// Resolves the wait-list mode of a student status.
    pub fn mode_for(&self, status: Option<&str>) -> WaitListMode {
        status
            .and_then(|code| self.by_status.get(code).copied())
            .unwrap_or(self.default_mode)
    }
}
