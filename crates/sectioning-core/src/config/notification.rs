//! Notification configuration.

use serde::{Deserialize, Serialize};

/// Enrollment change notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Buffer size of the in-process notification channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    256
}
