//! Notifier publishing events on a broadcast channel.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

use sectioning_core::config::NotificationsConfig;
use sectioning_core::events::DomainEvent;

use super::Notifier;

/// Publishes events to every subscriber. Events sent without subscribers are
/// discarded.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: broadcast::Sender<DomainEvent>,
}

impl ChannelNotifier {
    /// Creates a notifier with the configured buffer size.
    pub fn new(config: &NotificationsConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self { sender }
    }

    /// Subscribes to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, event: DomainEvent) {
        if let Err(e) = self.sender.send(event) {
            trace!(event_id = %e.0.id, "No subscribers for event");
        }
    }
}
