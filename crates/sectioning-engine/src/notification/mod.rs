//! Notification dispatch boundary.
//!
//! Notifications are fire-and-forget: a notifier never fails the operation
//! that produced the event.

pub mod channel;
pub mod log;

use async_trait::async_trait;

use sectioning_core::events::DomainEvent;

pub use self::channel::ChannelNotifier;
pub use self::log::LogNotifier;

/// Receives events after enrollment changes are committed.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Delivers one event.
    async fn notify(&self, event: DomainEvent);
}
