//! Chat announcements.
//!
//! Events talk to the audience through the [`Notifier`] trait. Sending is
//! fire-and-forget: an event never waits for, or learns about, delivery.
//!
//! The bundled [`ChannelNotifier`] pushes announcements onto a bounded
//! queue that the [`Announcer`](crate::processors::Announcer) processor
//! drains and hands to the chat transport.

pub mod channels;

pub use channels::{
    AnnouncementReceiver, AnnouncementSender, DEFAULT_CHANNEL_BUFFER, announcement_channel,
};

use compact_str::CompactString;
use tracing::warn;

/// A message for one chat channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub channel: CompactString,
    pub message: String,
}

pub trait Notifier: Send + Sync {
    fn send(&self, channel: &str, message: String);
}

/// Queues announcements for the [`Announcer`](crate::processors::Announcer).
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: AnnouncementSender,
}

impl ChannelNotifier {
    pub fn new(tx: AnnouncementSender) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn send(&self, channel: &str, message: String) {
        let announcement = Announcement {
            channel: CompactString::from(channel),
            message,
        };
        if let Err(e) = self.tx.try_send(announcement) {
            warn!(channel, error = %e, "Dropped announcement");
        }
    }
}
