//! Announcer processor.
//!
//! The Announcer is responsible for:
//! - Receiving `Announcement`s queued by the [`ChannelNotifier`](crate::announcements::ChannelNotifier)
//! - Logging every announcement
//! - Republishing them to subscribers (the chat transport, dashboards)
//!
//! Delivery is best effort. Nobody listening is not an error.

use crate::announcements::{Announcement, AnnouncementReceiver};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

const OUTBOX_CAPACITY: usize = 128;

pub struct Announcer {
    announcement_rx: AnnouncementReceiver,
    shutdown_rx: watch::Receiver<bool>,
    outbox: broadcast::Sender<Announcement>,
}

impl Announcer {
    /// # Arguments
    ///
    /// * `announcement_rx` - Receiver side of the announcement queue
    /// * `shutdown_rx` - Receiver for shutdown signal
    pub fn new(announcement_rx: AnnouncementReceiver, shutdown_rx: watch::Receiver<bool>) -> Self {
        let (outbox, _) = broadcast::channel(OUTBOX_CAPACITY);
        Self {
            announcement_rx,
            shutdown_rx,
            outbox,
        }
    }

    /// Subscribe to delivered announcements. Must be called before [`run`](Self::run).
    pub fn subscribe(&self) -> broadcast::Receiver<Announcement> {
        self.outbox.subscribe()
    }

    pub async fn run(mut self) {
        info!("Announcer started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("Announcer received shutdown signal");
                        break;
                    }
                }

                Some(announcement) = self.announcement_rx.recv() => {
                    self.deliver(announcement);
                }

                else => {
                    info!("Announcement channel closed");
                    break;
                }
            }
        }

        // Flush what the events queued before shutdown.
        while let Ok(announcement) = self.announcement_rx.try_recv() {
            self.deliver(announcement);
        }

        info!("Announcer shutdown complete");
    }

    fn deliver(&self, announcement: Announcement) {
        info!(
            channel = %announcement.channel,
            message = %announcement.message,
            "Announcement"
        );
        if self.outbox.send(announcement).is_err() {
            debug!("No announcement subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announcements::{ChannelNotifier, Notifier, announcement_channel};

    #[tokio::test]
    async fn test_relays_queued_announcements() {
        let (tx, rx) = announcement_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let announcer = Announcer::new(rx, shutdown_rx);
        let mut delivered = announcer.subscribe();
        let task = tokio::spawn(announcer.run());

        ChannelNotifier::new(tx).send("#arcade", "hello chat".to_string());

        let announcement = delivered.recv().await.unwrap();
        assert_eq!(announcement.channel, "#arcade");
        assert_eq!(announcement.message, "hello chat");

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }
}
