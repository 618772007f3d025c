//! Announcement queue handles.

use super::Announcement;
use tokio::sync::mpsc;

/// Enough room for a burst of results (a heist with many winners) while
/// keeping memory bounded if the chat transport stalls.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

pub type AnnouncementSender = mpsc::Sender<Announcement>;
pub type AnnouncementReceiver = mpsc::Receiver<Announcement>;

pub fn announcement_channel() -> (AnnouncementSender, AnnouncementReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
