//! Long-running processors.
//!
//! - `Announcer`: Receives `Announcement`s, logs and republishes them

pub mod announcer;

pub use announcer::Announcer;
