#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod announcements;
pub mod config;
pub mod events;
pub mod ledger;
pub mod processors;
pub mod registry;
pub mod service;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
