//! Shared vocabulary for Chat Arcade.
//!
//! Types here are used by the engine (`arcd-core`), the HTTP server
//! (`arcd-server`) and by anything that talks to the server.

pub mod config;
pub mod objects;

#[cfg(feature = "client")]
pub mod client;
