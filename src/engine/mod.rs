//! Pairs an HTTP/1.1 decoder with its encoder for one connection, and
//! hands both off to an [`UpgradeProvider`](crate::upgrade::UpgradeProvider)
//! once a `101 Switching Protocols` exchange completes.
pub mod client;
pub mod server;

pub use client::ClientEngine;
pub use server::ServerEngine;
