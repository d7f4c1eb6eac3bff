//! Types shared between the rules engine and the browser client:
//! wire-level messages, the rules configuration, and small geometry helpers.
//!
//! Everything here derives `ts_rs::TS` so TypeScript bindings can be
//! generated for the client.

pub mod body;
pub mod config;
pub mod protocol;
pub mod vec2;
