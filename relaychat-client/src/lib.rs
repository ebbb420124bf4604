#![cfg_attr(not(test), forbid(unsafe_code))]
//! Core client services for relaychat.
//!
//! The pieces compose bottom-up: a [`transport::RealtimeTransport`] carries
//! the single shared realtime connection, the [`supervisor::ConnectionSupervisor`]
//! owns its lifecycle, the [`registry::SubscriptionRegistry`] fans received
//! events out to logical subscribers, [`membership::RoomMembership`] issues
//! join/leave intents, and one [`engine::ReconciliationEngine`] per open room
//! merges history, pushes, and optimistic echoes into a single timeline.
//! [`room::RoomSession`] ties a view's lifetime to all of the above.

pub mod engine;
pub mod error;
pub mod gateway;
pub mod membership;
pub mod registry;
pub mod room;
pub mod supervisor;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ClientError, Result};
