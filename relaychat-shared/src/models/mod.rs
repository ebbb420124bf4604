//! Wire models for the chat backend's HTTP and realtime contracts.

pub mod chat;
pub mod connection;
pub mod errors;
pub mod events;
pub mod message;
pub mod timestamp;

pub use chat::Chat;
pub use connection::ConnectionState;
pub use errors::ErrorResponse;
pub use events::{EVENT_JOIN_ROOM, EVENT_LEAVE_ROOM, EVENT_NEW_MESSAGE, RoomPayload};
pub use message::{Message, MessageUser, SendMessageRequest};
pub use timestamp::Timestamp;
