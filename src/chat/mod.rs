//! Real-time messaging core.
//!
//! One WebSocket endpoint carries group chat, polls, private messaging,
//! typing indicators and presence. The pieces:
//!
//! - **`room`** - deterministic room-id derivation
//! - **`events`** - tagged client/server event schemas (the wire format)
//! - **`registry`** - per-room broadcast channels (transient, re-derivable
//!   from `group_members` rows)
//! - **`db`** - persisted messages, poll options and votes
//! - **`engine`** - validates, persists, then broadcasts
//! - **`ws`** - the connection handler tying it all together
//!
//! Durable state lives exclusively in Postgres; the registry holds only
//! process-lifetime channel handles and is never the source of truth.

pub mod db;
pub mod engine;
pub mod events;
pub mod registry;
pub mod room;
pub mod ws;

pub use registry::RoomRegistry;
pub use room::{group_room_id, private_room_id, RoomId};
