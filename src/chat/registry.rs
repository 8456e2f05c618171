//! Per-room broadcast channels.
//!
//! Each room (group chat or private pair) owns one `tokio::sync::broadcast`
//! channel. Connections subscribe when they join a room; the engine
//! publishes after each successful persist. The registry holds only
//! transient channel handles - membership authorization always goes back
//! to the `group_members` rows, never to this map.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use super::events::ServerEvent;
use super::room::RoomId;

const ROOM_CHANNEL_CAPACITY: usize = 100;

/// Registry of live room channels. Cheap to clone; shared across all
/// connection handlers.
#[derive(Clone)]
pub struct RoomRegistry {
    channels: Arc<Mutex<HashMap<RoomId, broadcast::Sender<ServerEvent>>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get or create the sender for a room.
    pub fn sender(&self, room: &RoomId) -> broadcast::Sender<ServerEvent> {
        let mut channels = self.channels.lock().expect("room registry poisoned");
        channels
            .entry(room.clone())
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Subscribe a connection to a room.
    pub fn subscribe(&self, room: &RoomId) -> broadcast::Receiver<ServerEvent> {
        self.sender(room).subscribe()
    }

    /// Broadcast an event to everyone currently subscribed to a room.
    /// Returns the number of receivers; a room with no listeners is not
    /// an error.
    pub fn broadcast(&self, room: &RoomId, event: ServerEvent) -> usize {
        let sender = {
            let channels = self.channels.lock().expect("room registry poisoned");
            channels.get(room).cloned()
        };
        match sender {
            Some(tx) => tx.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Drop channels that no connection is subscribed to anymore.
    /// Called periodically from a background task.
    pub fn cleanup_inactive(&self) {
        self.channels
            .lock()
            .expect("room registry poisoned")
            .retain(|_, sender| sender.receiver_count() > 0);
    }

    pub fn receiver_count(&self, room: &RoomId) -> usize {
        self.channels
            .lock()
            .expect("room registry poisoned")
            .get(room)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::room::{group_room_id, private_room_id};

    #[tokio::test]
    async fn broadcast_reaches_all_subscribers() {
        let registry = RoomRegistry::new();
        let room = group_room_id(1);

        let mut rx_a = registry.subscribe(&room);
        let mut rx_b = registry.subscribe(&room);

        let delivered = registry.broadcast(&room, ServerEvent::PollDeleted(42));
        assert_eq!(delivered, 2);

        assert_eq!(rx_a.recv().await.unwrap(), ServerEvent::PollDeleted(42));
        assert_eq!(rx_b.recv().await.unwrap(), ServerEvent::PollDeleted(42));
    }

    #[tokio::test]
    async fn broadcast_to_unknown_room_is_a_noop() {
        let registry = RoomRegistry::new();
        let delivered = registry.broadcast(&group_room_id(99), ServerEvent::PollDeleted(1));
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let registry = RoomRegistry::new();
        let room_a = group_room_id(1);
        let room_b = group_room_id(2);

        let mut rx_a = registry.subscribe(&room_a);
        let _rx_b = registry.subscribe(&room_b);

        registry.broadcast(&room_a, ServerEvent::MessageDeleted(7));
        assert_eq!(rx_a.recv().await.unwrap(), ServerEvent::MessageDeleted(7));
        // room_b saw nothing
        assert_eq!(registry.broadcast(&room_b, ServerEvent::PollDeleted(1)), 1);
    }

    #[tokio::test]
    async fn both_initiators_land_in_the_same_private_room() {
        let registry = RoomRegistry::new();
        let from_a = private_room_id("+1", "+2");
        let from_b = private_room_id("+2", "+1");

        let _rx = registry.subscribe(&from_a);
        assert_eq!(registry.receiver_count(&from_b), 1);
    }

    #[tokio::test]
    async fn cleanup_drops_abandoned_channels() {
        let registry = RoomRegistry::new();
        let room = group_room_id(5);

        {
            let _rx = registry.subscribe(&room);
            assert_eq!(registry.receiver_count(&room), 1);
        }

        registry.cleanup_inactive();
        assert_eq!(registry.receiver_count(&room), 0);
        // Channel map no longer holds the entry; broadcasting is a noop.
        assert_eq!(registry.broadcast(&room, ServerEvent::PollDeleted(1)), 0);
    }
}
