//! End-to-end delivery semantics of the room registry: both private-chat
//! participants land in the same room without coordination, group rooms
//! do not bleed into each other, and abandoned channels get reclaimed.

use chrono::Utc;
use courtside::chat::events::{PrivateMessageOut, ServerEvent};
use courtside::chat::registry::RoomRegistry;
use courtside::chat::room::{group_room_id, private_room_id};

fn private_message(id: i64, from: &str, to: &str) -> ServerEvent {
    ServerEvent::ReceivedPrivateMessage(PrivateMessageOut {
        id,
        sender_phone_number: from.to_string(),
        receiver_phone_number: to.to_string(),
        sender_profile_avatar: None,
        message: "game at 6?".to_string(),
        created_at: Utc::now(),
    })
}

#[tokio::test]
async fn private_chat_delivers_to_both_participants() {
    let registry = RoomRegistry::new();

    // Each side derives the room from its own point of view.
    let mut alice = registry.subscribe(&private_room_id("+15550001111", "+15550002222"));
    let mut bob = registry.subscribe(&private_room_id("+15550002222", "+15550001111"));

    let event = private_message(1, "+15550001111", "+15550002222");
    let delivered = registry.broadcast(
        &private_room_id("+15550001111", "+15550002222"),
        event.clone(),
    );

    assert_eq!(delivered, 2);
    assert_eq!(alice.recv().await.unwrap(), event);
    assert_eq!(bob.recv().await.unwrap(), event);
}

#[tokio::test]
async fn group_broadcast_does_not_leak_across_rooms() {
    let registry = RoomRegistry::new();

    let mut in_room = registry.subscribe(&group_room_id(1));
    let mut elsewhere = registry.subscribe(&group_room_id(2));

    registry.broadcast(&group_room_id(1), ServerEvent::MessageDeleted(10));
    assert_eq!(
        in_room.recv().await.unwrap(),
        ServerEvent::MessageDeleted(10)
    );

    // The other room's receiver must still be empty.
    assert!(matches!(
        elsewhere.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn late_subscriber_misses_earlier_events() {
    let registry = RoomRegistry::new();
    let room = group_room_id(3);

    let _warm = registry.subscribe(&room);
    registry.broadcast(&room, ServerEvent::PollDeleted(1));

    let mut late = registry.subscribe(&room);
    registry.broadcast(&room, ServerEvent::PollDeleted(2));

    // History is served over REST on join; the channel carries only what
    // happens after subscription.
    assert_eq!(late.recv().await.unwrap(), ServerEvent::PollDeleted(2));
}

#[tokio::test]
async fn cleanup_keeps_rooms_with_live_subscribers() {
    let registry = RoomRegistry::new();
    let live = group_room_id(1);
    let dead = group_room_id(2);

    let _keep = registry.subscribe(&live);
    drop(registry.subscribe(&dead));

    registry.cleanup_inactive();

    assert_eq!(registry.receiver_count(&live), 1);
    assert_eq!(registry.broadcast(&dead, ServerEvent::PollDeleted(1)), 0);
}
