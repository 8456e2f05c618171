//! Message/poll engine.
//!
//! Each operation follows the same shape: authorize against persisted
//! rows, persist, then broadcast to the room. Broadcast order within a
//! room therefore matches persist completion order; there is no global
//! ordering across rooms. Errors surface as [`ChatError`] and are
//! emitted to the offending connection only - room members never see
//! another connection's failures.

use sqlx::PgPool;

use crate::auth::users;
use crate::error::ChatError;

use super::db;
use super::events::{
    DeleteMessage, DeletePoll, DeletePrivateMessage, MessageWithOptions, NotificationOut,
    PrivateMessageOut, SendMessage, SendPrivateMessage, ServerEvent, StartChat, TypingPayload,
    VotePoll,
};
use super::registry::RoomRegistry;
use super::room::{group_room_id, private_room_id, RoomId};

/// Authorize a group join. A non-member gets `error` and is never
/// subscribed to the room.
pub async fn ensure_group_member(
    pool: &PgPool,
    group_id: i64,
    phone_number: &str,
) -> Result<(), ChatError> {
    if db::find_member(pool, group_id, phone_number).await?.is_none() {
        tracing::warn!(
            group_id,
            phone = phone_number,
            "unauthorized group join attempt"
        );
        return Err(ChatError::NotAMember);
    }
    Ok(())
}

/// Ordered history for the `loadMessages` emit after a join. The ws
/// layer subscribes to the room before calling this, so a message
/// posted concurrently arrives over the channel even when the history
/// query misses it.
pub async fn group_history(
    pool: &PgPool,
    group_id: i64,
) -> Result<Vec<MessageWithOptions>, ChatError> {
    Ok(db::group_history(pool, group_id).await?)
}

/// Post a plain message or create a poll in a group.
pub async fn post_group_message(
    pool: &PgPool,
    rooms: &RoomRegistry,
    payload: SendMessage,
) -> Result<(), ChatError> {
    let member = db::find_member(pool, payload.group_id, &payload.phone_number)
        .await?
        .ok_or(ChatError::NotAMember)?;

    let room = group_room_id(payload.group_id);

    if payload.is_poll {
        let options = payload.options.unwrap_or_default();
        if options.is_empty() {
            return Err(ChatError::Validation(
                "A poll needs at least one option".to_string(),
            ));
        }

        let message = db::insert_poll(
            pool,
            payload.group_id,
            &payload.phone_number,
            member.profile_avatar.as_deref(),
            &payload.message,
            &options,
        )
        .await?;

        tracing::info!(poll_id = message.id, group_id = payload.group_id, "poll created");
        rooms.broadcast(&room, ServerEvent::NewPoll { message, options });
    } else {
        let message = db::insert_message(
            pool,
            payload.group_id,
            &payload.phone_number,
            member.profile_avatar.as_deref(),
            &payload.message,
        )
        .await?;

        rooms.broadcast(&room, ServerEvent::Message(message));
    }

    Ok(())
}

/// Record a vote and broadcast the consolidated results snapshot.
pub async fn vote_poll(
    pool: &PgPool,
    rooms: &RoomRegistry,
    payload: VotePoll,
) -> Result<(), ChatError> {
    if !db::poll_exists(pool, payload.poll_id).await? {
        return Err(ChatError::PollNotFound);
    }

    db::record_vote(pool, payload.poll_id, &payload.phone_number, payload.option_id).await?;

    let snapshot = db::poll_snapshot(pool, payload.poll_id)
        .await?
        .ok_or(ChatError::PollNotFound)?;

    tracing::debug!(
        poll_id = payload.poll_id,
        option_id = payload.option_id,
        voter = %payload.phone_number,
        "vote recorded"
    );

    rooms.broadcast(
        &group_room_id(payload.group_id),
        ServerEvent::PollResults { poll: snapshot },
    );
    Ok(())
}

/// Cascade-delete a poll and announce it to the room.
pub async fn delete_poll(
    pool: &PgPool,
    rooms: &RoomRegistry,
    payload: DeletePoll,
) -> Result<(), ChatError> {
    db::delete_poll(pool, payload.poll_id).await?;

    tracing::info!(poll_id = payload.poll_id, "poll deleted");
    rooms.broadcast(
        &group_room_id(payload.group_id),
        ServerEvent::PollDeleted(payload.poll_id),
    );
    Ok(())
}

/// Delete a group message; only its author may do so.
pub async fn delete_group_message(
    pool: &PgPool,
    rooms: &RoomRegistry,
    payload: DeleteMessage,
) -> Result<(), ChatError> {
    let message = db::find_group_message(pool, payload.message_id, payload.group_id)
        .await?
        .ok_or(ChatError::NotFound)?;

    if message.phone_number != payload.phone_number {
        return Err(ChatError::Forbidden);
    }

    db::delete_message(pool, payload.message_id).await?;
    rooms.broadcast(
        &group_room_id(payload.group_id),
        ServerEvent::MessageDeleted(payload.message_id),
    );
    Ok(())
}

/// Resolve both participants and return the pair room plus prior
/// history. Both initiators converge on the same room id.
pub async fn start_private_chat(
    pool: &PgPool,
    payload: StartChat,
) -> Result<(RoomId, Vec<PrivateMessageOut>), ChatError> {
    let receiver = users::find_user_by_phone(pool, &payload.receiver_phone_number)
        .await
        .map_err(ChatError::from)?
        .ok_or(ChatError::UserNotFound("Receiver"))?;
    let sender = users::find_user_by_phone(pool, &payload.sender_phone_number)
        .await
        .map_err(ChatError::from)?
        .ok_or(ChatError::UserNotFound("Sender"))?;

    let room = private_room_id(&sender.phone_number, &receiver.phone_number);
    let history =
        crate::messaging::db::history_between(pool, &sender.phone_number, &receiver.phone_number)
            .await
            .map_err(ChatError::from)?;

    Ok((room, history))
}

/// Persist and deliver a private message. The room gets
/// `ReceivedPrivateMessage`; everyone in the room except the sender's
/// own connections also gets a `notification` (the ws layer drops the
/// sender's copy).
pub async fn send_private_message(
    pool: &PgPool,
    rooms: &RoomRegistry,
    payload: SendPrivateMessage,
) -> Result<(), ChatError> {
    let receiver = users::find_user_by_phone(pool, &payload.receiver_phone_number)
        .await
        .map_err(ChatError::from)?
        .ok_or(ChatError::UserNotFound("Receiver"))?;
    let sender = users::find_user_by_phone(pool, &payload.sender_phone_number)
        .await
        .map_err(ChatError::from)?
        .ok_or(ChatError::UserNotFound("Sender"))?;

    let message = crate::messaging::db::insert_private_message(
        pool,
        &sender.phone_number,
        &receiver.phone_number,
        sender.profile_avatar.as_deref(),
        &payload.message,
    )
    .await
    .map_err(ChatError::from)?;

    let room = private_room_id(&sender.phone_number, &receiver.phone_number);
    rooms.broadcast(&room, ServerEvent::ReceivedPrivateMessage(message.clone()));
    rooms.broadcast(
        &room,
        ServerEvent::Notification(NotificationOut {
            kind: "private".to_string(),
            sender_phone_number: sender.phone_number.clone(),
            message,
        }),
    );
    Ok(())
}

/// Delete a private message. Ownership is enforced by the query itself:
/// a wrong requester simply finds nothing.
pub async fn delete_private_message(
    pool: &PgPool,
    rooms: &RoomRegistry,
    payload: DeletePrivateMessage,
) -> Result<(), ChatError> {
    let message = crate::messaging::db::find_by_id_and_sender(
        pool,
        payload.message_id,
        &payload.sender_phone_number,
    )
    .await
    .map_err(ChatError::from)?
    .ok_or(ChatError::NotFound)?;

    crate::messaging::db::delete_private_message(pool, payload.message_id)
        .await
        .map_err(ChatError::from)?;

    let room = private_room_id(&message.sender_phone, &message.receiver_phone);
    rooms.broadcast(
        &room,
        ServerEvent::DeleteMessage {
            message_id: payload.message_id,
        },
    );
    Ok(())
}

/// Typing indicators are stateless relays: nothing is persisted, the
/// event is simply re-broadcast to the deterministic pair room.
pub fn relay_typing(rooms: &RoomRegistry, payload: &TypingPayload, stopped: bool) {
    let room = private_room_id(
        &payload.sender_phone_number,
        &payload.receiver_phone_number,
    );
    let event = if stopped {
        ServerEvent::StoppedTyping(payload.sender_phone_number.clone())
    } else {
        ServerEvent::Typing(payload.sender_phone_number.clone())
    };
    rooms.broadcast(&room, event);
}
