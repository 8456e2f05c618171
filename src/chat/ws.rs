//! WebSocket connection handling.
//!
//! One socket per client carries every event family. The connection
//! keeps an outbound mpsc queue; each joined room gets a forwarder task
//! that copies the room's broadcast stream into that queue. All tasks
//! are aborted on disconnect. A disconnect stops event delivery only -
//! it never rolls back in-flight persistence.

use std::collections::HashSet;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::auth::sessions::verify_token;
use crate::auth::users;
use crate::error::ChatError;
use crate::server::state::AppState;

use super::engine;
use super::events::{ClientEvent, ServerEvent};
use super::room::{group_room_id, RoomId};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// Upgrade handler for `GET /ws?token=<jwt>`.
///
/// The socket itself is authenticated (verified identity before any
/// event handler runs); banned users are refused at upgrade time.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let claims = verify_token(&query.token).map_err(|err| {
        tracing::warn!(error = %err, "websocket auth failed");
        StatusCode::UNAUTHORIZED
    })?;

    let user = users::find_user_by_phone(&state.db, &claims.phone_number)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "user lookup failed during ws upgrade");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if user.banned {
        return Err(StatusCode::FORBIDDEN);
    }

    tracing::info!(phone = %user.phone_number, "websocket connected");
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user.phone_number)))
}

async fn handle_socket(socket: WebSocket, state: AppState, self_phone: String) {
    let (mut sink, mut stream) = socket.split();
    let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Outbound pump: everything the connection should see goes through
    // this single queue, preserving per-room broadcast order.
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    tracing::error!(error = ?err, "failed to serialize server event");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut connection = Connection {
        state,
        outbound,
        self_phone,
        joined: HashSet::new(),
        forwarders: Vec::new(),
        announced: None,
    };

    // Presence is a global fan-out, not room-scoped.
    connection.spawn_forwarder(connection.state.presence.subscribe());

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                Ok(event) => connection.handle(event).await,
                Err(err) => {
                    tracing::debug!(error = %err, "rejected malformed frame");
                    let _ = connection
                        .outbound
                        .send(ServerEvent::Error(format!("Invalid payload: {err}")));
                }
            },
            Message::Close(_) => break,
            // Ping/pong is handled by the protocol layer.
            _ => {}
        }
    }

    // Advisory presence: if this connection announced itself, tell
    // everyone it went away.
    if let Some(phone) = connection.announced.take() {
        let _ = connection.state.presence.send(ServerEvent::UserOffline(phone));
    }

    for task in connection.forwarders.drain(..) {
        task.abort();
    }
    send_task.abort();
    tracing::info!(phone = %connection.self_phone, "websocket disconnected");
}

struct Connection {
    state: AppState,
    outbound: mpsc::UnboundedSender<ServerEvent>,
    self_phone: String,
    joined: HashSet<RoomId>,
    forwarders: Vec<JoinHandle<()>>,
    /// Phone announced via `userConnect`, for the implicit offline
    /// broadcast on disconnect.
    announced: Option<String>,
}

impl Connection {
    /// Subscribe this connection to a room, once.
    fn join_room(&mut self, room: RoomId) {
        if !self.joined.insert(room.clone()) {
            return;
        }
        let rx = self.state.rooms.subscribe(&room);
        self.spawn_forwarder(rx);
    }

    fn spawn_forwarder(&mut self, mut rx: broadcast::Receiver<ServerEvent>) {
        let outbound = self.outbound.clone();
        let own_phone = self.self_phone.clone();
        self.forwarders.push(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        // The sender's own connections drop the
                        // notification copy of their private messages.
                        if let ServerEvent::Notification(notification) = &event {
                            if notification.sender_phone_number == own_phone {
                                continue;
                            }
                        }
                        if outbound.send(event).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "room forwarder lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    fn emit(&self, event: ServerEvent) {
        let _ = self.outbound.send(event);
    }

    async fn handle(&mut self, event: ClientEvent) {
        let result = self.dispatch(event).await;
        if let Err(err) = result {
            if let ChatError::Internal(detail) = &err {
                tracing::error!(error = %detail, "chat operation failed");
            }
            self.emit(ServerEvent::Error(err.to_string()));
        }
    }

    async fn dispatch(&mut self, event: ClientEvent) -> Result<(), ChatError> {
        let db = self.state.db.clone();
        let rooms = self.state.rooms.clone();

        match event {
            ClientEvent::UserConnect(phone) => {
                self.announced = Some(phone.clone());
                let _ = self.state.presence.send(ServerEvent::UserOnline(phone));
                Ok(())
            }
            ClientEvent::UserDisconnect(phone) => {
                self.announced = None;
                let _ = self.state.presence.send(ServerEvent::UserOffline(phone));
                Ok(())
            }
            ClientEvent::JoinGroup(payload) => {
                engine::ensure_group_member(&db, payload.group_id, &payload.phone_number).await?;
                // Subscribe before fetching history so a message posted
                // in between still reaches this connection.
                self.join_room(group_room_id(payload.group_id));
                let history = engine::group_history(&db, payload.group_id).await?;
                self.emit(ServerEvent::LoadMessages(history));
                Ok(())
            }
            ClientEvent::SendMessage(payload) => {
                engine::post_group_message(&db, &rooms, payload).await
            }
            ClientEvent::VotePoll(payload) => engine::vote_poll(&db, &rooms, payload).await,
            ClientEvent::DeletePoll(payload) => engine::delete_poll(&db, &rooms, payload).await,
            ClientEvent::DeleteMessage(payload) => {
                engine::delete_group_message(&db, &rooms, payload).await
            }
            ClientEvent::StartChat(payload) => {
                let (room, history) = engine::start_private_chat(&db, payload).await?;
                self.join_room(room);
                self.emit(ServerEvent::LoadPrivateMessages(history));
                Ok(())
            }
            ClientEvent::SendPrivateMessage(payload) => {
                engine::send_private_message(&db, &rooms, payload).await
            }
            ClientEvent::DeletePrivateMessage(payload) => {
                engine::delete_private_message(&db, &rooms, payload).await
            }
            ClientEvent::UserTyping(payload) => {
                engine::relay_typing(&rooms, &payload, false);
                Ok(())
            }
            ClientEvent::UserStoppedTyping(payload) => {
                engine::relay_typing(&rooms, &payload, true);
                Ok(())
            }
        }
    }
}
