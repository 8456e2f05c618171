//! Wire format for the WebSocket channel.
//!
//! Every frame is a tagged JSON object `{"event": <name>, "data": <payload>}`.
//! Payloads are validated here, at the boundary, before anything reaches
//! the engine; a frame that does not deserialize is answered with an
//! `error` event. Event names are part of the public contract and match
//! the client's existing vocabulary (including the one PascalCase
//! outlier, `ReceivedPrivateMessage`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events a client may send.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Announce presence; the payload is the caller's phone number.
    #[serde(rename = "userConnect")]
    UserConnect(String),
    #[serde(rename = "userDisconnect")]
    UserDisconnect(String),
    #[serde(rename = "joinGroup")]
    JoinGroup(JoinGroup),
    #[serde(rename = "sendMessage")]
    SendMessage(SendMessage),
    #[serde(rename = "votePoll")]
    VotePoll(VotePoll),
    #[serde(rename = "deletePoll")]
    DeletePoll(DeletePoll),
    #[serde(rename = "deleteMessage")]
    DeleteMessage(DeleteMessage),
    #[serde(rename = "startChat")]
    StartChat(StartChat),
    #[serde(rename = "sendPrivateMessage")]
    SendPrivateMessage(SendPrivateMessage),
    #[serde(rename = "deletePrivateMessage")]
    DeletePrivateMessage(DeletePrivateMessage),
    #[serde(rename = "userTyping")]
    UserTyping(TypingPayload),
    #[serde(rename = "userStoppedTyping")]
    UserStoppedTyping(TypingPayload),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroup {
    pub group_id: i64,
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub group_id: i64,
    pub phone_number: String,
    pub message: String,
    #[serde(default)]
    pub is_poll: bool,
    /// Option texts; required when `is_poll` is true.
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePoll {
    pub group_id: i64,
    pub phone_number: String,
    pub poll_id: i64,
    pub option_id: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePoll {
    pub group_id: i64,
    pub poll_id: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMessage {
    pub message_id: i64,
    pub group_id: i64,
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartChat {
    pub sender_phone_number: String,
    pub receiver_phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPrivateMessage {
    pub sender_phone_number: String,
    pub receiver_phone_number: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePrivateMessage {
    pub message_id: i64,
    pub sender_phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub sender_phone_number: String,
    pub receiver_phone_number: String,
}

/// Events the server emits. Must be `Clone`: one instance fans out to
/// every subscriber of a room's broadcast channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "userOnline")]
    UserOnline(String),
    #[serde(rename = "userOffline")]
    UserOffline(String),
    /// Group history sent to a joining member.
    #[serde(rename = "loadMessages")]
    LoadMessages(Vec<MessageWithOptions>),
    #[serde(rename = "message")]
    Message(MessageOut),
    /// A freshly created poll: the message row plus the raw option texts.
    #[serde(rename = "newPoll")]
    NewPoll {
        message: MessageOut,
        options: Vec<String>,
    },
    /// Consolidated snapshot after any vote; never a partial diff.
    #[serde(rename = "pollResults")]
    PollResults { poll: PollSnapshot },
    #[serde(rename = "pollDeleted")]
    PollDeleted(i64),
    #[serde(rename = "messageDeleted")]
    MessageDeleted(i64),
    #[serde(rename = "loadPrivateMessages")]
    LoadPrivateMessages(Vec<PrivateMessageOut>),
    #[serde(rename = "ReceivedPrivateMessage")]
    ReceivedPrivateMessage(PrivateMessageOut),
    /// Out-of-band copy of a private message for members of the room
    /// other than the sender; connections drop their own.
    #[serde(rename = "notification")]
    Notification(NotificationOut),
    /// Private-message deletion, scoped to the pair room.
    #[serde(rename = "deleteMessage")]
    DeleteMessage { #[serde(rename = "messageId")] message_id: i64 },
    #[serde(rename = "typing")]
    Typing(String),
    #[serde(rename = "stoppedTyping")]
    StoppedTyping(String),
    #[serde(rename = "error")]
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageOut {
    pub id: i64,
    pub group_id: i64,
    pub phone_number: String,
    pub profile_avatar: Option<String>,
    pub message: String,
    pub is_poll: bool,
    pub created_at: DateTime<Utc>,
}

/// A group message with its poll options stitched in (empty for plain
/// messages).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageWithOptions {
    #[serde(flatten)]
    pub message: MessageOut,
    pub options: Vec<PollOptionOut>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollOptionOut {
    pub id: i64,
    #[serde(rename = "pollId")]
    pub poll_id: i64,
    // The client reads these two in snake_case; historical wire names.
    pub option_text: String,
    pub votes: i32,
    pub option_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollSnapshot {
    pub id: i64,
    pub question: String,
    pub options: Vec<PollOptionOut>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessageOut {
    pub id: i64,
    pub sender_phone_number: String,
    pub receiver_phone_number: String,
    pub sender_profile_avatar: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOut {
    #[serde(rename = "type")]
    pub kind: String,
    pub sender_phone_number: String,
    pub message: PrivateMessageOut,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn join_group_frame_round_trips() {
        let frame = r#"{"event":"joinGroup","data":{"groupId":3,"phoneNumber":"+15550001111"}}"#;
        let event: ClientEvent = serde_json::from_str(frame).unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinGroup(JoinGroup {
                group_id: 3,
                phone_number: "+15550001111".to_string(),
            })
        );
    }

    #[test]
    fn user_connect_payload_is_a_bare_string() {
        let frame = r#"{"event":"userConnect","data":"+15550001111"}"#;
        let event: ClientEvent = serde_json::from_str(frame).unwrap();
        assert_eq!(event, ClientEvent::UserConnect("+15550001111".to_string()));
    }

    #[test]
    fn send_message_defaults_to_plain_message() {
        let frame = r#"{"event":"sendMessage","data":{"groupId":1,"phoneNumber":"+1555","message":"hi"}}"#;
        let event: ClientEvent = serde_json::from_str(frame).unwrap();
        match event {
            ClientEvent::SendMessage(payload) => {
                assert!(!payload.is_poll);
                assert_eq!(payload.options, None);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let frame = r#"{"event":"votePoll","data":{"groupId":"not-a-number"}}"#;
        assert!(serde_json::from_str::<ClientEvent>(frame).is_err());
    }

    #[test]
    fn unknown_event_is_rejected() {
        let frame = r#"{"event":"dropTables","data":{}}"#;
        assert!(serde_json::from_str::<ClientEvent>(frame).is_err());
    }

    #[test]
    fn received_private_message_keeps_historical_name() {
        let event = ServerEvent::ReceivedPrivateMessage(PrivateMessageOut {
            id: 9,
            sender_phone_number: "+1".to_string(),
            receiver_phone_number: "+2".to_string(),
            sender_profile_avatar: None,
            message: "hello".to_string(),
            created_at: Utc::now(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "ReceivedPrivateMessage");
    }

    #[test]
    fn poll_option_wire_names_are_stable() {
        let option = PollOptionOut {
            id: 4,
            poll_id: 2,
            option_text: "Yes".to_string(),
            votes: 1,
            option_id: 4,
        };
        let json = serde_json::to_value(&option).unwrap();
        assert_eq!(json["pollId"], 2);
        assert_eq!(json["option_text"], "Yes");
        assert_eq!(json["option_id"], 4);
    }

    #[test]
    fn message_with_options_flattens_the_row() {
        let wrapped = MessageWithOptions {
            message: MessageOut {
                id: 1,
                group_id: 2,
                phone_number: "+1".to_string(),
                profile_avatar: None,
                message: "poll?".to_string(),
                is_poll: true,
                created_at: Utc::now(),
            },
            options: vec![],
        };
        let json = serde_json::to_value(&wrapped).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["isPoll"], true);
        assert!(json["options"].as_array().unwrap().is_empty());
    }
}
