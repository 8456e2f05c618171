//! The WebSocket JSON contract, exercised through the public crate API.
//!
//! Clients were written against these exact event names and key spellings,
//! so these tests pin them down: renaming a variant or a field is a
//! breaking change that should fail here first.

use chrono::Utc;
use courtside::chat::events::{
    ClientEvent, MessageOut, NotificationOut, PrivateMessageOut, ServerEvent,
};
use pretty_assertions::assert_eq;

#[test]
fn every_inbound_event_name_parses() {
    let frames = [
        r#"{"event":"userConnect","data":"+15550001111"}"#,
        r#"{"event":"userDisconnect","data":"+15550001111"}"#,
        r#"{"event":"joinGroup","data":{"groupId":1,"phoneNumber":"+1555"}}"#,
        r#"{"event":"sendMessage","data":{"groupId":1,"phoneNumber":"+1555","message":"hi"}}"#,
        r#"{"event":"sendMessage","data":{"groupId":1,"phoneNumber":"+1555","message":"best time?","isPoll":true,"options":["6pm","8pm"]}}"#,
        r#"{"event":"votePoll","data":{"groupId":1,"phoneNumber":"+1555","pollId":2,"optionId":3}}"#,
        r#"{"event":"deletePoll","data":{"groupId":1,"pollId":2}}"#,
        r#"{"event":"deleteMessage","data":{"messageId":4,"groupId":1,"phoneNumber":"+1555"}}"#,
        r#"{"event":"startChat","data":{"senderPhoneNumber":"+1555","receiverPhoneNumber":"+1666"}}"#,
        r#"{"event":"sendPrivateMessage","data":{"senderPhoneNumber":"+1555","receiverPhoneNumber":"+1666","message":"hey"}}"#,
        r#"{"event":"deletePrivateMessage","data":{"messageId":9,"senderPhoneNumber":"+1555"}}"#,
        r#"{"event":"userTyping","data":{"senderPhoneNumber":"+1555","receiverPhoneNumber":"+1666"}}"#,
        r#"{"event":"userStoppedTyping","data":{"senderPhoneNumber":"+1555","receiverPhoneNumber":"+1666"}}"#,
    ];

    for frame in frames {
        serde_json::from_str::<ClientEvent>(frame)
            .unwrap_or_else(|err| panic!("frame {frame} did not parse: {err}"));
    }
}

#[test]
fn outbound_event_names_are_stable() {
    let cases: Vec<(ServerEvent, &str)> = vec![
        (ServerEvent::UserOnline("+1".into()), "userOnline"),
        (ServerEvent::UserOffline("+1".into()), "userOffline"),
        (ServerEvent::LoadMessages(vec![]), "loadMessages"),
        (ServerEvent::PollDeleted(1), "pollDeleted"),
        (ServerEvent::MessageDeleted(1), "messageDeleted"),
        (ServerEvent::LoadPrivateMessages(vec![]), "loadPrivateMessages"),
        (ServerEvent::DeleteMessage { message_id: 1 }, "deleteMessage"),
        (ServerEvent::Typing("+1".into()), "typing"),
        (ServerEvent::StoppedTyping("+1".into()), "stoppedTyping"),
        (ServerEvent::Error("bad frame".into()), "error"),
    ];

    for (event, name) in cases {
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], name, "wrong tag for {event:?}");
    }
}

#[test]
fn group_message_frame_matches_the_client_shape() {
    let event = ServerEvent::Message(MessageOut {
        id: 12,
        group_id: 3,
        phone_number: "+15550001111".into(),
        profile_avatar: Some("avatar.png".into()),
        message: "anyone up for doubles?".into(),
        is_poll: false,
        created_at: Utc::now(),
    });

    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event"], "message");
    assert_eq!(json["data"]["groupId"], 3);
    assert_eq!(json["data"]["phoneNumber"], "+15550001111");
    assert_eq!(json["data"]["isPoll"], false);
    assert!(json["data"]["createdAt"].is_string());
}

#[test]
fn new_poll_carries_message_and_raw_options() {
    let event = ServerEvent::NewPoll {
        message: MessageOut {
            id: 20,
            group_id: 3,
            phone_number: "+1".into(),
            profile_avatar: None,
            message: "best time?".into(),
            is_poll: true,
            created_at: Utc::now(),
        },
        options: vec!["6pm".into(), "8pm".into()],
    };

    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event"], "newPoll");
    assert_eq!(json["data"]["message"]["isPoll"], true);
    assert_eq!(json["data"]["options"][1], "8pm");
}

#[test]
fn notification_frame_exposes_type_and_sender() {
    let event = ServerEvent::Notification(NotificationOut {
        kind: "private_message".into(),
        sender_phone_number: "+15550001111".into(),
        message: PrivateMessageOut {
            id: 7,
            sender_phone_number: "+15550001111".into(),
            receiver_phone_number: "+15550002222".into(),
            sender_profile_avatar: None,
            message: "hey".into(),
            created_at: Utc::now(),
        },
    });

    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event"], "notification");
    assert_eq!(json["data"]["type"], "private_message");
    assert_eq!(json["data"]["senderPhoneNumber"], "+15550001111");
    assert_eq!(json["data"]["message"]["receiverPhoneNumber"], "+15550002222");
}

#[test]
fn private_delete_uses_camel_case_message_id() {
    let json = serde_json::to_value(ServerEvent::DeleteMessage { message_id: 41 }).unwrap();
    assert_eq!(json["data"]["messageId"], 41);
}

#[test]
fn server_frames_survive_a_round_trip() {
    let original = ServerEvent::ReceivedPrivateMessage(PrivateMessageOut {
        id: 5,
        sender_phone_number: "+1".into(),
        receiver_phone_number: "+2".into(),
        sender_profile_avatar: Some("a.png".into()),
        message: "see you at the court".into(),
        created_at: Utc::now(),
    });

    let text = serde_json::to_string(&original).unwrap();
    let parsed: ServerEvent = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, original);
}
