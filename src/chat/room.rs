//! Room identifiers.
//!
//! A room is an ephemeral broadcast scope: one per chat group, one per
//! unordered pair of private-chat participants. Private room ids must be
//! a deterministic function of the two participant keys regardless of
//! who initiates, so both sides converge on the same room without
//! coordination.

/// Opaque room identifier used as the registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Room id for a group chat.
pub fn group_room_id(group_id: i64) -> RoomId {
    RoomId(format!("group:{group_id}"))
}

/// Room id for a private chat: the two phone numbers in canonical
/// (sorted) order, joined by '-'.
pub fn private_room_id(a: &str, b: &str) -> RoomId {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    RoomId(format!("{lo}-{hi}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_room_is_symmetric() {
        assert_eq!(
            private_room_id("+15550001111", "+15550002222"),
            private_room_id("+15550002222", "+15550001111")
        );
    }

    #[test]
    fn private_room_uses_sorted_order() {
        let room = private_room_id("+15550002222", "+15550001111");
        assert_eq!(room.as_str(), "+15550001111-+15550002222");
    }

    #[test]
    fn identical_keys_still_form_a_room() {
        let room = private_room_id("+15550001111", "+15550001111");
        assert_eq!(room.as_str(), "+15550001111-+15550001111");
    }

    #[test]
    fn group_rooms_are_distinct_from_private_rooms() {
        assert_ne!(
            group_room_id(7),
            private_room_id("group:7", "group:7")
        );
    }
}
