//! Conversation surfaces and the hierarchy they are fetched through.
//!
//! A [`Room`] is the addressable chat surface and the unit the directory
//! stores. [`Server`] and [`Visor`] only exist between the bulk fetch and
//! the flattening pass:
//!
//! ```text
//! Visor (pk)
//!   -> optional direct (P2P) Room
//!   -> Server 1
//!        -> Room 1.1
//!        -> Room 1.2
//!   -> Server 2
//!        -> Room 2.1
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::route::{PublicKey, RouteId};

/// Display profile attached to users, peers, servers and rooms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Info {
    pub public_key: PublicKey,
    pub alias: String,
    pub description: String,
    /// Base64-encoded image, carried as an opaque string.
    pub avatar: String,
}

/// A remote participant, with the local user's custom alias for them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Peer {
    pub info: Info,
    /// Custom alias set locally; overrides `info.alias` for display.
    pub alias: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RoomKind {
    Chat = 1,
    Board = 2,
}

impl RoomKind {
    pub fn from_wire(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Chat),
            2 => Some(Self::Board),
            _ => None,
        }
    }

    pub fn as_wire(self) -> u8 {
        self as u8
    }
}

/// One conversation surface. Identity is `route.room`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Room {
    pub route: RouteId,
    pub info: Info,
    /// Arrival-ordered history; never re-sorted.
    pub messages: Vec<Message>,
    /// Whether the hosting server announces the room to all members.
    pub visible: bool,
    pub kind: RoomKind,
    pub members: BTreeMap<PublicKey, Peer>,
    pub moderators: BTreeSet<PublicKey>,
    pub muted: BTreeSet<PublicKey>,
    pub blacklist: BTreeSet<PublicKey>,
    pub whitelist: BTreeSet<PublicKey>,
}

impl Room {
    /// The stable identity key of the conversation.
    pub fn id(&self) -> &PublicKey {
        &self.route.room
    }

    pub fn is_direct(&self) -> bool {
        self.route.is_direct()
    }

    /// The most recently appended message, used for list previews.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// A group-hosting container under a visor. Bulk-fetch shape only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Server {
    pub route: RouteId,
    pub info: Info,
    pub rooms: Vec<Room>,
    pub members: BTreeMap<PublicKey, Peer>,
    pub admins: BTreeSet<PublicKey>,
    pub muted: BTreeSet<PublicKey>,
    pub blacklist: BTreeSet<PublicKey>,
    pub whitelist: BTreeSet<PublicKey>,
}

/// Top-level node identity in the bulk-fetch response. Not retained after
/// flattening.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Visor {
    pub public_key: PublicKey,
    /// The direct conversation with this visor, if one exists.
    pub p2p: Option<Room>,
    pub servers: Vec<Server>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageKind, MessageStatus};
    use crate::route::PUBLIC_KEY_LEN;
    use chrono::Utc;

    fn pk(fill: char) -> PublicKey {
        let s: String = std::iter::repeat(fill).take(PUBLIC_KEY_LEN).collect();
        PublicKey::parse(&s).unwrap()
    }

    fn text_message(body: &str, route: &RouteId) -> Message {
        Message {
            id: body.to_string(),
            origin: route.visor.clone(),
            timestamp: Utc::now(),
            root: route.clone(),
            dest: route.clone(),
            kind: MessageKind::Text,
            subtype: None,
            body: body.to_string(),
            status: MessageStatus::Received,
            seen: false,
        }
    }

    fn empty_room(route: RouteId) -> Room {
        Room {
            info: Info {
                public_key: route.room.clone(),
                alias: String::new(),
                description: String::new(),
                avatar: String::new(),
            },
            route,
            messages: Vec::new(),
            visible: true,
            kind: RoomKind::Chat,
            members: BTreeMap::new(),
            moderators: BTreeSet::new(),
            muted: BTreeSet::new(),
            blacklist: BTreeSet::new(),
            whitelist: BTreeSet::new(),
        }
    }

    #[test]
    fn test_room_identity_is_room_key() {
        let route = RouteId::new(pk('1'), pk('2'), pk('3'));
        let room = empty_room(route);
        assert_eq!(room.id(), &pk('3'));
        assert!(!room.is_direct());

        let direct = empty_room(RouteId::p2p(pk('4')));
        assert_eq!(direct.id(), &pk('4'));
        assert!(direct.is_direct());
    }

    #[test]
    fn test_last_message_is_most_recently_appended() {
        let route = RouteId::p2p(pk('1'));
        let mut room = empty_room(route.clone());
        assert!(room.last_message().is_none());

        room.messages.push(text_message("first", &route));
        room.messages.push(text_message("second", &route));
        assert_eq!(room.last_message().unwrap().body, "second");
    }
}
