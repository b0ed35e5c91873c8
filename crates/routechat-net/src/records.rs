//! Wire records for the chat service's JSON responses.
//!
//! Shapes mirror the service exactly, capitalized field names included.
//! Collections the service may omit or null out are `Option`s here, and
//! every conversion into a domain type is fallible: a malformed record is
//! a typed decode error, never a silently empty value.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use routechat_shared::{
    BulkLoadError, ConnectionSubtype, FetchError, Info, Message, MessageKind, MessageStatus, Peer,
    PublicKey, Room, RoomKind, RouteId, Server, Visor,
};

/// A record failed to convert into its domain type.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct DecodeError(pub String);

impl From<DecodeError> for FetchError {
    fn from(e: DecodeError) -> Self {
        FetchError::Decode(e.0)
    }
}

impl From<DecodeError> for BulkLoadError {
    fn from(e: DecodeError) -> Self {
        BulkLoadError::Decode(e.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoRecord {
    #[serde(rename = "Pk")]
    pub pk: PublicKey,
    #[serde(rename = "Alias", default)]
    pub alias: String,
    #[serde(rename = "Desc", default)]
    pub desc: String,
    #[serde(rename = "Img", default)]
    pub img: String,
}

impl From<InfoRecord> for Info {
    fn from(r: InfoRecord) -> Self {
        Info {
            public_key: r.pk,
            alias: r.alias,
            description: r.desc,
            avatar: r.img,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRecord {
    #[serde(rename = "Visor")]
    pub visor: PublicKey,
    #[serde(rename = "Server")]
    pub server: PublicKey,
    #[serde(rename = "Room")]
    pub room: PublicKey,
}

impl From<RouteRecord> for RouteId {
    fn from(r: RouteRecord) -> Self {
        RouteId::new(r.visor, r.server, r.room)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Origin")]
    pub origin: PublicKey,
    #[serde(rename = "Time")]
    pub time: DateTime<Utc>,
    #[serde(rename = "Root")]
    pub root: RouteRecord,
    #[serde(rename = "Dest")]
    pub dest: RouteRecord,
    #[serde(rename = "Msgtype")]
    pub msgtype: u8,
    #[serde(rename = "MsgSubtype", default)]
    pub msg_subtype: u8,
    #[serde(rename = "Message", default)]
    pub message: String,
    #[serde(rename = "Status")]
    pub status: u8,
    #[serde(rename = "Seen", default)]
    pub seen: bool,
}

impl TryFrom<MessageRecord> for Message {
    type Error = DecodeError;

    fn try_from(r: MessageRecord) -> Result<Self, Self::Error> {
        let kind = MessageKind::from_wire(r.msgtype)
            .ok_or_else(|| DecodeError(format!("unknown message type {}", r.msgtype)))?;

        // Subtype 0 means "none"; a nonzero value must be a known
        // lifecycle transition.
        let subtype = match r.msg_subtype {
            0 => None,
            b => Some(ConnectionSubtype::from_wire(b).ok_or_else(|| {
                DecodeError(format!("unknown connection subtype {b}"))
            })?),
        };

        let status = MessageStatus::from_wire(r.status)
            .ok_or_else(|| DecodeError(format!("unknown message status {}", r.status)))?;

        Ok(Message {
            id: r.id,
            origin: r.origin,
            timestamp: r.time,
            root: r.root.into(),
            dest: r.dest.into(),
            kind,
            subtype,
            body: r.message,
            status,
            seen: r.seen,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerRecord {
    #[serde(rename = "Info")]
    pub info: InfoRecord,
    #[serde(rename = "Alias", default)]
    pub alias: String,
}

impl From<PeerRecord> for Peer {
    fn from(r: PeerRecord) -> Self {
        Peer {
            info: r.info.into(),
            alias: r.alias,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomRecord {
    #[serde(rename = "PKRoute")]
    pub pk_route: RouteRecord,
    #[serde(rename = "Info")]
    pub info: InfoRecord,
    #[serde(rename = "Msgs", default)]
    pub msgs: Option<Vec<MessageRecord>>,
    #[serde(rename = "IsVisible", default)]
    pub is_visible: bool,
    #[serde(rename = "Type")]
    pub room_type: u8,
    #[serde(rename = "Members", default)]
    pub members: Option<BTreeMap<PublicKey, PeerRecord>>,
    #[serde(rename = "Mods", default)]
    pub mods: Option<BTreeMap<PublicKey, bool>>,
    #[serde(rename = "Muted", default)]
    pub muted: Option<BTreeMap<PublicKey, bool>>,
    #[serde(rename = "Blacklist", default)]
    pub blacklist: Option<BTreeMap<PublicKey, bool>>,
    #[serde(rename = "Whitelist", default)]
    pub whitelist: Option<BTreeMap<PublicKey, bool>>,
}

impl RoomRecord {
    /// Whether the record describes an actual room. The service encodes an
    /// absent direct conversation as a zero-valued record.
    pub fn is_populated(&self) -> bool {
        self.room_type != 0
    }
}

fn key_set(flags: Option<BTreeMap<PublicKey, bool>>) -> BTreeSet<PublicKey> {
    flags
        .unwrap_or_default()
        .into_iter()
        .filter(|(_, set)| *set)
        .map(|(pk, _)| pk)
        .collect()
}

impl TryFrom<RoomRecord> for Room {
    type Error = DecodeError;

    fn try_from(r: RoomRecord) -> Result<Self, Self::Error> {
        let kind = RoomKind::from_wire(r.room_type)
            .ok_or_else(|| DecodeError(format!("unknown room type {}", r.room_type)))?;

        let messages = r
            .msgs
            .unwrap_or_default()
            .into_iter()
            .map(Message::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let members = r
            .members
            .unwrap_or_default()
            .into_iter()
            .map(|(pk, peer)| (pk, peer.into()))
            .collect();

        Ok(Room {
            route: r.pk_route.into(),
            info: r.info.into(),
            messages,
            visible: r.is_visible,
            kind,
            members,
            moderators: key_set(r.mods),
            muted: key_set(r.muted),
            blacklist: key_set(r.blacklist),
            whitelist: key_set(r.whitelist),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerRecord {
    #[serde(rename = "PKRoute")]
    pub pk_route: RouteRecord,
    #[serde(rename = "Info")]
    pub info: InfoRecord,
    #[serde(rename = "Members", default)]
    pub members: Option<BTreeMap<PublicKey, PeerRecord>>,
    #[serde(rename = "Admins", default)]
    pub admins: Option<BTreeMap<PublicKey, bool>>,
    #[serde(rename = "Muted", default)]
    pub muted: Option<BTreeMap<PublicKey, bool>>,
    #[serde(rename = "Blacklist", default)]
    pub blacklist: Option<BTreeMap<PublicKey, bool>>,
    #[serde(rename = "Whitelist", default)]
    pub whitelist: Option<BTreeMap<PublicKey, bool>>,
    #[serde(rename = "Rooms", default)]
    pub rooms: Option<BTreeMap<PublicKey, RoomRecord>>,
}

impl TryFrom<ServerRecord> for Server {
    type Error = DecodeError;

    fn try_from(r: ServerRecord) -> Result<Self, Self::Error> {
        let rooms = r
            .rooms
            .unwrap_or_default()
            .into_values()
            .map(Room::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let members = r
            .members
            .unwrap_or_default()
            .into_iter()
            .map(|(pk, peer)| (pk, peer.into()))
            .collect();

        Ok(Server {
            route: r.pk_route.into(),
            info: r.info.into(),
            rooms,
            members,
            admins: key_set(r.admins),
            muted: key_set(r.muted),
            blacklist: key_set(r.blacklist),
            whitelist: key_set(r.whitelist),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisorRecord {
    #[serde(rename = "Pk")]
    pub pk: PublicKey,
    #[serde(rename = "P2P", default)]
    pub p2p: Option<RoomRecord>,
    #[serde(rename = "Server", default)]
    pub servers: Option<BTreeMap<PublicKey, ServerRecord>>,
}

impl TryFrom<VisorRecord> for Visor {
    type Error = DecodeError;

    fn try_from(r: VisorRecord) -> Result<Self, Self::Error> {
        // An unset direct conversation arrives as null or as a zero-valued
        // record; both mean "no P2P room here".
        let p2p = match r.p2p {
            Some(rec) if rec.is_populated() => Some(Room::try_from(rec)?),
            _ => None,
        };

        let servers = r
            .servers
            .unwrap_or_default()
            .into_values()
            .map(Server::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Visor {
            public_key: r.pk,
            p2p,
            servers,
        })
    }
}
