//! Typed message events.
//!
//! A conversation's history is an ordered sequence of [`Message`]s. Order
//! is arrival order — the model never re-sorts by timestamp — and the most
//! recently appended message doubles as the conversation preview.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::route::{PublicKey, RouteId};

/// Message category, as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageKind {
    /// Conversation-lifecycle transition, carries a [`ConnectionSubtype`].
    Connection = 1,
    /// Ordinary text sent between peers or within a room.
    Text = 2,
    /// Info exchange (alias/description/avatar updates).
    Info = 3,
    /// Server control command (mute, hire moderator, add room, ...).
    Command = 4,
}

impl MessageKind {
    pub fn from_wire(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Connection),
            2 => Some(Self::Text),
            3 => Some(Self::Info),
            4 => Some(Self::Command),
            _ => None,
        }
    }

    pub fn as_wire(self) -> u8 {
        self as u8
    }
}

/// Lifecycle transition carried by a `Connection` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ConnectionSubtype {
    Request = 1,
    Accept = 2,
    Reject = 3,
    Leave = 4,
    Delete = 5,
}

impl ConnectionSubtype {
    pub fn from_wire(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Request),
            2 => Some(Self::Accept),
            3 => Some(Self::Reject),
            4 => Some(Self::Leave),
            5 => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_wire(self) -> u8 {
        self as u8
    }
}

/// Whether a message left this client or arrived at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageStatus {
    Sent = 1,
    Received = 2,
}

impl MessageStatus {
    pub fn from_wire(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Sent),
            2 => Some(Self::Received),
            _ => None,
        }
    }

    pub fn as_wire(self) -> u8 {
        self as u8
    }
}

/// One event in a conversation's history.
///
/// Created from server responses by the bulk loader or the reconciler;
/// never mutated client-side except for the `seen` flag; destroyed only
/// when the owning conversation is removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Server-assigned identifier.
    pub id: String,
    /// Public key of the originator.
    pub origin: PublicKey,
    /// UTC timestamp assigned at origin.
    pub timestamp: DateTime<Utc>,
    /// Route the message was received from.
    pub root: RouteId,
    /// Route the message was addressed to.
    pub dest: RouteId,
    pub kind: MessageKind,
    /// Present for `Connection` messages, `None` otherwise.
    pub subtype: Option<ConnectionSubtype>,
    /// Message text. Opaque to the sync core.
    pub body: String,
    pub status: MessageStatus,
    /// Whether the local user has read the message.
    pub seen: bool,
}

impl Message {
    pub fn is_connection(&self) -> bool {
        self.kind == MessageKind::Connection
    }

    /// Mark the message as read. The only client-side mutation.
    pub fn mark_seen(&mut self) {
        self.seen = true;
    }
}
