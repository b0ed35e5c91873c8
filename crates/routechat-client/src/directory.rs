//! The in-memory chat directory.
//!
//! An ordered list of conversations keyed by room identity. Insertion
//! order is display order: newly discovered conversations append at the
//! end, refreshes replace in place so the visible list never reorders.

use tracing::debug;

use routechat_shared::{PublicKey, Room, RouteId};

/// Preview text for a conversation with no messages yet.
pub const EMPTY_CONVERSATION_PREVIEW: &str = "New Chat";

/// What an [`ChatDirectory::upsert`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// The room was new and was appended at the end.
    Added,
    /// An entry with the same room key existed and was replaced in place.
    Replaced,
}

/// Ordered collection of conversations, unique per room key.
#[derive(Debug, Clone, Default)]
pub struct ChatDirectory {
    rooms: Vec<Room>,
}

impl ChatDirectory {
    pub fn new() -> Self {
        Self { rooms: Vec::new() }
    }

    /// Insert or refresh a conversation.
    ///
    /// A new room key appends at the end; an existing one is replaced at
    /// its current index. Either way the directory never holds two
    /// entries with the same room key.
    pub fn upsert(&mut self, room: Room) -> Upsert {
        match self.position(room.id()) {
            Some(index) => {
                debug!(room = %room.id().short(), index, "Replacing conversation");
                self.rooms[index] = room;
                Upsert::Replaced
            }
            None => {
                debug!(room = %room.id().short(), "Appending conversation");
                self.rooms.push(room);
                Upsert::Added
            }
        }
    }

    /// Remove the conversation with the given room key.
    pub fn remove(&mut self, room_key: &PublicKey) -> Option<Room> {
        let index = self.position(room_key)?;
        debug!(room = %room_key.short(), index, "Removing conversation");
        Some(self.rooms.remove(index))
    }

    pub fn find(&self, room_key: &PublicKey) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id() == room_key)
    }

    pub fn find_by_route(&self, route: &RouteId) -> Option<&Room> {
        self.find(&route.room)
    }

    pub fn contains(&self, room_key: &PublicKey) -> bool {
        self.find(room_key).is_some()
    }

    /// Index of the conversation in display order.
    pub fn position(&self, room_key: &PublicKey) -> Option<usize> {
        self.rooms.iter().position(|r| r.id() == room_key)
    }

    /// Body of the last message at the route, or the empty-conversation
    /// marker.
    pub fn last_message_preview(&self, route: &RouteId) -> String {
        self.find_by_route(route)
            .and_then(Room::last_message)
            .map(|m| m.body.clone())
            .unwrap_or_else(|| EMPTY_CONVERSATION_PREVIEW.to_string())
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
