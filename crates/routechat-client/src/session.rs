//! The session context: directory + selection + event stream.
//!
//! One [`ChatSession`] per connected client, owned by whoever drives the
//! event loop and passed by reference to the loader, the reconciler and
//! the user-facing operations. There is no ambient global state.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use routechat_net::ChatTransport;
use routechat_shared::{AddressError, FetchError, PublicKey, Room, RouteId};

use crate::directory::{ChatDirectory, Upsert};
use crate::events::{emit, SessionEvent};
use crate::selection::Selection;

/// Rejections raised by session operations before any network call.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("Route {0} is hosted on the local visor; nothing to join")]
    LocalRoute(RouteId),

    #[error("An alias is required")]
    MissingAlias,

    #[error("Local visor key is not configured")]
    NoLocalVisor,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Per-session client state.
#[derive(Debug)]
pub struct ChatSession {
    directory: ChatDirectory,
    selection: Selection,
    /// The local visor's key; enables the locally-hosted checks.
    local_visor: Option<PublicKey>,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            directory: ChatDirectory::new(),
            selection: Selection::None,
            local_visor: None,
            events: None,
        }
    }

    pub fn with_local_visor(mut self, pk: PublicKey) -> Self {
        self.local_visor = Some(pk);
        self
    }

    /// Subscribe a UI layer; returns the receiving end.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn directory(&self) -> &ChatDirectory {
        &self.directory
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn local_visor(&self) -> Option<&PublicKey> {
        self.local_visor.as_ref()
    }

    // -----------------------------------------------------------------
    // Directory mutation
    // -----------------------------------------------------------------

    /// Merge a fetched conversation into the directory.
    ///
    /// Emits `ChatAdded` or `ChatUpdated`; updates to the currently open
    /// conversation always emit, so the open view refreshes whenever its
    /// data changes.
    pub fn apply_room(&mut self, room: Room) -> Upsert {
        let room_key = room.id().clone();
        let outcome = self.directory.upsert(room);
        match outcome {
            Upsert::Added => emit(&self.events, SessionEvent::ChatAdded { room: room_key }),
            Upsert::Replaced => emit(&self.events, SessionEvent::ChatUpdated { room: room_key }),
        }
        outcome
    }

    /// Announce that the initial bulk load finished.
    pub(crate) fn notify_loaded(&self, count: usize) {
        emit(&self.events, SessionEvent::DirectoryLoaded { count });
    }

    /// Forget a conversation; clears the selection if it pointed there.
    pub fn remove_room(&mut self, room_key: &PublicKey) -> Option<Room> {
        let removed = self.directory.remove(room_key)?;
        if self.selection.is_chat(room_key) {
            self.set_selection(Selection::None);
        }
        emit(
            &self.events,
            SessionEvent::ChatRemoved {
                room: room_key.clone(),
            },
        );
        Some(removed)
    }

    // -----------------------------------------------------------------
    // Selection transitions
    // -----------------------------------------------------------------

    fn set_selection(&mut self, selection: Selection) {
        if self.selection == selection {
            return;
        }
        debug!(from = ?self.selection, to = ?selection, "Selection change");
        self.selection = selection.clone();
        emit(&self.events, SessionEvent::SelectionChanged { selection });
    }

    pub fn open_settings(&mut self) {
        self.set_selection(Selection::Settings);
    }

    pub fn open_add_local(&mut self) {
        self.set_selection(Selection::AddLocal);
    }

    pub fn open_join_remote(&mut self) {
        self.set_selection(Selection::JoinRemote);
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(Selection::None);
    }

    /// Focus a conversation already present in the directory.
    ///
    /// Returns `false` (and leaves the selection alone) when the room has
    /// not been resolved yet — a chat can only be entered once its data
    /// exists locally.
    pub fn select_room(&mut self, room_key: &PublicKey) -> bool {
        if !self.directory.contains(room_key) {
            warn!(room = %room_key.short(), "Refusing to select unresolved room");
            return false;
        }
        self.set_selection(Selection::Chat(room_key.clone()));
        true
    }

    /// Focus the conversation at `route`, fetching it first when it is
    /// not in the directory yet (fetch-then-select).
    pub async fn select_chat<T: ChatTransport>(
        &mut self,
        transport: &T,
        route: &RouteId,
    ) -> Result<(), FetchError> {
        if !self.directory.contains(&route.room) {
            let room = transport.room_by_route(route).await?;
            self.apply_room(room);
        }
        self.select_room(&route.room);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Outbound operations
    // -----------------------------------------------------------------

    /// Send a text message to the conversation at `route`. Empty bodies
    /// are dropped without a network call.
    pub async fn send_text<T: ChatTransport>(
        &self,
        transport: &T,
        route: &RouteId,
        body: &str,
    ) -> Result<(), FetchError> {
        if body.is_empty() {
            return Ok(());
        }
        transport.send_text_message(route, body).await
    }

    /// Join a conversation hosted on a remote visor.
    ///
    /// Key strings are validated here, before any network call; routes
    /// hosted on the local visor are rejected (there is nothing to join).
    pub async fn join_remote<T: ChatTransport>(
        &self,
        transport: &T,
        visor: &str,
        server: &str,
        room: &str,
    ) -> Result<(), SessionError> {
        let route = RouteId::new(
            PublicKey::parse(visor)?,
            PublicKey::parse(server)?,
            PublicKey::parse(room)?,
        );

        if let Some(local) = &self.local_visor {
            if route.is_locally_hosted(local) {
                return Err(SessionError::LocalRoute(route));
            }
        }

        info!(route = %route, "Joining remote route");
        transport.join_remote_route(&route).await?;
        Ok(())
    }

    /// Create a server with a first room on the local visor, or ask an
    /// existing server (by key) to add a room.
    pub async fn add_route<T: ChatTransport>(
        &self,
        transport: &T,
        server: Option<&str>,
        alias: &str,
        desc: &str,
    ) -> Result<(), SessionError> {
        // The service requires an alias; a missing description is
        // substituted rather than rejected.
        let alias = alias.trim();
        if alias.is_empty() {
            return Err(SessionError::MissingAlias);
        }
        let desc = if desc.trim().is_empty() { "-" } else { desc.trim() };

        match server {
            Some(server) => {
                let server = PublicKey::parse(server)?;
                let local = self.local_visor.clone().ok_or(SessionError::NoLocalVisor)?;
                info!(server = %server.short(), alias, "Adding room to server");
                transport.add_room(&local, &server, alias, desc).await?;
            }
            None => {
                info!(alias, "Adding local server");
                transport.add_local_server(alias, desc, "").await?;
            }
        }
        Ok(())
    }

    /// Leave the remote conversation at `route`. On success the room is
    /// dropped from the directory and an open view of it is closed.
    pub async fn leave_route<T: ChatTransport>(
        &mut self,
        transport: &T,
        route: &RouteId,
    ) -> Result<(), FetchError> {
        transport.leave_remote_route(route).await?;
        info!(route = %route, "Left route");
        self.remove_room(&route.room);
        Ok(())
    }

    /// Delete the conversation at `route` server-side, then locally.
    pub async fn delete_route<T: ChatTransport>(
        &mut self,
        transport: &T,
        route: &RouteId,
    ) -> Result<(), FetchError> {
        transport.delete_route(route).await?;
        info!(route = %route, "Deleted route");
        self.remove_room(&route.room);
        Ok(())
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{direct_room, group_room, key, pk, MockTransport};

    #[test]
    fn test_panels_are_mutually_exclusive() {
        let mut session = ChatSession::new();
        session.open_settings();
        assert_eq!(session.selection(), &Selection::Settings);

        session.open_add_local();
        assert_eq!(session.selection(), &Selection::AddLocal);

        session.open_join_remote();
        assert_eq!(session.selection(), &Selection::JoinRemote);

        session.clear_selection();
        assert_eq!(session.selection(), &Selection::None);
    }

    #[test]
    fn test_select_room_requires_resolved_room() {
        let mut session = ChatSession::new();
        assert!(!session.select_room(&pk('1')));
        assert_eq!(session.selection(), &Selection::None);

        session.apply_room(direct_room('1'));
        assert!(session.select_room(&pk('1')));
        assert_eq!(session.selection(), &Selection::Chat(pk('1')));
    }

    #[test]
    fn test_opening_panel_clears_open_chat() {
        let mut session = ChatSession::new();
        session.apply_room(direct_room('1'));
        session.select_room(&pk('1'));

        session.open_settings();
        assert!(session.selection().active_room().is_none());
    }

    #[tokio::test]
    async fn test_select_chat_fetches_unresolved_room() {
        let transport = MockTransport::new();
        let room = group_room('a', 'b', '2');
        let route = room.route.clone();
        transport.serve_room(room);

        let mut session = ChatSession::new();
        session.select_chat(&transport, &route).await.unwrap();

        assert_eq!(session.directory().len(), 1);
        assert_eq!(session.selection(), &Selection::Chat(pk('2')));
        assert_eq!(transport.fetch_count(), 1);

        // Second select finds the room locally; no further fetch.
        session.select_chat(&transport, &route).await.unwrap();
        assert_eq!(transport.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_join_remote_validates_keys_before_network() {
        let transport = MockTransport::new();
        let session = ChatSession::new();

        let err = session
            .join_remote(&transport, "tooshort", &key('b'), &key('c'))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Address(_)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_join_remote_rejects_locally_hosted_route() {
        let transport = MockTransport::new();
        let session = ChatSession::new().with_local_visor(pk('a'));

        let err = session
            .join_remote(&transport, &key('a'), &key('b'), &key('c'))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::LocalRoute(_)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_join_remote_normalizes_mixed_case_keys() {
        let transport = MockTransport::new();
        let session = ChatSession::new();

        session
            .join_remote(
                &transport,
                &key('a').to_uppercase(),
                &key('b'),
                &key('c'),
            )
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls, vec![format!("join:{}", key('a'))]);
    }

    #[tokio::test]
    async fn test_leave_route_removes_room_and_clears_selection() {
        let transport = MockTransport::new();
        let room = group_room('a', 'b', '2');
        let route = room.route.clone();

        let mut session = ChatSession::new();
        session.apply_room(room);
        session.select_room(&pk('2'));

        session.leave_route(&transport, &route).await.unwrap();
        assert!(session.directory().is_empty());
        assert_eq!(session.selection(), &Selection::None);
    }

    #[tokio::test]
    async fn test_send_text_skips_empty_body() {
        let transport = MockTransport::new();
        let session = ChatSession::new();
        let route = group_room('a', 'b', '2').route;

        session.send_text(&transport, &route, "").await.unwrap();
        assert!(transport.calls().is_empty());

        session.send_text(&transport, &route, "hi").await.unwrap();
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_add_route_requires_alias() {
        let transport = MockTransport::new();
        let session = ChatSession::new().with_local_visor(pk('a'));

        assert!(session
            .add_route(&transport, None, "  ", "desc")
            .await
            .is_err());
        assert!(transport.calls().is_empty());

        session
            .add_route(&transport, None, "lounge", "")
            .await
            .unwrap();
        assert_eq!(transport.calls(), vec!["add_local_server:lounge:-"]);
    }

    #[test]
    fn test_events_fire_on_mutations() {
        let mut session = ChatSession::new();
        let mut rx = session.subscribe();

        session.apply_room(direct_room('1'));
        session.apply_room(direct_room('1'));
        session.select_room(&pk('1'));
        session.remove_room(&pk('1'));

        let mut events = Vec::new();
        while let Ok(e) = rx.try_recv() {
            events.push(e);
        }
        assert_eq!(
            events,
            vec![
                SessionEvent::ChatAdded { room: pk('1') },
                SessionEvent::ChatUpdated { room: pk('1') },
                SessionEvent::SelectionChanged {
                    selection: Selection::Chat(pk('1'))
                },
                SessionEvent::SelectionChanged {
                    selection: Selection::None
                },
                SessionEvent::ChatRemoved { room: pk('1') },
            ]
        );
    }
}
