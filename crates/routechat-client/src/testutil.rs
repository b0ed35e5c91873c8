//! Shared fixtures for the client tests: key/room builders and an
//! in-memory transport with scriptable failures.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use routechat_net::ChatTransport;
use routechat_shared::{
    BulkLoadError, FetchError, Info, Message, MessageKind, MessageStatus, PublicKey, Room,
    RoomKind, RouteId, Server, Visor, PUBLIC_KEY_LEN,
};

pub(crate) fn key(fill: char) -> String {
    std::iter::repeat(fill).take(PUBLIC_KEY_LEN).collect()
}

pub(crate) fn pk(fill: char) -> PublicKey {
    PublicKey::parse(&key(fill)).unwrap()
}

fn info(public_key: PublicKey, alias: &str) -> Info {
    Info {
        public_key,
        alias: alias.to_string(),
        description: String::new(),
        avatar: String::new(),
    }
}

fn room(route: RouteId) -> Room {
    Room {
        info: info(route.room.clone(), "room"),
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

/// A direct (P2P) conversation: one key fills the whole route.
pub(crate) fn direct_room(fill: char) -> Room {
    room(RouteId::p2p(pk(fill)))
}

/// A group conversation at `visor/server/room`.
pub(crate) fn group_room(visor: char, server: char, room_key: char) -> Room {
    room(RouteId::new(pk(visor), pk(server), pk(room_key)))
}

/// Append text messages (body doubles as id) to a room.
pub(crate) fn room_with_messages(mut room: Room, bodies: &[&str]) -> Room {
    for body in bodies {
        room.messages.push(Message {
            id: body.to_string(),
            origin: room.route.visor.clone(),
            timestamp: Utc::now(),
            root: RouteId::p2p(room.route.visor.clone()),
            dest: room.route.clone(),
            kind: MessageKind::Text,
            subtype: None,
            body: body.to_string(),
            status: MessageStatus::Received,
            seen: false,
        });
    }
    room
}

pub(crate) fn server_with_rooms(visor: char, server: char, rooms: Vec<Room>) -> Server {
    Server {
        route: RouteId::new(pk(visor), pk(server), pk(server)),
        info: info(pk(server), "server"),
        rooms,
        members: BTreeMap::new(),
        admins: BTreeSet::new(),
        muted: BTreeSet::new(),
        blacklist: BTreeSet::new(),
        whitelist: BTreeSet::new(),
    }
}

pub(crate) fn visor(fill: char, p2p: Option<Room>, servers: Vec<Server>) -> Visor {
    Visor {
        public_key: pk(fill),
        p2p,
        servers,
    }
}

/// In-memory [`ChatTransport`]: serves scripted rooms/visors, records
/// mutation calls, and fails on demand.
#[derive(Default)]
pub(crate) struct MockTransport {
    rooms: Mutex<HashMap<PublicKey, Room>>,
    visors: Mutex<Vec<Visor>>,
    fail_bulk: AtomicBool,
    fail_fetch: AtomicBool,
    fetches: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn serve_room(&self, room: Room) {
        self.rooms.lock().unwrap().insert(room.id().clone(), room);
    }

    pub(crate) fn serve_visor(&self, visor: Visor) {
        self.visors.lock().unwrap().push(visor);
    }

    pub(crate) fn fail_bulk(&self) {
        self.fail_bulk.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_fetches(&self) {
        self.fail_fetch.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn visors(&self) -> Result<Vec<Visor>, BulkLoadError> {
        if self.fail_bulk.load(Ordering::SeqCst) {
            return Err(BulkLoadError::Transport("mock is offline".into()));
        }
        Ok(self.visors.lock().unwrap().clone())
    }

    async fn room_by_route(&self, route: &RouteId) -> Result<Room, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(FetchError::Transport("mock is offline".into()));
        }
        self.rooms
            .lock()
            .unwrap()
            .get(&route.room)
            .cloned()
            .ok_or(FetchError::Status {
                status: 404,
                message: "room not found".into(),
            })
    }

    async fn add_local_server(
        &self,
        alias: &str,
        desc: &str,
        _img: &str,
    ) -> Result<(), FetchError> {
        self.record(format!("add_local_server:{alias}:{desc}"));
        Ok(())
    }

    async fn add_room(
        &self,
        _visor: &PublicKey,
        server: &PublicKey,
        alias: &str,
        _desc: &str,
    ) -> Result<(), FetchError> {
        self.record(format!("add_room:{server}:{alias}"));
        Ok(())
    }

    async fn join_remote_route(&self, route: &RouteId) -> Result<(), FetchError> {
        self.record(format!("join:{}", route.visor));
        Ok(())
    }

    async fn send_text_message(&self, route: &RouteId, body: &str) -> Result<(), FetchError> {
        self.record(format!("send:{}:{body}", route.room));
        Ok(())
    }

    async fn leave_remote_route(&self, route: &RouteId) -> Result<(), FetchError> {
        self.record(format!("leave:{}", route.room));
        Ok(())
    }

    async fn delete_route(&self, route: &RouteId) -> Result<(), FetchError> {
        self.record(format!("delete:{}", route.room));
        Ok(())
    }
}
