//! HTTP client for the chat service, and the transport seam the sync core
//! is written against.
//!
//! [`ChatTransport`] is the full surface the core needs: the bulk fetch,
//! the single-room fetch, and the outbound mutation calls. [`ApiClient`]
//! is the production implementation; tests swap in an in-memory mock.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use routechat_shared::{BulkLoadError, FetchError, Info, PublicKey, Room, RouteId, Visor};

use crate::records::{InfoRecord, RoomRecord, VisorRecord};

/// Everything the sync core asks of the network.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Bulk fetch: the full visor hierarchy for this session.
    async fn visors(&self) -> Result<Vec<Visor>, BulkLoadError>;

    /// Fetch the single conversation at the given route.
    async fn room_by_route(&self, route: &RouteId) -> Result<Room, FetchError>;

    /// Create a server (and its first room) on the local visor.
    async fn add_local_server(&self, alias: &str, desc: &str, img: &str)
        -> Result<(), FetchError>;

    /// Ask an existing server to add a room.
    async fn add_room(
        &self,
        visor: &PublicKey,
        server: &PublicKey,
        alias: &str,
        desc: &str,
    ) -> Result<(), FetchError>;

    /// Join a route hosted on a remote visor.
    async fn join_remote_route(&self, route: &RouteId) -> Result<(), FetchError>;

    /// Send a text message to the conversation at the route.
    async fn send_text_message(&self, route: &RouteId, body: &str) -> Result<(), FetchError>;

    /// Leave a remote conversation.
    async fn leave_remote_route(&self, route: &RouteId) -> Result<(), FetchError>;

    /// Delete a conversation hosted on the local visor.
    async fn delete_route(&self, route: &RouteId) -> Result<(), FetchError>;
}

/// Route triple as the mutation endpoints expect it.
#[derive(Debug, Serialize)]
struct RoutePayload<'a> {
    visorpk: &'a str,
    serverpk: &'a str,
    roompk: &'a str,
}

impl<'a> From<&'a RouteId> for RoutePayload<'a> {
    fn from(route: &'a RouteId) -> Self {
        Self {
            visorpk: route.visor.as_str(),
            serverpk: route.server.as_str(),
            roompk: route.room.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendTextPayload<'a> {
    visorpk: &'a str,
    serverpk: &'a str,
    roompk: &'a str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct AddLocalServerPayload<'a> {
    alias: &'a str,
    desc: &'a str,
    img: &'a str,
}

#[derive(Debug, Serialize)]
struct AddRoomPayload<'a> {
    visorpk: &'a str,
    serverpk: &'a str,
    alias: &'a str,
    desc: &'a str,
    img: Option<&'a str>,
    #[serde(rename = "type")]
    room_type: Option<u8>,
}

/// Reqwest-backed client for the chat service HTTP API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client for the service at `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The local user's profile, the source of the local visor key.
    pub async fn user_info(&self) -> Result<Info, FetchError> {
        let url = format!("{}/user/getInfo", self.base_url);
        let resp = self.http.get(&url).send().await.map_err(transport_err)?;
        let resp = check_status(resp).await?;
        let record: InfoRecord = resp
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(record.into())
    }

    /// The port the notification websocket listens on, e.g. `":8002"`.
    pub async fn websocket_port(&self) -> Result<String, FetchError> {
        let url = format!("{}/notifications/websocket", self.base_url);
        let resp = self.http.get(&url).send().await.map_err(transport_err)?;
        let resp = check_status(resp).await?;
        resp.text()
            .await
            .map(|t| t.trim().to_string())
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn post_json<P: Serialize + std::fmt::Debug>(
        &self,
        path: &str,
        payload: &P,
    ) -> Result<(), FetchError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, payload = ?payload, "POST");
        let resp = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(transport_err)?;
        check_status(resp).await?;
        Ok(())
    }
}

fn transport_err(e: reqwest::Error) -> FetchError {
    FetchError::Transport(e.to_string())
}

/// Turn a non-2xx response into a typed error carrying the body text the
/// service uses for diagnostics.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(FetchError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ChatTransport for ApiClient {
    async fn visors(&self) -> Result<Vec<Visor>, BulkLoadError> {
        let url = format!("{}/chats", self.base_url);
        debug!(url = %url, "Bulk fetch");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| BulkLoadError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BulkLoadError::Transport(format!(
                "service returned status {status}: {message}"
            )));
        }

        // The service answers null when no chats exist yet.
        let records: Option<Vec<VisorRecord>> = resp
            .json()
            .await
            .map_err(|e| BulkLoadError::Decode(e.to_string()))?;

        records
            .unwrap_or_default()
            .into_iter()
            .map(|r| Visor::try_from(r).map_err(BulkLoadError::from))
            .collect()
    }

    async fn room_by_route(&self, route: &RouteId) -> Result<Room, FetchError> {
        let url = format!("{}/chats/getRoom", self.base_url);
        debug!(route = %route, "Fetching room");

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("visor", route.visor.as_str()),
                ("server", route.server.as_str()),
                ("room", route.room.as_str()),
            ])
            .send()
            .await
            .map_err(transport_err)?;
        let resp = check_status(resp).await?;

        let record: RoomRecord = resp
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(Room::try_from(record)?)
    }

    async fn add_local_server(
        &self,
        alias: &str,
        desc: &str,
        img: &str,
    ) -> Result<(), FetchError> {
        self.post_json("chats/addLocalServer", &AddLocalServerPayload { alias, desc, img })
            .await
    }

    async fn add_room(
        &self,
        visor: &PublicKey,
        server: &PublicKey,
        alias: &str,
        desc: &str,
    ) -> Result<(), FetchError> {
        self.post_json(
            "chats/sendAddRoomMessage",
            &AddRoomPayload {
                visorpk: visor.as_str(),
                serverpk: server.as_str(),
                alias,
                desc,
                img: None,
                room_type: None,
            },
        )
        .await
    }

    async fn join_remote_route(&self, route: &RouteId) -> Result<(), FetchError> {
        self.post_json("chats/joinRemoteRoute", &RoutePayload::from(route))
            .await
    }

    async fn send_text_message(&self, route: &RouteId, body: &str) -> Result<(), FetchError> {
        self.post_json(
            "chats/sendTxtMsg",
            &SendTextPayload {
                visorpk: route.visor.as_str(),
                serverpk: route.server.as_str(),
                roompk: route.room.as_str(),
                message: body,
            },
        )
        .await
    }

    async fn leave_remote_route(&self, route: &RouteId) -> Result<(), FetchError> {
        self.post_json("chats/leaveRemoteRoute", &RoutePayload::from(route))
            .await
    }

    async fn delete_route(&self, route: &RouteId) -> Result<(), FetchError> {
        self.post_json("chats/deleteRoute", &RoutePayload::from(route))
            .await
    }
}
