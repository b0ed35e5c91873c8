//! Client configuration loaded from environment variables.
//!
//! All settings have defaults pointing at a chat service on localhost, so
//! the client starts with zero configuration for local development.

use routechat_shared::PublicKey;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the chat service HTTP API.
    /// Env: `ROUTECHAT_API_URL`
    /// Default: `http://localhost:8001`
    pub api_url: String,

    /// Websocket URL for the push channel. When unset, the port is asked
    /// from the service and combined with the API host.
    /// Env: `ROUTECHAT_WS_URL`
    /// Default: unset
    pub ws_url: Option<String>,

    /// The local visor's public key. When unset, fetched from the
    /// service's user endpoint at startup.
    /// Env: `ROUTECHAT_LOCAL_PK`
    /// Default: unset
    pub local_visor: Option<PublicKey>,

    /// Whether the push channel reconnects after a drop.
    /// Env: `ROUTECHAT_RECONNECT` (true/false)
    /// Default: `true`
    pub reconnect: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8001".to_string(),
            ws_url: None,
            local_visor: None,
            reconnect: true,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("ROUTECHAT_API_URL") {
            config.api_url = url;
        }

        if let Ok(url) = std::env::var("ROUTECHAT_WS_URL") {
            if !url.is_empty() {
                config.ws_url = Some(url);
            }
        }

        if let Ok(raw) = std::env::var("ROUTECHAT_LOCAL_PK") {
            match PublicKey::parse(&raw) {
                Ok(pk) => config.local_visor = Some(pk),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Invalid ROUTECHAT_LOCAL_PK, will ask the service instead"
                    );
                }
            }
        }

        if let Ok(val) = std::env::var("ROUTECHAT_RECONNECT") {
            config.reconnect = val != "false" && val != "0";
        }

        config
    }

    /// Resolve the websocket URL from a port answer like `":8002"`.
    ///
    /// The push channel listens on the API host but its own port, which
    /// the service reports at runtime.
    pub fn ws_url_from_port(&self, port: &str) -> String {
        let host = self
            .api_url
            .trim_start_matches("http://")
            .trim_start_matches("https://");
        let host = host.split([':', '/']).next().unwrap_or("localhost");
        let port = port.trim().trim_start_matches(':');
        format!("ws://{host}:{port}/notifications")
    }
}
