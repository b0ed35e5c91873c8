//! # routechat
//!
//! Headless client for a route-addressed chat service.
//!
//! Startup sequence:
//! 1. load configuration from the environment
//! 2. bulk-fetch the full visor hierarchy into the chat directory
//! 3. open the push channel and reconcile notifications one at a time
//!
//! The process runs until interrupted or, with reconnection disabled,
//! until the push channel drops.

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use routechat_client::{ChatSession, ClientConfig, Reconciler};
use routechat_net::{spawn_channel, ApiClient, ChannelConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,routechat_client=debug,routechat_net=debug")),
        )
        .init();

    info!("Starting routechat client v{}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_env();
    info!(api_url = %config.api_url, "Loaded configuration");

    let api = ApiClient::new(config.api_url.clone());

    // The local visor key enables the locally-hosted checks; take it from
    // the environment or ask the service.
    let local_visor = match config.local_visor.clone() {
        Some(pk) => pk,
        None => {
            let user = api.user_info().await?;
            info!(pk = %user.public_key.short(), alias = %user.alias, "Fetched local user info");
            user.public_key
        }
    };

    let mut session = ChatSession::new().with_local_visor(local_visor);

    // Initial bulk load. Fatal on failure: better no directory than half
    // of one.
    let count = routechat_client::loader::populate(&api, &mut session).await?;
    info!(count, "Directory populated");

    let ws_url = match config.ws_url.clone() {
        Some(url) => url,
        None => {
            let port = api.websocket_port().await?;
            config.ws_url_from_port(&port)
        }
    };

    let mut channel_config = ChannelConfig::new(ws_url);
    channel_config.reconnect = config.reconnect;

    let (mut notifications, mut channel_state, channel_task) = spawn_channel(channel_config);

    // Surface channel state transitions in the log.
    tokio::spawn(async move {
        while channel_state.changed().await.is_ok() {
            info!(state = ?*channel_state.borrow(), "Push channel state");
        }
    });

    let reconciler = Reconciler::new(api);

    tokio::select! {
        _ = reconciler.run(&mut notifications, &mut session) => {
            warn!("Reconciler finished; no further updates will arrive");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted; shutting down");
        }
    }

    channel_task.abort();
    Ok(())
}
