//! The push channel: one long-lived websocket per session.
//!
//! The channel runs in a dedicated tokio task. Decoded notifications are
//! pushed onto an mpsc channel consumed by the reconciliation loop, so
//! event handling stays strictly one-at-a-time regardless of how fast
//! frames arrive. Channel state transitions are published on a `watch`
//! channel for observers.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use crate::notifications::{decode_frame, Notification};

/// Lifecycle of the push connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
    Errored,
}

/// Push-channel configuration.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Websocket URL, e.g. `ws://localhost:8002/notifications`.
    pub url: String,
    /// Whether to re-establish the connection after a drop.
    pub reconnect: bool,
    /// First reconnect delay; doubles per failed attempt.
    pub initial_backoff: Duration,
    /// Upper bound for the reconnect delay.
    pub max_backoff: Duration,
}

impl ChannelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect: true,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }

    /// One connection attempt, no recovery. Used by one-shot runs.
    pub fn without_reconnect(mut self) -> Self {
        self.reconnect = false;
        self
    }
}

/// Buffer for decoded notifications awaiting the reconciler.
const NOTIFICATION_BUFFER: usize = 64;

/// Spawn the push-channel task.
///
/// Returns the notification receiver, a watch on the channel state, and
/// the task handle. The task ends when the receiver is dropped, or after
/// the first disconnect when `reconnect` is off.
pub fn spawn_channel(
    config: ChannelConfig,
) -> (
    mpsc::Receiver<Notification>,
    watch::Receiver<ChannelState>,
    JoinHandle<()>,
) {
    let (notif_tx, notif_rx) = mpsc::channel(NOTIFICATION_BUFFER);
    let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);

    let handle = tokio::spawn(run_channel(config, notif_tx, state_tx));

    (notif_rx, state_rx, handle)
}

async fn run_channel(
    config: ChannelConfig,
    notif_tx: mpsc::Sender<Notification>,
    state_tx: watch::Sender<ChannelState>,
) {
    let mut backoff = config.initial_backoff;

    loop {
        let _ = state_tx.send(ChannelState::Connecting);

        match connect_async(config.url.as_str()).await {
            Ok((ws, _)) => {
                info!(url = %config.url, "Push channel open");
                let _ = state_tx.send(ChannelState::Open);
                backoff = config.initial_backoff;

                let end_state = read_frames(ws, &notif_tx).await;
                let _ = state_tx.send(end_state);

                if notif_tx.is_closed() {
                    // Receiver gone, nobody left to reconcile for.
                    return;
                }
            }
            Err(e) => {
                warn!(url = %config.url, error = %e, "Push channel connect failed");
                let _ = state_tx.send(ChannelState::Errored);
            }
        }

        if !config.reconnect {
            info!("Push channel finished (reconnect disabled)");
            return;
        }

        debug!(delay_ms = backoff.as_millis() as u64, "Reconnecting push channel");
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(config.max_backoff);
    }
}

/// Read frames until the connection ends; returns the terminal state.
async fn read_frames<S>(mut ws: S, notif_tx: &mpsc::Sender<Notification>) -> ChannelState
where
    S: StreamExt<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>>
        + SinkExt<WsMessage>
        + Unpin,
{
    while let Some(frame) = ws.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => match decode_frame(&text) {
                Ok(notification) => {
                    debug!(kind = ?notification.kind, route = %notification.route, "Notification");
                    if notif_tx.send(notification).await.is_err() {
                        return ChannelState::Closed;
                    }
                }
                // Malformed frames are dropped; they never tear the
                // channel down.
                Err(e) => warn!(error = %e, "Dropping undecodable notification frame"),
            },
            Ok(WsMessage::Ping(payload)) => {
                if ws.send(WsMessage::Pong(payload)).await.is_err() {
                    return ChannelState::Errored;
                }
            }
            Ok(WsMessage::Close(_)) => {
                info!("Push channel closed by remote");
                return ChannelState::Closed;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Push channel error");
                return ChannelState::Errored;
            }
        }
    }
    ChannelState::Closed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ChannelConfig::new("ws://localhost:8002/notifications");
        assert!(config.reconnect);
        assert_eq!(config.initial_backoff, Duration::from_secs(1));
        assert_eq!(config.max_backoff, Duration::from_secs(30));

        let once = config.without_reconnect();
        assert!(!once.reconnect);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = ChannelConfig::new("ws://x");
        let mut backoff = config.initial_backoff;
        let mut seen = Vec::new();
        for _ in 0..7 {
            seen.push(backoff);
            backoff = (backoff * 2).min(config.max_backoff);
        }
        assert_eq!(seen[0], Duration::from_secs(1));
        assert_eq!(seen[1], Duration::from_secs(2));
        assert_eq!(seen[5], Duration::from_secs(30));
        assert_eq!(seen[6], Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_connect_failure_without_reconnect_ends_task() {
        // Nothing listens on this port; the task must give up after one
        // attempt and report an error state.
        let config = ChannelConfig::new("ws://127.0.0.1:1/notifications").without_reconnect();
        let (mut rx, state_rx, handle) = spawn_channel(config);

        handle.await.unwrap();
        assert_eq!(*state_rx.borrow(), ChannelState::Errored);
        assert!(rx.recv().await.is_none());
    }
}
