//! The notification reconciler.
//!
//! A single loop over the push-channel receiver. Every notification is
//! treated as "this one conversation may have changed": the reconciler
//! fetches exactly that address — never a full reload — and merges the
//! authoritative snapshot into the directory. Because the fetch returns
//! the complete current state, replaying a notification is harmless.
//!
//! The loop awaits each fetch before dequeuing the next notification, so
//! two fetches for the same address are never in flight at once.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use routechat_net::{ChatTransport, Notification, NotificationKind};
use routechat_shared::FetchError;

use crate::session::ChatSession;

/// Applies push notifications to a session.
pub struct Reconciler<T> {
    transport: T,
}

impl<T: ChatTransport> Reconciler<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Consume notifications until the channel ends.
    ///
    /// A failed fetch drops that one notification and nothing else: the
    /// directory keeps its previous state for the room, no retry is
    /// scheduled, and the loop keeps serving later events. The room
    /// self-corrects on its next notification.
    pub async fn run(&self, rx: &mut mpsc::Receiver<Notification>, session: &mut ChatSession) {
        while let Some(notification) = rx.recv().await {
            if let Err(e) = self.handle(session, &notification).await {
                warn!(
                    kind = ?notification.kind,
                    route = %notification.route,
                    error = %e,
                    "Dropping notification; conversation stays stale until the next event"
                );
            }
        }
        info!("Notification channel ended; reconciler stopping");
    }

    /// Resolve one notification: one targeted fetch, one merge.
    pub async fn handle(
        &self,
        session: &mut ChatSession,
        notification: &Notification,
    ) -> Result<(), FetchError> {
        let room = self.transport.room_by_route(&notification.route).await?;
        let room_key = room.id().clone();

        let outcome = session.apply_room(room);
        debug!(kind = ?notification.kind, room = %room_key.short(), ?outcome, "Reconciled");

        // A route the user just created or joined gets focused; a
        // peer-initiated conversation or message refresh does not steal
        // the selection.
        if notification.kind == NotificationKind::RouteAdded {
            session.select_room(&room_key);
        }
        Ok(())
    }
}
