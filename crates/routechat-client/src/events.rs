//! Session events a UI layer can subscribe to.

use tokio::sync::mpsc;

use routechat_shared::PublicKey;

use crate::selection::Selection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The bulk load finished and the directory holds `count` chats.
    DirectoryLoaded { count: usize },
    /// A conversation joined the end of the directory.
    ChatAdded { room: PublicKey },
    /// An existing conversation was refreshed in place. Fires for the
    /// currently open conversation too, so its message view re-renders.
    ChatUpdated { room: PublicKey },
    /// A conversation was removed (left or deleted).
    ChatRemoved { room: PublicKey },
    /// The active surface changed.
    SelectionChanged { selection: Selection },
}

/// Deliver an event to the subscriber, if any. Failure to deliver is
/// logged, never propagated: the sync core outlives any one UI.
pub(crate) fn emit(tx: &Option<mpsc::UnboundedSender<SessionEvent>>, event: SessionEvent) {
    if let Some(tx) = tx {
        if tx.send(event).is_err() {
            tracing::debug!("Session event subscriber is gone");
        }
    }
}
