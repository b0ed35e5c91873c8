//! Push-notification envelope decoding.
//!
//! Each websocket frame carries `{type: int, message: string}` where
//! `message` is itself a JSON document naming the affected route. A
//! notification never carries conversation data — only the address to
//! re-fetch.

use serde::Deserialize;

use routechat_shared::{ChannelError, PublicKey, RouteId};

/// What changed at the notified route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NotificationKind {
    /// A new server/room route became available; the client auto-selects it.
    RouteAdded = 1,
    /// A peer-initiated conversation appeared; no selection change.
    ChatDiscovered = 2,
    /// The conversation received at least one new message.
    MessageArrived = 3,
}

impl NotificationKind {
    pub fn from_wire(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::RouteAdded),
            2 => Some(Self::ChatDiscovered),
            3 => Some(Self::MessageArrived),
            _ => None,
        }
    }
}

/// A decoded push event: a change kind plus the address it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub route: RouteId,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: u8,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RoutePayload {
    visorpk: String,
    serverpk: String,
    roompk: String,
}

/// Decode one inbound text frame into a [`Notification`].
pub fn decode_frame(frame: &str) -> Result<Notification, ChannelError> {
    let envelope: Envelope =
        serde_json::from_str(frame).map_err(|e| ChannelError::Decode(e.to_string()))?;

    let kind = NotificationKind::from_wire(envelope.kind).ok_or_else(|| {
        ChannelError::Decode(format!("unknown notification type {}", envelope.kind))
    })?;

    // The payload is JSON-encoded a second time inside the envelope.
    let payload: RoutePayload = serde_json::from_str(&envelope.message)
        .map_err(|e| ChannelError::Decode(e.to_string()))?;

    let visor = PublicKey::parse(&payload.visorpk)
        .map_err(|e| ChannelError::Decode(format!("visorpk: {e}")))?;
    let server = PublicKey::parse(&payload.serverpk)
        .map_err(|e| ChannelError::Decode(format!("serverpk: {e}")))?;
    let room = PublicKey::parse(&payload.roompk)
        .map_err(|e| ChannelError::Decode(format!("roompk: {e}")))?;

    Ok(Notification {
        kind,
        route: RouteId::new(visor, server, room),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(fill: char) -> String {
        std::iter::repeat(fill).take(66).collect()
    }

    fn frame(kind: u8, visor: &str, server: &str, room: &str) -> String {
        let payload = format!(
            r#"{{"visorpk":"{visor}","serverpk":"{server}","roompk":"{room}"}}"#
        );
        serde_json::json!({"type": kind, "message": payload}).to_string()
    }

    #[test]
    fn test_decode_all_kinds() {
        let v = key('a');
        let s = key('b');
        let r = key('c');

        for (wire, kind) in [
            (1, NotificationKind::RouteAdded),
            (2, NotificationKind::ChatDiscovered),
            (3, NotificationKind::MessageArrived),
        ] {
            let n = decode_frame(&frame(wire, &v, &s, &r)).unwrap();
            assert_eq!(n.kind, kind);
            assert_eq!(n.route.visor.as_str(), v);
            assert_eq!(n.route.server.as_str(), s);
            assert_eq!(n.route.room.as_str(), r);
        }
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let err = decode_frame(&frame(9, &key('a'), &key('a'), &key('a'))).unwrap_err();
        assert!(matches!(err, ChannelError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_bad_key() {
        let err = decode_frame(&frame(1, "short", &key('a'), &key('a'))).unwrap_err();
        assert!(matches!(err, ChannelError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(decode_frame("not json").is_err());
        // Envelope whose inner message is not a JSON document.
        let bad = serde_json::json!({"type": 1, "message": "plain text"}).to_string();
        assert!(decode_frame(&bad).is_err());
    }
}
