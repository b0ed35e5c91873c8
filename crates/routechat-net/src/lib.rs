// Network boundary: wire records, HTTP client, and the push channel.

pub mod api;
pub mod channel;
pub mod notifications;
pub mod records;

pub use api::{ApiClient, ChatTransport};
pub use channel::{spawn_channel, ChannelConfig, ChannelState};
pub use notifications::{decode_frame, Notification, NotificationKind};
pub use records::{
    DecodeError, InfoRecord, MessageRecord, PeerRecord, RoomRecord, RouteRecord, ServerRecord,
    VisorRecord,
};
