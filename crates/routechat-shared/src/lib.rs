// Domain types shared by the sync core and its network boundary.

pub mod error;
pub mod message;
pub mod room;
pub mod route;

pub use error::{AddressError, BulkLoadError, ChannelError, ChatError, FetchError};
pub use message::{ConnectionSubtype, Message, MessageKind, MessageStatus};
pub use room::{Info, Peer, Room, RoomKind, Server, Visor};
pub use route::{PublicKey, RouteId, PUBLIC_KEY_LEN};
