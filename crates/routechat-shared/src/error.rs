use thiserror::Error;

use crate::route::PUBLIC_KEY_LEN;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    #[error("Bulk load error: {0}")]
    BulkLoad(#[from] BulkLoadError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// A public key supplied at an input boundary was malformed.
///
/// Raised before any network call is made; the operation that would have
/// used the key is aborted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Public key must be {PUBLIC_KEY_LEN} characters, got {0}")]
    InvalidLength(usize),

    #[error("Public key includes non-hex characters")]
    InvalidCharacters,
}

/// The initial full fetch failed. Fatal to session start: the whole load
/// is abandoned and the directory is left untouched.
#[derive(Error, Debug)]
pub enum BulkLoadError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Malformed visor collection: {0}")]
    Decode(String),
}

/// A single-address refresh failed. Non-fatal: the triggering notification
/// is dropped and the directory keeps its previous state for that room.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Service returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed room record: {0}")]
    Decode(String),
}

/// The push channel failed. Incremental updates stop until the channel
/// task re-establishes the connection.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Websocket protocol error: {0}")]
    Protocol(String),

    #[error("Malformed notification frame: {0}")]
    Decode(String),

    #[error("Channel closed by remote")]
    Closed,
}
