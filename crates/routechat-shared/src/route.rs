//! Conversation addressing.
//!
//! Every conversation surface is identified by a [`RouteId`]: the triple
//! of visor, server and room public keys. The room key is the stable
//! identity — two routes with the same room key name the same
//! conversation, whichever path it was fetched through.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AddressError;

/// Length of a hex-encoded public key string.
pub const PUBLIC_KEY_LEN: usize = 66;

/// A hex-encoded public key, validated and normalized to lowercase.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PublicKey(String);

impl PublicKey {
    /// Parse a candidate key string.
    ///
    /// Trims surrounding whitespace, requires exactly [`PUBLIC_KEY_LEN`]
    /// hex characters, and lowercases the result so that all comparisons
    /// and transmissions use one canonical form.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let s = s.trim();
        if s.len() != PUBLIC_KEY_LEN {
            return Err(AddressError::InvalidLength(s.len()));
        }
        if hex::decode(s).is_err() {
            return Err(AddressError::InvalidCharacters);
        }
        Ok(Self(s.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log output.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PublicKey {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// The `(visor, server, room)` triple addressing one conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RouteId {
    pub visor: PublicKey,
    pub server: PublicKey,
    pub room: PublicKey,
}

impl RouteId {
    pub fn new(visor: PublicKey, server: PublicKey, room: PublicKey) -> Self {
        Self { visor, server, room }
    }

    /// Address of a direct (peer-to-peer) conversation: one key fills all
    /// three slots.
    pub fn p2p(pk: PublicKey) -> Self {
        Self {
            visor: pk.clone(),
            server: pk.clone(),
            room: pk,
        }
    }

    /// Whether this route names a direct conversation.
    pub fn is_direct(&self) -> bool {
        self.visor == self.server && self.server == self.room
    }

    /// Whether the route is hosted on the given local visor.
    pub fn is_locally_hosted(&self, local: &PublicKey) -> bool {
        self.visor == *local
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.visor, self.server, self.room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(fill: char) -> String {
        std::iter::repeat(fill).take(PUBLIC_KEY_LEN).collect()
    }

    #[test]
    fn test_parse_valid_key() {
        let s = key('a');
        let pk = PublicKey::parse(&s).unwrap();
        assert_eq!(pk.as_str(), s);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let s: String = std::iter::repeat('a').take(65).collect();
        assert_eq!(
            PublicKey::parse(&s),
            Err(AddressError::InvalidLength(65))
        );
        assert_eq!(PublicKey::parse(""), Err(AddressError::InvalidLength(0)));
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        let s = format!("g{}", &key('a')[1..]);
        assert_eq!(
            PublicKey::parse(&s),
            Err(AddressError::InvalidCharacters)
        );
    }

    #[test]
    fn test_parse_normalizes_case() {
        let upper = key('A');
        let pk = PublicKey::parse(&upper).unwrap();
        assert_eq!(pk.as_str(), key('a'));
        assert_eq!(pk, PublicKey::parse(&key('a')).unwrap());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let s = format!("  {}\n", key('b'));
        assert_eq!(PublicKey::parse(&s).unwrap().as_str(), key('b'));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: PublicKey = serde_json::from_str(&format!("\"{}\"", key('c'))).unwrap();
        assert_eq!(ok.as_str(), key('c'));
        assert!(serde_json::from_str::<PublicKey>("\"tooshort\"").is_err());
    }

    #[test]
    fn test_is_direct() {
        let v = PublicKey::parse(&key('1')).unwrap();
        let s = PublicKey::parse(&key('2')).unwrap();
        let r = PublicKey::parse(&key('3')).unwrap();

        assert!(RouteId::p2p(v.clone()).is_direct());
        assert!(!RouteId::new(v, s, r).is_direct());
    }

    #[test]
    fn test_is_locally_hosted() {
        let local = PublicKey::parse(&key('1')).unwrap();
        let remote = PublicKey::parse(&key('2')).unwrap();
        let room = PublicKey::parse(&key('3')).unwrap();

        let route = RouteId::new(local.clone(), remote.clone(), room);
        assert!(route.is_locally_hosted(&local));
        assert!(!route.is_locally_hosted(&remote));
    }
}
