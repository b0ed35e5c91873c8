//! Which single UI surface is active.
//!
//! Settings, the two add/join panels, and any open chat are mutually
//! exclusive by construction: the whole surface state is one enum value.

use routechat_shared::PublicKey;

/// The active surface. Initial state is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Settings,
    AddLocal,
    JoinRemote,
    Chat(PublicKey),
}

impl Selection {
    /// The open conversation's room key, when a chat is selected.
    pub fn active_room(&self) -> Option<&PublicKey> {
        match self {
            Selection::Chat(room) => Some(room),
            _ => None,
        }
    }

    pub fn is_chat(&self, room_key: &PublicKey) -> bool {
        self.active_room() == Some(room_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::pk;

    #[test]
    fn test_initial_state_is_none() {
        assert_eq!(Selection::default(), Selection::None);
        assert!(Selection::default().active_room().is_none());
    }

    #[test]
    fn test_active_room_only_for_chat() {
        assert!(Selection::Settings.active_room().is_none());
        assert!(Selection::AddLocal.active_room().is_none());
        assert!(Selection::JoinRemote.active_room().is_none());

        let selection = Selection::Chat(pk('1'));
        assert_eq!(selection.active_room(), Some(&pk('1')));
        assert!(selection.is_chat(&pk('1')));
        assert!(!selection.is_chat(&pk('2')));
    }
}
