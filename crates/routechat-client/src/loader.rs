//! Initial bulk load.
//!
//! Fetches the full visor hierarchy once at session start and flattens it
//! into the directory: per visor, the direct conversation first, then
//! every room of every hosted server. No sorting is applied — display
//! order is source-collection order.

use tracing::{info, warn};

use routechat_net::ChatTransport;
use routechat_shared::{BulkLoadError, Room, Visor};

use crate::session::ChatSession;

/// Flatten the fetched hierarchy into the directory's initial content.
pub fn flatten(visors: Vec<Visor>) -> Vec<Room> {
    let mut rooms = Vec::new();
    for visor in visors {
        if let Some(p2p) = visor.p2p {
            rooms.push(p2p);
        }
        for server in visor.servers {
            rooms.extend(server.rooms);
        }
    }
    rooms
}

/// Fetch and flatten the full conversation list.
pub async fn load<T: ChatTransport>(transport: &T) -> Result<Vec<Room>, BulkLoadError> {
    let visors = transport.visors().await?;
    Ok(flatten(visors))
}

/// Populate the session directory from a full fetch.
///
/// All-or-nothing: on any failure the directory is left exactly as it
/// was — a half-populated directory is worse than an empty one, and the
/// caller may retry the load wholesale.
pub async fn populate<T: ChatTransport>(
    transport: &T,
    session: &mut ChatSession,
) -> Result<usize, BulkLoadError> {
    let rooms = match load(transport).await {
        Ok(rooms) => rooms,
        Err(e) => {
            warn!(error = %e, "Bulk load failed; directory untouched");
            return Err(e);
        }
    };

    let count = rooms.len();
    for room in rooms {
        session.apply_room(room);
    }
    session.notify_loaded(count);

    info!(count, "Bulk load complete");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{direct_room, group_room, pk, server_with_rooms, visor, MockTransport};

    #[test]
    fn test_flatten_orders_p2p_before_server_rooms() {
        // Visor V: direct chat R0 (room == V) plus server S with R1, R2.
        let visors = vec![visor(
            'a',
            Some(direct_room('a')),
            vec![server_with_rooms(
                'a',
                'b',
                vec![group_room('a', 'b', '1'), group_room('a', 'b', '2')],
            )],
        )];

        let rooms = flatten(visors);
        let keys: Vec<_> = rooms.iter().map(|r| r.id().clone()).collect();
        assert_eq!(keys, vec![pk('a'), pk('1'), pk('2')]);
    }

    #[test]
    fn test_flatten_skips_missing_p2p() {
        let visors = vec![
            visor('a', None, vec![server_with_rooms('a', 'b', vec![group_room('a', 'b', '1')])]),
            visor('c', Some(direct_room('c')), vec![]),
        ];

        let rooms = flatten(visors);
        let keys: Vec<_> = rooms.iter().map(|r| r.id().clone()).collect();
        assert_eq!(keys, vec![pk('1'), pk('c')]);
    }

    #[tokio::test]
    async fn test_populate_fills_directory() {
        let transport = MockTransport::new();
        transport.serve_visor(visor(
            'a',
            Some(direct_room('a')),
            vec![server_with_rooms(
                'a',
                'b',
                vec![group_room('a', 'b', '1'), group_room('a', 'b', '2')],
            )],
        ));

        let mut session = ChatSession::new();
        let count = populate(&transport, &mut session).await.unwrap();

        assert_eq!(count, 3);
        assert_eq!(session.directory().len(), 3);
        assert_eq!(session.directory().position(&pk('a')), Some(0));
        assert_eq!(session.directory().position(&pk('1')), Some(1));
        assert_eq!(session.directory().position(&pk('2')), Some(2));
    }

    #[tokio::test]
    async fn test_populate_leaves_directory_untouched_on_failure() {
        let transport = MockTransport::new();
        transport.fail_bulk();

        let mut session = ChatSession::new();
        session.apply_room(direct_room('9'));

        assert!(populate(&transport, &mut session).await.is_err());
        // Preexisting content survives; nothing was partially applied.
        assert_eq!(session.directory().len(), 1);
        assert!(session.directory().contains(&pk('9')));
    }
}
