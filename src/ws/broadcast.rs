//! Fan-out of server messages to players

use crate::session::{PlayerId, SessionRegistry};

use super::protocol::ServerMsg;

/// Deliver to one player. Unknown players and closed connections are ignored.
pub fn send_to(registry: &SessionRegistry, player_id: &PlayerId, msg: ServerMsg) {
    if let Some(player) = registry.get(player_id) {
        player.send(msg);
    }
}

/// Deliver the same message to every listed player, in order
pub fn send_to_all<'a, I>(registry: &SessionRegistry, player_ids: I, msg: &ServerMsg)
where
    I: IntoIterator<Item = &'a PlayerId>,
{
    for player_id in player_ids {
        send_to(registry, player_id, msg.clone());
    }
}
