//! Per-tick state snapshot building

use crate::session::{PlayerId, SessionRegistry};
use crate::ws::protocol::{PlayerUpdate, ServerMsg};

/// Build the authoritative `game_update` for a roster
pub fn build_update(roster: &[PlayerId], registry: &SessionRegistry) -> ServerMsg {
    let players = roster
        .iter()
        .filter_map(|id| registry.get(id))
        .map(|p| PlayerUpdate {
            id: p.id,
            x: p.body.x,
            y: p.body.y,
            color: p.color.clone(),
            is_finished: p.finished,
            finish_time: p.finish_time.map(|t| t.as_millis() as u64),
        })
        .collect();

    ServerMsg::GameUpdate { players }
}
