//! Final race ranking

use std::time::Duration;

use crate::session::PlayerId;
use crate::ws::protocol::RankingEntry;

/// Rank a roster by finish time.
///
/// `entries` is in roster order. Finishers come first, ascending by time, with equal
/// times kept in roster order. Players without a time follow in roster order and
/// continue the rank sequence, so ranks always run 1..=N.
pub fn compute_rankings(entries: &[(PlayerId, Option<Duration>)]) -> Vec<RankingEntry> {
    let mut finished: Vec<(PlayerId, Duration)> = entries
        .iter()
        .filter_map(|(id, time)| time.map(|t| (*id, t)))
        .collect();
    // Stable sort keeps roster order for ties
    finished.sort_by_key(|(_, time)| *time);

    let unfinished = entries
        .iter()
        .filter(|(_, time)| time.is_none())
        .map(|(id, _)| (*id, None));

    finished
        .into_iter()
        .map(|(id, time)| (id, Some(time)))
        .chain(unfinished)
        .enumerate()
        .map(|(i, (player_id, time))| RankingEntry {
            rank: (i + 1) as u32,
            player_id,
            time: time.map(|t| t.as_millis() as f64 / 1000.0),
        })
        .collect()
}
