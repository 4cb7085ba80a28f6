//! Matchmaking queue implementation

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::session::PlayerId;

/// Player waiting for a race
#[derive(Debug, Clone, Copy)]
pub struct QueuedPlayer {
    pub player_id: PlayerId,
    pub queued_at: Instant,
}

impl QueuedPlayer {
    /// How long this player had waited at `now`
    pub fn wait_time(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.queued_at)
    }
}

/// FIFO pool of players not assigned to a race
pub struct MatchmakingQueue {
    queue: VecDeque<QueuedPlayer>,
    /// Players taken per race
    quorum: usize,
}

impl MatchmakingQueue {
    pub fn new(quorum: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            quorum,
        }
    }

    /// Append a player to the tail
    pub fn enqueue(&mut self, player_id: PlayerId, now: Instant) {
        // Remove if already queued (keeps a single entry per player)
        self.queue.retain(|p| p.player_id != player_id);
        self.queue.push_back(QueuedPlayer {
            player_id,
            queued_at: now,
        });
    }

    /// Remove a player wherever it sits in the queue
    pub fn dequeue(&mut self, player_id: &PlayerId) -> Option<QueuedPlayer> {
        let pos = self.queue.iter().position(|p| &p.player_id == player_id)?;
        self.queue.remove(pos)
    }

    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.queue.iter().any(|p| &p.player_id == player_id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Queued player ids, earliest arrival first
    pub fn player_ids(&self) -> impl Iterator<Item = &PlayerId> + '_ {
        self.queue.iter().map(|p| &p.player_id)
    }

    /// Take exactly `quorum` players from the head once enough are waiting
    pub fn try_form_race(&mut self) -> Option<Vec<QueuedPlayer>> {
        if self.queue.len() < self.quorum {
            return None;
        }
        Some(self.queue.drain(..self.quorum).collect())
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }
}
