//! Session lifecycle, queueing and race bookkeeping
//!
//! `Lobby` is the single owner of the player registry, the matchmaking queue and
//! every running race. It is driven by one task (see `service`), so each operation
//! runs to completion before the next one starts.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::game::{GameId, Level, Race, TickOutcome};
use crate::session::{PlayerId, PlayerTx, SessionRegistry};
use crate::ws::broadcast::{send_to, send_to_all};
use crate::ws::protocol::{InputKind, ServerMsg};

use super::queue::MatchmakingQueue;

/// Lobby tuning
#[derive(Debug, Clone)]
pub struct LobbySettings {
    pub quorum: usize,
    pub race_time_limit: Option<Duration>,
}

impl Default for LobbySettings {
    fn default() -> Self {
        Self {
            quorum: 5,
            race_time_limit: None,
        }
    }
}

/// Point-in-time counters for health reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LobbyStats {
    pub connected_players: usize,
    pub queue_size: usize,
    pub active_games: usize,
}

pub struct Lobby {
    registry: SessionRegistry,
    queue: MatchmakingQueue,
    races: BTreeMap<GameId, Race>,
    level: Arc<Level>,
    settings: LobbySettings,
    next_game_id: u64,
    rng: ChaCha8Rng,
    /// Races created since the last `take_started`
    started: Vec<GameId>,
}

impl Lobby {
    pub fn new(settings: LobbySettings, level: Arc<Level>) -> Self {
        Self::with_rng(settings, level, ChaCha8Rng::from_entropy())
    }

    pub fn with_rng(settings: LobbySettings, level: Arc<Level>, rng: ChaCha8Rng) -> Self {
        Self {
            registry: SessionRegistry::new(),
            queue: MatchmakingQueue::new(settings.quorum),
            races: BTreeMap::new(),
            level,
            settings,
            next_game_id: 1,
            rng,
            started: Vec::new(),
        }
    }

    /// Create a player for a new connection and queue it
    pub fn register(&mut self, tx: PlayerTx, now: Instant) -> PlayerId {
        let player_id = self.registry.create(tx, &mut self.rng);
        info!(player_id = %player_id, "Player connected");

        send_to(&self.registry, &player_id, ServerMsg::ConnectionSuccess { player_id });

        self.queue.enqueue(player_id, now);
        self.evaluate_queue(now);
        player_id
    }

    /// Apply a movement intent; a no-op for players that are gone
    pub fn apply_input(&mut self, player_id: &PlayerId, input: InputKind) {
        match self.registry.get_mut(player_id) {
            Some(player) => player.apply_input(input),
            None => debug!(player_id = %player_id, "Input for unknown player ignored"),
        }
    }

    /// Tear down a player: queue, every roster, then the entity itself
    pub fn deregister(&mut self, player_id: &PlayerId, now: Instant) {
        if self.registry.remove(player_id).is_none() {
            return;
        }

        self.queue.dequeue(player_id);
        for race in self.races.values_mut() {
            race.remove_player(player_id);
        }

        info!(player_id = %player_id, "Player disconnected");
        self.evaluate_queue(now);
    }

    /// Advance one race by a tick. Unknown races report `Ended`.
    pub fn tick(&mut self, game_id: GameId, now: Instant) -> TickOutcome {
        let Some(race) = self.races.get_mut(&game_id) else {
            return TickOutcome::Ended;
        };

        let outcome = race.tick(&mut self.registry, &self.level, now);
        if outcome == TickOutcome::Ended {
            if let Some(race) = self.races.remove(&game_id) {
                self.return_to_queue(race.roster(), now);
            }
        }
        outcome
    }

    /// Races formed since the last call, for the scheduler to pick up
    pub fn take_started(&mut self) -> Vec<GameId> {
        std::mem::take(&mut self.started)
    }

    pub fn stats(&self) -> LobbyStats {
        LobbyStats {
            connected_players: self.registry.len(),
            queue_size: self.queue.len(),
            active_games: self.races.len(),
        }
    }

    pub fn race(&self, game_id: &GameId) -> Option<&Race> {
        self.races.get(game_id)
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn queue(&self) -> &MatchmakingQueue {
        &self.queue
    }

    fn return_to_queue(&mut self, roster: &[PlayerId], now: Instant) {
        for player_id in roster {
            if self.registry.contains(player_id) {
                self.queue.enqueue(*player_id, now);
            }
        }
        self.evaluate_queue(now);
    }

    /// Start every race the queue can fill, then tell the rest where they stand
    fn evaluate_queue(&mut self, now: Instant) {
        while let Some(batch) = self.queue.try_form_race() {
            let longest_wait = batch
                .iter()
                .map(|p| p.wait_time(now))
                .max()
                .unwrap_or_default();
            let roster: Vec<PlayerId> = batch.into_iter().map(|p| p.player_id).collect();
            self.start_race(roster, now, longest_wait);
        }

        let status = ServerMsg::WaitingForPlayers {
            current: self.queue.len(),
            required: self.queue.quorum(),
        };
        send_to_all(&self.registry, self.queue.player_ids(), &status);
    }

    fn start_race(&mut self, roster: Vec<PlayerId>, now: Instant, longest_wait: Duration) {
        let game_id = GameId(self.next_game_id);
        self.next_game_id += 1;

        info!(
            game_id = %game_id,
            players = roster.len(),
            longest_wait_ms = longest_wait.as_millis() as u64,
            "Creating race"
        );

        let mut race = Race::new(game_id, roster, self.settings.race_time_limit);
        race.start(&mut self.registry, &self.level, now);
        self.races.insert(game_id, race);
        self.started.push(game_id);
    }
}
