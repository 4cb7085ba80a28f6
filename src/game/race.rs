//! Race state and authoritative tick

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::session::{PlayerId, SessionRegistry};
use crate::ws::broadcast::send_to_all;
use crate::ws::protocol::{RankingEntry, ServerMsg};

use super::level::Level;
use super::physics::PhysicsSystem;
use super::results::compute_rankings;
use super::snapshot::build_update;
use super::GameId;

/// A roster smaller than this ends the race at the next tick
pub const MIN_VIABLE_ROSTER: usize = 2;

/// Horizontal spawn for every racer
pub const START_X: f32 = 50.0;
/// Vertical spawn of the first racer; each later one starts higher by `START_STAGGER`
pub const START_Y: f32 = 400.0;
pub const START_STAGGER: f32 = 50.0;

/// Race phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RacePhase {
    /// Formed, not yet announced
    Starting,
    /// Ticking
    Running,
    /// Results sent; the race is discarded
    Ending,
}

/// Whether the scheduler should keep ticking a race
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Ended,
}

/// One race over a fixed roster
#[derive(Debug)]
pub struct Race {
    id: GameId,
    roster: Vec<PlayerId>,
    phase: RacePhase,
    started_at: Option<Instant>,
    end_requested: bool,
    time_limit: Option<Duration>,
    tick: u64,
}

impl Race {
    pub fn new(id: GameId, roster: Vec<PlayerId>, time_limit: Option<Duration>) -> Self {
        Self {
            id,
            roster,
            phase: RacePhase::Starting,
            started_at: None,
            end_requested: false,
            time_limit,
            tick: 0,
        }
    }

    pub fn roster(&self) -> &[PlayerId] {
        &self.roster
    }

    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    pub fn end_requested(&self) -> bool {
        self.end_requested
    }

    /// Put the roster on the start line and announce the race
    pub fn start(&mut self, registry: &mut SessionRegistry, level: &Level, now: Instant) {
        if self.phase != RacePhase::Starting {
            return;
        }

        for (i, id) in self.roster.iter().enumerate() {
            if let Some(player) = registry.get_mut(id) {
                player.body.reset_to(START_X, START_Y - i as f32 * START_STAGGER);
                player.finished = false;
                player.finish_time = None;
            }
        }

        self.started_at = Some(now);
        self.phase = RacePhase::Running;

        let msg = ServerMsg::GameStart {
            game_id: self.id,
            player_ids: self.roster.clone(),
            level_data: level.clone(),
        };
        send_to_all(registry, &self.roster, &msg);

        info!(game_id = %self.id, players = self.roster.len(), "Race started");
    }

    /// Drop a player from the roster. Returns true if it was a member.
    ///
    /// Never ends the race directly: a roster below the viable size is flagged and the
    /// next tick ends it after its physics has run.
    pub fn remove_player(&mut self, player_id: &PlayerId) -> bool {
        let before = self.roster.len();
        self.roster.retain(|id| id != player_id);
        let removed = self.roster.len() != before;

        if removed && self.roster.len() < MIN_VIABLE_ROSTER {
            self.end_requested = true;
            debug!(game_id = %self.id, "Roster below minimum, race will end");
        }
        removed
    }

    /// Run a single simulation tick
    pub fn tick(&mut self, registry: &mut SessionRegistry, level: &Level, now: Instant) -> TickOutcome {
        let started_at = match (self.phase, self.started_at) {
            (RacePhase::Running, Some(started_at)) => started_at,
            (RacePhase::Starting, _) => return TickOutcome::Continue,
            _ => return TickOutcome::Ended,
        };
        self.tick += 1;
        let elapsed = now.saturating_duration_since(started_at);

        for id in &self.roster {
            let Some(player) = registry.get_mut(id) else {
                continue;
            };
            if player.finished {
                continue;
            }

            let step = PhysicsSystem::step(&mut player.body, level);
            if step.reached_finish {
                player.finished = true;
                player.finish_time = Some(elapsed);
                info!(
                    game_id = %self.id,
                    player_id = %id,
                    time_ms = elapsed.as_millis() as u64,
                    "Player finished"
                );
            }
        }

        let all_finished = self
            .roster
            .iter()
            .all(|id| registry.get(id).map_or(true, |p| p.finished));
        let timed_out = self.time_limit.is_some_and(|limit| elapsed >= limit);

        if self.end_requested || all_finished || timed_out {
            self.end(registry);
            return TickOutcome::Ended;
        }

        send_to_all(registry, &self.roster, &build_update(&self.roster, registry));
        TickOutcome::Continue
    }

    /// Final standings for the current roster
    pub fn rankings(&self, registry: &SessionRegistry) -> Vec<RankingEntry> {
        let entries: Vec<(PlayerId, Option<Duration>)> = self
            .roster
            .iter()
            .filter_map(|id| registry.get(id))
            .map(|p| (p.id, p.finish_time))
            .collect();
        compute_rankings(&entries)
    }

    fn end(&mut self, registry: &SessionRegistry) {
        self.phase = RacePhase::Ending;

        let rankings = self.rankings(registry);
        info!(
            game_id = %self.id,
            ticks = self.tick,
            finishers = rankings.iter().filter(|r| r.time.is_some()).count(),
            "Race ended"
        );

        send_to_all(registry, &self.roster, &ServerMsg::GameEnd { rankings });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::level::Rect;
    use crate::session::PlayerTx;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tokio::sync::mpsc;

    const TICK: Duration = Duration::from_micros(16_667);

    struct Harness {
        registry: SessionRegistry,
        receivers: Vec<mpsc::UnboundedReceiver<ServerMsg>>,
        ids: Vec<PlayerId>,
    }

    impl Harness {
        fn new(n: usize) -> Self {
            let mut registry = SessionRegistry::new();
            let mut rng = ChaCha8Rng::seed_from_u64(9);
            let mut receivers = Vec::new();
            let mut ids = Vec::new();
            for _ in 0..n {
                let (tx, rx): (PlayerTx, _) = mpsc::unbounded_channel();
                ids.push(registry.create(tx, &mut rng));
                receivers.push(rx);
            }
            Self {
                registry,
                receivers,
                ids,
            }
        }

        fn drain(&mut self, idx: usize) -> Vec<ServerMsg> {
            let mut out = Vec::new();
            while let Ok(msg) = self.receivers[idx].try_recv() {
                out.push(msg);
            }
            out
        }
    }

    /// Flat floor, finish region 100px to the right of the start line
    fn short_course() -> Level {
        Level {
            platforms: vec![Rect::new(0.0, 500.0, 2000.0, 50.0)],
            hazards: vec![],
            finish_line: Rect::new(150.0, 0.0, 50.0, 500.0),
        }
    }

    #[test]
    fn test_start_positions_and_announcement() {
        let mut h = Harness::new(3);
        let level = Level::default();
        let mut race = Race::new(GameId(1), h.ids.clone(), None);

        if let Some(p) = h.registry.get_mut(&h.ids[0]) {
            p.finished = true;
            p.body.vx = 5.0;
        }
        race.start(&mut h.registry, &level, Instant::now());

        assert_eq!(race.phase(), RacePhase::Running);
        for (i, id) in h.ids.iter().enumerate() {
            let p = h.registry.get(id).unwrap();
            assert_eq!(p.body.x, START_X);
            assert_eq!(p.body.y, START_Y - 50.0 * i as f32);
            assert_eq!((p.body.vx, p.body.vy), (0.0, 0.0));
            assert!(!p.finished);
        }

        for i in 0..3 {
            let msgs = h.drain(i);
            assert_eq!(msgs.len(), 1);
            match &msgs[0] {
                ServerMsg::GameStart {
                    game_id,
                    player_ids,
                    level_data,
                } => {
                    assert_eq!(*game_id, GameId(1));
                    assert_eq!(player_ids, &h.ids);
                    assert_eq!(level_data, &level);
                }
                other => panic!("unexpected message: {:?}", other),
            }
        }
    }

    #[test]
    fn test_tick_broadcasts_update_while_running() {
        let mut h = Harness::new(2);
        let level = Level::default();
        let start = Instant::now();
        let mut race = Race::new(GameId(2), h.ids.clone(), None);
        race.start(&mut h.registry, &level, start);
        h.drain(0);

        let outcome = race.tick(&mut h.registry, &level, start + TICK);

        assert_eq!(outcome, TickOutcome::Continue);
        match h.drain(0).as_slice() {
            [ServerMsg::GameUpdate { players }] => {
                assert_eq!(players.len(), 2);
                assert_eq!(players[0].id, h.ids[0]);
                assert!(!players[0].is_finished);
                assert!(players[0].finish_time.is_none());
            }
            other => panic!("unexpected messages: {:?}", other),
        }
    }

    #[test]
    fn test_race_ends_when_everyone_finishes() {
        let mut h = Harness::new(2);
        let level = short_course();
        let start = Instant::now();
        let mut race = Race::new(GameId(3), h.ids.clone(), None);
        race.start(&mut h.registry, &level, start);

        // First player runs, second waits
        h.registry.get_mut(&h.ids[0]).unwrap().body.vx = 5.0;

        let mut now = start;
        let mut first_done_at = None;
        for _ in 0..200 {
            now += TICK;
            if race.tick(&mut h.registry, &level, now) == TickOutcome::Ended {
                break;
            }
            if first_done_at.is_none() && h.registry.get(&h.ids[0]).unwrap().finished {
                first_done_at = Some(now);
                h.registry.get_mut(&h.ids[1]).unwrap().body.vx = 5.0;
            }
        }

        assert_eq!(race.phase(), RacePhase::Ending);
        let rankings = race.rankings(&h.registry);
        assert_eq!(rankings.len(), 2);
        assert_eq!(rankings[0].player_id, h.ids[0]);
        assert_eq!(rankings[1].player_id, h.ids[1]);
        assert!(rankings[0].time.unwrap() <= rankings[1].time.unwrap());

        let last = h.drain(1).pop().unwrap();
        assert!(matches!(last, ServerMsg::GameEnd { ref rankings } if rankings.len() == 2));
    }

    #[test]
    fn test_finished_players_stop_moving() {
        let mut h = Harness::new(2);
        let level = short_course();
        let start = Instant::now();
        let mut race = Race::new(GameId(4), h.ids.clone(), None);
        race.start(&mut h.registry, &level, start);

        let runner = h.registry.get_mut(&h.ids[0]).unwrap();
        runner.body.vx = 5.0;

        let mut now = start;
        while !h.registry.get(&h.ids[0]).unwrap().finished {
            now += TICK;
            race.tick(&mut h.registry, &level, now);
        }
        let frozen = h.registry.get(&h.ids[0]).unwrap().body;
        let finish_time = h.registry.get(&h.ids[0]).unwrap().finish_time;

        for _ in 0..10 {
            now += TICK;
            race.tick(&mut h.registry, &level, now);
        }

        let runner = h.registry.get(&h.ids[0]).unwrap();
        assert_eq!(runner.body, frozen);
        assert_eq!(runner.finish_time, finish_time);
    }

    #[test]
    fn test_roster_only_shrinks_and_flags_end() {
        let mut h = Harness::new(3);
        let level = Level::default();
        let start = Instant::now();
        let mut race = Race::new(GameId(5), h.ids.clone(), None);
        race.start(&mut h.registry, &level, start);

        assert!(race.remove_player(&h.ids[2]));
        assert_eq!(race.roster().len(), 2);
        assert!(!race.end_requested());

        assert!(!race.remove_player(&PlayerId::new()));
        assert_eq!(race.roster().len(), 2);

        assert!(race.remove_player(&h.ids[1]));
        assert_eq!(race.roster(), &h.ids[..1]);
        assert!(race.end_requested());

        // Still running until the next tick
        assert_eq!(race.phase(), RacePhase::Running);
        let before = h.registry.get(&h.ids[0]).unwrap().body;
        assert_eq!(race.tick(&mut h.registry, &level, start + TICK), TickOutcome::Ended);
        // Physics for the tick still ran
        assert_ne!(h.registry.get(&h.ids[0]).unwrap().body, before);
    }

    #[test]
    fn test_time_limit_ends_race_with_dnfs() {
        let mut h = Harness::new(2);
        let level = Level::default();
        let start = Instant::now();
        let mut race = Race::new(GameId(6), h.ids.clone(), Some(Duration::from_secs(1)));
        race.start(&mut h.registry, &level, start);

        assert_eq!(
            race.tick(&mut h.registry, &level, start + Duration::from_millis(500)),
            TickOutcome::Continue
        );
        assert_eq!(
            race.tick(&mut h.registry, &level, start + Duration::from_secs(1)),
            TickOutcome::Ended
        );

        let rankings = race.rankings(&h.registry);
        assert_eq!(rankings.len(), 2);
        assert!(rankings.iter().all(|r| r.time.is_none()));
    }

    #[test]
    fn test_tick_before_start_is_noop() {
        let mut h = Harness::new(2);
        let level = Level::default();
        let mut race = Race::new(GameId(7), h.ids.clone(), None);

        assert_eq!(race.tick(&mut h.registry, &level, Instant::now()), TickOutcome::Continue);
        assert!(h.drain(0).is_empty());
    }
}
