//! Lobby service - the single task that owns all session and race state

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::game::{GameId, Level, TickOutcome};
use crate::session::{PlayerId, PlayerTx};
use crate::ws::protocol::InputKind;

use super::lobby::{Lobby, LobbySettings, LobbyStats};

/// Work items for the lobby task
#[derive(Debug)]
pub enum Command {
    Connect {
        tx: PlayerTx,
        reply: oneshot::Sender<PlayerId>,
    },
    Input {
        player_id: PlayerId,
        input: InputKind,
    },
    Disconnect {
        player_id: PlayerId,
    },
    Tick {
        game_id: GameId,
        reply: oneshot::Sender<TickOutcome>,
    },
    Stats {
        reply: oneshot::Sender<LobbyStats>,
    },
}

/// Cloneable entry point used by connection handlers
#[derive(Clone)]
pub struct LobbyHandle {
    cmd_tx: mpsc::Sender<Command>,
}

impl LobbyHandle {
    /// Register a connection. `None` if the lobby task is gone.
    pub async fn connect(&self, tx: PlayerTx) -> Option<PlayerId> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx.send(Command::Connect { tx, reply }).await.ok()?;
        rx.await.ok()
    }

    pub async fn input(&self, player_id: PlayerId, input: InputKind) {
        let _ = self.cmd_tx.send(Command::Input { player_id, input }).await;
    }

    pub async fn disconnect(&self, player_id: PlayerId) {
        let _ = self.cmd_tx.send(Command::Disconnect { player_id }).await;
    }

    pub async fn stats(&self) -> Option<LobbyStats> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx.send(Command::Stats { reply }).await.ok()?;
        rx.await.ok()
    }
}

/// Spawns one ticker per race. A ticker stops rescheduling once its race reports
/// `Ended`; in-flight ticks are never aborted.
#[derive(Clone)]
pub struct TickScheduler {
    cmd_tx: mpsc::Sender<Command>,
    period: Duration,
}

impl TickScheduler {
    pub fn new(cmd_tx: mpsc::Sender<Command>, period: Duration) -> Self {
        Self { cmd_tx, period }
    }

    pub fn schedule(&self, game_id: GameId) {
        let cmd_tx = self.cmd_tx.clone();
        let period = self.period;

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately; the race was just announced
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let (reply, rx) = oneshot::channel();
                if cmd_tx.send(Command::Tick { game_id, reply }).await.is_err() {
                    break;
                }
                match rx.await {
                    Ok(TickOutcome::Continue) => {}
                    Ok(TickOutcome::Ended) | Err(_) => break,
                }
            }

            debug!(game_id = %game_id, "Ticker stopped");
        });
    }
}

/// Lobby service
pub struct LobbyService {
    lobby: Lobby,
    cmd_rx: mpsc::Receiver<Command>,
    scheduler: TickScheduler,
}

impl LobbyService {
    /// Start the lobby task and return its handle
    pub fn spawn(settings: LobbySettings, level: Arc<Level>, tick_period: Duration) -> LobbyHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(1024);
        let service = Self {
            lobby: Lobby::new(settings, level),
            cmd_rx,
            scheduler: TickScheduler::new(cmd_tx.clone(), tick_period),
        };

        tokio::spawn(service.run());
        LobbyHandle { cmd_tx }
    }

    /// Process commands one at a time, in arrival order
    pub async fn run(mut self) {
        info!("Lobby service running");

        while let Some(cmd) = self.cmd_rx.recv().await {
            self.handle(cmd);

            for game_id in self.lobby.take_started() {
                self.scheduler.schedule(game_id);
            }
        }

        info!("Lobby service stopped");
    }

    fn handle(&mut self, cmd: Command) {
        let now = Instant::now();
        match cmd {
            Command::Connect { tx, reply } => {
                let player_id = self.lobby.register(tx, now);
                if reply.send(player_id).is_err() {
                    // Connection handler went away before learning its id
                    warn!(player_id = %player_id, "Connect reply dropped");
                    self.lobby.deregister(&player_id, now);
                }
            }
            Command::Input { player_id, input } => {
                self.lobby.apply_input(&player_id, input);
            }
            Command::Disconnect { player_id } => {
                self.lobby.deregister(&player_id, now);
            }
            Command::Tick { game_id, reply } => {
                let _ = reply.send(self.lobby.tick(game_id, now));
            }
            Command::Stats { reply } => {
                let _ = reply.send(self.lobby.stats());
            }
        }
    }
}
