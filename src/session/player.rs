//! Connected player entity

use std::fmt;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::game::physics::{Body, JUMP_VELOCITY, RUN_SPEED};
use crate::ws::protocol::{InputKind, ServerMsg};

/// Where a freshly connected player is placed
pub const CONNECT_SPAWN: (f32, f32) = (100.0, 100.0);

/// Outbound half of a player's connection
pub type PlayerTx = mpsc::UnboundedSender<ServerMsg>;

/// Opaque player identity, generated per connection and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Player state (authoritative)
#[derive(Debug)]
pub struct Player {
    pub id: PlayerId,
    pub body: Body,
    pub finished: bool,
    /// Time from race start to crossing the finish
    pub finish_time: Option<Duration>,
    pub color: String,
    tx: PlayerTx,
}

impl Player {
    pub fn new(id: PlayerId, color: String, tx: PlayerTx) -> Self {
        let (x, y) = CONNECT_SPAWN;
        Self {
            id,
            body: Body::at(x, y),
            finished: false,
            finish_time: None,
            color,
            tx,
        }
    }

    /// Apply a movement intent to velocity / jump state
    pub fn apply_input(&mut self, input: InputKind) {
        match input {
            InputKind::Left => self.body.vx = -RUN_SPEED,
            InputKind::Right => self.body.vx = RUN_SPEED,
            InputKind::Jump => {
                if !self.body.jumping {
                    self.body.vy = JUMP_VELOCITY;
                    self.body.jumping = true;
                }
            }
            InputKind::StopHorizontal => self.body.vx = 0.0,
        }
    }

    /// Fire-and-forget send; a closed connection is ignored
    pub fn send(&self, msg: ServerMsg) {
        let _ = self.tx.send(msg);
    }
}

/// Random cosmetic color, `rgb(r,g,b)` with every channel in 50..=204
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    let r = rng.gen_range(50..205);
    let g = rng.gen_range(50..205);
    let b = rng.gen_range(50..205);
    format!("rgb({},{},{})", r, g, b)
}
