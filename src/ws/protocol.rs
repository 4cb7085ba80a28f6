//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};

use crate::game::level::Level;
use crate::game::GameId;
use crate::session::PlayerId;

/// Movement intents a client can send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Left,
    Right,
    Jump,
    StopHorizontal,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Velocity/jump intent for the sender's player
    PlayerInput { input: InputKind },
}

impl ClientMsg {
    /// Decode a text frame
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Malformed)
    }
}

/// Inbound decode failures
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed client message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("binary frames are not supported")]
    Binary,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Identity assigned on connect
    #[serde(rename_all = "camelCase")]
    ConnectionSuccess { player_id: PlayerId },

    /// Queue status for players still waiting
    WaitingForPlayers { current: usize, required: usize },

    /// A race has been formed; carries the roster and the level geometry
    #[serde(rename_all = "camelCase")]
    GameStart {
        game_id: GameId,
        player_ids: Vec<PlayerId>,
        level_data: Level,
    },

    /// Authoritative state, sent every tick while the race runs
    GameUpdate { players: Vec<PlayerUpdate> },

    /// Final results
    GameEnd { rankings: Vec<RankingEntry> },
}

/// Player state in a game update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdate {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub color: String,
    pub is_finished: bool,
    /// Milliseconds since race start
    pub finish_time: Option<u64>,
}

/// One row of the results table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub rank: u32,
    pub player_id: PlayerId,
    /// Seconds since race start; `None` means did not finish
    pub time: Option<f64>,
}
