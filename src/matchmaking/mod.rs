//! Matchmaking: queueing, race formation and the lobby task

pub mod lobby;
pub mod queue;
pub mod service;

pub use lobby::LobbySettings;
pub use service::{LobbyHandle, LobbyService};
