//! Race simulation modules

pub mod level;
pub mod physics;
pub mod race;
pub mod results;
pub mod snapshot;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use level::Level;
pub use race::{Race, TickOutcome};

/// Race identity, increasing for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
