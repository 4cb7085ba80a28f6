//! Connected players and their transport handles

pub mod player;
pub mod registry;

pub use player::{PlayerId, PlayerTx};
pub use registry::SessionRegistry;
