//! Registry of connected players

use std::collections::HashMap;

use rand::Rng;

use super::player::{random_color, Player, PlayerId, PlayerTx};

/// Every connected player, keyed by id. Owns the player entities.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    players: HashMap<PlayerId, Player>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a player at the connect spawn with a random color
    pub fn create<R: Rng + ?Sized>(&mut self, tx: PlayerTx, rng: &mut R) -> PlayerId {
        let id = PlayerId::new();
        self.players.insert(id, Player::new(id, random_color(rng), tx));
        id
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    /// Remove a player, dropping its transport handle
    pub fn remove(&mut self, id: &PlayerId) -> Option<Player> {
        self.players.remove(id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }
}
