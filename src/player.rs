//! Player and roster management
//!
//! This module tracks the players connected to the room. The roster keeps
//! players in join order, indexes them by connection id, and provides the
//! delivery helpers used to broadcast notifications to every connected
//! player or to a single connection.

use std::{collections::HashMap, fmt::Display, str::FromStr};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use uuid::Uuid;

use super::{game::UpdateMessage, session::Tunnel};

/// A unique identifier for a connected player
///
/// The transport layer assigns one id per connection before delivering any
/// event, and the id stays stable for the connection's lifetime.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random connection id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Id {
    /// Creates a new random connection id (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Id {
    /// Formats the id as a UUID string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    /// Parses an id from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// A player connected to the room
///
/// Carries the display name, the game-master flag, and the score. The score
/// only ever increases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Connection id, unique within the roster
    id: Id,
    /// Validated display name
    name: String,
    /// Whether this player currently holds the game-master role
    is_game_master: bool,
    /// Total points earned
    score: u64,
}

impl Player {
    /// Creates a new player with a zero score and no role
    pub fn new(id: Id, name: String) -> Self {
        Self {
            id,
            name,
            is_game_master: false,
            score: 0,
        }
    }

    /// The player's connection id
    pub fn id(&self) -> Id {
        self.id
    }

    /// The player's display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this player currently holds the game-master role
    pub fn is_game_master(&self) -> bool {
        self.is_game_master
    }

    /// The player's total points
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Grants or revokes the game-master role
    pub fn set_game_master(&mut self, is_game_master: bool) {
        self.is_game_master = is_game_master;
    }

    /// Adds points to the player's score
    pub fn award(&mut self, points: u64) {
        self.score += points;
    }
}

/// Errors that can occur when admitting a player
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The room has reached the maximum number of allowed players
    #[error("maximum number of players reached")]
    MaximumPlayers,
    /// The connection already has a player in the roster
    #[error("connection already joined")]
    AlreadyJoined,
}

/// The ordered set of players currently in the room
///
/// Iteration order is join order. Lookup by connection id is constant time
/// through the index.
#[derive(Debug, Default)]
pub struct Roster {
    /// Connection ids in join order
    order: Vec<Id>,
    /// Index from connection id to player
    mapping: HashMap<Id, Player>,
}

impl Roster {
    /// Adds a player at the end of the join order
    ///
    /// # Errors
    ///
    /// Returns `Error::MaximumPlayers` if the room is full, or
    /// `Error::AlreadyJoined` if the connection already has a player.
    pub fn add(&mut self, player: Player) -> Result<(), Error> {
        if self.mapping.len() >= crate::constants::room::MAX_PLAYER_COUNT {
            return Err(Error::MaximumPlayers);
        }
        let id = player.id();
        if self.mapping.contains_key(&id) {
            return Err(Error::AlreadyJoined);
        }
        self.order.push(id);
        self.mapping.insert(id, player);
        Ok(())
    }

    /// Removes a player, returning them if they were present
    pub fn remove(&mut self, id: Id) -> Option<Player> {
        let player = self.mapping.remove(&id)?;
        self.order.retain(|other| *other != id);
        Some(player)
    }

    /// Gets a player by connection id
    pub fn get(&self, id: Id) -> Option<&Player> {
        self.mapping.get(&id)
    }

    /// Gets a mutable player by connection id
    pub fn get_mut(&mut self, id: Id) -> Option<&mut Player> {
        self.mapping.get_mut(&id)
    }

    /// Checks whether a connection has a player in the roster
    pub fn contains(&self, id: Id) -> bool {
        self.mapping.contains_key(&id)
    }

    /// Number of players in the room
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// Whether the room has no players
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Iterates over players in join order
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.order.iter().filter_map(|id| self.mapping.get(id))
    }

    /// Clones the full roster in join order, for broadcast payloads
    pub fn snapshot(&self) -> Vec<Player> {
        self.players().cloned().collect_vec()
    }

    /// Picks a uniformly random player id from the roster
    ///
    /// Returns `None` on an empty roster rather than retrying.
    pub fn pick_random(&self, rng: &mut fastrand::Rng) -> Option<Id> {
        if self.order.is_empty() {
            return None;
        }
        Some(self.order[rng.usize(..self.order.len())])
    }

    /// Revokes the game-master role from whoever holds it
    pub fn clear_game_master(&mut self) {
        for player in self.mapping.values_mut() {
            if player.is_game_master() {
                player.set_game_master(false);
            }
        }
    }

    /// Delivers a notification to every connected player
    ///
    /// # Arguments
    ///
    /// * `message` - The notification to deliver
    /// * `tunnel_finder` - Function to retrieve the tunnel for a given id
    pub fn announce<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        message: &UpdateMessage,
        tunnel_finder: F,
    ) {
        for id in &self.order {
            if let Some(tunnel) = tunnel_finder(*id) {
                tunnel.send_message(message);
            }
        }
    }

    /// Delivers a notification to a single connection
    ///
    /// The connection does not need to be in the roster; join rejections go
    /// to connections that were never admitted.
    pub fn send_to<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        message: &UpdateMessage,
        id: Id,
        tunnel_finder: F,
    ) {
        if let Some(tunnel) = tunnel_finder(id) {
            tunnel.send_message(message);
        }
    }
}
