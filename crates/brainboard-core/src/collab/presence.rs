//! Collaborator roster and simulated peer movement.

use super::BridgeMessage;
use crate::element::HexColor;
use kurbo::Point;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Id of the local user.
pub const LOCAL_USER_ID: u32 = 1;

/// Simulated peers move by up to this many pixels per axis per tick.
pub const WANDER_RANGE: f64 = 10.0;

/// One participant on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collaborator {
    pub id: u32,
    pub name: String,
    pub color: HexColor,
    pub position: Point,
    pub online: bool,
}

/// Known collaborators, local user first.
#[derive(Debug, Clone, PartialEq)]
pub struct Presence {
    users: Vec<Collaborator>,
}

impl Default for Presence {
    fn default() -> Self {
        Self {
            users: vec![Collaborator {
                id: LOCAL_USER_ID,
                name: "You".to_string(),
                color: HexColor::new("#FF5733"),
                position: Point::new(100.0, 150.0),
                online: true,
            }],
        }
    }
}

impl Presence {
    pub fn users(&self) -> &[Collaborator] {
        &self.users
    }

    pub fn get(&self, id: u32) -> Option<&Collaborator> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn local(&self) -> Option<&Collaborator> {
        self.get(LOCAL_USER_ID)
    }

    /// Add a collaborator, replacing any existing entry with the same id.
    pub fn upsert(&mut self, collaborator: Collaborator) {
        match self.users.iter_mut().find(|u| u.id == collaborator.id) {
            Some(slot) => *slot = collaborator,
            None => self.users.push(collaborator),
        }
    }

    /// Record a cursor position. Returns false for ids not in the roster,
    /// which are ignored.
    pub fn apply_move(&mut self, id: u32, position: Point) -> bool {
        match self.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.position = position;
                true
            }
            None => false,
        }
    }

    pub fn set_online(&mut self, id: u32, online: bool) -> bool {
        match self.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.online = online;
                true
            }
            None => false,
        }
    }

    pub fn online_count(&self) -> usize {
        self.users.iter().filter(|u| u.online).count()
    }

    /// Next id not yet in the roster, or `None` if every id is taken.
    pub fn next_id(&self) -> Option<u32> {
        let highest = self.users.iter().map(|u| u.id).max().unwrap_or(LOCAL_USER_ID);
        highest
            .checked_add(1)
            .or_else(|| (LOCAL_USER_ID + 1..=u32::MAX).find(|id| self.get(*id).is_none()))
    }
}

/// Fakes remote cursor traffic: every interval, each simulated peer wanders
/// a little and reports it as a `userMove`.
pub struct PresenceSimulator {
    peers: Vec<(u32, Point)>,
    interval: Duration,
    elapsed: Duration,
    rng: StdRng,
}

impl PresenceSimulator {
    /// Create a new simulator ticking every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self::with_rng(interval, StdRng::from_os_rng())
    }

    pub fn seeded(interval: Duration, seed: u64) -> Self {
        Self::with_rng(interval, StdRng::seed_from_u64(seed))
    }

    fn with_rng(interval: Duration, rng: StdRng) -> Self {
        Self {
            peers: Vec::new(),
            interval,
            elapsed: Duration::ZERO,
            rng,
        }
    }

    /// Start simulating `id` from `position`.
    pub fn add_peer(&mut self, id: u32, position: Point) {
        if id != LOCAL_USER_ID && !self.peers.iter().any(|(p, _)| *p == id) {
            self.peers.push((id, position));
        }
    }

    pub fn remove_peer(&mut self, id: u32) {
        self.peers.retain(|(p, _)| *p != id);
    }

    pub fn peers(&self) -> usize {
        self.peers.len()
    }

    /// Let `dt` pass; returns one `userMove` per peer for every interval
    /// boundary crossed.
    pub fn tick(&mut self, dt: Duration) -> Vec<BridgeMessage> {
        let mut moves = Vec::new();
        if self.interval.is_zero() {
            return moves;
        }
        self.elapsed += dt;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            for (id, position) in &mut self.peers {
                position.x += self.rng.random_range(-WANDER_RANGE..WANDER_RANGE);
                position.y += self.rng.random_range(-WANDER_RANGE..WANDER_RANGE);
                moves.push(BridgeMessage::UserMove {
                    user_id: *id,
                    x: position.x,
                    y: position.y,
                });
            }
        }
        moves
    }
}
