use bevy_ecs::{component::Component, resource::Resource};
use rand::rngs::SmallRng;

use crate::map::GridMap;

/// A tag component for the entity driven by player input.
#[derive(Default, Component, Debug, Clone, Copy)]
pub struct PlayerControlled;

#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlayerStatus {
    /// Set for the length of a death sequence.
    pub is_dead: bool,
}

/// Position of a guard in the guard pool. Lower slots are dispatched first.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GuardSlot(pub usize);

/// Position of a downvote in the downvote pool, and whether it is on the board.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownvoteSlot {
    pub index: usize,
    pub active: bool,
}

#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Score(pub u32);

#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HighScore(pub u32);

/// A resource to store the number of player lives.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerLives(pub u8);

impl Default for PlayerLives {
    fn default() -> Self {
        Self(3)
    }
}

/// Current level and the cumulative speed multiplier applied to downvotes and guards.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct LevelState {
    pub level: u32,
    pub speed_multiplier: f32,
}

impl Default for LevelState {
    fn default() -> Self {
        Self {
            level: 1,
            speed_multiplier: 1.0,
        }
    }
}

/// The single source of gameplay randomness.
#[derive(Resource, Debug, Clone)]
pub struct GameRng(pub SmallRng);

/// Simulated milliseconds per tick.
#[derive(Resource, Debug, Clone, Copy)]
pub struct DeltaTime(pub f32);

/// Pristine copy of the level, cloned into [`GridMap`] on every level start.
#[derive(Resource, Debug, Clone)]
pub struct MapTemplate(pub GridMap);
