//! Identity components shared by every actor in the maze.

use bevy_ecs::component::Component;
use glam::IVec2;
use strum_macros::{AsRefStr, Display};

/// What kind of actor an entity is.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Archetype {
    Player,
    Wife,
    Child,
    SecurityGuard,
    YelpDownvote,
    GoogleDownvote,
}

impl Archetype {
    /// Downvotes kill the player on contact and ignore power pellets.
    pub const fn is_downvote(self) -> bool {
        matches!(self, Archetype::YelpDownvote | Archetype::GoogleDownvote)
    }

    /// Archetypes whose speed scales with the level multiplier.
    pub const fn scales_with_level(self) -> bool {
        matches!(
            self,
            Archetype::SecurityGuard | Archetype::YelpDownvote | Archetype::GoogleDownvote
        )
    }
}

/// Display name such as `child_2` or `security_0`.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct ActorName(pub String);

/// The cell an actor returns to on a round reset.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartCell(pub IVec2);

/// Max of the per-axis distances. Two cells "touch" when this is at most 1.
pub fn chebyshev(a: IVec2, b: IVec2) -> i32 {
    let d = (a - b).abs();
    d.x.max(d.y)
}

/// True if `a` and `b` are the same or neighbouring cells, diagonals included.
pub fn touching(a: IVec2, b: IVec2) -> bool {
    chebyshev(a, b) <= 1
}
