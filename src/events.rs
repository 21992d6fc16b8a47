//! Commands flowing into the core, and the events it emits back out.

use bevy_ecs::entity::Entity;
use bevy_ecs::event::Event;
use glam::IVec2;
use strum_macros::AsRefStr;

use crate::map::direction::Direction;

/// Which side of the Pong court scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// External requests, queued before a tick and handled during it.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameCommand {
    MovePlayer(Direction),
    TogglePause,
    /// Advance exactly one tick while paused.
    SingleTick,
    /// The background Pong minigame scored; a hat is thrown from that side's paddle.
    PongScore(Side),
    /// Kill the player outright.
    KillPlayer,
    /// Start over after a game over.
    Restart,
}

/// Why the player died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum DeathCause {
    /// Caught by a guard while wearing a stolen hat.
    Captured,
    /// Touched by a downvote.
    Downvoted,
    /// An explicit kill command.
    Killed,
}

impl DeathCause {
    /// Captures and downvote kills play the shorter death sequence.
    pub const fn is_quick(self) -> bool {
        matches!(self, DeathCause::Captured | DeathCause::Downvoted)
    }
}

/// Everything presentation, audio and analytics collaborators may react to.
///
/// Collected into an outbox during a tick and drained by [`crate::game::Game::tick`].
#[derive(Event, Debug, Clone, PartialEq, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum GameEvent {
    DotEaten { cell: IVec2, points: u32 },
    PowerPelletEaten { cell: IVec2, points: u32 },
    HatThrown { side: Side, landing: IVec2 },
    HatLanded { cell: IVec2 },
    HatCollected { by: Entity, points: u32 },
    HatStolen { by: Entity, from: Entity, points: u32 },
    HatDelivered { points: u32, was_stolen: bool },
    PongScore { side: Side },
    SecurityGuardSpawned { guard: Entity, active: usize },
    SecurityGuardLeft { guard: Entity },
    DownvoteSpawned { downvote: Entity, active: usize },
    PlayerDied { cause: DeathCause, lives_left: u8 },
    LevelComplete { level: u32 },
    LevelStarted { level: u32 },
    GameOver { score: u32 },
    Announcement { text: &'static str, duration_ms: u32 },
    HighScore { score: u32 },
}
