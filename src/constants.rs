//! This module contains all the constants used in the game.

use glam::UVec2;

/// Simulation rate. One tick is one rendered frame.
pub const TICKS_PER_SECOND: u32 = 60;
/// Milliseconds of simulated time covered by a single tick.
pub const TICK_MS: f32 = 1000.0 / TICKS_PER_SECOND as f32;

/// The size of each cell, in pixels.
pub const TILE_SIZE: f32 = 24.0;
/// The size of the game board, in cells.
pub const BOARD_CELL_SIZE: UVec2 = UVec2::new(19, 21);
/// Vertical offset of the board below the score bar, in pixels.
pub const BOARD_PIXEL_OFFSET_Y: f32 = 60.0;

/// Converts a millisecond duration to a whole number of ticks, rounding up.
pub const fn ms_to_ticks(ms: u32) -> u32 {
    // Widened so that any u32 duration converts; the result always fits back in u32.
    (ms as u64 * TICKS_PER_SECOND as u64).div_ceil(1000) as u32
}

/// An enum representing the different types of tiles on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapTile {
    /// Open floor with nothing on it.
    Empty,
    /// An impassable wall.
    Wall,
    /// A regular dot.
    Dot,
    /// A power pellet.
    PowerPellet,
    /// The tennis court hosting the Pong minigame. Walkable, but never a hat landing spot.
    SpecialZone,
}

impl MapTile {
    pub const fn is_walkable(self) -> bool {
        !matches!(self, MapTile::Wall)
    }
}

/// The raw layout of the game board.
///
/// `#` wall, `.` dot, `o` power pellet, ` ` empty, `~` tennis court, `X` player start.
pub const RAW_BOARD: [&str; BOARD_CELL_SIZE.y as usize] = [
    "###################",
    "#........#........#",
    "#.##.###.#.###.##.#",
    "#o...............o#",
    "#.##.#.#####.#.##.#",
    "#....#...#...#....#",
    "####.### # ###.####",
    "   #.#~~~~~~~#.#   ",
    "####.#~~~~~~~#.####",
    "    . ~~~~~~~ .    ",
    "####.#~~~~~~~#.####",
    "   #.#~~~~~~~#.#   ",
    "####.# ##### #.####",
    "#........#........#",
    "#.##.###.#.###.##.#",
    "#o.#.....X.....#.o#",
    "##.#.#.#####.#.#.##",
    "#....#...#...#....#",
    "#.######.#.######.#",
    "#.................#",
    "###################",
];

pub mod score {
    pub const DOT: u32 = 10;
    pub const POWER_PELLET: u32 = 50;
    /// Base value of a hat picked up off the ground.
    pub const HAT: u32 = 100;
    /// Stealing a worn hat pays this multiple of its base value.
    pub const STEAL_MULTIPLIER: u32 = 2;
    pub const DELIVERY_BONUS: u32 = 500;
}

/// Movement speeds in pixels per tick.
pub mod speed {
    pub const PLAYER: f32 = 2.5;
    pub const WIFE: f32 = 1.5;
    pub const WIFE_FRIGHTENED: f32 = 0.8;
    pub const CHILD: f32 = 2.0;
    pub const CHILD_FRIGHTENED: f32 = 1.0;
    pub const YELP: f32 = 0.4;
    pub const GOOGLE: f32 = 0.6;
    pub const GUARD: f32 = 2.2;
    pub const GUARD_FRIGHTENED: f32 = 1.0;
    /// Extra speed a guard gains at full alert.
    pub const GUARD_ALERT_BONUS: f32 = 0.5;
    /// Cumulative multiplier added to downvotes and guards on every level advance.
    pub const LEVEL_MULTIPLIER_STEP: f32 = 0.15;
}

/// How often each archetype re-decides outside of intersections, in milliseconds.
pub mod decision {
    pub const WIFE_MS: f32 = 1200.0;
    pub const CHILD_MS: f32 = 400.0;
    pub const YELP_MS: f32 = 800.0;
    pub const GOOGLE_MS: f32 = 1000.0;
    pub const GUARD_MS: f32 = 300.0;
}

pub mod timing {
    pub const FRIGHTENED_MS: u32 = 10_000;
    pub const EXCITED_MS: u32 = 5_000;
    pub const HAT_THROW_DELAY_MS: u32 = 500;
    pub const HAT_FLIGHT_MS: u32 = 1_000;
    pub const DOWNVOTE_STAGGER_MS: u32 = 1_500;
    pub const READY_MS: u32 = 1_600;
    pub const LEVEL_TRANSITION_MS: u32 = 2_500;
    pub const DEATH_MS: u32 = 2_000;
    /// Shorter death sequence used for captures and downvote kills.
    pub const CAPTURE_DEATH_MS: u32 = 1_200;
    pub const GUARD_FLASH_MS: f32 = 75.0;
    /// How long escalation announcements stay up.
    pub const ANNOUNCEMENT_MS: u32 = 2_000;
    pub const GUARD_LEAVE_TIMEOUT_MS: f32 = 20_000.0;
}

pub mod spawn {
    use glam::IVec2;

    pub const WIFE: IVec2 = IVec2::new(1, 1);
    pub const CHILDREN: [IVec2; 3] = [IVec2::new(17, 1), IVec2::new(1, 19), IVec2::new(17, 19)];
    /// Candidate cells for downvotes, filtered by legality at spawn time.
    pub const DOWNVOTE_CANDIDATES: [IVec2; 6] = [
        IVec2::new(1, 9),
        IVec2::new(17, 9),
        IVec2::new(9, 3),
        IVec2::new(9, 19),
        IVec2::new(1, 5),
        IVec2::new(17, 15),
    ];
    /// Attempts made to find a random landing tile before falling back to the player start.
    pub const HAT_LANDING_ATTEMPTS: usize = 50;
    /// Horizontal inset of a Pong paddle from the court edge, in pixels.
    pub const PADDLE_INSET: f32 = 12.0;
}

pub mod messages {
    pub const READY: &str = "READY!";
    pub const LEVEL_COMPLETE: &str = "LEVEL COMPLETE!";
    pub const GAME_OVER: &str = "GAME OVER";

    /// Guard warning keyed by the number of active guards.
    pub const fn security_alert(active: usize) -> &'static str {
        match active {
            0 | 1 => "SECURITY ALERT! DELIVER HAT TO WIFE!",
            2 => "MULTIPLE SECURITY GUARDS! DANGER!",
            _ => "MAXIMUM SECURITY! EXTREME DANGER!",
        }
    }

    /// Downvote warning keyed by the number of active downvotes.
    pub const fn downvote_alert(active: usize) -> &'static str {
        match active {
            0 | 1 => "DOWNVOTE APPEARED!",
            2 => "MULTIPLE DOWNVOTES! DANGER INCREASING!",
            3 => "TRIPLE DOWNVOTES! HIGH DANGER!",
            _ => "MAXIMUM DOWNVOTES! EXTREME DANGER!",
        }
    }
}
