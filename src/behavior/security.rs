use glam::IVec2;
use rand::Rng;
use strum_macros::AsRefStr;
use tracing::{debug, trace};

use super::{approach_order, fallback_direction, DecisionContext, NpcState};
use crate::constants::{speed, timing};
use crate::entity::touching;
use crate::map::direction::Direction;
use crate::map::GridMap;

const STARTING_ALERT: f32 = 50.0;
const ALERT_PER_DECISION: f32 = 0.5;

/// Where a guard is in its visit to the maze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum GuardPhase {
    /// Hidden off the board, available for activation.
    #[default]
    Inactive,
    /// Walking in from an edge tunnel.
    Entering,
    Chasing,
    /// Heading for the nearest exit.
    Leaving,
}

/// The two alternating tints of a guard in arrest mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashColor {
    #[default]
    Red,
    Blue,
}

impl FlashColor {
    pub const fn rgb(self) -> u32 {
        match self {
            FlashColor::Red => 0xff3333,
            FlashColor::Blue => 0x3333ff,
        }
    }

    const fn toggled(self) -> FlashColor {
        match self {
            FlashColor::Red => FlashColor::Blue,
            FlashColor::Blue => FlashColor::Red,
        }
    }
}

/// Phase changes a guard reports about itself after moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardSignal {
    /// Fully inside the maze and now chasing.
    Arrived,
    /// Walked out through an exit.
    Left,
    /// Failed to find an exit in time and was pulled off the board.
    TimedOut,
}

/// A security guard chasing a hat thief.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SecurityChase {
    pub phase: GuardPhase,
    /// In `[0, 100]`; raises speed while chasing.
    pub alert_level: f32,
    /// Set while pursuing a thief. Purely cosmetic besides the state tag.
    pub arrest_mode: bool,
    pub entry_point: Option<IVec2>,
    flash: FlashColor,
    flash_ms: f32,
    leaving_ms: f32,
}

impl SecurityChase {
    /// Starts an entry from `entry`, an off-board cell next to a tunnel mouth.
    pub fn activate(&mut self, entry: IVec2) {
        *self = SecurityChase {
            phase: GuardPhase::Entering,
            alert_level: STARTING_ALERT,
            arrest_mode: true,
            entry_point: Some(entry),
            ..SecurityChase::default()
        };
    }

    /// Sends an entering or chasing guard towards the exit. Returns false if it was not in play.
    pub fn deactivate(&mut self) -> bool {
        match self.phase {
            GuardPhase::Entering | GuardPhase::Chasing => {
                self.phase = GuardPhase::Leaving;
                self.arrest_mode = false;
                self.leaving_ms = 0.0;
                true
            }
            GuardPhase::Inactive | GuardPhase::Leaving => false,
        }
    }

    /// Removes the guard from play at once.
    pub fn withdraw(&mut self) {
        *self = SecurityChase::default();
    }

    /// True while entering or chasing. Leaving guards no longer count.
    pub fn is_active(&self) -> bool {
        matches!(self.phase, GuardPhase::Entering | GuardPhase::Chasing)
    }

    /// Hidden guards are off the board entirely.
    pub fn is_visible(&self) -> bool {
        self.phase != GuardPhase::Inactive
    }

    pub fn can_catch(&self, own: IVec2, target: IVec2) -> bool {
        self.phase == GuardPhase::Chasing && touching(own, target)
    }

    /// Current arrest-mode tint, if any.
    pub fn flash_color(&self) -> Option<FlashColor> {
        self.arrest_mode.then_some(self.flash)
    }

    /// Checks phase transitions driven by the guard's position.
    pub fn observe(&mut self, map: &GridMap, cell: IVec2, dt_ms: f32) -> Option<GuardSignal> {
        match self.phase {
            GuardPhase::Entering if (0..map.width()).contains(&cell.x) => {
                debug!(?cell, "Guard entered the maze");
                self.phase = GuardPhase::Chasing;
                Some(GuardSignal::Arrived)
            }
            GuardPhase::Leaving => {
                self.leaving_ms += dt_ms;
                let at_edge = cell.x <= 0 || cell.x >= map.width() - 1;
                if at_edge && map.wrap_rows().contains(&cell.y) {
                    self.withdraw();
                    Some(GuardSignal::Left)
                } else if self.leaving_ms >= timing::GUARD_LEAVE_TIMEOUT_MS {
                    self.withdraw();
                    Some(GuardSignal::TimedOut)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn decide<R: Rng + ?Sized>(&mut self, ctx: &DecisionContext, rng: &mut R) -> Option<Direction> {
        match self.phase {
            GuardPhase::Inactive => None,
            GuardPhase::Entering => {
                if ctx.cell.x < 0 {
                    Some(Direction::Right)
                } else {
                    Some(Direction::Left)
                }
            }
            GuardPhase::Chasing => {
                self.alert_level = (self.alert_level + ALERT_PER_DECISION).min(100.0);
                self.pursue(ctx.player.cell, ctx, rng)
            }
            GuardPhase::Leaving => {
                let Some(row) = ctx.map.nearest_wrap_row(ctx.cell.y) else {
                    trace!("No exit row, waiting out the timeout");
                    return None;
                };
                let exit_x = if ctx.cell.x < ctx.map.width() / 2 { 0 } else { ctx.map.width() - 1 };
                self.pursue(IVec2::new(exit_x, row), ctx, rng)
            }
        }
    }

    /// Greedy step toward `target`, with equal gaps broken at random.
    fn pursue<R: Rng + ?Sized>(&self, target: IVec2, ctx: &DecisionContext, rng: &mut R) -> Option<Direction> {
        approach_order(target - ctx.cell, true, rng)
            .into_iter()
            .find(|dir| Some(*dir) != ctx.reverse() && ctx.can_move(*dir))
            .or_else(|| fallback_direction(ctx, rng))
    }

    pub fn tick(&mut self, dt_ms: f32) {
        if !self.arrest_mode {
            return;
        }
        self.flash_ms += dt_ms;
        while self.flash_ms >= timing::GUARD_FLASH_MS {
            self.flash_ms -= timing::GUARD_FLASH_MS;
            self.flash = self.flash.toggled();
        }
    }

    pub fn movement_speed(&self, state: NpcState) -> f32 {
        match state {
            NpcState::Frightened => speed::GUARD_FRIGHTENED,
            _ => speed::GUARD + self.alert_level / 100.0 * speed::GUARD_ALERT_BONUS,
        }
    }
}
