use rand::seq::IndexedRandom;
use rand::Rng;
use smallvec::SmallVec;

use super::{DecisionContext, NpcState};
use crate::constants::speed;
use crate::map::direction::Direction;

/// Longest look-around pause, in ticks.
const MAX_PAUSE_TICKS: f32 = 180.0;
const PAUSE_CHANCE: f64 = 0.05;
const KEEP_GOING_CHANCE: f64 = 0.7;

/// The wife's aimless stroll: mostly straight lines, the odd look around.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wander {
    /// Ticks left in the current look-around pause.
    pub pause_ticks: f32,
}

impl Wander {
    pub fn decide<R: Rng + ?Sized>(&mut self, ctx: &DecisionContext, rng: &mut R) -> Option<Direction> {
        if self.pause_ticks > 0.0 {
            return None;
        }

        if rng.random_bool(PAUSE_CHANCE) {
            self.pause_ticks = rng.random::<f32>() * MAX_PAUSE_TICKS;
            return None;
        }

        if let Some(current) = ctx.facing {
            if rng.random_bool(KEEP_GOING_CHANCE) && ctx.can_move(current) {
                return None;
            }
        }

        let available = ctx.available();
        let preferred: SmallVec<[Direction; 4]> = match ctx.facing {
            Some(current) => available
                .iter()
                .copied()
                .filter(|dir| *dir == current || dir.is_perpendicular(current))
                .collect(),
            None => SmallVec::new(),
        };

        let pool = if preferred.is_empty() { &available } else { &preferred };
        pool.choose(rng).copied()
    }

    pub fn tick(&mut self) {
        self.pause_ticks = (self.pause_ticks - 1.0).max(0.0);
    }

    pub fn on_state_change(&mut self, state: NpcState) {
        if state == NpcState::Frightened {
            self.pause_ticks = 0.0;
        }
    }

    pub fn movement_speed(&self, state: NpcState) -> f32 {
        match state {
            NpcState::Frightened => speed::WIFE_FRIGHTENED,
            _ => speed::WIFE,
        }
    }
}
