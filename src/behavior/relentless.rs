use rand::Rng;

use super::{approach_order, fallback_direction, random_legal_direction, DecisionContext};
use crate::map::direction::Direction;

/// Chance per decision of a random step, to keep pursuers from stacking up.
const RANDOM_STEP_CHANCE: f64 = 0.2;
const MENACE_PER_TICK: f32 = 0.2;

/// The Yelp downvote: slow, never distracted, always heading straight for the player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelentlessChase {
    /// Cosmetic intensity in `[0, 100]`, ramps while active.
    pub menace_level: f32,
}

impl RelentlessChase {
    pub fn decide<R: Rng + ?Sized>(&mut self, ctx: &DecisionContext, rng: &mut R) -> Option<Direction> {
        if rng.random_bool(RANDOM_STEP_CHANCE) {
            return random_legal_direction(ctx, rng);
        }

        approach_order(ctx.player.cell - ctx.cell, true, rng)
            .into_iter()
            .find(|dir| ctx.can_move(*dir))
            .or_else(|| fallback_direction(ctx, rng))
    }

    pub fn tick(&mut self) {
        self.menace_level = (self.menace_level + MENACE_PER_TICK).min(100.0);
    }
}
