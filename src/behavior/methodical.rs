use glam::IVec2;
use rand::Rng;

use super::{approach_order, fallback_direction, random_legal_direction, DecisionContext, PlayerView};
use crate::map::direction::Direction;
use crate::map::GridMap;

const RANDOM_STEP_CHANCE: f64 = 0.15;
const CALCULATION_PER_TICK: f32 = 0.15;
/// Cells predicted ahead of a moving player before any calculation bonus.
const BASE_PREDICTION_STEPS: i32 = 2;

/// The Google downvote: cuts the player off by aiming where they are about to be.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodicalHunt {
    /// Ramps from 0 to 100 while active; deepens the prediction.
    pub calculation_level: f32,
    /// Most recent predicted target cell.
    pub last_prediction: Option<IVec2>,
}

impl MethodicalHunt {
    /// How many cells ahead of the player to aim.
    pub fn prediction_steps(&self) -> i32 {
        BASE_PREDICTION_STEPS + (self.calculation_level / 50.0).floor() as i32
    }

    /// Projects a moving player forward along their direction, stopping before any wall.
    pub fn predict(&self, player: PlayerView, map: &GridMap) -> IVec2 {
        let Some(direction) = player.direction.filter(|_| player.moving) else {
            return player.cell;
        };

        let mut predicted = player.cell;
        for _ in 0..self.prediction_steps() {
            let next = predicted + direction.as_ivec2();
            if !map.is_valid_move(next) {
                break;
            }
            predicted = next;
        }
        predicted
    }

    pub fn decide<R: Rng + ?Sized>(&mut self, ctx: &DecisionContext, rng: &mut R) -> Option<Direction> {
        if rng.random_bool(RANDOM_STEP_CHANCE) {
            return random_legal_direction(ctx, rng);
        }

        let predicted = self.predict(ctx.player, ctx.map);
        self.last_prediction = Some(predicted);

        let toward = |target: IVec2, rng: &mut R| {
            approach_order(target - ctx.cell, false, rng)
                .into_iter()
                .find(|dir| ctx.can_move(*dir))
        };

        toward(predicted, rng)
            .or_else(|| toward(ctx.player.cell, rng))
            .or_else(|| fallback_direction(ctx, rng))
    }

    pub fn tick(&mut self) {
        self.calculation_level = (self.calculation_level + CALCULATION_PER_TICK).min(100.0);
    }
}
