use glam::IVec2;
use rand::seq::IndexedRandom;
use rand::Rng;
use smallvec::SmallVec;
use tracing::trace;

use super::{approach_order, DecisionContext, NpcState};
use crate::constants::speed;
use crate::map::direction::Direction;

/// Longest curiosity pause, in ticks.
const MAX_CURIOSITY_TICKS: f32 = 120.0;
const CURIOSITY_CHANCE: f64 = 0.03;
/// Per-tick chance that energy drifts a little.
const ENERGY_DRIFT_CHANCE: f64 = 0.001;
const ENERGY_DRIFT: f32 = 0.05;

/// A child running around at random, or making a dash for a freshly landed hat.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergeticRandom {
    /// In `[0, 1]`; scales both turn frequency and speed.
    pub energy: f32,
    /// Ticks left in the current curiosity pause.
    pub curiosity_ticks: f32,
    /// Cell being chased, usually where a hat landed.
    pub target: Option<IVec2>,
}

impl EnergeticRandom {
    pub fn new(energy: f32) -> Self {
        Self {
            energy: energy.clamp(0.0, 1.0),
            curiosity_ticks: 0.0,
            target: None,
        }
    }

    pub fn set_target(&mut self, cell: IVec2) {
        self.target = Some(cell);
    }

    pub fn clear_target(&mut self) {
        self.target = None;
    }

    pub fn decide<R: Rng + ?Sized>(&mut self, ctx: &DecisionContext, rng: &mut R) -> Option<Direction> {
        match self.target {
            Some(target) => self.chase_target(target, ctx, rng),
            None => self.run_around(ctx, rng),
        }
    }

    fn chase_target<R: Rng + ?Sized>(&mut self, target: IVec2, ctx: &DecisionContext, rng: &mut R) -> Option<Direction> {
        let delta = target - ctx.cell;
        if delta.x.abs() <= 1 && delta.y.abs() <= 1 {
            trace!(?target, "Child reached its target");
            self.clear_target();
            return None;
        }

        let reverse = ctx.reverse();
        let order = approach_order(delta, false, rng);
        if let Some(dir) = order.iter().copied().find(|dir| Some(*dir) != reverse && ctx.can_move(*dir)) {
            return Some(dir);
        }

        // Dead end pointing the right way: backing out is the only option.
        let available = ctx.available();
        if let (Some(back), [only]) = (reverse, available.as_slice()) {
            if *only == back && order.contains(&back) {
                return Some(back);
            }
        }

        trace!(?target, "Child lost the trail");
        self.clear_target();
        self.run_around(ctx, rng)
    }

    fn run_around<R: Rng + ?Sized>(&mut self, ctx: &DecisionContext, rng: &mut R) -> Option<Direction> {
        if self.curiosity_ticks > 0.0 {
            return None;
        }

        if ctx.state != NpcState::Excited && rng.random_bool(CURIOSITY_CHANCE) {
            self.curiosity_ticks = rng.random::<f32>() * MAX_CURIOSITY_TICKS;
            return None;
        }

        let change_chance = f64::from(self.energy * 0.4 + 0.2);
        if ctx.facing.is_some() && !rng.random_bool(change_chance) {
            return None;
        }

        let available = ctx.available();
        let forward: SmallVec<[Direction; 4]> = available
            .iter()
            .copied()
            .filter(|dir| Some(*dir) != ctx.reverse())
            .collect();
        let pool = if forward.is_empty() { &available } else { &forward };
        pool.choose(rng).copied()
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.curiosity_ticks = (self.curiosity_ticks - 1.0).max(0.0);

        if rng.random_bool(ENERGY_DRIFT_CHANCE) {
            let drift = if rng.random_bool(0.5) { ENERGY_DRIFT } else { -ENERGY_DRIFT };
            self.energy = (self.energy + drift).clamp(0.2, 1.0);
        }
    }

    pub fn on_state_change(&mut self, state: NpcState) {
        match state {
            NpcState::Frightened => {
                self.curiosity_ticks = 0.0;
                self.energy = (self.energy + 0.3).min(1.0);
                self.clear_target();
            }
            NpcState::Excited => {
                self.energy = 1.0;
                self.curiosity_ticks = 0.0;
            }
            NpcState::Normal => {
                self.energy = (self.energy - 0.1).max(0.3);
            }
            NpcState::Returning | NpcState::Special => {}
        }
    }

    pub fn movement_speed(&self, state: NpcState) -> f32 {
        let base = match state {
            NpcState::Frightened => speed::CHILD_FRIGHTENED,
            _ => speed::CHILD,
        };
        base * (0.8 + self.energy * 0.4)
    }

    pub fn reset(&mut self) {
        self.curiosity_ticks = 0.0;
        self.target = None;
    }
}
