//! NPC decision making.
//!
//! Every NPC carries an [`Npc`] component holding its [`Behavior`]: one strategy per
//! archetype, dispatched by matching on the variant. Strategies only pick a desired
//! direction; [`crate::movement::RailMovement`] decides when that direction can be taken.

pub mod energetic;
pub mod methodical;
pub mod relentless;
pub mod security;
pub mod wander;

use bevy_ecs::component::Component;
use glam::IVec2;
use rand::seq::IndexedRandom;
use rand::Rng;
use smallvec::SmallVec;
use strum_macros::AsRefStr;
use tracing::trace;

use crate::entity::Archetype;
use crate::map::direction::Direction;
use crate::map::GridMap;

pub use energetic::EnergeticRandom;
pub use methodical::MethodicalHunt;
pub use relentless::RelentlessChase;
pub use security::{FlashColor, GuardPhase, GuardSignal, SecurityChase};
pub use wander::Wander;

/// Mood shared by all NPCs. Timed moods fall back to `Normal` when they expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum NpcState {
    #[default]
    Normal,
    Frightened,
    /// Heading back to the start cell.
    ///
    /// Gameplay never enters this mood on its own; it is set only by callers of [`Npc::set_state`].
    Returning,
    /// A hat just landed; children rush for it.
    Excited,
    /// Arrest mode for guards chasing a thief.
    Special,
}

/// What an NPC can see of the player when deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerView {
    pub cell: IVec2,
    pub direction: Option<Direction>,
    pub moving: bool,
}

/// Everything a strategy may look at. Borrowed for the duration of one decision.
pub struct DecisionContext<'a> {
    pub map: &'a GridMap,
    /// Cell containing the NPC's pixel position.
    pub cell: IVec2,
    /// The NPC's last travelled direction.
    pub facing: Option<Direction>,
    pub state: NpcState,
    pub home: IVec2,
    pub player: PlayerView,
}

impl DecisionContext<'_> {
    pub fn can_move(&self, direction: Direction) -> bool {
        self.map.is_valid_move(self.cell + direction.as_ivec2())
    }

    pub fn available(&self) -> SmallVec<[Direction; 4]> {
        self.map.available_directions(self.cell)
    }

    /// The direction that would undo the last step.
    pub fn reverse(&self) -> Option<Direction> {
        self.facing.map(Direction::opposite)
    }
}

/// Directions that close the gap `delta`, the axis with the larger gap first.
///
/// When both gaps are equal the horizontal step comes first, unless `shuffle_ties` asks
/// for a coin flip.
pub fn approach_order<R: Rng + ?Sized>(delta: IVec2, shuffle_ties: bool, rng: &mut R) -> SmallVec<[Direction; 2]> {
    let mut ranked: SmallVec<[(Direction, i32); 2]> = SmallVec::new();
    if let Some(dir) = Direction::horizontal_toward(delta.x) {
        ranked.push((dir, delta.x.abs()));
    }
    if let Some(dir) = Direction::vertical_toward(delta.y) {
        ranked.push((dir, delta.y.abs()));
    }

    if ranked.len() == 2 {
        let tie = ranked[0].1 == ranked[1].1;
        if (tie && shuffle_ties && rng.random_bool(0.5)) || (!tie && ranked[1].1 > ranked[0].1) {
            ranked.swap(0, 1);
        }
    }

    ranked.into_iter().map(|(dir, _)| dir).collect()
}

/// Any legal direction, avoiding an immediate reversal unless it is the only way out.
pub fn fallback_direction<R: Rng + ?Sized>(ctx: &DecisionContext, rng: &mut R) -> Option<Direction> {
    let available = ctx.available();
    let forward: SmallVec<[Direction; 4]> = available
        .iter()
        .copied()
        .filter(|dir| Some(*dir) != ctx.reverse())
        .collect();

    let pool = if forward.is_empty() { &available } else { &forward };
    pool.choose(rng).copied()
}

/// Any legal direction at all, reversal included.
pub fn random_legal_direction<R: Rng + ?Sized>(ctx: &DecisionContext, rng: &mut R) -> Option<Direction> {
    ctx.available().choose(rng).copied()
}

/// The per-archetype strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Wander(Wander),
    EnergeticRandom(EnergeticRandom),
    RelentlessChase(RelentlessChase),
    MethodicalHunt(MethodicalHunt),
    SecurityChase(SecurityChase),
}

impl Behavior {
    /// The strategy an archetype is born with. The player has none.
    pub fn for_archetype<R: Rng + ?Sized>(archetype: Archetype, rng: &mut R) -> Option<Behavior> {
        match archetype {
            Archetype::Player => None,
            Archetype::Wife => Some(Behavior::Wander(Wander::default())),
            Archetype::Child => Some(Behavior::EnergeticRandom(EnergeticRandom::new(rng.random::<f32>()))),
            Archetype::YelpDownvote => Some(Behavior::RelentlessChase(RelentlessChase::default())),
            Archetype::GoogleDownvote => Some(Behavior::MethodicalHunt(MethodicalHunt::default())),
            Archetype::SecurityGuard => Some(Behavior::SecurityChase(SecurityChase::default())),
        }
    }

    pub fn decision_interval_ms(&self) -> f32 {
        use crate::constants::decision;
        match self {
            Behavior::Wander(_) => decision::WIFE_MS,
            Behavior::EnergeticRandom(_) => decision::CHILD_MS,
            Behavior::RelentlessChase(_) => decision::YELP_MS,
            Behavior::MethodicalHunt(_) => decision::GOOGLE_MS,
            Behavior::SecurityChase(_) => decision::GUARD_MS,
        }
    }

    fn decide<R: Rng + ?Sized>(&mut self, ctx: &DecisionContext, rng: &mut R) -> Option<Direction> {
        match self {
            Behavior::Wander(wander) => wander.decide(ctx, rng),
            Behavior::EnergeticRandom(child) => child.decide(ctx, rng),
            Behavior::RelentlessChase(yelp) => yelp.decide(ctx, rng),
            Behavior::MethodicalHunt(google) => google.decide(ctx, rng),
            Behavior::SecurityChase(guard) => guard.decide(ctx, rng),
        }
    }

    /// Base speed in pixels per tick, before the level multiplier.
    pub fn movement_speed(&self, state: NpcState) -> f32 {
        match self {
            Behavior::Wander(wander) => wander.movement_speed(state),
            Behavior::EnergeticRandom(child) => child.movement_speed(state),
            Behavior::RelentlessChase(_) => crate::constants::speed::YELP,
            Behavior::MethodicalHunt(_) => crate::constants::speed::GOOGLE,
            Behavior::SecurityChase(guard) => guard.movement_speed(state),
        }
    }

    /// True if a power pellet has no effect right now.
    pub fn ignores_fright(&self) -> bool {
        match self {
            Behavior::RelentlessChase(_) | Behavior::MethodicalHunt(_) => true,
            Behavior::SecurityChase(guard) => guard.is_active(),
            Behavior::Wander(_) | Behavior::EnergeticRandom(_) => false,
        }
    }

    fn on_state_change(&mut self, state: NpcState) {
        match self {
            Behavior::Wander(wander) => wander.on_state_change(state),
            Behavior::EnergeticRandom(child) => child.on_state_change(state),
            _ => {}
        }
    }

    fn tick<R: Rng + ?Sized>(&mut self, dt_ms: f32, rng: &mut R) {
        match self {
            Behavior::Wander(wander) => wander.tick(),
            Behavior::EnergeticRandom(child) => child.tick(rng),
            Behavior::RelentlessChase(yelp) => yelp.tick(),
            Behavior::MethodicalHunt(google) => google.tick(),
            Behavior::SecurityChase(guard) => guard.tick(dt_ms),
        }
    }

    fn reset(&mut self) {
        match self {
            Behavior::Wander(wander) => *wander = Wander::default(),
            Behavior::EnergeticRandom(child) => child.reset(),
            Behavior::RelentlessChase(yelp) => *yelp = RelentlessChase::default(),
            Behavior::MethodicalHunt(google) => *google = MethodicalHunt::default(),
            Behavior::SecurityChase(guard) => guard.withdraw(),
        }
    }
}

/// Decision state for a non-player character.
#[derive(Component, Debug, Clone)]
pub struct Npc {
    pub behavior: Behavior,
    pub state: NpcState,
    /// Remaining time in a timed state, in milliseconds.
    pub state_timer_ms: Option<f32>,
    /// Unfrozen time since the last decision.
    pub since_decision_ms: f32,
    /// Intersection where the last intersection decision was made.
    decided_at: Option<IVec2>,
    /// Desired direction waiting to be accepted by the rail.
    pub pending: Option<Direction>,
}

impl Npc {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            state: NpcState::Normal,
            state_timer_ms: None,
            since_decision_ms: 0.0,
            decided_at: None,
            pending: None,
        }
    }

    /// Only children pick hats up off the ground.
    pub fn can_collect_hats(&self) -> bool {
        matches!(self.behavior, Behavior::EnergeticRandom(_))
    }

    /// Enters `state`, optionally for a limited time. Returns false if the NPC ignored it.
    pub fn set_state(&mut self, state: NpcState, duration_ms: Option<u32>) -> bool {
        if state == NpcState::Frightened && self.behavior.ignores_fright() {
            return false;
        }

        self.state = state;
        self.state_timer_ms = duration_ms.map(|ms| ms as f32);
        self.behavior.on_state_change(state);
        true
    }

    /// Advances timers by one tick.
    pub fn tick<R: Rng + ?Sized>(&mut self, dt_ms: f32, rng: &mut R) {
        self.behavior.tick(dt_ms, rng);

        if let Some(remaining) = self.state_timer_ms.as_mut() {
            *remaining -= dt_ms;
            if *remaining <= 0.0 {
                trace!(state = self.state.as_ref(), "Timed state expired");
                self.set_state(NpcState::Normal, None);
            }
        }
    }

    /// Accumulates decision time and reports whether a decision is due.
    ///
    /// Decisions happen on arrival at a new intersection, or once the archetype's
    /// decision interval has elapsed.
    pub fn wants_decision(&mut self, dt_ms: f32, intersection: Option<IVec2>) -> bool {
        self.since_decision_ms += dt_ms;

        let new_intersection = intersection.is_some() && intersection != self.decided_at;
        if intersection.is_none() {
            self.decided_at = None;
        }

        if new_intersection || self.since_decision_ms > self.behavior.decision_interval_ms() {
            self.since_decision_ms = 0.0;
            self.decided_at = intersection;
            return true;
        }
        false
    }

    /// Runs the strategy and records its choice in `pending`.
    pub fn decide<R: Rng + ?Sized>(&mut self, ctx: &DecisionContext, rng: &mut R) {
        if self.state == NpcState::Returning {
            if ctx.cell == ctx.home {
                self.set_state(NpcState::Normal, None);
            } else {
                let home_order = approach_order(ctx.home - ctx.cell, false, rng);
                let choice = home_order
                    .into_iter()
                    .find(|dir| Some(*dir) != ctx.reverse() && ctx.can_move(*dir))
                    .or_else(|| fallback_direction(ctx, rng));
                if choice.is_some() {
                    self.pending = choice;
                }
                return;
            }
        }

        if let Some(direction) = self.behavior.decide(ctx, rng) {
            self.pending = Some(direction);
        }
    }

    pub fn movement_speed(&self) -> f32 {
        self.behavior.movement_speed(self.state)
    }

    /// Back to a fresh normal state, as on a round reset.
    pub fn reset(&mut self) {
        self.behavior.reset();
        self.state = NpcState::Normal;
        self.state_timer_ms = None;
        self.since_decision_ms = 0.0;
        self.decided_at = None;
        self.pending = None;
    }

    pub fn as_guard(&self) -> Option<&SecurityChase> {
        match &self.behavior {
            Behavior::SecurityChase(guard) => Some(guard),
            _ => None,
        }
    }

    pub fn as_guard_mut(&mut self) -> Option<&mut SecurityChase> {
        match &mut self.behavior {
            Behavior::SecurityChase(guard) => Some(guard),
            _ => None,
        }
    }

    pub fn as_child_mut(&mut self) -> Option<&mut EnergeticRandom> {
        match &mut self.behavior {
            Behavior::EnergeticRandom(child) => Some(child),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_approach_order_prefers_larger_gap() {
        let mut rng = SmallRng::seed_from_u64(1);
        let order = approach_order(IVec2::new(1, -4), false, &mut rng);
        assert_eq!(order.as_slice(), &[Direction::Up, Direction::Right]);

        let order = approach_order(IVec2::new(-3, 0), false, &mut rng);
        assert_eq!(order.as_slice(), &[Direction::Left]);

        assert!(approach_order(IVec2::ZERO, true, &mut rng).is_empty());
    }

    #[test]
    fn test_strict_ties_prefer_horizontal() {
        let mut rng = SmallRng::seed_from_u64(1);
        let order = approach_order(IVec2::new(2, 2), false, &mut rng);
        assert_eq!(order.as_slice(), &[Direction::Right, Direction::Down]);
    }

    #[test]
    fn test_decision_interval_accumulates() {
        let mut npc = Npc::new(Behavior::Wander(Wander::default()));
        assert!(!npc.wants_decision(1000.0, None));
        assert!(npc.wants_decision(300.0, None));
        assert!(!npc.wants_decision(16.0, None));
    }

    #[test]
    fn test_intersection_decides_once_per_arrival() {
        let mut npc = Npc::new(Behavior::RelentlessChase(RelentlessChase::default()));
        let cell = Some(IVec2::new(4, 4));
        assert!(npc.wants_decision(16.0, cell));
        assert!(!npc.wants_decision(16.0, cell));
        assert!(!npc.wants_decision(16.0, None));
        assert!(npc.wants_decision(16.0, cell));
    }
}
