//! The single shared hat: thrown, picked up, stolen, and finally delivered.
//!
//! ```text
//! InFlight --land--> OnGround --collect--> Worn(a) --steal--> Worn(b) --deliver--> (gone)
//! ```
//!
//! Every transition checks its own preconditions and returns `None` when they do not
//! hold, leaving the hat untouched.

use bevy_ecs::entity::Entity;
use bevy_ecs::resource::Resource;
use glam::{IVec2, Vec2};
use tracing::{debug, warn};

use crate::constants::score;
use crate::entity::touching;

/// Where the hat currently is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HatState {
    /// Thrown from `from` (pixels), not yet collectible.
    InFlight { from: Vec2, landing: IVec2 },
    OnGround(IVec2),
    Worn(Entity),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hat {
    pub state: HatState,
    /// Set by the first steal, never cleared.
    pub was_stolen: bool,
    /// Base value of a ground pickup.
    pub points: u32,
}

/// Result of a successful steal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Steal {
    pub victim: Entity,
    pub points: u32,
}

/// Result of a successful delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub was_stolen: bool,
    pub points: u32,
}

/// Holder for the at-most-one hat in play.
#[derive(Resource, Debug, Default, Clone)]
pub struct HatSlot {
    hat: Option<Hat>,
}

impl HatSlot {
    pub fn hat(&self) -> Option<&Hat> {
        self.hat.as_ref()
    }

    pub fn is_occupied(&self) -> bool {
        self.hat.is_some()
    }

    /// Throws a new hat toward `landing`. Refused while a hat already exists.
    pub fn throw(&mut self, from: Vec2, landing: IVec2) -> bool {
        if let Some(existing) = &self.hat {
            warn!(state = ?existing.state, "Hat spawn refused, one is already in play");
            return false;
        }

        debug!(?from, ?landing, "Hat thrown");
        self.hat = Some(Hat {
            state: HatState::InFlight { from, landing },
            was_stolen: false,
            points: score::HAT,
        });
        true
    }

    /// Lands an in-flight hat, returning where it came down.
    pub fn land(&mut self) -> Option<IVec2> {
        let hat = self.hat.as_mut()?;
        let HatState::InFlight { landing, .. } = hat.state else {
            return None;
        };
        hat.state = HatState::OnGround(landing);
        debug!(cell = ?landing, "Hat landed");
        Some(landing)
    }

    pub fn ground_cell(&self) -> Option<IVec2> {
        match self.hat?.state {
            HatState::OnGround(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn wearer(&self) -> Option<Entity> {
        match self.hat?.state {
            HatState::Worn(wearer) => Some(wearer),
            _ => None,
        }
    }

    pub fn is_worn_by(&self, entity: Entity) -> bool {
        self.wearer() == Some(entity)
    }

    /// Picks the hat up off the ground. Returns the points earned.
    pub fn collect(&mut self, collector: Entity, collector_cell: IVec2, can_collect: bool) -> Option<u32> {
        let hat = self.hat.as_mut()?;
        let HatState::OnGround(cell) = hat.state else {
            return None;
        };
        if !can_collect || !touching(collector_cell, cell) {
            return None;
        }

        hat.state = HatState::Worn(collector);
        debug!(?collector, ?cell, "Hat collected");
        Some(hat.points)
    }

    /// Takes the hat from its wearer. The two must be touching.
    pub fn steal(&mut self, thief: Entity, thief_cell: IVec2, wearer_cell: IVec2) -> Option<Steal> {
        let hat = self.hat.as_mut()?;
        let HatState::Worn(victim) = hat.state else {
            return None;
        };
        if victim == thief || !touching(thief_cell, wearer_cell) {
            return None;
        }

        hat.state = HatState::Worn(thief);
        hat.was_stolen = true;
        debug!(?thief, ?victim, "Hat stolen");
        Some(Steal {
            victim,
            points: hat.points * score::STEAL_MULTIPLIER,
        })
    }

    /// Hands the hat over to the wife, removing it from play.
    ///
    /// Only succeeds when `player` wears it and stands next to the wife.
    pub fn deliver(&mut self, player: Entity, player_cell: IVec2, wife_cell: IVec2) -> Option<Delivery> {
        if !self.is_worn_by(player) || !touching(player_cell, wife_cell) {
            return None;
        }

        let hat = self.hat.take()?;
        debug!(was_stolen = hat.was_stolen, "Hat delivered");
        Some(Delivery {
            was_stolen: hat.was_stolen,
            points: score::DELIVERY_BONUS,
        })
    }

    /// Removes any hat, whatever its state.
    pub fn clear(&mut self) {
        self.hat = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    fn landed_slot(cell: IVec2) -> HatSlot {
        let mut slot = HatSlot::default();
        assert!(slot.throw(Vec2::ZERO, cell));
        assert_eq!(slot.land(), Some(cell));
        slot
    }

    #[test]
    fn test_in_flight_hat_is_not_collectible() {
        let mut world = World::new();
        let child = world.spawn_empty().id();
        let mut slot = HatSlot::default();
        slot.throw(Vec2::ZERO, IVec2::new(3, 3));
        assert_eq!(slot.collect(child, IVec2::new(3, 3), true), None);
        assert_eq!(slot.land(), Some(IVec2::new(3, 3)));
        assert_eq!(slot.land(), None);
    }

    #[test]
    fn test_collect_requires_permission_and_adjacency() {
        let mut world = World::new();
        let child = world.spawn_empty().id();
        let mut slot = landed_slot(IVec2::new(5, 5));

        assert_eq!(slot.collect(child, IVec2::new(5, 5), false), None);
        assert_eq!(slot.collect(child, IVec2::new(7, 5), true), None);
        assert_eq!(slot.collect(child, IVec2::new(6, 6), true), Some(100));
        assert!(slot.is_worn_by(child));
    }

    #[test]
    fn test_steal_then_deliver() {
        let mut world = World::new();
        let child = world.spawn_empty().id();
        let player = world.spawn_empty().id();
        let mut slot = landed_slot(IVec2::new(5, 5));
        slot.collect(child, IVec2::new(5, 5), true);

        assert_eq!(slot.steal(child, IVec2::new(5, 5), IVec2::new(5, 5)), None);
        assert_eq!(slot.steal(player, IVec2::new(8, 5), IVec2::new(5, 5)), None);
        assert_eq!(
            slot.steal(player, IVec2::new(4, 5), IVec2::new(5, 5)),
            Some(Steal { victim: child, points: 200 })
        );

        assert_eq!(slot.deliver(player, IVec2::new(1, 1), IVec2::new(9, 9)), None);
        assert_eq!(
            slot.deliver(player, IVec2::new(1, 1), IVec2::new(2, 2)),
            Some(Delivery { was_stolen: true, points: 500 })
        );
        assert!(!slot.is_occupied());
    }

    #[test]
    fn test_second_throw_is_refused() {
        let mut slot = HatSlot::default();
        assert!(slot.throw(Vec2::ZERO, IVec2::ONE));
        assert!(!slot.throw(Vec2::ONE, IVec2::new(2, 2)));
        assert_eq!(
            slot.hat().map(|hat| hat.state),
            Some(HatState::InFlight { from: Vec2::ZERO, landing: IVec2::ONE })
        );
    }
}
