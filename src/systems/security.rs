//! Guard dispatch, withdrawal and capture.

use bevy_ecs::{
    entity::Entity,
    event::{Event, EventReader, EventWriter},
    query::{With, Without},
    system::{Query, Res, ResMut, Single},
};
use glam::IVec2;
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::{
    behavior::{GuardSignal, Npc, NpcState},
    constants::{messages, timing},
    entity::StartCell,
    events::{DeathCause, GameEvent},
    hat::HatSlot,
    map::{direction::Direction, GridMap},
    movement::RailMovement,
    systems::{
        components::{DeltaTime, GameRng, GuardSlot, PlayerControlled},
        stage::PlayerKilled,
    },
};

/// Requests raised by hat interactions for the guard pool.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityOrder {
    /// A hat was taken from a child: send in the next guard.
    Dispatch,
    /// The hat reached the wife: every guard heads for the exit.
    StandDown,
}

/// Active guards, for escalation messages.
pub fn count_active_guards<'a>(guards: impl Iterator<Item = &'a Npc>) -> usize {
    guards
        .filter_map(Npc::as_guard)
        .filter(|guard| guard.is_active())
        .count()
}

/// Off-board entry cell and inward heading for a guard entering on `row`.
pub fn entry_for(map: &GridMap, row: i32, from_left: bool) -> (IVec2, Direction) {
    if from_left {
        (IVec2::new(-1, row), Direction::Right)
    } else {
        (IVec2::new(map.width(), row), Direction::Left)
    }
}

/// Carries out dispatch and stand-down orders.
pub fn security_dispatch_system(
    mut orders: EventReader<SecurityOrder>,
    map: Res<GridMap>,
    mut rng: ResMut<GameRng>,
    mut guards: Query<(Entity, &GuardSlot, &mut Npc, &mut RailMovement)>,
    mut events: EventWriter<GameEvent>,
) {
    for order in orders.read() {
        match order {
            SecurityOrder::Dispatch => {
                let mut idle: Vec<_> = guards
                    .iter()
                    .filter(|(_, _, npc, _)| npc.as_guard().is_some_and(|guard| !guard.is_visible()))
                    .map(|(entity, slot, _, _)| (*slot, entity))
                    .collect();
                idle.sort();
                let Some((slot, entity)) = idle.first().copied() else {
                    warn!("Guard pool exhausted, dispatch ignored");
                    continue;
                };
                let Some(row) = map.wrap_rows().choose(&mut rng.0).copied() else {
                    warn!("No tunnel row to enter through, dispatch ignored");
                    continue;
                };
                let (entry, heading) = entry_for(&map, row, rng.0.random_bool(0.5));

                {
                    let Ok((_, _, mut npc, mut rail)) = guards.get_mut(entity) else {
                        continue;
                    };
                    if let Some(guard) = npc.as_guard_mut() {
                        guard.activate(entry);
                    }
                    npc.set_state(NpcState::Special, None);
                    rail.place(&map, entry);
                    rail.start_moving(&map, heading);
                }

                let active = count_active_guards(guards.iter().map(|(_, _, npc, _)| npc));
                info!(slot = slot.0, ?entry, active, "Security guard dispatched");
                events.write(GameEvent::SecurityGuardSpawned { guard: entity, active });
                events.write(GameEvent::Announcement {
                    text: messages::security_alert(active),
                    duration_ms: timing::ANNOUNCEMENT_MS,
                });
            }
            SecurityOrder::StandDown => {
                for (entity, _, mut npc, _) in guards.iter_mut() {
                    let leaving = npc.as_guard_mut().is_some_and(|guard| guard.deactivate());
                    if leaving {
                        npc.set_state(NpcState::Normal, None);
                        debug!(?entity, "Guard standing down");
                    }
                }
            }
        }
    }
}

/// Follows guards through entry and exit, and sends them home once off the board.
///
/// A guard whose thief no longer wears the hat leaves on its own.
pub fn guard_system(
    map: Res<GridMap>,
    slot: Res<HatSlot>,
    dt: Res<DeltaTime>,
    player: Single<Entity, With<PlayerControlled>>,
    mut guards: Query<(Entity, &StartCell, &mut Npc, &mut RailMovement), (With<GuardSlot>, Without<PlayerControlled>)>,
    mut events: EventWriter<GameEvent>,
) {
    let thief_has_hat = slot.is_worn_by(*player);

    for (entity, start, mut npc, mut rail) in guards.iter_mut() {
        let cell = rail.current_cell(&map);
        let Some(guard) = npc.as_guard_mut() else {
            continue;
        };

        if guard.is_active() && !thief_has_hat && guard.deactivate() {
            debug!(?entity, "Thief lost the hat, guard leaving");
            npc.set_state(NpcState::Normal, None);
            continue;
        }

        let Some(signal) = guard.observe(&map, cell, dt.0) else {
            continue;
        };
        match signal {
            GuardSignal::Arrived => {}
            GuardSignal::Left | GuardSignal::TimedOut => {
                npc.reset();
                rail.place(&map, start.0);
                rail.freeze();
                info!(?entity, ?signal, "Security guard left");
                events.write(GameEvent::SecurityGuardLeft { guard: entity });
            }
        }
    }
}

/// Ends the round when a chasing guard reaches the player while the stolen hat is on their head.
pub fn capture_system(
    map: Res<GridMap>,
    slot: Res<HatSlot>,
    player: Single<(Entity, &RailMovement), With<PlayerControlled>>,
    guards: Query<(&Npc, &RailMovement), (With<GuardSlot>, Without<PlayerControlled>)>,
    mut kills: EventWriter<PlayerKilled>,
) {
    let (player_entity, player_rail) = *player;
    if !slot.is_worn_by(player_entity) {
        return;
    }

    let player_cell = player_rail.current_cell(&map);
    let caught = guards.iter().any(|(npc, rail)| {
        npc.as_guard()
            .is_some_and(|guard| guard.can_catch(rail.current_cell(&map), player_cell))
    });
    if caught {
        info!("Player captured by security");
        kills.write(PlayerKilled(DeathCause::Captured));
    }
}
