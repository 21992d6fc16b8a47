//! Per-tick NPC update: timers, decisions, then movement.

use bevy_ecs::{
    query::{With, Without},
    system::{Query, Res, ResMut, Single},
};
use tracing::trace;

use crate::{
    behavior::{DecisionContext, Npc, PlayerView},
    entity::{Archetype, StartCell},
    map::GridMap,
    movement::RailMovement,
    systems::components::{DeltaTime, DownvoteSlot, GameRng, LevelState, PlayerControlled},
};

/// True if the NPC takes part in this tick at all.
///
/// Idle guards and pooled downvotes wait off-stage.
fn is_on_stage(npc: &Npc, downvote: Option<&DownvoteSlot>) -> bool {
    let guard_visible = npc.as_guard().is_none_or(|guard| guard.is_visible());
    let downvote_active = downvote.is_none_or(|slot| slot.active);
    guard_visible && downvote_active
}

/// Runs every on-stage NPC's strategy and moves it along the rails.
#[allow(clippy::type_complexity)]
pub fn npc_system(
    map: Res<GridMap>,
    dt: Res<DeltaTime>,
    level: Res<LevelState>,
    mut rng: ResMut<GameRng>,
    player: Single<&RailMovement, With<PlayerControlled>>,
    mut npcs: Query<
        (&Archetype, &StartCell, &mut Npc, &mut RailMovement, Option<&DownvoteSlot>),
        Without<PlayerControlled>,
    >,
) {
    let view = PlayerView {
        cell: player.current_cell(&map),
        direction: player.direction,
        moving: player.moving,
    };

    for (archetype, start, mut npc, mut rail, downvote) in npcs.iter_mut() {
        if !is_on_stage(&npc, downvote) || rail.frozen {
            continue;
        }

        let base = npc.movement_speed();
        rail.speed = if archetype.scales_with_level() {
            base * level.speed_multiplier
        } else {
            base
        };

        npc.tick(dt.0, &mut rng.0);

        let intersection = (rail.is_at_intersection(&map) || !rail.moving).then_some(rail.grid);
        if npc.wants_decision(dt.0, intersection) {
            let ctx = DecisionContext {
                map: &map,
                cell: rail.next_turn_cell(&map),
                facing: rail.facing,
                state: npc.state,
                home: start.0,
                player: view,
            };
            npc.decide(&ctx, &mut rng.0);
        }

        if let Some(direction) = npc.pending.take() {
            if rail.direction != Some(direction) {
                let turned = if rail.moving {
                    rail.request_direction(&map, direction)
                } else {
                    rail.start_moving(&map, direction)
                };
                trace!(archetype = archetype.as_ref(), ?direction, turned, "NPC heading requested");
            }
        }

        rail.advance(&map);
    }
}
