//! Downvote escalation after a stolen hat is delivered.

use bevy_ecs::{
    entity::Entity,
    event::EventWriter,
    query::With,
    system::{Query, Res, Single},
    world::World,
};
use glam::IVec2;
use tracing::{debug, info};

use crate::{
    behavior::Npc,
    constants::{messages, spawn, timing},
    events::{DeathCause, GameEvent},
    map::{direction::Direction, GridMap},
    movement::RailMovement,
    schedule::{RoundEpoch, ScheduledTasks, Task},
    systems::{
        components::{DownvoteSlot, PlayerControlled},
        stage::PlayerKilled,
    },
};

/// Downvotes brought in by one delivery of a stolen hat.
pub const BATCH_SIZE: usize = 2;

/// Candidate cells downvotes may appear on in this map.
pub fn spawn_candidates(map: &GridMap) -> Vec<IVec2> {
    spawn::DOWNVOTE_CANDIDATES
        .into_iter()
        .filter(|cell| map.is_valid_move(*cell) && map.is_reachable(*cell))
        .collect()
}

/// Schedules up to [`BATCH_SIZE`] idle downvotes, staggered, each with its spawn cell.
///
/// Returns how many were scheduled.
pub fn schedule_downvote_batch(
    map: &GridMap,
    pool: &[(Entity, DownvoteSlot)],
    now: u64,
    epoch: RoundEpoch,
    tasks: &mut ScheduledTasks,
) -> usize {
    let candidates = spawn_candidates(map);
    if candidates.is_empty() {
        debug!("No legal downvote spawn cells");
        return 0;
    }

    let active = pool.iter().filter(|(_, slot)| slot.active).count();
    let mut idle: Vec<_> = pool.iter().filter(|(_, slot)| !slot.active).copied().collect();
    idle.sort_by_key(|(_, slot)| slot.index);

    let count = idle.len().min(BATCH_SIZE);
    for (i, (downvote, _)) in idle.into_iter().take(count).enumerate() {
        let cell = candidates[(active + i) % candidates.len()];
        tasks.schedule(
            now,
            timing::DOWNVOTE_STAGGER_MS * i as u32,
            epoch,
            Task::SpawnDownvote { downvote, cell },
        );
    }
    debug!(count, active, "Downvote batch scheduled");
    count
}

/// Puts a pooled downvote on the board at `cell`, heading for the player.
pub fn activate_downvote(world: &mut World, downvote: Entity, cell: IVec2) {
    let map = world.resource::<GridMap>().clone();
    let player_cell = {
        let mut players = world.query_filtered::<&RailMovement, With<PlayerControlled>>();
        match players.iter(world).next() {
            Some(rail) => rail.current_cell(&map),
            None => map.player_start(),
        }
    };

    let Ok(mut entity) = world.get_entity_mut(downvote) else {
        debug!(?downvote, "Downvote vanished before spawning");
        return;
    };
    let Some(mut slot) = entity.get_mut::<DownvoteSlot>() else {
        return;
    };
    if slot.active {
        debug!(?downvote, "Downvote already active");
        return;
    }
    slot.active = true;

    if let Some(mut npc) = entity.get_mut::<Npc>() {
        npc.reset();
    }
    if let Some(mut rail) = entity.get_mut::<RailMovement>() {
        rail.place(&map, cell);
        if let Some(heading) = heading_toward(cell, player_cell) {
            rail.start_moving(&map, heading);
        }
    }

    let mut slots = world.query::<&DownvoteSlot>();
    let active = slots.iter(world).filter(|slot| slot.active).count();
    info!(?downvote, ?cell, active, "Downvote spawned");
    world.send_event(GameEvent::DownvoteSpawned { downvote, active });
    world.send_event(GameEvent::Announcement {
        text: messages::downvote_alert(active),
        duration_ms: timing::ANNOUNCEMENT_MS,
    });
}

/// Initial heading along the axis with the larger gap.
fn heading_toward(from: IVec2, to: IVec2) -> Option<Direction> {
    let delta = to - from;
    if delta.x.abs() >= delta.y.abs() {
        Direction::horizontal_toward(delta.x).or_else(|| Direction::vertical_toward(delta.y))
    } else {
        Direction::vertical_toward(delta.y)
    }
}

/// Any active downvote touching the player kills them.
pub fn downvote_kill_system(
    map: Res<GridMap>,
    player: Single<&RailMovement, With<PlayerControlled>>,
    downvotes: Query<(&DownvoteSlot, &RailMovement)>,
    mut kills: EventWriter<PlayerKilled>,
) {
    let player_cell = player.current_cell(&map);
    let hit = downvotes
        .iter()
        .any(|(slot, rail)| slot.active && crate::entity::touching(rail.current_cell(&map), player_cell));
    if hit {
        info!("Player downvoted");
        kills.write(PlayerKilled(DeathCause::Downvoted));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RAW_BOARD;

    fn pool(world: &mut World, active: &[bool]) -> Vec<(Entity, DownvoteSlot)> {
        active
            .iter()
            .enumerate()
            .map(|(index, active)| {
                (
                    world.spawn_empty().id(),
                    DownvoteSlot {
                        index,
                        active: *active,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_batch_is_capped_by_idle_slots() {
        let map = GridMap::new(&RAW_BOARD).unwrap();
        let mut world = World::new();
        let mut tasks = ScheduledTasks::default();

        let full = pool(&mut world, &[false, false, false, false]);
        assert_eq!(schedule_downvote_batch(&map, &full, 0, RoundEpoch::default(), &mut tasks), 2);

        let nearly_full = pool(&mut world, &[true, true, true, false]);
        assert_eq!(schedule_downvote_batch(&map, &nearly_full, 0, RoundEpoch::default(), &mut tasks), 1);

        let exhausted = pool(&mut world, &[true, true, true, true]);
        assert_eq!(schedule_downvote_batch(&map, &exhausted, 0, RoundEpoch::default(), &mut tasks), 0);
        assert_eq!(tasks.len(), 3);
    }

    #[test]
    fn test_spawns_are_staggered() {
        let map = GridMap::new(&RAW_BOARD).unwrap();
        let mut world = World::new();
        let mut tasks = ScheduledTasks::default();
        let idle = pool(&mut world, &[false, false]);
        schedule_downvote_batch(&map, &idle, 0, RoundEpoch::default(), &mut tasks);

        assert!(matches!(tasks.pop_due(0), Some((_, Task::SpawnDownvote { .. }))));
        assert_eq!(tasks.pop_due(89), None);
        assert!(matches!(tasks.pop_due(90), Some((_, Task::SpawnDownvote { .. }))));
    }

    #[test]
    fn test_heading_follows_larger_gap() {
        assert_eq!(heading_toward(IVec2::new(1, 9), IVec2::new(9, 15)), Some(Direction::Right));
        assert_eq!(heading_toward(IVec2::new(9, 3), IVec2::new(9, 15)), Some(Direction::Down));
        assert_eq!(heading_toward(IVec2::new(9, 3), IVec2::new(9, 3)), None);
    }
}
