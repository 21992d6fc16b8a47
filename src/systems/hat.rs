//! Hat throwing, pickups, theft and delivery.

use bevy_ecs::{
    entity::Entity,
    event::{EventReader, EventWriter},
    query::{With, Without},
    system::{Query, Res, ResMut, Single},
    world::World,
};
use glam::{IVec2, Vec2};
use rand::Rng;
use tracing::{debug, info};

use crate::{
    behavior::{Npc, NpcState},
    constants::{spawn, timing},
    entity::Archetype,
    events::{GameCommand, GameEvent, Side},
    hat::HatSlot,
    map::GridMap,
    movement::RailMovement,
    schedule::{RoundEpoch, ScheduledTasks, Task, TickCount},
    systems::{
        components::{DownvoteSlot, GameRng, PlayerControlled, Score},
        downvote,
        security::SecurityOrder,
    },
};

/// Pixel position of the paddle on `side`: inset from the court edge, at its vertical center.
///
/// Boards without a court throw from the middle of the board.
pub fn paddle_position(map: &GridMap, side: Side) -> Vec2 {
    match map.special_zone_bounds() {
        Some(court) => {
            let x = match side {
                Side::Left => court.min.x + spawn::PADDLE_INSET,
                Side::Right => court.max.x - spawn::PADDLE_INSET,
            };
            Vec2::new(x, court.center().y)
        }
        None => map.grid_to_world(IVec2::new(map.width() / 2, map.height() / 2)),
    }
}

/// A random reachable floor tile, or the player start if none turns up.
pub fn choose_landing<R: Rng + ?Sized>(map: &GridMap, rng: &mut R) -> IVec2 {
    for _ in 0..spawn::HAT_LANDING_ATTEMPTS {
        let cell = IVec2::new(rng.random_range(0..map.width()), rng.random_range(0..map.height()));
        if map.is_landing_tile(cell) {
            return cell;
        }
    }
    debug!("No landing tile found, falling back to the player start");
    map.player_start()
}

/// Throws a hat from the scoring paddle whenever the Pong minigame scores.
#[allow(clippy::too_many_arguments)]
pub fn pong_system(
    mut commands: EventReader<GameCommand>,
    map: Res<GridMap>,
    clock: Res<TickCount>,
    epoch: Res<RoundEpoch>,
    mut slot: ResMut<HatSlot>,
    mut tasks: ResMut<ScheduledTasks>,
    mut rng: ResMut<GameRng>,
    mut events: EventWriter<GameEvent>,
) {
    for command in commands.read() {
        let GameCommand::PongScore(side) = *command else {
            continue;
        };
        events.write(GameEvent::PongScore { side });

        let from = paddle_position(&map, side);
        let landing = choose_landing(&map, &mut rng.0);
        if !slot.throw(from, landing) {
            continue;
        }

        info!(side = side.as_ref(), ?landing, "Hat thrown");
        tasks.schedule(
            clock.0,
            timing::HAT_THROW_DELAY_MS + timing::HAT_FLIGHT_MS,
            *epoch,
            Task::LandHat,
        );
        events.write(GameEvent::HatThrown { side, landing });
    }
}

/// Brings the thrown hat down and sends every child after it.
pub fn land_hat(world: &mut World) {
    let Some(cell) = world.resource_mut::<HatSlot>().land() else {
        debug!("No hat in flight, landing skipped");
        return;
    };

    let mut npcs = world.query::<&mut Npc>();
    for mut npc in npcs.iter_mut(world) {
        if !npc.can_collect_hats() {
            continue;
        }
        npc.set_state(NpcState::Excited, Some(timing::EXCITED_MS));
        if let Some(child) = npc.as_child_mut() {
            child.set_target(cell);
        }
    }

    world.send_event(GameEvent::HatLanded { cell });
}

/// Steals first, then ground pickups. A steal in a tick rules out a pickup in the same tick.
///
/// Only the player steals. Taking the hat off a child raises the alarm.
#[allow(clippy::too_many_arguments)]
pub fn hat_interaction_system(
    map: Res<GridMap>,
    mut slot: ResMut<HatSlot>,
    mut score: ResMut<Score>,
    player: Single<(Entity, &RailMovement), With<PlayerControlled>>,
    mut npcs: Query<(Entity, &Archetype, &mut Npc, &RailMovement), Without<PlayerControlled>>,
    mut orders: EventWriter<SecurityOrder>,
    mut events: EventWriter<GameEvent>,
) {
    let (player_entity, player_rail) = *player;
    let player_cell = player_rail.current_cell(&map);

    if let Some(wearer) = slot.wearer().filter(|wearer| *wearer != player_entity) {
        let Ok((_, archetype, _, rail)) = npcs.get(wearer) else {
            debug!(?wearer, "Hat wearer is gone, clearing the hat");
            slot.clear();
            return;
        };
        let archetype = *archetype;
        if let Some(steal) = slot.steal(player_entity, player_cell, rail.current_cell(&map)) {
            score.0 += steal.points;
            info!(victim = ?steal.victim, archetype = archetype.as_ref(), points = steal.points, "Player stole the hat");
            events.write(GameEvent::HatStolen {
                by: player_entity,
                from: steal.victim,
                points: steal.points,
            });
            if archetype == Archetype::Child {
                orders.write(SecurityOrder::Dispatch);
            }
        }
        return;
    }

    if slot.ground_cell().is_none() {
        return;
    }

    if let Some(points) = slot.collect(player_entity, player_cell, true) {
        score.0 += points;
        events.write(GameEvent::HatCollected {
            by: player_entity,
            points,
        });
        return;
    }

    for (entity, _, mut npc, rail) in npcs.iter_mut() {
        let can_collect = npc.can_collect_hats();
        if let Some(points) = slot.collect(entity, rail.current_cell(&map), can_collect) {
            if let Some(child) = npc.as_child_mut() {
                child.clear_target();
            }
            events.write(GameEvent::HatCollected { by: entity, points });
            break;
        }
    }
}

/// Hands the hat to the wife when the player wearing it reaches her.
#[allow(clippy::too_many_arguments)]
pub fn hat_delivery_system(
    map: Res<GridMap>,
    clock: Res<TickCount>,
    epoch: Res<RoundEpoch>,
    mut slot: ResMut<HatSlot>,
    mut score: ResMut<Score>,
    mut tasks: ResMut<ScheduledTasks>,
    player: Single<(Entity, &RailMovement), With<PlayerControlled>>,
    wives: Query<(&Archetype, &RailMovement), Without<PlayerControlled>>,
    downvotes: Query<(Entity, &DownvoteSlot)>,
    mut orders: EventWriter<SecurityOrder>,
    mut events: EventWriter<GameEvent>,
) {
    let (player_entity, player_rail) = *player;
    if !slot.is_worn_by(player_entity) {
        return;
    }

    let player_cell = player_rail.current_cell(&map);
    let Some(wife_cell) = wives
        .iter()
        .find(|(archetype, _)| **archetype == Archetype::Wife)
        .map(|(_, rail)| rail.current_cell(&map))
    else {
        return;
    };

    let Some(delivery) = slot.deliver(player_entity, player_cell, wife_cell) else {
        return;
    };

    score.0 += delivery.points;
    info!(points = delivery.points, was_stolen = delivery.was_stolen, "Hat delivered");
    events.write(GameEvent::HatDelivered {
        points: delivery.points,
        was_stolen: delivery.was_stolen,
    });
    orders.write(SecurityOrder::StandDown);

    if delivery.was_stolen {
        let pool: Vec<_> = downvotes.iter().map(|(entity, slot)| (entity, *slot)).collect();
        downvote::schedule_downvote_batch(&map, &pool, clock.0, *epoch, &mut tasks);
    }
}
