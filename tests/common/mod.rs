#![allow(dead_code)]

use bevy_ecs::{
    entity::Entity,
    event::{EventRegistry, Events},
    world::World,
};
use capman::{
    behavior::{Behavior, Npc},
    config::GameConfig,
    constants::{RAW_BOARD, TICK_MS},
    entity::{ActorName, Archetype, StartCell},
    events::{GameCommand, GameEvent},
    game::Game,
    hat::HatSlot,
    map::GridMap,
    movement::RailMovement,
    schedule::{RoundEpoch, ScheduledTasks, TickCount},
    systems::{
        DeltaTime, DownvoteSlot, GameRng, GameStage, GuardSlot, HighScore, LevelState, MapTemplate, PauseState, PlayerControlled,
        PlayerKilled, PlayerLives, PlayerStatus, Score, SecurityOrder,
    },
};
use glam::{IVec2, Vec2};
use rand::{rngs::SmallRng, SeedableRng};

pub const SEED: u64 = 42;

/// A small board with a tunnel row, a court and a sealed pocket.
///
/// ```text
///  0123456789
/// 0##########
/// 1#........#
/// 2#.##.~~#.#
/// 3 ...X....
/// 4#.##.##.##
/// 5#o......o#
/// 6##########
/// ```
pub const SMALL_BOARD: [&str; 7] = [
    "##########",
    "#........#",
    "#.##.~~#.#",
    " ...X.... ",
    "#.##.##.##",
    "#o......o#",
    "##########",
];

pub fn standard_map() -> GridMap {
    GridMap::new(&RAW_BOARD).unwrap()
}

pub fn small_map() -> GridMap {
    GridMap::new(&SMALL_BOARD).unwrap()
}

/// A world holding every resource the gameplay systems read, already in the playing stage.
pub fn create_test_world(map: GridMap) -> World {
    let mut world = World::new();
    EventRegistry::register_event::<GameCommand>(&mut world);
    EventRegistry::register_event::<GameEvent>(&mut world);
    EventRegistry::register_event::<PlayerKilled>(&mut world);
    EventRegistry::register_event::<SecurityOrder>(&mut world);

    world.insert_resource(MapTemplate(map.clone()));
    world.insert_resource(map);
    world.insert_resource(GameConfig::seeded(SEED));
    world.insert_resource(HatSlot::default());
    world.insert_resource(ScheduledTasks::default());
    world.insert_resource(RoundEpoch::default());
    world.insert_resource(TickCount::default());
    world.insert_resource(GameStage::Playing);
    world.insert_resource(PauseState::default());
    world.insert_resource(Score::default());
    world.insert_resource(HighScore::default());
    world.insert_resource(PlayerLives::default());
    world.insert_resource(LevelState::default());
    world.insert_resource(GameRng(SmallRng::seed_from_u64(SEED)));
    world.insert_resource(DeltaTime(TICK_MS));
    world
}

pub fn spawn_player(world: &mut World, cell: IVec2) -> Entity {
    let rail = RailMovement::new(world.resource::<GridMap>(), cell, 2.5);
    world
        .spawn((
            PlayerControlled,
            PlayerStatus::default(),
            rail,
            Archetype::Player,
            ActorName("player".to_string()),
            StartCell(cell),
        ))
        .id()
}

pub fn spawn_npc(world: &mut World, archetype: Archetype, cell: IVec2) -> Entity {
    let behavior = {
        let mut rng = world.resource_mut::<GameRng>();
        Behavior::for_archetype(archetype, &mut rng.0).unwrap()
    };
    let npc = Npc::new(behavior);
    let rail = RailMovement::new(world.resource::<GridMap>(), cell, npc.movement_speed());
    world
        .spawn((npc, rail, archetype, ActorName(archetype.to_string()), StartCell(cell)))
        .id()
}

/// An idle pooled guard waiting off the left edge of `row`.
pub fn spawn_guard(world: &mut World, slot: usize, row: i32) -> Entity {
    let guard = spawn_npc(world, Archetype::SecurityGuard, IVec2::new(-1, row));
    let mut entity = world.entity_mut(guard);
    entity.insert(GuardSlot(slot));
    entity.get_mut::<RailMovement>().unwrap().freeze();
    guard
}

pub fn spawn_downvote(world: &mut World, index: usize, archetype: Archetype, active: bool, cell: IVec2) -> Entity {
    let downvote = spawn_npc(world, archetype, cell);
    world.entity_mut(downvote).insert(DownvoteSlot { index, active });
    downvote
}

/// Teleports an entity's rail to `cell`, at rest.
pub fn place(world: &mut World, entity: Entity, cell: IVec2) {
    let map = world.resource::<GridMap>().clone();
    world.get_mut::<RailMovement>(entity).unwrap().place(&map, cell);
}

/// Puts a hat on the ground at `cell`.
pub fn land_hat_at(world: &mut World, cell: IVec2) {
    let mut slot = world.resource_mut::<HatSlot>();
    assert!(slot.throw(Vec2::ZERO, cell));
    assert_eq!(slot.land(), Some(cell));
}

pub fn drain_events(world: &mut World) -> Vec<GameEvent> {
    world.resource_mut::<Events<GameEvent>>().drain().collect()
}

pub fn drain_kills(world: &mut World) -> Vec<PlayerKilled> {
    world.resource_mut::<Events<PlayerKilled>>().drain().collect()
}

pub fn drain_orders(world: &mut World) -> Vec<SecurityOrder> {
    world.resource_mut::<Events<SecurityOrder>>().drain().collect()
}

/// A seeded game on the standard board with no READY! countdown.
pub fn seeded_game() -> Game {
    Game::new(GameConfig::seeded(SEED)).unwrap()
}

/// Ticks until `predicate` holds for an emitted event, returning every event seen.
pub fn tick_until(game: &mut Game, max_ticks: u32, predicate: impl Fn(&GameEvent) -> bool) -> Option<Vec<GameEvent>> {
    let mut seen = Vec::new();
    for _ in 0..max_ticks {
        let events = game.tick();
        let found = events.iter().any(&predicate);
        seen.extend(events);
        if found {
            return Some(seen);
        }
    }
    None
}
