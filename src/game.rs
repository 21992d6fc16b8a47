//! The headless game: an ECS world, the per-tick schedule, and the cast of actors.

use bevy_ecs::{
    entity::Entity,
    event::{EventRegistry, Events},
    query::With,
    schedule::{ExecutorKind, IntoScheduleConfigs, Schedule, SystemSet},
    world::World,
};
use glam::IVec2;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::{
    behavior::{Behavior, Npc},
    config::GameConfig,
    constants::{messages, spawn, speed, RAW_BOARD, TICK_MS},
    entity::{ActorName, Archetype, StartCell},
    error::{GameError, GameResult},
    events::{GameCommand, GameEvent},
    hat::{Hat, HatSlot},
    map::GridMap,
    movement::RailMovement,
    schedule::{RoundEpoch, ScheduledTasks, TickCount},
    systems::{
        components::{
            DeltaTime, DownvoteSlot, GameRng, GuardSlot, HighScore, LevelState, MapTemplate, PlayerControlled, PlayerLives,
            PlayerStatus, Score,
        },
        downvote::downvote_kill_system,
        hat::{hat_delivery_system, hat_interaction_system, pong_system},
        npc::npc_system,
        player::player_movement_system,
        security::{capture_system, guard_system, security_dispatch_system, SecurityOrder},
        stage::{
            clock_system, command_system, death_system, high_score_system, is_playing, is_running, level_complete_system,
            manage_pause_state_system, pause_system, stage_system, task_system, GameStage, PauseState, PlayerKilled,
        },
    },
};

/// Ordering of the per-tick systems.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
enum GameplaySet {
    /// Pausing, which must work while paused.
    Input,
    /// Clock, commands, deferred tasks and the stage countdown.
    Orchestrate,
    /// Movement and interactions, only while playing.
    Update,
    /// Deaths, level completion and bookkeeping.
    Respond,
}

/// Core game state built on the Bevy ECS.
///
/// `world` holds the actors and every shared resource; `schedule` runs one tick.
pub struct Game {
    pub world: World,
    pub schedule: Schedule,
    player: Entity,
}

impl Game {
    /// Builds a game on the standard board.
    pub fn new(config: GameConfig) -> GameResult<Game> {
        Self::with_board(config, &RAW_BOARD)
    }

    /// Builds a game on a custom board.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] if the configuration is invalid or the board fails to parse.
    pub fn with_board(config: GameConfig, board: &[&str]) -> GameResult<Game> {
        config.validate()?;
        let map = GridMap::new(board)?;
        info!(
            width = map.width(),
            height = map.height(),
            seed = ?config.seed,
            "Starting game initialization"
        );

        let mut world = World::default();
        EventRegistry::register_event::<GameCommand>(&mut world);
        EventRegistry::register_event::<GameEvent>(&mut world);
        EventRegistry::register_event::<PlayerKilled>(&mut world);
        EventRegistry::register_event::<SecurityOrder>(&mut world);

        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        let player = Self::spawn_cast(&mut world, &map, &config, &mut rng)?;

        world.insert_resource(MapTemplate(map.clone()));
        world.insert_resource(map);
        world.insert_resource(HatSlot::default());
        world.insert_resource(ScheduledTasks::default());
        world.insert_resource(RoundEpoch::default());
        world.insert_resource(TickCount::default());
        world.insert_resource(GameStage::starting(config.ready_ms));
        world.insert_resource(PauseState::default());
        world.insert_resource(Score::default());
        world.insert_resource(HighScore(config.high_score));
        world.insert_resource(PlayerLives(config.starting_lives));
        world.insert_resource(LevelState::default());
        world.insert_resource(GameRng(rng));
        world.insert_resource(DeltaTime(TICK_MS));
        world.send_event(GameEvent::Announcement {
            text: messages::READY,
            duration_ms: config.ready_ms,
        });
        world.insert_resource(config);

        let mut schedule = Schedule::default();
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        Self::configure_schedule(&mut schedule);

        Ok(Game { world, schedule, player })
    }

    fn configure_schedule(schedule: &mut Schedule) {
        schedule
            .add_systems((
                pause_system.in_set(GameplaySet::Input),
                (clock_system, command_system, task_system, stage_system)
                    .chain()
                    .in_set(GameplaySet::Orchestrate),
                (
                    player_movement_system,
                    npc_system,
                    guard_system,
                    pong_system,
                    hat_interaction_system,
                    hat_delivery_system,
                    security_dispatch_system,
                    capture_system,
                    downvote_kill_system,
                )
                    .chain()
                    .in_set(GameplaySet::Update),
                (death_system, level_complete_system, high_score_system)
                    .chain()
                    .in_set(GameplaySet::Respond),
                manage_pause_state_system.after(GameplaySet::Respond),
            ))
            .configure_sets(
                (
                    GameplaySet::Input,
                    GameplaySet::Orchestrate.run_if(is_running),
                    GameplaySet::Update.run_if(is_running).run_if(is_playing),
                    GameplaySet::Respond.run_if(is_running),
                )
                    .chain(),
            );
    }

    /// Spawns the player, the wife, the children and the guard and downvote pools.
    fn spawn_cast(world: &mut World, map: &GridMap, config: &GameConfig, rng: &mut SmallRng) -> GameResult<Entity> {
        let start = map.player_start();
        let player = world
            .spawn((
                PlayerControlled,
                PlayerStatus::default(),
                RailMovement::new(map, start, speed::PLAYER),
                Archetype::Player,
                ActorName("player".to_string()),
                StartCell(start),
            ))
            .id();

        let mut spawn_npc = |world: &mut World, archetype: Archetype, name: String, cell: IVec2| -> GameResult<Entity> {
            let behavior = Behavior::for_archetype(archetype, rng)
                .ok_or_else(|| GameError::InvalidState(format!("{archetype} has no behavior")))?;
            let npc = Npc::new(behavior);
            let rail = RailMovement::new(map, cell, npc.movement_speed());
            Ok(world.spawn((npc, rail, archetype, ActorName(name), StartCell(cell))).id())
        };

        spawn_npc(world, Archetype::Wife, "wife".to_string(), home_cell(map, spawn::WIFE))?;
        for (i, cell) in spawn::CHILDREN.into_iter().enumerate() {
            spawn_npc(world, Archetype::Child, format!("child_{i}"), home_cell(map, cell))?;
        }

        let waiting = IVec2::new(-1, map.wrap_rows().first().copied().unwrap_or(0));
        for i in 0..config.guard_pool_size {
            let guard = spawn_npc(world, Archetype::SecurityGuard, format!("security_{i}"), waiting)?;
            let mut entity = world.entity_mut(guard);
            entity.insert(GuardSlot(i));
            if let Some(mut rail) = entity.get_mut::<RailMovement>() {
                rail.freeze();
            }
        }

        for i in 0..config.downvote_pool_size {
            let (archetype, name) = if i % 2 == 0 {
                (Archetype::YelpDownvote, format!("yelp_{i}"))
            } else {
                (Archetype::GoogleDownvote, format!("google_{i}"))
            };
            let downvote = spawn_npc(world, archetype, name, start)?;
            world.entity_mut(downvote).insert(DownvoteSlot { index: i, active: false });
        }

        debug!(
            guards = config.guard_pool_size,
            downvotes = config.downvote_pool_size,
            "Cast spawned"
        );
        Ok(player)
    }

    /// Queues a command for the next tick.
    pub fn send(&mut self, command: GameCommand) {
        self.world.send_event(command);
    }

    /// Runs one simulation tick and returns the events it produced, in order.
    pub fn tick(&mut self) -> Vec<GameEvent> {
        self.schedule.run(&mut self.world);

        self.world.resource_mut::<Events<GameCommand>>().update();
        self.world.resource_mut::<Events<PlayerKilled>>().update();
        self.world.resource_mut::<Events<SecurityOrder>>().update();
        self.world.resource_mut::<Events<GameEvent>>().drain().collect()
    }

    /// Runs `ticks` ticks, collecting every event.
    pub fn run_ticks(&mut self, ticks: u32) -> Vec<GameEvent> {
        (0..ticks).flat_map(|_| self.tick()).collect()
    }

    pub fn player(&self) -> Entity {
        self.player
    }

    pub fn stage(&self) -> GameStage {
        *self.world.resource::<GameStage>()
    }

    pub fn pause_state(&self) -> PauseState {
        *self.world.resource::<PauseState>()
    }

    pub fn score(&self) -> u32 {
        self.world.resource::<Score>().0
    }

    pub fn high_score(&self) -> u32 {
        self.world.resource::<HighScore>().0
    }

    pub fn lives(&self) -> u8 {
        self.world.resource::<PlayerLives>().0
    }

    pub fn level(&self) -> LevelState {
        *self.world.resource::<LevelState>()
    }

    pub fn tick_count(&self) -> u64 {
        self.world.resource::<TickCount>().0
    }

    pub fn map(&self) -> &GridMap {
        self.world.resource::<GridMap>()
    }

    pub fn hat(&self) -> Option<Hat> {
        self.world.resource::<HatSlot>().hat().copied()
    }

    pub fn rail(&self, entity: Entity) -> Option<&RailMovement> {
        self.world.get::<RailMovement>(entity)
    }

    pub fn npc(&self, entity: Entity) -> Option<&Npc> {
        self.world.get::<Npc>(entity)
    }

    /// Every actor of `archetype`, in spawn order.
    pub fn entities(&mut self, archetype: Archetype) -> Vec<Entity> {
        let mut query = self.world.query::<(Entity, &Archetype)>();
        let mut found: Vec<Entity> = query
            .iter(&self.world)
            .filter(|(_, kind)| **kind == archetype)
            .map(|(entity, _)| entity)
            .collect();
        found.sort();
        found
    }

    /// The first actor of `archetype`.
    pub fn entity(&mut self, archetype: Archetype) -> Option<Entity> {
        self.entities(archetype).first().copied()
    }

    /// Number of downvotes on the board.
    pub fn active_downvotes(&mut self) -> usize {
        let mut query = self.world.query::<&DownvoteSlot>();
        query.iter(&self.world).filter(|slot| slot.active).count()
    }

    /// Number of guards entering or chasing.
    pub fn active_guards(&mut self) -> usize {
        let mut query = self.world.query_filtered::<&Npc, With<GuardSlot>>();
        crate::systems::security::count_active_guards(query.iter(&self.world))
    }
}

/// `preferred` if the player can reach it, otherwise the player start.
fn home_cell(map: &GridMap, preferred: IVec2) -> IVec2 {
    if map.is_reachable(preferred) && map.is_valid_move(preferred) {
        preferred
    } else {
        map.player_start()
    }
}
