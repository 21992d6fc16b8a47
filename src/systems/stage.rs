//! Round orchestration: stages, pausing, deferred tasks, deaths and level changes.

use bevy_ecs::{
    event::{Event, EventReader, EventWriter},
    query::{With, Without},
    resource::Resource,
    system::{Query, Res, ResMut, Single},
    world::World,
};
use tracing::{debug, info};

use crate::{
    behavior::Npc,
    config::GameConfig,
    constants::{messages, ms_to_ticks},
    entity::{Archetype, StartCell},
    events::{DeathCause, GameCommand, GameEvent},
    hat::HatSlot,
    map::GridMap,
    movement::RailMovement,
    schedule::{RoundEpoch, ScheduledTasks, Task, TickCount},
    systems::{
        components::{DownvoteSlot, HighScore, LevelState, MapTemplate, PlayerControlled, PlayerLives, PlayerStatus, Score},
        downvote, hat,
    },
};

/// A resource to track the overall stage of the game from a high-level perspective.
#[derive(Resource, Debug, PartialEq, Eq, Clone, Copy)]
pub enum GameStage {
    /// READY! is shown and nothing moves.
    Starting { remaining_ticks: u32 },
    /// The main gameplay loop is active.
    Playing,
    /// The board was cleared; the next level is built when the pause ends.
    LevelComplete,
    /// Everything is frozen while the death sequence plays.
    PlayerDying { cause: DeathCause },
    /// Only a restart command does anything.
    GameOver,
}

impl GameStage {
    pub fn starting(ready_ms: u32) -> Self {
        GameStage::Starting {
            remaining_ticks: ms_to_ticks(ready_ms),
        }
    }
}

#[derive(Resource, Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum PauseState {
    #[default]
    Inactive,
    /// Paused. `Some(n)` lets `n` more ticks through before pausing again.
    Active { remaining_ticks: Option<u32> },
}

impl PauseState {
    /// True if simulation should be held this tick.
    pub fn active(&self) -> bool {
        matches!(
            self,
            PauseState::Active { remaining_ticks: None } | PauseState::Active { remaining_ticks: Some(0) }
        )
    }

    /// Uses up one stepped tick. Returns true once the steps run out.
    pub fn tick(&mut self) -> bool {
        match self {
            PauseState::Active {
                remaining_ticks: Some(ticks),
            } if *ticks > 0 => {
                *ticks -= 1;
                if *ticks == 0 {
                    *self = PauseState::Active { remaining_ticks: None };
                    return true;
                }
                false
            }
            _ => false,
        }
    }
}

/// Internal request to start a death sequence. Only the first one in a tick counts.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerKilled(pub DeathCause);

pub fn is_playing(stage: Res<GameStage>) -> bool {
    matches!(*stage, GameStage::Playing)
}

pub fn is_running(pause: Res<PauseState>) -> bool {
    !pause.active()
}

pub fn pause_system(mut commands: EventReader<GameCommand>, mut pause: ResMut<PauseState>) {
    for command in commands.read() {
        match command {
            GameCommand::TogglePause => {
                *pause = match *pause {
                    PauseState::Inactive => {
                        info!("Game paused");
                        PauseState::Active { remaining_ticks: None }
                    }
                    PauseState::Active { .. } => {
                        info!("Game resumed");
                        PauseState::Inactive
                    }
                };
            }
            GameCommand::SingleTick => {
                if *pause == (PauseState::Active { remaining_ticks: None }) {
                    *pause = PauseState::Active {
                        remaining_ticks: Some(1),
                    };
                }
            }
            _ => {}
        }
    }
}

/// Re-pauses after a single step has run.
pub fn manage_pause_state_system(mut pause: ResMut<PauseState>) {
    if pause.tick() {
        debug!("Single step finished");
    }
}

/// Advances the simulation clock. Only runs while unpaused.
pub fn clock_system(mut clock: ResMut<TickCount>) {
    clock.0 += 1;
    crate::formatter::set_tick(clock.0);
}

/// Routes player intents, kill requests and restarts.
#[allow(clippy::too_many_arguments)]
pub fn command_system(
    mut commands: EventReader<GameCommand>,
    stage: Res<GameStage>,
    map: Res<GridMap>,
    clock: Res<TickCount>,
    epoch: Res<RoundEpoch>,
    mut tasks: ResMut<ScheduledTasks>,
    mut kills: EventWriter<PlayerKilled>,
    mut player: Single<&mut RailMovement, With<PlayerControlled>>,
) {
    for command in commands.read() {
        match *command {
            GameCommand::MovePlayer(direction) => {
                if matches!(*stage, GameStage::Playing | GameStage::Starting { .. }) {
                    player.request_direction(&map, direction);
                }
            }
            GameCommand::KillPlayer => {
                if *stage == GameStage::Playing {
                    kills.write(PlayerKilled(DeathCause::Killed));
                }
            }
            GameCommand::Restart => {
                if *stage == GameStage::GameOver {
                    tasks.schedule(clock.0, 0, *epoch, Task::Restart);
                } else {
                    debug!(stage = ?*stage, "Restart ignored outside game over");
                }
            }
            GameCommand::TogglePause | GameCommand::SingleTick | GameCommand::PongScore(_) => {}
        }
    }
}

/// Runs every deferred task that has come due in the current round.
pub fn task_system(world: &mut World) {
    let now = world.resource::<TickCount>().0;
    loop {
        let epoch = *world.resource::<RoundEpoch>();
        let Some(task) = world.resource_mut::<ScheduledTasks>().pop_current(now, epoch) else {
            break;
        };
        debug!(?task, tick = now, "Running task");
        match task {
            Task::LandHat => hat::land_hat(world),
            Task::SpawnDownvote { downvote, cell } => downvote::activate_downvote(world, downvote, cell),
            Task::AdvanceLevel => advance_level(world),
            Task::ResolveDeath => resolve_death(world),
            Task::Restart => restart(world),
        }
    }
}

/// Counts down the READY! pause.
pub fn stage_system(mut stage: ResMut<GameStage>, level: Res<LevelState>, mut events: EventWriter<GameEvent>) {
    if let GameStage::Starting { remaining_ticks } = &mut *stage {
        if *remaining_ticks > 0 {
            *remaining_ticks -= 1;
        } else {
            *stage = GameStage::Playing;
            info!(level = level.level, "Round started");
            events.write(GameEvent::LevelStarted { level: level.level });
        }
    }
}

/// Starts the death sequence for the first kill request of the tick.
#[allow(clippy::too_many_arguments)]
pub fn death_system(
    mut kills: EventReader<PlayerKilled>,
    mut stage: ResMut<GameStage>,
    mut lives: ResMut<PlayerLives>,
    mut slot: ResMut<HatSlot>,
    mut tasks: ResMut<ScheduledTasks>,
    mut epoch: ResMut<RoundEpoch>,
    clock: Res<TickCount>,
    config: Res<GameConfig>,
    mut rails: Query<&mut RailMovement>,
    mut player: Single<&mut PlayerStatus, With<PlayerControlled>>,
    mut events: EventWriter<GameEvent>,
) {
    let Some(PlayerKilled(cause)) = kills.read().next().copied() else {
        return;
    };
    kills.clear();

    if *stage != GameStage::Playing {
        debug!(?cause, stage = ?*stage, "Kill ignored outside play");
        return;
    }

    for mut rail in rails.iter_mut() {
        rail.freeze();
    }
    lives.0 = lives.0.saturating_sub(1);
    player.is_dead = true;
    if cause == DeathCause::Captured {
        slot.clear();
    }

    *stage = GameStage::PlayerDying { cause };
    epoch.bump();
    let delay = if cause.is_quick() {
        config.capture_death_ms
    } else {
        config.death_ms
    };
    tasks.schedule(clock.0, delay, *epoch, Task::ResolveDeath);

    info!(cause = cause.as_ref(), lives_left = lives.0, "Player died");
    events.write(GameEvent::PlayerDied {
        cause,
        lives_left: lives.0,
    });
}

/// Ends the level once every dot and pellet is gone.
#[allow(clippy::too_many_arguments)]
pub fn level_complete_system(
    map: Res<GridMap>,
    level: Res<LevelState>,
    config: Res<GameConfig>,
    clock: Res<TickCount>,
    mut stage: ResMut<GameStage>,
    mut tasks: ResMut<ScheduledTasks>,
    mut epoch: ResMut<RoundEpoch>,
    mut rails: Query<&mut RailMovement>,
    mut events: EventWriter<GameEvent>,
) {
    if *stage != GameStage::Playing || map.remaining_count() > 0 {
        return;
    }

    for mut rail in rails.iter_mut() {
        rail.freeze();
    }
    *stage = GameStage::LevelComplete;
    epoch.bump();
    tasks.schedule(clock.0, config.level_transition_ms, *epoch, Task::AdvanceLevel);

    info!(level = level.level, "Level complete");
    events.write(GameEvent::LevelComplete { level: level.level });
    events.write(GameEvent::Announcement {
        text: messages::LEVEL_COMPLETE,
        duration_ms: config.level_transition_ms,
    });
}

pub fn high_score_system(score: Res<Score>, mut high_score: ResMut<HighScore>, mut events: EventWriter<GameEvent>) {
    if score.0 > high_score.0 {
        high_score.0 = score.0;
        events.write(GameEvent::HighScore { score: score.0 });
    }
}

/// How much of the cast a reset puts back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundReset {
    /// After a death: everyone home, guards and downvotes gone.
    Death,
    /// On a new level: downvotes stay where they are.
    Level,
}

/// Puts actors back on their start cells and unfreezes everything.
pub fn reset_actors(world: &mut World, reset: RoundReset) {
    let map = world.resource::<GridMap>().clone();

    let mut players = world.query_filtered::<(&mut RailMovement, &mut PlayerStatus), With<PlayerControlled>>();
    for (mut rail, mut status) in players.iter_mut(world) {
        rail.place(&map, map.player_start());
        status.is_dead = false;
    }

    let mut npcs = world.query_filtered::<(
        &Archetype,
        &StartCell,
        &mut Npc,
        &mut RailMovement,
        Option<&mut DownvoteSlot>,
    ), Without<PlayerControlled>>();
    for (archetype, start, mut npc, mut rail, downvote) in npcs.iter_mut(world) {
        match downvote {
            Some(mut slot) if reset == RoundReset::Death => {
                slot.active = false;
                npc.reset();
                rail.place(&map, start.0);
            }
            Some(_) => rail.unfreeze(),
            None => {
                npc.reset();
                rail.place(&map, start.0);
                if *archetype == Archetype::SecurityGuard {
                    rail.freeze();
                }
            }
        }
    }
}

/// Builds the next level from the template.
pub fn advance_level(world: &mut World) {
    let step = world.resource::<GameConfig>().speed_multiplier_step;
    let level = {
        let mut state = world.resource_mut::<LevelState>();
        state.level += 1;
        state.speed_multiplier += step;
        *state
    };

    let fresh = world.resource::<MapTemplate>().0.clone();
    world.insert_resource(fresh);
    world.resource_mut::<HatSlot>().clear();
    reset_actors(world, RoundReset::Level);
    *world.resource_mut::<GameStage>() = GameStage::Playing;

    info!(level = level.level, speed_multiplier = level.speed_multiplier, "Level started");
    world.send_event(GameEvent::LevelStarted { level: level.level });
}

/// Ends the death sequence: back to READY! or on to game over.
pub fn resolve_death(world: &mut World) {
    let lives = world.resource::<PlayerLives>().0;
    world.resource_mut::<HatSlot>().clear();

    if lives == 0 {
        let score = world.resource::<Score>().0;
        *world.resource_mut::<GameStage>() = GameStage::GameOver;
        info!(score, "Game over");
        world.send_event(GameEvent::GameOver { score });
        world.send_event(GameEvent::Announcement {
            text: messages::GAME_OVER,
            duration_ms: 0,
        });
        return;
    }

    reset_actors(world, RoundReset::Death);
    enter_starting(world);
}

/// Wipes the session and starts again at level one.
pub fn restart(world: &mut World) {
    let lives = world.resource::<GameConfig>().starting_lives;
    world.insert_resource(Score::default());
    world.insert_resource(PlayerLives(lives));
    world.insert_resource(LevelState::default());
    let fresh = world.resource::<MapTemplate>().0.clone();
    world.insert_resource(fresh);
    world.resource_mut::<HatSlot>().clear();
    world.resource_mut::<ScheduledTasks>().clear();
    world.resource_mut::<RoundEpoch>().bump();

    reset_actors(world, RoundReset::Death);
    info!(lives, "Game restarted");
    enter_starting(world);
}

fn enter_starting(world: &mut World) {
    let ready_ms = world.resource::<GameConfig>().ready_ms;
    *world.resource_mut::<GameStage>() = GameStage::starting(ready_ms);
    world.send_event(GameEvent::Announcement {
        text: messages::READY,
        duration_ms: ready_ms,
    });
}
