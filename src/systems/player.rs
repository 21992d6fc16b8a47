use bevy_ecs::{
    event::EventWriter,
    query::{With, Without},
    system::{Query, Res, ResMut, Single},
};
use tracing::debug;

use crate::{
    behavior::{Npc, NpcState},
    config::GameConfig,
    constants::{score, speed},
    events::GameEvent,
    map::GridMap,
    movement::RailMovement,
    systems::components::{PlayerControlled, PlayerStatus, Score},
};

/// Moves the player along the rails and eats whatever is on the cell they end up in.
///
/// A power pellet frightens every NPC that can be frightened.
#[allow(clippy::too_many_arguments)]
pub fn player_movement_system(
    mut map: ResMut<GridMap>,
    config: Res<GameConfig>,
    mut score: ResMut<Score>,
    player: Single<(&mut RailMovement, &PlayerStatus), With<PlayerControlled>>,
    mut npcs: Query<&mut Npc, Without<PlayerControlled>>,
    mut events: EventWriter<GameEvent>,
) {
    let (mut rail, status) = player.into_inner();
    if status.is_dead {
        return;
    }

    rail.speed = speed::PLAYER;
    rail.advance(&map);

    let cell = rail.current_cell(&map);
    if map.remove_dot(cell) {
        score.0 += score::DOT;
        events.write(GameEvent::DotEaten {
            cell,
            points: score::DOT,
        });
    } else if map.remove_power_pellet(cell) {
        score.0 += score::POWER_PELLET;
        events.write(GameEvent::PowerPelletEaten {
            cell,
            points: score::POWER_PELLET,
        });

        let mut frightened = 0;
        for mut npc in npcs.iter_mut() {
            if npc.set_state(NpcState::Frightened, Some(config.frightened_ms)) {
                frightened += 1;
            }
        }
        debug!(?cell, frightened, "Power pellet eaten");
    }
}
