//! Headless runner: plays a seeded, scripted session and logs everything that happens.

use std::collections::BTreeMap;
use std::env;

use anyhow::Context;
use capman::{
    config::GameConfig,
    events::{GameCommand, GameEvent, Side},
    formatter::TickFormatter,
    game::Game,
    map::direction::Direction,
    systems::GameStage,
};
use strum::IntoEnumIterator;
use tracing::{debug, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Ticks simulated when no count is given on the command line.
const DEFAULT_TICKS: u32 = 60 * 60;
/// The scripted player changes heading this often.
const STEER_EVERY: u32 = 45;
/// The background Pong game scores this often.
const PONG_EVERY: u32 = 60 * 5;

fn init_tracing() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::registry()
        .with(fmt::layer().event_format(TickFormatter))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(ErrorLayer::default());

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

pub fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let ticks = match env::args().nth(1) {
        Some(arg) => arg.parse::<u32>().with_context(|| format!("Invalid tick count {arg:?}"))?,
        None => DEFAULT_TICKS,
    };

    let mut config = GameConfig::load().context("Failed to load configuration")?;
    let seed = *config.seed.get_or_insert(0x00CA_93A4);
    let mut game = Game::new(config).context("Failed to build game")?;
    info!(ticks, seed, "Running scripted session");

    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    let steering: Vec<Direction> = Direction::iter().collect();

    for tick in 0..ticks {
        if tick % STEER_EVERY == 0 {
            let direction = steering[(tick / STEER_EVERY) as usize % steering.len()];
            game.send(GameCommand::MovePlayer(direction));
        }
        if tick > 0 && tick % PONG_EVERY == 0 {
            let side = if (tick / PONG_EVERY) % 2 == 0 { Side::Left } else { Side::Right };
            game.send(GameCommand::PongScore(side));
        }

        for event in game.tick() {
            log_event(&event);
            *counts.entry(event.as_ref().to_string()).or_default() += 1;
        }

        if game.stage() == GameStage::GameOver {
            info!(tick, "Session ended in game over");
            break;
        }
    }

    let level = game.level();
    println!("ticks:      {}", game.tick_count());
    println!("stage:      {:?}", game.stage());
    println!("score:      {}", game.score());
    println!("high score: {}", game.high_score());
    println!("lives:      {}", game.lives());
    println!("level:      {} (speed x{:.2})", level.level, level.speed_multiplier);
    for (name, count) in &counts {
        println!("  {name:<22} {count}");
    }
    Ok(())
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::DotEaten { .. } => debug!(event = event.as_ref(), "{event:?}"),
        _ => info!(event = event.as_ref(), "{event:?}"),
    }
}
