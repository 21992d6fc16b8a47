//! Runtime tunables, loaded from `CAPMAN_*` environment variables over built-in defaults.

use bevy_ecs::resource::Resource;
use figment::providers::Env;
use figment::Figment;
use serde::Deserialize;
use tracing::debug;

use crate::constants::{speed, timing};
use crate::error::{ConfigError, GameResult};

/// Tunables for a game session.
///
/// Every field has a default, so an empty environment yields [`GameConfig::default`].
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for all gameplay randomness. `None` seeds from the OS.
    pub seed: Option<u64>,
    pub starting_lives: u8,
    pub guard_pool_size: usize,
    pub downvote_pool_size: usize,
    /// Length of the READY! countdown.
    pub ready_ms: u32,
    pub level_transition_ms: u32,
    pub death_ms: u32,
    /// Death sequence after a capture or downvote kill.
    pub capture_death_ms: u32,
    pub frightened_ms: u32,
    /// Added to the downvote and guard speed multiplier on every level advance.
    pub speed_multiplier_step: f32,
    /// Previously persisted best score.
    pub high_score: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            starting_lives: 3,
            guard_pool_size: 3,
            downvote_pool_size: 4,
            ready_ms: timing::READY_MS,
            level_transition_ms: timing::LEVEL_TRANSITION_MS,
            death_ms: timing::DEATH_MS,
            capture_death_ms: timing::CAPTURE_DEATH_MS,
            frightened_ms: timing::FRIGHTENED_MS,
            speed_multiplier_step: speed::LEVEL_MULTIPLIER_STEP,
            high_score: 0,
        }
    }
}

impl GameConfig {
    /// Loads the configuration from `CAPMAN_*` environment variables.
    pub fn load() -> GameResult<GameConfig> {
        Self::from_figment(Figment::new().merge(Env::prefixed("CAPMAN_")))
    }

    /// Extracts and validates a configuration from any figment.
    pub fn from_figment(figment: Figment) -> GameResult<GameConfig> {
        let config: GameConfig = figment.extract().map_err(|e| ConfigError::Extract(Box::new(e)))?;
        config.validate()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Rejects values the game cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.starting_lives == 0 {
            return Err(ConfigError::Invalid {
                field: "starting_lives",
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.speed_multiplier_step.is_finite() || self.speed_multiplier_step < 0.0 {
            return Err(ConfigError::Invalid {
                field: "speed_multiplier_step",
                reason: format!("must be a non-negative number, got {}", self.speed_multiplier_step),
            });
        }
        Ok(())
    }

    /// A seeded configuration with no READY! countdown, for scripted runs.
    pub fn seeded(seed: u64) -> GameConfig {
        GameConfig {
            seed: Some(seed),
            ready_ms: 0,
            ..GameConfig::default()
        }
    }
}
