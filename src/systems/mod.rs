//! The Entity-Component-System (ECS) module.
//!
//! This module contains all the ECS-related logic, including components, systems,
//! and resources.

pub mod components;
pub mod downvote;
pub mod hat;
pub mod npc;
pub mod player;
pub mod security;
pub mod stage;

pub use components::*;
pub use security::SecurityOrder;
pub use stage::{GameStage, PauseState, PlayerKilled};
