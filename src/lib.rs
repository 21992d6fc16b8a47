//! Cap Man game library crate.

pub mod behavior;
pub mod config;
pub mod constants;
pub mod entity;
pub mod error;
pub mod events;
pub mod formatter;
pub mod game;
pub mod hat;
pub mod map;
pub mod movement;
pub mod schedule;
pub mod systems;
