//! Turn-based dungeon crawler simulation core.
//!
//! Everything runs against a [`WorldStore`]: actions mutate it, the turn
//! pipeline sequences the player and the hostiles, and the field of view
//! and dungeon generator read and extend it. Rendering and input decoding
//! are left to the host, which drives a [`Game`] with [`Input`] events.

pub mod actions;
pub mod ai;
pub mod combat;
pub mod config;
pub mod data;
pub mod ecs;
pub mod error;
pub mod game;
pub mod items;
pub mod map;
pub mod script;
pub mod states;
pub mod turn;
pub mod vision;

#[cfg(test)]
mod testing;

pub use actions::{Action, ActionResult};
pub use config::CoreConfig;
pub use ecs::WorldStore;
pub use error::{CoreError, Result};
pub use game::Game;
pub use script::ScriptedInput;
pub use states::{Input, State};
pub use turn::do_player_action;
