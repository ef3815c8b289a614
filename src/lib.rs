//! # Lullaby - progression core for a narrative exploration game
//!
//! Lullaby holds everything about a play-through that must survive a restart, plus the
//! systems that change it: picking up and using items, solving item-gated puzzles, and
//! presenting typed-out dialogue.
//!
//! ## Features
//!
//! - **Save Slots**: One human-readable JSON file per slot, atomic locked writes, an
//!   autosave slot and configurable player slots.
//! - **Inventory**: Items resolved against a shared catalog, memory-fragment items, and
//!   consumables.
//! - **Puzzle Gates**: Multi-item requirements satisfied in one go or item by item, with
//!   partial progress kept across saves.
//! - **Dialogue**: Character-by-character reveal with throttled typing cues, skip and
//!   auto-advance.
//! - **Explicit Ownership**: No globals. Collaborators are injected through small traits.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lullaby::config::Config;
//! use lullaby::game::{GameSession, ItemCatalog, NullDialogueHost, Vec3, WorldPort};
//!
//! struct World;
//!
//! impl WorldPort for World {
//!     fn player_position(&self) -> Option<Vec3> { Some(Vec3::ZERO) }
//!     fn set_player_position(&mut self, _position: Vec3) {}
//!     fn active_scene(&self) -> String { "Room01_Foyer".to_string() }
//!     fn load_scene(&mut self, _scene: &str) {}
//!     fn apply_master_volume(&mut self, _volume: f32) {}
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml")?;
//!     lullaby::logutil::init_logging(&config.logging);
//!
//!     let catalog = Arc::new(ItemCatalog::load("data/items.json")?);
//!     let mut session =
//!         GameSession::new(&config, catalog, Box::new(World), Box::new(NullDialogueHost))?;
//!     session.new_game();
//!     session.tick(1.0 / 60.0);
//!     session.quick_save()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - Progression store, inventory, puzzle gates, dialogue and the session
//! - [`config`] - Configuration loading and validation
//! - [`logutil`] - Log escaping and logger setup

pub mod config;
pub mod game;
pub mod logutil;
