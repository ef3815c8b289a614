//! # Configuration
//!
//! A small set of knobs supplied when the game is constructed. They can be built in code
//! (`Config::default()` and field updates) or read from a TOML file:
//!
//! ```toml
//! [saves]
//! dir = "saves"
//! max_slots = 3
//! autosave_enabled = true
//! autosave_interval_secs = 120.0
//!
//! [inventory]
//! pickup_range = 2.0
//! stack_consumables = true
//!
//! [dialogue]
//! characters_per_sound = 1
//! default_reveal_interval = 0.05
//! auto_advance_delay = 2.0
//! protagonist = "Lisa"
//!
//! [[dialogue.speakers]]
//! name = "Lisa"
//! typing_sounds = ["sfx/type_soft_1.wav", "sfx/type_soft_2.wav"]
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every section is optional; missing values take their defaults. Environment variables
//! are deliberately not consulted.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::game::dialogue::SpeakerProfile;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub saves: SavesConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub dialogue: DialogueConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SavesConfig {
    /// Application-owned directory holding `save_slot_<N>` files.
    pub dir: String,
    /// Number of player slots (1..=max_slots); slot 0 is the autosave.
    pub max_slots: u32,
    pub autosave_enabled: bool,
    pub autosave_interval_secs: f64,
    pub file_extension: String,
}

impl Default for SavesConfig {
    fn default() -> Self {
        Self {
            dir: "saves".to_string(),
            max_slots: 3,
            autosave_enabled: true,
            autosave_interval_secs: 120.0,
            file_extension: "json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Maximum distance between the player and a puzzle gate for a used item to reach it.
    pub pickup_range: f32,
    /// Let a consumable be picked up again while a copy is already held.
    pub stack_consumables: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            pickup_range: 2.0,
            stack_consumables: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Play a typing cue at most once per this many non-whitespace characters.
    pub characters_per_sound: u32,
    /// Seconds per character for narrated one-liners.
    pub default_reveal_interval: f32,
    /// Seconds a fully revealed `wait_for_input = false` line stays up.
    pub auto_advance_delay: f32,
    /// Speaker used for item memories and examine text.
    pub protagonist: String,
    /// Speaker used for puzzle and pickup announcements.
    pub system_speaker: String,
    pub speakers: Vec<SpeakerProfile>,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            characters_per_sound: 1,
            default_reveal_interval: 0.05,
            auto_advance_delay: 2.0,
            protagonist: "Lisa".to_string(),
            system_speaker: "System".to_string(),
            speakers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Append log lines to this file as well.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        Self::from_toml_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path.display(), e))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default configuration to `path`.
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(&Config::default())
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;
        fs::write(path, content)
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path.display(), e))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let saves = &self.saves;
        if !(saves.autosave_interval_secs.is_finite() && saves.autosave_interval_secs > 0.0) {
            bail!("saves.autosave_interval_secs must be a positive number of seconds");
        }
        if saves.max_slots == 0 {
            bail!("saves.max_slots must be at least 1");
        }
        if saves.dir.trim().is_empty() {
            bail!("saves.dir must not be empty");
        }
        if !(self.inventory.pickup_range.is_finite() && self.inventory.pickup_range >= 0.0) {
            bail!("inventory.pickup_range must be non-negative");
        }
        let dialogue = &self.dialogue;
        if dialogue.characters_per_sound == 0 {
            bail!("dialogue.characters_per_sound must be at least 1");
        }
        if !(dialogue.default_reveal_interval >= 0.0 && dialogue.auto_advance_delay >= 0.0) {
            bail!("dialogue intervals must be non-negative");
        }
        Ok(())
    }
}
