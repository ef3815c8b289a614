use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Scene a brand new game starts in.
pub const DEFAULT_SCENE: &str = "Room01_Foyer";
/// Slot reserved for autosaves.
pub const AUTOSAVE_SLOT: u32 = 0;
/// Slot used by quick save / quick load.
pub const QUICK_SAVE_SLOT: u32 = 1;
/// Reveal interval (seconds per character) used when a line does not specify one.
pub const DEFAULT_REVEAL_INTERVAL: f32 = 0.05;

const SAVE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn now_stamp() -> String {
    Local::now().format(SAVE_DATE_FORMAT).to_string()
}

// ============================================================================
// World Geometry
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ============================================================================
// Save Records
// ============================================================================

/// Per-room progression sub-record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomState {
    pub interacted_objects: BTreeSet<String>,
    pub solved_puzzles: BTreeSet<String>,
    pub opened_doors: BTreeSet<String>,
    pub collected_items: BTreeSet<String>,
    pub completed: bool,
    pub visited: bool,
}

/// Save stamp rewritten on every successful save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveMetadata {
    pub save_date: String,
    pub save_name: String,
    pub slot_number: u32,
}

impl Default for SaveMetadata {
    fn default() -> Self {
        Self {
            save_date: now_stamp(),
            save_name: "Save Game".to_string(),
            slot_number: QUICK_SAVE_SLOT,
        }
    }
}

/// The persisted unit of progression. Exactly one is current per process; see
/// [`ProgressStore`](crate::game::ProgressStore).
///
/// Fields absent from an older payload decode to their defaults and unknown fields are
/// ignored, so there is no explicit format version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveRecord {
    // Player progress
    pub current_scene: String,
    pub player_position: Vec3,
    pub current_chapter: u32,
    pub playtime_seconds: f64,

    // Story progress
    pub completed_rooms: BTreeSet<String>,
    pub collected_fragments: BTreeSet<String>,
    pub completed_puzzles: BTreeSet<String>,
    pub triggered_dialogues: BTreeSet<String>,
    pub examined_objects: BTreeSet<String>,
    pub lullaby_song_progress: u32,

    // Inventory, in pickup order
    pub inventory_items: Vec<String>,
    /// Items already handed to multi-item puzzle gates, keyed by puzzle id.
    pub puzzle_progress: BTreeMap<String, BTreeSet<String>>,

    pub room_states: BTreeMap<String, RoomState>,

    // Settings, each in 0.0..=1.0
    pub master_volume: f32,
    pub music_volume: f32,
    pub sfx_volume: f32,
    pub subtitles_enabled: bool,

    pub metadata: SaveMetadata,
}

impl Default for SaveRecord {
    fn default() -> Self {
        Self {
            current_scene: DEFAULT_SCENE.to_string(),
            player_position: Vec3::ZERO,
            current_chapter: 1,
            playtime_seconds: 0.0,
            completed_rooms: BTreeSet::new(),
            collected_fragments: BTreeSet::new(),
            completed_puzzles: BTreeSet::new(),
            triggered_dialogues: BTreeSet::new(),
            examined_objects: BTreeSet::new(),
            lullaby_song_progress: 0,
            inventory_items: Vec::new(),
            puzzle_progress: BTreeMap::new(),
            room_states: BTreeMap::new(),
            master_volume: 1.0,
            music_volume: 1.0,
            sfx_volume: 1.0,
            subtitles_enabled: true,
            metadata: SaveMetadata::default(),
        }
    }
}

impl SaveRecord {
    /// Fresh record for a new game.
    pub fn new_game() -> Self {
        let mut record = Self::default();
        record.metadata.save_name = "New Game".to_string();
        record
    }

    /// Whole hours, minutes and seconds of playtime, floored.
    pub fn playtime_formatted(&self) -> String {
        format_playtime(self.playtime_seconds)
    }
}

/// Format seconds as `HH:MM:SS`, truncating rather than rounding.
pub fn format_playtime(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Outcome of a Progression Store mutator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// State changed.
    Applied,
    /// Value already present (or absent, for removals); nothing changed.
    Unchanged,
    /// No current record exists yet; the call was ignored.
    NoRecord,
}

impl Mutation {
    pub fn is_applied(self) -> bool {
        self == Mutation::Applied
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeChannel {
    Master,
    Music,
    Sfx,
}

// ============================================================================
// Item Content
// ============================================================================

fn default_usable() -> bool {
    true
}

/// Immutable catalog entry describing one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Display asset reference; only checked by the validation pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_key_item: bool,
    #[serde(default = "default_usable")]
    pub is_usable: bool,
    #[serde(default)]
    pub is_consumable: bool,
    #[serde(default)]
    pub triggers_memory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_fragment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_for_puzzle: Option<String>,
}

impl ItemDefinition {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: None,
            is_key_item: false,
            is_usable: true,
            is_consumable: false,
            triggers_memory: false,
            memory_fragment_id: None,
            required_for_puzzle: None,
        }
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn key_item(mut self) -> Self {
        self.is_key_item = true;
        self
    }

    pub fn consumable(mut self) -> Self {
        self.is_consumable = true;
        self
    }

    pub fn unusable(mut self) -> Self {
        self.is_usable = false;
        self
    }

    pub fn with_memory(mut self, fragment_id: &str) -> Self {
        self.triggers_memory = true;
        self.memory_fragment_id = Some(fragment_id.to_string());
        self
    }

    pub fn for_puzzle(mut self, puzzle_id: &str) -> Self {
        self.required_for_puzzle = Some(puzzle_id.to_string());
        self
    }

    /// Fragment this item unlocks, if it is flagged as a memory trigger.
    pub fn memory_fragment(&self) -> Option<&str> {
        if !self.triggers_memory {
            return None;
        }
        self.memory_fragment_id
            .as_deref()
            .filter(|fragment| !fragment.is_empty())
    }

    pub fn linked_puzzle(&self) -> Option<&str> {
        self.required_for_puzzle
            .as_deref()
            .filter(|puzzle| !puzzle.is_empty())
    }
}

// ============================================================================
// Dialogue
// ============================================================================

/// One line of a dialogue session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub text: String,
    pub speaker: String,
    /// Seconds between revealed characters.
    #[serde(default = "default_reveal_interval")]
    pub reveal_interval: f32,
    #[serde(default = "default_wait_for_input")]
    pub wait_for_input: bool,
}

fn default_reveal_interval() -> f32 {
    DEFAULT_REVEAL_INTERVAL
}

fn default_wait_for_input() -> bool {
    true
}

impl DialogueLine {
    pub fn new(text: &str, speaker: &str) -> Self {
        Self {
            text: text.to_string(),
            speaker: speaker.to_string(),
            reveal_interval: DEFAULT_REVEAL_INTERVAL,
            wait_for_input: true,
        }
    }

    pub fn with_interval(mut self, seconds: f32) -> Self {
        self.reveal_interval = seconds;
        self
    }

    /// Advance on a timer instead of waiting for a confirm event.
    pub fn auto_advance(mut self) -> Self {
        self.wait_for_input = false;
        self
    }
}
