//! Progression core: save slots, inventory, puzzle gates and dialogue.
//!
//! Ownership is explicit. A [`ProgressStore`] owns the single current [`SaveRecord`];
//! the [`InventoryManager`] and every [`PuzzleGate`] read and write through it. The
//! [`ItemCatalog`] is built once and shared read-only. [`GameSession`] wires them all to
//! one step loop.

pub mod catalog;
pub mod dialogue;
pub mod errors;
pub mod events;
pub mod inventory;
pub mod pickup;
pub mod progress;
pub mod puzzle;
pub mod rooms;
pub mod session;
pub mod storage;
pub mod types;

pub use catalog::{CatalogIssue, ItemCatalog};
pub use dialogue::{
    DialogueHost, DialogueSequencer, DialogueState, Narrator, NullDialogueHost, SpeakerProfile,
};
pub use errors::ProgressError;
pub use events::{drain, EventBus, GameEvent};
pub use inventory::InventoryManager;
pub use pickup::ItemPickup;
pub use progress::{
    AutosaveTimer, ProgressStore, ProgressStoreBuilder, SlotInfo, SlotStatus, SlotSummary,
};
pub use puzzle::{GateMessages, GateRegistry, ItemDelivery, PuzzleGate, PuzzleOutcome};
pub use rooms::{room_display_name, UNKNOWN_LOCATION};
pub use session::{GameSession, Interaction, WorldPort};
pub use types::{
    format_playtime, DialogueLine, ItemDefinition, Mutation, RoomState, SaveMetadata, SaveRecord,
    Vec3, VolumeChannel, AUTOSAVE_SLOT, DEFAULT_SCENE, QUICK_SAVE_SLOT,
};
