//! Game session: owns every progression component and drives them from one step loop.
//!
//! Nothing here is global. The host application constructs a [`GameSession`] with its
//! world and dialogue collaborators, feeds it `tick(delta)` once per simulation step and
//! forwards player input (`confirm`, `interact`, `use_item`).

use crate::config::Config;
use crate::game::catalog::ItemCatalog;
use crate::game::dialogue::{DialogueHost, DialogueSequencer};
use crate::game::errors::ProgressError;
use crate::game::events::GameEvent;
use crate::game::inventory::InventoryManager;
use crate::game::pickup::ItemPickup;
use crate::game::progress::{ProgressStore, ProgressStoreBuilder, SlotSummary};
use crate::game::puzzle::{GateRegistry, PuzzleGate, PuzzleOutcome};
use crate::game::types::{
    DialogueLine, Mutation, Vec3, VolumeChannel, AUTOSAVE_SLOT, QUICK_SAVE_SLOT,
};
use log::{debug, error, info, warn};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// The world side of the game: player transform, scenes and audio output.
pub trait WorldPort {
    /// Current player position, or `None` while no player exists in the scene.
    fn player_position(&self) -> Option<Vec3>;
    fn set_player_position(&mut self, position: Vec3);
    fn active_scene(&self) -> String;
    /// Begin a transition to `scene`. The player is repositioned on the following tick.
    fn load_scene(&mut self, scene: &str);
    fn apply_master_volume(&mut self, volume: f32);
}

/// What a press of the interact button did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Nothing,
    Gate {
        puzzle_id: String,
        outcome: PuzzleOutcome,
    },
    Pickup {
        item_id: String,
        taken: bool,
    },
}

pub struct GameSession {
    store: ProgressStore,
    inventory: InventoryManager,
    gates: GateRegistry,
    pickups: Vec<ItemPickup>,
    dialogue: DialogueSequencer,
    world: Box<dyn WorldPort>,
    system_speaker: String,
    /// Position to restore once the scene transition from a load has completed.
    pending_position: Option<Vec3>,
}

impl GameSession {
    pub fn new(
        config: &Config,
        catalog: Arc<ItemCatalog>,
        world: Box<dyn WorldPort>,
        host: Box<dyn DialogueHost>,
    ) -> Result<Self, ProgressError> {
        let store = ProgressStoreBuilder::from_config(&config.saves).open()?;
        Ok(Self::with_store(config, store, catalog, world, host))
    }

    pub fn with_store(
        config: &Config,
        store: ProgressStore,
        catalog: Arc<ItemCatalog>,
        world: Box<dyn WorldPort>,
        host: Box<dyn DialogueHost>,
    ) -> Self {
        Self {
            store,
            inventory: InventoryManager::new(catalog, &config.inventory, &config.dialogue),
            gates: GateRegistry::new(),
            pickups: Vec::new(),
            dialogue: DialogueSequencer::new(host, &config.dialogue),
            world,
            system_speaker: config.dialogue.system_speaker.clone(),
            pending_position: None,
        }
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ProgressStore {
        &mut self.store
    }

    pub fn inventory(&self) -> &InventoryManager {
        &self.inventory
    }

    pub fn gates(&self) -> &GateRegistry {
        &self.gates
    }

    pub fn pickups(&self) -> &[ItemPickup] {
        &self.pickups
    }

    pub fn dialogue(&self) -> &DialogueSequencer {
        &self.dialogue
    }

    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        self.store.subscribe()
    }

    // ------------------------------------------------------------------------
    // World setup
    // ------------------------------------------------------------------------

    /// Place a gate in the world. It announces through the configured system speaker.
    pub fn register_gate(&mut self, gate: PuzzleGate) {
        let gate = gate.with_speaker(&self.system_speaker);
        debug!("registered puzzle gate {}", gate.puzzle_id);
        self.gates.register(gate);
    }

    /// Place an item pickup in the world, hidden straight away if the item is held.
    pub fn add_pickup(&mut self, pickup: ItemPickup) {
        let mut pickup = pickup.with_speaker(&self.system_speaker);
        if !self.inventory.catalog().contains(&pickup.item_id) {
            warn!("pickup bound to unknown item: {}", pickup.item_id);
        }
        pickup.rehydrate(&self.store);
        self.pickups.push(pickup);
    }

    /// Drop every gate and pickup, typically on a scene change.
    pub fn clear_world(&mut self) {
        self.gates.clear();
        self.pickups.clear();
    }

    // ------------------------------------------------------------------------
    // Step loop and input
    // ------------------------------------------------------------------------

    /// Advance the session by `delta` seconds.
    pub fn tick(&mut self, delta: f32) {
        if let Some(position) = self.pending_position.take() {
            self.world.set_player_position(position);
        }

        let seconds = f64::from(delta);
        self.store.tick_playtime(seconds);
        if self.store.has_record() && self.store.autosave_due(seconds) {
            if let Err(e) = self.autosave() {
                error!("autosave failed: {}", e);
            }
        }

        self.dialogue.tick(delta);
    }

    pub fn confirm(&mut self) {
        self.dialogue.confirm();
    }

    /// Interact with whatever is in reach: the nearest gate first, then a pickup.
    pub fn interact(&mut self) -> Interaction {
        let player = self.player_position();

        if let Some(gate) = self.gates.nearest_in_reach(player) {
            let outcome = gate.attempt_resolve(&self.inventory, &mut self.store, &mut self.dialogue);
            return Interaction::Gate {
                puzzle_id: gate.puzzle_id.clone(),
                outcome,
            };
        }

        if let Some(pickup) = self.pickups.iter_mut().find(|p| p.in_reach(player)) {
            let taken = pickup.pick_up(&self.inventory, &mut self.store, &mut self.dialogue);
            return Interaction::Pickup {
                item_id: pickup.item_id.clone(),
                taken,
            };
        }

        Interaction::Nothing
    }

    /// Take the first pickup bound to `item_id` regardless of distance.
    pub fn pickup(&mut self, item_id: &str) -> bool {
        let Some(pickup) = self
            .pickups
            .iter_mut()
            .find(|p| p.item_id == item_id && !p.is_picked_up())
        else {
            debug!("no pickup available for {}", item_id);
            return false;
        };
        pickup.pick_up(&self.inventory, &mut self.store, &mut self.dialogue)
    }

    pub fn use_item(&mut self, item_id: &str) -> bool {
        let player = self.player_position();
        self.inventory
            .use_item(item_id, player, &mut self.store, &self.gates, &mut self.dialogue)
    }

    /// Start a scripted conversation.
    pub fn start_dialogue(&mut self, lines: Vec<DialogueLine>) -> bool {
        self.dialogue.start(lines)
    }

    /// Start a one-time conversation; does nothing if `dialogue_id` already played.
    pub fn trigger_dialogue(&mut self, dialogue_id: &str, lines: Vec<DialogueLine>) -> bool {
        if self.store.was_dialogue_triggered(dialogue_id) {
            return false;
        }
        if !self.dialogue.start(lines) {
            return false;
        }
        self.store.mark_dialogue_triggered(dialogue_id);
        true
    }

    // ------------------------------------------------------------------------
    // Progression
    // ------------------------------------------------------------------------

    pub fn new_game(&mut self) {
        self.store.create_new();
        self.pending_position = None;
        self.rehydrate_pickups();
    }

    /// Record arrival in `room` and autosave.
    pub fn enter_room(&mut self, room: &str) -> Mutation {
        let result = self.store.enter_room(room);
        if result == Mutation::NoRecord {
            return result;
        }
        info!("entered room {}", room);
        if let Err(e) = self.autosave() {
            error!("autosave on room entry failed: {}", e);
        }
        result
    }

    /// Autosave after a significant story beat.
    pub fn on_story_progress(&mut self) -> Result<(), ProgressError> {
        self.autosave()
    }

    pub fn set_volume(&mut self, channel: VolumeChannel, value: f32) -> Mutation {
        let result = self.store.set_volume(channel, value);
        if channel == VolumeChannel::Master {
            if let Some(record) = self.store.current() {
                self.world.apply_master_volume(record.master_volume);
            }
        }
        result
    }

    // ------------------------------------------------------------------------
    // Slots
    // ------------------------------------------------------------------------

    /// Save to `slot` with the player's current position and scene.
    pub fn save(&mut self, slot: u32, display_name: Option<&str>) -> Result<(), ProgressError> {
        let Some(record) = self.store.current() else {
            return self.store.save(slot, display_name);
        };
        let position = self.world.player_position().unwrap_or(record.player_position);
        let scene = self.world.active_scene();
        let scene = if scene.is_empty() {
            record.current_scene.clone()
        } else {
            scene
        };
        self.store.save_at(slot, display_name, position, &scene)
    }

    pub fn autosave(&mut self) -> Result<(), ProgressError> {
        self.save(AUTOSAVE_SLOT, None)
    }

    pub fn quick_save(&mut self) -> Result<(), ProgressError> {
        self.save(QUICK_SAVE_SLOT, None)
    }

    pub fn quick_load(&mut self) -> Result<(), ProgressError> {
        self.load(QUICK_SAVE_SLOT)
    }

    /// Load `slot`, switch the world to its scene and queue the player position for the
    /// next tick.
    pub fn load(&mut self, slot: u32) -> Result<(), ProgressError> {
        let record = self.store.load(slot)?;
        let scene = record.current_scene.clone();
        let position = record.player_position;
        let master_volume = record.master_volume;

        self.dialogue.end();
        if self.world.active_scene() != scene {
            self.world.load_scene(&scene);
        }
        self.pending_position = Some(position);
        self.world.apply_master_volume(master_volume);
        self.rehydrate_pickups();
        Ok(())
    }

    /// Delete a player slot. The autosave slot is refused.
    pub fn delete_slot(&mut self, slot: u32) -> Result<(), ProgressError> {
        if slot == AUTOSAVE_SLOT {
            warn!("refusing to delete the autosave slot");
            return Err(ProgressError::AutosaveProtected);
        }
        self.store.delete(slot)
    }

    pub fn slot_summaries(&self) -> Vec<SlotSummary> {
        self.store.slot_summaries()
    }

    fn player_position(&self) -> Vec3 {
        self.world
            .player_position()
            .or_else(|| self.store.current().map(|r| r.player_position))
            .unwrap_or(Vec3::ZERO)
    }

    fn rehydrate_pickups(&mut self) {
        for pickup in &mut self.pickups {
            pickup.rehydrate(&self.store);
        }
    }
}
