//! Progression Store: the single writable copy of the player's progress.
//!
//! The store has two states: no current record (after construction) and a current
//! record (after [`ProgressStore::create_new`] or a successful [`ProgressStore::load`]).
//! Every mutator is a silent no-op reporting [`Mutation::NoRecord`] in the first state.
//! Adding a value that is already present reports [`Mutation::Unchanged`].

use crate::config::SavesConfig;
use crate::game::errors::ProgressError;
use crate::game::events::{EventBus, GameEvent};
use crate::game::rooms::room_display_name;
use crate::game::storage::SlotFiles;
use crate::game::types::{
    now_stamp, Mutation, RoomState, SaveRecord, Vec3, VolumeChannel, AUTOSAVE_SLOT,
};
use log::{debug, error, info, warn};
use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;

// ============================================================================
// Autosave Timer
// ============================================================================

/// Accumulates elapsed simulation time and reports when an autosave is due.
///
/// The accumulator resets to zero (not to the remainder) when it fires, so the cadence
/// can drift late but never early.
#[derive(Debug, Clone)]
pub struct AutosaveTimer {
    interval: f64,
    elapsed: f64,
    enabled: bool,
}

impl AutosaveTimer {
    pub fn new(interval_secs: f64, enabled: bool) -> Self {
        Self {
            interval: interval_secs,
            elapsed: 0.0,
            enabled,
        }
    }

    /// Add `delta` seconds; returns true when the accumulated time exceeds the interval.
    pub fn accumulate(&mut self, delta: f64) -> bool {
        if !self.enabled {
            return false;
        }
        if delta.is_finite() && delta > 0.0 {
            self.elapsed += delta;
        }
        if self.elapsed > self.interval {
            self.elapsed = 0.0;
            return true;
        }
        false
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

// ============================================================================
// Slot Summaries
// ============================================================================

/// What a slot-list UI shows for an occupied slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotInfo {
    pub save_name: String,
    pub save_date: String,
    pub location: String,
    pub chapter: u32,
    pub playtime: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlotStatus {
    Empty,
    Corrupt,
    Saved(SlotInfo),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotSummary {
    pub slot: u32,
    pub is_autosave: bool,
    pub status: SlotStatus,
}

// ============================================================================
// Store
// ============================================================================

/// Builder for a [`ProgressStore`]; tests point it at a throwaway directory.
pub struct ProgressStoreBuilder {
    dir: PathBuf,
    extension: String,
    max_slots: u32,
    autosave_enabled: bool,
    autosave_interval: f64,
}

impl ProgressStoreBuilder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let defaults = SavesConfig::default();
        Self {
            dir: dir.into(),
            extension: defaults.file_extension,
            max_slots: defaults.max_slots,
            autosave_enabled: defaults.autosave_enabled,
            autosave_interval: defaults.autosave_interval_secs,
        }
    }

    pub fn from_config(config: &SavesConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            extension: config.file_extension.clone(),
            max_slots: config.max_slots,
            autosave_enabled: config.autosave_enabled,
            autosave_interval: config.autosave_interval_secs,
        }
    }

    pub fn max_slots(mut self, max_slots: u32) -> Self {
        self.max_slots = max_slots;
        self
    }

    pub fn autosave_interval(mut self, seconds: f64) -> Self {
        self.autosave_interval = seconds;
        self
    }

    pub fn autosave_enabled(mut self, enabled: bool) -> Self {
        self.autosave_enabled = enabled;
        self
    }

    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = extension.to_string();
        self
    }

    /// Create the save directory if needed and return an empty store.
    pub fn open(self) -> Result<ProgressStore, ProgressError> {
        let files = SlotFiles::new(self.dir, &self.extension);
        files.ensure_dir()?;
        debug!("save directory ready at {}", files.dir().display());
        Ok(ProgressStore {
            files,
            max_slots: self.max_slots,
            current: None,
            held: HashMap::new(),
            autosave: AutosaveTimer::new(self.autosave_interval, self.autosave_enabled),
            events: EventBus::new(),
        })
    }
}

pub struct ProgressStore {
    files: SlotFiles,
    max_slots: u32,
    current: Option<SaveRecord>,
    /// Held-item counts mirroring `inventory_items`, for constant-time membership.
    held: HashMap<String, u32>,
    autosave: AutosaveTimer,
    events: EventBus,
}

fn index_inventory(record: &SaveRecord) -> HashMap<String, u32> {
    let mut held = HashMap::new();
    for item in &record.inventory_items {
        *held.entry(item.clone()).or_insert(0) += 1;
    }
    held
}

impl ProgressStore {
    /// Open a store with the default configuration rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ProgressError> {
        ProgressStoreBuilder::new(dir).open()
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Replace the current record with a fresh new-game record.
    pub fn create_new(&mut self) -> &SaveRecord {
        info!("created new game save data");
        self.held.clear();
        self.current.insert(SaveRecord::new_game())
    }

    /// Stamp and write the current record to `slot`.
    ///
    /// The record is stamped on a copy; the in-memory record only takes the new stamp once
    /// the file is safely on disk.
    pub fn save(&mut self, slot: u32, display_name: Option<&str>) -> Result<(), ProgressError> {
        self.write_slot(slot, display_name, None)
    }

    /// Like [`ProgressStore::save`], also recording the player's transform and active
    /// scene. Both land in the in-memory record only if the write succeeds.
    pub fn save_at(
        &mut self,
        slot: u32,
        display_name: Option<&str>,
        position: Vec3,
        scene: &str,
    ) -> Result<(), ProgressError> {
        self.write_slot(slot, display_name, Some((position, scene)))
    }

    fn write_slot(
        &mut self,
        slot: u32,
        display_name: Option<&str>,
        player: Option<(Vec3, &str)>,
    ) -> Result<(), ProgressError> {
        let Some(current) = self.current.as_ref() else {
            warn!("no save data to save to slot {}", slot);
            return Err(ProgressError::NoActiveRecord);
        };

        let mut stamped = current.clone();
        if let Some((position, scene)) = player {
            stamped.player_position = position;
            stamped.current_scene = scene.to_string();
        }
        stamped.metadata.slot_number = slot;
        stamped.metadata.save_date = now_stamp();
        stamped.metadata.save_name = match display_name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => room_display_name(&stamped.current_scene).to_string(),
        };

        let json = serde_json::to_string_pretty(&stamped)?;
        if let Err(e) = self.files.write(slot, &json) {
            error!("failed to save game to slot {}: {}", slot, e);
            return Err(e.into());
        }

        if slot == AUTOSAVE_SLOT {
            info!("autosave written to {}", self.files.path(slot).display());
        } else {
            info!("game saved to slot {}: {}", slot, self.files.path(slot).display());
        }
        self.current = Some(stamped);
        self.events.publish(GameEvent::GameSaved { slot });
        Ok(())
    }

    /// Read `slot` and make it the current record.
    ///
    /// On any failure the previous record stays installed untouched.
    pub fn load(&mut self, slot: u32) -> Result<&SaveRecord, ProgressError> {
        let record = self.read_slot(slot)?;
        self.held = index_inventory(&record);
        self.events.publish(GameEvent::GameLoaded { slot });
        info!("game loaded from slot {}", slot);
        Ok(self.current.insert(record))
    }

    /// Remove the slot's file. Protecting the autosave slot is the caller's job.
    pub fn delete(&mut self, slot: u32) -> Result<(), ProgressError> {
        match self.files.remove(slot) {
            Ok(()) => {
                info!("deleted save slot {}", slot);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ProgressError::SlotNotFound(slot)),
            Err(e) => {
                error!("failed to delete save slot {}: {}", slot, e);
                Err(e.into())
            }
        }
    }

    pub fn has_save(&self, slot: u32) -> bool {
        self.files.exists(slot)
    }

    /// Decode a slot without making it current. Any failure reads as `None`.
    pub fn peek_metadata(&self, slot: u32) -> Option<SaveRecord> {
        if !self.has_save(slot) {
            return None;
        }
        match self.read_slot(slot) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("peek of slot {} failed: {}", slot, e);
                None
            }
        }
    }

    /// Summaries for the autosave slot and every player slot, in slot order.
    pub fn slot_summaries(&self) -> Vec<SlotSummary> {
        (AUTOSAVE_SLOT..=self.max_slots)
            .map(|slot| {
                let status = if !self.has_save(slot) {
                    SlotStatus::Empty
                } else {
                    match self.read_slot(slot) {
                        Ok(record) => SlotStatus::Saved(SlotInfo {
                            save_name: record.metadata.save_name.clone(),
                            save_date: record.metadata.save_date.clone(),
                            location: room_display_name(&record.current_scene).to_string(),
                            chapter: record.current_chapter,
                            playtime: record.playtime_formatted(),
                        }),
                        Err(_) => SlotStatus::Corrupt,
                    }
                };
                SlotSummary {
                    slot,
                    is_autosave: slot == AUTOSAVE_SLOT,
                    status,
                }
            })
            .collect()
    }

    fn read_slot(&self, slot: u32) -> Result<SaveRecord, ProgressError> {
        let content = match self.files.read(slot) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("save file not found: {}", self.files.path(slot).display());
                return Err(ProgressError::SlotNotFound(slot));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content).map_err(|source| {
            warn!("save slot {} could not be decoded: {}", slot, source);
            ProgressError::CorruptSave { slot, source }
        })
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn current(&self) -> Option<&SaveRecord> {
        self.current.as_ref()
    }

    pub fn has_record(&self) -> bool {
        self.current.is_some()
    }

    pub fn max_slots(&self) -> u32 {
        self.max_slots
    }

    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publish(&mut self, event: GameEvent) {
        self.events.publish(event);
    }

    pub fn autosave_timer(&self) -> &AutosaveTimer {
        &self.autosave
    }

    pub fn set_autosave_enabled(&mut self, enabled: bool) {
        self.autosave.set_enabled(enabled);
    }

    // ------------------------------------------------------------------------
    // Simulation step
    // ------------------------------------------------------------------------

    /// Add `delta` seconds of playtime. Non-positive or non-finite deltas are ignored so
    /// the total never decreases.
    pub fn tick_playtime(&mut self, delta: f64) -> Mutation {
        let Some(record) = self.current.as_mut() else {
            return Mutation::NoRecord;
        };
        if !(delta.is_finite() && delta > 0.0) {
            return Mutation::Unchanged;
        }
        record.playtime_seconds += delta;
        Mutation::Applied
    }

    /// Advance the autosave accumulator; true means an autosave to slot 0 is due now.
    pub fn autosave_due(&mut self, delta: f64) -> bool {
        self.autosave.accumulate(delta)
    }

    // ------------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------------

    fn insert_into(
        &mut self,
        value: &str,
        select: impl FnOnce(&mut SaveRecord) -> &mut BTreeSet<String>,
    ) -> Mutation {
        let Some(record) = self.current.as_mut() else {
            return Mutation::NoRecord;
        };
        if select(record).insert(value.to_string()) {
            Mutation::Applied
        } else {
            Mutation::Unchanged
        }
    }

    /// Record the player's transform and active scene ahead of a save.
    pub fn capture_player(&mut self, position: Vec3, scene: &str) -> Mutation {
        let Some(record) = self.current.as_mut() else {
            return Mutation::NoRecord;
        };
        record.player_position = position;
        record.current_scene = scene.to_string();
        Mutation::Applied
    }

    /// Move the record to `room` and mark that room visited.
    pub fn enter_room(&mut self, room: &str) -> Mutation {
        let Some(record) = self.current.as_mut() else {
            return Mutation::NoRecord;
        };
        record.current_scene = room.to_string();
        record
            .room_states
            .entry(room.to_string())
            .or_default()
            .visited = true;
        Mutation::Applied
    }

    pub fn mark_room_completed(&mut self, room: &str) -> Mutation {
        let result = self.insert_into(room, |r| &mut r.completed_rooms);
        if result.is_applied() {
            if let Some(state) = self.room_state_mut(room) {
                state.completed = true;
            }
        }
        result
    }

    /// Record a memory fragment; keeps the song progress equal to the fragment count.
    pub fn add_fragment(&mut self, fragment_id: &str) -> Mutation {
        let result = self.insert_into(fragment_id, |r| &mut r.collected_fragments);
        if let (Mutation::Applied, Some(record)) = (result, self.current.as_mut()) {
            record.lullaby_song_progress = record.collected_fragments.len() as u32;
        }
        result
    }

    pub fn mark_puzzle_solved(&mut self, puzzle_id: &str) -> Mutation {
        self.insert_into(puzzle_id, |r| &mut r.completed_puzzles)
    }

    pub fn mark_examined(&mut self, object_id: &str) -> Mutation {
        self.insert_into(object_id, |r| &mut r.examined_objects)
    }

    pub fn mark_dialogue_triggered(&mut self, dialogue_id: &str) -> Mutation {
        self.insert_into(dialogue_id, |r| &mut r.triggered_dialogues)
    }

    /// Append an item unless it is already held.
    pub fn add_item(&mut self, item_id: &str) -> Mutation {
        if self.has_item(item_id) {
            return if self.current.is_some() {
                Mutation::Unchanged
            } else {
                Mutation::NoRecord
            };
        }
        self.push_item(item_id)
    }

    /// Append an item even if another copy is held. Only used for stacking consumables.
    pub fn push_item(&mut self, item_id: &str) -> Mutation {
        let Some(record) = self.current.as_mut() else {
            return Mutation::NoRecord;
        };
        record.inventory_items.push(item_id.to_string());
        *self.held.entry(item_id.to_string()).or_insert(0) += 1;
        Mutation::Applied
    }

    /// Remove the earliest-picked-up copy of an item.
    pub fn remove_item(&mut self, item_id: &str) -> Mutation {
        let Some(record) = self.current.as_mut() else {
            return Mutation::NoRecord;
        };
        let Some(position) = record.inventory_items.iter().position(|id| id == item_id) else {
            return Mutation::Unchanged;
        };
        record.inventory_items.remove(position);
        if let Some(count) = self.held.get_mut(item_id) {
            *count -= 1;
            if *count == 0 {
                self.held.remove(item_id);
            }
        }
        Mutation::Applied
    }

    pub fn set_chapter(&mut self, chapter: u32) -> Mutation {
        let Some(record) = self.current.as_mut() else {
            return Mutation::NoRecord;
        };
        if record.current_chapter == chapter {
            return Mutation::Unchanged;
        }
        record.current_chapter = chapter;
        Mutation::Applied
    }

    /// Mutable room sub-record, created empty on first access.
    pub fn room_state_mut(&mut self, room: &str) -> Option<&mut RoomState> {
        let record = self.current.as_mut()?;
        Some(record.room_states.entry(room.to_string()).or_default())
    }

    pub fn room_state(&self, room: &str) -> Option<&RoomState> {
        self.current.as_ref()?.room_states.get(room)
    }

    pub fn set_room_state(&mut self, room: &str, state: RoomState) -> Mutation {
        let Some(record) = self.current.as_mut() else {
            return Mutation::NoRecord;
        };
        record.room_states.insert(room.to_string(), state);
        Mutation::Applied
    }

    /// Remember that `item_id` has been handed to a multi-item puzzle.
    pub fn record_puzzle_delivery(&mut self, puzzle_id: &str, item_id: &str) -> Mutation {
        let Some(record) = self.current.as_mut() else {
            return Mutation::NoRecord;
        };
        let delivered = record
            .puzzle_progress
            .entry(puzzle_id.to_string())
            .or_default();
        if delivered.insert(item_id.to_string()) {
            Mutation::Applied
        } else {
            Mutation::Unchanged
        }
    }

    pub fn clear_puzzle_progress(&mut self, puzzle_id: &str) -> Mutation {
        let Some(record) = self.current.as_mut() else {
            return Mutation::NoRecord;
        };
        match record.puzzle_progress.remove(puzzle_id) {
            Some(_) => Mutation::Applied,
            None => Mutation::Unchanged,
        }
    }

    pub fn set_volume(&mut self, channel: VolumeChannel, value: f32) -> Mutation {
        let Some(record) = self.current.as_mut() else {
            return Mutation::NoRecord;
        };
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        match channel {
            VolumeChannel::Master => record.master_volume = value,
            VolumeChannel::Music => record.music_volume = value,
            VolumeChannel::Sfx => record.sfx_volume = value,
        }
        Mutation::Applied
    }

    pub fn set_subtitles(&mut self, enabled: bool) -> Mutation {
        let Some(record) = self.current.as_mut() else {
            return Mutation::NoRecord;
        };
        record.subtitles_enabled = enabled;
        Mutation::Applied
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn has_item(&self, item_id: &str) -> bool {
        self.current.is_some() && self.held.contains_key(item_id)
    }

    pub fn item_count(&self, item_id: &str) -> u32 {
        if self.current.is_none() {
            return 0;
        }
        self.held.get(item_id).copied().unwrap_or(0)
    }

    pub fn inventory_ids(&self) -> &[String] {
        self.current
            .as_ref()
            .map(|r| r.inventory_items.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_fragment(&self, fragment_id: &str) -> bool {
        self.current
            .as_ref()
            .is_some_and(|r| r.collected_fragments.contains(fragment_id))
    }

    pub fn is_puzzle_solved(&self, puzzle_id: &str) -> bool {
        self.current
            .as_ref()
            .is_some_and(|r| r.completed_puzzles.contains(puzzle_id))
    }

    pub fn is_room_completed(&self, room: &str) -> bool {
        self.current
            .as_ref()
            .is_some_and(|r| r.completed_rooms.contains(room))
    }

    pub fn was_object_examined(&self, object_id: &str) -> bool {
        self.current
            .as_ref()
            .is_some_and(|r| r.examined_objects.contains(object_id))
    }

    pub fn was_dialogue_triggered(&self, dialogue_id: &str) -> bool {
        self.current
            .as_ref()
            .is_some_and(|r| r.triggered_dialogues.contains(dialogue_id))
    }

    pub fn was_delivered(&self, puzzle_id: &str, item_id: &str) -> bool {
        self.current.as_ref().is_some_and(|r| {
            r.puzzle_progress
                .get(puzzle_id)
                .is_some_and(|delivered| delivered.contains(item_id))
        })
    }

    pub fn song_progress(&self) -> u32 {
        self.current
            .as_ref()
            .map(|r| r.lullaby_song_progress)
            .unwrap_or(0)
    }

    pub fn playtime_seconds(&self) -> f64 {
        self.current
            .as_ref()
            .map(|r| r.playtime_seconds)
            .unwrap_or(0.0)
    }

    pub fn playtime_hours(&self) -> f64 {
        self.playtime_seconds() / 3600.0
    }

    pub fn playtime_formatted(&self) -> String {
        match self.current.as_ref() {
            Some(record) => record.playtime_formatted(),
            None => "00:00:00".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (ProgressStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = ProgressStoreBuilder::new(temp.path().join("Saves"))
            .open()
            .unwrap();
        (store, temp)
    }

    #[test]
    fn autosave_fires_after_interval_is_exceeded() {
        let mut timer = AutosaveTimer::new(120.0, true);
        let fired: Vec<usize> = (1..=26)
            .filter(|_| timer.accumulate(10.0))
            .collect();
        assert_eq!(fired, vec![13, 26]);
        assert_eq!(timer.elapsed(), 0.0);
    }

    #[test]
    fn autosave_resets_to_zero_not_remainder() {
        let mut timer = AutosaveTimer::new(120.0, true);
        assert!(!timer.accumulate(100.0));
        assert!(timer.accumulate(50.0));
        assert_eq!(timer.elapsed(), 0.0);
    }

    #[test]
    fn disabled_autosave_never_fires() {
        let mut timer = AutosaveTimer::new(1.0, false);
        assert!(!timer.accumulate(10.0));
        assert!(!timer.is_enabled());
    }

    #[test]
    fn mutators_ignore_calls_without_record() {
        let (mut store, _temp) = open_store();
        assert_eq!(store.add_item("house_key"), Mutation::NoRecord);
        assert_eq!(store.mark_puzzle_solved("door"), Mutation::NoRecord);
        assert_eq!(store.tick_playtime(1.0), Mutation::NoRecord);
        assert!(store.room_state_mut("Room01_Foyer").is_none());
        assert!(!store.has_item("house_key"));
        assert_eq!(store.playtime_formatted(), "00:00:00");
        assert!(matches!(
            store.save(1, None),
            Err(ProgressError::NoActiveRecord)
        ));
    }

    #[test]
    fn set_semantics_are_idempotent() {
        let (mut store, _temp) = open_store();
        store.create_new();
        assert_eq!(store.mark_examined("portrait"), Mutation::Applied);
        assert_eq!(store.mark_examined("portrait"), Mutation::Unchanged);
        assert_eq!(store.add_item("candle"), Mutation::Applied);
        assert_eq!(store.add_item("candle"), Mutation::Unchanged);
        assert_eq!(store.inventory_ids().len(), 1);
    }

    #[test]
    fn fragments_drive_song_progress() {
        let (mut store, _temp) = open_store();
        store.create_new();
        store.add_fragment("mem_one");
        store.add_fragment("mem_two");
        store.add_fragment("mem_one");
        assert_eq!(store.song_progress(), 2);
        assert!(store.has_fragment("mem_two"));
    }

    #[test]
    fn pushed_duplicates_are_counted_and_removed_one_at_a_time() {
        let (mut store, _temp) = open_store();
        store.create_new();
        store.push_item("bread");
        store.push_item("bread");
        assert_eq!(store.item_count("bread"), 2);
        assert_eq!(store.remove_item("bread"), Mutation::Applied);
        assert!(store.has_item("bread"));
        assert_eq!(store.remove_item("bread"), Mutation::Applied);
        assert!(!store.has_item("bread"));
        assert_eq!(store.remove_item("bread"), Mutation::Unchanged);
    }

    #[test]
    fn completing_a_room_updates_its_state() {
        let (mut store, _temp) = open_store();
        store.create_new();
        store.enter_room("Room02_LivingRoom");
        store.mark_room_completed("Room02_LivingRoom");
        let state = store.room_state("Room02_LivingRoom").unwrap();
        assert!(state.visited);
        assert!(state.completed);
        assert_eq!(store.current().unwrap().current_scene, "Room02_LivingRoom");
    }

    #[test]
    fn volume_is_clamped() {
        let (mut store, _temp) = open_store();
        store.create_new();
        store.set_volume(VolumeChannel::Music, 1.7);
        store.set_volume(VolumeChannel::Sfx, -0.2);
        let record = store.current().unwrap();
        assert_eq!(record.music_volume, 1.0);
        assert_eq!(record.sfx_volume, 0.0);
    }
}
