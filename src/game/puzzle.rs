//! Puzzle gates: world objects whose action is conditioned on held items.
//!
//! A gate keeps no solved flag of its own. Solved state lives in the store
//! (`completedPuzzles`), as do items already handed to a multi-item gate
//! (`puzzleProgress`), so a gate picks up where it left off after a load.

use crate::game::dialogue::Narrator;
use crate::game::events::GameEvent;
use crate::game::inventory::InventoryManager;
use crate::game::progress::ProgressStore;
use crate::game::types::Vec3;
use log::{debug, info};

/// Result of [`PuzzleGate::attempt_resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleOutcome {
    /// Required items neither held nor delivered, by id.
    MissingItems(Vec<String>),
    AlreadySolved,
    Solved,
}

/// Result of handing a single item to a gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemDelivery {
    /// The gate is not interactable or does not want this item.
    Rejected,
    /// Item recorded; the gate still needs `still_needed`.
    Partial {
        still_needed: Vec<String>,
        consumed: bool,
    },
    /// The item was the last one missing and the gate attempted to resolve.
    Completed {
        outcome: PuzzleOutcome,
        consumed: bool,
    },
}

/// Announcements a gate narrates through the system speaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateMessages {
    pub missing_items: String,
    pub already_solved: String,
    pub success: String,
}

impl Default for GateMessages {
    fn default() -> Self {
        Self {
            missing_items: "You need the right items to solve this.".to_string(),
            already_solved: "This puzzle has already been solved.".to_string(),
            success: "Puzzle solved!".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PuzzleGate {
    pub puzzle_id: String,
    pub required_items: Vec<String>,
    pub consume_on_use: bool,
    pub repeatable: bool,
    pub position: Vec3,
    pub interaction_range: f32,
    /// Room whose `RoomState.solved_puzzles` also records this gate.
    pub room: Option<String>,
    pub speaker: String,
    pub messages: GateMessages,
}

impl PuzzleGate {
    pub fn new<S: Into<String>>(puzzle_id: &str, required_items: impl IntoIterator<Item = S>) -> Self {
        Self {
            puzzle_id: puzzle_id.to_string(),
            required_items: required_items.into_iter().map(Into::into).collect(),
            consume_on_use: true,
            repeatable: false,
            position: Vec3::ZERO,
            interaction_range: 2.0,
            room: None,
            speaker: "System".to_string(),
            messages: GateMessages::default(),
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn in_room(mut self, room: &str) -> Self {
        self.room = Some(room.to_string());
        self
    }

    pub fn keep_items(mut self) -> Self {
        self.consume_on_use = false;
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn with_range(mut self, range: f32) -> Self {
        self.interaction_range = range;
        self
    }

    pub fn with_speaker(mut self, speaker: &str) -> Self {
        self.speaker = speaker.to_string();
        self
    }

    pub fn with_messages(mut self, messages: GateMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn is_solved(&self, store: &ProgressStore) -> bool {
        store.is_puzzle_solved(&self.puzzle_id)
    }

    /// Unsolved, or solved but repeatable.
    pub fn is_interactable(&self, store: &ProgressStore) -> bool {
        self.repeatable || !self.is_solved(store)
    }

    pub fn can_accept(&self, item_id: &str, store: &ProgressStore) -> bool {
        self.is_interactable(store)
            && self.required_items.iter().any(|id| id == item_id)
            && !store.was_delivered(&self.puzzle_id, item_id)
    }

    fn is_satisfied(&self, item_id: &str, store: &ProgressStore) -> bool {
        store.has_item(item_id) || store.was_delivered(&self.puzzle_id, item_id)
    }

    /// Required ids that are neither held nor already delivered.
    pub fn missing_items(&self, store: &ProgressStore) -> Vec<String> {
        self.required_items
            .iter()
            .filter(|id| !self.is_satisfied(id, store))
            .cloned()
            .collect()
    }

    /// Try to solve the gate with what is held and delivered so far.
    pub fn attempt_resolve(
        &self,
        inventory: &InventoryManager,
        store: &mut ProgressStore,
        narrator: &mut dyn Narrator,
    ) -> PuzzleOutcome {
        if !self.is_interactable(store) {
            narrator.narrate(&self.speaker, &self.messages.already_solved);
            return PuzzleOutcome::AlreadySolved;
        }

        let missing = self.missing_items(store);
        if !missing.is_empty() {
            let text = self.missing_message(&missing, inventory);
            narrator.narrate(&self.speaker, &text);
            debug!("puzzle {} missing {:?}", self.puzzle_id, missing);
            return PuzzleOutcome::MissingItems(missing);
        }

        self.complete(inventory, store, narrator);
        PuzzleOutcome::Solved
    }

    /// Hand one item to the gate. The gate solves once nothing else is missing;
    /// otherwise the item is recorded as delivered and the rest is narrated.
    pub fn use_single_item(
        &self,
        item_id: &str,
        inventory: &InventoryManager,
        store: &mut ProgressStore,
        narrator: &mut dyn Narrator,
    ) -> ItemDelivery {
        if !self.can_accept(item_id, store) {
            return ItemDelivery::Rejected;
        }

        let still_needed: Vec<String> = self
            .required_items
            .iter()
            .filter(|id| id.as_str() != item_id && !self.is_satisfied(id, store))
            .cloned()
            .collect();

        if still_needed.is_empty() {
            let outcome = self.attempt_resolve(inventory, store, narrator);
            let consumed = outcome == PuzzleOutcome::Solved && self.consume_on_use;
            return ItemDelivery::Completed { outcome, consumed };
        }

        if self.consume_on_use {
            inventory.remove(item_id, store);
        }
        store.record_puzzle_delivery(&self.puzzle_id, item_id);
        store.publish(GameEvent::PuzzleItemUsed {
            puzzle_id: self.puzzle_id.clone(),
            item_id: item_id.to_string(),
        });

        let names: Vec<&str> = still_needed
            .iter()
            .map(|id| inventory.catalog().display_name(id))
            .collect();
        let text = format!(
            "Used {}. Still need: {}",
            inventory.catalog().display_name(item_id),
            names.join(", ")
        );
        narrator.narrate(&self.speaker, &text);

        ItemDelivery::Partial {
            still_needed,
            consumed: self.consume_on_use,
        }
    }

    fn complete(&self, inventory: &InventoryManager, store: &mut ProgressStore, narrator: &mut dyn Narrator) {
        for item_id in &self.required_items {
            let delivered = store.was_delivered(&self.puzzle_id, item_id);
            if self.consume_on_use && !delivered {
                inventory.remove(item_id, store);
            }
            if !delivered {
                store.publish(GameEvent::PuzzleItemUsed {
                    puzzle_id: self.puzzle_id.clone(),
                    item_id: item_id.clone(),
                });
            }
        }
        store.clear_puzzle_progress(&self.puzzle_id);

        store.mark_puzzle_solved(&self.puzzle_id);
        if let Some(room) = &self.room {
            if let Some(state) = store.room_state_mut(room) {
                state.solved_puzzles.insert(self.puzzle_id.clone());
            }
        }
        store.publish(GameEvent::PuzzleSolved {
            puzzle_id: self.puzzle_id.clone(),
        });

        narrator.narrate(&self.speaker, &self.messages.success);
        info!("puzzle solved: {}", self.puzzle_id);
    }

    fn missing_message(&self, missing: &[String], inventory: &InventoryManager) -> String {
        if missing.is_empty() {
            return self.messages.missing_items.clone();
        }
        let names: Vec<&str> = missing
            .iter()
            .map(|id| inventory.catalog().display_name(id))
            .collect();
        format!("You need: {}", names.join(", "))
    }
}

/// Gates placed in the loaded world, in registration order.
#[derive(Debug, Clone, Default)]
pub struct GateRegistry {
    gates: Vec<PuzzleGate>,
}

impl GateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gate, replacing an earlier gate with the same puzzle id in place.
    pub fn register(&mut self, gate: PuzzleGate) {
        match self.gates.iter_mut().find(|g| g.puzzle_id == gate.puzzle_id) {
            Some(existing) => *existing = gate,
            None => self.gates.push(gate),
        }
    }

    pub fn get(&self, puzzle_id: &str) -> Option<&PuzzleGate> {
        self.gates.iter().find(|g| g.puzzle_id == puzzle_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PuzzleGate> {
        self.gates.iter()
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn clear(&mut self) {
        self.gates.clear();
    }

    /// Nearest gate within `range` of `player` accepting `item_id`. Equal distances
    /// resolve to the earlier registration.
    pub fn nearest_accepting(
        &self,
        item_id: &str,
        player: Vec3,
        range: f32,
        store: &ProgressStore,
    ) -> Option<&PuzzleGate> {
        nearest(
            self.gates
                .iter()
                .filter(|gate| gate.can_accept(item_id, store))
                .map(|gate| (gate, gate.position.distance(&player)))
                .filter(|(_, distance)| *distance <= range),
        )
    }

    /// Nearest gate whose own interaction range covers `player`.
    pub fn nearest_in_reach(&self, player: Vec3) -> Option<&PuzzleGate> {
        nearest(
            self.gates
                .iter()
                .map(|gate| (gate, gate.position.distance(&player)))
                .filter(|(gate, distance)| *distance <= gate.interaction_range),
        )
    }
}

fn nearest<'a>(candidates: impl Iterator<Item = (&'a PuzzleGate, f32)>) -> Option<&'a PuzzleGate> {
    let mut best: Option<(&PuzzleGate, f32)> = None;
    for (gate, distance) in candidates {
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((gate, distance)),
        }
    }
    best.map(|(gate, _)| gate)
}
