//! Inventory Engine.
//!
//! Holds no inventory state of its own: every query and mutation goes through the
//! [`ProgressStore`], joined against the shared [`ItemCatalog`]. Changes are announced as
//! [`GameEvent`]s on the store's bus; narration goes through a [`Narrator`].

use crate::config::{DialogueConfig, InventoryConfig};
use crate::game::catalog::ItemCatalog;
use crate::game::dialogue::Narrator;
use crate::game::events::GameEvent;
use crate::game::progress::ProgressStore;
use crate::game::puzzle::{GateRegistry, ItemDelivery, PuzzleOutcome};
use crate::game::types::{ItemDefinition, Vec3};
use log::{debug, info, warn};
use std::sync::Arc;

pub struct InventoryManager {
    catalog: Arc<ItemCatalog>,
    pickup_range: f32,
    stack_consumables: bool,
    protagonist: String,
}

impl InventoryManager {
    pub fn new(catalog: Arc<ItemCatalog>, inventory: &InventoryConfig, dialogue: &DialogueConfig) -> Self {
        Self {
            catalog,
            pickup_range: inventory.pickup_range,
            stack_consumables: inventory.stack_consumables,
            protagonist: dialogue.protagonist.clone(),
        }
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn pickup_range(&self) -> f32 {
        self.pickup_range
    }

    /// Held items in pickup order. Ids the catalog no longer knows are skipped.
    pub fn list_items(&self, store: &ProgressStore) -> Vec<&ItemDefinition> {
        store
            .inventory_ids()
            .iter()
            .filter_map(|id| self.catalog.lookup(id))
            .collect()
    }

    pub fn has(&self, item_id: &str, store: &ProgressStore) -> bool {
        store.has_item(item_id)
    }

    /// Definition of a held item.
    pub fn get(&self, item_id: &str, store: &ProgressStore) -> Option<&ItemDefinition> {
        if !store.has_item(item_id) {
            return None;
        }
        self.catalog.lookup(item_id)
    }

    pub fn count(&self, store: &ProgressStore) -> usize {
        self.list_items(store).len()
    }

    pub fn has_any(&self, store: &ProgressStore) -> bool {
        self.count(store) > 0
    }

    pub fn key_items(&self, store: &ProgressStore) -> Vec<&ItemDefinition> {
        self.list_items(store)
            .into_iter()
            .filter(|item| item.is_key_item)
            .collect()
    }

    pub fn regular_items(&self, store: &ProgressStore) -> Vec<&ItemDefinition> {
        self.list_items(store)
            .into_iter()
            .filter(|item| !item.is_key_item)
            .collect()
    }

    pub fn has_all<S: AsRef<str>>(&self, item_ids: &[S], store: &ProgressStore) -> bool {
        item_ids.iter().all(|id| store.has_item(id.as_ref()))
    }

    /// Add a catalog item to the inventory.
    ///
    /// Rejects unknown ids and items already held (unless consumable stacking is on). A
    /// memory item also records its fragment and narrates the memory.
    pub fn add(&self, item_id: &str, store: &mut ProgressStore, narrator: &mut dyn Narrator) -> bool {
        let Some(item) = self.catalog.lookup(item_id) else {
            warn!("item not found in catalog: {}", item_id);
            return false;
        };

        if store.has_item(item_id) && !(item.is_consumable && self.stack_consumables) {
            debug!("already have item: {}", item.name);
            return false;
        }

        if !store.push_item(item_id).is_applied() {
            debug!("no active save; ignoring pickup of {}", item_id);
            return false;
        }
        store.publish(GameEvent::ItemAdded {
            item_id: item_id.to_string(),
        });

        if let Some(fragment) = item.memory_fragment() {
            if store.add_fragment(fragment).is_applied() {
                store.publish(GameEvent::FragmentCollected {
                    fragment_id: fragment.to_string(),
                });
                self.narrate_memory(item, narrator);
            }
        }

        info!("added item to inventory: {}", item.name);
        true
    }

    /// Remove one held copy of an item.
    pub fn remove(&self, item_id: &str, store: &mut ProgressStore) -> bool {
        if !store.remove_item(item_id).is_applied() {
            return false;
        }
        store.publish(GameEvent::ItemRemoved {
            item_id: item_id.to_string(),
        });
        debug!(
            "removed item from inventory: {}",
            self.catalog.display_name(item_id)
        );
        true
    }

    /// Use a held item at `player`.
    ///
    /// Resolution order: an untriggered memory, then the nearest in-range puzzle gate
    /// accepting the item, then a plain examine. A failed gate hand-off narrates the
    /// description and reports false.
    pub fn use_item(
        &self,
        item_id: &str,
        player: Vec3,
        store: &mut ProgressStore,
        gates: &GateRegistry,
        narrator: &mut dyn Narrator,
    ) -> bool {
        let Some(item) = self.get(item_id, store) else {
            debug!("cannot use {}: not held or unknown", item_id);
            return false;
        };
        if !item.is_usable {
            debug!("item {} is not usable", item.name);
            return false;
        }

        let mut consumed = false;
        let used = if let Some(fragment) = item
            .memory_fragment()
            .filter(|fragment| !store.has_fragment(fragment))
        {
            store.add_fragment(fragment);
            store.publish(GameEvent::FragmentCollected {
                fragment_id: fragment.to_string(),
            });
            self.narrate_memory(item, narrator);
            true
        } else if item.linked_puzzle().is_some() {
            match gates.nearest_accepting(item_id, player, self.pickup_range, store) {
                Some(gate) => match gate.use_single_item(item_id, self, store, narrator) {
                    ItemDelivery::Partial { consumed: c, .. } => {
                        consumed = c;
                        true
                    }
                    ItemDelivery::Completed {
                        outcome: PuzzleOutcome::Solved,
                        consumed: c,
                    } => {
                        consumed = c;
                        true
                    }
                    _ => {
                        self.narrate_examine(item, narrator);
                        false
                    }
                },
                None => {
                    debug!("no puzzle in range for {}", item_id);
                    self.narrate_examine(item, narrator);
                    false
                }
            }
        } else {
            self.narrate_examine(item, narrator);
            true
        };

        if used {
            store.publish(GameEvent::ItemUsed {
                item_id: item_id.to_string(),
            });
            if item.is_consumable && !consumed {
                self.remove(item_id, store);
            }
            info!("used item: {}", item.name);
        }
        used
    }

    fn narrate_memory(&self, item: &ItemDefinition, narrator: &mut dyn Narrator) {
        let text = format!(
            "*{} examines the {}*\n\n{}",
            self.protagonist, item.name, item.description
        );
        narrator.narrate(&self.protagonist, &text);
        info!(
            "memory fragment triggered: {}",
            item.memory_fragment().unwrap_or_default()
        );
    }

    fn narrate_examine(&self, item: &ItemDefinition, narrator: &mut dyn Narrator) {
        let text = format!("*{}*\n\n{}", item.name, item.description);
        narrator.narrate(&self.protagonist, &text);
    }
}
