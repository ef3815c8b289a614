use crate::game::dialogue::Narrator;
use crate::game::inventory::InventoryManager;
use crate::game::progress::ProgressStore;
use crate::game::types::Vec3;
use log::{info, warn};

pub const DEFAULT_PICKUP_MESSAGE: &str = "You found {itemName}!";

/// A world object bound to a catalog item.
#[derive(Debug, Clone)]
pub struct ItemPickup {
    pub item_id: String,
    pub position: Vec3,
    pub interaction_range: f32,
    /// `{itemName}` is replaced with the item's display name.
    pub message: String,
    pub hide_after_pickup: bool,
    pub speaker: String,
    picked_up: bool,
}

impl ItemPickup {
    pub fn new(item_id: &str, position: Vec3) -> Self {
        Self {
            item_id: item_id.to_string(),
            position,
            interaction_range: 2.0,
            message: DEFAULT_PICKUP_MESSAGE.to_string(),
            hide_after_pickup: true,
            speaker: "System".to_string(),
            picked_up: false,
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    pub fn with_speaker(mut self, speaker: &str) -> Self {
        self.speaker = speaker.to_string();
        self
    }

    pub fn stays_visible(mut self) -> Self {
        self.hide_after_pickup = false;
        self
    }

    /// Examined-object id recorded once the item is taken.
    pub fn object_id(&self) -> String {
        format!("pickup_{}_{}", self.item_id, self.position)
    }

    pub fn is_picked_up(&self) -> bool {
        self.picked_up
    }

    pub fn is_visible(&self) -> bool {
        !(self.picked_up && self.hide_after_pickup)
    }

    pub fn in_reach(&self, player: Vec3) -> bool {
        !self.picked_up && self.position.distance(&player) <= self.interaction_range
    }

    /// Sync with a freshly created or loaded record. The spot stays empty once its object
    /// id is recorded as examined, even after the item itself was consumed; an item
    /// already held is also treated as taken from here.
    pub fn rehydrate(&mut self, store: &ProgressStore) {
        self.picked_up =
            store.was_object_examined(&self.object_id()) || store.has_item(&self.item_id);
    }

    pub fn pick_up(
        &mut self,
        inventory: &InventoryManager,
        store: &mut ProgressStore,
        narrator: &mut dyn Narrator,
    ) -> bool {
        if self.picked_up {
            return false;
        }
        let Some(item) = inventory.catalog().lookup(&self.item_id) else {
            warn!("pickup bound to unknown item: {}", self.item_id);
            return false;
        };
        let name = item.name.clone();
        // a memory narration takes the dialogue surface instead of the pickup line
        let narrates_memory = item
            .memory_fragment()
            .is_some_and(|fragment| !store.has_fragment(fragment));

        if !inventory.add(&self.item_id, store, narrator) {
            return false;
        }
        self.picked_up = true;

        if !narrates_memory {
            let text = self.message.replace("{itemName}", &name);
            narrator.narrate(&self.speaker, &text);
        }
        store.mark_examined(&self.object_id());
        info!("picked up: {}", name);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::progress::ProgressStoreBuilder;
    use tempfile::TempDir;

    #[test]
    fn object_id_includes_position() {
        let pickup = ItemPickup::new("candle", Vec3::new(1.0, 0.5, -2.0));
        assert_eq!(pickup.object_id(), "pickup_candle_(1.00, 0.50, -2.00)");
    }

    #[test]
    fn reach_uses_interaction_range() {
        let pickup = ItemPickup::new("candle", Vec3::ZERO);
        assert!(pickup.in_reach(Vec3::new(2.0, 0.0, 0.0)));
        assert!(!pickup.in_reach(Vec3::new(2.5, 0.0, 0.0)));
        assert!(pickup.is_visible());
    }

    #[test]
    fn rehydrate_keeps_spot_empty_after_item_is_gone() {
        let temp = TempDir::new().unwrap();
        let mut store = ProgressStoreBuilder::new(temp.path()).open().unwrap();
        store.create_new();
        let mut pickup = ItemPickup::new("candle", Vec3::new(1.0, 0.0, 0.0));

        pickup.rehydrate(&store);
        assert!(!pickup.is_picked_up());

        store.mark_examined(&pickup.object_id());
        pickup.rehydrate(&store);
        assert!(pickup.is_picked_up());
        assert!(!pickup.is_visible());

        // another spot for the same item is unaffected
        let mut other = ItemPickup::new("candle", Vec3::new(4.0, 0.0, 0.0));
        other.rehydrate(&store);
        assert!(!other.is_picked_up());
    }
}
