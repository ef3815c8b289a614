/// Integration tests for the inventory engine against the shipped item content
mod common;

use tempfile::TempDir;

use common::{fixture_catalog, RecordingNarrator};
use lullaby::config::{DialogueConfig, InventoryConfig};
use lullaby::game::{
    drain, GameEvent, GateRegistry, InventoryManager, ProgressStore, ProgressStoreBuilder,
    PuzzleGate, Vec3,
};

fn setup() -> (InventoryManager, ProgressStore, TempDir) {
    let inventory = InventoryManager::new(
        fixture_catalog(),
        &InventoryConfig::default(),
        &DialogueConfig::default(),
    );
    let dir = TempDir::new().expect("tempdir");
    let mut store = ProgressStoreBuilder::new(dir.path()).open().expect("store");
    store.create_new();
    (inventory, store, dir)
}

#[test]
fn test_shipped_content_validates_clean() {
    let catalog = fixture_catalog();
    assert!(catalog.validate().is_empty());
    assert!(catalog.lookup("house_key").unwrap().is_key_item);
    assert!(!catalog.lookup("torn_page").unwrap().is_usable);
}

#[test]
fn test_adding_twice_changes_state_once() {
    let (inventory, mut store, _dir) = setup();
    let mut narrator = RecordingNarrator::default();
    assert!(inventory.add("house_key", &mut store, &mut narrator));
    assert!(!inventory.add("house_key", &mut store, &mut narrator));
    assert_eq!(store.inventory_ids().len(), 1);
    assert_eq!(inventory.count(&store), 1);
    assert!(inventory.has_any(&store));
}

#[test]
fn test_unknown_ids_are_skipped_when_listing() {
    let (inventory, mut store, _dir) = setup();
    store.add_item("candle");
    store.add_item("item_removed_from_content");
    store.add_item("house_key");

    let names: Vec<&str> = inventory
        .list_items(&store)
        .iter()
        .map(|item| item.name.as_str())
        .collect();
    assert_eq!(names, vec!["Candle", "House Key"]);
    assert_eq!(inventory.key_items(&store).len(), 1);
    assert_eq!(inventory.regular_items(&store).len(), 1);
}

#[test]
fn test_add_remove_use_publish_events() {
    let (inventory, mut store, _dir) = setup();
    let mut narrator = RecordingNarrator::default();
    let gates = GateRegistry::new();
    let rx = store.subscribe();

    inventory.add("bread", &mut store, &mut narrator);
    inventory.add("silver_spoon", &mut store, &mut narrator);
    assert!(inventory.remove("silver_spoon", &mut store));
    assert!(!inventory.remove("silver_spoon", &mut store));
    assert!(inventory.use_item("bread", Vec3::ZERO, &mut store, &gates, &mut narrator));

    let item = |id: &str| id.to_string();
    assert_eq!(
        drain(&rx),
        vec![
            GameEvent::ItemAdded { item_id: item("bread") },
            GameEvent::ItemAdded { item_id: item("silver_spoon") },
            GameEvent::ItemRemoved { item_id: item("silver_spoon") },
            GameEvent::ItemUsed { item_id: item("bread") },
            GameEvent::ItemRemoved { item_id: item("bread") },
        ]
    );
    assert!(!inventory.has("bread", &store));
}

#[test]
fn test_memory_item_on_pickup_records_fragment_once() {
    let (inventory, mut store, _dir) = setup();
    let mut narrator = RecordingNarrator::default();
    let gates = GateRegistry::new();

    assert!(inventory.add("music_box", &mut store, &mut narrator));
    assert!(store.has_fragment("mem_music_box"));
    assert_eq!(store.song_progress(), 1);
    assert!(narrator
        .last_text()
        .unwrap()
        .starts_with("*Lisa examines the Music Box*\n\n"));

    // the memory is spent, so using it is a plain examine
    assert!(inventory.use_item("music_box", Vec3::ZERO, &mut store, &gates, &mut narrator));
    assert!(narrator.last_text().unwrap().starts_with("*Music Box*\n\n"));
    assert_eq!(store.song_progress(), 1);
}

#[test]
fn test_untriggered_memory_takes_priority_over_puzzle() {
    let (inventory, mut store, _dir) = setup();
    let mut narrator = RecordingNarrator::default();
    let mut gates = GateRegistry::new();
    gates.register(PuzzleGate::new("bedroom_cradle", ["teddy_bear"]));

    // restored from an old save: held but the memory never played
    store.add_item("teddy_bear");
    assert!(inventory.use_item("teddy_bear", Vec3::ZERO, &mut store, &gates, &mut narrator));
    assert!(store.has_fragment("mem_teddy_bear"));
    assert!(!store.is_puzzle_solved("bedroom_cradle"));
    assert!(store.has_item("teddy_bear"));

    assert!(inventory.use_item("teddy_bear", Vec3::ZERO, &mut store, &gates, &mut narrator));
    assert!(store.is_puzzle_solved("bedroom_cradle"));
    assert!(!store.has_item("teddy_bear"));
}

#[test]
fn test_consumable_handed_to_gate_is_removed_once() {
    let (inventory, mut store, _dir) = setup();
    let mut narrator = RecordingNarrator::default();
    let mut gates = GateRegistry::new();
    gates.register(
        PuzzleGate::new("dining_candelabra", ["candle", "matches"]).at(Vec3::new(1.0, 0.0, 0.0)),
    );
    store.push_item("candle");
    store.push_item("candle");
    store.add_item("matches");

    assert!(inventory.use_item("candle", Vec3::ZERO, &mut store, &gates, &mut narrator));
    assert!(store.is_puzzle_solved("dining_candelabra"));
    assert_eq!(store.item_count("candle"), 1);
    assert!(!store.has_item("matches"));
}

#[test]
fn test_held_consumable_can_be_added_again_by_default() {
    let (inventory, mut store, _dir) = setup();
    let mut narrator = RecordingNarrator::default();

    assert!(inventory.add("bread", &mut store, &mut narrator));
    assert!(inventory.add("bread", &mut store, &mut narrator));
    assert_eq!(store.item_count("bread"), 2);
    // non-consumables stay unique
    assert!(inventory.add("house_key", &mut store, &mut narrator));
    assert!(!inventory.add("house_key", &mut store, &mut narrator));
    assert_eq!(store.inventory_ids().len(), 3);
}

#[test]
fn test_consumable_stacking_can_be_disabled() {
    let inventory = InventoryManager::new(
        fixture_catalog(),
        &InventoryConfig {
            stack_consumables: false,
            ..InventoryConfig::default()
        },
        &DialogueConfig::default(),
    );
    let dir = TempDir::new().expect("tempdir");
    let mut store = ProgressStoreBuilder::new(dir.path()).open().expect("store");
    store.create_new();
    let mut narrator = RecordingNarrator::default();

    assert!(inventory.add("bread", &mut store, &mut narrator));
    assert!(!inventory.add("bread", &mut store, &mut narrator));
    assert_eq!(store.item_count("bread"), 1);
}

#[test]
fn test_calls_before_any_record_are_ignored() {
    let inventory = InventoryManager::new(
        fixture_catalog(),
        &InventoryConfig::default(),
        &DialogueConfig::default(),
    );
    let dir = TempDir::new().expect("tempdir");
    let mut store = ProgressStoreBuilder::new(dir.path()).open().expect("store");
    let mut narrator = RecordingNarrator::default();

    assert!(!inventory.add("house_key", &mut store, &mut narrator));
    assert!(!inventory.remove("house_key", &mut store));
    assert!(inventory.list_items(&store).is_empty());
    assert!(narrator.lines.is_empty());
}
