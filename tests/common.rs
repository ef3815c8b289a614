//! Test utilities & fixtures.
//! Item content comes from `data/items.json`; collaborators are recorded by small doubles.
#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use lullaby::config::Config;
use lullaby::game::{DialogueHost, ItemCatalog, Narrator, Vec3, WorldPort};

/// Path to the shipped item content.
pub fn items_fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("items.json")
}

pub fn fixture_catalog() -> Arc<ItemCatalog> {
    Arc::new(ItemCatalog::load(items_fixture()).expect("item fixture"))
}

/// Default configuration with saves redirected into `dir`.
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.saves.dir = dir.to_string_lossy().into_owned();
    config
}

#[derive(Default)]
pub struct RecordingNarrator {
    pub lines: Vec<(String, String)>,
}

impl RecordingNarrator {
    pub fn last_text(&self) -> Option<&str> {
        self.lines.last().map(|(_, text)| text.as_str())
    }
}

impl Narrator for RecordingNarrator {
    fn narrate(&mut self, speaker: &str, text: &str) {
        self.lines.push((speaker.to_string(), text.to_string()));
    }
}

#[derive(Default)]
pub struct HostLog {
    pub input_enabled: Option<bool>,
    pub joystick_visible: Option<bool>,
    pub panel_visible: Option<bool>,
    pub shown: Vec<(String, String)>,
    pub cues: Vec<String>,
    pub stops: usize,
}

impl HostLog {
    /// How many times exactly `text` was drawn.
    pub fn times_shown(&self, text: &str) -> usize {
        self.shown.iter().filter(|(_, t)| t == text).count()
    }
}

pub struct RecordingHost(pub Rc<RefCell<HostLog>>);

impl DialogueHost for RecordingHost {
    fn set_player_input_enabled(&mut self, enabled: bool) {
        self.0.borrow_mut().input_enabled = Some(enabled);
    }

    fn set_joystick_visible(&mut self, visible: bool) {
        self.0.borrow_mut().joystick_visible = Some(visible);
    }

    fn set_panel_visible(&mut self, visible: bool) {
        self.0.borrow_mut().panel_visible = Some(visible);
    }

    fn show_line(&mut self, speaker: &str, visible_text: &str) {
        self.0
            .borrow_mut()
            .shown
            .push((speaker.to_string(), visible_text.to_string()));
    }

    fn play_cue(&mut self, clip: &str) {
        self.0.borrow_mut().cues.push(clip.to_string());
    }

    fn stop_cue(&mut self) {
        self.0.borrow_mut().stops += 1;
    }
}

pub fn recording_host() -> (Box<dyn DialogueHost>, Rc<RefCell<HostLog>>) {
    let log = Rc::new(RefCell::new(HostLog::default()));
    (Box::new(RecordingHost(log.clone())), log)
}

#[derive(Default)]
pub struct WorldLog {
    pub position: Option<Vec3>,
    pub scene: String,
    pub loaded_scenes: Vec<String>,
    pub restored_positions: Vec<Vec3>,
    pub master_volume: Option<f32>,
}

pub struct FakeWorld(pub Rc<RefCell<WorldLog>>);

impl WorldPort for FakeWorld {
    fn player_position(&self) -> Option<Vec3> {
        self.0.borrow().position
    }

    fn set_player_position(&mut self, position: Vec3) {
        let mut log = self.0.borrow_mut();
        log.position = Some(position);
        log.restored_positions.push(position);
    }

    fn active_scene(&self) -> String {
        self.0.borrow().scene.clone()
    }

    fn load_scene(&mut self, scene: &str) {
        let mut log = self.0.borrow_mut();
        log.scene = scene.to_string();
        log.loaded_scenes.push(scene.to_string());
    }

    fn apply_master_volume(&mut self, volume: f32) {
        self.0.borrow_mut().master_volume = Some(volume);
    }
}

pub fn fake_world(scene: &str, position: Vec3) -> (Box<dyn WorldPort>, Rc<RefCell<WorldLog>>) {
    let log = Rc::new(RefCell::new(WorldLog {
        position: Some(position),
        scene: scene.to_string(),
        ..WorldLog::default()
    }));
    (Box::new(FakeWorld(log.clone())), log)
}
