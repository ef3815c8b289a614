//! Dialogue Sequencer: a single-flight modal state machine presenting ordered lines with
//! a timed character reveal.
//!
//! ```text
//! Idle -> Typing -> AwaitingAdvance -> Typing (next line) | Idle
//!           |  ^
//!   confirm v  | (next tick)
//!        Interrupted -> AwaitingAdvance
//! ```
//!
//! The reveal is an explicit cursor advanced by [`DialogueSequencer::tick`] once per
//! simulation step. A confirm during `Typing` only raises the interrupt; the next tick
//! completes the line. Presentation and player-control side effects go through the
//! injected [`DialogueHost`].

use crate::config::DialogueConfig;
use crate::game::types::DialogueLine;
use crate::logutil::{escape_log, DIALOGUE_PREVIEW};
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Typing-cue configuration for one speaker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeakerProfile {
    pub name: String,
    #[serde(default)]
    pub typing_sounds: Vec<String>,
}

/// Presentation surface and player controls owned by the sequencer while a session runs.
pub trait DialogueHost {
    fn set_player_input_enabled(&mut self, enabled: bool);
    fn set_joystick_visible(&mut self, visible: bool);
    fn set_panel_visible(&mut self, visible: bool);
    /// Redraw the dialogue surface with the currently visible part of a line.
    fn show_line(&mut self, speaker: &str, visible_text: &str);
    fn play_cue(&mut self, clip: &str);
    fn stop_cue(&mut self);
}

/// Host that presents nothing. Useful for headless runs.
#[derive(Debug, Default)]
pub struct NullDialogueHost;

impl DialogueHost for NullDialogueHost {
    fn set_player_input_enabled(&mut self, _enabled: bool) {}
    fn set_joystick_visible(&mut self, _visible: bool) {}
    fn set_panel_visible(&mut self, _visible: bool) {}
    fn show_line(&mut self, _speaker: &str, _visible_text: &str) {}
    fn play_cue(&mut self, _clip: &str) {}
    fn stop_cue(&mut self) {}
}

/// Fire-and-forget one-line announcements. Callers never wait for the line to finish.
pub trait Narrator {
    fn narrate(&mut self, speaker: &str, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    Idle,
    Typing,
    AwaitingAdvance,
    Interrupted,
}

#[derive(Debug, Clone, Default)]
struct RevealCursor {
    line: usize,
    chars_shown: usize,
    elapsed: f32,
    sound_counter: u32,
    /// Time spent fully revealed, for lines that advance on their own.
    held: f32,
}

pub struct DialogueSequencer {
    host: Box<dyn DialogueHost>,
    speakers: Vec<SpeakerProfile>,
    characters_per_sound: u32,
    auto_advance_delay: f32,
    default_reveal_interval: f32,
    lines: Vec<DialogueLine>,
    chars: Vec<char>,
    visible: String,
    state: DialogueState,
    cursor: RevealCursor,
}

impl DialogueSequencer {
    pub fn new(host: Box<dyn DialogueHost>, config: &DialogueConfig) -> Self {
        Self {
            host,
            speakers: config.speakers.clone(),
            characters_per_sound: config.characters_per_sound.max(1),
            auto_advance_delay: config.auto_advance_delay,
            default_reveal_interval: config.default_reveal_interval,
            lines: Vec::new(),
            chars: Vec::new(),
            visible: String::new(),
            state: DialogueState::Idle,
            cursor: RevealCursor::default(),
        }
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != DialogueState::Idle
    }

    pub fn visible_text(&self) -> &str {
        &self.visible
    }

    pub fn current_line(&self) -> Option<&DialogueLine> {
        if self.is_active() {
            self.lines.get(self.cursor.line)
        } else {
            None
        }
    }

    pub fn line_index(&self) -> usize {
        self.cursor.line
    }

    /// Begin a session, tearing down any session in flight. Returns false (and changes
    /// nothing) for an empty sequence.
    pub fn start(&mut self, lines: Vec<DialogueLine>) -> bool {
        if lines.is_empty() {
            warn!("no dialogue lines provided");
            return false;
        }
        if self.is_active() {
            debug!("replacing active dialogue session");
            self.host.stop_cue();
        }

        info!("started dialogue with {} lines", lines.len());
        self.lines = lines;
        self.host.set_player_input_enabled(false);
        self.host.set_joystick_visible(false);
        self.host.set_panel_visible(true);
        self.begin_line(0);
        true
    }

    /// Overloaded confirm input: skip the reveal while typing, advance otherwise.
    pub fn confirm(&mut self) {
        match self.state {
            DialogueState::Typing => {
                self.state = DialogueState::Interrupted;
                self.host.stop_cue();
            }
            DialogueState::AwaitingAdvance => self.next_line(),
            DialogueState::Interrupted | DialogueState::Idle => {}
        }
    }

    /// Advance the reveal and auto-advance timers by `delta` seconds.
    pub fn tick(&mut self, delta: f32) {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        match self.state {
            DialogueState::Idle => {}
            DialogueState::Interrupted => self.finish_line(),
            DialogueState::Typing => self.advance_reveal(delta),
            DialogueState::AwaitingAdvance => {
                let waits = self
                    .lines
                    .get(self.cursor.line)
                    .map_or(true, |line| line.wait_for_input);
                if waits {
                    return;
                }
                self.cursor.held += delta;
                if self.cursor.held >= self.auto_advance_delay {
                    self.next_line();
                }
            }
        }
    }

    /// End the session. Safe to call with nothing active; always restores player input.
    pub fn end(&mut self) {
        if self.is_active() {
            info!("ending dialogue");
        }
        self.host.stop_cue();
        self.host.set_panel_visible(false);
        self.host.set_joystick_visible(true);
        self.host.set_player_input_enabled(true);
        self.lines.clear();
        self.chars.clear();
        self.visible.clear();
        self.cursor = RevealCursor::default();
        self.state = DialogueState::Idle;
    }

    fn begin_line(&mut self, index: usize) {
        let Some(line) = self.lines.get(index) else {
            self.end();
            return;
        };
        self.chars = line.text.chars().collect();
        self.visible.clear();
        self.cursor = RevealCursor {
            line: index,
            ..RevealCursor::default()
        };
        self.state = DialogueState::Typing;
        // first character appears as soon as the line starts
        if !self.chars.is_empty() {
            self.reveal_next_char();
        }
    }

    fn advance_reveal(&mut self, delta: f32) {
        let interval = self
            .lines
            .get(self.cursor.line)
            .map_or(0.0, |line| line.reveal_interval);
        if interval <= 0.0 {
            self.finish_line();
            return;
        }

        self.cursor.elapsed += delta;
        while self.cursor.elapsed >= interval {
            self.cursor.elapsed -= interval;
            if self.cursor.chars_shown < self.chars.len() {
                self.reveal_next_char();
            } else {
                self.finish_line();
                break;
            }
        }
    }

    fn reveal_next_char(&mut self) {
        let Some(&ch) = self.chars.get(self.cursor.chars_shown) else {
            return;
        };
        self.cursor.chars_shown += 1;
        self.visible.push(ch);

        let speaker = self.current_speaker();
        self.host.show_line(&speaker, &self.visible);

        if !ch.is_whitespace() {
            self.cursor.sound_counter += 1;
            if self.cursor.sound_counter >= self.characters_per_sound {
                self.cursor.sound_counter = 0;
                self.play_typing_cue(&speaker);
            }
        }
    }

    fn finish_line(&mut self) {
        self.host.stop_cue();
        if self.cursor.chars_shown < self.chars.len() {
            self.cursor.chars_shown = self.chars.len();
            self.visible = self.chars.iter().collect();
            let speaker = self.current_speaker();
            self.host.show_line(&speaker, &self.visible);
        }
        self.cursor.elapsed = 0.0;
        self.cursor.held = 0.0;
        self.state = DialogueState::AwaitingAdvance;
        debug!("finished typing: {}", escape_log(&self.visible, DIALOGUE_PREVIEW));
    }

    fn next_line(&mut self) {
        let next = self.cursor.line + 1;
        if next < self.lines.len() {
            self.begin_line(next);
        } else {
            self.end();
        }
    }

    fn current_speaker(&self) -> String {
        self.lines
            .get(self.cursor.line)
            .map(|line| line.speaker.clone())
            .unwrap_or_default()
    }

    /// Profile matching `name` case-insensitively, else the first profile.
    fn speaker_profile(&self, name: &str) -> Option<&SpeakerProfile> {
        self.speakers
            .iter()
            .find(|profile| profile.name.eq_ignore_ascii_case(name))
            .or_else(|| self.speakers.first())
    }

    fn play_typing_cue(&mut self, speaker: &str) {
        let clip = self
            .speaker_profile(speaker)
            .and_then(|profile| profile.typing_sounds.choose(&mut rand::thread_rng()))
            .cloned();
        if let Some(clip) = clip {
            // one cue at a time
            self.host.stop_cue();
            self.host.play_cue(&clip);
        }
    }
}

impl Narrator for DialogueSequencer {
    fn narrate(&mut self, speaker: &str, text: &str) {
        let line = DialogueLine::new(text, speaker).with_interval(self.default_reveal_interval);
        self.start(vec![line]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct HostLog {
        input_enabled: Option<bool>,
        panel_visible: Option<bool>,
        cues: usize,
        stops: usize,
        shown: Vec<String>,
    }

    struct Recorder(Rc<RefCell<HostLog>>);

    impl DialogueHost for Recorder {
        fn set_player_input_enabled(&mut self, enabled: bool) {
            self.0.borrow_mut().input_enabled = Some(enabled);
        }
        fn set_joystick_visible(&mut self, _visible: bool) {}
        fn set_panel_visible(&mut self, visible: bool) {
            self.0.borrow_mut().panel_visible = Some(visible);
        }
        fn show_line(&mut self, _speaker: &str, visible_text: &str) {
            self.0.borrow_mut().shown.push(visible_text.to_string());
        }
        fn play_cue(&mut self, _clip: &str) {
            self.0.borrow_mut().cues += 1;
        }
        fn stop_cue(&mut self) {
            self.0.borrow_mut().stops += 1;
        }
    }

    fn sequencer(characters_per_sound: u32) -> (DialogueSequencer, Rc<RefCell<HostLog>>) {
        let log = Rc::new(RefCell::new(HostLog::default()));
        let config = DialogueConfig {
            characters_per_sound,
            speakers: vec![SpeakerProfile {
                name: "Lisa".to_string(),
                typing_sounds: vec!["tick.wav".to_string()],
            }],
            ..DialogueConfig::default()
        };
        (
            DialogueSequencer::new(Box::new(Recorder(log.clone())), &config),
            log,
        )
    }

    #[test]
    fn empty_start_is_ignored() {
        let (mut seq, log) = sequencer(1);
        assert!(!seq.start(Vec::new()));
        assert_eq!(seq.state(), DialogueState::Idle);
        assert_eq!(log.borrow().input_enabled, None);
    }

    #[test]
    fn start_takes_player_control() {
        let (mut seq, log) = sequencer(1);
        assert!(seq.start(vec![DialogueLine::new("Hi", "Lisa")]));
        assert_eq!(seq.state(), DialogueState::Typing);
        assert_eq!(seq.visible_text(), "H");
        assert_eq!(log.borrow().input_enabled, Some(false));
        assert_eq!(log.borrow().panel_visible, Some(true));
    }

    #[test]
    fn whitespace_does_not_cue_and_cues_are_throttled() {
        let (mut seq, log) = sequencer(2);
        seq.start(vec![DialogueLine::new("ab cd e", "Lisa").with_interval(0.1)]);
        for _ in 0..20 {
            seq.tick(0.1);
        }
        assert_eq!(seq.state(), DialogueState::AwaitingAdvance);
        // five visible characters, one cue per two of them
        assert_eq!(log.borrow().cues, 2);
    }

    #[test]
    fn unknown_speaker_uses_first_profile() {
        let (mut seq, log) = sequencer(1);
        seq.start(vec![DialogueLine::new("x", "Stranger")]);
        assert_eq!(log.borrow().cues, 1);
    }

    #[test]
    fn end_is_safe_when_idle() {
        let (mut seq, log) = sequencer(1);
        seq.end();
        seq.end();
        assert_eq!(seq.state(), DialogueState::Idle);
        assert_eq!(log.borrow().input_enabled, Some(true));
        assert_eq!(log.borrow().panel_visible, Some(false));
    }

    #[test]
    fn narrate_starts_a_single_line() {
        let (mut seq, _log) = sequencer(1);
        seq.narrate("System", "Puzzle solved!");
        assert_eq!(seq.current_line().map(|l| l.speaker.as_str()), Some("System"));
        seq.confirm();
        seq.tick(0.0);
        assert_eq!(seq.visible_text(), "Puzzle solved!");
        seq.confirm();
        assert!(!seq.is_active());
    }
}
