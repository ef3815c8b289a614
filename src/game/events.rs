//! Change notifications for world and UI collaborators.
//!
//! Mutators publish a [`GameEvent`] after they complete; listeners hold the receiving end
//! of a channel and drain it on their own schedule. Nothing here touches presentation
//! state.

use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ItemAdded { item_id: String },
    ItemRemoved { item_id: String },
    ItemUsed { item_id: String },
    FragmentCollected { fragment_id: String },
    PuzzleItemUsed { puzzle_id: String, item_id: String },
    PuzzleSolved { puzzle_id: String },
    GameSaved { slot: u32 },
    GameLoaded { slot: u32 },
}

/// Fan-out publisher. Each subscriber receives every event published after it subscribed.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<GameEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber, dropping the ones whose receiver is gone.
    pub fn publish(&mut self, event: GameEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Collect everything currently queued on a receiver without blocking.
pub fn drain(rx: &Receiver<GameEvent>) -> Vec<GameEvent> {
    rx.try_iter().collect()
}
