//! In-process simulated automation engine.
//!
//! Stands in for the OS-backed engine in the demo binary and the test suite.
//! State lives entirely in memory: a cursor position, a window list, a
//! clipboard, and a queue of pending events. Mutating primitives record what
//! they were asked to do so tests can assert on it.

use std::collections::VecDeque;

use log::{debug, info};

use crate::engine::AutomationEngine;
use crate::error::EngineError;
use crate::event::EngineEvent;

/// A window known to the simulated desktop.
#[derive(Debug, Clone)]
pub struct SimWindow {
    pub title: String,
}

/// Simulated desktop state implementing [`AutomationEngine`].
#[derive(Debug, Default)]
pub struct SimulatedEngine {
    cursor: (i32, i32),
    clipboard: String,
    windows: Vec<SimWindow>,
    active: Option<usize>,
    /// Keystroke batches delivered via `Send`, oldest first.
    pub sent_keys: Vec<String>,
    /// `(text, title)` pairs shown via `MsgBox`.
    pub message_boxes: Vec<(String, String)>,
    /// `(freq, duration_ms)` pairs played via `SoundBeep`.
    pub beeps: Vec<(u32, u64)>,
    /// Total milliseconds slept. The simulation never actually blocks.
    pub slept_ms: u64,
    events: VecDeque<EngineEvent>,
}

impl SimulatedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a window to the simulated desktop.
    pub fn add_window(&mut self, title: impl Into<String>) {
        self.windows.push(SimWindow { title: title.into() });
    }

    /// Queue an event for the event loop to pick up.
    pub fn push_event(&mut self, event: EngineEvent) {
        self.events.push_back(event);
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

impl AutomationEngine for SimulatedEngine {
    fn msg_box(&mut self, text: &str, title: &str) {
        info!("MsgBox [{title}]: {text}");
        self.message_boxes.push((text.to_string(), title.to_string()));
    }

    fn send(&mut self, keys: &str) {
        debug!("Send: {keys}");
        self.sent_keys.push(keys.to_string());
    }

    fn mouse_move(&mut self, x: i32, y: i32, _speed: Option<u32>, relative: bool) {
        if relative {
            self.cursor.0 += x;
            self.cursor.1 += y;
        } else {
            self.cursor = (x, y);
        }
        debug!("MouseMove -> {:?}", self.cursor);
    }

    fn mouse_get_pos(&self) -> (i32, i32) {
        self.cursor
    }

    fn win_activate(&mut self, title: &str) -> Result<(), EngineError> {
        match self.windows.iter().position(|w| w.title.contains(title)) {
            Some(idx) => {
                self.active = Some(idx);
                Ok(())
            }
            None => Err(EngineError::WindowNotFound(title.to_string())),
        }
    }

    fn win_exists(&self, title: &str) -> bool {
        self.windows.iter().any(|w| w.title.contains(title))
    }

    fn win_get_title(&self) -> String {
        self.active
            .and_then(|idx| self.windows.get(idx))
            .map(|w| w.title.clone())
            .unwrap_or_default()
    }

    fn set_clipboard(&mut self, text: &str) {
        self.clipboard = text.to_string();
        // The real engine's clipboard watcher raises this; the simulation
        // raises it inline so scripts observe the same sequence.
        self.events.push_back(EngineEvent::ClipboardChange {
            content: self.clipboard.clone(),
        });
    }

    fn get_clipboard(&self) -> String {
        self.clipboard.clone()
    }

    fn sleep(&mut self, ms: u64) {
        self.slept_ms += ms;
    }

    fn sound_beep(&mut self, freq: u32, duration_ms: u64) {
        self.beeps.push((freq, duration_ms));
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        self.events.pop_front()
    }
}
