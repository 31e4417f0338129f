//! The automation primitive surface.
//!
//! The command set is fixed at build time; the scripting bridge dispatches
//! into it by name through its own registry. Every primitive is synchronous:
//! it runs to completion on the event-loop thread and returns a single value.
//! Primitives may mutate global engine state (cursor position, focus,
//! clipboard); that is their job, not the bridge's concern.

use crate::error::EngineError;
use crate::event::EngineEvent;

/// Window/input/process control primitives of the automation engine.
///
/// Implemented by the real OS-backed engine in production and by
/// [`crate::SimulatedEngine`] in tests and the demo binary.
pub trait AutomationEngine {
    /// Show a message box with the given text and title, blocking until
    /// dismissed.
    fn msg_box(&mut self, text: &str, title: &str);

    /// Simulate keystrokes against the active window.
    fn send(&mut self, keys: &str);

    /// Move the mouse cursor. `speed` is an optional 0-100 motion speed;
    /// `relative` moves from the current position instead of the origin.
    fn mouse_move(&mut self, x: i32, y: i32, speed: Option<u32>, relative: bool);

    /// Current cursor position.
    fn mouse_get_pos(&self) -> (i32, i32);

    /// Focus the first window whose title contains `title`.
    fn win_activate(&mut self, title: &str) -> Result<(), EngineError>;

    /// Whether any window's title contains `title`.
    fn win_exists(&self, title: &str) -> bool;

    /// Title of the active window, or empty text if none.
    fn win_get_title(&self) -> String;

    fn set_clipboard(&mut self, text: &str);

    fn get_clipboard(&self) -> String;

    /// Pause the event loop for `ms` milliseconds.
    fn sleep(&mut self, ms: u64);

    /// Play a beep of `freq` Hz for `duration_ms` milliseconds.
    fn sound_beep(&mut self, freq: u32, duration_ms: u64);

    /// Take the next pending engine event, if any.
    fn poll_event(&mut self) -> Option<EngineEvent>;
}
