//! Events raised by the automation engine.
//!
//! All events are delivered synchronously on the engine's single event-loop
//! thread. The scripting bridge maps each event to a callback key and invokes
//! whatever the script registered for it; see `autolua-script::events`.

/// An automation-originated event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A registered hotkey fired. `context` names the hotkey variant scope
    /// (usually empty) and `key` the key combination.
    Hotkey { context: String, key: String },
    /// A window message with the given id was received.
    Message { id: u32 },
    /// The tray/context menu was opened.
    ContextMenu,
    /// Files were dropped onto the main window.
    DropFiles { paths: Vec<String> },
    /// Escape was pressed in the main window.
    Escape,
    /// The main window was resized.
    Resize { width: u32, height: u32 },
    /// The clipboard contents changed.
    ClipboardChange { content: String },
    /// The main window is closing.
    Close,
    /// The engine wants to exit. A script callback may veto this.
    Exit,
}
