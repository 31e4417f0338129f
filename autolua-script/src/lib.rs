//! Lua scripting bridge for the autolua automation engine.
//!
//! This crate embeds a Lua runtime (mlua with the vendored Luau dialect) into
//! the automation engine's process and wires the two together:
//!
//! - scripts call automation primitives through `autolua.call(name, ...)`;
//! - scripts register callables for engine events through
//!   `autolua.set_callback(key, fn)`;
//! - engine events look up those callables and invoke them synchronously on
//!   the engine's single event-loop thread.
//!
//! Only scalars cross the boundary: text, integers, and an interned empty
//! value. See [`value_codec`] for the marshaling rules.

pub mod bootstrap;
pub mod callback_registry;
pub mod commands;
pub mod events;
pub mod module;
pub mod retained;
pub mod value_codec;

pub use bootstrap::{ScriptBridge, ScriptExit};
pub use callback_registry::{CallbackRegistry, SharedCallbacks, TriggerOutcome};
pub use commands::CommandRegistry;
pub use events::{EventDispatcher, EventReply};
pub use module::{ModuleDescriptor, MODULE};
pub use retained::Retained;
pub use value_codec::ValueCodec;

/// Shared handle to the automation engine, confined to the event-loop thread.
pub type SharedEngine = std::rc::Rc<std::cell::RefCell<dyn autolua_engine::AutomationEngine>>;
