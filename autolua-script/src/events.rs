//! Mapping engine events onto callback invocations.
//!
//! Every engine event corresponds to one callback key. Dispatch runs
//! synchronously on the engine's event-loop thread; an unhandled event is
//! normal and silent, a callback that raises is fatal to the process (the
//! single dispatch thread cannot unwind through the automation event that
//! triggered it), and the exit event gives the script a veto over shutdown.

use autolua_engine::{EngineEvent, NativeValue};
use log::warn;
use mlua::prelude::*;

use crate::callback_registry::{trigger, SharedCallbacks, TriggerOutcome};
use crate::value_codec::ValueCodec;

/// What the event loop should do after an event was dispatched.
#[derive(Debug)]
pub enum EventReply {
    /// Keep running. Covers both "handled" and "no handler registered".
    Continue,
    /// An exit event was not vetoed: tear down the runtime and terminate.
    Shutdown,
    /// A callback raised or could not be invoked. The caller must print a
    /// user-visible message and terminate the process.
    Fatal(LuaError),
}

/// The callback key an event is looked up under.
pub fn callback_key(event: &EngineEvent) -> String {
    match event {
        EngineEvent::Hotkey { context, key } => format!("Hotkey {context} {key}"),
        EngineEvent::Message { id } => format!("OnMessage {id}"),
        EngineEvent::ContextMenu => "OnContextMenu".to_string(),
        EngineEvent::DropFiles { .. } => "OnDropFiles".to_string(),
        EngineEvent::Escape => "OnEscape".to_string(),
        EngineEvent::Resize { .. } => "OnResize".to_string(),
        EngineEvent::ClipboardChange { .. } => "OnClipboardChange".to_string(),
        EngineEvent::Close => "OnClose".to_string(),
        EngineEvent::Exit => "OnExit".to_string(),
    }
}

/// Event payload passed to the callback, already in native scalar form.
fn event_args(event: &EngineEvent) -> Vec<NativeValue> {
    match event {
        EngineEvent::Message { id } => vec![NativeValue::text(id.to_string())],
        EngineEvent::DropFiles { paths } => vec![NativeValue::text(paths.join("\n"))],
        EngineEvent::Resize { width, height } => vec![
            NativeValue::text(width.to_string()),
            NativeValue::text(height.to_string()),
        ],
        EngineEvent::ClipboardChange { content } => vec![NativeValue::text(content.clone())],
        _ => Vec::new(),
    }
}

/// Synchronous dispatch of engine events into the callback registry.
///
/// Goes through the shared registry handle so a callback may register or
/// replace handlers while it runs.
pub struct EventDispatcher;

impl EventDispatcher {
    /// Dispatch one event and classify the outcome for the event loop.
    pub fn dispatch(
        lua: &Lua,
        codec: &ValueCodec,
        callbacks: &SharedCallbacks,
        event: &EngineEvent,
    ) -> EventReply {
        let key = callback_key(event);
        let args = event_args(event);

        let outcome = match trigger(callbacks, lua, codec, &key, &args) {
            Ok(outcome) => outcome,
            Err(err) => return EventReply::Fatal(err),
        };

        if let EngineEvent::Exit = event {
            return match outcome {
                // No handler: nothing objects, exit proceeds.
                TriggerOutcome::Unhandled => EventReply::Shutdown,
                TriggerOutcome::Handled(result) => {
                    if exit_may_proceed(&result) {
                        EventReply::Shutdown
                    } else {
                        warn!("exit vetoed by {key:?} callback");
                        EventReply::Continue
                    }
                }
            };
        }

        EventReply::Continue
    }
}

/// An exit callback permits shutdown only with a zero/false-equivalent
/// result: none, false, numeric zero, or empty/`"0"` text.
fn exit_may_proceed(result: &LuaValue) -> bool {
    match result {
        LuaValue::Nil => true,
        LuaValue::Boolean(b) => !b,
        LuaValue::Integer(i) => *i == 0,
        LuaValue::Number(n) => *n == 0.0,
        LuaValue::String(s) => matches!(s.to_str().as_deref(), Ok("") | Ok("0")),
        _ => false,
    }
}
