//! Registry of script callables keyed by automation event.
//!
//! One table for the whole bridge, owned by the bridge and injected into both
//! the registration path (scripts calling `set_callback`) and the trigger
//! path (engine events). At most one live entry per key; entries are released
//! individually only when overwritten by a different callable, and en masse
//! at shutdown.
//!
//! Triggering goes through the shared handle in two phases: the registry
//! borrow ends before the callable runs, so a callback may itself call
//! `set_callback` without deadlocking the table.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use autolua_engine::NativeValue;
use log::{debug, trace};
use mlua::prelude::*;

use crate::retained::Retained;
use crate::value_codec::ValueCodec;

/// Result of triggering a callback key.
#[derive(Debug)]
pub enum TriggerOutcome {
    /// No callable registered for the key. Not an error: most automation
    /// events have no handler.
    Unhandled,
    /// The callable ran to completion and returned this value.
    Handled(LuaValue),
}

/// Event-key to retained-callable table.
pub struct CallbackRegistry {
    entries: HashMap<String, Retained>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register `value` for `key`, replacing any previous entry.
    ///
    /// The value must be callable; anything else raises with no mutation.
    /// Re-registering the callable already stored for `key` is a no-op, so
    /// the stored reference is neither leaked nor double-released.
    pub fn register(&mut self, lua: &Lua, key: &str, value: LuaValue) -> LuaResult<()> {
        if !matches!(value, LuaValue::Function(_)) {
            return Err(LuaError::external(format!(
                "callback for {key:?} must be a function, got {}",
                value.type_name()
            )));
        }

        if let Some(existing) = self.entries.get(key) {
            if existing.refers_to(lua, &value) {
                trace!("callback {key:?} re-registered with the same function");
                return Ok(());
            }
        }

        let guard = Retained::new(lua, value)?;
        debug!("registering callback for {key:?}");
        // Dropping the displaced guard releases the old reference.
        self.entries.insert(key.to_string(), guard);
        Ok(())
    }

    /// Load the callable registered for `key`, if any.
    pub fn lookup(&self, lua: &Lua, key: &str) -> LuaResult<Option<LuaFunction>> {
        match self.entries.get(key) {
            Some(entry) => Ok(Some(entry.function(lua)?)),
            None => Ok(None),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Release every entry. Called once at process shutdown.
    pub fn clear(&mut self) {
        debug!("releasing {} callback(s)", self.entries.len());
        self.entries.clear();
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The registry handle shared between the registration and trigger paths.
/// Confined to the event-loop thread.
pub type SharedCallbacks = Rc<RefCell<CallbackRegistry>>;

/// Invoke the callable registered for `key`, if any.
///
/// Arguments are encoded through the value codec. The registry borrow is
/// released before the callable runs, so callbacks may re-register freely.
/// An error means the callable raised or could not be loaded; the event
/// trigger path treats that as fatal, so this only classifies, never
/// recovers.
pub fn trigger(
    callbacks: &SharedCallbacks,
    lua: &Lua,
    codec: &ValueCodec,
    key: &str,
    args: &[NativeValue],
) -> LuaResult<TriggerOutcome> {
    let func = callbacks.borrow().lookup(lua, key)?;
    let Some(func) = func else {
        trace!("no callback for {key:?}");
        return Ok(TriggerOutcome::Unhandled);
    };

    let encoded = args
        .iter()
        .map(|arg| codec.encode(lua, arg))
        .collect::<LuaResult<LuaMultiValue>>()?;

    debug!("triggering callback for {key:?}");
    let result = func.call::<LuaValue>(encoded)?;
    Ok(TriggerOutcome::Handled(result))
}
