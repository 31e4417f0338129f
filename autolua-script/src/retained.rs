//! Scope-owning guards for Lua values retained past a single call.
//!
//! The interpreter owns every value the bridge handles. A value merely
//! inspected within one call needs no bookkeeping, but anything kept longer
//! (a registered callback, the interned empty value) must hold a registry
//! reference for exactly as long as it is kept. [`Retained`] makes that
//! structural: constructing it takes the reference, dropping it releases the
//! reference, and there is no other way to do either.

use mlua::prelude::*;

/// A Lua value pinned in the interpreter registry for the guard's lifetime.
///
/// Dropping the guard releases the registry slot; mlua reclaims it on the
/// next registry sweep. Cloning is deliberately not implemented: one guard,
/// one reference.
pub struct Retained {
    key: LuaRegistryKey,
}

impl Retained {
    /// Retain `value`, keeping it alive until the guard is dropped.
    pub fn new(lua: &Lua, value: LuaValue) -> LuaResult<Self> {
        let key = lua.create_registry_value(value)?;
        Ok(Self { key })
    }

    /// Load the retained value back out of the registry.
    pub fn value(&self, lua: &Lua) -> LuaResult<LuaValue> {
        lua.registry_value(&self.key)
    }

    /// Load the retained value as a callable.
    pub fn function(&self, lua: &Lua) -> LuaResult<LuaFunction> {
        lua.registry_value(&self.key)
    }

    /// Whether this guard refers to the same Lua object as `value`.
    ///
    /// Identity, not equality: two distinct functions with equal behavior are
    /// different objects.
    pub fn refers_to(&self, lua: &Lua, value: &LuaValue) -> bool {
        match self.value(lua) {
            Ok(stored) => stored.to_pointer() == value.to_pointer(),
            Err(_) => false,
        }
    }
}
