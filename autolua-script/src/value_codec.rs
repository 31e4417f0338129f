//! Marshaling between native engine scalars and Lua values.
//!
//! Encoding rules, in order:
//!
//! 1. The empty native value maps to one process-wide interned empty Lua
//!    string, constructed lazily and cached in the registry. Every encode of
//!    the empty value yields a handle to the same Lua object.
//! 2. Text whose canonical integer form is byte-identical to itself maps to a
//!    Lua integer. Coercion is canonical-only so the textual round trip stays
//!    byte-exact: `"0100"` and out-of-range digits stay text.
//! 3. Any other text is handed to the Lua string constructor as UTF-8 bytes.
//! 4. Structured values (coordinate pairs) are unsupported here and fail with
//!    a "not implemented" error; callers flatten them first.
//!
//! Decoding reads a Lua string back as UTF-8 text; other scalar Lua types
//! used where text is expected are read purely through their textual form.

use std::cell::RefCell;

use autolua_engine::NativeValue;
use mlua::prelude::*;

/// Bidirectional scalar codec. One instance per bridge; holds the interned
/// empty-value cache.
pub struct ValueCodec {
    empty: RefCell<Option<LuaRegistryKey>>,
}

impl ValueCodec {
    pub fn new() -> Self {
        Self {
            empty: RefCell::new(None),
        }
    }

    /// Encode a native scalar into a Lua value.
    ///
    /// Fails fast on structured values; they must be flattened by the caller
    /// before crossing the boundary.
    pub fn encode(&self, lua: &Lua, value: &NativeValue) -> LuaResult<LuaValue> {
        match value {
            NativeValue::Empty => self.interned_empty(lua),
            NativeValue::Str(s) => {
                if let Some(n) = canonical_integer(s) {
                    Ok(LuaValue::Integer(n))
                } else {
                    Ok(LuaValue::String(lua.create_string(s)?))
                }
            }
            NativeValue::Coords(..) => Err(LuaError::external(
                "not implemented: structured value must be flattened before marshaling",
            )),
        }
    }

    /// Decode a Lua value into a native scalar.
    ///
    /// Strings are read as UTF-8 text; nil is the empty value; other scalar
    /// types decay to their textual form. Tables, functions and userdata do
    /// not cross the boundary.
    pub fn decode(&self, value: &LuaValue) -> LuaResult<NativeValue> {
        match value {
            LuaValue::Nil => Ok(NativeValue::Empty),
            LuaValue::String(s) => Ok(NativeValue::text(&*s.to_str()?)),
            LuaValue::Integer(i) => Ok(NativeValue::text((*i as i64).to_string())),
            LuaValue::Number(n) => Ok(NativeValue::text(number_to_text(*n))),
            LuaValue::Boolean(b) => Ok(NativeValue::flag(*b)),
            other => Err(LuaError::external(format!(
                "not implemented: cannot marshal {} to a native value",
                other.type_name()
            ))),
        }
    }

    /// Decode one positional command argument.
    ///
    /// `nil` means the argument is absent, which is distinct from present but
    /// empty text.
    pub fn decode_argument(&self, value: &LuaValue) -> LuaResult<Option<String>> {
        match value {
            LuaValue::Nil => Ok(None),
            other => Ok(Some(self.decode(other)?.to_string())),
        }
    }

    /// The single interned empty Lua value, created on first use.
    fn interned_empty(&self, lua: &Lua) -> LuaResult<LuaValue> {
        let mut slot = self.empty.borrow_mut();
        let key = match &mut *slot {
            Some(key) => key,
            empty @ None => {
                let s = lua.create_string("")?;
                empty.insert(lua.create_registry_value(LuaValue::String(s))?)
            }
        };
        lua.registry_value::<LuaValue>(key)
    }
}

impl Default for ValueCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `s` as an integer only if its canonical decimal form is
/// byte-identical, and it fits the Lua integer type.
fn canonical_integer(s: &str) -> Option<LuaInteger> {
    let n: i64 = s.parse().ok()?;
    if n.to_string() != s {
        return None;
    }
    LuaInteger::try_from(n).ok()
}

/// Textual form of a Lua number, preferring integer formatting when exact.
fn number_to_text(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= (1i64 << 53) as f64 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}
