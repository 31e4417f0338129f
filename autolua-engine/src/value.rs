//! Native scalar values exchanged with the scripting bridge.
//!
//! The automation engine is stringly typed: every primitive takes and returns
//! text, with a distinguished empty value standing in for "no result" and
//! "argument absent". The only structured shape a primitive may produce is a
//! coordinate pair, and it must be flattened to text before it crosses the
//! interpreter boundary.

use std::fmt;

/// A scalar value on the automation engine side of the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeValue {
    /// The empty value. Also what an absent optional argument decays to.
    Empty,
    /// Text in the engine's native representation.
    Str(String),
    /// A screen coordinate pair. Must be flattened before marshaling.
    Coords(i32, i32),
}

impl NativeValue {
    /// Build a text value, collapsing empty text to [`NativeValue::Empty`].
    ///
    /// The engine does not distinguish `""` from the empty value, so `Str`
    /// never holds an empty string.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            NativeValue::Empty
        } else {
            NativeValue::Str(s)
        }
    }

    /// Build a text value from an integer, in canonical decimal form.
    pub fn int(n: i64) -> Self {
        NativeValue::Str(n.to_string())
    }

    /// Build a boolean as the engine represents it: `"1"` or `"0"`.
    pub fn flag(b: bool) -> Self {
        NativeValue::Str(if b { "1" } else { "0" }.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NativeValue::Empty)
    }

    /// Flatten structured values to text so they can cross the boundary.
    ///
    /// Scalars pass through unchanged; a coordinate pair becomes `"x,y"`.
    pub fn flatten(self) -> Self {
        match self {
            NativeValue::Coords(x, y) => NativeValue::Str(format!("{x},{y}")),
            other => other,
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Empty => Ok(()),
            NativeValue::Str(s) => f.write_str(s),
            NativeValue::Coords(x, y) => write!(f, "{x},{y}"),
        }
    }
}
