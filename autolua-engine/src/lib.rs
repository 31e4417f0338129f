//! Automation primitives for autolua.
//!
//! This crate defines the surface of the automation engine that scripts drive:
//! the native scalar value type, the fixed set of primitives exposed through
//! the [`AutomationEngine`] trait, the events the engine raises, and an
//! in-process simulated engine used by the binary and the test suite.
//!
//! The scripting bridge itself lives in `autolua-script`; this crate has no
//! interpreter dependency.

pub mod engine;
pub mod error;
pub mod event;
pub mod simulated;
pub mod value;

pub use engine::AutomationEngine;
pub use error::EngineError;
pub use event::EngineEvent;
pub use simulated::SimulatedEngine;
pub use value::NativeValue;
