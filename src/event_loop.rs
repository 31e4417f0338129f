//! Engine event pump for the demo binary.
//!
//! Runs after the script body has finished: drains the engine's event queue,
//! dispatching each event through the bridge, then asks for shutdown. Scripts
//! keep the process alive by vetoing the exit event, but the simulated engine
//! has no outside event source, so a veto with the queue already drained
//! cannot be honored for long.

use autolua_engine::EngineEvent;
use autolua_script::{EventReply, ScriptBridge, SharedEngine};
use tracing::{debug, warn};

/// Why the event loop returned.
pub enum LoopExit {
    /// Shutdown proceeded, either unopposed or after the veto expired.
    Normal,
    /// A callback raised. Carries the user-visible message.
    Fatal(String),
}

/// Drain the engine's event queue, then shut down.
///
/// When the queue runs dry an exit event is synthesized. A script may veto
/// an exit that arrived as a real event; a vetoed synthesized exit only
/// delays shutdown until the queue is confirmed empty again, since nothing
/// else will ever arrive.
pub fn run(bridge: &ScriptBridge, engine: &SharedEngine) -> LoopExit {
    let mut exit_vetoed = false;

    loop {
        let polled = engine.borrow_mut().poll_event();
        let (event, synthesized) = match polled {
            Some(event) => (event, false),
            None => {
                if exit_vetoed {
                    warn!("exit vetoed but the event queue is drained, shutting down");
                    return LoopExit::Normal;
                }
                (EngineEvent::Exit, true)
            }
        };

        debug!("dispatching {event:?}");
        match bridge.handle_event(&event) {
            EventReply::Continue => {
                if synthesized {
                    exit_vetoed = true;
                }
            }
            EventReply::Shutdown => return LoopExit::Normal,
            EventReply::Fatal(err) => return LoopExit::Fatal(err.to_string()),
        }
    }
}
