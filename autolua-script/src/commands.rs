//! Command registry and dispatch from scripts into automation primitives.
//!
//! The command set is fixed at build time. Each command declares the arity
//! range it accepts; dispatch trims trailing absent arguments and invokes the
//! primitive with exactly the present-argument count, so a primitive that
//! distinguishes "present but empty" from "absent" for its trailing
//! parameters never sees padded sentinels. Interior absent arguments decay to
//! empty text; the engine cannot tell those apart, and this bridge keeps
//! that ambiguity rather than inventing a semantic for it.
//!
//! All failures here are recoverable: they surface as Lua errors the script
//! can `pcall`, never as partially constructed results.

use std::collections::HashMap;

use autolua_engine::{AutomationEngine, EngineError, NativeValue};
use log::debug;
use mlua::prelude::*;

/// Upper bound on positional arguments accepted by `call`.
pub const MAX_ARGS: usize = 11;

type CommandFn = fn(&mut dyn AutomationEngine, &[String]) -> Result<NativeValue, EngineError>;

/// One entry in the fixed command table.
struct CommandSpec {
    name: &'static str,
    min_args: usize,
    max_args: usize,
    run: CommandFn,
}

/// Name-indexed table over the fixed command set.
///
/// Owned by the bridge and injected wherever dispatch happens; the table is
/// immutable after construction.
pub struct CommandRegistry {
    by_name: HashMap<&'static str, &'static CommandSpec>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut by_name = HashMap::with_capacity(COMMANDS.len());
        for spec in COMMANDS {
            by_name.insert(spec.name, spec);
        }
        Self { by_name }
    }

    /// Names of every registered command, unordered.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_name.keys().copied()
    }

    /// Resolve `name` and invoke the primitive with the present arguments.
    ///
    /// `args` holds at most [`MAX_ARGS`] optional text values; `None` marks an
    /// absent argument. The result is flattened before it is returned so it
    /// is ready for the value codec.
    pub fn dispatch(
        &self,
        engine: &mut dyn AutomationEngine,
        name: &str,
        args: &[Option<String>],
    ) -> LuaResult<NativeValue> {
        if args.len() > MAX_ARGS {
            return Err(LuaError::external(format!(
                "{name} called with {} arguments, at most {MAX_ARGS} are allowed",
                args.len()
            )));
        }

        // Exact match; command names are case-sensitive.
        let spec = self
            .by_name
            .get(name)
            .ok_or_else(|| LuaError::external(format!("unknown command {name}")))?;

        let present = present_len(args);
        if present < spec.min_args || present > spec.max_args {
            return Err(LuaError::external(arity_message(spec, present)));
        }

        let materialized: Vec<String> = args[..present]
            .iter()
            .map(|a| a.clone().unwrap_or_default())
            .collect();

        debug!("dispatching {name} with {present} argument(s)");
        let result = (spec.run)(engine, &materialized).map_err(LuaError::external)?;
        Ok(result.flatten())
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of arguments up to and including the last present one.
fn present_len(args: &[Option<String>]) -> usize {
    args.iter().rposition(Option::is_some).map_or(0, |i| i + 1)
}

fn arity_message(spec: &CommandSpec, got: usize) -> String {
    if spec.min_args == spec.max_args {
        format!(
            "{} takes exactly {} argument(s), got {got}",
            spec.name, spec.min_args
        )
    } else {
        format!(
            "{} takes {} to {} arguments, got {got}",
            spec.name, spec.min_args, spec.max_args
        )
    }
}

// ---------------------------------------------------------------------------
// The fixed command set.
// ---------------------------------------------------------------------------

static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "MsgBox",
        min_args: 0,
        max_args: 2,
        run: cmd_msg_box,
    },
    CommandSpec {
        name: "Send",
        min_args: 1,
        max_args: 1,
        run: cmd_send,
    },
    CommandSpec {
        name: "MouseMove",
        min_args: 2,
        max_args: 4,
        run: cmd_mouse_move,
    },
    CommandSpec {
        name: "MouseGetPos",
        min_args: 0,
        max_args: 0,
        run: cmd_mouse_get_pos,
    },
    CommandSpec {
        name: "WinActivate",
        min_args: 1,
        max_args: 1,
        run: cmd_win_activate,
    },
    CommandSpec {
        name: "WinExists",
        min_args: 1,
        max_args: 1,
        run: cmd_win_exists,
    },
    CommandSpec {
        name: "WinGetTitle",
        min_args: 0,
        max_args: 0,
        run: cmd_win_get_title,
    },
    CommandSpec {
        name: "SetClipboard",
        min_args: 1,
        max_args: 1,
        run: cmd_set_clipboard,
    },
    CommandSpec {
        name: "GetClipboard",
        min_args: 0,
        max_args: 0,
        run: cmd_get_clipboard,
    },
    CommandSpec {
        name: "Sleep",
        min_args: 1,
        max_args: 1,
        run: cmd_sleep,
    },
    CommandSpec {
        name: "SoundBeep",
        min_args: 0,
        max_args: 2,
        run: cmd_sound_beep,
    },
];

fn cmd_msg_box(engine: &mut dyn AutomationEngine, args: &[String]) -> Result<NativeValue, EngineError> {
    let text = args.first().map(String::as_str).unwrap_or("Press OK to continue.");
    let title = args.get(1).map(String::as_str).unwrap_or("autolua");
    engine.msg_box(text, title);
    Ok(NativeValue::Empty)
}

fn cmd_send(engine: &mut dyn AutomationEngine, args: &[String]) -> Result<NativeValue, EngineError> {
    engine.send(&args[0]);
    Ok(NativeValue::Empty)
}

fn cmd_mouse_move(
    engine: &mut dyn AutomationEngine,
    args: &[String],
) -> Result<NativeValue, EngineError> {
    let x = parse_i32("MouseMove", 1, &args[0])?;
    let y = parse_i32("MouseMove", 2, &args[1])?;
    let speed = match args.get(2).map(String::as_str) {
        None | Some("") => None,
        Some(s) => Some(parse_u32("MouseMove", 3, s)?),
    };
    let relative = args.get(3).is_some_and(|s| s == "R");
    engine.mouse_move(x, y, speed, relative);
    Ok(NativeValue::Empty)
}

fn cmd_mouse_get_pos(
    engine: &mut dyn AutomationEngine,
    _args: &[String],
) -> Result<NativeValue, EngineError> {
    let (x, y) = engine.mouse_get_pos();
    Ok(NativeValue::Coords(x, y))
}

fn cmd_win_activate(
    engine: &mut dyn AutomationEngine,
    args: &[String],
) -> Result<NativeValue, EngineError> {
    engine.win_activate(&args[0])?;
    Ok(NativeValue::Empty)
}

fn cmd_win_exists(
    engine: &mut dyn AutomationEngine,
    args: &[String],
) -> Result<NativeValue, EngineError> {
    Ok(NativeValue::flag(engine.win_exists(&args[0])))
}

fn cmd_win_get_title(
    engine: &mut dyn AutomationEngine,
    _args: &[String],
) -> Result<NativeValue, EngineError> {
    Ok(NativeValue::text(engine.win_get_title()))
}

fn cmd_set_clipboard(
    engine: &mut dyn AutomationEngine,
    args: &[String],
) -> Result<NativeValue, EngineError> {
    engine.set_clipboard(&args[0]);
    Ok(NativeValue::Empty)
}

fn cmd_get_clipboard(
    engine: &mut dyn AutomationEngine,
    _args: &[String],
) -> Result<NativeValue, EngineError> {
    Ok(NativeValue::text(engine.get_clipboard()))
}

fn cmd_sleep(engine: &mut dyn AutomationEngine, args: &[String]) -> Result<NativeValue, EngineError> {
    let ms = parse_u64("Sleep", 1, &args[0])?;
    engine.sleep(ms);
    Ok(NativeValue::Empty)
}

fn cmd_sound_beep(
    engine: &mut dyn AutomationEngine,
    args: &[String],
) -> Result<NativeValue, EngineError> {
    let freq = match args.first().map(String::as_str) {
        None | Some("") => 523,
        Some(s) => parse_u32("SoundBeep", 1, s)?,
    };
    let duration = match args.get(1).map(String::as_str) {
        None | Some("") => 150,
        Some(s) => parse_u64("SoundBeep", 2, s)?,
    };
    engine.sound_beep(freq, duration);
    Ok(NativeValue::Empty)
}

fn parse_i32(command: &'static str, position: usize, s: &str) -> Result<i32, EngineError> {
    s.parse().map_err(|_| EngineError::BadArgument {
        command,
        position,
        detail: format!("expected an integer, got {s:?}"),
    })
}

fn parse_u32(command: &'static str, position: usize, s: &str) -> Result<u32, EngineError> {
    s.parse().map_err(|_| EngineError::BadArgument {
        command,
        position,
        detail: format!("expected a non-negative integer, got {s:?}"),
    })
}

fn parse_u64(command: &'static str, position: usize, s: &str) -> Result<u64, EngineError> {
    s.parse().map_err(|_| EngineError::BadArgument {
        command,
        position,
        detail: format!("expected a non-negative integer, got {s:?}"),
    })
}

#[cfg(test)]
mod tests {
    use autolua_engine::{EngineEvent, SimulatedEngine};

    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    /// Engine spy recording the exact shape of mouse_move invocations.
    #[derive(Default)]
    struct MouseSpy {
        calls: Vec<(i32, i32, Option<u32>, bool)>,
    }

    impl AutomationEngine for MouseSpy {
        fn msg_box(&mut self, _: &str, _: &str) {}
        fn send(&mut self, _: &str) {}
        fn mouse_move(&mut self, x: i32, y: i32, speed: Option<u32>, relative: bool) {
            self.calls.push((x, y, speed, relative));
        }
        fn mouse_get_pos(&self) -> (i32, i32) {
            (0, 0)
        }
        fn win_activate(&mut self, title: &str) -> Result<(), EngineError> {
            Err(EngineError::WindowNotFound(title.to_string()))
        }
        fn win_exists(&self, _: &str) -> bool {
            false
        }
        fn win_get_title(&self) -> String {
            String::new()
        }
        fn set_clipboard(&mut self, _: &str) {}
        fn get_clipboard(&self) -> String {
            String::new()
        }
        fn sleep(&mut self, _: u64) {}
        fn sound_beep(&mut self, _: u32, _: u64) {}
        fn poll_event(&mut self) -> Option<EngineEvent> {
            None
        }
    }

    #[test]
    fn present_len_trims_trailing_absent() {
        assert_eq!(present_len(&[]), 0);
        assert_eq!(present_len(&[some("a")]), 1);
        assert_eq!(present_len(&[some("a"), None, None]), 1);
        assert_eq!(present_len(&[None, some("b"), None]), 2);
        assert_eq!(present_len(&[None, None]), 0);
    }

    #[test]
    fn unknown_command_is_recoverable() {
        let registry = CommandRegistry::new();
        let mut engine = SimulatedEngine::new();
        let err = registry
            .dispatch(&mut engine, "FooBar", &[])
            .unwrap_err()
            .to_string();
        assert!(err.contains("unknown command FooBar"), "got: {err}");
    }

    #[test]
    fn mouse_move_two_args_invokes_two_arg_form() {
        let registry = CommandRegistry::new();
        let mut spy = MouseSpy::default();
        registry
            .dispatch(&mut spy, "MouseMove", &[some("100"), some("200")])
            .unwrap();
        // The 2-argument form: no speed, no relative flag.
        assert_eq!(spy.calls, vec![(100, 200, None, false)]);
    }

    #[test]
    fn mouse_move_trailing_absent_args_are_trimmed() {
        let registry = CommandRegistry::new();
        let mut spy = MouseSpy::default();
        registry
            .dispatch(&mut spy, "MouseMove", &[some("1"), some("2"), None, None])
            .unwrap();
        assert_eq!(spy.calls, vec![(1, 2, None, false)]);
    }

    #[test]
    fn mouse_move_full_form() {
        let registry = CommandRegistry::new();
        let mut spy = MouseSpy::default();
        registry
            .dispatch(
                &mut spy,
                "MouseMove",
                &[some("10"), some("20"), some("50"), some("R")],
            )
            .unwrap();
        assert_eq!(spy.calls, vec![(10, 20, Some(50), true)]);
    }

    #[test]
    fn interior_absent_decays_to_empty_text() {
        let registry = CommandRegistry::new();
        let mut spy = MouseSpy::default();
        // Speed absent, relative present: speed position is materialized as
        // empty text and falls back to the default.
        registry
            .dispatch(&mut spy, "MouseMove", &[some("1"), some("2"), None, some("R")])
            .unwrap();
        assert_eq!(spy.calls, vec![(1, 2, None, true)]);
    }

    #[test]
    fn arity_mismatch_is_recoverable() {
        let registry = CommandRegistry::new();
        let mut engine = SimulatedEngine::new();

        let err = registry
            .dispatch(&mut engine, "MouseMove", &[some("1")])
            .unwrap_err()
            .to_string();
        assert!(err.contains("MouseMove takes 2 to 4 arguments"), "got: {err}");

        let err = registry
            .dispatch(&mut engine, "Sleep", &[])
            .unwrap_err()
            .to_string();
        assert!(err.contains("Sleep takes exactly 1"), "got: {err}");
    }

    #[test]
    fn too_many_args_rejected_before_resolution() {
        let registry = CommandRegistry::new();
        let mut engine = SimulatedEngine::new();
        let args: Vec<Option<String>> = (0..12).map(|i| some(&i.to_string())).collect();
        let err = registry
            .dispatch(&mut engine, "Send", &args)
            .unwrap_err()
            .to_string();
        assert!(err.contains("at most 11"), "got: {err}");
    }

    #[test]
    fn bad_argument_carries_command_and_position() {
        let registry = CommandRegistry::new();
        let mut engine = SimulatedEngine::new();
        let err = registry
            .dispatch(&mut engine, "MouseMove", &[some("abc"), some("2")])
            .unwrap_err()
            .to_string();
        assert!(err.contains("MouseMove"), "got: {err}");
        assert!(err.contains("argument 1"), "got: {err}");
    }

    #[test]
    fn mouse_get_pos_result_is_flattened() {
        let registry = CommandRegistry::new();
        let mut engine = SimulatedEngine::new();
        registry
            .dispatch(&mut engine, "MouseMove", &[some("30"), some("40")])
            .unwrap();
        let pos = registry.dispatch(&mut engine, "MouseGetPos", &[]).unwrap();
        assert_eq!(pos, NativeValue::text("30,40"));
    }

    #[test]
    fn engine_error_surfaces_as_lua_error() {
        let registry = CommandRegistry::new();
        let mut engine = SimulatedEngine::new();
        let err = registry
            .dispatch(&mut engine, "WinActivate", &[some("Nothing")])
            .unwrap_err()
            .to_string();
        assert!(err.contains("no window matching"), "got: {err}");
    }

    #[test]
    fn clipboard_and_flags() {
        let registry = CommandRegistry::new();
        let mut engine = SimulatedEngine::new();
        engine.add_window("Untitled - Notepad");

        let exists = registry
            .dispatch(&mut engine, "WinExists", &[some("Notepad")])
            .unwrap();
        assert_eq!(exists, NativeValue::text("1"));

        registry
            .dispatch(&mut engine, "SetClipboard", &[some("copied")])
            .unwrap();
        let clip = registry.dispatch(&mut engine, "GetClipboard", &[]).unwrap();
        assert_eq!(clip, NativeValue::text("copied"));
    }

    #[test]
    fn sound_beep_defaults() {
        let registry = CommandRegistry::new();
        let mut engine = SimulatedEngine::new();
        registry.dispatch(&mut engine, "SoundBeep", &[]).unwrap();
        registry
            .dispatch(&mut engine, "SoundBeep", &[some("880"), some("300")])
            .unwrap();
        assert_eq!(engine.beeps, vec![(523, 150), (880, 300)]);
    }
}
