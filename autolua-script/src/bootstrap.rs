//! Interpreter lifecycle: search path, runtime construction, module
//! pre-registration, script entry point, and exit-code interpretation.
//!
//! The bootstrap sequence is ordered and synchronous:
//!
//! 1. rewrite the `AUTOLUA_PATH` search-path variable with the bridge's own
//!    deployment directory prepended;
//! 2. bring the interpreter into the process (Luau is vendored, so this is
//!    constructing the `mlua` state rather than loading a shared library);
//! 3. build the method table and module descriptor in process memory;
//! 4. pre-register the module table under its reserved internal name (and
//!    its importable public name) with the require preload table;
//! 5. initialize the runtime: safe standard libraries, then the custom
//!    `require` that consults the preload table and the search path;
//! 6. forward the host command line into the script entry point, with the
//!    engine executable injected as argument zero, each argument held in its
//!    own interpreter string referenced from the global `arg` table;
//! 7. interpret the exit status; codes 1 and 2 are fatal with a user-visible
//!    message, anything else is a normal exit.

use std::cell::RefCell;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use autolua_engine::EngineEvent;
use log::{debug, error, info};
use mlua::prelude::*;

use crate::callback_registry::CallbackRegistry;
use crate::commands::CommandRegistry;
use crate::events::{EventDispatcher, EventReply};
use crate::module::{build_module, ModuleCtx, MODULE};
use crate::value_codec::ValueCodec;
use crate::SharedEngine;

/// Environment variable listing script module search directories,
/// `;`-separated.
pub const SEARCH_PATH_VAR: &str = "AUTOLUA_PATH";

/// Outcome of running the script entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptExit {
    Normal,
    /// The script raised an error nothing caught.
    UncaughtError,
    /// The command line did not name a runnable script.
    BadCommandLine,
}

impl ScriptExit {
    pub fn code(self) -> i32 {
        match self {
            ScriptExit::Normal => 0,
            ScriptExit::UncaughtError => 1,
            ScriptExit::BadCommandLine => 2,
        }
    }

    /// The user-visible message for a fatal exit, if this exit is fatal.
    pub fn fatal_message(self) -> Option<&'static str> {
        match self {
            ScriptExit::Normal => None,
            ScriptExit::UncaughtError => {
                Some("script terminated with an uncaught error")
            }
            ScriptExit::BadCommandLine => {
                Some("the command line does not represent a valid script invocation")
            }
        }
    }
}

/// Read the search-path variable once and rewrite it with `bridge_dir`
/// prepended. Returns the new value.
pub fn prepare_search_path(bridge_dir: &Path) -> String {
    let existing = env::var(SEARCH_PATH_VAR).unwrap_or_default();
    let value = if existing.is_empty() {
        bridge_dir.display().to_string()
    } else {
        format!("{};{existing}", bridge_dir.display())
    };
    env::set_var(SEARCH_PATH_VAR, &value);
    debug!("{SEARCH_PATH_VAR}={value}");
    value
}

/// Split a search-path value into directories.
pub fn parse_search_path(value: &str) -> Vec<PathBuf> {
    value
        .split(';')
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// The embedded interpreter plus everything the module entry points share.
pub struct ScriptBridge {
    lua: Lua,
    ctx: ModuleCtx,
}

impl ScriptBridge {
    /// Run the full bootstrap: search path rewrite, then [`ScriptBridge::new`]
    /// with the resulting directories. The bridge's deployment directory is
    /// the engine executable's directory.
    pub fn bootstrap(engine: SharedEngine) -> LuaResult<Self> {
        let bridge_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        let path_value = prepare_search_path(&bridge_dir);
        Self::new(engine, parse_search_path(&path_value))
    }

    /// Construct the runtime and pre-register the extension module.
    ///
    /// Steps 2-5 of the bootstrap sequence; the search path is taken as
    /// given so tests can inject their own directories.
    pub fn new(engine: SharedEngine, search_paths: Vec<PathBuf>) -> LuaResult<Self> {
        let lua = Lua::new();

        let ctx = ModuleCtx {
            engine,
            commands: Rc::new(CommandRegistry::new()),
            callbacks: Rc::new(RefCell::new(CallbackRegistry::new())),
            codec: Rc::new(ValueCodec::new()),
        };

        // The module table must exist before the runtime starts running any
        // script code; require() resolves it purely from the preload table.
        let module = build_module(&lua, &ctx)?;
        let preload = lua.create_table()?;
        preload.set(MODULE.internal_name, &module)?;
        preload.set(MODULE.name, &module)?;

        lua.load_std_libs(LuaStdLib::ALL_SAFE)?;
        register_require(&lua, preload, search_paths)?;

        Ok(Self { lua, ctx })
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Run the script entry point with the host command line.
    ///
    /// `exe` is injected as argument zero; `args` follow. Each argument is
    /// materialized as its own interpreter string, referenced from the
    /// global `arg` table.
    pub fn run_script(&self, script: &Path, args: &[String], exe: &Path) -> ScriptExit {
        let code = match fs::read_to_string(script) {
            Ok(code) => code,
            Err(err) => {
                error!("cannot read script {}: {err}", script.display());
                return ScriptExit::BadCommandLine;
            }
        };

        if let Err(err) = self.set_arg_table(args, exe) {
            error!("cannot build argument table: {err}");
            return ScriptExit::BadCommandLine;
        }

        info!("running {}", script.display());
        let chunk = self
            .lua
            .load(code)
            .set_name(format!("@{}", script.display()));
        match chunk.exec() {
            Ok(()) => ScriptExit::Normal,
            Err(err) => {
                error!("uncaught script error: {err}");
                ScriptExit::UncaughtError
            }
        }
    }

    fn set_arg_table(&self, args: &[String], exe: &Path) -> LuaResult<()> {
        let arg = self.lua.create_table()?;
        arg.set(0, self.lua.create_string(exe.display().to_string())?)?;
        for (i, a) in args.iter().enumerate() {
            arg.set(i + 1, self.lua.create_string(a)?)?;
        }
        self.lua.globals().set("arg", arg)
    }

    /// Dispatch one engine event through the callback registry.
    pub fn handle_event(&self, event: &EngineEvent) -> EventReply {
        EventDispatcher::dispatch(&self.lua, &self.ctx.codec, &self.ctx.callbacks, event)
    }

    /// Number of callbacks the script has registered.
    pub fn callback_count(&self) -> usize {
        self.ctx.callbacks.borrow().len()
    }

    /// Release all retained callbacks. Called once before process exit.
    pub fn shutdown(&self) {
        self.ctx.callbacks.borrow_mut().clear();
        self.lua.expire_registry_values();
    }
}

/// Install a `require` that consults the preload table first, then searches
/// the configured directories for `<name>.lua` (dots become separators, the
/// `init.lua` convention is supported). Results are cached per name.
fn register_require(lua: &Lua, preload: LuaTable, search_paths: Vec<PathBuf>) -> LuaResult<()> {
    let loaded = lua.create_table()?;

    let require = lua.create_function(move |lua, name: String| {
        if let Some(cached) = loaded.get::<Option<LuaValue>>(&*name)? {
            return Ok(cached);
        }

        if let Some(preloaded) = preload.get::<Option<LuaValue>>(&*name)? {
            loaded.set(&*name, &preloaded)?;
            return Ok(preloaded);
        }

        let relative = name.replace('.', "/");
        let mut searched = Vec::new();
        for base in &search_paths {
            for candidate in [
                base.join(format!("{relative}.lua")),
                base.join(&relative).join("init.lua"),
            ] {
                if candidate.is_file() {
                    let code = fs::read_to_string(&candidate)
                        .map_err(|e| LuaError::external(e.to_string()))?;
                    let result: LuaValue = lua
                        .load(code)
                        .set_name(format!("@{}", candidate.display()))
                        .eval()?;
                    // Modules that return nothing still count as loaded.
                    let value = if result.is_nil() {
                        LuaValue::Boolean(true)
                    } else {
                        result
                    };
                    loaded.set(&*name, &value)?;
                    return Ok(value);
                }
                searched.push(candidate);
            }
        }

        let mut msg = format!("module {name:?} not found:");
        for path in &searched {
            msg.push_str(&format!("\n\tno file '{}'", path.display()));
        }
        Err(LuaError::external(msg))
    })?;

    lua.globals().set("require", require)
}
