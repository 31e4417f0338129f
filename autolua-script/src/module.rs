//! The native extension module exposed to scripts.
//!
//! The module surface is deliberately tiny: `call` dispatches into the
//! automation command set, `set_callback` wires script functions to engine
//! events. Both entry points are described by a static method table consumed
//! once during bootstrap to build the module table, before the runtime
//! initializes. (The C extension convention of an all-null sentinel entry is
//! carried by the slice length here; the descriptor is otherwise the same
//! name/entry-point/convention/doc shape.)

use std::rc::Rc;

use arrayvec::ArrayVec;
use log::info;
use mlua::prelude::*;

use crate::callback_registry::SharedCallbacks;
use crate::commands::{CommandRegistry, MAX_ARGS};
use crate::value_codec::ValueCodec;
use crate::SharedEngine;

/// Calling convention of a method table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallConv {
    /// The entry takes a variable argument list.
    VarArgs,
}

/// One entry of the static method table.
pub struct MethodDef {
    pub name: &'static str,
    /// Builds the native entry point, closing over the bridge context.
    pub build: fn(&Lua, &ModuleCtx) -> LuaResult<LuaFunction>,
    pub conv: CallConv,
    pub doc: &'static str,
}

/// Process-lifetime description of the extension module.
///
/// `internal_name` is the reserved name the module is pre-registered under;
/// `name` is what scripts import.
pub struct ModuleDescriptor {
    pub name: &'static str,
    pub internal_name: &'static str,
    pub methods: &'static [MethodDef],
}

pub static MODULE: ModuleDescriptor = ModuleDescriptor {
    name: "autolua",
    internal_name: "_autolua",
    methods: &METHODS,
};

static METHODS: [MethodDef; 2] = [
    MethodDef {
        name: "call",
        build: build_call,
        conv: CallConv::VarArgs,
        doc: "call(name, ...): invoke an automation command with up to 11 \
              positional string arguments and return its result",
    },
    MethodDef {
        name: "set_callback",
        build: build_set_callback,
        conv: CallConv::VarArgs,
        doc: "set_callback(key, fn): register fn for an automation event key, \
              replacing any previous registration",
    },
];

/// Everything the module entry points close over.
#[derive(Clone)]
pub struct ModuleCtx {
    pub engine: SharedEngine,
    pub commands: Rc<CommandRegistry>,
    pub callbacks: SharedCallbacks,
    pub codec: Rc<ValueCodec>,
}

/// Construct the module table from the method table.
///
/// Must run before the runtime starts executing script code; the bootstrap
/// pre-registers the result under both module names.
pub fn build_module(lua: &Lua, ctx: &ModuleCtx) -> LuaResult<LuaTable> {
    let module = lua.create_table()?;
    let docs = lua.create_table()?;

    for method in MODULE.methods {
        debug_assert_eq!(method.conv, CallConv::VarArgs);
        module.set(method.name, (method.build)(lua, ctx)?)?;
        docs.set(method.name, method.doc)?;
    }

    module.set("_DOC", docs)?;
    module.set("version", env!("CARGO_PKG_VERSION"))?;

    info!(
        "built module {:?} with {} method(s)",
        MODULE.name,
        MODULE.methods.len()
    );
    Ok(module)
}

fn build_call(lua: &Lua, ctx: &ModuleCtx) -> LuaResult<LuaFunction> {
    let ctx = ctx.clone();
    lua.create_function(move |lua, varargs: LuaMultiValue| {
        let mut values = varargs.into_iter();

        let name = match values.next() {
            Some(LuaValue::String(s)) => s.to_str()?.to_string(),
            Some(other) => {
                return Err(LuaError::external(format!(
                    "call: command name must be a string, got {}",
                    other.type_name()
                )))
            }
            None => return Err(LuaError::external("call: missing command name")),
        };

        let mut args: ArrayVec<Option<String>, MAX_ARGS> = ArrayVec::new();
        for value in values {
            let arg = ctx.codec.decode_argument(&value)?;
            args.try_push(arg).map_err(|_| {
                LuaError::external(format!(
                    "{name} called with too many arguments, at most {MAX_ARGS} are allowed"
                ))
            })?;
        }

        let result = ctx
            .commands
            .dispatch(&mut *ctx.engine.borrow_mut(), &name, &args)?;
        ctx.codec.encode(lua, &result)
    })
}

fn build_set_callback(lua: &Lua, ctx: &ModuleCtx) -> LuaResult<LuaFunction> {
    let ctx = ctx.clone();
    lua.create_function(move |lua, (key, value): (String, LuaValue)| {
        ctx.callbacks.borrow_mut().register(lua, &key, value)
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use autolua_engine::SimulatedEngine;

    use super::*;
    use crate::callback_registry::CallbackRegistry;

    fn fixture() -> (Lua, ModuleCtx) {
        let lua = Lua::new();
        let ctx = ModuleCtx {
            engine: Rc::new(RefCell::new(SimulatedEngine::new())),
            commands: Rc::new(CommandRegistry::new()),
            callbacks: Rc::new(RefCell::new(CallbackRegistry::new())),
            codec: Rc::new(ValueCodec::new()),
        };
        (lua, ctx)
    }

    fn install(lua: &Lua, ctx: &ModuleCtx) {
        let module = build_module(lua, ctx).unwrap();
        lua.globals().set("autolua", module).unwrap();
    }

    #[test]
    fn method_table_is_complete() {
        let (lua, ctx) = fixture();
        let module = build_module(&lua, &ctx).unwrap();
        for method in MODULE.methods {
            let f: LuaResult<LuaFunction> = module.get(method.name);
            assert!(f.is_ok(), "missing method {}", method.name);
            assert!(!method.doc.is_empty());
        }
        assert_eq!(MODULE.name, "autolua");
        assert_eq!(MODULE.internal_name, "_autolua");
    }

    #[test]
    fn call_dispatches_command() {
        let (lua, ctx) = fixture();
        install(&lua, &ctx);

        lua.load(r#"autolua.call("MouseMove", "150", "250")"#)
            .exec()
            .unwrap();
        let pos: String = lua
            .load(r#"return autolua.call("MouseGetPos")"#)
            .eval()
            .unwrap();
        assert_eq!(pos, "150,250");
    }

    #[test]
    fn call_returns_integers_for_numeric_results() {
        let (lua, ctx) = fixture();
        install(&lua, &ctx);

        // WinExists returns the engine flag "0", which crosses as integer 0.
        let exists: i64 = lua
            .load(r#"return autolua.call("WinExists", "Notepad")"#)
            .eval()
            .unwrap();
        assert_eq!(exists, 0);
    }

    #[test]
    fn call_unknown_command_is_catchable() {
        let (lua, ctx) = fixture();
        install(&lua, &ctx);

        let (ok, err): (bool, String) = lua
            .load(
                r#"
                local ok, err = pcall(function() return autolua.call("FooBar") end)
                return ok, tostring(err)
                "#,
            )
            .eval()
            .unwrap();
        assert!(!ok);
        assert!(err.contains("unknown command FooBar"), "got: {err}");
    }

    #[test]
    fn call_nil_arguments_are_absent() {
        let (lua, ctx) = fixture();
        install(&lua, &ctx);

        // Trailing nils trim away; MouseMove sees its 2-argument form.
        lua.load(r#"autolua.call("MouseMove", "10", "20", nil, nil)"#)
            .exec()
            .unwrap();
        let pos: String = lua
            .load(r#"return autolua.call("MouseGetPos")"#)
            .eval()
            .unwrap();
        assert_eq!(pos, "10,20");
    }

    #[test]
    fn call_accepts_numeric_arguments_as_text() {
        let (lua, ctx) = fixture();
        install(&lua, &ctx);

        lua.load(r#"autolua.call("MouseMove", 5, 6)"#).exec().unwrap();
        let pos: String = lua
            .load(r#"return autolua.call("MouseGetPos")"#)
            .eval()
            .unwrap();
        assert_eq!(pos, "5,6");
    }

    #[test]
    fn call_rejects_more_than_max_args() {
        let (lua, ctx) = fixture();
        install(&lua, &ctx);

        let code = format!(
            r#"return pcall(function() autolua.call("Send", {}) end)"#,
            (0..12).map(|i| format!("\"{i}\"")).collect::<Vec<_>>().join(", ")
        );
        let ok: bool = lua.load(&code).eval::<(bool, LuaValue)>().unwrap().0;
        assert!(!ok);
    }

    #[test]
    fn set_callback_registers() {
        let (lua, ctx) = fixture();
        install(&lua, &ctx);

        lua.load(r#"autolua.set_callback("OnClose", function() end)"#)
            .exec()
            .unwrap();
        assert!(ctx.callbacks.borrow().contains("OnClose"));
    }

    #[test]
    fn set_callback_rejects_non_function() {
        let (lua, ctx) = fixture();
        install(&lua, &ctx);

        let ok: bool = lua
            .load(r#"return pcall(function() autolua.set_callback("OnClose", 42) end)"#)
            .eval::<(bool, LuaValue)>()
            .unwrap()
            .0;
        assert!(!ok);
        assert!(ctx.callbacks.borrow().is_empty());
    }
}
