use std::cell::RefCell;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use autolua_engine::SimulatedEngine;
use autolua_script::{ScriptBridge, ScriptExit, SharedEngine};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod event_loop;

#[cfg(test)]
mod tests;

/// Desktop automation engine scriptable in Lua.
///
/// Runs the script against a simulated desktop, then pumps the engine's
/// event queue through the script's registered callbacks.
#[derive(Parser)]
#[command(name = "autolua", version)]
struct Cli {
    /// Script file to run.
    script: PathBuf,

    /// Seed the simulated desktop with a window of this title. Repeatable.
    #[arg(long = "window", value_name = "TITLE")]
    windows: Vec<String>,

    /// Arguments forwarded to the script's `arg` table.
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    install_tracing();
    let cli = Cli::parse();

    let engine = Rc::new(RefCell::new(SimulatedEngine::new()));
    for title in &cli.windows {
        engine.borrow_mut().add_window(title.clone());
    }
    let engine: SharedEngine = engine;

    let bridge = match ScriptBridge::bootstrap(engine.clone()) {
        Ok(bridge) => bridge,
        Err(err) => {
            error!("cannot initialize the scripting runtime: {err}");
            return ExitCode::from(ScriptExit::UncaughtError.code() as u8);
        }
    };

    let exe = env::current_exe().unwrap_or_else(|_| PathBuf::from("autolua"));
    let exit = bridge.run_script(&cli.script, &cli.args, &exe);
    if let Some(message) = exit.fatal_message() {
        eprintln!("autolua: {message}");
        bridge.shutdown();
        return ExitCode::from(exit.code() as u8);
    }

    let outcome = event_loop::run(&bridge, &engine);
    bridge.shutdown();

    match outcome {
        event_loop::LoopExit::Normal => ExitCode::SUCCESS,
        event_loop::LoopExit::Fatal(message) => {
            eprintln!("autolua: callback failed: {message}");
            ExitCode::from(ScriptExit::UncaughtError.code() as u8)
        }
    }
}

fn install_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
