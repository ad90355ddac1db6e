//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod classify;
pub mod config_cmd;
pub mod identity;
pub mod results;
pub mod run;

use digiprobe_core::RuntimeConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command that needs a runtime config.
pub async fn dispatch(
    cmd: Command,
    runtime: &RuntimeConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Run(args) => run::handle(runtime, args, global).await,
        Command::Identity => identity::handle(runtime, global).await,
        Command::Results(args) => results::handle_results(runtime, args, global).await,
        Command::Sessions { limit } => results::handle_sessions(runtime, limit, global).await,
        // Handled before a runtime config is built
        Command::Config(_) | Command::Classify(_) | Command::Glyph { .. } | Command::Completions(_) => {
            unreachable!()
        }
    }
}
