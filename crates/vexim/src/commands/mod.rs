//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod clean;
pub mod config_cmd;
pub mod export;
pub mod import;
pub mod lifecycle;
pub mod users;
pub mod util;

use vexim_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a controller-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Export(args) => export::handle(controller, args, global).await,
        Command::Import(args) => import::handle(controller, args, global).await,
        Command::Clean(args) => clean::handle(controller, args, global).await,
        Command::Certificates(args) => lifecycle::certificates(controller, args, global).await,
        Command::Push => lifecycle::push(controller, global).await,
        Command::Templates(args) => lifecycle::templates(controller, args, global).await,
        Command::Policies(args) => lifecycle::policies(controller, args, global).await,
        Command::Users(args) => users::handle(controller, args, global).await,
        // Handled before a controller is connected
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
