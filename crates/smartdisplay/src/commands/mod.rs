//! Command dispatch: bridges CLI args -> core controllers -> output formatting.

pub mod alarm;
pub mod config_cmd;
pub mod guest;
pub mod home;
pub mod login;
pub mod menu;
pub mod watch;

use smartdisplay_core::AppContext;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &AppContext, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => login::handle(ctx, args, global).await,
        Command::Alarm(args) => alarm::handle(ctx, args, global).await,
        Command::Guest(args) => guest::handle(ctx, args, global).await,
        Command::Home => home::handle(ctx, global).await,
        Command::Menu(args) => menu::handle(ctx, args, global).await,
        Command::Watch(args) => watch::handle(ctx, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not need a backend".into(),
        )),
    }
}
