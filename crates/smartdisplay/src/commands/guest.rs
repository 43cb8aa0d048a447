//! Guest command handlers.

use smartdisplay_core::{AppContext, GuestController};

use crate::cli::{GlobalOpts, GuestArgs, GuestCommand};
use crate::error::CliError;
use crate::output;

pub async fn handle(ctx: &AppContext, args: GuestArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let guest = GuestController::new(ctx.clone());

    let reply = match args.command {
        GuestCommand::State => guest.load().await?,
        GuestCommand::Request => guest.request_access().await?,
        GuestCommand::Exit => guest.exit().await?,
    };

    let out = output::render_value(global.output, &reply);
    output::print_output(&out, global.quiet);
    Ok(())
}
