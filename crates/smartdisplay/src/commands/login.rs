//! Login command handler.

use smartdisplay_core::{AppContext, LoginController};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(ctx: &AppContext, args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let login = LoginController::new(ctx.clone());
    let state = login.login(args.pin.trim()).await?;

    let out = output::render_value(global.output, &state.to_value());
    output::print_output(&out, global.quiet);
    Ok(())
}
