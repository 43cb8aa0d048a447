use smartdisplay_core::{AppContext, MenuController};

use crate::cli::{GlobalOpts, MenuArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(ctx: &AppContext, args: MenuArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let menu = MenuController::new(ctx.clone());
    let state = menu.load(Some(args.role.into())).await?;
    let out = output::render_value(global.output, &state);
    output::print_output(&out, global.quiet);
    Ok(())
}
