use smartdisplay_core::{AppContext, HomeController};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(ctx: &AppContext, global: &GlobalOpts) -> Result<(), CliError> {
    let state = HomeController::new(ctx.clone()).load().await?;
    let out = output::render_value(global.output, &state);
    output::print_output(&out, global.quiet);
    Ok(())
}
