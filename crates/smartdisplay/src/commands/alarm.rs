//! Alarm command handlers.

use smartdisplay_core::{AlarmController, AppContext};

use crate::cli::{AlarmArgs, AlarmCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub async fn handle(ctx: &AppContext, args: AlarmArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let alarm = AlarmController::new(ctx.clone());

    let reply = match args.command {
        AlarmCommand::State => alarm.load().await?,
        AlarmCommand::Arm { mode } => {
            let reply = alarm.arm(mode.into()).await?;
            if !global.quiet {
                eprintln!("Alarm arming requested");
            }
            reply
        }
        AlarmCommand::Disarm => {
            let reply = alarm.disarm().await?;
            if !global.quiet {
                eprintln!("Alarm disarm requested");
            }
            reply
        }
    };

    let out = output::render_value(global.output, &reply);
    output::print_output(&out, global.quiet);
    Ok(())
}
