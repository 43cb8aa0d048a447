//! `watch`: run the kiosk polling loop and print each merged cycle.

use std::time::Duration;

use serde_json::{Map, Value, json};
use tokio::sync::watch;

use smartdisplay_core::{
    AlarmController, AppContext, GuestController, HomeController, LinkHealth, MenuController,
    StateChange,
};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(ctx: &AppContext, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let period = match args.interval_ms {
        Some(0) => {
            return Err(CliError::Validation {
                field: "interval-ms".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Some(ms) => Duration::from_millis(ms),
        None => ctx.config().poll_interval,
    };

    let alarm = AlarmController::new(ctx.clone());
    let home = HomeController::new(ctx.clone());
    let guest = GuestController::new(ctx.clone());
    let menu = MenuController::new(ctx.clone());
    alarm.attach();
    home.attach();
    guest.attach();
    menu.attach();

    let mut health = vec![
        ("alarm", alarm.health()),
        ("home", home.health()),
        ("guest", guest.health()),
        ("menu", menu.health()),
    ];

    let mut changes = ctx.store().subscribe();
    ctx.store().start(period).await;

    let mut seen = 0u64;
    loop {
        tokio::select! {
            change = changes.next() => {
                let Some(change) = change else { break };
                // Direct writes (login, actions) carry no cycle number.
                if change.cycle.is_none() {
                    continue;
                }
                seen += 1;

                let out = output::render_value(global.output, &describe(&change));
                output::print_output(&out, global.quiet);
                report_health(&mut health, global.quiet);

                if args.cycles.is_some_and(|n| seen >= n) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    ctx.store().shutdown().await;
    Ok(())
}

fn describe(change: &StateChange) -> Value {
    let mut updated = Map::new();
    for key in &change.updated {
        if let Some(value) = change.state.get(key) {
            updated.insert(key.clone(), value.clone());
        }
    }
    json!({
        "cycle": change.cycle,
        "at": change.at.to_rfc3339(),
        "updated": updated,
    })
}

fn report_health(feeds: &mut [(&str, watch::Receiver<LinkHealth>)], quiet: bool) {
    for (name, rx) in feeds {
        if !rx.has_changed().unwrap_or(false) {
            continue;
        }
        let state = *rx.borrow_and_update();
        if quiet {
            continue;
        }
        match state {
            LinkHealth::Degraded {
                consecutive_failures,
            } => eprintln!("{name}: connection degraded after {consecutive_failures} failed polls"),
            LinkHealth::Healthy => eprintln!("{name}: connection restored"),
        }
    }
}
