//! `pinroot health` - expiry guard state.

use anyhow::Result;
use pinroot::{spawn_monitor, AnchorHealth, AnchorState};
use std::process::ExitCode;
use std::sync::Arc;

use super::{exit_code, Context};
use crate::cli::args::HealthArgs;
use crate::output::{print_health, OutputFormat};

pub async fn execute(ctx: &Context, args: &HealthArgs) -> Result<ExitCode> {
    let guard = ctx.guard(args.at)?;

    if !args.watch {
        let health = guard.check();
        report(ctx, &health)?;
        return Ok(exit_code(health.state != AnchorState::Expired));
    }

    let mut updates = guard.subscribe();
    let mut monitor = spawn_monitor(Arc::clone(&guard));

    loop {
        tokio::select! {
            finished = &mut monitor => {
                let health = finished?;
                report(ctx, &health)?;
                return Ok(ExitCode::FAILURE);
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(ExitCode::FAILURE);
                }
                let health = *updates.borrow_and_update();
                report(ctx, &health)?;
                if health.state == AnchorState::Expired {
                    monitor.abort();
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }
}

fn report(ctx: &Context, health: &AnchorHealth) -> Result<()> {
    match ctx.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string(health)?),
        OutputFormat::Pretty => print_health(health),
    }
    Ok(())
}
