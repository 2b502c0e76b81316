use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Args;

use super::booking::BookingArgs;
use super::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub booking: BookingArgs,

    /// Plan as if run on this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub today: Option<NaiveDate>,
}

pub fn cmd_plan(args: PlanArgs, ctx: &CliContext) -> Result<()> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let planned = args.booking.resolve(ctx.config());
    let flow = planned.flow(today, ctx.config().flow_timeout_ms);
    let json = serde_json::to_string_pretty(&flow).context("Failed to serialize flow")?;
    println!("{}", json);
    Ok(())
}
