use std::process::ExitCode;

use super::context::CliContext;
use super::env::CliArgs;
use super::info::cmd_info;
use super::intents::cmd_intents;
use super::loading_page::cmd_loading_page;
use super::plan::cmd_plan;
use super::run::cmd_run;
use crate::cli::commands::Commands;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<ExitCode> {
    match cli.command.clone() {
        Commands::Run(args) => cmd_run(args, ctx, cli.output).await,
        Commands::Plan(args) => cmd_plan(args, ctx).map(|_| ExitCode::SUCCESS),
        Commands::Intents(args) => cmd_intents(args, ctx, cli.output).map(|_| ExitCode::SUCCESS),
        Commands::LoadingPage(args) => cmd_loading_page(args, ctx)
            .await
            .map(|_| ExitCode::SUCCESS),
        Commands::Info => cmd_info(ctx, cli.output).map(|_| ExitCode::SUCCESS),
    }
}
