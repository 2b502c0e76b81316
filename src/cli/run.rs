use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use action_flow::{DefaultFlowExecutor, FlowExecutor, FlowResult, StepOutcome, StepResult};
use action_primitives::{BrowserPort, CdpBrowserPort};
use anyhow::{Context, Result};
use cdp_adapter::CdpAdapter;
use chrono::Local;
use clap::Args;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::booking::BookingArgs;
use super::context::CliContext;
use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub booking: BookingArgs,

    /// Enable headless mode
    #[arg(long)]
    pub headless: bool,

    /// Write the run report here instead of the artifacts directory
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext, output: OutputFormat) -> Result<ExitCode> {
    let config = ctx.config();
    let planned = args.booking.resolve(config);
    let flow = planned.flow(Local::now().date_naive(), config.flow_timeout_ms);
    let intents = Arc::new(ctx.intents()?);
    info!(
        variant = %planned.variant,
        pacing = %planned.pacing,
        from = %planned.booking.from,
        to = %planned.booking.to,
        steps = flow.step_count(),
        "starting booking run"
    );

    let mut cdp = config.browser.cdp_config();
    if args.headless {
        cdp = cdp.headless(true);
    }
    let adapter = Arc::new(
        CdpAdapter::launch(&cdp)
            .await
            .context("Failed to launch Chromium (set CHROME_BIN if it is not on PATH)")?,
    );

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if signal::ctrl_c().await.is_ok() {
                warn!("Ctrl+C received, stopping run");
                cancel.cancel();
            }
        }
    });

    let port: Arc<dyn BrowserPort> = Arc::new(CdpBrowserPort::new(Arc::clone(&adapter)));
    let executor = DefaultFlowExecutor::new(port)
        .with_intents(intents)
        .with_artifacts_dir(config.artifacts_dir.clone())
        .with_cancel(cancel);
    let result = executor.execute(&flow).await;
    drop(executor);
    watcher.abort();
    close_browser(adapter).await;
    let result = result.context("Flow rejected")?;

    let report = args.report.unwrap_or_else(|| {
        config
            .artifacts_dir
            .join(format!("run-{}.json", result.run_id))
    });
    write_report(&report, &result).await?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Human => print_summary(&result, &report),
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn close_browser(adapter: Arc<CdpAdapter>) {
    match Arc::try_unwrap(adapter) {
        Ok(adapter) => {
            if let Err(err) = adapter.close().await {
                warn!(error = %err, "browser did not close cleanly");
            }
        }
        Err(_) => warn!("browser still in use, leaving it to exit with the process"),
    }
}

async fn write_report(path: &Path, result: &FlowResult) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_vec_pretty(result)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    info!(path = %path.display(), "run report written");
    Ok(())
}

/// Error, note, or the candidate that matched, in that order.
fn step_detail(step: &StepResult) -> String {
    if let Some(detail) = step.error.as_ref().or(step.note.as_ref()) {
        return detail.clone();
    }
    step.resolution
        .as_ref()
        .and_then(|res| res.winner())
        .map(|winner| format!("via {}", winner.candidate))
        .unwrap_or_default()
}

fn print_summary(result: &FlowResult, report: &Path) {
    println!("Run {} ({})", result.run_id, result.flow_id);
    for step in &result.step_results {
        let mark = match step.outcome {
            StepOutcome::Succeeded => "ok  ",
            StepOutcome::SkippedNotFound => "skip",
            StepOutcome::Failed => "FAIL",
        };
        let detail = step_detail(step);
        println!(
            "  [{}] {:<24} {:>6}ms  {}",
            mark,
            step.step_id.as_str(),
            step.latency_ms,
            detail
        );
    }
    println!();
    println!(
        "{} succeeded, {} skipped, {} failed in {}ms",
        result.count(StepOutcome::Succeeded),
        result.count(StepOutcome::SkippedNotFound),
        result.count(StepOutcome::Failed),
        result.latency_ms
    );
    match &result.error {
        Some(err) => println!("Aborted: {}", err),
        None => println!("Completed"),
    }
    println!("Report: {}", report.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_locator::{CandidateAttempt, CandidateOutcome, Resolution};
    use busflow_core_types::StepId;

    fn attempt(position: usize, candidate: &str, outcome: CandidateOutcome) -> CandidateAttempt {
        CandidateAttempt {
            position,
            candidate: candidate.into(),
            outcome,
            elapsed_ms: 0,
        }
    }

    #[test]
    fn detail_names_the_matching_candidate() {
        let mut step = StepResult::new(StepId::new("continue"), "locate");
        step.resolution = Some(Resolution {
            element: None,
            candidate: Some(1),
            attempts: vec![
                attempt(0, ".continue-btn", CandidateOutcome::NoMatch),
                attempt(1, "#continueBtn", CandidateOutcome::Accepted { index: 0 }),
            ],
            elapsed_ms: 40,
        });
        assert_eq!(step_detail(&step), "via #continueBtn");

        step.error = Some("Element not found: #continueBtn".into());
        assert_eq!(step_detail(&step), "Element not found: #continueBtn");
    }
}
