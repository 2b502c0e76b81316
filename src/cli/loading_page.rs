use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use cdp_adapter::CdpAdapter;
use clap::Args;
use tokio::signal;
use tokio::time::sleep;
use tracing::{info, warn};

use super::context::CliContext;

const LOADING_HTML: &str = include_str!("../static/loading.html");
pub const SCREENSHOT_NAME: &str = "bus_load_page.png";

/// Status lines shown while the page animates, with the wait before each.
pub const STAGES: [(u64, &str); 5] = [
    (1000, "searching available buses"),
    (1500, "checking fares and seats"),
    (1500, "loading best offers"),
    (1500, "preparing results"),
    (2000, "buses found, loading complete"),
];

#[derive(Args, Clone, Debug)]
pub struct LoadingPageArgs {
    /// Keep the window open this long after the screenshot (Ctrl+C closes early)
    #[arg(long, default_value_t = 10)]
    pub hold_secs: u64,

    /// Enable headless mode
    #[arg(long)]
    pub headless: bool,
}

pub async fn cmd_loading_page(args: LoadingPageArgs, ctx: &CliContext) -> Result<()> {
    let config = ctx.config();
    let mut page_file = tempfile::Builder::new()
        .prefix("busflow-loading-")
        .suffix(".html")
        .tempfile()
        .context("Failed to create temporary page")?;
    page_file
        .write_all(LOADING_HTML.as_bytes())
        .context("Failed to write temporary page")?;
    let url = format!("file://{}", page_file.path().display());

    let mut cdp = config.browser.cdp_config();
    if args.headless {
        cdp = cdp.headless(true);
    }
    let adapter = CdpAdapter::launch(&cdp)
        .await
        .context("Failed to launch Chromium (set CHROME_BIN if it is not on PATH)")?;

    let shown = show(&adapter, &url, args.hold_secs, ctx).await;
    if let Err(err) = adapter.close().await {
        warn!(error = %err, "browser did not close cleanly");
    }
    page_file.close().context("Failed to remove temporary page")?;
    shown
}

async fn show(adapter: &CdpAdapter, url: &str, hold_secs: u64, ctx: &CliContext) -> Result<()> {
    adapter
        .goto(url, Duration::from_secs(30))
        .await
        .context("Failed to open loading page")?;
    info!(url, "loading page opened");

    for (wait_ms, stage) in STAGES {
        sleep(Duration::from_millis(wait_ms)).await;
        info!(stage, "status update");
    }

    let path = ctx.config().artifacts_dir.join(SCREENSHOT_NAME);
    adapter
        .screenshot(&path, true)
        .await
        .context("Failed to capture loading page")?;
    info!(path = %path.display(), "screenshot saved");

    if hold_secs > 0 {
        info!(hold_secs, "holding window open, Ctrl+C to close");
        tokio::select! {
            _ = sleep(Duration::from_secs(hold_secs)) => {}
            _ = signal::ctrl_c() => warn!("interrupted, closing browser"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_take_seven_and_a_half_seconds() {
        let total: u64 = STAGES.iter().map(|(ms, _)| ms).sum();
        assert_eq!(total, 7500);
    }

    #[test]
    fn bundled_page_is_self_contained() {
        assert!(LOADING_HTML.contains("<html"));
        assert!(!LOADING_HTML.contains("src=\"http"));
    }
}
