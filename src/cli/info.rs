use anyhow::Result;
use serde_json::json;

use super::context::CliContext;
use super::output::OutputFormat;

pub fn cmd_info(ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let config = ctx.config();
    let browser = config
        .browser
        .executable
        .clone()
        .or_else(cdp_adapter::config::detect_chrome_executable);
    let config_path = ctx
        .config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(defaults)".to_string());

    if output == OutputFormat::Json {
        let info = json!({
            "version": env!("CARGO_PKG_VERSION"),
            "build_date": env!("BUILD_DATE"),
            "git_hash": env!("GIT_HASH"),
            "config": config_path,
            "browser": browser.as_ref().map(|p| p.display().to_string()),
            "artifacts_dir": config.artifacts_dir.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("busflow Information");
    println!("===================");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Build Date: {}", env!("BUILD_DATE"));
    println!("Git Commit: {}", env!("GIT_HASH"));
    println!();
    println!("Configuration:");
    println!("- Config File: {}", config_path);
    println!("- Variant: {}", config.booking.variant);
    println!("- Artifacts Directory: {}", config.artifacts_dir.display());
    match &config.intents_path {
        Some(path) => println!("- Intent Overrides: {}", path.display()),
        None => println!("- Intent Overrides: (none)"),
    }
    match browser {
        Some(path) => println!("- Browser: {}", path.display()),
        None => println!("- Browser: not found (set CHROME_BIN)"),
    }
    Ok(())
}
