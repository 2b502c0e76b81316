use clap::Subcommand;

use super::intents::IntentsArgs;
use super::loading_page::LoadingPageArgs;
use super::plan::PlanArgs;
use super::run::RunArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run a booking flow against the live site
    Run(RunArgs),

    /// Print a booking flow as JSON without starting a browser
    Plan(PlanArgs),

    /// Print the intent table (built-in recipes plus overrides)
    Intents(IntentsArgs),

    /// Show the bundled loading page and capture a screenshot of it
    LoadingPage(LoadingPageArgs),

    /// Show version and build information
    Info,
}
