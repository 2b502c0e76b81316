use action_flow::{build_flow, Booking, Flow, Pacing, Variant, MAX_DAYS_AHEAD};
use chrono::NaiveDate;
use clap::Args;

use crate::config::Config;

/// Route flags shared by `run` and `plan`; each one overrides the config.
#[derive(Args, Clone, Debug, Default)]
pub struct BookingArgs {
    /// Booking variant: full, quick or indexed
    #[arg(long)]
    pub variant: Option<Variant>,

    /// Pause profile: fast or slow (defaults to the variant's own)
    #[arg(long)]
    pub pacing: Option<Pacing>,

    /// Source city
    #[arg(long)]
    pub from: Option<String>,

    /// Destination city
    #[arg(long)]
    pub to: Option<String>,

    /// Travel date as days from today (at most a year)
    #[arg(long, value_parser = clap::value_parser!(u64).range(0..=MAX_DAYS_AHEAD))]
    pub days_ahead: Option<u64>,

    /// Search page URL
    #[arg(long)]
    pub base_url: Option<String>,
}

/// A booking with every flag and config value applied.
#[derive(Debug, Clone)]
pub struct Planned {
    pub variant: Variant,
    pub pacing: Pacing,
    pub booking: Booking,
}

impl Planned {
    pub fn flow(&self, today: NaiveDate, timeout_ms: u64) -> Flow {
        build_flow(self.variant, &self.booking, self.pacing, today).with_timeout(timeout_ms)
    }
}

impl BookingArgs {
    pub fn resolve(&self, config: &Config) -> Planned {
        let variant = self.variant.unwrap_or(config.booking.variant);
        let pacing = self
            .pacing
            .unwrap_or_else(|| config.booking.pacing_for(variant));
        let mut booking = config.booking.booking(variant);
        if let Some(from) = &self.from {
            booking.from = from.clone();
        }
        if let Some(to) = &self.to {
            booking.to = to.clone();
        }
        if let Some(days) = self.days_ahead {
            booking.days_ahead = days;
        }
        if let Some(url) = &self.base_url {
            booking.base_url = url.clone();
        }
        Planned {
            variant,
            pacing,
            booking,
        }
    }
}
