//! Fixed pauses between booking steps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
    #[default]
    Fast,
    Slow,
}

/// Pause lengths in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingProfile {
    /// After landing on the search page
    pub landing_ms: u64,
    /// After each city pick
    pub city_ms: u64,
    /// After picking the date
    pub date_ms: u64,
    /// After the result list loads
    pub results_ms: u64,
    /// Around filter clicks and resets
    pub filter_ms: u64,
    /// After opening the seat layout
    pub seat_layout_ms: u64,
    /// After each boarding/dropping label
    pub label_ms: u64,
    /// Before and between passenger fields
    pub field_ms: u64,
    /// After a continue click that loads a new page
    pub page_load_ms: u64,
}

impl Pacing {
    pub fn profile(&self) -> PacingProfile {
        match self {
            Pacing::Fast => PacingProfile {
                landing_ms: 300,
                city_ms: 600,
                date_ms: 300,
                results_ms: 300,
                filter_ms: 300,
                seat_layout_ms: 4000,
                label_ms: 200,
                field_ms: 300,
                page_load_ms: 5000,
            },
            Pacing::Slow => PacingProfile {
                landing_ms: 3000,
                city_ms: 3000,
                date_ms: 2000,
                results_ms: 5000,
                filter_ms: 1000,
                seat_layout_ms: 3000,
                label_ms: 1000,
                field_ms: 2000,
                page_load_ms: 5000,
            },
        }
    }
}

impl fmt::Display for Pacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Pacing::Fast => "fast",
            Pacing::Slow => "slow",
        })
    }
}

impl FromStr for Pacing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Ok(Pacing::Fast),
            "slow" => Ok(Pacing::Slow),
            other => Err(format!("unknown pacing '{}', expected fast or slow", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_parse_and_differ() {
        let fast = Pacing::Fast.profile();
        let slow = Pacing::Slow.profile();
        assert!(slow.landing_ms >= fast.landing_ms);
        assert!(slow.field_ms >= fast.field_ms);
        assert_eq!(slow.page_load_ms, fast.page_load_ms);
        assert_eq!("SLOW".parse::<Pacing>().unwrap(), Pacing::Slow);
        assert!("medium".parse::<Pacing>().is_err());
    }
}
