//! Condition types for post-step validation

use std::fmt;

use serde::{Deserialize, Serialize};

/// Listings sampled by a category check unless told otherwise.
pub const DEFAULT_LISTING_SAMPLE: usize = 5;

const NON_AC_MARKERS: [&str; 4] = ["NON AC", "NON-AC", "NONAC", "NON A/C"];
const AC_MARKERS: [&str; 3] = ["AC", "A/C", "A.C"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Current URL matches the regex
    UrlMatches { pattern: String },

    /// None of the first `sample` listings belongs to the opposite category
    ListingCategory {
        expected: BusCategory,
        #[serde(default = "default_sample")]
        sample: usize,
    },
}

fn default_sample() -> usize {
    DEFAULT_LISTING_SAMPLE
}

impl Condition {
    pub fn url_matches(pattern: impl Into<String>) -> Self {
        Condition::UrlMatches {
            pattern: pattern.into(),
        }
    }

    pub fn listing(expected: BusCategory) -> Self {
        Condition::ListingCategory {
            expected,
            sample: DEFAULT_LISTING_SAMPLE,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::UrlMatches { pattern } => write!(f, "url ~ /{}/", pattern),
            Condition::ListingCategory { expected, sample } => {
                write!(f, "first {} listings are {}", sample, expected)
            }
        }
    }
}

/// Bus category as printed on a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusCategory {
    Ac,
    NonAc,
    Unknown,
}

impl BusCategory {
    /// Category whose presence fails a check expecting `self`.
    pub fn opposite(&self) -> Option<BusCategory> {
        match self {
            BusCategory::Ac => Some(BusCategory::NonAc),
            BusCategory::NonAc => Some(BusCategory::Ac),
            BusCategory::Unknown => None,
        }
    }
}

impl fmt::Display for BusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BusCategory::Ac => "AC",
            BusCategory::NonAc => "Non-AC",
            BusCategory::Unknown => "unknown",
        })
    }
}

/// Classifies a listing by its text.
///
/// Non-AC markers are checked first since every one of them also contains
/// an AC marker. Matching is a plain uppercase substring test.
pub fn classify(text: &str) -> BusCategory {
    let upper = text.to_uppercase();
    if NON_AC_MARKERS.iter().any(|m| upper.contains(m)) {
        BusCategory::NonAc
    } else if AC_MARKERS.iter().any(|m| upper.contains(m)) {
        BusCategory::Ac
    } else {
        BusCategory::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_ac_wins_over_ac() {
        assert_eq!(classify("Volvo Multi-Axle Non A/C Sleeper (2+1)"), BusCategory::NonAc);
        assert_eq!(classify("Bharat Benz NON-AC Seater"), BusCategory::NonAc);
        assert_eq!(classify("nonac push back"), BusCategory::NonAc);
    }

    #[test]
    fn ac_markers() {
        assert_eq!(classify("Volvo 9600 A/C Sleeper"), BusCategory::Ac);
        assert_eq!(classify("Scania a.c. semi sleeper"), BusCategory::Ac);
        assert_eq!(classify("AC Seater / Sleeper (2+1)"), BusCategory::Ac);
    }

    #[test]
    fn no_marker_is_unknown() {
        assert_eq!(classify("Express Seater 2+2"), BusCategory::Unknown);
        assert_eq!(classify(""), BusCategory::Unknown);
    }

    #[test]
    fn opposite_categories() {
        assert_eq!(BusCategory::Ac.opposite(), Some(BusCategory::NonAc));
        assert_eq!(BusCategory::NonAc.opposite(), Some(BusCategory::Ac));
        assert_eq!(BusCategory::Unknown.opposite(), None);
    }

    #[test]
    fn sample_defaults_when_omitted() {
        let cond: Condition =
            serde_json::from_str(r#"{"kind":"listing_category","expected":"non_ac"}"#).unwrap();
        assert_eq!(cond, Condition::listing(BusCategory::NonAc));
    }
}
