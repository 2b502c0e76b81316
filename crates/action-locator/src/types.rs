//! Core types for the locator

use std::fmt;
use std::time::Duration;

use action_primitives::{AnchorDescriptor, ElementRef, SelectMethod};
use serde::{Deserialize, Serialize};

use crate::filters::ElementFilter;

/// One candidate strategy, tried in list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub anchor: AnchorDescriptor,

    /// Short name used in logs and reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Candidate {
    pub fn new(anchor: AnchorDescriptor) -> Self {
        Self {
            anchor,
            label: None,
        }
    }

    pub fn labelled(anchor: AnchorDescriptor, label: impl Into<String>) -> Self {
        Self {
            anchor,
            label: Some(label.into()),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} ({})", label, self.anchor),
            None => write!(f, "{}", self.anchor),
        }
    }
}

/// Ordered candidates; earlier entries are preferred.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateList(pub Vec<Candidate>);

impl CandidateList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidates from plain CSS selectors.
    pub fn css<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            selectors
                .into_iter()
                .map(|s| Candidate::new(AnchorDescriptor::css(s)))
                .collect(),
        )
    }

    pub fn push(mut self, anchor: AnchorDescriptor) -> Self {
        self.0.push(Candidate::new(anchor));
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<AnchorDescriptor> for CandidateList {
    fn from_iter<T: IntoIterator<Item = AnchorDescriptor>>(iter: T) -> Self {
        Self(iter.into_iter().map(Candidate::new).collect())
    }
}

/// Which match of a candidate to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Pick {
    /// First visible, filter-passing match among the first `scan_limit`
    #[default]
    FirstVisible,
    /// Exactly the nth match (0-based); it must be visible and pass filters
    Nth(usize),
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_scan_limit() -> usize {
    10
}

fn default_min_matches() -> usize {
    1
}

/// Knobs for one resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocateOptions {
    /// Bound on the search phase of each candidate (milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Matches inspected per candidate
    #[serde(default = "default_scan_limit")]
    pub scan_limit: usize,

    /// Candidates matching fewer nodes are treated as not found
    #[serde(default = "default_min_matches")]
    pub min_matches: usize,

    #[serde(default)]
    pub pick: Pick,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<ElementFilter>,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            scan_limit: default_scan_limit(),
            min_matches: default_min_matches(),
            pick: Pick::default(),
            filters: Vec::new(),
        }
    }
}

impl LocateOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_filter(mut self, filter: ElementFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn nth(mut self, index: usize) -> Self {
        self.pick = Pick::Nth(index);
        self
    }

    pub fn with_min_matches(mut self, min: usize) -> Self {
        self.min_matches = min;
        self
    }

    pub fn with_scan_limit(mut self, limit: usize) -> Self {
        self.scan_limit = limit;
        self
    }
}

/// What to do with the accepted element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "do", rename_all = "snake_case")]
pub enum ElementAction {
    /// Locate only
    #[default]
    None,
    Click {
        #[serde(default)]
        force: bool,
    },
    Fill {
        value: String,
    },
    /// Type key by key, optionally clicking and clearing the field first
    Type {
        text: String,
        #[serde(default)]
        delay_ms: u64,
        #[serde(default)]
        clear: bool,
    },
    Select {
        method: SelectMethod,
        item: String,
    },
    Check,
}

impl ElementAction {
    pub fn is_none(&self) -> bool {
        matches!(self, ElementAction::None)
    }
}

/// Check run after the action; failure moves on to the next match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Verification {
    /// Field value contains at least one of the fragments
    ValueContains { any_of: Vec<String> },
    /// Class attribute changed or now mentions "select"
    ClassChanged,
}

/// Action plus its verification for [`crate::ResilientLocator::locate_and_act`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ActPlan {
    #[serde(default)]
    pub action: ElementAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify: Option<Verification>,

    /// Scroll the element into view before acting
    #[serde(default)]
    pub scroll_first: bool,

    /// Pause between the action and its verification (milliseconds)
    #[serde(default)]
    pub settle_ms: u64,
}

impl ActPlan {
    pub fn new(action: ElementAction) -> Self {
        Self {
            action,
            ..Default::default()
        }
    }

    pub fn click(force: bool) -> Self {
        Self::new(ElementAction::Click { force })
    }

    pub fn verify(mut self, verification: Verification) -> Self {
        self.verify = Some(verification);
        self
    }

    pub fn scroll_first(mut self) -> Self {
        self.scroll_first = true;
        self
    }

    pub fn settle(mut self, settle: Duration) -> Self {
        self.settle_ms = u64::try_from(settle.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

/// Why a candidate was (not) taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CandidateOutcome {
    /// Committed to the match at `index`
    Accepted { index: usize },
    /// Anchor resolved to zero nodes
    NoMatch,
    /// Fewer nodes than required
    TooFew { found: usize, required: usize },
    /// Matches exist but none of the inspected ones is visible
    NotVisible { checked: usize },
    /// Visible matches were all rejected by filters
    Filtered { rejected: usize },
    /// Every accepted match failed the action or its verification
    ActionFailed { reason: String },
    /// Lookup raised an error
    Failed { error: String },
    /// Lookup never answered within the candidate timeout
    TimedOut { after_ms: u64 },
}

impl CandidateOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, CandidateOutcome::Accepted { .. })
    }
}

impl fmt::Display for CandidateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateOutcome::Accepted { index } => write!(f, "accepted match #{}", index),
            CandidateOutcome::NoMatch => write!(f, "no match"),
            CandidateOutcome::TooFew { found, required } => {
                write!(f, "{} match(es), need {}", found, required)
            }
            CandidateOutcome::NotVisible { checked } => {
                write!(f, "none of {} match(es) visible", checked)
            }
            CandidateOutcome::Filtered { rejected } => {
                write!(f, "{} visible match(es) filtered out", rejected)
            }
            CandidateOutcome::ActionFailed { reason } => write!(f, "action failed: {}", reason),
            CandidateOutcome::Failed { error } => write!(f, "lookup error: {}", error),
            CandidateOutcome::TimedOut { after_ms } => write!(f, "timed out after {}ms", after_ms),
        }
    }
}

/// Record of one candidate's turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateAttempt {
    /// Position in the candidate list
    pub position: usize,
    pub candidate: String,
    pub outcome: CandidateOutcome,
    pub elapsed_ms: u64,
}

/// Result of a resolution: the committed element, if any, and the attempt log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Resolution {
    pub element: Option<ElementRef>,
    /// Position of the winning candidate
    pub candidate: Option<usize>,
    pub attempts: Vec<CandidateAttempt>,
    pub elapsed_ms: u64,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        self.element.is_some()
    }

    pub fn is_not_found(&self) -> bool {
        self.element.is_none()
    }

    pub fn winner(&self) -> Option<&CandidateAttempt> {
        self.attempts.iter().find(|a| a.outcome.is_accepted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_to_short_bounded_search() {
        let opts = LocateOptions::default();
        assert_eq!(opts.timeout(), Duration::from_millis(2000));
        assert_eq!(opts.poll_interval(), Duration::from_millis(100));
        assert_eq!(opts.scan_limit, 10);
        assert_eq!(opts.min_matches, 1);
        assert_eq!(opts.pick, Pick::FirstVisible);
    }

    #[test]
    fn options_deserialize_partial_yaml_shapes() {
        let opts: LocateOptions =
            serde_json::from_str(r#"{"timeout_ms": 3000, "pick": {"nth": 4}}"#).unwrap();
        assert_eq!(opts.timeout_ms, 3000);
        assert_eq!(opts.pick, Pick::Nth(4));
        assert_eq!(opts.scan_limit, 10);
    }

    #[test]
    fn candidate_list_from_css() {
        let list = CandidateList::css(["select#title", "select.title"]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.0[1].anchor, AnchorDescriptor::css("select.title"));
        assert_eq!(list.0[0].to_string(), "css:select#title");
    }
}
