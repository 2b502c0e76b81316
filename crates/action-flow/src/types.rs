//! Core types for flow orchestration

use std::collections::HashMap;
use std::fmt;

use action_gate::ExpectSpec;
use action_locator::{ActPlan, CandidateList, LocateOptions, Resolution};
use action_primitives::{ScrollTarget, WaitTier};
use busflow_core_types::{RunId, StepId};
use busflow_recipes::Intent;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Flow definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub root: FlowNode,

    /// Flow-level timeout in milliseconds
    pub timeout_ms: u64,

    /// Strategy for steps that do not set their own
    pub default_failure_strategy: FailureStrategy,

    pub metadata: HashMap<String, serde_json::Value>,
}

impl Flow {
    pub fn new(id: impl Into<String>, name: impl Into<String>, root: FlowNode) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            root,
            timeout_ms: 600_000,
            default_failure_strategy: FailureStrategy::Continue,
            metadata: HashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_default_strategy(mut self, strategy: FailureStrategy) -> Self {
        self.default_failure_strategy = strategy;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Number of action steps, nested sequences included.
    pub fn step_count(&self) -> usize {
        self.root.step_count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum FlowNode {
    /// Named group of steps run in order
    Sequence { name: String, steps: Vec<FlowNode> },

    /// Single action step
    Action {
        id: StepId,
        action: ActionType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        failure_strategy: Option<FailureStrategy>,
    },
}

impl FlowNode {
    pub fn sequence(name: impl Into<String>, steps: Vec<FlowNode>) -> Self {
        FlowNode::Sequence {
            name: name.into(),
            steps,
        }
    }

    pub fn action(id: &str, action: ActionType) -> Self {
        FlowNode::Action {
            id: StepId::new(id),
            action,
            failure_strategy: None,
        }
    }

    /// Step that ends the run when it fails.
    pub fn required(id: &str, action: ActionType) -> Self {
        FlowNode::Action {
            id: StepId::new(id),
            action,
            failure_strategy: Some(FailureStrategy::Abort),
        }
    }

    pub fn step_count(&self) -> usize {
        match self {
            FlowNode::Sequence { steps, .. } => steps.iter().map(FlowNode::step_count).sum(),
            FlowNode::Action { .. } => 1,
        }
    }
}

/// Action types that can be executed in flows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionType {
    Navigate {
        url: String,
        #[serde(default)]
        wait_tier: WaitTier,
    },

    /// Current URL must match; failure is an assertion
    ExpectUrl { pattern: String },

    WaitForUrl { pattern: String, timeout_ms: u64 },

    WaitForLoad { tier: WaitTier, timeout_ms: u64 },

    Pause { ms: u64 },

    /// Fill a city input and click the matching suggestion
    PickCity { input: Intent, city: String },

    /// Open the date picker, page forward to the month when asked, click the day
    PickDate {
        date: NaiveDate,
        #[serde(default)]
        navigate_months: bool,
    },

    /// Resolve an intent and act on the element
    Locate {
        intent: Intent,
        #[serde(default)]
        act: ActPlan,
        /// Replaces the intent's candidates for this step
        #[serde(default, skip_serializing_if = "Option::is_none")]
        candidates: Option<CandidateList>,
        /// Replaces the intent's options for this step
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<LocateOptions>,
        /// Not finding the element fails the step instead of skipping it
        #[serde(default)]
        required: bool,
    },

    /// Try several intents in order until one resolves and the act succeeds
    LocateFirstOf {
        intents: Vec<Intent>,
        #[serde(default)]
        act: ActPlan,
    },

    /// Force-click the first `count` visible matches, pausing after each
    ClickLabels {
        intent: Intent,
        count: usize,
        #[serde(default)]
        pause_ms: u64,
    },

    /// Select option `index` of the first dropdown with more than one option
    SelectIfPresent {
        intent: Intent,
        index: usize,
        #[serde(default)]
        settle_ms: u64,
    },

    Verify { expect: ExpectSpec },

    ScrollPage { target: ScrollTarget },

    /// Saved under the artifacts directory
    Screenshot {
        name: String,
        #[serde(default)]
        full_page: bool,
    },
}

impl ActionType {
    pub fn name(&self) -> &'static str {
        match self {
            ActionType::Navigate { .. } => "navigate",
            ActionType::ExpectUrl { .. } => "expect_url",
            ActionType::WaitForUrl { .. } => "wait_for_url",
            ActionType::WaitForLoad { .. } => "wait_for_load",
            ActionType::Pause { .. } => "pause",
            ActionType::PickCity { .. } => "pick_city",
            ActionType::PickDate { .. } => "pick_date",
            ActionType::Locate { .. } => "locate",
            ActionType::LocateFirstOf { .. } => "locate_first_of",
            ActionType::ClickLabels { .. } => "click_labels",
            ActionType::SelectIfPresent { .. } => "select_if_present",
            ActionType::Verify { .. } => "verify",
            ActionType::ScrollPage { .. } => "scroll_page",
            ActionType::Screenshot { .. } => "screenshot",
        }
    }
}

/// What happens to the run when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStrategy {
    Abort,
    /// Log the failure and go on with the next step
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded,
    SkippedNotFound,
    Failed,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StepOutcome::Succeeded => "succeeded",
            StepOutcome::SkippedNotFound => "skipped (not found)",
            StepOutcome::Failed => "failed",
        })
    }
}

/// Flow execution result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowResult {
    pub run_id: RunId,
    pub flow_id: String,

    /// True when every step ran (skips and tolerated failures included)
    pub success: bool,
    pub aborted: bool,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub latency_ms: u64,

    pub step_results: Vec<StepResult>,

    pub error: Option<String>,
}

impl FlowResult {
    pub fn new(flow_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: RunId::new(),
            flow_id: flow_id.into(),
            success: false,
            aborted: false,
            started_at: now,
            finished_at: now,
            latency_ms: 0,
            step_results: Vec::new(),
            error: None,
        }
    }

    pub fn with_success(mut self) -> Self {
        self.success = true;
        self
    }

    /// Mark as aborted
    pub fn with_error(mut self, error: String) -> Self {
        self.success = false;
        self.aborted = true;
        self.error = Some(error);
        self
    }

    pub fn with_steps(mut self, steps: Vec<StepResult>) -> Self {
        self.step_results = steps;
        self
    }

    /// Set finish time and calculate latency
    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self.latency_ms = (self.finished_at - self.started_at).num_milliseconds().max(0) as u64;
        self
    }

    pub fn count(&self, outcome: StepOutcome) -> usize {
        self.step_results
            .iter()
            .filter(|s| s.outcome == outcome)
            .count()
    }
}

/// Step execution result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: StepId,
    pub step_type: String,
    pub outcome: StepOutcome,

    /// Locator report for steps that resolve elements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub latency_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepResult {
    pub fn new(step_id: StepId, step_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            step_id,
            step_type: step_type.into(),
            outcome: StepOutcome::Failed,
            resolution: None,
            started_at: now,
            finished_at: now,
            latency_ms: 0,
            note: None,
            error: None,
        }
    }

    pub fn with_outcome(mut self, outcome: StepOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.outcome = StepOutcome::Failed;
        self.error = Some(error);
        self
    }

    pub fn with_resolution(mut self, resolution: Option<Resolution>) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    /// Set finish time and calculate latency
    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self.latency_ms = (self.finished_at - self.started_at).num_milliseconds().max(0) as u64;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_count_walks_sequences() {
        let flow = Flow::new(
            "f",
            "f",
            FlowNode::sequence(
                "root",
                vec![
                    FlowNode::action("a", ActionType::Pause { ms: 1 }),
                    FlowNode::sequence(
                        "inner",
                        vec![
                            FlowNode::action("b", ActionType::Pause { ms: 1 }),
                            FlowNode::action("c", ActionType::Pause { ms: 1 }),
                        ],
                    ),
                ],
            ),
        );
        assert_eq!(flow.step_count(), 3);
    }

    #[test]
    fn locate_step_serialises_without_overrides() {
        let node = FlowNode::action(
            "email",
            ActionType::Locate {
                intent: Intent::Email,
                act: ActPlan::default(),
                candidates: None,
                options: None,
                required: false,
            },
        );
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["action"]["type"], "locate");
        assert_eq!(json["action"]["intent"], "email");
        assert!(json["action"].get("candidates").is_none());
    }
}
