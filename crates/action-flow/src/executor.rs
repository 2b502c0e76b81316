//! Flow executor implementation

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use action_gate::{
    Condition, DefaultGateValidator, ExpectSpec, GateValidator, DEFAULT_LISTING_SELECTOR,
};
use action_locator::{
    ActPlan, CandidateList, ElementAction, LocateOptions, Resolution, ResilientLocator,
};
use action_primitives::{
    ActionError, AnchorDescriptor, BrowserPort, ClickOptions, DefaultWaitStrategy, SelectMethod,
};
use async_trait::async_trait;
use busflow_core_types::StepId;
use busflow_recipes::{Intent, IntentTable};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::FlowError;
use crate::strategies::{DefaultFailureHandler, FailureHandler, FailureHandlerResult};
use crate::types::*;

/// Upper bound on "next month" clicks while paging the date picker.
const MAX_MONTH_STEPS: usize = 24;

const MONTH_LABEL: &str = ".ui-datepicker-month";
const YEAR_LABEL: &str = ".ui-datepicker-year";
const NEXT_MONTH: &str = ".ui-datepicker-next";
const DAY_CELL: &str = ".ui-state-default";

/// Flow executor trait
#[async_trait]
pub trait FlowExecutor: Send + Sync {
    /// Execute a flow. Step failures end up in the result; only an invalid
    /// flow is returned as an error.
    async fn execute(&self, flow: &Flow) -> Result<FlowResult, FlowError>;

    /// Validate flow structure
    fn validate_flow(&self, flow: &Flow) -> Result<(), FlowError>;
}

/// A step of the flattened tree with its effective failure strategy.
struct PlannedStep<'a> {
    id: &'a StepId,
    action: &'a ActionType,
    strategy: FailureStrategy,
}

struct StepDone {
    outcome: StepOutcome,
    note: Option<String>,
}

impl StepDone {
    fn ok() -> Self {
        Self {
            outcome: StepOutcome::Succeeded,
            note: None,
        }
    }

    fn skipped(note: impl Into<String>) -> Self {
        Self {
            outcome: StepOutcome::SkippedNotFound,
            note: Some(note.into()),
        }
    }

    fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Default flow executor implementation
pub struct DefaultFlowExecutor {
    port: Arc<dyn BrowserPort>,
    locator: ResilientLocator,
    gate: Option<Arc<dyn GateValidator>>,
    intents: Arc<IntentTable>,
    failure_handler: Arc<dyn FailureHandler>,
    waits: DefaultWaitStrategy,
    artifacts_dir: PathBuf,
    cancel: CancellationToken,
}

impl DefaultFlowExecutor {
    pub fn new(port: Arc<dyn BrowserPort>) -> Self {
        Self {
            locator: ResilientLocator::new(Arc::clone(&port)),
            port,
            gate: None,
            intents: Arc::new(IntentTable::builtin()),
            failure_handler: Arc::new(DefaultFailureHandler::new()),
            waits: DefaultWaitStrategy::default(),
            artifacts_dir: PathBuf::from("artifacts"),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_intents(mut self, intents: Arc<IntentTable>) -> Self {
        self.intents = intents;
        self
    }

    /// Replace the gate built from the bus-listing intent.
    pub fn with_gate(mut self, gate: Arc<dyn GateValidator>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_failure_handler(mut self, handler: Arc<dyn FailureHandler>) -> Self {
        self.failure_handler = handler;
        self
    }

    pub fn with_waits(mut self, waits: DefaultWaitStrategy) -> Self {
        self.waits = waits;
        self
    }

    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    /// Stop the run (and any locator wait in progress) when `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.locator = self.locator.with_cancel(cancel.clone());
        self.cancel = cancel;
        self
    }

    fn gate(&self) -> Arc<dyn GateValidator> {
        if let Some(gate) = &self.gate {
            return Arc::clone(gate);
        }
        let listing = self
            .intents
            .candidates(Intent::BusListing)
            .iter()
            .next()
            .map(|c| c.anchor.clone())
            .unwrap_or_else(|| AnchorDescriptor::css(DEFAULT_LISTING_SELECTOR));
        Arc::new(DefaultGateValidator::new(Arc::clone(&self.port)).with_listing(listing))
    }

    async fn run_steps(
        &self,
        steps: &[PlannedStep<'_>],
        results: &mut Vec<StepResult>,
    ) -> Result<(), FlowError> {
        for (i, step) in steps.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(FlowError::Interrupted);
            }
            info!(
                step_id = %step.id,
                action = step.action.name(),
                "step {}/{}",
                i + 1,
                steps.len()
            );

            let mut trace = None;
            let result = StepResult::new(step.id.clone(), step.action.name());
            match self.run_action(step.action, &mut trace).await {
                Ok(done) => {
                    if done.outcome == StepOutcome::SkippedNotFound {
                        warn!(step_id = %step.id, "element not found, step skipped");
                    }
                    results.push(
                        result
                            .with_outcome(done.outcome)
                            .with_resolution(trace)
                            .with_note(done.note)
                            .finish(),
                    );
                }
                Err(err) => {
                    warn!(step_id = %step.id, error = %err, "step failed");
                    results.push(
                        result
                            .with_error(err.to_string())
                            .with_resolution(trace)
                            .finish(),
                    );
                    match self
                        .failure_handler
                        .handle_failure(step.id.as_str(), step.strategy, &err)
                    {
                        FailureHandlerResult::Abort(_) => return Err(err),
                        FailureHandlerResult::Continue(msg) => {
                            debug!(step_id = %step.id, "{}", msg);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn run_action(
        &self,
        action: &ActionType,
        trace: &mut Option<Resolution>,
    ) -> Result<StepDone, FlowError> {
        match action {
            ActionType::Navigate { url, wait_tier } => {
                self.port
                    .navigate(url, *wait_tier, self.waits.timeout_for(*wait_tier))
                    .await?;
                Ok(StepDone::ok())
            }
            ActionType::ExpectUrl { pattern } => {
                let spec = ExpectSpec::new().with_all(Condition::url_matches(pattern.clone()));
                self.gate().ensure(&spec).await?;
                Ok(StepDone::ok())
            }
            ActionType::WaitForUrl {
                pattern,
                timeout_ms,
            } => {
                let re = Regex::new(pattern).map_err(|e| {
                    FlowError::ValidationFailed(format!("bad url pattern '{}': {}", pattern, e))
                })?;
                self.port
                    .wait_for_url(&re, Duration::from_millis(*timeout_ms))
                    .await?;
                Ok(StepDone::ok())
            }
            ActionType::WaitForLoad { tier, timeout_ms } => {
                self.port
                    .wait_for_load(*tier, Duration::from_millis(*timeout_ms))
                    .await?;
                Ok(StepDone::ok())
            }
            ActionType::Pause { ms } => {
                self.port.pause(Duration::from_millis(*ms)).await;
                Ok(StepDone::ok())
            }
            ActionType::PickCity { input, city } => self.pick_city(*input, city, trace).await,
            ActionType::PickDate {
                date,
                navigate_months,
            } => self.pick_date(*date, *navigate_months, trace).await,
            ActionType::Locate {
                intent,
                act,
                candidates,
                options,
                required,
            } => {
                let resolution = self
                    .resolve(*intent, candidates.as_ref(), options.as_ref(), act)
                    .await?;
                let found = resolution.is_found();
                *trace = Some(resolution);
                settle_outcome(*intent, found, *required)
            }
            ActionType::LocateFirstOf { intents, act } => {
                for intent in intents {
                    let resolution = self.resolve(*intent, None, None, act).await?;
                    let found = resolution.is_found();
                    *trace = Some(resolution);
                    if found {
                        return Ok(StepDone::ok().with_note(format!("resolved via {}", intent)));
                    }
                    debug!(intent = %intent, "falling through to next intent");
                }
                Ok(StepDone::skipped("no intent resolved"))
            }
            ActionType::ClickLabels {
                intent,
                count,
                pause_ms,
            } => self.click_labels(*intent, *count, *pause_ms).await,
            ActionType::SelectIfPresent {
                intent,
                index,
                settle_ms,
            } => {
                let plan = ActPlan::new(ElementAction::Select {
                    method: SelectMethod::Index,
                    item: index.to_string(),
                })
                .settle(Duration::from_millis(*settle_ms));
                let resolution = self.resolve(*intent, None, None, &plan).await?;
                let found = resolution.is_found();
                *trace = Some(resolution);
                settle_outcome(*intent, found, false)
            }
            ActionType::Verify { expect } => {
                let result = self.gate().ensure(expect).await?;
                Ok(StepDone::ok().with_note(result.reasons.join("; ")))
            }
            ActionType::ScrollPage { target } => {
                self.port.scroll(target).await?;
                Ok(StepDone::ok())
            }
            ActionType::Screenshot { name, full_page } => {
                let path = self.artifacts_dir.join(name);
                self.port.screenshot(&path, *full_page).await?;
                info!(path = %path.display(), "screenshot saved");
                Ok(StepDone::ok().with_note(path.display().to_string()))
            }
        }
    }

    /// Resolve an intent with its recipe, step-level overrides winning.
    async fn resolve(
        &self,
        intent: Intent,
        candidates: Option<&CandidateList>,
        options: Option<&LocateOptions>,
        plan: &ActPlan,
    ) -> Result<Resolution, FlowError> {
        let recipe = self.intents.get(intent);
        let candidates = candidates.unwrap_or(&recipe.candidates);
        let options = options.unwrap_or(&recipe.options);
        Ok(self
            .locator
            .locate_and_act(intent.as_str(), candidates, options, plan)
            .await?)
    }

    async fn resolve_required(
        &self,
        intent: Intent,
        candidates: Option<&CandidateList>,
        plan: &ActPlan,
        trace: &mut Option<Resolution>,
    ) -> Result<(), FlowError> {
        let resolution = self.resolve(intent, candidates, None, plan).await?;
        let found = resolution.is_found();
        *trace = Some(resolution);
        settle_outcome(intent, found, true).map(|_| ())
    }

    async fn pick_city(
        &self,
        input: Intent,
        city: &str,
        trace: &mut Option<Resolution>,
    ) -> Result<StepDone, FlowError> {
        let fill = ActPlan::new(ElementAction::Fill {
            value: city.to_string(),
        });
        self.resolve_required(input, None, &fill, trace).await?;

        let suggestions: CandidateList = self
            .intents
            .candidates(Intent::CitySuggestion)
            .iter()
            .map(|c| match &c.anchor {
                AnchorDescriptor::Css { selector } => AnchorDescriptor::text(selector.clone(), city),
                other => other.clone(),
            })
            .collect();
        self.resolve_required(
            Intent::CitySuggestion,
            Some(&suggestions),
            &ActPlan::click(false),
            trace,
        )
        .await?;
        Ok(StepDone::ok().with_note(city.to_string()))
    }

    async fn pick_date(
        &self,
        date: NaiveDate,
        navigate_months: bool,
        trace: &mut Option<Resolution>,
    ) -> Result<StepDone, FlowError> {
        self.resolve_required(Intent::DatePicker, None, &ActPlan::click(false), trace)
            .await?;

        if navigate_months {
            let month = date.format("%B").to_string();
            let year = date.format("%Y").to_string();
            let month_label = AnchorDescriptor::css(MONTH_LABEL).nth(0);
            let year_label = AnchorDescriptor::css(YEAR_LABEL).nth(0);
            let next = AnchorDescriptor::css(NEXT_MONTH).nth(0);
            let mut steps = 0;
            loop {
                let shown_month = self.port.text_content(&month_label).await?;
                let shown_year = self.port.text_content(&year_label).await?;
                if shown_month.contains(&month) && shown_year.contains(&year) {
                    break;
                }
                if steps == MAX_MONTH_STEPS {
                    return Err(ActionError::ElementNotFound(format!(
                        "{} {} not reached after {} months",
                        month, year, MAX_MONTH_STEPS
                    ))
                    .into());
                }
                debug!(shown = %shown_month, target = %month, "paging date picker");
                self.port.click(&next, ClickOptions::default()).await?;
                self.port.pause(Duration::from_millis(100)).await;
                steps += 1;
            }
        }

        let day = AnchorDescriptor::text_exact(DAY_CELL, date.day().to_string());
        self.resolve_required(
            Intent::DatePicker,
            Some(&CandidateList::new().push(day)),
            &ActPlan::click(false),
            trace,
        )
        .await?;
        Ok(StepDone::ok().with_note(date.to_string()))
    }

    /// Force-click the first `count` visible matches of the first candidate
    /// that has any. Click errors on one match move on to the next.
    async fn click_labels(
        &self,
        intent: Intent,
        count: usize,
        pause_ms: u64,
    ) -> Result<StepDone, FlowError> {
        let mut clicked = 0;
        for candidate in self.intents.candidates(intent).iter() {
            let total = match self.port.count(&candidate.anchor).await {
                Ok(n) => n,
                Err(err) => {
                    debug!(candidate = %candidate, error = %err, "label lookup failed");
                    continue;
                }
            };
            for index in 0..total {
                if clicked == count {
                    break;
                }
                let element = candidate.anchor.nth(index);
                let visible = matches!(self.port.probe(&element, &[]).await, Ok(s) if s.visible);
                if !visible {
                    continue;
                }
                match self.port.click(&element, ClickOptions::forced()).await {
                    Ok(()) => {
                        clicked += 1;
                        info!(intent = %intent, element = %element, "label clicked");
                        self.port.pause(Duration::from_millis(pause_ms)).await;
                    }
                    Err(err) => debug!(element = %element, error = %err, "label click failed"),
                }
            }
            if clicked > 0 {
                break;
            }
        }

        match clicked {
            0 => Ok(StepDone::skipped("no visible label")),
            n if n < count => {
                warn!(intent = %intent, clicked = n, wanted = count, "some labels may be auto-selected");
                Ok(StepDone::ok().with_note(format!("{} of {} clicked", n, count)))
            }
            n => Ok(StepDone::ok().with_note(format!("{} clicked", n))),
        }
    }
}

/// Not-found is a skip, unless the step requires the element.
fn settle_outcome(intent: Intent, found: bool, required: bool) -> Result<StepDone, FlowError> {
    match (found, required) {
        (true, _) => Ok(StepDone::ok()),
        (false, true) => Err(ActionError::ElementNotFound(intent.to_string()).into()),
        (false, false) => Ok(StepDone::skipped(format!("{} not found", intent))),
    }
}

fn flatten<'a>(node: &'a FlowNode, default: FailureStrategy, out: &mut Vec<PlannedStep<'a>>) {
    match node {
        FlowNode::Sequence { steps, .. } => {
            for step in steps {
                flatten(step, default, out);
            }
        }
        FlowNode::Action {
            id,
            action,
            failure_strategy,
        } => out.push(PlannedStep {
            id,
            action,
            strategy: failure_strategy.unwrap_or(default),
        }),
    }
}

fn validate_node(node: &FlowNode) -> Result<(), FlowError> {
    match node {
        FlowNode::Sequence { name, steps } => {
            if steps.is_empty() {
                return Err(FlowError::InvalidStructure(format!(
                    "sequence '{}' has no steps",
                    name
                )));
            }
            steps.iter().try_for_each(validate_node)
        }
        FlowNode::Action { id, .. } => {
            if id.as_str().is_empty() {
                return Err(FlowError::InvalidStructure("step id is empty".to_string()));
            }
            Ok(())
        }
    }
}

#[async_trait]
impl FlowExecutor for DefaultFlowExecutor {
    async fn execute(&self, flow: &Flow) -> Result<FlowResult, FlowError> {
        info!(flow = %flow.id, steps = flow.step_count(), "executing flow: {}", flow.name);
        self.validate_flow(flow)?;

        let mut steps = Vec::new();
        flatten(&flow.root, flow.default_failure_strategy, &mut steps);

        let result = FlowResult::new(flow.id.clone());
        let mut step_results = Vec::new();
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => Err(FlowError::Interrupted),
            res = timeout(
                Duration::from_millis(flow.timeout_ms),
                self.run_steps(&steps, &mut step_results),
            ) => res.unwrap_or(Err(FlowError::Timeout(flow.timeout_ms))),
        };

        let result = match outcome {
            Ok(()) => {
                info!(flow = %flow.id, "flow completed");
                result.with_success()
            }
            Err(err) => {
                warn!(flow = %flow.id, error = %err, "flow aborted");
                result.with_error(err.to_string())
            }
        };
        Ok(result.with_steps(step_results).finish())
    }

    fn validate_flow(&self, flow: &Flow) -> Result<(), FlowError> {
        if flow.id.is_empty() {
            return Err(FlowError::ValidationFailed("flow id is empty".to_string()));
        }
        if flow.timeout_ms == 0 {
            return Err(FlowError::ValidationFailed(
                "flow timeout must be positive".to_string(),
            ));
        }
        validate_node(&flow.root)
    }
}
