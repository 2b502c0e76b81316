//! Candidate iteration with bounded search, filtering and act-and-verify

use std::sync::Arc;
use std::time::Duration;

use action_primitives::{
    ActionError, BrowserPort, ClickOptions, ElementRef, ElementState, SelectMethod,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::LocatorError;
use crate::filters::{first_rejection, required_attributes};
use crate::types::{
    ActPlan, Candidate, CandidateAttempt, CandidateList, CandidateOutcome, ElementAction,
    LocateOptions, Pick, Resolution, Verification,
};

/// A visible, filter-passing match together with its probe snapshot.
struct Accepted {
    element: ElementRef,
    state: ElementState,
}

/// Resolves candidate lists against one page.
#[derive(Clone)]
pub struct ResilientLocator {
    port: Arc<dyn BrowserPort>,
    cancel: CancellationToken,
}

impl ResilientLocator {
    pub fn new(port: Arc<dyn BrowserPort>) -> Self {
        Self {
            port,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn port(&self) -> &Arc<dyn BrowserPort> {
        &self.port
    }

    /// Find the first usable element without acting on it.
    pub async fn locate(
        &self,
        intent: &str,
        candidates: &CandidateList,
        options: &LocateOptions,
    ) -> Result<Resolution, LocatorError> {
        self.locate_and_act(intent, candidates, options, &ActPlan::default())
            .await
    }

    /// Find the first usable element and perform `plan` on it.
    ///
    /// When the action or its verification fails, the next accepted match of
    /// the same candidate is tried, then the next candidate. Nothing is
    /// attempted twice.
    pub async fn locate_and_act(
        &self,
        intent: &str,
        candidates: &CandidateList,
        options: &LocateOptions,
        plan: &ActPlan,
    ) -> Result<Resolution, LocatorError> {
        validate(intent, candidates, options)?;
        let started = Instant::now();
        let mut resolution = Resolution::default();

        for (position, candidate) in candidates.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(LocatorError::Interrupted(intent.to_string()));
            }
            let attempt_started = Instant::now();
            let (outcome, element) = self.attempt(candidate, options, plan).await?;
            let elapsed_ms = millis(attempt_started.elapsed());
            debug!(
                intent,
                candidate = %candidate,
                position,
                outcome = %outcome,
                elapsed_ms,
                "candidate tried"
            );
            let accepted = outcome.is_accepted();
            resolution.attempts.push(CandidateAttempt {
                position,
                candidate: candidate.to_string(),
                outcome,
                elapsed_ms,
            });
            if accepted {
                resolution.element = element;
                resolution.candidate = Some(position);
                break;
            }
        }

        resolution.elapsed_ms = millis(started.elapsed());
        match &resolution.element {
            Some(element) => info!(
                intent,
                element = %element,
                latency_ms = resolution.elapsed_ms,
                "element resolved"
            ),
            None => warn!(
                intent,
                tried = resolution.attempts.len(),
                latency_ms = resolution.elapsed_ms,
                "no candidate resolved"
            ),
        }
        Ok(resolution)
    }

    /// One candidate's turn: bounded search, then the acting phase.
    async fn attempt(
        &self,
        candidate: &Candidate,
        options: &LocateOptions,
        plan: &ActPlan,
    ) -> Result<(CandidateOutcome, Option<ElementRef>), LocatorError> {
        let mut last_seen: Option<CandidateOutcome> = None;
        let search = tokio::select! {
            _ = self.cancel.cancelled() => {
                return Err(LocatorError::Interrupted(candidate.to_string()));
            }
            res = tokio::time::timeout(
                options.timeout(),
                self.search(candidate, options, &mut last_seen),
            ) => res,
        };

        let accepted = match search {
            Ok(Ok(accepted)) => accepted,
            Ok(Err(err)) => {
                return Ok((
                    CandidateOutcome::Failed {
                        error: err.to_string(),
                    },
                    None,
                ))
            }
            Err(_) => {
                let outcome = last_seen.unwrap_or(CandidateOutcome::TimedOut {
                    after_ms: options.timeout_ms,
                });
                return Ok((outcome, None));
            }
        };

        if plan.action.is_none() {
            let first = accepted.into_iter().next();
            return Ok(match first {
                Some(hit) => (
                    CandidateOutcome::Accepted {
                        index: hit.element.index,
                    },
                    Some(hit.element),
                ),
                None => (CandidateOutcome::NoMatch, None),
            });
        }

        let mut last_failure = String::from("no accepted match");
        for hit in accepted {
            if self.cancel.is_cancelled() {
                return Err(LocatorError::Interrupted(candidate.to_string()));
            }
            match self.act(&hit, plan).await {
                Ok(()) => {
                    return Ok((
                        CandidateOutcome::Accepted {
                            index: hit.element.index,
                        },
                        Some(hit.element),
                    ))
                }
                Err(reason) => {
                    debug!(element = %hit.element, %reason, "substituting next match");
                    last_failure = format!("{}: {}", hit.element, reason);
                }
            }
        }
        Ok((
            CandidateOutcome::ActionFailed {
                reason: last_failure,
            },
            None,
        ))
    }

    /// Polls the candidate until some match is accepted.
    ///
    /// Runs inside the candidate timeout; `last_seen` keeps the most recent
    /// reason for rejection so an expired search can report it.
    async fn search(
        &self,
        candidate: &Candidate,
        options: &LocateOptions,
        last_seen: &mut Option<CandidateOutcome>,
    ) -> Result<Vec<Accepted>, ActionError> {
        let anchor = &candidate.anchor;
        let attributes = required_attributes(&options.filters);
        let required = options.min_matches.max(1);

        loop {
            let count = self.port.count(anchor).await?;
            let indices: Vec<usize> = match options.pick {
                _ if count == 0 => Vec::new(),
                _ if count < required => Vec::new(),
                Pick::FirstVisible => (0..count.min(options.scan_limit)).collect(),
                Pick::Nth(n) if n < count => vec![n],
                Pick::Nth(_) => Vec::new(),
            };

            if count == 0 {
                *last_seen = Some(CandidateOutcome::NoMatch);
            } else if indices.is_empty() {
                let needed = match options.pick {
                    Pick::Nth(n) => required.max(n + 1),
                    Pick::FirstVisible => required,
                };
                *last_seen = Some(CandidateOutcome::TooFew {
                    found: count,
                    required: needed,
                });
            } else {
                let mut accepted = Vec::new();
                let mut hidden = 0usize;
                let mut rejected = 0usize;
                for index in indices {
                    let element = anchor.nth(index);
                    let state = match self.port.probe(&element, &attributes).await {
                        Ok(state) => state,
                        // detached between count and probe
                        Err(ActionError::ElementNotFound(_)) => continue,
                        Err(err) => return Err(err),
                    };
                    if !state.visible {
                        hidden += 1;
                        continue;
                    }
                    match first_rejection(&options.filters, self.port.as_ref(), &element, &state)
                        .await
                    {
                        Ok(None) => {}
                        Ok(Some(reason)) => {
                            debug!(element = %element, %reason, "match filtered");
                            rejected += 1;
                            continue;
                        }
                        // detached before filtering
                        Err(ActionError::ElementNotFound(_)) => continue,
                        Err(err) => return Err(err),
                    }
                    accepted.push(Accepted { element, state });
                }
                if !accepted.is_empty() {
                    return Ok(accepted);
                }
                *last_seen = Some(if rejected > 0 {
                    CandidateOutcome::Filtered { rejected }
                } else {
                    CandidateOutcome::NotVisible { checked: hidden }
                });
            }

            tokio::time::sleep(options.poll_interval()).await;
        }
    }

    /// Performs the plan on one accepted match; `Err` carries the reason to log.
    async fn act(&self, hit: &Accepted, plan: &ActPlan) -> Result<(), String> {
        let port = self.port.as_ref();
        let element = &hit.element;
        if plan.scroll_first {
            port.scroll_into_view(element)
                .await
                .map_err(|e| e.to_string())?;
        }

        match &plan.action {
            ElementAction::None => {}
            ElementAction::Click { force } => port
                .click(element, ClickOptions { force: *force })
                .await
                .map_err(|e| e.to_string())?,
            ElementAction::Fill { value } if hit.state.tag.eq_ignore_ascii_case("select") => port
                .select_option(element, SelectMethod::Value, value)
                .await
                .map_err(|e| e.to_string())?,
            ElementAction::Fill { value } => {
                port.fill(element, value).await.map_err(|e| e.to_string())?
            }
            ElementAction::Type {
                text,
                delay_ms,
                clear,
            } => {
                if *clear {
                    port.click(element, ClickOptions::default())
                        .await
                        .map_err(|e| e.to_string())?;
                    port.fill(element, "").await.map_err(|e| e.to_string())?;
                }
                port.type_text(element, text, Duration::from_millis(*delay_ms))
                    .await
                    .map_err(|e| e.to_string())?
            }
            ElementAction::Select { method, item } => port
                .select_option(element, *method, item)
                .await
                .map_err(|e| e.to_string())?,
            ElementAction::Check => port.check(element).await.map_err(|e| e.to_string())?,
        }

        if plan.settle_ms > 0 {
            port.pause(Duration::from_millis(plan.settle_ms)).await;
        }

        match &plan.verify {
            None => Ok(()),
            Some(Verification::ValueContains { any_of }) => {
                let value = port.input_value(element).await.map_err(|e| e.to_string())?;
                if any_of.iter().any(|needle| value.contains(needle.as_str())) {
                    Ok(())
                } else {
                    Err(format!("value '{}' lacks any of {:?}", value, any_of))
                }
            }
            Some(Verification::ClassChanged) => {
                let after = port
                    .probe(element, &[])
                    .await
                    .map_err(|e| e.to_string())?;
                if after.class != hit.state.class || after.class.to_lowercase().contains("select") {
                    Ok(())
                } else {
                    Err(format!("class '{}' unchanged", after.class))
                }
            }
        }
    }
}

fn validate(
    intent: &str,
    candidates: &CandidateList,
    options: &LocateOptions,
) -> Result<(), LocatorError> {
    if candidates.is_empty() {
        return Err(LocatorError::EmptyCandidates(intent.to_string()));
    }
    if options.poll_interval_ms == 0 {
        return Err(LocatorError::InvalidOptions(
            "poll interval must be positive".into(),
        ));
    }
    if options.scan_limit == 0 && options.pick == Pick::FirstVisible {
        return Err(LocatorError::InvalidOptions(
            "scan limit must be positive".into(),
        ));
    }
    Ok(())
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::mock::MockPage;

    #[tokio::test]
    async fn empty_list_is_rejected() {
        let locator = ResilientLocator::new(Arc::new(MockPage::new("about:blank")));
        let err = locator
            .locate("nothing", &CandidateList::new(), &LocateOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, LocatorError::EmptyCandidates("nothing".into()));
    }

    #[tokio::test]
    async fn zero_poll_interval_is_invalid() {
        let locator = ResilientLocator::new(Arc::new(MockPage::new("about:blank")));
        let opts = LocateOptions {
            poll_interval_ms: 0,
            ..Default::default()
        };
        let err = locator
            .locate("x", &CandidateList::css(["#x"]), &opts)
            .await
            .unwrap_err();
        assert!(matches!(err, LocatorError::InvalidOptions(_)));
    }

    #[tokio::test]
    async fn cancelled_token_interrupts() {
        let token = CancellationToken::new();
        token.cancel();
        let locator =
            ResilientLocator::new(Arc::new(MockPage::new("about:blank"))).with_cancel(token);
        let err = locator
            .locate("x", &CandidateList::css(["#x"]), &LocateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LocatorError::Interrupted(_)));
    }
}
