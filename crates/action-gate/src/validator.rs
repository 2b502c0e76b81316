//! Gate validator

use std::sync::Arc;
use std::time::Instant;

use action_primitives::{AnchorDescriptor, BrowserPort};
use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::conditions::{BusCategory, Condition};
use crate::errors::GateError;
use crate::evidence::{count_category, listing_evidence, sample_listings, url_evidence};
use crate::types::{Evidence, ExpectSpec, GateResult};

/// Listing selector used when the validator is built without one.
pub const DEFAULT_LISTING_SELECTOR: &str =
    "[class*=\"bus\"], [class*=\"list-item\"], .result-item, div[ng-repeat]";

/// Outcome of a single condition.
#[derive(Debug, Clone)]
pub struct ConditionCheck {
    pub passed: bool,
    pub reason: String,
    pub evidence: Option<Evidence>,
}

impl ConditionCheck {
    fn pass(reason: impl Into<String>) -> Self {
        Self {
            passed: true,
            reason: reason.into(),
            evidence: None,
        }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: reason.into(),
            evidence: None,
        }
    }

    fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence = Some(evidence);
        self
    }
}

#[async_trait]
pub trait GateValidator: Send + Sync {
    async fn validate(&self, spec: &ExpectSpec) -> Result<GateResult, GateError>;

    async fn validate_condition(&self, condition: &Condition)
        -> Result<ConditionCheck, GateError>;

    /// Like `validate`, but a failed spec becomes `GateError::AssertionFailed`.
    async fn ensure(&self, spec: &ExpectSpec) -> Result<GateResult, GateError> {
        let result = self.validate(spec).await?;
        if result.passed {
            Ok(result)
        } else {
            Err(GateError::AssertionFailed(result.reasons.join("; ")))
        }
    }
}

pub struct DefaultGateValidator {
    port: Arc<dyn BrowserPort>,
    listing: AnchorDescriptor,
}

impl DefaultGateValidator {
    pub fn new(port: Arc<dyn BrowserPort>) -> Self {
        Self {
            port,
            listing: AnchorDescriptor::css(DEFAULT_LISTING_SELECTOR),
        }
    }

    pub fn with_listing(mut self, listing: AnchorDescriptor) -> Self {
        self.listing = listing;
        self
    }

    async fn check_url(&self, pattern: &str) -> Result<ConditionCheck, GateError> {
        let re = Regex::new(pattern)
            .map_err(|e| GateError::InvalidSpec(format!("bad url pattern /{}/: {}", pattern, e)))?;
        let url = self.port.current_url().await?;
        let check = if re.is_match(&url) {
            ConditionCheck::pass(format!("url {} matches /{}/", url, pattern))
        } else {
            ConditionCheck::fail(format!("url {} does not match /{}/", url, pattern))
        };
        Ok(check.with_evidence(url_evidence(&url)))
    }

    /// Listing lookups are best-effort: a read error skips the check.
    async fn check_listing(&self, expected: BusCategory, sample: usize) -> ConditionCheck {
        let samples = match sample_listings(self.port.as_ref(), &self.listing, sample).await {
            Ok(samples) => samples,
            Err(err) => {
                warn!(error = %err, %expected, "listing verification skipped");
                return ConditionCheck::pass(format!("{} verification skipped: {}", expected, err));
            }
        };
        if samples.is_empty() {
            warn!(%expected, "no bus listings found");
            return ConditionCheck::pass("no bus listings found");
        }

        for s in &samples {
            debug!(index = s.index + 1, category = %s.category, excerpt = %s.excerpt, "listing");
        }
        let evidence = listing_evidence(expected, &samples);
        let matching = count_category(&samples, expected);
        let check = match expected.opposite() {
            Some(opposite) if count_category(&samples, opposite) > 0 => ConditionCheck::fail(format!(
                "{} filter failed: found {} {} buses in listing",
                expected,
                count_category(&samples, opposite),
                opposite
            )),
            _ => ConditionCheck::pass(format!(
                "{} of {} sampled listings are {}",
                matching,
                samples.len(),
                expected
            )),
        };
        check.with_evidence(evidence)
    }
}

#[async_trait]
impl GateValidator for DefaultGateValidator {
    async fn validate(&self, spec: &ExpectSpec) -> Result<GateResult, GateError> {
        let start = Instant::now();
        if !spec.has_conditions() {
            warn!("ExpectSpec has no conditions, passing by default");
            return Ok(GateResult::pass(vec!["No conditions to validate".to_string()]));
        }

        let mut reasons = Vec::new();
        let mut evidence = Vec::new();
        let mut all_passed = true;
        for condition in &spec.all {
            let check = self.validate_condition(condition).await?;
            if check.passed {
                debug!(%condition, reason = %check.reason, "condition passed");
            } else {
                warn!(%condition, reason = %check.reason, "condition failed");
                all_passed = false;
            }
            reasons.push(check.reason);
            evidence.extend(check.evidence);
        }

        let latency_ms = start.elapsed().as_millis() as u64;
        let result = if all_passed {
            info!(latency_ms, "gate passed");
            GateResult::pass(reasons)
        } else {
            info!(latency_ms, "gate failed");
            GateResult::fail(reasons)
        };
        Ok(result.with_evidence(evidence).with_latency(latency_ms))
    }

    async fn validate_condition(
        &self,
        condition: &Condition,
    ) -> Result<ConditionCheck, GateError> {
        match condition {
            Condition::UrlMatches { pattern } => self.check_url(pattern).await,
            Condition::ListingCategory { expected, sample } => {
                if *expected == BusCategory::Unknown {
                    return Err(GateError::InvalidSpec(
                        "listing check needs AC or Non-AC".into(),
                    ));
                }
                Ok(self.check_listing(*expected, *sample).await)
            }
        }
    }
}
