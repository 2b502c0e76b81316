//! Core types for the gate

use serde::{Deserialize, Serialize};

use crate::conditions::Condition;

/// Expectations checked after a step; every condition must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectSpec {
    pub all: Vec<Condition>,
}

impl ExpectSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add "all" condition (AND)
    pub fn with_all(mut self, condition: Condition) -> Self {
        self.all.push(condition);
        self
    }

    pub fn has_conditions(&self) -> bool {
        !self.all.is_empty()
    }
}

/// Gate validation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub passed: bool,

    /// One line per condition, failed or not
    pub reasons: Vec<String>,

    pub evidence: Vec<Evidence>,

    pub latency_ms: u64,
}

impl GateResult {
    pub fn pass(reasons: Vec<String>) -> Self {
        Self {
            passed: true,
            reasons,
            evidence: Vec::new(),
            latency_ms: 0,
        }
    }

    pub fn fail(reasons: Vec<String>) -> Self {
        Self {
            passed: false,
            reasons,
            evidence: Vec::new(),
            latency_ms: 0,
        }
    }

    pub fn with_evidence(mut self, evidence: Vec<Evidence>) -> Self {
        self.evidence.extend(evidence);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

/// Evidence piece from validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub evidence_type: EvidenceType,
    pub description: String,
    pub value: serde_json::Value,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Evidence {
    pub fn new(
        evidence_type: EvidenceType,
        description: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        Self {
            evidence_type,
            description: description.into(),
            value,
            timestamp: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    Url,
    Listing,
}
