//! Shared types for the recipient pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::directory::Lookup;

// ── Classification ──────────────────────────────────────────────────

/// Requested recipients split by directory membership.
///
/// Both lists keep first-seen input order and hold no duplicates; an
/// address is in exactly one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub deliverable: Vec<String>,
    pub unknown: Vec<String>,
}

impl ClassificationResult {
    /// Fold one lookup into the result.
    pub fn record(mut self, address: String, lookup: Lookup) -> Self {
        if self.contains(&address) {
            return self;
        }
        match lookup {
            Lookup::Found => self.deliverable.push(address),
            Lookup::NotFound => self.unknown.push(address),
        }
        self
    }

    pub fn contains(&self, address: &str) -> bool {
        self.deliverable.iter().any(|a| a == address) || self.unknown.iter().any(|a| a == address)
    }

    pub fn has_unknown(&self) -> bool {
        !self.unknown.is_empty()
    }
}

// ── Invocation state ────────────────────────────────────────────────

/// Lifecycle of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Classifying,
    Delivering,
    ComposingBounce,
    Notifying,
    Closed,
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Classifying => "classifying",
            Self::Delivering => "delivering",
            Self::ComposingBounce => "composing_bounce",
            Self::Notifying => "notifying",
            Self::Closed => "closed",
        })
    }
}

// ── Report ──────────────────────────────────────────────────────────

/// A local delivery that failed for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientFailure {
    pub address: String,
    pub reason: String,
}

/// What happened on the bounce path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum BounceOutcome {
    /// Every recipient was known.
    NotNeeded,
    /// One notification was accepted by the notifier.
    Sent,
    /// Unknown recipients existed but the message had no sender to bounce to.
    Suppressed,
    /// The notifier refused or could not be reached.
    Failed(String),
}

impl BounceOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotNeeded => "not_needed",
            Self::Sent => "sent",
            Self::Suppressed => "suppressed",
            Self::Failed(_) => "failed",
        }
    }
}

/// Result of processing one inbound message.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReport {
    pub delivered: Vec<String>,
    pub unknown: Vec<String>,
    pub failures: Vec<RecipientFailure>,
    pub bounce: BounceOutcome,
    pub finished_at: DateTime<Utc>,
}

impl DeliveryReport {
    /// No delivery failed and the bounce, if any was needed, went out.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !matches!(self.bounce, BounceOutcome::Failed(_))
    }
}
