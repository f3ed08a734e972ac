//! # Two-Phase Submission
//!
//! Every state-changing registry call is split into `submit → TxHandle` and
//! `await → Finality`. Abandoning the await means "stop waiting", never
//! "undo": the ledger may still finalize the transition later, and the next
//! explicit refresh observes it.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque handle to a submitted transition (a transaction hash on EVM).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHandle(String);

impl TxHandle {
    /// Wrap a ledger-issued handle.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ledger-reported status of a submitted transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    /// Known but not yet durable.
    Pending,
    /// Durable and observable by reads.
    Finalized {
        /// Block (or seal) height that includes the transition.
        block: u64,
    },
    /// Executed and reverted; registry state is unchanged.
    Reverted {
        /// Revert reason as reported by the ledger.
        reason: String,
    },
}

/// Proof that a transition finalized, as observed by this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Handle of the finalized transition.
    pub handle: TxHandle,
    /// Including block height.
    pub block: u64,
    /// When this client observed finality.
    pub observed_at: DateTime<Utc>,
}

/// Terminal outcome of awaiting a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finality {
    /// The transition is durable.
    Finalized(TxReceipt),
    /// The caller stopped waiting; the transition may still commit.
    Abandoned(TxHandle),
}

impl Finality {
    /// Whether the transition was observed as finalized.
    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized(_))
    }

    /// Handle of the awaited transition.
    pub fn handle(&self) -> &TxHandle {
        match self {
            Self::Finalized(receipt) => &receipt.handle,
            Self::Abandoned(handle) => handle,
        }
    }
}

/// How long and how often to poll for finality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwaitPolicy {
    /// Delay between status polls.
    pub poll_interval: Duration,
    /// Give up (abandon) once this much time has elapsed.
    pub max_wait: Duration,
}

impl AwaitPolicy {
    /// Create a policy from explicit durations.
    pub fn new(poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            poll_interval,
            max_wait,
        }
    }

    /// Poll exactly once and abandon if the transition is not yet final.
    pub fn single_poll() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }
}

impl Default for AwaitPolicy {
    /// One second between polls, two minutes total.
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(120))
    }
}
