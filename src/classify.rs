//! Expectation classification.
//!
//! A pure function from declared expectation and observed outcome to a
//! verdict classification. The executor collapses every failure mode into
//! `succeeded = false`, so "blocked" here means "the statement did not
//! take effect" whatever the underlying cause; see
//! [`FailureKind`](crate::executor::FailureKind) for the reported
//! distinction between policy denials and other failures.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::executor::ExecutionOutcome;

/// What a test case declares about its statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Expectation {
    /// The statement must execute.
    Success,
    /// The statement must be blocked.
    Fail,
    /// The statement must execute; its payload is surfaced for inspection.
    Value,
}

/// The classifier's judgment for one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Pass,
    UnexpectedFail,
    UnexpectedSuccess,
}

impl Classification {
    /// Anything other than a pass is a policy regression candidate.
    pub fn is_anomaly(&self) -> bool {
        !matches!(self, Classification::Pass)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Pass => write!(f, "PASS"),
            Classification::UnexpectedFail => write!(f, "UNEXPECTED FAIL"),
            Classification::UnexpectedSuccess => write!(f, "UNEXPECTED SUCCESS"),
        }
    }
}

/// Reconcile an outcome against its declared expectation.
///
/// Pure: the same `(expectation, outcome)` pair always yields the same
/// classification.
pub fn classify(expectation: Expectation, outcome: &ExecutionOutcome) -> Classification {
    match (expectation, outcome.succeeded) {
        (Expectation::Success, true) => Classification::Pass,
        (Expectation::Success, false) => Classification::UnexpectedFail,
        (Expectation::Fail, false) => Classification::Pass,
        (Expectation::Fail, true) => Classification::UnexpectedSuccess,
        (Expectation::Value, true) => Classification::Pass,
        (Expectation::Value, false) => Classification::UnexpectedFail,
    }
}
