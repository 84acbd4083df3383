//! Sequential suite orchestration.
//!
//! Suites run strictly one after another on the single shared connection.
//! Session claims are per-connection state, so concurrent suites would
//! run statements under each other's identity and silently invalidate
//! the verdicts. The catalog order is part of the contract: later suites
//! observe rows earlier suites created.

use chrono::Utc;
use tracing::info;

use crate::executor::StatementExecutor;
use crate::report::Summary;
use crate::suite::{run_suite, RoleSuite};

/// Run every suite in catalog order and aggregate the reports.
pub async fn run_all(executor: &mut dyn StatementExecutor, catalog: &[RoleSuite]) -> Summary {
    let started_at = Utc::now();
    let mut reports = Vec::with_capacity(catalog.len());
    for suite in catalog {
        info!(role = %suite.role(), cases = suite.cases.len(), "running suite");
        reports.push(run_suite(executor, suite).await);
    }
    Summary {
        started_at,
        reports,
    }
}
