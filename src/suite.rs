//! Role test suites and the per-suite runner.
//!
//! A suite is one role's identity plus an ordered list of
//! (name, statement, expectation) cases. The runner walks
//! `Init -> IdentitySet -> Running -> IdentityCleared -> Done`; clearing
//! the identity is the one mandatory cleanup action and is attempted
//! exactly once no matter how the run ends, so one role's claims cannot
//! linger into the next suite.

use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::{classify, Classification, Expectation};
use crate::executor::{ExecutionOutcome, StatementExecutor};
use crate::identity::{IdentityContext, Role};

/// One scripted statement with its declared expectation. Immutable once
/// declared; part of a static catalog.
#[derive(Debug, Clone, Serialize)]
pub struct TestCase {
    pub name: String,
    pub statement: String,
    pub expectation: Expectation,
}

impl TestCase {
    pub fn new(
        name: impl Into<String>,
        statement: impl Into<String>,
        expectation: Expectation,
    ) -> Self {
        Self {
            name: name.into(),
            statement: statement.into(),
            expectation,
        }
    }
}

/// One role's identity and its ordered cases.
#[derive(Debug, Clone, Serialize)]
pub struct RoleSuite {
    pub identity: IdentityContext,
    pub cases: Vec<TestCase>,
}

impl RoleSuite {
    pub fn new(identity: IdentityContext) -> Self {
        Self {
            identity,
            cases: Vec::new(),
        }
    }

    pub fn with_cases(mut self, cases: Vec<TestCase>) -> Self {
        self.cases = cases;
        self
    }

    pub fn role(&self) -> Role {
        self.identity.role
    }
}

/// The classifier's judgment for a single case.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub case: TestCase,
    pub outcome: ExecutionOutcome,
    pub classification: Classification,
}

/// Everything observed while running one suite.
#[derive(Debug, Clone, Serialize)]
pub struct RoleReport {
    pub role: Role,
    pub identity: IdentityContext,
    /// Set when the identity claims could not be applied; the suite then
    /// carries zero verdicts.
    pub suite_error: Option<String>,
    pub verdicts: Vec<Verdict>,
}

impl RoleReport {
    pub fn passed(&self) -> usize {
        self.verdicts
            .iter()
            .filter(|v| v.classification == Classification::Pass)
            .count()
    }

    pub fn unexpected_failures(&self) -> usize {
        self.verdicts
            .iter()
            .filter(|v| v.classification == Classification::UnexpectedFail)
            .count()
    }

    pub fn unexpected_successes(&self) -> usize {
        self.verdicts
            .iter()
            .filter(|v| v.classification == Classification::UnexpectedSuccess)
            .count()
    }

    pub fn anomalies(&self) -> usize {
        self.verdicts
            .iter()
            .filter(|v| v.classification.is_anomaly())
            .count()
    }
}

/// Runner states. `IdentityCleared` is reached from any state once
/// cleanup has been attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SuiteState {
    Init,
    IdentitySet,
    Running,
    IdentityCleared,
    Done,
}

/// Run one suite: apply the identity, execute the cases in declared
/// order, classify each outcome, and clear the identity.
pub async fn run_suite(executor: &mut dyn StatementExecutor, suite: &RoleSuite) -> RoleReport {
    let mut state = SuiteState::Init;
    debug!(role = %suite.role(), ?state, "suite starting");

    let mut report = RoleReport {
        role: suite.role(),
        identity: suite.identity.clone(),
        suite_error: None,
        verdicts: Vec::with_capacity(suite.cases.len()),
    };

    match executor.apply_identity(&suite.identity).await {
        Ok(()) => {
            state = SuiteState::IdentitySet;
            debug!(role = %suite.role(), ?state, "session claims applied");
        }
        Err(e) => {
            warn!(role = %suite.role(), error = %e, "failed to set session claims; skipping cases");
            report.suite_error = Some(e.to_string());
            // The set may have partially applied; clearing stays mandatory.
            clear_identity_guard(executor, &mut state).await;
            return report;
        }
    }

    state = SuiteState::Running;
    debug!(role = %suite.role(), ?state, cases = suite.cases.len(), "executing cases");
    for case in &suite.cases {
        // Declared order matters: later cases may depend on rows earlier
        // ones mutated.
        let outcome = executor.execute(&case.statement, Some(&suite.identity)).await;
        let classification = classify(case.expectation, &outcome);
        report.verdicts.push(Verdict {
            case: case.clone(),
            outcome,
            classification,
        });
    }

    clear_identity_guard(executor, &mut state).await;
    state = SuiteState::Done;
    debug!(role = %suite.role(), ?state, verdicts = report.verdicts.len(), "suite done");
    report
}

/// Unconditional transition to `IdentityCleared`. A failed clear is
/// logged but cannot fail the suite.
async fn clear_identity_guard(executor: &mut dyn StatementExecutor, state: &mut SuiteState) {
    if let Err(e) = executor.clear_identity().await {
        warn!(error = %e, "failed to clear session claims");
    }
    *state = SuiteState::IdentityCleared;
    debug!(?state, "identity cleanup attempted");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::scripted::ScriptedExecutor;
    use crate::executor::{ExecutionOutcome, FailureKind};
    use crate::identity::{IdentityContext, Role};

    fn clerk_identity() -> IdentityContext {
        IdentityContext::new(Role::Clerk)
            .with_branch("branch-001")
            .with_user("clerk-user-001")
    }

    #[tokio::test]
    async fn test_cases_run_in_declared_order() {
        let suite = RoleSuite::new(clerk_identity()).with_cases(vec![
            TestCase::new("insert", "INSERT INTO t VALUES ('x');", Expectation::Success),
            TestCase::new("update", "UPDATE t SET v = 1;", Expectation::Success),
            TestCase::new("delete", "DELETE FROM t;", Expectation::Success),
        ]);

        let mut executor = ScriptedExecutor::new();
        let report = run_suite(&mut executor, &suite).await;

        assert_eq!(report.verdicts.len(), 3);
        let order: Vec<&str> = executor
            .executed
            .iter()
            .map(|s| s.sql.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(order, vec!["INSERT", "UPDATE", "DELETE"]);
    }

    #[tokio::test]
    async fn test_every_case_produces_exactly_one_verdict() {
        let suite = RoleSuite::new(IdentityContext::new(Role::Auditor)).with_cases(vec![
            TestCase::new("a", "SELECT 1;", Expectation::Success),
            TestCase::new("b", "SELECT 2;", Expectation::Success),
        ]);

        let mut executor = ScriptedExecutor::new();
        let report = run_suite(&mut executor, &suite).await;

        assert_eq!(report.verdicts.len(), suite.cases.len());
        assert!(report.suite_error.is_none());
    }

    #[tokio::test]
    async fn test_identity_cleared_exactly_once_after_success() {
        let suite = RoleSuite::new(clerk_identity())
            .with_cases(vec![TestCase::new("a", "SELECT 1;", Expectation::Success)]);

        let mut executor = ScriptedExecutor::new();
        run_suite(&mut executor, &suite).await;

        assert_eq!(executor.apply_calls, 1);
        assert_eq!(executor.clear_calls, 1);
        assert!(executor.applied.is_none());
    }

    #[tokio::test]
    async fn test_identity_failure_yields_zero_verdicts_and_still_clears() {
        let suite = RoleSuite::new(clerk_identity())
            .with_cases(vec![TestCase::new("a", "SELECT 1;", Expectation::Success)]);

        let mut executor = ScriptedExecutor::new();
        executor.fail_apply = true;
        let report = run_suite(&mut executor, &suite).await;

        assert!(report.verdicts.is_empty());
        assert!(report.suite_error.is_some());
        assert!(executor.executed.is_empty());
        assert_eq!(executor.clear_calls, 1);
    }

    #[tokio::test]
    async fn test_failed_clear_does_not_fail_the_suite() {
        let suite = RoleSuite::new(IdentityContext::new(Role::Admin).with_user("admin-user-000"))
            .with_cases(vec![TestCase::new("a", "SELECT 1;", Expectation::Success)]);

        let mut executor = ScriptedExecutor::new();
        executor.fail_clear = true;
        let report = run_suite(&mut executor, &suite).await;

        assert_eq!(report.verdicts.len(), 1);
        assert!(report.suite_error.is_none());
        assert_eq!(executor.clear_calls, 1);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let mut executor = ScriptedExecutor::new();
        executor.clear_identity().await.unwrap();
        executor.clear_identity().await.unwrap();
        assert!(executor.applied.is_none());
    }

    #[tokio::test]
    async fn test_no_identity_leak_after_suite() {
        // Run suite A, then a bare statement with no identity: it must not
        // silently behave as role A.
        let suite = RoleSuite::new(clerk_identity())
            .with_cases(vec![TestCase::new("a", "SELECT 1;", Expectation::Success)]);

        let mut executor = ScriptedExecutor::new();
        run_suite(&mut executor, &suite).await;

        executor.execute("SELECT COUNT(*) FROM t;", None).await;
        let last = executor.executed.last().unwrap();
        assert!(last.identity.is_none());
        assert!(executor.applied.is_none());
    }

    #[tokio::test]
    async fn test_statements_carry_the_suite_identity() {
        let suite = RoleSuite::new(clerk_identity())
            .with_cases(vec![TestCase::new("a", "SELECT 1;", Expectation::Success)]);

        let mut executor = ScriptedExecutor::new();
        run_suite(&mut executor, &suite).await;

        let recorded = executor.executed[0].identity.as_ref().unwrap();
        assert_eq!(recorded, &clerk_identity());
    }

    #[tokio::test]
    async fn test_auditor_count_scenario() {
        // Scenario: AUDITOR, unscoped, counting members — PASS with a
        // numeric payload.
        let suite = RoleSuite::new(IdentityContext::new(Role::Auditor)).with_cases(vec![
            TestCase::new(
                "View all members",
                r#"SELECT COUNT(*) FROM "Member";"#,
                Expectation::Success,
            ),
        ]);

        let mut executor = ScriptedExecutor::new().with_outcome(
            "COUNT(*)",
            ExecutionOutcome::success(Some(serde_json::json!([{ "count": 4 }])), Some(1)),
        );
        let report = run_suite(&mut executor, &suite).await;

        let verdict = &report.verdicts[0];
        assert_eq!(verdict.classification, Classification::Pass);
        assert_eq!(verdict.outcome.scalar_count(), Some(4));
    }

    #[tokio::test]
    async fn test_clerk_cross_branch_insert_scenario() {
        // Scenario: CLERK scoped to branch-001 inserting into branch-002
        // must be blocked, and the block counts as a pass.
        let suite = RoleSuite::new(clerk_identity()).with_cases(vec![TestCase::new(
            "Try to insert member in other branch (should fail)",
            r#"INSERT INTO "Member" ("branchId") VALUES ('branch-002');"#,
            Expectation::Fail,
        )]);

        let mut executor = ScriptedExecutor::new().denying("branch-002");
        let report = run_suite(&mut executor, &suite).await;

        let verdict = &report.verdicts[0];
        assert_eq!(verdict.classification, Classification::Pass);
        assert_eq!(
            verdict.outcome.failure.as_ref().unwrap().kind,
            FailureKind::PolicyDenied
        );
    }

    #[tokio::test]
    async fn test_member_visibility_scenario() {
        // Scenario: MEMBER scoped to user-001 counting other users' rows
        // sees zero — visibility-scoped, not just "query ran".
        let suite = RoleSuite::new(IdentityContext::new(Role::Member).with_user("user-001"))
            .with_cases(vec![TestCase::new(
                "Try to view other members (should show 0)",
                r#"SELECT COUNT(*) FROM "Member" WHERE "userId" != 'user-001';"#,
                Expectation::Success,
            )]);

        let mut executor = ScriptedExecutor::new().with_outcome(
            "COUNT(*)",
            ExecutionOutcome::success(Some(serde_json::json!([{ "count": 0 }])), Some(1)),
        );
        let report = run_suite(&mut executor, &suite).await;

        let verdict = &report.verdicts[0];
        assert_eq!(verdict.classification, Classification::Pass);
        assert_eq!(verdict.outcome.scalar_count(), Some(0));
    }

    #[tokio::test]
    async fn test_misdeclared_expectation_surfaces_as_unexpected_success() {
        // Scenario: a case declared FAIL for a statement guaranteed to
        // succeed must be reported, not silently passed.
        let suite = RoleSuite::new(IdentityContext::new(Role::Auditor)).with_cases(vec![
            TestCase::new("mislabeled", "SELECT 1;", Expectation::Fail),
        ]);

        let mut executor = ScriptedExecutor::new();
        let report = run_suite(&mut executor, &suite).await;

        assert_eq!(
            report.verdicts[0].classification,
            Classification::UnexpectedSuccess
        );
        assert_eq!(report.unexpected_successes(), 1);
        assert_eq!(report.anomalies(), 1);
    }
}
