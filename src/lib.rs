//! rls-verify — a verification harness for PostgreSQL row-level-security
//! policies.
//!
//! The harness impersonates each application role by storing claims the
//! policy predicates read (`set_test_jwt_claims`), issues that role's
//! scripted statements through a single privileged connection, and
//! classifies every outcome against its declared expectation. It reports
//! policy regressions; it does not enforce or generate policies.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use rls_verify::{catalog, orchestrator, report, PgStatementExecutor};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut executor = PgStatementExecutor::connect("postgres://service@localhost/app").await?;
//! let suites = catalog::reference_catalog();
//! let summary = orchestrator::run_all(&mut executor, &suites).await;
//! report::render(&summary);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Role catalog and simulated identity
pub mod identity;

// Session-claim procedures (identity context setter)
pub mod claims;

// Statement execution seam and the Postgres implementation
pub mod executor;

// Pure expectation classifier
pub mod classify;

// Suites, verdicts, and the per-suite runner
pub mod suite;

// The fixed five-role catalog and seed data
pub mod catalog;

// Migration and seed application
pub mod fixtures;

// Transcript rendering and summary aggregation
pub mod report;

// Sequential orchestration
pub mod orchestrator;

// Environment configuration
pub mod config;

// Public re-exports
pub use classify::{classify, Classification, Expectation};
pub use config::HarnessConfig;
pub use error::{ConfigError, FixtureError, IdentityError, UnknownRoleError};
pub use executor::{
    ExecutionOutcome, FailureKind, PgStatementExecutor, StatementExecutor, StatementFailure,
};
pub use fixtures::FixturePolicy;
pub use identity::{IdentityContext, Role};
pub use orchestrator::run_all;
pub use report::Summary;
pub use suite::{run_suite, RoleReport, RoleSuite, TestCase, Verdict};
