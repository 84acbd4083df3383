//! Statement execution against the policy-enforced session.
//!
//! [`StatementExecutor`] is the seam between the assertion engine and the
//! database: the engine hands it SQL text plus the identity the statement
//! must run under and gets back an [`ExecutionOutcome`] — never an error.
//! Identity is carried by value through every call instead of living
//! purely as ambient session state; the Postgres implementation
//! reconciles the connection's claims with the identity passed for each
//! statement, so a skipped cleanup can never leak one role's identity
//! into another suite's statements.

use std::fmt;

use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::{Column, Connection, Executor, PgConnection, Row};
use tracing::debug;

use crate::claims;
use crate::error::IdentityError;
use crate::identity::IdentityContext;

/// `insufficient_privilege`; PostgreSQL also raises it for rows rejected
/// by RLS WITH CHECK policies.
const SQLSTATE_INSUFFICIENT_PRIVILEGE: &str = "42501";

/// Why a statement failed, as far as the error surface distinguishes.
///
/// Classification never depends on this — any failure satisfies a `FAIL`
/// expectation — but the report prints it so an unexpected failure caused
/// by a typo is visibly not a policy denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Rejected by the access-control layer (SQLSTATE 42501).
    PolicyDenied,
    /// Anything else: syntax errors, constraint violations, connectivity.
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::PolicyDenied => write!(f, "policy denied"),
            FailureKind::Other => write!(f, "error"),
        }
    }
}

/// A captured statement failure.
#[derive(Debug, Clone, Serialize)]
pub struct StatementFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// The raw result of running one statement.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    pub succeeded: bool,
    /// Returned rows as a JSON array, for queries.
    pub payload: Option<JsonValue>,
    pub rows_affected: Option<u64>,
    pub failure: Option<StatementFailure>,
}

impl ExecutionOutcome {
    pub fn success(payload: Option<JsonValue>, rows_affected: Option<u64>) -> Self {
        Self {
            succeeded: true,
            payload,
            rows_affected,
            failure: None,
        }
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            payload: None,
            rows_affected: None,
            failure: Some(StatementFailure {
                kind,
                message: message.into(),
            }),
        }
    }

    /// First column of the first payload row, when it is an integer.
    /// Covers the `SELECT COUNT(*)` cases the catalog leans on.
    pub fn scalar_count(&self) -> Option<i64> {
        self.payload
            .as_ref()?
            .as_array()?
            .first()?
            .as_object()?
            .values()
            .next()?
            .as_i64()
    }
}

/// Boundary to the database: run one statement under one identity and
/// report what happened. Implementations must never raise past `execute`;
/// every failure becomes an outcome with `succeeded = false`.
#[async_trait::async_trait]
pub trait StatementExecutor: Send {
    /// Apply the identity's claims to the session.
    async fn apply_identity(&mut self, identity: &IdentityContext) -> Result<(), IdentityError>;

    /// Clear any session claims. Safe to call repeatedly.
    async fn clear_identity(&mut self) -> Result<(), IdentityError>;

    /// Run one statement under the given identity (or with no identity at
    /// all when `None`).
    async fn execute(&mut self, sql: &str, identity: Option<&IdentityContext>) -> ExecutionOutcome;

    /// Run a multi-statement script (fixtures). Claims are not touched.
    async fn execute_batch(&mut self, sql: &str) -> ExecutionOutcome;
}

/// Session-claim state the connection is known to be in. RPC failures
/// leave the real state uncertain, so tracking degrades to `Unknown` and
/// the next statement re-applies.
#[derive(Debug, Clone, PartialEq)]
enum AppliedClaims {
    Unknown,
    Cleared,
    Set(IdentityContext),
}

/// `StatementExecutor` over a single Postgres connection.
///
/// One connection, not a pool: session claims are per-connection state,
/// and the suites depend on every statement seeing the claims that were
/// applied for it.
pub struct PgStatementExecutor {
    conn: PgConnection,
    applied: AppliedClaims,
}

impl PgStatementExecutor {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let conn = PgConnection::connect(database_url).await?;
        Ok(Self::new(conn))
    }

    pub fn new(conn: PgConnection) -> Self {
        Self {
            conn,
            applied: AppliedClaims::Unknown,
        }
    }

    /// Bring the session claims in line with the identity requested for
    /// this statement.
    async fn reconcile(&mut self, identity: Option<&IdentityContext>) -> Result<(), IdentityError> {
        match identity {
            Some(ctx) => {
                if self.applied != AppliedClaims::Set(ctx.clone()) {
                    debug!(identity = %ctx, "re-applying session claims before statement");
                    self.apply_identity(ctx).await?;
                }
            }
            None => {
                if self.applied != AppliedClaims::Cleared {
                    self.clear_identity().await?;
                }
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl StatementExecutor for PgStatementExecutor {
    async fn apply_identity(&mut self, identity: &IdentityContext) -> Result<(), IdentityError> {
        match claims::set_claims(&mut self.conn, identity).await {
            Ok(()) => {
                self.applied = AppliedClaims::Set(identity.clone());
                Ok(())
            }
            Err(e) => {
                // The set may have partially applied.
                self.applied = AppliedClaims::Unknown;
                Err(e)
            }
        }
    }

    async fn clear_identity(&mut self) -> Result<(), IdentityError> {
        match claims::clear_claims(&mut self.conn).await {
            Ok(()) => {
                self.applied = AppliedClaims::Cleared;
                Ok(())
            }
            Err(e) => {
                self.applied = AppliedClaims::Unknown;
                Err(e)
            }
        }
    }

    async fn execute(&mut self, sql: &str, identity: Option<&IdentityContext>) -> ExecutionOutcome {
        if let Err(e) = self.reconcile(identity).await {
            // The statement never ran; still a failed outcome per the
            // executor contract.
            return ExecutionOutcome::failed(FailureKind::Other, e.to_string());
        }

        if is_query(sql) {
            match sqlx::query(sql).fetch_all(&mut self.conn).await {
                Ok(rows) => {
                    let count = rows.len() as u64;
                    ExecutionOutcome::success(Some(rows_to_json(&rows)), Some(count))
                }
                Err(e) => outcome_from_sqlx(e),
            }
        } else {
            match sqlx::query(sql).execute(&mut self.conn).await {
                Ok(result) => ExecutionOutcome::success(None, Some(result.rows_affected())),
                Err(e) => outcome_from_sqlx(e),
            }
        }
    }

    async fn execute_batch(&mut self, sql: &str) -> ExecutionOutcome {
        match self.conn.execute(sql).await {
            Ok(result) => ExecutionOutcome::success(None, Some(result.rows_affected())),
            Err(e) => outcome_from_sqlx(e),
        }
    }
}

/// Queries go through `fetch_all` so their rows become the payload; all
/// other statements report rows affected.
fn is_query(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .map(|head| head.eq_ignore_ascii_case("select"))
        .unwrap_or(false)
}

fn outcome_from_sqlx(error: sqlx::Error) -> ExecutionOutcome {
    match &error {
        sqlx::Error::Database(db) => {
            let kind = if db.code().as_deref() == Some(SQLSTATE_INSUFFICIENT_PRIVILEGE) {
                FailureKind::PolicyDenied
            } else {
                FailureKind::Other
            };
            ExecutionOutcome::failed(kind, db.message())
        }
        other => ExecutionOutcome::failed(FailureKind::Other, other.to_string()),
    }
}

fn rows_to_json(rows: &[PgRow]) -> JsonValue {
    JsonValue::Array(rows.iter().map(row_to_json).collect())
}

fn row_to_json(row: &PgRow) -> JsonValue {
    let mut object = serde_json::Map::new();
    for (index, column) in row.columns().iter().enumerate() {
        object.insert(column.name().to_string(), column_value(row, index));
    }
    JsonValue::Object(object)
}

/// Best-effort decode for the column types the catalog queries return.
/// NUMERIC and other exotic types surface as null.
fn column_value(row: &PgRow, index: usize) -> JsonValue {
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(index) {
        return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index) {
        return v
            .map(|ts| JsonValue::String(ts.to_rfc3339()))
            .unwrap_or(JsonValue::Null);
    }
    JsonValue::Null
}

// ---------------------------------------------------------------------------
// Scripted executor for tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_query() {
        assert!(is_query(r#"SELECT COUNT(*) FROM "Member";"#));
        assert!(is_query("  select 1"));
        assert!(!is_query(r#"INSERT INTO "Member" VALUES ('x');"#));
        assert!(!is_query(r#"UPDATE "Member" SET "firstName" = 'x';"#));
        assert!(!is_query(""));
    }

    #[test]
    fn test_scalar_count_reads_first_column() {
        let outcome =
            ExecutionOutcome::success(Some(serde_json::json!([{ "count": 4 }])), Some(1));
        assert_eq!(outcome.scalar_count(), Some(4));
    }

    #[test]
    fn test_scalar_count_absent_for_dml() {
        let outcome = ExecutionOutcome::success(None, Some(2));
        assert_eq!(outcome.scalar_count(), None);
    }

    #[test]
    fn test_failed_outcome_shape() {
        let outcome = ExecutionOutcome::failed(FailureKind::PolicyDenied, "denied");
        assert!(!outcome.succeeded);
        assert!(outcome.payload.is_none());
        let failure = outcome.failure.expect("failure must be captured");
        assert_eq!(failure.kind, FailureKind::PolicyDenied);
        assert_eq!(failure.message, "denied");
    }
}
