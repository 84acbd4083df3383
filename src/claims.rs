//! Identity context setter: the privileged claim procedures.
//!
//! The database exposes two pre-registered procedures that store and
//! clear the `(role, branch_id, user_id)` claims its policy predicates
//! consult (see `db/test_claims.sql`). Statements keep executing as the
//! privileged service principal; only the claims change. Absent scopes
//! are bound as SQL NULL because the policies distinguish "unscoped"
//! from "empty scope".

use sqlx::PgConnection;
use tracing::debug;

use crate::error::{IdentityError, IdentityResult};
use crate::identity::IdentityContext;

const SET_CLAIMS_SQL: &str = "SELECT set_test_jwt_claims($1, $2, $3)";
const CLEAR_CLAIMS_SQL: &str = "SELECT clear_test_jwt_claims()";

/// Store the identity as session claims on this connection.
pub async fn set_claims(
    conn: &mut PgConnection,
    identity: &IdentityContext,
) -> IdentityResult<()> {
    sqlx::query(SET_CLAIMS_SQL)
        .bind(identity.role.as_claim())
        .bind(identity.branch_id.as_deref())
        .bind(identity.user_id.as_deref())
        .execute(&mut *conn)
        .await
        .map_err(|e| IdentityError::Set {
            role: identity.role.to_string(),
            message: e.to_string(),
        })?;
    debug!(identity = %identity, "session claims set");
    Ok(())
}

/// Remove any session claims from this connection.
///
/// Idempotent: clearing an already-clear session is a no-op on the
/// database side.
pub async fn clear_claims(conn: &mut PgConnection) -> IdentityResult<()> {
    sqlx::query(CLEAR_CLAIMS_SQL)
        .execute(&mut *conn)
        .await
        .map_err(|e| IdentityError::Clear {
            message: e.to_string(),
        })?;
    debug!("session claims cleared");
    Ok(())
}
