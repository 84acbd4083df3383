//! Role catalog and simulated identity.
//!
//! Roles are a closed set: the policy predicates are written against
//! exactly these five claim values, so an unknown role is a
//! construction-time error rather than a silently unmatched predicate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownRoleError;

/// Application roles the policies distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Auditor,
    Clerk,
    Manager,
    Admin,
    Member,
}

impl Role {
    /// All roles, in the order the reference catalog tests them.
    pub const ALL: [Role; 5] = [
        Role::Auditor,
        Role::Clerk,
        Role::Manager,
        Role::Admin,
        Role::Member,
    ];

    /// The claim string the policy predicates compare against.
    pub fn as_claim(&self) -> &'static str {
        match self {
            Role::Auditor => "AUDITOR",
            Role::Clerk => "CLERK",
            Role::Manager => "MANAGER",
            Role::Admin => "ADMIN",
            Role::Member => "MEMBER",
        }
    }

    /// One-line capability description used in the summary legend.
    pub fn capability_summary(&self) -> &'static str {
        match self {
            Role::Auditor => "Read-only access to all branches",
            Role::Clerk => "Insert/Select in own branch only",
            Role::Manager => "Full CRUD in own branch, cannot delete transactions",
            Role::Admin => "Full access to all branches",
            Role::Member => "View own records only",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_claim())
    }
}

impl FromStr for Role {
    type Err = UnknownRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AUDITOR" => Ok(Role::Auditor),
            "CLERK" => Ok(Role::Clerk),
            "MANAGER" => Ok(Role::Manager),
            "ADMIN" => Ok(Role::Admin),
            "MEMBER" => Ok(Role::Member),
            _ => Err(UnknownRoleError(s.to_string())),
        }
    }
}

/// The identity the policy engine sees for a statement.
///
/// `branch_id` and `user_id` stay `None` for unscoped roles. The claim
/// procedures receive SQL NULL for those, never an empty string — the
/// policies distinguish "unscoped" from "empty scope".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityContext {
    pub role: Role,
    pub branch_id: Option<String>,
    pub user_id: Option<String>,
}

impl IdentityContext {
    /// Unscoped identity for a role.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            branch_id: None,
            user_id: None,
        }
    }

    /// Scope the identity to a branch.
    pub fn with_branch(mut self, branch_id: impl Into<String>) -> Self {
        self.branch_id = Some(branch_id.into());
        self
    }

    /// Scope the identity to a user.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

impl fmt::Display for IdentityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.role)?;
        if let Some(branch) = &self.branch_id {
            write!(f, " branch={}", branch)?;
        }
        if let Some(user) = &self.user_id {
            write!(f, " user={}", user)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in Role::ALL {
            assert_eq!(role.as_claim().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("clerk".parse::<Role>().unwrap(), Role::Clerk);
        assert_eq!("Manager".parse::<Role>().unwrap(), Role::Manager);
    }

    #[test]
    fn test_unknown_role_is_an_error() {
        let err = "superuser".parse::<Role>().unwrap_err();
        assert_eq!(err, UnknownRoleError("superuser".to_string()));
    }

    #[test]
    fn test_identity_scoping() {
        let identity = IdentityContext::new(Role::Clerk)
            .with_branch("branch-001")
            .with_user("clerk-user-001");
        assert_eq!(identity.branch_id.as_deref(), Some("branch-001"));
        assert_eq!(identity.user_id.as_deref(), Some("clerk-user-001"));
        assert_eq!(
            identity.to_string(),
            "CLERK branch=branch-001 user=clerk-user-001"
        );
    }

    #[test]
    fn test_unscoped_identity_has_no_markers() {
        let identity = IdentityContext::new(Role::Auditor);
        assert!(identity.branch_id.is_none());
        assert!(identity.user_id.is_none());
        assert_eq!(identity.to_string(), "AUDITOR");
    }
}
