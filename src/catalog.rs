//! The reference catalog: five roles in a fixed order, plus the baseline
//! rows their cases depend on.
//!
//! Order is load-bearing twice over. Within a suite, later cases mutate
//! rows earlier cases created (the manager suite inserts `mgr-test-001`
//! and then deletes it). Across suites, the admin suite deletes the loan
//! the seed created. Reordering changes observable behavior.

use crate::classify::Expectation::{Fail, Success};
use crate::identity::{IdentityContext, Role};
use crate::suite::{RoleSuite, TestCase};

/// Idempotent baseline rows: four members across two branches, two loans,
/// two savings. Conflict-tolerant so reruns are safe.
pub const SEED_SQL: &str = r#"
-- Insert test members for different branches
INSERT INTO "Member" (id, "userId", "memberNumber", "firstName", "lastName", email, "idPassportNumber", "physicalAddress", telephone, "dateOfBirth", "nextOfKinName", "nextOfKinPhone", "nextOfKinRelationship", "branchId")
VALUES
  ('test-mem-001', 'user-001', 'MEM001', 'John', 'Doe', 'john@branch1.com', 'ID001', 'Address 1', '0701000001', '1990-01-01', 'Jane Doe', '0702000001', 'Spouse', 'branch-001'),
  ('test-mem-002', 'user-002', 'MEM002', 'Mary', 'Smith', 'mary@branch1.com', 'ID002', 'Address 2', '0701000002', '1985-05-15', 'Tom Smith', '0702000002', 'Spouse', 'branch-001'),
  ('test-mem-003', 'user-003', 'MEM003', 'Peter', 'Jones', 'peter@branch2.com', 'ID003', 'Address 3', '0701000003', '1992-03-20', 'Sarah Jones', '0702000003', 'Spouse', 'branch-002'),
  ('test-mem-004', 'user-004', 'MEM004', 'Alice', 'Brown', 'alice@branch2.com', 'ID004', 'Address 4', '0701000004', '1988-07-10', 'Bob Brown', '0702000004', 'Spouse', 'branch-002')
ON CONFLICT (id) DO NOTHING;

-- Insert test loans
INSERT INTO "Loan" (id, "memberId", "loanType", amount, "interestRate", duration, status, "applicationDate", "branchId")
VALUES
  ('test-loan-001', 'test-mem-001', 'PERSONAL', 50000, 12.5, 12, 'APPROVED', NOW(), 'branch-001'),
  ('test-loan-002', 'test-mem-003', 'BUSINESS', 100000, 10.0, 24, 'PENDING', NOW(), 'branch-002')
ON CONFLICT (id) DO NOTHING;

-- Insert test savings
INSERT INTO "Saving" (id, "memberId", amount, "transactionType", "transactionDate", "branchId")
VALUES
  ('test-sav-001', 'test-mem-001', 10000, 'DEPOSIT', NOW(), 'branch-001'),
  ('test-sav-002', 'test-mem-003', 15000, 'DEPOSIT', NOW(), 'branch-002')
ON CONFLICT (id) DO NOTHING;
"#;

/// The fixed suite order: auditor, clerk, manager, admin, member.
pub fn reference_catalog() -> Vec<RoleSuite> {
    vec![
        auditor_suite(),
        clerk_suite(),
        manager_suite(),
        admin_suite(),
        member_suite(),
    ]
}

/// AUDITOR: read-only across all branches, no scoping claims.
fn auditor_suite() -> RoleSuite {
    RoleSuite::new(IdentityContext::new(Role::Auditor)).with_cases(vec![
        TestCase::new(
            "View all members",
            r#"SELECT COUNT(*) FROM "Member";"#,
            Success,
        ),
        TestCase::new(
            "View branch-001 members",
            r#"SELECT COUNT(*) FROM "Member" WHERE "branchId" = 'branch-001';"#,
            Success,
        ),
        TestCase::new(
            "View branch-002 members",
            r#"SELECT COUNT(*) FROM "Member" WHERE "branchId" = 'branch-002';"#,
            Success,
        ),
        TestCase::new(
            "Try to insert member (should fail)",
            r#"INSERT INTO "Member" (id, "userId", "memberNumber", "firstName", "lastName", email, "idPassportNumber", "physicalAddress", telephone, "dateOfBirth", "nextOfKinName", "nextOfKinPhone", "nextOfKinRelationship", "branchId") VALUES ('audit-test', 'u-audit', 'MAUD', 'Audit', 'Test', 'audit@test.com', 'AUD001', 'Addr', '0700000000', '1990-01-01', 'Next', '0700000001', 'Spouse', 'branch-001');"#,
            Fail,
        ),
        TestCase::new("View all loans", r#"SELECT COUNT(*) FROM "Loan";"#, Success),
    ])
}

/// CLERK: insert/select inside the claimed branch only.
fn clerk_suite() -> RoleSuite {
    let identity = IdentityContext::new(Role::Clerk)
        .with_branch("branch-001")
        .with_user("clerk-user-001");
    RoleSuite::new(identity).with_cases(vec![
        TestCase::new(
            "View own branch members",
            r#"SELECT COUNT(*) FROM "Member" WHERE "branchId" = 'branch-001';"#,
            Success,
        ),
        TestCase::new(
            "Try to view other branch members (should show 0)",
            r#"SELECT COUNT(*) FROM "Member" WHERE "branchId" = 'branch-002';"#,
            Success,
        ),
        TestCase::new(
            "Insert member in own branch",
            r#"INSERT INTO "Member" (id, "userId", "memberNumber", "firstName", "lastName", email, "idPassportNumber", "physicalAddress", telephone, "dateOfBirth", "nextOfKinName", "nextOfKinPhone", "nextOfKinRelationship", "branchId") VALUES ('clerk-test-001', 'u-clerk-001', 'MCLK001', 'Clerk', 'Test1', 'clerk1@test.com', 'CLK001', 'Addr', '0701111111', '1990-01-01', 'Next', '0702111111', 'Spouse', 'branch-001');"#,
            Success,
        ),
        TestCase::new(
            "Try to insert member in other branch (should fail)",
            r#"INSERT INTO "Member" (id, "userId", "memberNumber", "firstName", "lastName", email, "idPassportNumber", "physicalAddress", telephone, "dateOfBirth", "nextOfKinName", "nextOfKinPhone", "nextOfKinRelationship", "branchId") VALUES ('clerk-test-002', 'u-clerk-002', 'MCLK002', 'Clerk', 'Test2', 'clerk2@test.com', 'CLK002', 'Addr', '0701111112', '1990-01-01', 'Next', '0702111112', 'Spouse', 'branch-002');"#,
            Fail,
        ),
        TestCase::new(
            "Try to update member (should fail - clerk can only insert/select)",
            r#"UPDATE "Member" SET "firstName" = 'Updated' WHERE id = 'test-mem-001';"#,
            Fail,
        ),
    ])
}

/// MANAGER: full CRUD in the claimed branch, but transaction tables stay
/// admin-only for deletes.
fn manager_suite() -> RoleSuite {
    let identity = IdentityContext::new(Role::Manager)
        .with_branch("branch-002")
        .with_user("manager-user-002");
    RoleSuite::new(identity).with_cases(vec![
        TestCase::new(
            "View own branch members",
            r#"SELECT COUNT(*) FROM "Member" WHERE "branchId" = 'branch-002';"#,
            Success,
        ),
        TestCase::new(
            "Try to view other branch (should show 0)",
            r#"SELECT COUNT(*) FROM "Member" WHERE "branchId" = 'branch-001';"#,
            Success,
        ),
        TestCase::new(
            "Update member in own branch",
            r#"UPDATE "Member" SET "firstName" = 'UpdatedByManager' WHERE id = 'test-mem-003';"#,
            Success,
        ),
        TestCase::new(
            "Insert member in own branch",
            r#"INSERT INTO "Member" (id, "userId", "memberNumber", "firstName", "lastName", email, "idPassportNumber", "physicalAddress", telephone, "dateOfBirth", "nextOfKinName", "nextOfKinPhone", "nextOfKinRelationship", "branchId") VALUES ('mgr-test-001', 'u-mgr-001', 'MMGR001', 'Manager', 'Test', 'manager@test.com', 'MGR001', 'Addr', '0703333333', '1990-01-01', 'Next', '0704333333', 'Spouse', 'branch-002');"#,
            Success,
        ),
        TestCase::new(
            "Try to delete loan (should fail - only admin)",
            r#"DELETE FROM "Loan" WHERE id = 'test-loan-002';"#,
            Fail,
        ),
        TestCase::new(
            "Try to delete member (should succeed - member table allows manager delete)",
            r#"DELETE FROM "Member" WHERE id = 'mgr-test-001';"#,
            Success,
        ),
    ])
}

/// ADMIN: unrestricted across branches; the only role allowed to delete
/// loans.
fn admin_suite() -> RoleSuite {
    let identity = IdentityContext::new(Role::Admin).with_user("admin-user-000");
    RoleSuite::new(identity).with_cases(vec![
        TestCase::new(
            "View all members",
            r#"SELECT COUNT(*) FROM "Member";"#,
            Success,
        ),
        TestCase::new(
            "View branch-001 members",
            r#"SELECT COUNT(*) FROM "Member" WHERE "branchId" = 'branch-001';"#,
            Success,
        ),
        TestCase::new(
            "View branch-002 members",
            r#"SELECT COUNT(*) FROM "Member" WHERE "branchId" = 'branch-002';"#,
            Success,
        ),
        TestCase::new(
            "Update any member",
            r#"UPDATE "Member" SET "firstName" = 'AdminUpdated' WHERE id = 'test-mem-001';"#,
            Success,
        ),
        TestCase::new(
            "Insert member in any branch",
            r#"INSERT INTO "Member" (id, "userId", "memberNumber", "firstName", "lastName", email, "idPassportNumber", "physicalAddress", telephone, "dateOfBirth", "nextOfKinName", "nextOfKinPhone", "nextOfKinRelationship", "branchId") VALUES ('admin-test-001', 'u-admin-001', 'MADM001', 'Admin', 'Test', 'admin@test.com', 'ADM001', 'Addr', '0705555555', '1990-01-01', 'Next', '0706555555', 'Spouse', 'branch-003');"#,
            Success,
        ),
        TestCase::new(
            "Delete loan (should succeed - admin can delete)",
            r#"DELETE FROM "Loan" WHERE id = 'test-loan-001';"#,
            Success,
        ),
        TestCase::new(
            "Delete member",
            r#"DELETE FROM "Member" WHERE id = 'admin-test-001';"#,
            Success,
        ),
    ])
}

/// MEMBER: sees only rows belonging to the claimed user id.
fn member_suite() -> RoleSuite {
    let identity = IdentityContext::new(Role::Member).with_user("user-001");
    RoleSuite::new(identity).with_cases(vec![
        TestCase::new(
            "View own member record",
            r#"SELECT COUNT(*) FROM "Member" WHERE "userId" = 'user-001';"#,
            Success,
        ),
        TestCase::new(
            "Try to view other members (should show 0)",
            r#"SELECT COUNT(*) FROM "Member" WHERE "userId" != 'user-001';"#,
            Success,
        ),
        TestCase::new(
            "View own loans",
            r#"SELECT COUNT(*) FROM "Loan" l JOIN "Member" m ON m.id = l."memberId" WHERE m."userId" = 'user-001';"#,
            Success,
        ),
        TestCase::new(
            "Try to insert member (should fail)",
            r#"INSERT INTO "Member" (id, "userId", "memberNumber", "firstName", "lastName", email, "idPassportNumber", "physicalAddress", telephone, "dateOfBirth", "nextOfKinName", "nextOfKinPhone", "nextOfKinRelationship", "branchId") VALUES ('mem-test-001', 'u-mem-001', 'MMEM001', 'Member', 'Test', 'member@test.com', 'MEM001', 'Addr', '0707777777', '1990-01-01', 'Next', '0708777777', 'Spouse', 'branch-001');"#,
            Fail,
        ),
        TestCase::new(
            "Try to update own record (should fail)",
            r#"UPDATE "Member" SET "firstName" = 'MemberUpdated' WHERE "userId" = 'user-001';"#,
            Fail,
        ),
    ])
}
