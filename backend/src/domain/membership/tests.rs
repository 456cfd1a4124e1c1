//! Ledger staging, mirror verification and audit coverage.

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::Write;
use crate::test_support::{admin, member, project, task};
use rstest::rstest;

#[rstest]
fn adding_members_is_idempotent_and_stages_once() {
    let owner = admin("Alice");
    let u1 = member("Uma");
    let p = project(&owner, &[&u1]);
    let mut ledger = MembershipLedger::new([u1.clone()]);

    ledger.add_project_member(&u1.id, &p.id).expect("add");
    ledger.add_project_member(&u1.id, &p.id).expect("add again");

    let mut changes = ChangeSet::default();
    let staged = ledger.stage(&mut changes);

    assert_eq!(changes.len(), 1);
    assert_eq!(staged.len(), 1);
    assert_eq!(staged[0].project_ids, vec![p.id]);
    assert_eq!(staged[0].revision, u1.revision.next());
    match &changes.writes()[0] {
        Write::UpdateUser(user) => assert_eq!(user.revision, u1.revision),
        other => panic!("unexpected write {other:?}"),
    }
}

#[rstest]
fn unchanged_identities_are_not_staged() {
    let u1 = member("Uma");
    let mut ledger = MembershipLedger::new([u1.clone()]);
    ledger
        .remove_project_member(&u1.id, &ProjectId::random())
        .expect("remove absent");

    let mut changes = ChangeSet::default();
    assert!(ledger.stage(&mut changes).is_empty());
    assert!(changes.is_empty());
}

#[rstest]
fn unloaded_identities_are_an_internal_error() {
    let mut ledger = MembershipLedger::default();
    let err = ledger
        .add_assigned_task(&UserId::random(), &TaskId::random())
        .expect_err("identity not loaded");
    assert_eq!(err.code(), ErrorCode::InternalError);
}

#[rstest]
fn verification_accepts_a_mirrored_team() {
    let owner = admin("Alice");
    let mut u1 = member("Uma");
    let u2 = member("Ugo");
    let p = project(&owner, &[&u1]);
    u1.project_ids.push(p.id);

    let ledger = MembershipLedger::new([u1, u2]);
    assert!(ledger.verify_project(&p).is_ok());
}

#[rstest]
fn verification_rejects_a_member_missing_its_back_reference() {
    let owner = admin("Alice");
    let u1 = member("Uma");
    let p = project(&owner, &[&u1]);

    let err = MembershipLedger::new([u1])
        .verify_project(&p)
        .expect_err("drift detected");
    assert_eq!(err.code(), ErrorCode::ConsistencyViolation);
}

#[rstest]
fn verification_rejects_a_stale_back_reference() {
    let owner = admin("Alice");
    let mut outsider = member("Olga");
    let p = project(&owner, &[]);
    outsider.project_ids.push(p.id);

    let err = MembershipLedger::new([outsider])
        .verify_project(&p)
        .expect_err("drift detected");
    assert_eq!(err.code(), ErrorCode::ConsistencyViolation);
}

#[rstest]
fn audit_of_a_consistent_model_is_clean() {
    let owner = admin("Alice");
    let mut u1 = member("Uma");
    let p = project(&owner, &[&u1]);
    let t = task(&p, &u1.id);
    u1.project_ids.push(p.id);
    u1.assigned_task_ids.push(t.id);

    let report = MembershipLedger::audit(&[owner, u1], &[p], &[t]);
    assert!(report.is_consistent());
}

#[rstest]
fn audit_reports_drift_and_reconcile_repairs_it() {
    let owner = admin("Alice");
    let u1 = member("Uma");
    let mut u2 = member("Ugo");
    let p = project(&owner, &[&u1]);
    let t = task(&p, &u1.id);
    u2.project_ids.push(p.id);

    let users = vec![owner, u1.clone(), u2.clone()];
    let report = MembershipLedger::audit(&users, &[p.clone()], &[t.clone()]);

    assert!(!report.is_consistent());
    assert_eq!(report.drift.len(), 2);
    let u1_drift = report
        .drift
        .iter()
        .find(|d| d.user_id == u1.id)
        .expect("u1 drift");
    assert_eq!(u1_drift.expected_project_ids, vec![p.id]);
    assert_eq!(u1_drift.expected_task_ids, vec![t.id]);
    let u2_drift = report
        .drift
        .iter()
        .find(|d| d.user_id == u2.id)
        .expect("u2 drift");
    assert!(u2_drift.expected_project_ids.is_empty());

    let changes = MembershipLedger::reconcile(&report, &users);
    assert_eq!(changes.len(), 2);
}

#[rstest]
fn audit_reports_dangling_references() {
    let owner = admin("Alice");
    let ghost = member("Gus");
    let p = project(&owner, &[&ghost]);
    let t = task(&p, &ghost.id);

    let report = MembershipLedger::audit(&[owner], &[p.clone()], &[t.clone()]);

    assert!(report.drift.is_empty());
    assert_eq!(
        report.dangling,
        vec![
            DanglingReference::TeamMember {
                project_id: p.id,
                user_id: ghost.id,
            },
            DanglingReference::Assignee {
                task_id: t.id,
                user_id: ghost.id,
            },
        ]
    );
}

#[rstest]
fn reorder_keeps_surviving_order_and_appends_new_ids() {
    assert_eq!(reorder(&[3, 1, 9], vec![1, 2, 3]), vec![3, 1, 2]);
}
