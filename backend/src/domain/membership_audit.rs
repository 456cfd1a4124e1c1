//! Back-reference audit and repair.
//!
//! Runs outside request handling, typically once at startup, to recompute
//! every identity's back-references from the authoritative project and task
//! sets and to commit the repaired sets in one batch.

use std::sync::Arc;

use tracing::{info, warn};

use super::ports::TrackerStore;
use super::service_support::{AttemptError, RetryPolicy, map_store_error, retry_stale};
use super::{AuditReport, DanglingReference, Error, MembershipLedger};

/// Audits and repairs the back-reference mirror.
#[derive(Clone)]
pub struct MembershipAuditService<S> {
    store: Arc<S>,
    retry: RetryPolicy,
}

impl<S> MembershipAuditService<S> {
    /// Create an auditor over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }
}

impl<S> MembershipAuditService<S>
where
    S: TrackerStore,
{
    /// Recompute back-references and report drift without writing anything.
    pub async fn audit(&self) -> Result<AuditReport, Error> {
        let users = self.store.list_users(None).await.map_err(map_store_error)?;
        let projects = self.store.list_projects().await.map_err(map_store_error)?;
        let tasks = self.store.list_tasks().await.map_err(map_store_error)?;
        Ok(MembershipLedger::audit(&users, &projects, &tasks))
    }

    /// Audit and commit the repaired back-references.
    ///
    /// Returns the report the repair was computed from. Dangling references
    /// are logged but left in place; they need an operator decision.
    pub async fn reconcile(&self) -> Result<AuditReport, Error> {
        let report = retry_stale(self.retry, "reconcile", || self.reconcile_once()).await?;
        for dangling in &report.dangling {
            match dangling {
                DanglingReference::TeamMember {
                    project_id,
                    user_id,
                } => warn!(project = %project_id, user = %user_id, "team lists unknown identity"),
                DanglingReference::Assignee { task_id, user_id } => {
                    warn!(task = %task_id, user = %user_id, "task assigned to unknown identity");
                }
            }
        }
        Ok(report)
    }

    async fn reconcile_once(&self) -> Result<AuditReport, AttemptError> {
        let users = self.store.list_users(None).await?;
        let projects = self.store.list_projects().await?;
        let tasks = self.store.list_tasks().await?;
        let report = MembershipLedger::audit(&users, &projects, &tasks);
        let changes = MembershipLedger::reconcile(&report, &users);
        if !changes.is_empty() {
            self.store.commit(changes).await?;
            for drift in &report.drift {
                info!(
                    user = %drift.user_id,
                    projects = drift.expected_project_ids.len(),
                    tasks = drift.expected_task_ids.len(),
                    "repaired identity back-references"
                );
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ChangeSet, MockTrackerStore, Write};
    use crate::domain::{ErrorCode, UserId};
    use crate::domain::ports::TrackerStoreError;
    use crate::test_support::{admin, member, project};
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn reconcile_commits_recomputed_back_references() {
        let owner = admin("Alice");
        let mut u1 = member("Uma");
        let p1 = project(&owner, &[&u1]);
        let users = vec![owner.clone(), u1.clone()];
        let projects = vec![p1.clone()];

        let mut store = MockTrackerStore::new();
        store
            .expect_list_users()
            .returning(move |_| Ok(users.clone()));
        store
            .expect_list_projects()
            .returning(move || Ok(projects.clone()));
        store.expect_list_tasks().returning(|| Ok(Vec::new()));
        u1.project_ids = vec![p1.id];
        let expected = u1.clone();
        store
            .expect_commit()
            .withf(move |changes: &ChangeSet| {
                changes.writes() == [Write::UpdateUser(expected.clone())]
            })
            .times(1)
            .returning(|_| Ok(()));

        let report = MembershipAuditService::new(Arc::new(store))
            .reconcile()
            .await
            .expect("reconciled");

        assert_eq!(report.drift.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn consistent_stores_are_left_alone() {
        let owner = admin("Alice");
        let mut store = MockTrackerStore::new();
        store
            .expect_list_users()
            .returning(move |_| Ok(vec![owner.clone()]));
        store.expect_list_projects().returning(|| Ok(Vec::new()));
        store.expect_list_tasks().returning(|| Ok(Vec::new()));
        store.expect_commit().never();

        let report = MembershipAuditService::new(Arc::new(store))
            .reconcile()
            .await
            .expect("clean");

        assert!(report.is_consistent());
    }

    #[rstest]
    #[tokio::test]
    async fn dangling_team_members_are_reported() {
        let owner = admin("Alice");
        let mut p1 = project(&owner, &[]);
        p1.team_member_ids.push(UserId::random());
        let mut store = MockTrackerStore::new();
        store
            .expect_list_users()
            .returning(move |_| Ok(vec![owner.clone()]));
        store
            .expect_list_projects()
            .returning(move || Ok(vec![p1.clone()]));
        store.expect_list_tasks().returning(|| Ok(Vec::new()));

        let report = MembershipAuditService::new(Arc::new(store))
            .audit()
            .await
            .expect("audited");

        assert_eq!(report.dangling.len(), 1);
        assert!(report.drift.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn unreachable_store_is_unavailable() {
        let mut store = MockTrackerStore::new();
        store
            .expect_list_users()
            .returning(|_| Err(TrackerStoreError::connection("refused")));

        let err = MembershipAuditService::new(Arc::new(store))
            .audit()
            .await
            .expect_err("down");

        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
