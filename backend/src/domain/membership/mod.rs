//! Membership ledger.
//!
//! Projects and tasks hold the authoritative relationship sets. The ledger
//! keeps the mirrored back-references on identities (`project_ids`,
//! `assigned_task_ids`) in step with them. A ledger is loaded with the
//! identities an operation touches, patched with idempotent set operations,
//! and then staged into the same [`ChangeSet`] as the authoritative write so
//! both sides commit together.
//!
//! [`MembershipLedger::audit`] recomputes every back-reference from scratch
//! and reports drift; [`MembershipLedger::reconcile`] turns a report into a
//! repairing change set.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde_json::json;
use tracing::error;

use super::identifiers::{dedup_ordered, insert_ordered, remove_ordered};
use super::ports::ChangeSet;
use super::{Error, Project, ProjectId, Task, TaskId, User, UserId};

/// Back-reference staging area for one operation.
#[derive(Debug, Clone, Default)]
pub struct MembershipLedger {
    users: BTreeMap<UserId, User>,
    dirty: BTreeSet<UserId>,
}

impl MembershipLedger {
    /// Load the identities the operation may touch.
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            dirty: BTreeSet::new(),
        }
    }

    /// Borrow a loaded identity.
    pub fn user(&self, id: &UserId) -> Option<&User> {
        self.users.get(id)
    }

    /// Record that `user` belongs to `project`. Idempotent.
    pub fn add_project_member(&mut self, user: &UserId, project: &ProjectId) -> Result<(), Error> {
        let entry = self.entry(user)?;
        if insert_ordered(&mut entry.project_ids, *project) {
            self.dirty.insert(*user);
        }
        Ok(())
    }

    /// Record that `user` no longer belongs to `project`. Idempotent.
    pub fn remove_project_member(
        &mut self,
        user: &UserId,
        project: &ProjectId,
    ) -> Result<(), Error> {
        let entry = self.entry(user)?;
        if remove_ordered(&mut entry.project_ids, project) {
            self.dirty.insert(*user);
        }
        Ok(())
    }

    /// Record that `task` is assigned to `user`. Idempotent.
    pub fn add_assigned_task(&mut self, user: &UserId, task: &TaskId) -> Result<(), Error> {
        let entry = self.entry(user)?;
        if insert_ordered(&mut entry.assigned_task_ids, *task) {
            self.dirty.insert(*user);
        }
        Ok(())
    }

    /// Whether every loaded identity mirrors `project`'s team exactly.
    pub fn mirrors_project(&self, project: &Project) -> bool {
        self.users
            .values()
            .all(|user| project.has_member(&user.id) == user.project_ids.contains(&project.id))
    }

    /// Check that every loaded identity mirrors `project`'s team exactly.
    ///
    /// A team member whose `project_ids` lacks the project, or a non-member
    /// whose `project_ids` lists it, is reported as a consistency violation.
    pub fn verify_project(&self, project: &Project) -> Result<(), Error> {
        for user in self.users.values() {
            let authoritative = project.has_member(&user.id);
            let mirrored = user.project_ids.contains(&project.id);
            if authoritative != mirrored {
                error!(
                    project_id = %project.id,
                    user_id = %user.id,
                    authoritative,
                    mirrored,
                    "project membership back-reference drifted"
                );
                return Err(Error::consistency(format!(
                    "membership of identity {} in project {} is inconsistent",
                    user.id, project.id
                ))
                .with_details(json!({
                    "projectId": project.id.to_string(),
                    "userId": user.id.to_string(),
                    "onTeam": authoritative,
                    "backReference": mirrored,
                })));
            }
        }
        Ok(())
    }

    /// Stage every modified identity into `changes` and return the staged
    /// identities as they will read after commit.
    pub fn stage(self, changes: &mut ChangeSet) -> Vec<User> {
        let Self { mut users, dirty } = self;
        let mut staged = Vec::with_capacity(dirty.len());
        for id in dirty {
            if let Some(user) = users.remove(&id) {
                changes.update_user(user.clone());
                staged.push(User {
                    revision: user.revision.next(),
                    ..user
                });
            }
        }
        staged
    }

    /// Recompute every identity's back-references from the authoritative
    /// project and task sets and report where they differ.
    ///
    /// Order is ignored when comparing. Team members or assignees that do
    /// not resolve to an identity are reported as dangling.
    pub fn audit(users: &[User], projects: &[Project], tasks: &[Task]) -> AuditReport {
        let mut expected_projects: BTreeMap<UserId, Vec<ProjectId>> = BTreeMap::new();
        let mut expected_tasks: BTreeMap<UserId, Vec<TaskId>> = BTreeMap::new();
        let known: HashSet<UserId> = users.iter().map(|u| u.id).collect();
        let mut dangling = Vec::new();

        for project in projects {
            for member in &project.team_member_ids {
                if known.contains(member) {
                    insert_ordered(expected_projects.entry(*member).or_default(), project.id);
                } else {
                    dangling.push(DanglingReference::TeamMember {
                        project_id: project.id,
                        user_id: *member,
                    });
                }
            }
        }
        for task in tasks {
            if known.contains(&task.assigned_to) {
                insert_ordered(expected_tasks.entry(task.assigned_to).or_default(), task.id);
            } else {
                dangling.push(DanglingReference::Assignee {
                    task_id: task.id,
                    user_id: task.assigned_to,
                });
            }
        }

        let drift = users
            .iter()
            .filter_map(|user| {
                let projects = expected_projects.remove(&user.id).unwrap_or_default();
                let tasks = expected_tasks.remove(&user.id).unwrap_or_default();
                let projects_match = same_members(&user.project_ids, &projects);
                let tasks_match = same_members(&user.assigned_task_ids, &tasks);
                (!projects_match || !tasks_match).then(|| Drift {
                    user_id: user.id,
                    expected_project_ids: reorder(&user.project_ids, projects),
                    expected_task_ids: reorder(&user.assigned_task_ids, tasks),
                })
            })
            .collect();

        AuditReport { drift, dangling }
    }

    /// Build the change set that replaces drifted back-references with the
    /// recomputed ones. Identities absent from `users` are skipped.
    pub fn reconcile(report: &AuditReport, users: &[User]) -> ChangeSet {
        let mut changes = ChangeSet::default();
        for drift in &report.drift {
            if let Some(user) = users.iter().find(|u| u.id == drift.user_id) {
                let mut repaired = user.clone();
                repaired.project_ids.clone_from(&drift.expected_project_ids);
                repaired.assigned_task_ids.clone_from(&drift.expected_task_ids);
                changes.update_user(repaired);
            }
        }
        changes
    }

    fn entry(&mut self, id: &UserId) -> Result<&mut User, Error> {
        self.users.get_mut(id).ok_or_else(|| {
            Error::internal(format!("identity {id} was not loaded into the ledger"))
        })
    }
}

/// Back-references of one identity that disagree with the authoritative sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    /// Affected identity.
    pub user_id: UserId,
    /// Project ids the identity should list.
    pub expected_project_ids: Vec<ProjectId>,
    /// Task ids the identity should list.
    pub expected_task_ids: Vec<TaskId>,
}

/// An authoritative reference to an identity that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DanglingReference {
    /// A project team lists an unknown identity.
    TeamMember {
        /// Project holding the reference.
        project_id: ProjectId,
        /// Unknown identity.
        user_id: UserId,
    },
    /// A task is assigned to an unknown identity.
    Assignee {
        /// Task holding the reference.
        task_id: TaskId,
        /// Unknown identity.
        user_id: UserId,
    },
}

/// Result of [`MembershipLedger::audit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// Identities whose back-references need repair.
    pub drift: Vec<Drift>,
    /// Authoritative references that cannot be repaired by the ledger.
    pub dangling: Vec<DanglingReference>,
}

impl AuditReport {
    /// Whether the back-reference mirror invariant holds everywhere.
    pub fn is_consistent(&self) -> bool {
        self.drift.is_empty() && self.dangling.is_empty()
    }
}

fn same_members<T: Ord + Copy>(actual: &[T], expected: &[T]) -> bool {
    let actual: BTreeSet<T> = actual.iter().copied().collect();
    let expected: BTreeSet<T> = expected.iter().copied().collect();
    actual == expected
}

/// Keep the existing order for ids that survive, then append the rest in
/// authoritative order.
fn reorder<T: Ord + Copy>(current: &[T], expected: Vec<T>) -> Vec<T> {
    let wanted: BTreeSet<T> = expected.iter().copied().collect();
    let mut out = dedup_ordered(current.iter().copied().filter(|id| wanted.contains(id)));
    for id in expected {
        insert_ordered(&mut out, id);
    }
    out
}

#[cfg(test)]
mod tests;
