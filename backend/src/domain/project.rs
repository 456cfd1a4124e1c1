//! Project data model.
//!
//! A project is the authoritative side of two relationships: its team
//! (mirrored on each identity's `project_ids`) and its tasks. The owning
//! admin never changes after creation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::{dedup_ordered, insert_ordered};
use super::{ProjectId, RequiredText, Revision, TaskId, UserId};

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Work is ongoing.
    #[default]
    Active,
    /// Work has finished.
    Completed,
    /// Kept for reference only.
    Archived,
}

impl ProjectStatus {
    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            other => Err(format!("unknown project status `{other}`")),
        }
    }
}

/// A project owned by one admin.
///
/// ## Invariants
/// - `owner_id` references an identity with the admin role.
/// - `team_member_ids` and `task_ids` hold no duplicates and keep
///   insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Stable identifier.
    pub id: ProjectId,
    /// Display name.
    pub name: RequiredText,
    /// Free-form description.
    pub description: RequiredText,
    /// Owning admin, immutable.
    pub owner_id: UserId,
    /// Ordered team membership (authoritative).
    pub team_member_ids: Vec<UserId>,
    /// Ordered task list (authoritative).
    pub task_ids: Vec<TaskId>,
    /// Lifecycle status.
    pub status: ProjectStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last save time.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency revision.
    pub revision: Revision,
}

impl Project {
    /// Create a new active project.
    pub fn create(
        name: RequiredText,
        description: RequiredText,
        owner_id: UserId,
        team_member_ids: impl IntoIterator<Item = UserId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ProjectId::random(),
            name,
            description,
            owner_id,
            team_member_ids: dedup_ordered(team_member_ids),
            task_ids: Vec::new(),
            status: ProjectStatus::Active,
            created_at: now,
            updated_at: now,
            revision: Revision::INITIAL,
        }
    }

    /// Whether `user` owns this project.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner_id == *user
    }

    /// Whether `user` is on the team.
    pub fn has_member(&self, user: &UserId) -> bool {
        self.team_member_ids.contains(user)
    }

    /// Replace the team, collapsing duplicates, and refresh `updated_at`.
    pub fn replace_team(&mut self, members: impl IntoIterator<Item = UserId>, now: DateTime<Utc>) {
        self.team_member_ids = dedup_ordered(members);
        self.updated_at = now;
    }

    /// Append a task id and refresh `updated_at`.
    pub fn append_task(&mut self, task: TaskId, now: DateTime<Utc>) {
        insert_ordered(&mut self.task_ids, task);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
    }

    fn text(raw: &str) -> RequiredText {
        RequiredText::new(raw).expect("non-empty text")
    }

    #[rstest]
    fn new_projects_are_active_with_deduplicated_team(now: DateTime<Utc>) {
        let owner = UserId::random();
        let member = UserId::random();
        let project = Project::create(text("Alpha"), text("d"), owner, [member, member], now);

        assert_eq!(project.status, ProjectStatus::Active);
        assert_eq!(project.team_member_ids, vec![member]);
        assert!(project.is_owned_by(&owner));
        assert!(project.has_member(&member));
        assert!(!project.has_member(&owner));
        assert_eq!(project.created_at, project.updated_at);
    }

    #[rstest]
    fn replacing_the_team_refreshes_updated_at(now: DateTime<Utc>) {
        let mut project = Project::create(text("Alpha"), text("d"), UserId::random(), [], now);
        let later = now + chrono::Duration::seconds(5);
        let member = UserId::random();

        project.replace_team([member], later);

        assert_eq!(project.team_member_ids, vec![member]);
        assert_eq!(project.updated_at, later);
        assert_eq!(project.created_at, now);
    }

    #[rstest]
    fn appending_a_task_twice_keeps_one_entry(now: DateTime<Utc>) {
        let mut project = Project::create(text("Alpha"), text("d"), UserId::random(), [], now);
        let task = TaskId::random();
        project.append_task(task, now);
        project.append_task(task, now);
        assert_eq!(project.task_ids, vec![task]);
    }

    #[rstest]
    #[case("active", ProjectStatus::Active)]
    #[case("completed", ProjectStatus::Completed)]
    #[case("archived", ProjectStatus::Archived)]
    fn status_names_parse(#[case] raw: &str, #[case] status: ProjectStatus) {
        assert_eq!(raw.parse::<ProjectStatus>(), Ok(status));
    }
}
