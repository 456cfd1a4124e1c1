//! Builders and doubles shared by unit tests.

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    EmailAddress, PasswordHash, Project, RequiredText, Role, Task, TaskPriority, TaskSpec,
    TaskType, User, UserId,
};

/// Fixed instant used as "now" across unit tests.
pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Clock pinned to a single instant.
pub(crate) struct FixtureClock(pub(crate) DateTime<Utc>);

impl Default for FixtureClock {
    fn default() -> Self {
        Self(fixed_now())
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

pub(crate) fn text(raw: &str) -> RequiredText {
    RequiredText::new(raw).expect("non-empty fixture text")
}

/// Registered identity with the given role and a derived email.
pub(crate) fn user(name: &str, role: Role) -> User {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    User::register(
        text(name),
        EmailAddress::new(email).expect("valid fixture email"),
        PasswordHash::new("fixture-digest"),
        role,
    )
}

pub(crate) fn admin(name: &str) -> User {
    user(name, Role::Admin)
}

pub(crate) fn member(name: &str) -> User {
    user(name, Role::Member)
}

/// Project owned by `owner` whose team is `members`, without touching the
/// members' back-references.
pub(crate) fn project(owner: &User, members: &[&User]) -> Project {
    Project::create(
        text("P1"),
        text("first project"),
        owner.id,
        members.iter().map(|m| m.id),
        fixed_now(),
    )
}

/// Open bug in `project` assigned to `assignee`.
pub(crate) fn task(project: &Project, assignee: &UserId) -> Task {
    Task::create(
        TaskSpec {
            title: text("T1"),
            description: text("first task"),
            project_id: project.id,
            assigned_to: *assignee,
            task_type: TaskType::Bug,
            priority: TaskPriority::High,
            due_date: None,
        },
        project.owner_id,
        fixed_now(),
    )
}
