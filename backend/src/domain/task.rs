//! Task data model.
//!
//! The status state machine is flat: the assignee may move a task between
//! any two statuses, and `completed` can be reopened.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CommentId, ProjectId, RequiredText, Revision, TaskId, UserId};

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident => $raw:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every accepted value, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Stable wire name.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $raw),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($raw => Ok(Self::$variant),)+
                    other => Err(format!("unknown {} `{other}`", stringify!($name))),
                }
            }
        }
    };
}

string_enum! {
    /// Kind of work a task represents.
    pub enum TaskType {
        /// Defect fix.
        Bug => "bug",
        /// New capability.
        Feature => "feature",
        /// Enhancement of existing behaviour.
        Improvement => "improvement",
    }
}

string_enum! {
    /// Urgency of a task.
    pub enum TaskPriority {
        /// Can wait.
        Low => "low",
        /// Normal.
        Medium => "medium",
        /// Soon.
        High => "high",
        /// Now.
        Urgent => "urgent",
    }
}

string_enum! {
    /// Workflow status of a task.
    pub enum TaskStatus {
        /// Not started.
        Open => "open",
        /// Being worked on.
        InProgress => "in_progress",
        /// Awaiting review.
        Review => "review",
        /// Done.
        Completed => "completed",
    }
}

/// An immutable remark appended to a task's thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Identifier within the task.
    pub id: CommentId,
    /// Identity that wrote the comment.
    pub author_id: UserId,
    /// Non-empty body.
    pub content: RequiredText,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
}

/// A unit of work inside a project, assigned to one team member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Stable identifier.
    pub id: TaskId,
    /// Short summary.
    pub title: RequiredText,
    /// Detailed description.
    pub description: RequiredText,
    /// Parent project, immutable.
    pub project_id: ProjectId,
    /// Assignee; a team member when the task was created.
    pub assigned_to: UserId,
    /// Admin who created the task.
    pub assigned_by: UserId,
    /// Kind of work.
    pub task_type: TaskType,
    /// Urgency.
    pub priority: TaskPriority,
    /// Workflow status.
    pub status: TaskStatus,
    /// Optional deadline.
    pub due_date: Option<DateTime<Utc>>,
    /// Append-only discussion thread.
    pub comments: Vec<Comment>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last save time.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency revision.
    pub revision: Revision,
}

/// Validated inputs for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    /// Short summary.
    pub title: RequiredText,
    /// Detailed description.
    pub description: RequiredText,
    /// Parent project.
    pub project_id: ProjectId,
    /// Intended assignee.
    pub assigned_to: UserId,
    /// Kind of work.
    pub task_type: TaskType,
    /// Urgency.
    pub priority: TaskPriority,
    /// Optional deadline.
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Create an open task from validated inputs.
    pub fn create(spec: TaskSpec, assigned_by: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: TaskId::random(),
            title: spec.title,
            description: spec.description,
            project_id: spec.project_id,
            assigned_to: spec.assigned_to,
            assigned_by,
            task_type: spec.task_type,
            priority: spec.priority,
            status: TaskStatus::Open,
            due_date: spec.due_date,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
            revision: Revision::INITIAL,
        }
    }

    /// Move to `status`. Every transition is legal.
    pub fn transition(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    /// Append a comment to the thread and return its identifier.
    pub fn append_comment(
        &mut self,
        author_id: UserId,
        content: RequiredText,
        now: DateTime<Utc>,
    ) -> CommentId {
        let id = CommentId::random();
        self.updated_at = now;
        self.comments.push(Comment {
            id,
            author_id,
            content,
            created_at: now,
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn task() -> Task {
        let now = DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp");
        let spec = TaskSpec {
            title: RequiredText::new("T1").expect("title"),
            description: RequiredText::new("fix it").expect("description"),
            project_id: ProjectId::random(),
            assigned_to: UserId::random(),
            task_type: TaskType::Bug,
            priority: TaskPriority::High,
            due_date: None,
        };
        Task::create(spec, UserId::random(), now)
    }

    #[rstest]
    fn new_tasks_start_open_without_comments(task: Task) {
        assert_eq!(task.status, TaskStatus::Open);
        assert!(task.comments.is_empty());
    }

    #[rstest]
    fn completed_tasks_can_be_reopened(mut task: Task) {
        let now = task.created_at;
        task.transition(TaskStatus::Completed, now);
        task.transition(TaskStatus::Open, now);
        assert_eq!(task.status, TaskStatus::Open);
    }

    #[rstest]
    fn comments_keep_append_order(mut task: Task) {
        let author = task.assigned_to;
        let now = task.created_at;
        task.append_comment(author, RequiredText::new("first").expect("text"), now);
        task.append_comment(author, RequiredText::new("first").expect("text"), now);

        assert_eq!(task.comments.len(), 2);
        assert_ne!(task.comments[0].id, task.comments[1].id);
    }

    #[rstest]
    #[case("open", TaskStatus::Open)]
    #[case("in_progress", TaskStatus::InProgress)]
    #[case("review", TaskStatus::Review)]
    #[case("completed", TaskStatus::Completed)]
    fn status_parses_wire_names(#[case] raw: &str, #[case] status: TaskStatus) {
        assert_eq!(raw.parse::<TaskStatus>(), Ok(status));
    }

    #[rstest]
    #[case("pending")]
    #[case("Open")]
    #[case("")]
    fn status_rejects_unknown_names(#[case] raw: &str) {
        assert!(raw.parse::<TaskStatus>().is_err());
    }

    #[rstest]
    fn enums_list_every_value() {
        assert_eq!(TaskType::ALL.len(), 3);
        assert_eq!(TaskPriority::ALL.len(), 4);
        assert_eq!(TaskStatus::ALL.len(), 4);
    }
}
