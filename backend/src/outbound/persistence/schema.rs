//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. Regenerate them with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered identities.
    ///
    /// `project_ids` and `assigned_task_ids` are back-references mirrored
    /// from `projects.team_member_ids` and `tasks.assigned_to`.
    users (id) {
        id -> Uuid,
        name -> Text,
        /// Normalised email; unique.
        email -> Text,
        password_hash -> Text,
        /// `admin` or `member`.
        role -> Text,
        project_ids -> Array<Uuid>,
        assigned_task_ids -> Array<Uuid>,
        /// Optimistic concurrency revision.
        revision -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Projects and their authoritative team and task sets.
    projects (id) {
        id -> Uuid,
        name -> Text,
        description -> Text,
        owner_id -> Uuid,
        team_member_ids -> Array<Uuid>,
        task_ids -> Array<Uuid>,
        /// `active`, `completed` or `archived`.
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        revision -> Int8,
    }
}

diesel::table! {
    /// Tasks.
    tasks (id) {
        id -> Uuid,
        title -> Text,
        description -> Text,
        project_id -> Uuid,
        assigned_to -> Uuid,
        assigned_by -> Uuid,
        task_type -> Text,
        priority -> Text,
        status -> Text,
        due_date -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        revision -> Int8,
    }
}

diesel::table! {
    /// Append-only comment threads; `position` orders comments within a task.
    task_comments (id) {
        id -> Uuid,
        task_id -> Uuid,
        position -> Int4,
        author_id -> Uuid,
        content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(projects -> users (owner_id));
diesel::joinable!(tasks -> projects (project_id));
diesel::joinable!(task_comments -> tasks (task_id));

diesel::allow_tables_to_appear_in_same_query!(users, projects, tasks, task_comments);
