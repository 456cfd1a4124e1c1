//! Decision table coverage for the authorization guard.

use super::*;
use crate::domain::{ErrorCode, ProjectId, RequiredText, TaskPriority, TaskSpec, TaskType};
use chrono::{DateTime, Utc};
use rstest::{fixture, rstest};
use rstest_bdd_macros::{given, then, when};

struct World {
    owner: Actor,
    other_admin: Actor,
    member: Actor,
    teammate: Actor,
    outsider: Actor,
    project: Project,
    task: Task,
}

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

fn text(raw: &str) -> RequiredText {
    RequiredText::new(raw).expect("non-empty text")
}

#[fixture]
fn world() -> World {
    build_world()
}

fn build_world() -> World {
    let owner = Actor::new(UserId::random(), Role::Admin);
    let other_admin = Actor::new(UserId::random(), Role::Admin);
    let member = Actor::new(UserId::random(), Role::Member);
    let teammate = Actor::new(UserId::random(), Role::Member);
    let outsider = Actor::new(UserId::random(), Role::Member);
    let project = Project::create(
        text("P1"),
        text("d"),
        owner.id,
        [member.id, teammate.id],
        now(),
    );
    let task = Task::create(
        TaskSpec {
            title: text("T1"),
            description: text("d"),
            project_id: project.id,
            assigned_to: member.id,
            task_type: TaskType::Bug,
            priority: TaskPriority::High,
            due_date: None,
        },
        owner.id,
        now(),
    );
    World {
        owner,
        other_admin,
        member,
        teammate,
        outsider,
        project,
        task,
    }
}

#[rstest]
fn missing_actor_is_never_allowed(world: World) {
    let actions = [
        Action::CreateProject,
        Action::ReadProject {
            project: &world.project,
        },
        Action::ReadOwnTasks,
        Action::ReadAllTasks,
    ];
    for action in actions {
        assert_eq!(
            can_perform(None, &action),
            Decision::Deny(DenialReason::NotAuthenticated)
        );
    }
}

#[rstest]
#[case(Role::Admin, Decision::Allow)]
#[case(Role::Member, Decision::Deny(DenialReason::NotAdmin))]
fn admin_only_actions_follow_the_role(#[case] role: Role, #[case] expected: Decision) {
    let actor = Actor::new(UserId::random(), role);
    for action in [
        Action::CreateProject,
        Action::AssignTasks,
        Action::ReadAllTasks,
        Action::ReadDirectory,
    ] {
        assert_eq!(can_perform(Some(&actor), &action), expected);
    }
}

#[rstest]
fn project_reads_allow_owner_and_team_only(world: World) {
    let action = Action::ReadProject {
        project: &world.project,
    };
    assert_eq!(can_perform(Some(&world.owner), &action), Decision::Allow);
    assert_eq!(can_perform(Some(&world.member), &action), Decision::Allow);
    assert_eq!(
        can_perform(Some(&world.outsider), &action),
        Decision::Deny(DenialReason::NotMember)
    );
    assert_eq!(
        can_perform(Some(&world.other_admin), &action),
        Decision::Deny(DenialReason::NotMember)
    );
}

#[rstest]
fn only_the_owner_updates_the_team(world: World) {
    let action = Action::UpdateProjectTeam {
        project: &world.project,
    };
    assert_eq!(can_perform(Some(&world.owner), &action), Decision::Allow);
    for actor in [&world.member, &world.other_admin, &world.outsider] {
        assert_eq!(
            can_perform(Some(actor), &action),
            Decision::Deny(DenialReason::NotOwner)
        );
    }
}

#[rstest]
fn task_creation_checks_role_then_ownership_then_assignee(world: World) {
    let on_team = Action::CreateTask {
        project: &world.project,
        assignee: &world.member.id,
    };
    let off_team = Action::CreateTask {
        project: &world.project,
        assignee: &world.outsider.id,
    };

    assert_eq!(can_perform(Some(&world.owner), &on_team), Decision::Allow);
    assert_eq!(
        can_perform(Some(&world.member), &off_team),
        Decision::Deny(DenialReason::NotAdmin)
    );
    assert_eq!(
        can_perform(Some(&world.other_admin), &off_team),
        Decision::Deny(DenialReason::NotOwner)
    );
    assert_eq!(
        can_perform(Some(&world.owner), &off_team),
        Decision::Deny(DenialReason::AssigneeNotMember)
    );
}

#[rstest]
fn comments_allow_assignee_and_owner_only(world: World) {
    let action = Action::CommentOnTask {
        task: &world.task,
        project: &world.project,
    };
    assert_eq!(can_perform(Some(&world.member), &action), Decision::Allow);
    assert_eq!(can_perform(Some(&world.owner), &action), Decision::Allow);
    assert_eq!(
        can_perform(Some(&world.teammate), &action),
        Decision::Deny(DenialReason::NotAssignee)
    );
}

#[rstest]
fn own_tasks_are_always_readable(world: World) {
    assert_eq!(
        can_perform(Some(&world.outsider), &Action::ReadOwnTasks),
        Decision::Allow
    );
}

#[rstest]
#[case(DenialReason::NotAuthenticated, ErrorCode::Unauthorized)]
#[case(DenialReason::NotAdmin, ErrorCode::Forbidden)]
#[case(DenialReason::NotOwner, ErrorCode::Forbidden)]
#[case(DenialReason::NotMember, ErrorCode::Forbidden)]
#[case(DenialReason::NotAssignee, ErrorCode::Forbidden)]
#[case(DenialReason::AssigneeNotMember, ErrorCode::InvalidRequest)]
fn denials_map_to_error_codes(#[case] reason: DenialReason, #[case] code: ErrorCode) {
    assert_eq!(denial_error(reason).code(), code);
}

#[rstest]
fn forbidden_denials_carry_the_reason() {
    let err = denial_error(DenialReason::NotOwner);
    assert_eq!(
        err.details().and_then(|d| d.get("reason")),
        Some(&serde_json::json!("not_owner"))
    );
}

#[rstest]
fn unknown_project_id_does_not_change_read_rules(world: World) {
    let mut foreign = world.project.clone();
    foreign.id = ProjectId::random();
    foreign.team_member_ids.clear();
    assert_eq!(
        can_perform(
            Some(&world.member),
            &Action::ReadProject { project: &foreign }
        ),
        Decision::Deny(DenialReason::NotMember)
    );
}

#[given("a task assigned to a team member of a project owned by an admin")]
fn a_task_assigned_to_a_team_member() -> World {
    build_world()
}

#[when("the owning admin tries to change the task status")]
fn the_owner_changes_status(world: &World) -> Decision {
    can_perform(
        Some(&world.owner),
        &Action::UpdateTaskStatus { task: &world.task },
    )
}

#[when("the assignee changes the task status")]
fn the_assignee_changes_status(world: &World) -> Decision {
    can_perform(
        Some(&world.member),
        &Action::UpdateTaskStatus { task: &world.task },
    )
}

#[then("the change is denied because they are not the assignee")]
fn denied_not_assignee(decision: Decision) {
    assert_eq!(decision, Decision::Deny(DenialReason::NotAssignee));
}

#[then("the change is allowed")]
fn change_allowed(decision: Decision) {
    assert_eq!(decision, Decision::Allow);
}

#[rstest]
fn owning_admin_cannot_change_status_of_someone_elses_task() {
    let world = a_task_assigned_to_a_team_member();
    let decision = the_owner_changes_status(&world);
    denied_not_assignee(decision);
}

#[rstest]
fn assignee_can_change_status() {
    let world = a_task_assigned_to_a_team_member();
    let decision = the_assignee_changes_status(&world);
    change_allowed(decision);
}
