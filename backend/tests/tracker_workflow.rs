//! End-to-end behaviour of the tracker services over the in-memory store.
//!
//! Each test drives the driving ports exactly as an adapter would and then
//! reads the store back to check that team sets, task sets and identity
//! back-references stayed in step.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::{fixture, rstest};
use tracker::domain::ports::{
    CreateProjectRequest, CreateTaskRequest, ProjectCommand, ProjectQuery, RegisterUserRequest,
    TaskCommand, TaskQuery, TrackerStore, UserDirectory,
};
use tracker::domain::{
    Actor, Error, ErrorCode, MembershipAuditService, PasswordHash, Project, ProjectRegistry, Role,
    Task, TaskEngine, TaskStatus, User, UserDirectoryService,
};
use tracker::outbound::memory::InMemoryTrackerStore;

struct Tracker {
    store: Arc<InMemoryTrackerStore>,
    directory: UserDirectoryService<InMemoryTrackerStore>,
    registry: ProjectRegistry<InMemoryTrackerStore>,
    engine: TaskEngine<InMemoryTrackerStore>,
}

impl Tracker {
    async fn register(&self, name: &str, role: Role) -> (User, Actor) {
        let user = self
            .directory
            .register_user(RegisterUserRequest {
                name: name.to_owned(),
                email: format!("{}@example.com", name.to_lowercase()),
                password_hash: PasswordHash::new("digest"),
                role,
            })
            .await
            .expect("registration succeeds");
        let actor = Actor::new(user.id, user.role);
        (user, actor)
    }

    async fn stored_user(&self, user: &User) -> User {
        self.store
            .find_user(&user.id)
            .await
            .expect("store readable")
            .expect("user present")
    }

    async fn create_project(&self, owner: &Actor, team: &[&User]) -> Project {
        self.registry
            .create_project(
                owner,
                CreateProjectRequest {
                    name: "Apollo".to_owned(),
                    description: "Launch tracking".to_owned(),
                    team_member_ids: team.iter().map(|u| u.id.to_string()).collect(),
                },
            )
            .await
            .expect("project created")
    }

    async fn create_task(
        &self,
        owner: &Actor,
        project: &Project,
        assignee: &User,
    ) -> Result<Task, Error> {
        self.engine
            .create_task(
                owner,
                CreateTaskRequest {
                    title: "Fix login".to_owned(),
                    description: "Users cannot sign in".to_owned(),
                    project_id: project.id.to_string(),
                    assigned_to: assignee.id.to_string(),
                    task_type: "bug".to_owned(),
                    priority: "high".to_owned(),
                    due_date: None,
                },
            )
            .await
    }
}

#[fixture]
fn tracker_services() -> Tracker {
    let store = Arc::new(InMemoryTrackerStore::new());
    let clock = Arc::new(DefaultClock);
    Tracker {
        directory: UserDirectoryService::new(Arc::clone(&store)),
        registry: ProjectRegistry::new(Arc::clone(&store), clock.clone()),
        engine: TaskEngine::new(Arc::clone(&store), clock),
        store,
    }
}

#[rstest]
#[tokio::test]
async fn assigned_member_works_a_task_through_to_completion(
    #[from(tracker_services)] tracker: Tracker,
) {
    let (_, admin) = tracker.register("Ada", Role::Admin).await;
    let (uma, uma_actor) = tracker.register("Uma", Role::Member).await;
    let project = tracker.create_project(&admin, &[&uma]).await;

    let task = tracker
        .create_task(&admin, &project, &uma)
        .await
        .expect("task created");
    assert_eq!(task.status, TaskStatus::Open);
    assert_eq!(task.assigned_by, admin.id);

    let mine = tracker.engine.list_mine(&uma_actor).await.expect("my tasks");
    assert_eq!(mine.iter().map(|t| t.id).collect::<Vec<_>>(), vec![task.id]);

    let progressed = tracker
        .engine
        .update_status(&uma_actor, &task.id, "in_progress")
        .await
        .expect("assignee may move the task");
    assert_eq!(progressed.status, TaskStatus::InProgress);

    let commented = tracker
        .engine
        .add_comment(&uma_actor, &task.id, "Root cause found")
        .await
        .expect("assignee may comment");
    assert_eq!(commented.comments.len(), 1);

    let done = tracker
        .engine
        .update_status(&uma_actor, &task.id, "completed")
        .await
        .expect("completion");
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.comments.len(), 1);

    let stored_project = tracker
        .store
        .find_project(&project.id)
        .await
        .expect("store readable")
        .expect("project present");
    assert_eq!(stored_project.task_ids, vec![task.id]);
    assert_eq!(tracker.stored_user(&uma).await.assigned_task_ids, vec![task.id]);
}

#[rstest]
#[tokio::test]
async fn only_the_assignee_moves_a_task(#[from(tracker_services)] tracker: Tracker) {
    let (_, admin) = tracker.register("Ada", Role::Admin).await;
    let (uma, _) = tracker.register("Uma", Role::Member).await;
    let (vic, vic_actor) = tracker.register("Vic", Role::Member).await;
    let project = tracker.create_project(&admin, &[&uma, &vic]).await;
    let task = tracker
        .create_task(&admin, &project, &uma)
        .await
        .expect("task created");

    let err = tracker
        .engine
        .update_status(&vic_actor, &task.id, "review")
        .await
        .expect_err("teammate is not the assignee");
    assert_eq!(err.code(), ErrorCode::Forbidden);

    let err = tracker
        .engine
        .update_status(&admin, &task.id, "review")
        .await
        .expect_err("owners comment but do not move tasks");
    assert_eq!(err.code(), ErrorCode::Forbidden);

    let owner_comment = tracker
        .engine
        .add_comment(&admin, &task.id, "Please prioritise")
        .await
        .expect("project owner may comment");
    assert_eq!(owner_comment.comments.len(), 1);
}

#[rstest]
#[tokio::test]
async fn team_updates_keep_back_references_mirrored(#[from(tracker_services)] tracker: Tracker) {
    let (_, admin) = tracker.register("Ada", Role::Admin).await;
    let (uma, uma_actor) = tracker.register("Uma", Role::Member).await;
    let (vic, vic_actor) = tracker.register("Vic", Role::Member).await;
    let project = tracker.create_project(&admin, &[&uma]).await;
    assert_eq!(tracker.stored_user(&uma).await.project_ids, vec![project.id]);

    let updated = tracker
        .registry
        .update_team(&admin, &project.id, vec![vic.id.to_string()])
        .await
        .expect("team replaced");
    assert_eq!(updated.team_member_ids, vec![vic.id]);
    assert!(tracker.stored_user(&uma).await.project_ids.is_empty());
    assert_eq!(tracker.stored_user(&vic).await.project_ids, vec![project.id]);

    let err = tracker
        .registry
        .get_project(&uma_actor, &project.id)
        .await
        .expect_err("removed member loses access");
    assert_eq!(err.code(), ErrorCode::Forbidden);
    let visible = tracker
        .registry
        .list_projects(&vic_actor)
        .await
        .expect("member listing");
    assert_eq!(visible.iter().map(|p| p.id).collect::<Vec<_>>(), vec![project.id]);

    let report = MembershipAuditService::new(Arc::clone(&tracker.store))
        .audit()
        .await
        .expect("audit");
    assert!(report.is_consistent());
}

#[rstest]
#[tokio::test]
async fn assignees_outside_the_team_are_rejected_without_side_effects(
    #[from(tracker_services)] tracker: Tracker,
) {
    let (_, admin) = tracker.register("Ada", Role::Admin).await;
    let (uma, _) = tracker.register("Uma", Role::Member).await;
    let (outsider, _) = tracker.register("Olly", Role::Member).await;
    let project = tracker.create_project(&admin, &[&uma]).await;

    let err = tracker
        .create_task(&admin, &project, &outsider)
        .await
        .expect_err("outsider cannot be assigned");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.message(), "Assigned user must be a team member");

    assert!(tracker.store.list_tasks().await.expect("tasks").is_empty());
    assert!(tracker.stored_user(&outsider).await.assigned_task_ids.is_empty());
    let stored_project = tracker
        .store
        .find_project(&project.id)
        .await
        .expect("store readable")
        .expect("project present");
    assert!(stored_project.task_ids.is_empty());
}

#[rstest]
#[tokio::test]
async fn members_cannot_administer(#[from(tracker_services)] tracker: Tracker) {
    let (_, uma_actor) = tracker.register("Uma", Role::Member).await;

    let err = tracker
        .registry
        .create_project(
            &uma_actor,
            CreateProjectRequest {
                name: "Side project".to_owned(),
                description: "Not allowed".to_owned(),
                team_member_ids: Vec::new(),
            },
        )
        .await
        .expect_err("members cannot create projects");
    assert_eq!(err.code(), ErrorCode::Forbidden);

    let err = tracker
        .engine
        .list_all(&uma_actor)
        .await
        .expect_err("members cannot list every task");
    assert_eq!(err.code(), ErrorCode::Forbidden);

    let err = tracker
        .directory
        .list_team_members(&uma_actor)
        .await
        .expect_err("members cannot browse the directory");
    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert!(tracker.store.list_projects().await.expect("projects").is_empty());
}

#[rstest]
#[tokio::test]
async fn duplicate_emails_conflict(#[from(tracker_services)] tracker: Tracker) {
    tracker.register("Uma", Role::Member).await;
    let err = tracker
        .directory
        .register_user(RegisterUserRequest {
            name: "Uma Again".to_owned(),
            email: "UMA@example.com".to_owned(),
            password_hash: PasswordHash::new("digest"),
            role: Role::Member,
        })
        .await
        .expect_err("email already registered");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_team_updates_serialise_without_drift(
    #[from(tracker_services)] tracker: Tracker,
) {
    let (_, admin) = tracker.register("Ada", Role::Admin).await;
    let mut members = Vec::new();
    for name in ["Uma", "Vic", "Wes", "Xia", "Yan", "Zed", "Bea", "Cal"] {
        members.push(tracker.register(name, Role::Member).await.0);
    }
    let project = tracker.create_project(&admin, &[]).await;

    let teams: Vec<Vec<String>> = (0..members.len())
        .map(|offset| {
            members
                .iter()
                .cycle()
                .skip(offset)
                .take(3)
                .map(|user| user.id.to_string())
                .collect()
        })
        .collect();
    let handles: Vec<_> = teams
        .iter()
        .cloned()
        .map(|team| {
            let registry = tracker.registry.clone();
            let project_id = project.id;
            tokio::spawn(async move { registry.update_team(&admin, &project_id, team).await })
        })
        .collect();

    let mut applied = 0;
    for handle in handles {
        match handle.await.expect("writer task joins") {
            Ok(_) => applied += 1,
            Err(err) => assert_eq!(err.code(), ErrorCode::Conflict, "{err:?}"),
        }
    }
    assert!(applied > 0, "at least one replacement commits");

    let stored = tracker
        .store
        .find_project(&project.id)
        .await
        .expect("store readable")
        .expect("project present");
    let final_team: Vec<String> = stored.team_member_ids.iter().map(ToString::to_string).collect();
    assert!(teams.contains(&final_team), "final team {final_team:?}");
    for member in &members {
        let on_team = stored.team_member_ids.contains(&member.id);
        let mirrored = tracker.stored_user(member).await.project_ids.contains(&project.id);
        assert_eq!(on_team, mirrored, "{} back-reference", member.name.as_str());
    }

    let report = MembershipAuditService::new(Arc::clone(&tracker.store))
        .audit()
        .await
        .expect("audit");
    assert!(report.is_consistent());
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn task_creation_racing_a_team_drop_leaves_the_ledger_consistent(
    #[from(tracker_services)] tracker: Tracker,
) {
    let (_, admin) = tracker.register("Ada", Role::Admin).await;
    let (uma, _) = tracker.register("Uma", Role::Member).await;
    let (vic, _) = tracker.register("Vic", Role::Member).await;
    let project = tracker.create_project(&admin, &[&uma, &vic]).await;

    let engine = tracker.engine.clone();
    let registry = tracker.registry.clone();
    let request = CreateTaskRequest {
        title: "Fix login".to_owned(),
        description: "Users cannot sign in".to_owned(),
        project_id: project.id.to_string(),
        assigned_to: uma.id.to_string(),
        task_type: "bug".to_owned(),
        priority: "high".to_owned(),
        due_date: None,
    };
    let project_id = project.id;
    let create = tokio::spawn(async move { engine.create_task(&admin, request).await });
    let drop_uma = tokio::spawn(async move {
        registry
            .update_team(&admin, &project_id, vec![vic.id.to_string()])
            .await
    });

    let created = create.await.expect("creator joins");
    let dropped = drop_uma.await.expect("team writer joins");
    if let Err(err) = &created {
        assert!(
            matches!(err.code(), ErrorCode::InvalidRequest | ErrorCode::Conflict),
            "{err:?}"
        );
    }
    if let Err(err) = &dropped {
        assert_eq!(err.code(), ErrorCode::Conflict, "{err:?}");
    }

    let tasks = tracker.store.list_tasks().await.expect("tasks");
    let stored_uma = tracker.stored_user(&uma).await;
    assert_eq!(
        stored_uma.assigned_task_ids,
        tasks.iter().map(|t| t.id).collect::<Vec<_>>()
    );

    let report = MembershipAuditService::new(Arc::clone(&tracker.store))
        .audit()
        .await
        .expect("audit");
    assert!(report.is_consistent());
}
