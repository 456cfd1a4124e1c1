//! Project registry: creates projects, staffs teams and serves project reads.
//!
//! Team changes touch the project and every affected identity. They are
//! staged as one [`ChangeSet`] and committed atomically, with a bounded retry
//! when a concurrent writer bumps any revision first.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use super::identifiers::dedup_ordered;
use super::ports::{
    ChangeSet, CreateProjectRequest, ProjectCommand, ProjectQuery, TrackerStore,
};
use super::service_support::{
    AttemptError, RetryPolicy, map_store_error, parse_user_ids, require_project, required_text,
    retry_stale, verify_loaded_project,
};
use super::{
    Action, Actor, Error, FieldViolations, MembershipLedger, Project, ProjectId, RequiredText,
    User, UserId, authorize,
};

/// Project registry service implementing [`ProjectCommand`] and
/// [`ProjectQuery`].
pub struct ProjectRegistry<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

// Manual impl: `#[derive(Clone)]` would require `S: Clone`, but only the
// `Arc` handle is cloned.
impl<S> Clone for ProjectRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            retry: self.retry,
        }
    }
}

impl<S> ProjectRegistry<S> {
    /// Create a registry over `store`.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the retry policy used for contended commits.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

struct NewProject {
    name: RequiredText,
    description: RequiredText,
    team: Vec<UserId>,
}

fn validate_new_project(request: &CreateProjectRequest) -> Result<NewProject, Error> {
    let mut violations = FieldViolations::default();
    let name = required_text(
        &mut violations,
        "name",
        &request.name,
        "Project name is required",
    );
    let description = required_text(
        &mut violations,
        "description",
        &request.description,
        "Project description is required",
    );
    let team = parse_user_ids(&mut violations, "teamMembers", &request.team_member_ids);
    violations.into_result()?;
    let (Some(name), Some(description)) = (name, description) else {
        return Err(Error::invalid_request("request validation failed"));
    };
    Ok(NewProject {
        name,
        description,
        team: dedup_ordered(team),
    })
}

/// Fail with a validation error listing every id in `wanted` that `found`
/// does not contain.
fn ensure_known(wanted: &[UserId], found: &[User]) -> Result<(), Error> {
    let mut violations = FieldViolations::default();
    for id in wanted {
        if !found.iter().any(|u| u.id == *id) {
            violations.push(
                "teamMembers",
                "unknown_user",
                format!("User {id} does not exist"),
            );
        }
    }
    violations.into_result()
}

impl<S> ProjectRegistry<S>
where
    S: TrackerStore,
{
    async fn create_once(
        &self,
        actor: &Actor,
        draft: &NewProject,
    ) -> Result<Project, AttemptError> {
        let members = self.store.find_users(&draft.team).await?;
        ensure_known(&draft.team, &members)?;

        let project = Project::create(
            draft.name.clone(),
            draft.description.clone(),
            actor.id,
            draft.team.iter().copied(),
            self.clock.utc(),
        );
        let mut ledger = MembershipLedger::new(members);
        for member in &project.team_member_ids {
            ledger.add_project_member(member, &project.id)?;
        }

        let mut changes = ChangeSet::default();
        changes.insert_project(project.clone());
        ledger.stage(&mut changes);
        self.store.commit(changes).await?;
        Ok(project)
    }

    async fn update_team_once(
        &self,
        actor: &Actor,
        project_id: &ProjectId,
        raw_ids: &[String],
    ) -> Result<Project, AttemptError> {
        let mut project = require_project(self.store.as_ref(), project_id).await?;
        authorize(Some(actor), &Action::UpdateProjectTeam { project: &project })?;

        let mut violations = FieldViolations::default();
        let new_team = dedup_ordered(parse_user_ids(&mut violations, "teamMembers", raw_ids));
        violations.into_result()?;

        let touched = dedup_ordered(
            project
                .team_member_ids
                .iter()
                .chain(new_team.iter())
                .copied(),
        );
        let users = self.store.find_users(&touched).await?;
        ensure_known(&new_team, &users)?;
        if let Some(missing) = project
            .team_member_ids
            .iter()
            .find(|id| !users.iter().any(|u| u.id == **id))
        {
            return Err(Error::consistency(format!(
                "project {} lists unknown team member {missing}",
                project.id
            ))
            .into());
        }

        let mut ledger = MembershipLedger::new(users);
        verify_loaded_project(self.store.as_ref(), &ledger, &project).await?;
        for dropped in project
            .team_member_ids
            .iter()
            .filter(|id| !new_team.contains(id))
        {
            ledger.remove_project_member(dropped, &project.id)?;
        }
        for added in new_team.iter().filter(|id| !project.has_member(id)) {
            ledger.add_project_member(added, &project.id)?;
        }
        project.replace_team(new_team, self.clock.utc());

        let mut changes = ChangeSet::default();
        changes.update_project(project.clone());
        ledger.stage(&mut changes);
        self.store.commit(changes).await?;
        project.revision = project.revision.next();
        Ok(project)
    }
}

#[async_trait]
impl<S> ProjectCommand for ProjectRegistry<S>
where
    S: TrackerStore,
{
    async fn create_project(
        &self,
        actor: &Actor,
        request: CreateProjectRequest,
    ) -> Result<Project, Error> {
        let draft = validate_new_project(&request)?;
        authorize(Some(actor), &Action::CreateProject)?;

        let project = retry_stale(self.retry, "create_project", || {
            self.create_once(actor, &draft)
        })
        .await?;
        info!(
            actor = %actor.id,
            project = %project.id,
            members = project.team_member_ids.len(),
            "project created"
        );
        Ok(project)
    }

    async fn update_team(
        &self,
        actor: &Actor,
        project_id: &ProjectId,
        team_member_ids: Vec<String>,
    ) -> Result<Project, Error> {
        let project = retry_stale(self.retry, "update_team", || {
            self.update_team_once(actor, project_id, &team_member_ids)
        })
        .await?;
        info!(
            actor = %actor.id,
            project = %project.id,
            members = project.team_member_ids.len(),
            "project team replaced"
        );
        Ok(project)
    }
}

#[async_trait]
impl<S> ProjectQuery for ProjectRegistry<S>
where
    S: TrackerStore,
{
    async fn list_projects(&self, actor: &Actor) -> Result<Vec<Project>, Error> {
        let projects = if actor.is_admin() {
            self.store.list_projects_owned_by(&actor.id).await
        } else {
            self.store.list_projects_with_member(&actor.id).await
        };
        projects.map_err(map_store_error)
    }

    async fn get_project(&self, actor: &Actor, project_id: &ProjectId) -> Result<Project, Error> {
        let project = require_project(self.store.as_ref(), project_id).await?;
        authorize(Some(actor), &Action::ReadProject { project: &project })?;
        Ok(project)
    }
}
