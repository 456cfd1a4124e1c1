//! Identity directory service.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::ports::{ChangeSet, RegisterUserRequest, TrackerStore, UserDirectory};
use super::service_support::{
    AttemptError, RetryPolicy, map_store_error, require_user, required_text, retry_stale,
};
use super::{
    Action, Actor, EmailAddress, Error, FieldViolations, RequiredText, Role, User, UserId,
    UserValidationError, authorize,
};

/// Directory service implementing [`UserDirectory`].
#[derive(Clone)]
pub struct UserDirectoryService<S> {
    store: Arc<S>,
    retry: RetryPolicy,
}

impl<S> UserDirectoryService<S> {
    /// Create a directory over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }
}

impl<S> UserDirectoryService<S>
where
    S: TrackerStore,
{
    async fn rename_once(&self, id: &UserId, name: &RequiredText) -> Result<User, AttemptError> {
        let mut user = require_user(self.store.as_ref(), id).await?;
        if user.name == *name {
            return Ok(user);
        }
        user.name = name.clone();
        let mut changes = ChangeSet::default();
        changes.update_user(user.clone());
        self.store.commit(changes).await?;
        user.revision = user.revision.next();
        Ok(user)
    }
}

#[async_trait]
impl<S> UserDirectory for UserDirectoryService<S>
where
    S: TrackerStore,
{
    async fn register_user(&self, request: RegisterUserRequest) -> Result<User, Error> {
        let mut violations = FieldViolations::default();
        let name = required_text(&mut violations, "name", &request.name, "Name is required");
        let email = match EmailAddress::new(&request.email) {
            Ok(email) => Some(email),
            Err(UserValidationError::EmptyEmail) => {
                violations.push("email", "missing_field", "Email is required");
                None
            }
            Err(UserValidationError::InvalidEmail) => {
                violations.push("email", "invalid_value", "Please include a valid email");
                None
            }
        };
        violations.into_result()?;
        let (Some(name), Some(email)) = (name, email) else {
            return Err(Error::invalid_request("request validation failed"));
        };

        if self
            .store
            .find_user_by_email(&email)
            .await
            .map_err(map_store_error)?
            .is_some()
        {
            return Err(Error::conflict(format!("email {email} is already registered")));
        }

        let user = User::register(name, email, request.password_hash, request.role);
        let mut changes = ChangeSet::default();
        changes.insert_user(user.clone());
        self.store.commit(changes).await.map_err(map_store_error)?;
        info!(user = %user.id, role = %user.role, "identity registered");
        Ok(user)
    }

    async fn list_team_members(&self, actor: &Actor) -> Result<Vec<User>, Error> {
        authorize(Some(actor), &Action::ReadDirectory)?;
        self.store
            .list_users(Some(Role::Member))
            .await
            .map_err(map_store_error)
    }

    async fn current_user(&self, actor: &Actor) -> Result<User, Error> {
        require_user(self.store.as_ref(), &actor.id).await
    }

    async fn update_profile(&self, actor: &Actor, name: Option<String>) -> Result<User, Error> {
        let Some(name) = name.as_deref().and_then(RequiredText::new) else {
            return self.current_user(actor).await;
        };
        let user = retry_stale(self.retry, "update_profile", || {
            self.rename_once(&actor.id, &name)
        })
        .await?;
        info!(user = %user.id, "profile updated");
        Ok(user)
    }

    async fn get_user(&self, actor: &Actor, user_id: &UserId) -> Result<User, Error> {
        authorize(Some(actor), &Action::ReadDirectory)?;
        require_user(self.store.as_ref(), user_id).await
    }

    async fn resolve_actor(&self, user_id: &UserId) -> Result<Actor, Error> {
        let user = self
            .store
            .find_user(user_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::unauthorized("credential refers to an unknown identity"))?;
        Ok(Actor::new(user.id, user.role))
    }
}
