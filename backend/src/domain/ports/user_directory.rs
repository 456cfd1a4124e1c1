//! Driving port for identity registration and profile access.

use async_trait::async_trait;

use crate::domain::{Actor, Error, PasswordHash, Role, User, UserId};

/// Input for registering an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUserRequest {
    /// Display name; required.
    pub name: String,
    /// Email address; required, valid and unique.
    pub email: String,
    /// Credential digest issued by the authentication collaborator.
    pub password_hash: PasswordHash,
    /// Role of the new identity.
    pub role: Role,
}

/// Driving port over the identity directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Register a new identity.
    async fn register_user(&self, request: RegisterUserRequest) -> Result<User, Error>;

    /// Identities with the member role; admins only.
    async fn list_team_members(&self, actor: &Actor) -> Result<Vec<User>, Error>;

    /// The actor's own identity.
    async fn current_user(&self, actor: &Actor) -> Result<User, Error>;

    /// Rename the actor. A missing or blank name leaves the profile unchanged.
    async fn update_profile(&self, actor: &Actor, name: Option<String>) -> Result<User, Error>;

    /// Any identity by id; admins only.
    async fn get_user(&self, actor: &Actor, user_id: &UserId) -> Result<User, Error>;

    /// Resolve an authenticated identity id into an actor.
    async fn resolve_actor(&self, user_id: &UserId) -> Result<Actor, Error>;
}
