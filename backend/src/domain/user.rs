//! Identity data model.
//!
//! An identity owns no relationships of its own. `project_ids` and
//! `assigned_task_ids` are back-references derived from the authoritative
//! sets on projects and tasks; only the membership ledger writes them.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

use super::{ProjectId, RequiredText, Revision, TaskId, UserId};

/// Role held by an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May create and staff projects and assign tasks.
    Admin,
    /// Works on tasks within the projects they belong to.
    Member,
}

impl Role {
    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a role name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

/// Validation failures for identity value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserValidationError {
    /// The email address is empty.
    #[error("email must not be empty")]
    EmptyEmail,
    /// The email address is not of the form `local@domain.tld`.
    #[error("email must be a valid address")]
    InvalidEmail,
}

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// Compiled [`EMAIL_PATTERN`]. The pattern is a constant, so `None` is
/// unreachable in practice; a missing matcher rejects every address.
static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());

fn is_email_shaped(candidate: &str) -> bool {
    EMAIL_RE
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(candidate))
}

/// Normalised (trimmed, lowercased) email address, unique per identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    ///
    /// # Examples
    /// ```
    /// use tracker::domain::EmailAddress;
    ///
    /// let email = EmailAddress::new(" Ada@Example.COM ").expect("valid email");
    /// assert_eq!(email.as_str(), "ada@example.com");
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if !is_email_shaped(&normalised) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }

    /// Borrow the address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque credential digest produced by the authentication collaborator.
///
/// The value is never serialised and is wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an already-hashed credential.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Expose the stored digest to a persistence adapter.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

impl Drop for PasswordHash {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// A registered identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Stable identifier.
    pub id: UserId,
    /// Display name.
    pub name: RequiredText,
    /// Unique, normalised email address.
    pub email: EmailAddress,
    /// Opaque credential digest.
    pub password_hash: PasswordHash,
    /// Role used by the authorization guard.
    pub role: Role,
    /// Projects whose team lists this identity (derived).
    pub project_ids: Vec<ProjectId>,
    /// Tasks assigned to this identity (derived).
    pub assigned_task_ids: Vec<TaskId>,
    /// Optimistic concurrency revision.
    pub revision: Revision,
}

impl User {
    /// Construct a freshly registered identity with empty back-references.
    pub fn register(
        name: RequiredText,
        email: EmailAddress,
        password_hash: PasswordHash,
        role: Role,
    ) -> Self {
        Self {
            id: UserId::random(),
            name,
            email,
            password_hash,
            role,
            project_ids: Vec::new(),
            assigned_task_ids: Vec::new(),
            revision: Revision::INITIAL,
        }
    }

    /// Whether the identity holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
