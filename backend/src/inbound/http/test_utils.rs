//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::http::header::AUTHORIZATION;
use actix_web::web;

use crate::domain::ports::{
    FixtureReferenceLookup, MockAccessTokenVerifier, MockProjectCommand, MockProjectQuery,
    MockTaskCommand, MockTaskQuery, MockUserDirectory,
};
use crate::domain::{Actor, ResolvedReferences};

use super::state::HttpState;

/// Token every authenticated test request presents.
pub const TEST_TOKEN: &str = "test-token";

/// `Authorization` header carrying `token`.
pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

/// Mock ports that become an [`HttpState`] once expectations are set.
#[derive(Default)]
pub struct StatePorts {
    pub projects: MockProjectCommand,
    pub projects_query: MockProjectQuery,
    pub tasks: MockTaskCommand,
    pub tasks_query: MockTaskQuery,
    pub users: MockUserDirectory,
    pub tokens: MockAccessTokenVerifier,
    /// Summaries every reference lookup answers with; empty by default.
    pub references: ResolvedReferences,
}

impl StatePorts {
    /// Accept [`TEST_TOKEN`] as `actor`.
    pub fn authenticated_as(actor: Actor) -> Self {
        let mut ports = Self::default();
        ports
            .tokens
            .expect_verify()
            .withf(|token| token.as_str() == TEST_TOKEN)
            .returning(move |_| Ok(actor.id));
        ports
            .users
            .expect_resolve_actor()
            .returning(move |_| Ok(actor));
        ports
    }

    /// Freeze the mocks into shared handler state.
    pub fn into_data(self) -> web::Data<HttpState> {
        web::Data::new(HttpState {
            projects: Arc::new(self.projects),
            projects_query: Arc::new(self.projects_query),
            tasks: Arc::new(self.tasks),
            tasks_query: Arc::new(self.tasks_query),
            users: Arc::new(self.users),
            references: Arc::new(FixtureReferenceLookup::new(self.references)),
            tokens: Arc::new(self.tokens),
        })
    }
}
