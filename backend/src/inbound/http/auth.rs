//! Bearer token authentication.
//!
//! [`AuthenticatedActor`] turns an `Authorization: Bearer <token>` header
//! into a domain [`Actor`]. The token is verified through the
//! `AccessTokenVerifier` port and the role is read from the stored identity,
//! never from the request.

use std::ops::Deref;

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ports::AccessTokenError;
use crate::domain::{Actor, Error};

use super::state::HttpState;

const BEARER_PREFIX: &str = "bearer ";

/// The authenticated caller of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedActor(pub Actor);

impl AuthenticatedActor {
    /// Unwrap into the domain actor.
    pub fn into_inner(self) -> Actor {
        self.0
    }
}

impl Deref for AuthenticatedActor {
    type Target = Actor;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Extract the raw bearer token from an `Authorization` header value.
fn bearer_token(header: &str) -> Option<Zeroizing<String>> {
    let prefix = header.get(..BEARER_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }
    let token = header.get(BEARER_PREFIX.len()..)?.trim();
    (!token.is_empty()).then(|| Zeroizing::new(token.to_owned()))
}

fn map_token_error(error: AccessTokenError) -> Error {
    match error {
        AccessTokenError::Rejected => Error::unauthorized("invalid access token"),
        AccessTokenError::Unavailable { message } => {
            Error::service_unavailable(format!("token verification unavailable: {message}"))
        }
    }
}

impl FromRequest for AuthenticatedActor {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token);

        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let Some(token) = token else {
                debug!("request without bearer token");
                return Err(Error::unauthorized("missing bearer token").into());
            };
            let user_id = state.tokens.verify(token).await.map_err(map_token_error)?;
            let actor = state.users.resolve_actor(&user_id).await?;
            Ok(Self(actor))
        })
    }
}
