//! Caller identity extraction.
//!
//! Authentication happens upstream: the gateway verifies the caller and
//! forwards their uid and platform role as request headers. A request
//! without a uid is anonymous.

use axum::{extract::FromRequestParts, http::HeaderMap, http::request::Parts};
use tourney::tournament::{Actor, Role, TournamentError};

use super::error::ApiError;

/// Header carrying the authenticated caller's uid
pub const ACTOR_UID_HEADER: &str = "x-actor-uid";

/// Header carrying the caller's platform role (`admin`, `moderator`, `member`)
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Caller of a request; `None` when unauthenticated
#[derive(Debug, Clone)]
pub struct Caller(pub Option<Actor>);

impl Caller {
    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ApiError> {
    headers
        .get(name)
        .map(|v| {
            v.to_str().map(str::trim).map_err(|_| {
                ApiError::from(TournamentError::InvalidArgument(format!(
                    "{name} header is not valid UTF-8"
                )))
            })
        })
        .transpose()
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(uid) = header_str(&parts.headers, ACTOR_UID_HEADER)?.filter(|uid| !uid.is_empty())
        else {
            return Ok(Caller(None));
        };

        let role = match header_str(&parts.headers, ACTOR_ROLE_HEADER)? {
            Some(role) => role.parse::<Role>()?,
            None => Role::Member,
        };

        Ok(Caller(Some(Actor::new(uid, role))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Caller, ApiError> {
        let (mut parts, _) = request.into_parts();
        Caller::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_anonymous_request() {
        let caller = extract(Request::builder().body(()).unwrap()).await.unwrap();
        assert!(caller.actor().is_none());
    }

    #[tokio::test]
    async fn test_role_defaults_to_member() {
        let request = Request::builder()
            .header(ACTOR_UID_HEADER, "u1")
            .body(())
            .unwrap();
        let caller = extract(request).await.unwrap();
        assert_eq!(caller.actor(), Some(&Actor::new("u1", Role::Member)));
    }

    #[tokio::test]
    async fn test_staff_role() {
        let request = Request::builder()
            .header(ACTOR_UID_HEADER, "u2")
            .header(ACTOR_ROLE_HEADER, "Moderator")
            .body(())
            .unwrap();
        let caller = extract(request).await.unwrap();
        assert_eq!(caller.actor().map(|a| a.role), Some(Role::Moderator));
    }

    #[tokio::test]
    async fn test_unknown_role_is_rejected() {
        let request = Request::builder()
            .header(ACTOR_UID_HEADER, "u3")
            .header(ACTOR_ROLE_HEADER, "owner")
            .body(())
            .unwrap();
        let err = extract(request).await.unwrap_err();
        assert_eq!(err.code, tourney::tournament::ErrorCode::InvalidArgument);
    }
}
