//! Caller identity as resolved by the upstream authentication guard.

use super::errors::{TournamentError, TournamentResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Platform-wide role of a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Moderator,
    Member,
}

impl Role {
    /// Staff may generate structures and adjudicate results
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Moderator)
    }
}

impl FromStr for Role {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            "member" | "user" => Ok(Role::Member),
            other => Err(TournamentError::InvalidArgument(format!(
                "unknown role: {other}"
            ))),
        }
    }
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub uid: String,
    pub role: Role,
}

impl Actor {
    pub fn new(uid: impl Into<String>, role: Role) -> Self {
        Self {
            uid: uid.into(),
            role,
        }
    }
}

/// Require an authenticated caller
pub fn require_actor(actor: Option<&Actor>) -> TournamentResult<&Actor> {
    actor.ok_or(TournamentError::Unauthenticated)
}

/// Require an authenticated admin or moderator
pub fn require_staff(actor: Option<&Actor>) -> TournamentResult<&Actor> {
    let actor = require_actor(actor)?;
    if !actor.role.is_staff() {
        return Err(TournamentError::PermissionDenied(
            "admin or moderator role required".to_string(),
        ));
    }
    Ok(actor)
}
