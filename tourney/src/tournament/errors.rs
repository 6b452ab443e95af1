//! Tournament error types.

use super::models::TournamentStatus;
use crate::store::StoreError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Caller-facing error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    Unauthenticated,
    PermissionDenied,
    InvalidArgument,
    NotFound,
    FailedPrecondition,
    Aborted,
    Internal,
    Unimplemented,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::Unauthenticated => "unauthenticated",
            ErrorCode::PermissionDenied => "permission-denied",
            ErrorCode::InvalidArgument => "invalid-argument",
            ErrorCode::NotFound => "not-found",
            ErrorCode::FailedPrecondition => "failed-precondition",
            ErrorCode::Aborted => "aborted",
            ErrorCode::Internal => "internal",
            ErrorCode::Unimplemented => "unimplemented",
        };
        f.write_str(name)
    }
}

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Tournament not found: {0}")]
    TournamentNotFound(String),

    #[error("Match not found: {0}")]
    MatchNotFound(String),

    #[error("Team not found: {0}")]
    TeamNotFound(String),

    #[error("Standing not found for team {0}")]
    StandingNotFound(String),

    #[error("Tournament not in correct state: expected {expected:?}, got {actual:?}")]
    InvalidState {
        expected: TournamentStatus,
        actual: TournamentStatus,
    },

    #[error("Insufficient teams: need {needed}, have {current}")]
    InsufficientTeams { needed: usize, current: usize },

    #[error("Match not ready: {0} is still waiting for a team")]
    MatchNotReady(String),

    #[error("Match already decided: {0}")]
    MatchAlreadyDecided(String),

    #[error("Schedule entry not found: {0}")]
    ScheduleEntryMissing(String),

    #[error("Tournament is full")]
    TournamentFull,

    #[error("Team already registered")]
    AlreadyRegistered,

    #[error("Broken bracket: {0}")]
    BrokenBracket(String),

    #[error("Unsupported tournament format: {0}")]
    UnsupportedFormat(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl TournamentError {
    /// Category reported to the caller
    pub fn code(&self) -> ErrorCode {
        match self {
            TournamentError::Unauthenticated => ErrorCode::Unauthenticated,
            TournamentError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            TournamentError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            TournamentError::TournamentNotFound(_)
            | TournamentError::MatchNotFound(_)
            | TournamentError::TeamNotFound(_)
            | TournamentError::StandingNotFound(_) => ErrorCode::NotFound,
            TournamentError::InvalidState { .. }
            | TournamentError::InsufficientTeams { .. }
            | TournamentError::MatchNotReady(_)
            | TournamentError::MatchAlreadyDecided(_)
            | TournamentError::ScheduleEntryMissing(_)
            | TournamentError::TournamentFull
            | TournamentError::AlreadyRegistered => ErrorCode::FailedPrecondition,
            TournamentError::BrokenBracket(_) => ErrorCode::Internal,
            TournamentError::UnsupportedFormat(_) => ErrorCode::Unimplemented,
            TournamentError::Store(StoreError::Contention(_)) => ErrorCode::Aborted,
            TournamentError::Store(_) => ErrorCode::Internal,
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Store failures and corrupt bracket links are sanitized so document
    /// keys and match ids never reach the client.
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Store(StoreError::Contention(_)) => {
                "Too much concurrent activity, please retry".to_string()
            }
            TournamentError::Store(_) | TournamentError::BrokenBracket(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl From<serde_json::Error> for TournamentError {
    fn from(err: serde_json::Error) -> Self {
        TournamentError::Store(StoreError::Serialization(err))
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            TournamentError::Unauthenticated.code(),
            ErrorCode::Unauthenticated
        );
        assert_eq!(
            TournamentError::MatchNotReady("r1m0".into()).code(),
            ErrorCode::FailedPrecondition
        );
        assert_eq!(
            TournamentError::BrokenBracket("r2m0".into()).code(),
            ErrorCode::Internal
        );
        assert_eq!(
            TournamentError::UnsupportedFormat("swiss".into()).code(),
            ErrorCode::Unimplemented
        );
        assert_eq!(
            TournamentError::Store(StoreError::Contention(8)).code(),
            ErrorCode::Aborted
        );
    }

    #[test]
    fn test_client_message_hides_store_details() {
        let err = TournamentError::Store(StoreError::Conflict("tournaments/t1".into()));
        assert_eq!(err.client_message(), "Internal server error");

        let err = TournamentError::TournamentFull;
        assert_eq!(err.client_message(), "Tournament is full");
    }

    #[test]
    fn test_client_message_hides_bracket_links() {
        let err = TournamentError::BrokenBracket("r2m7".into());
        let message = err.client_message();
        assert_eq!(message, "Internal server error");
        assert!(!message.contains("r2m7"));
        assert!(err.to_string().contains("r2m7"));
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(
            ErrorCode::FailedPrecondition.to_string(),
            "failed-precondition"
        );
    }
}
