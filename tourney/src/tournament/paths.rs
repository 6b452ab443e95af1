//! Document locations of tournament entities and id validation.

use super::errors::{TournamentError, TournamentResult};
use crate::store::DocKey;

/// Longest accepted id
pub const MAX_ID_LEN: usize = 128;

pub const TOURNAMENTS: &str = "tournaments";
pub const TEAMS: &str = "teams";

pub fn tournament(tournament_id: &str) -> DocKey {
    DocKey::new(TOURNAMENTS, tournament_id)
}

pub fn team_profile(team_id: &str) -> DocKey {
    DocKey::new(TEAMS, team_id)
}

pub fn registrations(tournament_id: &str) -> String {
    format!("{TOURNAMENTS}/{tournament_id}/teams")
}

pub fn registration(tournament_id: &str, team_id: &str) -> DocKey {
    DocKey::new(registrations(tournament_id), team_id)
}

pub fn matches(tournament_id: &str) -> String {
    format!("{TOURNAMENTS}/{tournament_id}/matches")
}

pub fn bracket_match(tournament_id: &str, match_id: &str) -> DocKey {
    DocKey::new(matches(tournament_id), match_id)
}

pub fn schedule(tournament_id: &str) -> String {
    format!("{TOURNAMENTS}/{tournament_id}/schedule")
}

pub fn schedule_entry(tournament_id: &str, entry_id: &str) -> DocKey {
    DocKey::new(schedule(tournament_id), entry_id)
}

pub fn standings(tournament_id: &str) -> String {
    format!("{TOURNAMENTS}/{tournament_id}/standings")
}

pub fn standing(tournament_id: &str, team_id: &str) -> DocKey {
    DocKey::new(standings(tournament_id), team_id)
}

/// Reject ids that are empty, oversized or would escape their collection
pub fn validate_id(kind: &str, id: &str) -> TournamentResult<()> {
    if id.is_empty() {
        return Err(TournamentError::InvalidArgument(format!(
            "{kind} id must not be empty"
        )));
    }
    if id.len() > MAX_ID_LEN {
        return Err(TournamentError::InvalidArgument(format!(
            "{kind} id exceeds {MAX_ID_LEN} characters"
        )));
    }
    if id.contains('/') || id.chars().any(char::is_control) {
        return Err(TournamentError::InvalidArgument(format!(
            "{kind} id contains invalid characters"
        )));
    }
    Ok(())
}
