//! Tournament API handlers.
//!
//! This module provides HTTP endpoints for the tournament lifecycle:
//! - Creating tournaments and reading them back
//! - Registering teams while a tournament is upcoming
//! - Generating the bracket or round-robin schedule
//! - Reporting bracket and round-robin results
//! - Reading the bracket, schedule and standings
//!
//! The caller is identified by the `x-actor-uid` / `x-actor-role` headers.
//!
//! # Examples
//!
//! Generate a structure:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/tournaments/TID/structure \
//!   -H "x-actor-uid: admin-1" -H "x-actor-role: admin"
//! ```
//!
//! Report a bracket result:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/tournaments/TID/bracket/r1m0/result \
//!   -H "x-actor-uid: admin-1" -H "x-actor-role: admin" \
//!   -H "Content-Type: application/json" \
//!   -d '{"winner_id": "team-red"}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tourney::tournament::{
    BracketMatch, NewTournament, Propagation, RegisteredTeam, RoundRobinOutcome, ScheduleEntry,
    Standing, StructureSummary, Tournament, TournamentFormat,
};

use super::AppState;
use super::actor::Caller;
use super::error::ApiError;
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct RegisterTeamRequest {
    pub team_id: String,
}

#[derive(Debug, Deserialize)]
pub struct BracketResultRequest {
    pub winner_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RoundRobinResultRequest {
    pub winner_id: String,
    pub loser_id: String,
}

/// Create a tournament.
///
/// # Request Body
///
/// ```json
/// {"name": "Spring Cup", "format": "single-elimination", "max_teams": 16}
/// ```
///
/// # Response
///
/// Returns `201 Created` with the stored tournament.
///
/// # Errors
///
/// - `401 Unauthorized` / `403 Forbidden`: caller is not an admin or moderator
/// - `400 Bad Request`: empty name or `max_teams` below 2
pub async fn create_tournament(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<NewTournament>,
) -> Result<(StatusCode, Json<Tournament>), ApiError> {
    let tournament = state
        .manager
        .create_tournament(caller.actor(), request)
        .await
        .map_err(|e| ApiError::from_operation("create_tournament", None, e))?;

    Ok((StatusCode::CREATED, Json(tournament)))
}

/// Get a tournament.
pub async fn get_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<String>,
) -> Result<Json<Tournament>, ApiError> {
    state
        .manager
        .get_tournament(&tournament_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_operation("get_tournament", Some(&tournament_id), e))
}

/// Register a team.
///
/// # Request Body
///
/// ```json
/// {"team_id": "team-red"}
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: no caller
/// - `403 Forbidden`: caller is not the team's founder or coach
/// - `404 Not Found`: tournament or team doesn't exist
/// - `409 Conflict`: registration closed, team already registered, or tournament full
pub async fn register_team(
    State(state): State<AppState>,
    caller: Caller,
    Path(tournament_id): Path<String>,
    Json(request): Json<RegisterTeamRequest>,
) -> Result<(StatusCode, Json<RegisteredTeam>), ApiError> {
    let team = state
        .manager
        .register_team(caller.actor(), &tournament_id, &request.team_id)
        .await
        .map_err(|e| ApiError::from_operation("register_team", Some(&tournament_id), e))?;

    metrics::registrations_total();
    Ok((StatusCode::CREATED, Json(team)))
}

/// List registered teams in registration order.
pub async fn list_teams(
    State(state): State<AppState>,
    Path(tournament_id): Path<String>,
) -> Result<Json<Vec<RegisteredTeam>>, ApiError> {
    state
        .manager
        .list_registered_teams(&tournament_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_operation("list_teams", Some(&tournament_id), e))
}

/// Generate the tournament structure and start the tournament.
///
/// # Response
///
/// Returns `200 OK` with a summary:
/// ```json
/// {"format": "single-elimination", "teams": 5, "matches": 6, "rounds": 3}
/// ```
///
/// # Errors
///
/// - `409 Conflict`: tournament is not upcoming, or fewer than two teams
/// - `501 Not Implemented`: no generator for the tournament format
pub async fn generate_structure(
    State(state): State<AppState>,
    caller: Caller,
    Path(tournament_id): Path<String>,
) -> Result<Json<StructureSummary>, ApiError> {
    let summary = state
        .manager
        .generate_structure(caller.actor(), &tournament_id)
        .await
        .map_err(|e| ApiError::from_operation("generate_structure", Some(&tournament_id), e))?;

    metrics::structures_generated_total(summary.format.as_str());
    Ok(Json(summary))
}

/// List bracket matches, round by round.
pub async fn list_bracket(
    State(state): State<AppState>,
    Path(tournament_id): Path<String>,
) -> Result<Json<Vec<BracketMatch>>, ApiError> {
    state
        .manager
        .list_bracket(&tournament_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_operation("list_bracket", Some(&tournament_id), e))
}

/// Report the winner of a bracket match.
///
/// # Errors
///
/// - `400 Bad Request`: winner does not play this match
/// - `404 Not Found`: tournament or match doesn't exist
/// - `409 Conflict`: match still waiting for a team, or already decided
pub async fn report_bracket_result(
    State(state): State<AppState>,
    caller: Caller,
    Path((tournament_id, match_id)): Path<(String, String)>,
    Json(request): Json<BracketResultRequest>,
) -> Result<Json<Propagation>, ApiError> {
    let outcome = state
        .manager
        .report_bracket_result(caller.actor(), &tournament_id, &match_id, &request.winner_id)
        .await
        .map_err(|e| ApiError::from_operation("report_bracket_result", Some(&tournament_id), e))?;

    metrics::results_reported_total(
        TournamentFormat::SingleElimination.as_str(),
        outcome.champion.is_some(),
    );
    Ok(Json(outcome))
}

/// List the round-robin schedule.
pub async fn list_schedule(
    State(state): State<AppState>,
    Path(tournament_id): Path<String>,
) -> Result<Json<Vec<ScheduleEntry>>, ApiError> {
    state
        .manager
        .list_schedule(&tournament_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_operation("list_schedule", Some(&tournament_id), e))
}

/// Report the winner and loser of a round-robin schedule entry.
///
/// # Errors
///
/// - `400 Bad Request`: winner and loser are not the entry's two teams
/// - `404 Not Found`: tournament or standings row doesn't exist
/// - `409 Conflict`: entry missing or already completed
pub async fn report_round_robin_result(
    State(state): State<AppState>,
    caller: Caller,
    Path((tournament_id, match_id)): Path<(String, String)>,
    Json(request): Json<RoundRobinResultRequest>,
) -> Result<Json<RoundRobinOutcome>, ApiError> {
    let outcome = state
        .manager
        .report_round_robin_result(
            caller.actor(),
            &tournament_id,
            &match_id,
            &request.winner_id,
            &request.loser_id,
        )
        .await
        .map_err(|e| {
            ApiError::from_operation("report_round_robin_result", Some(&tournament_id), e)
        })?;

    metrics::results_reported_total(
        TournamentFormat::RoundRobin.as_str(),
        outcome.champion.is_some(),
    );
    Ok(Json(outcome))
}

/// List round-robin standings, leader first.
pub async fn list_standings(
    State(state): State<AppState>,
    Path(tournament_id): Path<String>,
) -> Result<Json<Vec<Standing>>, ApiError> {
    state
        .manager
        .list_standings(&tournament_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_operation("list_standings", Some(&tournament_id), e))
}
