//! Round-robin result reporting and standings maintenance.

use super::errors::{TournamentError, TournamentResult};
use super::models::{
    ScheduleEntry, ScheduleStatus, ScoringRules, Standing, TeamId, Tournament, TournamentStatus,
};
use super::paths;
use crate::store::{DocumentStore, RetryPolicy, Transaction, run_transaction};
use chrono::Utc;
use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;

/// What a round-robin result changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundRobinOutcome {
    /// Set when the reported entry was the last pending one
    pub champion: Option<TeamId>,
}

/// Applies round-robin results to the schedule and standings
#[derive(Clone)]
pub struct StandingsUpdater {
    store: Arc<dyn DocumentStore>,
    retry: RetryPolicy,
    scoring: ScoringRules,
}

impl StandingsUpdater {
    pub fn new(store: Arc<dyn DocumentStore>, retry: RetryPolicy, scoring: ScoringRules) -> Self {
        Self {
            store,
            retry,
            scoring,
        }
    }

    /// Record the result of schedule entry `match_id`.
    ///
    /// The entry, both standings rows and, when this was the last pending
    /// entry, the tournament itself are updated in one transaction.
    ///
    /// # Errors
    ///
    /// * `TournamentError::TournamentNotFound` - tournament doesn't exist
    /// * `TournamentError::InvalidState` - tournament is not ongoing
    /// * `TournamentError::ScheduleEntryMissing` - no such entry
    /// * `TournamentError::MatchAlreadyDecided` - entry already completed
    /// * `TournamentError::InvalidArgument` - winner/loser are not the entry's two teams
    /// * `TournamentError::StandingNotFound` - a standings row is missing
    pub async fn report_result(
        &self,
        tournament_id: &str,
        match_id: &str,
        winner_id: &str,
        loser_id: &str,
    ) -> TournamentResult<RoundRobinOutcome> {
        let scoring = self.scoring;
        let ids = [tournament_id, match_id, winner_id, loser_id].map(str::to_string);

        run_transaction(&self.store, &self.retry, |tx| {
            let [tournament_id, match_id, winner_id, loser_id] = ids.clone();
            Box::pin(async move {
                apply(
                    tx,
                    scoring,
                    &tournament_id,
                    &match_id,
                    &winner_id,
                    &loser_id,
                )
                .await
            })
        })
        .await
    }
}

async fn apply(
    tx: &mut Transaction,
    scoring: ScoringRules,
    tournament_id: &str,
    match_id: &str,
    winner_id: &str,
    loser_id: &str,
) -> TournamentResult<RoundRobinOutcome> {
    let tournament_key = paths::tournament(tournament_id);
    let mut tournament: Tournament = tx
        .get(&tournament_key)
        .await?
        .ok_or_else(|| TournamentError::TournamentNotFound(tournament_id.to_string()))?;
    if tournament.status != TournamentStatus::Ongoing {
        return Err(TournamentError::InvalidState {
            expected: TournamentStatus::Ongoing,
            actual: tournament.status,
        });
    }

    let entry_key = paths::schedule_entry(tournament_id, match_id);
    let mut entry: ScheduleEntry = tx
        .get(&entry_key)
        .await?
        .ok_or_else(|| TournamentError::ScheduleEntryMissing(match_id.to_string()))?;
    if entry.status == ScheduleStatus::Completed {
        return Err(TournamentError::MatchAlreadyDecided(match_id.to_string()));
    }

    if winner_id == loser_id || !entry.involves(winner_id) || !entry.involves(loser_id) {
        return Err(TournamentError::InvalidArgument(format!(
            "{winner_id} and {loser_id} are not the two teams of {match_id}"
        )));
    }

    let winner_key = paths::standing(tournament_id, winner_id);
    let loser_key = paths::standing(tournament_id, loser_id);
    let mut winner: Standing = tx
        .get(&winner_key)
        .await?
        .ok_or_else(|| TournamentError::StandingNotFound(winner_id.to_string()))?;
    let mut loser: Standing = tx
        .get(&loser_key)
        .await?
        .ok_or_else(|| TournamentError::StandingNotFound(loser_id.to_string()))?;

    entry.status = ScheduleStatus::Completed;
    entry.winner_id = Some(winner_id.to_string());
    winner.wins += 1;
    winner.points += scoring.points_per_win;
    loser.losses += 1;
    loser.points += scoring.points_per_loss;

    tx.set(entry_key, &entry)?;
    tx.set(winner_key, &winner)?;
    tx.set(loser_key, &loser)?;
    debug!(
        "Schedule entry {} of tournament {}: {} beat {}",
        match_id, tournament_id, winner_id, loser_id
    );

    let schedule: Vec<ScheduleEntry> = tx.list(&paths::schedule(tournament_id)).await?;
    if schedule
        .iter()
        .any(|e| e.status != ScheduleStatus::Completed)
    {
        return Ok(RoundRobinOutcome { champion: None });
    }

    let mut table: Vec<Standing> = tx.list(&paths::standings(tournament_id)).await?;
    table.sort_by(Standing::ranking);
    let champion = table.into_iter().next().map(|s| s.team_id);

    tournament.status = TournamentStatus::Completed;
    tournament.winner_id = champion.clone();
    tournament.completed_at = Some(Utc::now());
    tx.set(tournament_key, &tournament)?;
    info!(
        "Round-robin tournament {} completed, leader {:?}",
        tournament_id, champion
    );

    Ok(RoundRobinOutcome { champion })
}
