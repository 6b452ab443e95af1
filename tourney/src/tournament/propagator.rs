//! Bracket result reporting.
//!
//! A reported winner completes its match and is seated in the match its
//! `next_match_id` points at, all inside one transaction. Reporting the
//! final crowns the tournament.

use super::errors::{TournamentError, TournamentResult};
use super::models::{BracketMatch, MatchStatus, TeamId, TeamSlot, Tournament, TournamentStatus};
use super::paths;
use crate::store::{DocumentStore, RetryPolicy, Transaction, run_transaction};
use chrono::Utc;
use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;

/// What a bracket result changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Propagation {
    /// Matches the winner was seated in, nearest first
    pub advanced_to: Vec<String>,
    /// Set when the reported match decided the tournament
    pub champion: Option<TeamId>,
}

/// Applies bracket results transactionally
#[derive(Clone)]
pub struct ResultPropagator {
    store: Arc<dyn DocumentStore>,
    retry: RetryPolicy,
}

impl ResultPropagator {
    pub fn new(store: Arc<dyn DocumentStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Record `winner_id` as the winner of `match_id` and advance them.
    ///
    /// # Errors
    ///
    /// * `TournamentError::TournamentNotFound` / `MatchNotFound` - missing documents
    /// * `TournamentError::InvalidState` - tournament is not ongoing
    /// * `TournamentError::MatchNotReady` - a slot is still empty
    /// * `TournamentError::MatchAlreadyDecided` - the match already has a winner
    /// * `TournamentError::InvalidArgument` - `winner_id` does not play this match
    /// * `TournamentError::BrokenBracket` - the `next_match_id` chain is corrupt
    pub async fn report_result(
        &self,
        tournament_id: &str,
        match_id: &str,
        winner_id: &str,
    ) -> TournamentResult<Propagation> {
        let (tournament_id, match_id, winner_id) = (
            tournament_id.to_string(),
            match_id.to_string(),
            winner_id.to_string(),
        );

        run_transaction(&self.store, &self.retry, |tx| {
            let (tournament_id, match_id, winner_id) =
                (tournament_id.clone(), match_id.clone(), winner_id.clone());
            Box::pin(async move { propagate(tx, &tournament_id, &match_id, &winner_id).await })
        })
        .await
    }
}

async fn propagate(
    tx: &mut Transaction,
    tournament_id: &str,
    match_id: &str,
    winner_id: &str,
) -> TournamentResult<Propagation> {
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

    let key = paths::bracket_match(tournament_id, match_id);
    let mut reported: BracketMatch = tx
        .get(&key)
        .await?
        .ok_or_else(|| TournamentError::MatchNotFound(match_id.to_string()))?;

    if reported.team_a.is_none() || reported.team_b.is_none() {
        return Err(TournamentError::MatchNotReady(match_id.to_string()));
    }
    if reported.winner_id.is_some() {
        return Err(TournamentError::MatchAlreadyDecided(match_id.to_string()));
    }
    let winner: TeamSlot = reported.slot_of(winner_id).cloned().ok_or_else(|| {
        TournamentError::InvalidArgument(format!(
            "team {winner_id} is not playing match {match_id}"
        ))
    })?;

    reported.status = MatchStatus::Completed;
    reported.winner_id = Some(winner.id.clone());
    tx.set(key, &reported)?;
    debug!(
        "Match {} of tournament {} won by {}",
        match_id, tournament_id, winner.id
    );

    let mut advanced_to = Vec::new();
    let mut from = reported;
    loop {
        let Some(next_id) = from.next_match_id.clone() else {
            tournament.status = TournamentStatus::Completed;
            tournament.winner_id = Some(winner.id.clone());
            tournament.completed_at = Some(Utc::now());
            tx.set(tournament_key, &tournament)?;
            info!("Tournament {} completed, won by {}", tournament_id, winner.id);

            return Ok(Propagation {
                advanced_to,
                champion: Some(winner.id),
            });
        };

        let next_key = paths::bracket_match(tournament_id, &next_id);
        let mut next: BracketMatch = tx.get(&next_key).await?.ok_or_else(|| {
            TournamentError::BrokenBracket(format!(
                "match {next_id} linked from {} does not exist",
                from.id
            ))
        })?;

        if !next.seat(winner.clone()) {
            return Err(TournamentError::BrokenBracket(format!(
                "match {next_id} has no free slot for the winner of {}",
                from.id
            )));
        }
        advanced_to.push(next_id);

        // A single-feeder match never gets a second team: pass the winner on
        let pass_through = next.feeder_count == 1;
        if pass_through {
            next.winner_id = Some(winner.id.clone());
        }
        tx.set(next_key, &next)?;

        if !pass_through {
            return Ok(Propagation {
                advanced_to,
                champion: None,
            });
        }
        from = next;
    }
}
