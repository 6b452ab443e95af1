//! Team registration with capacity control.
//!
//! The registered-team count is read as a collection read inside the
//! transaction, so a concurrent registration that lands first invalidates
//! the count and forces a retry against the new total.

use super::errors::{TournamentError, TournamentResult};
use super::models::{RegisteredTeam, TeamProfile, Tournament, TournamentStatus};
use super::paths;
use crate::store::{DocumentStore, RetryPolicy, Transaction, run_transaction};
use chrono::Utc;
use log::{debug, info};
use std::sync::Arc;

/// Registers teams into upcoming tournaments
#[derive(Clone)]
pub struct TeamRegistry {
    store: Arc<dyn DocumentStore>,
    retry: RetryPolicy,
}

impl TeamRegistry {
    pub fn new(store: Arc<dyn DocumentStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Enter `team_id` into `tournament_id` on behalf of `actor_uid`.
    ///
    /// # Arguments
    ///
    /// * `tournament_id` - Tournament to enter
    /// * `team_id` - Team being entered
    /// * `actor_uid` - Caller; must be the team's founder or coach
    ///
    /// # Returns
    ///
    /// * `Ok(RegisteredTeam)` - The stored registration
    ///
    /// # Errors
    ///
    /// * `TournamentError::TeamNotFound` - team profile doesn't exist
    /// * `TournamentError::PermissionDenied` - caller can't register this team
    /// * `TournamentError::TournamentNotFound` - tournament doesn't exist
    /// * `TournamentError::InvalidState` - registration is closed
    /// * `TournamentError::AlreadyRegistered` - team is already entered
    /// * `TournamentError::TournamentFull` - capacity reached
    pub async fn register_team(
        &self,
        tournament_id: &str,
        team_id: &str,
        actor_uid: &str,
    ) -> TournamentResult<RegisteredTeam> {
        let ids = [tournament_id, team_id, actor_uid].map(str::to_string);

        let team = run_transaction(&self.store, &self.retry, |tx| {
            let [tournament_id, team_id, actor_uid] = ids.clone();
            Box::pin(async move { register(tx, &tournament_id, &team_id, &actor_uid).await })
        })
        .await?;

        info!("Team {} registered for tournament {}", team_id, tournament_id);
        Ok(team)
    }
}

async fn register(
    tx: &mut Transaction,
    tournament_id: &str,
    team_id: &str,
    actor_uid: &str,
) -> TournamentResult<RegisteredTeam> {
    let profile: TeamProfile = tx
        .get(&paths::team_profile(team_id))
        .await?
        .ok_or_else(|| TournamentError::TeamNotFound(team_id.to_string()))?;
    let may_register = profile
        .members
        .get(actor_uid)
        .is_some_and(|role| role.can_register());
    if !may_register {
        return Err(TournamentError::PermissionDenied(
            "only the team founder or coach can register the team".to_string(),
        ));
    }

    let tournament: Tournament = tx
        .get(&paths::tournament(tournament_id))
        .await?
        .ok_or_else(|| TournamentError::TournamentNotFound(tournament_id.to_string()))?;
    if tournament.status != TournamentStatus::Upcoming {
        return Err(TournamentError::InvalidState {
            expected: TournamentStatus::Upcoming,
            actual: tournament.status,
        });
    }

    let key = paths::registration(tournament_id, team_id);
    if tx.get::<RegisteredTeam>(&key).await?.is_some() {
        return Err(TournamentError::AlreadyRegistered);
    }

    let registered: Vec<RegisteredTeam> = tx.list(&paths::registrations(tournament_id)).await?;
    if registered.len() >= tournament.max_teams {
        debug!(
            "Tournament {} full ({}/{})",
            tournament_id,
            registered.len(),
            tournament.max_teams
        );
        return Err(TournamentError::TournamentFull);
    }

    let team = RegisteredTeam {
        id: profile.id,
        name: profile.name,
        avatar: profile.avatar,
        registered_at: Utc::now(),
    };
    tx.set(key, &team)?;

    Ok(team)
}
