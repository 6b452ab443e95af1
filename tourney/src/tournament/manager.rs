//! Tournament manager: the entry point for every tournament operation.
//!
//! Authorization and id validation happen here, before any store access;
//! the components it wraps assume well-formed ids.

use super::actor::{Actor, require_actor, require_staff};
use super::config::EngineConfig;
use super::errors::{TournamentError, TournamentResult};
use super::models::{
    BracketMatch, NewTournament, RegisteredTeam, ScheduleEntry, Standing, StructureSummary,
    Tournament, TournamentStatus,
};
use super::paths::{self, MAX_ID_LEN, validate_id};
use super::propagator::{Propagation, ResultPropagator};
use super::registration::TeamRegistry;
use super::standings::{RoundRobinOutcome, StandingsUpdater};
use super::structure::StructureGenerator;
use crate::store::{DocumentStore, WriteBatch};
use chrono::Utc;
use log::info;
use std::sync::Arc;
use uuid::Uuid;

/// Fewest teams a tournament may be created for
pub const MIN_MAX_TEAMS: usize = 2;

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    store: Arc<dyn DocumentStore>,
    generator: StructureGenerator,
    propagator: ResultPropagator,
    standings: StandingsUpdater,
    registry: TeamRegistry,
}

impl TournamentManager {
    /// Create a new tournament manager with default configuration
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Create a new tournament manager
    pub fn with_config(store: Arc<dyn DocumentStore>, config: EngineConfig) -> Self {
        Self {
            generator: StructureGenerator::new(Arc::clone(&store), config.retry)
                .with_shuffle_seed(config.shuffle_seed),
            propagator: ResultPropagator::new(Arc::clone(&store), config.retry),
            standings: StandingsUpdater::new(Arc::clone(&store), config.retry, config.scoring),
            registry: TeamRegistry::new(Arc::clone(&store), config.retry),
            store,
        }
    }

    /// Create a new upcoming tournament
    ///
    /// # Arguments
    ///
    /// * `actor` - Caller; must be an admin or moderator
    /// * `new` - Name, format and capacity
    ///
    /// # Returns
    ///
    /// * `Ok(Tournament)` - The stored tournament with its generated id
    pub async fn create_tournament(
        &self,
        actor: Option<&Actor>,
        new: NewTournament,
    ) -> TournamentResult<Tournament> {
        require_staff(actor)?;

        let name = new.name.trim();
        if name.is_empty() || name.chars().count() > MAX_ID_LEN {
            return Err(TournamentError::InvalidArgument(format!(
                "tournament name must be 1 to {MAX_ID_LEN} characters"
            )));
        }
        if new.max_teams < MIN_MAX_TEAMS {
            return Err(TournamentError::InvalidArgument(format!(
                "max_teams must be at least {MIN_MAX_TEAMS}"
            )));
        }

        let tournament = Tournament {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            format: new.format,
            max_teams: new.max_teams,
            status: TournamentStatus::Upcoming,
            winner_id: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };

        let mut batch = WriteBatch::new();
        batch.set(paths::tournament(&tournament.id), &tournament)?;
        batch.commit(self.store.as_ref()).await?;

        info!(
            "Created {} tournament {} ({})",
            tournament.format, tournament.id, tournament.name
        );
        Ok(tournament)
    }

    /// Get a tournament
    pub async fn get_tournament(&self, tournament_id: &str) -> TournamentResult<Tournament> {
        validate_id("tournament", tournament_id)?;
        self.load_tournament(tournament_id).await
    }

    /// Teams registered for a tournament, in registration order
    pub async fn list_registered_teams(
        &self,
        tournament_id: &str,
    ) -> TournamentResult<Vec<RegisteredTeam>> {
        validate_id("tournament", tournament_id)?;
        self.load_tournament(tournament_id).await?;

        let mut teams: Vec<RegisteredTeam> =
            self.list_decoded(&paths::registrations(tournament_id)).await?;
        teams.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(teams)
    }

    /// Bracket matches ordered by round, then position within the round
    pub async fn list_bracket(&self, tournament_id: &str) -> TournamentResult<Vec<BracketMatch>> {
        validate_id("tournament", tournament_id)?;
        self.load_tournament(tournament_id).await?;

        let mut bracket: Vec<BracketMatch> =
            self.list_decoded(&paths::matches(tournament_id)).await?;
        bracket.sort_by(|a, b| {
            a.round
                .cmp(&b.round)
                .then(a.id.len().cmp(&b.id.len()))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(bracket)
    }

    /// Round-robin schedule in roster order
    pub async fn list_schedule(&self, tournament_id: &str) -> TournamentResult<Vec<ScheduleEntry>> {
        validate_id("tournament", tournament_id)?;
        self.load_tournament(tournament_id).await?;

        let mut schedule: Vec<ScheduleEntry> =
            self.list_decoded(&paths::schedule(tournament_id)).await?;
        schedule.sort_by_key(|e| schedule_position(&e.id));
        Ok(schedule)
    }

    /// Round-robin standings, leader first
    pub async fn list_standings(&self, tournament_id: &str) -> TournamentResult<Vec<Standing>> {
        validate_id("tournament", tournament_id)?;
        self.load_tournament(tournament_id).await?;

        let mut table: Vec<Standing> = self.list_decoded(&paths::standings(tournament_id)).await?;
        table.sort_by(Standing::ranking);
        Ok(table)
    }

    /// Generate the bracket or schedule of an upcoming tournament and start it
    ///
    /// # Errors
    ///
    /// * `TournamentError::Unauthenticated` / `PermissionDenied` - caller is not staff
    /// * `TournamentError::InvalidArgument` - malformed id
    /// * everything [`StructureGenerator::generate`] reports
    pub async fn generate_structure(
        &self,
        actor: Option<&Actor>,
        tournament_id: &str,
    ) -> TournamentResult<StructureSummary> {
        require_staff(actor)?;
        validate_id("tournament", tournament_id)?;

        self.generator.generate(tournament_id).await
    }

    /// Report the winner of a bracket match
    pub async fn report_bracket_result(
        &self,
        actor: Option<&Actor>,
        tournament_id: &str,
        match_id: &str,
        winner_id: &str,
    ) -> TournamentResult<Propagation> {
        require_staff(actor)?;
        validate_id("tournament", tournament_id)?;
        validate_id("match", match_id)?;
        validate_id("team", winner_id)?;

        self.propagator
            .report_result(tournament_id, match_id, winner_id)
            .await
    }

    /// Report the winner and loser of a round-robin schedule entry
    pub async fn report_round_robin_result(
        &self,
        actor: Option<&Actor>,
        tournament_id: &str,
        match_id: &str,
        winner_id: &str,
        loser_id: &str,
    ) -> TournamentResult<RoundRobinOutcome> {
        require_staff(actor)?;
        validate_id("tournament", tournament_id)?;
        validate_id("match", match_id)?;
        validate_id("team", winner_id)?;
        validate_id("team", loser_id)?;

        self.standings
            .report_result(tournament_id, match_id, winner_id, loser_id)
            .await
    }

    /// Register a team; the caller must be its founder or coach
    pub async fn register_team(
        &self,
        actor: Option<&Actor>,
        tournament_id: &str,
        team_id: &str,
    ) -> TournamentResult<RegisteredTeam> {
        let actor = require_actor(actor)?;
        validate_id("tournament", tournament_id)?;
        validate_id("team", team_id)?;

        self.registry
            .register_team(tournament_id, team_id, &actor.uid)
            .await
    }

    async fn load_tournament(&self, tournament_id: &str) -> TournamentResult<Tournament> {
        let doc = self
            .store
            .get(&paths::tournament(tournament_id))
            .await?
            .ok_or_else(|| TournamentError::TournamentNotFound(tournament_id.to_string()))?;
        Ok(doc.decode()?)
    }

    async fn list_decoded<T: serde::de::DeserializeOwned>(
        &self,
        collection: &str,
    ) -> TournamentResult<Vec<T>> {
        let snapshot = self.store.list(collection).await?;
        snapshot
            .documents
            .iter()
            .map(|doc| doc.decode().map_err(TournamentError::from))
            .collect()
    }
}

/// Roster positions encoded in a schedule entry id; unknown shapes sort last
fn schedule_position(id: &str) -> (usize, usize, String) {
    id.strip_prefix("rr")
        .and_then(|rest| rest.split_once('-'))
        .and_then(|(i, j)| Some((i.parse().ok()?, j.parse().ok()?, String::new())))
        .unwrap_or((usize::MAX, usize::MAX, id.to_string()))
}
