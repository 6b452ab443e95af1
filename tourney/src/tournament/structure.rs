//! Structure generation: turns the registered roster of an upcoming
//! tournament into a bracket or a round-robin schedule and starts it.

use super::bracket::{BracketBuilder, round_count};
use super::errors::{TournamentError, TournamentResult};
use super::models::{
    RegisteredTeam, StructureSummary, Tournament, TournamentFormat, TournamentStatus,
};
use super::paths;
use super::round_robin::RoundRobinScheduler;
use crate::store::{DocumentStore, RetryPolicy, Transaction, run_transaction};
use chrono::Utc;
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

/// Generates tournament structures
#[derive(Clone)]
pub struct StructureGenerator {
    store: Arc<dyn DocumentStore>,
    retry: RetryPolicy,
    shuffle_seed: Option<u64>,
}

impl StructureGenerator {
    pub fn new(store: Arc<dyn DocumentStore>, retry: RetryPolicy) -> Self {
        Self {
            store,
            retry,
            shuffle_seed: None,
        }
    }

    /// Shuffle brackets with a fixed seed instead of fresh entropy
    pub fn with_shuffle_seed(mut self, seed: Option<u64>) -> Self {
        self.shuffle_seed = seed;
        self
    }

    /// Generate the structure of `tournament_id` and mark it ongoing.
    ///
    /// The tournament is re-read inside the transaction, so of two
    /// concurrent calls only one writes a structure; the other observes the
    /// tournament as ongoing and fails.
    ///
    /// # Errors
    ///
    /// * `TournamentError::TournamentNotFound` - tournament doesn't exist
    /// * `TournamentError::InvalidState` - tournament is not upcoming
    /// * `TournamentError::UnsupportedFormat` - no generator for the format
    /// * `TournamentError::InsufficientTeams` - fewer than two registered teams
    pub async fn generate(&self, tournament_id: &str) -> TournamentResult<StructureSummary> {
        let tournament_id = tournament_id.to_string();
        let seed = self.shuffle_seed;

        let summary = run_transaction(&self.store, &self.retry, |tx| {
            let tournament_id = tournament_id.clone();
            Box::pin(async move { generate(tx, &tournament_id, seed).await })
        })
        .await?;

        info!(
            "Generated {} structure for tournament {}: {} teams, {} matches",
            summary.format, tournament_id, summary.teams, summary.matches
        );
        Ok(summary)
    }
}

async fn generate(
    tx: &mut Transaction,
    tournament_id: &str,
    seed: Option<u64>,
) -> TournamentResult<StructureSummary> {
    let tournament_key = paths::tournament(tournament_id);
    let mut tournament: Tournament = tx
        .get(&tournament_key)
        .await?
        .ok_or_else(|| TournamentError::TournamentNotFound(tournament_id.to_string()))?;
    if tournament.status != TournamentStatus::Upcoming {
        return Err(TournamentError::InvalidState {
            expected: TournamentStatus::Upcoming,
            actual: tournament.status,
        });
    }

    let mut teams: Vec<RegisteredTeam> = tx.list(&paths::registrations(tournament_id)).await?;
    teams.sort_by(|a, b| {
        a.registered_at
            .cmp(&b.registered_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    debug!(
        "Generating structure for tournament {} from {} teams",
        tournament_id,
        teams.len()
    );

    let summary = match &tournament.format {
        TournamentFormat::SingleElimination => {
            let rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_rng(&mut rand::rng()),
            };
            let bracket = BracketBuilder::with_rng(rng).build(&teams)?;
            for m in &bracket {
                tx.set(paths::bracket_match(tournament_id, &m.id), m)?;
            }
            StructureSummary {
                format: tournament.format.clone(),
                teams: teams.len(),
                matches: bracket.len(),
                rounds: round_count(&bracket),
            }
        }
        TournamentFormat::RoundRobin => {
            let (schedule, standings) = RoundRobinScheduler::build_schedule(&teams)?;
            for entry in &schedule {
                tx.set(paths::schedule_entry(tournament_id, &entry.id), entry)?;
            }
            for row in &standings {
                tx.set(paths::standing(tournament_id, &row.team_id), row)?;
            }
            StructureSummary {
                format: tournament.format.clone(),
                teams: teams.len(),
                matches: schedule.len(),
                rounds: 1,
            }
        }
        TournamentFormat::Other(name) => {
            return Err(TournamentError::UnsupportedFormat(name.clone()));
        }
    };

    tournament.status = TournamentStatus::Ongoing;
    tournament.started_at = Some(Utc::now());
    tx.set(tournament_key, &tournament)?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, WriteBatch};
    use crate::tournament::models::{BracketMatch, ScheduleEntry, Standing};
    use chrono::Duration;

    const TID: &str = "open";

    async fn setup(
        format: TournamentFormat,
        teams: usize,
    ) -> (Arc<dyn DocumentStore>, StructureGenerator) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let created_at = Utc::now();
        let tournament = Tournament {
            id: TID.to_string(),
            name: "Open".to_string(),
            format,
            max_teams: 64,
            status: TournamentStatus::Upcoming,
            winner_id: None,
            created_at,
            started_at: None,
            completed_at: None,
        };

        let mut batch = WriteBatch::new();
        batch.set(paths::tournament(TID), &tournament).unwrap();
        for i in 0..teams {
            let team = RegisteredTeam {
                id: format!("team{i:02}"),
                name: format!("Team {i}"),
                avatar: None,
                registered_at: created_at + Duration::seconds(i as i64),
            };
            batch.set(paths::registration(TID, &team.id), &team).unwrap();
        }
        batch.commit(store.as_ref()).await.unwrap();

        let generator = StructureGenerator::new(Arc::clone(&store), RetryPolicy::default())
            .with_shuffle_seed(Some(11));
        (store, generator)
    }

    async fn tournament(store: &Arc<dyn DocumentStore>) -> Tournament {
        store
            .get(&paths::tournament(TID))
            .await
            .unwrap()
            .unwrap()
            .decode()
            .unwrap()
    }

    #[tokio::test]
    async fn test_single_elimination_structure() {
        let (store, generator) = setup(TournamentFormat::SingleElimination, 5).await;

        let summary = generator.generate(TID).await.unwrap();
        assert_eq!(summary.format, TournamentFormat::SingleElimination);
        assert_eq!(summary.teams, 5);
        assert_eq!(summary.matches, 6);
        assert_eq!(summary.rounds, 3);

        let matches = store.list(&paths::matches(TID)).await.unwrap();
        assert_eq!(matches.documents.len(), 6);
        let decoded: Vec<BracketMatch> = matches
            .documents
            .iter()
            .map(|d| d.decode().unwrap())
            .collect();
        assert_eq!(decoded.iter().filter(|m| m.next_match_id.is_none()).count(), 1);

        let started = tournament(&store).await;
        assert_eq!(started.status, TournamentStatus::Ongoing);
        assert!(started.started_at.is_some());
    }

    #[tokio::test]
    async fn test_round_robin_structure() {
        let (store, generator) = setup(TournamentFormat::RoundRobin, 4).await;

        let summary = generator.generate(TID).await.unwrap();
        assert_eq!(summary.matches, 6);

        let schedule = store.list(&paths::schedule(TID)).await.unwrap();
        let standings = store.list(&paths::standings(TID)).await.unwrap();
        assert_eq!(schedule.documents.len(), 6);
        assert_eq!(standings.documents.len(), 4);

        // Roster order follows registration time
        let first: ScheduleEntry = store
            .get(&paths::schedule_entry(TID, "rr0-1"))
            .await
            .unwrap()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(first.team_a.id, "team00");
        assert_eq!(first.team_b.id, "team01");

        let row: Standing = standings.documents[0].decode().unwrap();
        assert_eq!(row.points, 0);
    }

    #[tokio::test]
    async fn test_generation_runs_once() {
        let (_, generator) = setup(TournamentFormat::SingleElimination, 4).await;
        generator.generate(TID).await.unwrap();

        let err = generator.generate(TID).await.unwrap_err();
        assert!(matches!(
            err,
            TournamentError::InvalidState {
                expected: TournamentStatus::Upcoming,
                actual: TournamentStatus::Ongoing
            }
        ));
    }

    #[tokio::test]
    async fn test_insufficient_teams_writes_nothing() {
        let (store, generator) = setup(TournamentFormat::SingleElimination, 1).await;

        let err = generator.generate(TID).await.unwrap_err();
        assert!(matches!(err, TournamentError::InsufficientTeams { .. }));
        assert_eq!(tournament(&store).await.status, TournamentStatus::Upcoming);
        assert!(
            store
                .list(&paths::matches(TID))
                .await
                .unwrap()
                .documents
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let (_, generator) = setup(TournamentFormat::Other("swiss".to_string()), 8).await;
        let err = generator.generate(TID).await.unwrap_err();
        assert!(matches!(err, TournamentError::UnsupportedFormat(name) if name == "swiss"));
    }

    #[tokio::test]
    async fn test_unknown_tournament() {
        let (_, generator) = setup(TournamentFormat::RoundRobin, 2).await;
        let err = generator.generate("nope").await.unwrap_err();
        assert!(matches!(err, TournamentError::TournamentNotFound(_)));
    }
}
