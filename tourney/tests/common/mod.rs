//! Shared fixtures for the tournament integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tourney::store::{DocumentStore, MemoryStore, RetryPolicy, WriteBatch};
use tourney::tournament::{
    Actor, EngineConfig, MatchStatus, NewTournament, Role, ScoringRules, TeamProfile, TeamRole,
    Tournament, TournamentFormat, TournamentManager, TournamentStatus, paths,
};

pub fn admin() -> Actor {
    Actor::new("admin-1", Role::Admin)
}

pub fn moderator() -> Actor {
    Actor::new("mod-1", Role::Moderator)
}

pub fn founder(i: usize) -> Actor {
    Actor::new(format!("founder{i}"), Role::Member)
}

pub fn team_id(i: usize) -> String {
    format!("team{i:02}")
}

pub fn engine_config(seed: u64) -> EngineConfig {
    EngineConfig {
        retry: RetryPolicy::new(32, Duration::from_millis(1)),
        scoring: ScoringRules::default(),
        shuffle_seed: Some(seed),
    }
}

/// Store `count` team profiles, each with a founder and a player
pub async fn seed_teams(store: &Arc<dyn DocumentStore>, count: usize) {
    let mut batch = WriteBatch::new();
    for i in 0..count {
        let profile = TeamProfile {
            id: team_id(i),
            name: format!("Team {i}"),
            avatar: Some(format!("https://cdn.example.com/teams/{i}.png")),
            members: BTreeMap::from([
                (format!("founder{i}"), TeamRole::Founder),
                (format!("player{i}"), TeamRole::Player),
            ]),
        };
        batch
            .set(paths::team_profile(&profile.id), &profile)
            .expect("Failed to encode team profile");
    }
    batch
        .commit(store.as_ref())
        .await
        .expect("Failed to seed team profiles");
}

/// Create a tournament and register the first `registered` of `max_teams` teams
pub async fn setup(
    format: TournamentFormat,
    registered: usize,
    max_teams: usize,
    seed: u64,
) -> (Arc<dyn DocumentStore>, TournamentManager, Tournament) {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    seed_teams(&store, max_teams.max(registered)).await;

    let manager = TournamentManager::with_config(Arc::clone(&store), engine_config(seed));
    let tournament = manager
        .create_tournament(
            Some(&admin()),
            NewTournament {
                name: "Integration Cup".to_string(),
                format,
                max_teams,
            },
        )
        .await
        .expect("Failed to create tournament");

    for i in 0..registered {
        manager
            .register_team(Some(&founder(i)), &tournament.id, &team_id(i))
            .await
            .expect("Failed to register team");
    }

    (store, manager, tournament)
}

/// Report `team_a` as the winner of every ready match until a champion is crowned
pub async fn play_bracket(manager: &TournamentManager, tournament_id: &str) -> String {
    let admin = admin();
    for _ in 0..256 {
        let tournament = manager.get_tournament(tournament_id).await.unwrap();
        if let Some(champion) = tournament.winner_id {
            assert_eq!(tournament.status, TournamentStatus::Completed);
            return champion;
        }

        let bracket = manager.list_bracket(tournament_id).await.unwrap();
        let ready: Vec<_> = bracket
            .iter()
            .filter(|m| m.status == MatchStatus::Pending)
            .collect();
        assert!(!ready.is_empty(), "bracket stalled: {bracket:#?}");

        for m in ready {
            let winner = m.team_a.as_ref().unwrap().id.clone();
            manager
                .report_bracket_result(Some(&admin), tournament_id, &m.id, &winner)
                .await
                .unwrap();
        }
    }
    panic!("bracket for {tournament_id} never finished");
}
