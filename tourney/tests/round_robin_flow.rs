//! Integration tests for round-robin tournaments: schedule generation,
//! standings updates and automatic completion.

mod common;

use common::{admin, setup};
use std::collections::HashSet;
use tourney::tournament::{
    ErrorCode, ScheduleStatus, TournamentError, TournamentFormat, TournamentStatus,
};

#[tokio::test]
async fn test_four_team_schedule() {
    let (_, manager, tournament) = setup(TournamentFormat::RoundRobin, 4, 4, 1).await;

    let summary = manager
        .generate_structure(Some(&admin()), &tournament.id)
        .await
        .unwrap();
    assert_eq!(summary.format, TournamentFormat::RoundRobin);
    assert_eq!(summary.matches, 6);

    let schedule = manager.list_schedule(&tournament.id).await.unwrap();
    assert_eq!(schedule.len(), 6);
    assert!(schedule.iter().all(|e| e.status == ScheduleStatus::Pending));

    let pairs: HashSet<_> = schedule
        .iter()
        .map(|e| {
            let mut pair = [e.team_a.id.clone(), e.team_b.id.clone()];
            pair.sort();
            pair
        })
        .collect();
    assert_eq!(pairs.len(), 6);

    let standings = manager.list_standings(&tournament.id).await.unwrap();
    assert_eq!(standings.len(), 4);
    assert!(standings.iter().all(|s| s.points == 0 && s.wins == 0));

    // Round-robin tournaments have no bracket
    assert!(manager.list_bracket(&tournament.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_results_update_standings_once() {
    let (_, manager, tournament) = setup(TournamentFormat::RoundRobin, 3, 4, 1).await;
    let tid = tournament.id.as_str();
    manager.generate_structure(Some(&admin()), tid).await.unwrap();

    let entry = manager.list_schedule(tid).await.unwrap().remove(0);
    let (winner, loser) = (entry.team_a.id.clone(), entry.team_b.id.clone());

    manager
        .report_round_robin_result(Some(&admin()), tid, &entry.id, &winner, &loser)
        .await
        .unwrap();

    let standings = manager.list_standings(tid).await.unwrap();
    assert_eq!(standings[0].team_id, winner);
    assert_eq!((standings[0].wins, standings[0].points), (1, 3));
    let loser_row = standings.iter().find(|s| s.team_id == loser).unwrap();
    assert_eq!((loser_row.losses, loser_row.points), (1, 0));

    let err = manager
        .report_round_robin_result(Some(&admin()), tid, &entry.id, &loser, &winner)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FailedPrecondition);

    let after = manager.list_standings(tid).await.unwrap();
    assert_eq!(after, standings);
}

#[tokio::test]
async fn test_report_validation() {
    let (_, manager, tournament) = setup(TournamentFormat::RoundRobin, 3, 4, 1).await;
    let tid = tournament.id.as_str();
    manager.generate_structure(Some(&admin()), tid).await.unwrap();

    let err = manager
        .report_round_robin_result(Some(&admin()), tid, "rr5-6", "team00", "team01")
        .await
        .unwrap_err();
    assert!(matches!(err, TournamentError::ScheduleEntryMissing(_)));
    assert_eq!(err.code(), ErrorCode::FailedPrecondition);

    let err = manager
        .report_round_robin_result(Some(&admin()), tid, "rr0-1", "team00", "team00")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);

    let err = manager
        .report_round_robin_result(None, tid, "rr0-1", "team00", "team01")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unauthenticated);
}

#[tokio::test]
async fn test_last_result_crowns_standings_leader() {
    let (_, manager, tournament) = setup(TournamentFormat::RoundRobin, 4, 4, 1).await;
    let tid = tournament.id.as_str();
    manager.generate_structure(Some(&admin()), tid).await.unwrap();

    // The team earlier in the roster wins every meeting: team00 wins all three
    let schedule = manager.list_schedule(tid).await.unwrap();
    let mut champion = None;
    for entry in &schedule {
        let outcome = manager
            .report_round_robin_result(
                Some(&admin()),
                tid,
                &entry.id,
                &entry.team_a.id,
                &entry.team_b.id,
            )
            .await
            .unwrap();
        champion = outcome.champion;
    }

    assert_eq!(champion.as_deref(), Some("team00"));

    let finished = manager.get_tournament(tid).await.unwrap();
    assert_eq!(finished.status, TournamentStatus::Completed);
    assert_eq!(finished.winner_id.as_deref(), Some("team00"));

    let table = manager.list_standings(tid).await.unwrap();
    let points: Vec<_> = table.iter().map(|s| s.points).collect();
    assert_eq!(points, vec![9, 6, 3, 0]);
    assert!(table.iter().all(|s| s.wins + s.losses == 3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reports_count_once() {
    let (_, manager, tournament) = setup(TournamentFormat::RoundRobin, 3, 3, 1).await;
    let tid = tournament.id.clone();
    manager.generate_structure(Some(&admin()), &tid).await.unwrap();

    let entry = manager.list_schedule(&tid).await.unwrap().remove(0);
    let (a, b) = (entry.team_a.id.clone(), entry.team_b.id.clone());

    // Each side reports itself as the winner at the same time
    let handles: Vec<_> = [(a.clone(), b.clone()), (b.clone(), a.clone())]
        .into_iter()
        .map(|(winner, loser)| {
            let manager = manager.clone();
            let tid = tid.clone();
            let entry_id = entry.id.clone();
            tokio::spawn(async move {
                manager
                    .report_round_robin_result(Some(&admin()), &tid, &entry_id, &winner, &loser)
                    .await
            })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(outcome) => {
                successes += 1;
                assert!(outcome.champion.is_none());
            }
            Err(err) => assert!(
                matches!(err, TournamentError::MatchAlreadyDecided(_)),
                "unexpected error: {err:?}"
            ),
        }
    }
    assert_eq!(successes, 1);

    let standings = manager.list_standings(&tid).await.unwrap();
    assert_eq!(standings.iter().map(|s| s.wins).sum::<u32>(), 1);
    assert_eq!(standings.iter().map(|s| s.losses).sum::<u32>(), 1);
    assert_eq!(standings.iter().map(|s| s.points).sum::<u32>(), 3);

    let leader = &standings[0];
    assert!(leader.team_id == a || leader.team_id == b);
    assert_eq!((leader.wins, leader.points), (1, 3));

    let schedule = manager.list_schedule(&tid).await.unwrap();
    let decided = schedule.iter().find(|e| e.id == entry.id).unwrap();
    assert_eq!(decided.status, ScheduleStatus::Completed);
    assert_eq!(decided.winner_id.as_ref(), Some(&leader.team_id));
}
