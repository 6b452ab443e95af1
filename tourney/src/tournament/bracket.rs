//! Single-elimination bracket construction.
//!
//! Teams are shuffled, paired into round-one matches, and later rounds are
//! stacked on top until a single final remains. Every match points at the
//! match its winner advances into through `next_match_id`, so reporting a
//! result never needs round/index arithmetic.

use super::errors::{TournamentError, TournamentResult};
use super::models::{BracketMatch, MatchStatus, RegisteredTeam, TeamSlot};
use rand::Rng;
use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;

/// Fewest teams a bracket can be built for
pub const MIN_TEAMS: usize = 2;

/// Builds bracket match trees from a roster
pub struct BracketBuilder<R: Rng> {
    rng: R,
}

impl BracketBuilder<ThreadRng> {
    /// Builder shuffling with the thread-local generator
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }
}

impl Default for BracketBuilder<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> BracketBuilder<R> {
    /// Builder shuffling with `rng`; a seeded generator yields reproducible brackets
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Build every match of the bracket, round by round.
    ///
    /// Round one pairs consecutive teams of the shuffled roster; an odd team
    /// out gets a bye, recorded as an `AwaitingOpponent` match whose winner is
    /// already set. Byes are carried into their next-round match as the
    /// rounds are built. A next-round match with a single feeder can never be
    /// filled twice, so when that feeder is a bye the match becomes a bye
    /// itself and the team keeps cascading.
    ///
    /// # Errors
    ///
    /// * `TournamentError::InsufficientTeams` - fewer than two teams
    pub fn build(&mut self, teams: &[RegisteredTeam]) -> TournamentResult<Vec<BracketMatch>> {
        if teams.len() < MIN_TEAMS {
            return Err(TournamentError::InsufficientTeams {
                needed: MIN_TEAMS,
                current: teams.len(),
            });
        }

        let mut seeded: Vec<TeamSlot> = teams.iter().map(TeamSlot::from).collect();
        seeded.shuffle(&mut self.rng);

        let mut current: Vec<BracketMatch> = seeded
            .chunks(2)
            .enumerate()
            .map(|(index, pair)| opening_match(index, &pair[0], pair.get(1)))
            .collect();

        let mut bracket = Vec::with_capacity(teams.len());
        let mut round = 1;

        while current.len() > 1 {
            round += 1;
            let mut next: Vec<BracketMatch> = (0..current.len().div_ceil(2))
                .map(|index| BracketMatch {
                    id: BracketMatch::id_for(round, index),
                    round,
                    team_a: None,
                    team_b: None,
                    next_match_id: None,
                    feeder_count: if 2 * index + 1 < current.len() { 2 } else { 1 },
                    status: MatchStatus::Locked,
                    winner_id: None,
                })
                .collect();

            for (i, previous) in current.iter_mut().enumerate() {
                let target = &mut next[i / 2];
                previous.next_match_id = Some(target.id.clone());

                let Some(winner_id) = previous.winner_id.as_deref() else {
                    continue;
                };
                let winner = previous.slot_of(winner_id).cloned().ok_or_else(|| {
                    TournamentError::BrokenBracket(format!(
                        "bye winner {winner_id} is not seated in {}",
                        previous.id
                    ))
                })?;

                if target.feeder_count == 1 {
                    target.winner_id = Some(winner.id.clone());
                }
                if i % 2 == 0 {
                    target.team_a = Some(winner);
                } else {
                    target.team_b = Some(winner);
                }
                target.status = if target.team_a.is_some() && target.team_b.is_some() {
                    MatchStatus::Pending
                } else {
                    MatchStatus::AwaitingOpponent
                };
            }

            bracket.append(&mut current);
            current = next;
        }

        bracket.append(&mut current);
        Ok(bracket)
    }
}

fn opening_match(index: usize, team_a: &TeamSlot, team_b: Option<&TeamSlot>) -> BracketMatch {
    let bye = team_b.is_none();
    BracketMatch {
        id: BracketMatch::id_for(1, index),
        round: 1,
        team_a: Some(team_a.clone()),
        team_b: team_b.cloned(),
        next_match_id: None,
        feeder_count: 0,
        status: if bye {
            MatchStatus::AwaitingOpponent
        } else {
            MatchStatus::Pending
        },
        winner_id: bye.then(|| team_a.id.clone()),
    }
}

/// Number of rounds in a bracket
pub fn round_count(bracket: &[BracketMatch]) -> u32 {
    bracket.iter().map(|m| m.round).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn roster(n: usize) -> Vec<RegisteredTeam> {
        (0..n)
            .map(|i| RegisteredTeam {
                id: format!("team{i}"),
                name: format!("Team {i}"),
                avatar: None,
                registered_at: Utc::now(),
            })
            .collect()
    }

    fn build(n: usize, seed: u64) -> Vec<BracketMatch> {
        BracketBuilder::with_rng(StdRng::seed_from_u64(seed))
            .build(&roster(n))
            .unwrap()
    }

    fn round(bracket: &[BracketMatch], r: u32) -> Vec<&BracketMatch> {
        bracket.iter().filter(|m| m.round == r).collect()
    }

    fn find<'a>(bracket: &'a [BracketMatch], id: &str) -> &'a BracketMatch {
        bracket.iter().find(|m| m.id == id).unwrap()
    }

    #[test]
    fn test_rejects_fewer_than_two_teams() {
        let mut builder = BracketBuilder::new();
        let err = builder.build(&roster(1)).unwrap_err();
        assert!(matches!(
            err,
            TournamentError::InsufficientTeams {
                needed: 2,
                current: 1
            }
        ));
        assert!(builder.build(&[]).is_err());
    }

    #[test]
    fn test_two_teams_is_a_single_final() {
        let bracket = build(2, 1);
        assert_eq!(bracket.len(), 1);
        assert_eq!(bracket[0].status, MatchStatus::Pending);
        assert!(bracket[0].next_match_id.is_none());
    }

    #[test]
    fn test_four_teams_without_byes() {
        let bracket = build(4, 7);
        assert_eq!(bracket.len(), 3);
        assert_eq!(round_count(&bracket), 2);

        let first = round(&bracket, 1);
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|m| m.status == MatchStatus::Pending));
        assert!(first.iter().all(|m| m.winner_id.is_none()));
        assert!(
            first
                .iter()
                .all(|m| m.next_match_id.as_deref() == Some("r2m0"))
        );

        let final_match = find(&bracket, "r2m0");
        assert_eq!(final_match.status, MatchStatus::Locked);
        assert!(final_match.next_match_id.is_none());
        assert!(final_match.team_a.is_none() && final_match.team_b.is_none());
        assert_eq!(final_match.feeder_count, 2);
    }

    #[test]
    fn test_five_teams_with_one_bye() {
        let bracket = build(5, 42);
        assert_eq!(bracket.len(), 6);

        let first = round(&bracket, 1);
        assert_eq!(first.len(), 3);
        let pending = first
            .iter()
            .filter(|m| m.status == MatchStatus::Pending)
            .count();
        assert_eq!(pending, 2);

        let bye = find(&bracket, "r1m2");
        assert_eq!(bye.status, MatchStatus::AwaitingOpponent);
        assert!(bye.team_b.is_none());
        let bye_team = bye.team_a.clone().unwrap();
        assert_eq!(bye.winner_id.as_deref(), Some(bye_team.id.as_str()));

        assert_eq!(round(&bracket, 2).len(), 2);
        assert_eq!(round(&bracket, 3).len(), 1);

        // Bye team is already seated in its round-two target
        let target = find(&bracket, bye.next_match_id.as_deref().unwrap());
        assert_eq!(target.id, "r2m1");
        assert_eq!(target.team_a.as_ref(), Some(&bye_team));
        assert_eq!(target.status, MatchStatus::AwaitingOpponent);

        // ...and, being that match's only feeder, cascades into the final
        assert_eq!(target.feeder_count, 1);
        assert_eq!(target.winner_id.as_deref(), Some(bye_team.id.as_str()));
        let final_match = find(&bracket, "r3m0");
        assert_eq!(final_match.team_b.as_ref(), Some(&bye_team));
        assert!(final_match.team_a.is_none());
        assert_eq!(final_match.status, MatchStatus::AwaitingOpponent);
    }

    #[test]
    fn test_three_teams_bye_lands_in_final_slot_b() {
        let bracket = build(3, 3);
        assert_eq!(bracket.len(), 2);

        let bye = find(&bracket, "r1m1");
        let final_match = find(&bracket, "r2m0");
        assert_eq!(final_match.team_b, bye.team_a);
        assert!(final_match.team_a.is_none());
        assert_eq!(final_match.status, MatchStatus::AwaitingOpponent);
        assert!(final_match.winner_id.is_none());
    }

    #[test]
    fn test_six_teams_single_feeder_without_bye_stays_open() {
        let bracket = build(6, 9);
        let orphan = find(&bracket, "r2m1");
        assert_eq!(orphan.feeder_count, 1);
        assert_eq!(orphan.status, MatchStatus::Locked);
        assert!(orphan.winner_id.is_none());
    }

    #[test]
    fn test_links_form_a_tree_with_one_final() {
        for n in 2..=20 {
            let bracket = build(n, n as u64);
            let finals: Vec<_> = bracket
                .iter()
                .filter(|m| m.next_match_id.is_none())
                .collect();
            assert_eq!(finals.len(), 1, "n = {n}");
            assert_eq!(finals[0].round, round_count(&bracket));

            for m in &bracket {
                if let Some(next) = &m.next_match_id {
                    let target = find(&bracket, next);
                    assert_eq!(target.round, m.round + 1);
                }
                let feeders = bracket
                    .iter()
                    .filter(|f| f.next_match_id.as_deref() == Some(m.id.as_str()))
                    .count();
                assert_eq!(feeders, m.feeder_count as usize, "match {}", m.id);
            }

            let seated_first_round: usize = round(&bracket, 1)
                .iter()
                .map(|m| usize::from(m.team_a.is_some()) + usize::from(m.team_b.is_some()))
                .sum();
            assert_eq!(seated_first_round, n);
        }
    }

    #[test]
    fn test_seeded_builds_are_reproducible() {
        assert_eq!(build(11, 5), build(11, 5));
    }

    #[test]
    fn test_locked_matches_are_empty_and_past_round_one() {
        let bracket = build(13, 2);
        for m in bracket.iter().filter(|m| m.status == MatchStatus::Locked) {
            assert!(m.round > 1);
            assert!(m.team_a.is_none() && m.team_b.is_none());
        }
    }
}
