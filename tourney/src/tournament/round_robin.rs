//! Round-robin schedule construction.

use super::bracket::MIN_TEAMS;
use super::errors::{TournamentError, TournamentResult};
use super::models::{RegisteredTeam, ScheduleEntry, ScheduleStatus, Standing, TeamSlot};

/// Builds all-pairs schedules
pub struct RoundRobinScheduler;

impl RoundRobinScheduler {
    /// One pending entry per unordered pair, in roster order, and one zeroed
    /// standings row per team.
    ///
    /// # Errors
    ///
    /// * `TournamentError::InsufficientTeams` - fewer than two teams
    pub fn build_schedule(
        teams: &[RegisteredTeam],
    ) -> TournamentResult<(Vec<ScheduleEntry>, Vec<Standing>)> {
        if teams.len() < MIN_TEAMS {
            return Err(TournamentError::InsufficientTeams {
                needed: MIN_TEAMS,
                current: teams.len(),
            });
        }

        let mut schedule = Vec::with_capacity(teams.len() * (teams.len() - 1) / 2);
        for (i, team_a) in teams.iter().enumerate() {
            for (j, team_b) in teams.iter().enumerate().skip(i + 1) {
                schedule.push(ScheduleEntry {
                    id: ScheduleEntry::id_for(i, j),
                    team_a: TeamSlot::from(team_a),
                    team_b: TeamSlot::from(team_b),
                    status: ScheduleStatus::Pending,
                    winner_id: None,
                });
            }
        }

        let standings = teams.iter().map(|t| Standing::zeroed(t.id.clone())).collect();

        Ok((schedule, standings))
    }
}
