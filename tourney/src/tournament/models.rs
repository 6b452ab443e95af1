//! Tournament data models: tournaments, teams, bracket matches, round-robin
//! schedule entries and standings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tournament ID type
pub type TournamentId = String;

/// Team ID type
pub type TeamId = String;

/// Tournament format.
///
/// Stored as its kebab-case name. Unknown names are preserved as
/// [`TournamentFormat::Other`] so that generation can report them as
/// unsupported instead of failing to load the tournament.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TournamentFormat {
    SingleElimination,
    RoundRobin,
    Other(String),
}

impl TournamentFormat {
    pub fn as_str(&self) -> &str {
        match self {
            TournamentFormat::SingleElimination => "single-elimination",
            TournamentFormat::RoundRobin => "round-robin",
            TournamentFormat::Other(name) => name,
        }
    }
}

impl From<String> for TournamentFormat {
    fn from(name: String) -> Self {
        match name.as_str() {
            "single-elimination" => TournamentFormat::SingleElimination,
            "round-robin" => TournamentFormat::RoundRobin,
            _ => TournamentFormat::Other(name),
        }
    }
}

impl From<TournamentFormat> for String {
    fn from(format: TournamentFormat) -> Self {
        match format {
            TournamentFormat::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tournament lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Accepting registrations
    Upcoming,
    /// Structure generated, results being reported
    Ongoing,
    /// Winner decided
    Completed,
}

/// Tournament document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub format: TournamentFormat,
    pub max_teams: usize,
    pub status: TournamentStatus,
    pub winner_id: Option<TeamId>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Parameters for a new tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTournament {
    pub name: String,
    pub format: TournamentFormat,
    pub max_teams: usize,
}

/// Role a user holds inside a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Founder,
    Coach,
    Player,
}

impl TeamRole {
    /// Whether this role may enter the team into tournaments
    pub fn can_register(self) -> bool {
        matches!(self, TeamRole::Founder | TeamRole::Coach)
    }
}

/// Team profile owned by the team registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamProfile {
    pub id: TeamId,
    pub name: String,
    pub avatar: Option<String>,
    /// Member uid to team role
    #[serde(default)]
    pub members: BTreeMap<String, TeamRole>,
}

/// Team entered into a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredTeam {
    pub id: TeamId,
    pub name: String,
    pub avatar: Option<String>,
    pub registered_at: DateTime<Utc>,
}

/// Team seated in a match slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSlot {
    pub id: TeamId,
    pub name: String,
    pub avatar: Option<String>,
}

impl From<&RegisteredTeam> for TeamSlot {
    fn from(team: &RegisteredTeam) -> Self {
        Self {
            id: team.id.clone(),
            name: team.name.clone(),
            avatar: team.avatar.clone(),
        }
    }
}

/// Bracket match state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Both teams seated, waiting for a result
    Pending,
    /// One team seated (or a bye)
    AwaitingOpponent,
    /// Later-round match with no team seated yet
    Locked,
    /// Result reported
    Completed,
}

/// Single-elimination bracket match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketMatch {
    pub id: String,
    /// 1-based round number
    pub round: u32,
    pub team_a: Option<TeamSlot>,
    pub team_b: Option<TeamSlot>,
    /// Match the winner advances into; `None` only for the final
    pub next_match_id: Option<String>,
    /// Previous-round matches linked into this one (0 in round 1)
    pub feeder_count: u8,
    pub status: MatchStatus,
    pub winner_id: Option<TeamId>,
}

impl BracketMatch {
    /// Stable id for the `index`-th match of `round`
    pub fn id_for(round: u32, index: usize) -> String {
        format!("r{round}m{index}")
    }

    /// Slot holding the team with `team_id`, if any
    pub fn slot_of(&self, team_id: &str) -> Option<&TeamSlot> {
        [&self.team_a, &self.team_b]
            .into_iter()
            .flatten()
            .find(|slot| slot.id == team_id)
    }

    /// Seat `team` in the first empty slot and derive the new status.
    ///
    /// Returns `false` when both slots are already taken.
    pub fn seat(&mut self, team: TeamSlot) -> bool {
        if self.team_a.is_none() {
            self.team_a = Some(team);
        } else if self.team_b.is_none() {
            self.team_b = Some(team);
        } else {
            return false;
        }
        self.refresh_status();
        true
    }

    fn refresh_status(&mut self) {
        self.status = match (&self.team_a, &self.team_b) {
            (Some(_), Some(_)) => MatchStatus::Pending,
            (None, None) => MatchStatus::Locked,
            _ => MatchStatus::AwaitingOpponent,
        };
    }
}

/// Round-robin schedule entry state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Pending,
    Completed,
}

/// One pairing of a round-robin schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: String,
    pub team_a: TeamSlot,
    pub team_b: TeamSlot,
    pub status: ScheduleStatus,
    pub winner_id: Option<TeamId>,
}

impl ScheduleEntry {
    /// Stable id for the pairing of roster positions `i < j`
    pub fn id_for(i: usize, j: usize) -> String {
        format!("rr{i}-{j}")
    }

    /// Whether `team_id` plays in this entry
    pub fn involves(&self, team_id: &str) -> bool {
        self.team_a.id == team_id || self.team_b.id == team_id
    }
}

/// Round-robin standings row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub team_id: TeamId,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub points: u32,
}

impl Standing {
    pub fn zeroed(team_id: impl Into<TeamId>) -> Self {
        Self {
            team_id: team_id.into(),
            wins: 0,
            losses: 0,
            draws: 0,
            points: 0,
        }
    }

    /// Ranking order: points, then wins, then fewest losses, then team id
    pub fn ranking(a: &Standing, b: &Standing) -> std::cmp::Ordering {
        b.points
            .cmp(&a.points)
            .then(b.wins.cmp(&a.wins))
            .then(a.losses.cmp(&b.losses))
            .then(a.team_id.cmp(&b.team_id))
    }
}

/// Points awarded per round-robin outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRules {
    pub points_per_win: u32,
    pub points_per_draw: u32,
    pub points_per_loss: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            points_per_win: 3,
            points_per_draw: 1,
            points_per_loss: 0,
        }
    }
}

/// Outcome of structure generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureSummary {
    pub format: TournamentFormat,
    pub teams: usize,
    /// Bracket matches or schedule entries written
    pub matches: usize,
    /// Bracket rounds (1 for a round-robin)
    pub rounds: u32,
}
