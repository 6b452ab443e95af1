//! Tournament structure generation and result propagation.
//!
//! This module provides:
//! - Tournament creation and team registration with capacity control
//! - Single-elimination bracket generation with byes
//! - Round-robin schedule and standings generation
//! - Bracket result propagation along `next_match_id` links
//! - Round-robin result reporting and standings maintenance
//!
//! Every operation that touches more than one document runs as a single
//! store transaction, so concurrent callers never observe a half-applied
//! change.
//!
//! ## Example
//!
//! ```no_run
//! use tourney::store::{DocumentStore, MemoryStore};
//! use tourney::tournament::{Actor, NewTournament, Role, TournamentFormat, TournamentManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
//!     let manager = TournamentManager::new(store);
//!     let admin = Actor::new("admin-1", Role::Admin);
//!
//!     let tournament = manager
//!         .create_tournament(
//!             Some(&admin),
//!             NewTournament {
//!                 name: "Spring Cup".to_string(),
//!                 format: TournamentFormat::SingleElimination,
//!                 max_teams: 8,
//!             },
//!         )
//!         .await?;
//!
//!     // ...teams register, then:
//!     let summary = manager.generate_structure(Some(&admin), &tournament.id).await?;
//!     println!("{} matches in {} rounds", summary.matches, summary.rounds);
//!
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod bracket;
pub mod config;
pub mod errors;
pub mod manager;
pub mod models;
pub mod paths;
pub mod propagator;
pub mod registration;
pub mod round_robin;
pub mod standings;
pub mod structure;

pub use actor::{Actor, Role};
pub use bracket::BracketBuilder;
pub use config::EngineConfig;
pub use errors::{ErrorCode, TournamentError, TournamentResult};
pub use manager::TournamentManager;
pub use models::{
    BracketMatch, MatchStatus, NewTournament, RegisteredTeam, ScheduleEntry, ScheduleStatus,
    ScoringRules, Standing, StructureSummary, TeamId, TeamProfile, TeamRole, TeamSlot, Tournament,
    TournamentFormat, TournamentId, TournamentStatus,
};
pub use propagator::{Propagation, ResultPropagator};
pub use registration::TeamRegistry;
pub use round_robin::RoundRobinScheduler;
pub use standings::{RoundRobinOutcome, StandingsUpdater};
pub use structure::StructureGenerator;
