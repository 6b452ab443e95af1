//! # Tourney
//!
//! Tournament structure generation and result propagation for competitive
//! team play.
//!
//! Once registration closes, an upcoming tournament is turned into either a
//! single-elimination bracket (with byes when the team count is not a power
//! of two) or a round-robin schedule with a standings table. Reported
//! results then advance winners through the bracket, or update standings,
//! until a champion is crowned.
//!
//! ## Core Modules
//!
//! - [`store`]: Transactional document store contract, in-memory and PostgreSQL backends
//! - [`tournament`]: Tournament lifecycle, bracket and round-robin engines
//!
//! ## Example
//!
//! ```
//! use tourney::tournament::{BracketBuilder, RegisteredTeam};
//! use chrono::Utc;
//!
//! let teams: Vec<RegisteredTeam> = ["red", "blue", "green"]
//!     .into_iter()
//!     .map(|id| RegisteredTeam {
//!         id: id.to_string(),
//!         name: id.to_uppercase(),
//!         avatar: None,
//!         registered_at: Utc::now(),
//!     })
//!     .collect();
//!
//! let bracket = BracketBuilder::new().build(&teams).unwrap();
//! assert_eq!(bracket.len(), 2);
//! ```

/// Transactional document store.
pub mod store;
pub use store::{DocumentStore, MemoryStore, PgDocumentStore, RetryPolicy, StoreError};

/// Tournament lifecycle and engines.
pub mod tournament;
pub use tournament::{
    Actor, EngineConfig, ErrorCode, Role, TournamentError, TournamentManager, TournamentResult,
};
