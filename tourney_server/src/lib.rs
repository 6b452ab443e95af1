//! HTTP server for the tourney engine.
//!
//! Exposes tournament creation, registration, structure generation and
//! result reporting as JSON endpoints over a [`tourney::TournamentManager`].

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
