//! Engine configuration: transaction retries, scoring and bracket seeding.

use super::models::ScoringRules;
use crate::store::RetryPolicy;
use std::env;
use std::time::Duration;

/// Tournament engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineConfig {
    /// Retry policy for every store transaction
    pub retry: RetryPolicy,

    /// Points awarded per round-robin outcome
    pub scoring: ScoringRules,

    /// Fixed bracket shuffle seed; `None` draws fresh entropy per generation
    pub shuffle_seed: Option<u64>,
}

impl EngineConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `TX_MAX_ATTEMPTS`: Transaction attempts before giving up (default: 8)
    /// - `TX_BACKOFF_MS`: Base retry backoff in milliseconds (default: 5)
    /// - `POINTS_PER_WIN`: Round-robin points for a win (default: 3)
    /// - `POINTS_PER_DRAW`: Round-robin points for a draw (default: 1)
    /// - `POINTS_PER_LOSS`: Round-robin points for a loss (default: 0)
    /// - `BRACKET_SEED`: Fixed bracket shuffle seed (default: unset)
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            retry: RetryPolicy::new(
                parse_env_or("TX_MAX_ATTEMPTS", defaults.retry.max_attempts),
                Duration::from_millis(parse_env_or(
                    "TX_BACKOFF_MS",
                    defaults.retry.base_backoff.as_millis() as u64,
                )),
            ),
            scoring: ScoringRules {
                points_per_win: parse_env_or("POINTS_PER_WIN", defaults.scoring.points_per_win),
                points_per_draw: parse_env_or("POINTS_PER_DRAW", defaults.scoring.points_per_draw),
                points_per_loss: parse_env_or("POINTS_PER_LOSS", defaults.scoring.points_per_loss),
            },
            shuffle_seed: env::var("BRACKET_SEED").ok().and_then(|v| v.parse().ok()),
        }
    }
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
