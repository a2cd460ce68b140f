//! MCTS search statistics for diagnostics and tuning.

use serde::{Deserialize, Serialize};

/// Counters collected while a search runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Completed simulations.
    pub simulations: u32,

    /// Nodes created (root included).
    pub nodes_created: u32,

    /// Expansions whose masked priors summed to zero.
    pub uniform_fallbacks: u32,

    /// Simulations that ended on a finished or blocked position.
    pub terminal_hits: u32,

    /// Maximum depth reached during search.
    pub max_depth: u16,

    /// Total time spent searching (microseconds).
    pub time_us: u64,
}

impl SearchStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all statistics to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Calculate simulations per second.
    #[must_use]
    pub fn simulations_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            self.simulations as f64 / (self.time_us as f64 / 1_000_000.0)
        }
    }

    /// Fraction of simulations that reached a terminal position.
    #[must_use]
    pub fn terminal_ratio(&self) -> f64 {
        if self.simulations == 0 {
            0.0
        } else {
            self.terminal_hits as f64 / self.simulations as f64
        }
    }
}
