//! MCTS configuration parameters.

use serde::{Deserialize, Serialize};

/// Per-decision search parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MCTSConfig {
    /// Simulations run before a move is chosen.
    pub simulations: u32,

    /// PUCT exploration constant.
    /// Higher values weight priors and visit uncertainty over observed value.
    pub cpuct: f32,

    /// Sampling temperature for the final move choice.
    /// 0 picks (one of) the most-visited moves, 1 samples proportionally.
    pub temperature: f32,
}

impl Default for MCTSConfig {
    fn default() -> Self {
        Self {
            simulations: 50,
            cpuct: 1.0,
            temperature: 1.0,
        }
    }
}

impl MCTSConfig {
    /// Set the simulation budget.
    pub fn with_simulations(mut self, simulations: u32) -> Self {
        self.simulations = simulations;
        self
    }

    /// Set the exploration constant.
    pub fn with_cpuct(mut self, cpuct: f32) -> Self {
        self.cpuct = cpuct;
        self
    }

    /// Set the sampling temperature (negative values clamp to 0).
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.max(0.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MCTSConfig::default();
        assert_eq!(config.simulations, 50);
        assert_eq!(config.cpuct, 1.0);
        assert_eq!(config.temperature, 1.0);
    }

    #[test]
    fn test_builder_pattern() {
        let config = MCTSConfig::default()
            .with_simulations(400)
            .with_cpuct(1.5)
            .with_temperature(-1.0);

        assert_eq!(config.simulations, 400);
        assert_eq!(config.cpuct, 1.5);
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn test_serialization() {
        let config = MCTSConfig::default().with_simulations(7);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: MCTSConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
