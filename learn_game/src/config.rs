use crate::board::Mark;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const NUM_EPISODES: usize = 100_000_usize;
pub const NUM_EVALUATION_GAMES: usize = 1_000_usize;

/// Learning rate, discount factor and exploration rate of a Q-learning agent.
///
/// All three are expected to lie in `[0, 1]`; this is not checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Hyperparameters {
            alpha: 0.5,
            gamma: 0.9,
            epsilon: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub episodes: usize,
    pub hyperparameters: Hyperparameters,
    pub epsilon_decay: f64,
    pub epsilon_min: f64,
    /// Terminal reward handed to the agent when an episode is drawn.
    pub draw_reward: f64,
    pub agent_mark: Mark,
    /// Progress is logged every `log_every` episodes; 0 disables it.
    pub log_every: usize,
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            episodes: NUM_EPISODES,
            hyperparameters: Hyperparameters {
                epsilon: 1.0,
                ..Hyperparameters::default()
            },
            epsilon_decay: 0.99995,
            epsilon_min: 0.05,
            draw_reward: 0.5,
            agent_mark: Mark::Cross,
            log_every: 10_000,
            seed: None,
        }
    }
}

impl TrainingConfig {
    /// Load a training configuration from a JSON file. Missing fields take
    /// their default values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: TrainingConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub games: usize,
    pub epsilon: f64,
    pub agent_mark: Mark,
    pub seed: Option<u64>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            games: NUM_EVALUATION_GAMES,
            epsilon: 0.0,
            agent_mark: Mark::Cross,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_reference_setup() {
        let config = TrainingConfig::default();
        assert_eq!(config.episodes, 100_000);
        assert_eq!(config.hyperparameters.alpha, 0.5);
        assert_eq!(config.hyperparameters.gamma, 0.9);
        assert_eq!(config.hyperparameters.epsilon, 1.0);
        assert_eq!(config.epsilon_min, 0.05);
        assert_eq!(config.draw_reward, 0.5);
        assert_eq!(config.agent_mark, Mark::Cross);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{
            "episodes": 500,
            "hyperparameters": { "alpha": 0.25 },
            "agent_mark": "nought",
            "seed": 7
        }"#;
        let config: TrainingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.episodes, 500);
        assert_eq!(config.hyperparameters.alpha, 0.25);
        assert_eq!(config.hyperparameters.gamma, 0.9);
        assert_eq!(config.agent_mark, Mark::Nought);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.epsilon_decay, 0.99995);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = Path::new("definitely/not/here.json");
        assert!(matches!(
            TrainingConfig::load(path),
            Err(ConfigError::FileRead { .. })
        ));
        assert_eq!(
            TrainingConfig::load_or_default(path).unwrap(),
            TrainingConfig::default()
        );
    }
}
