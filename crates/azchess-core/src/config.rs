//! Training and search configuration.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Every tunable of the self-play and training loops. The CLI populates
/// this from flags; the defaults mirror the reference setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Learn iterations (self-play phase + training phase each).
    pub num_iterations: usize,
    /// Self-play games per iteration.
    pub num_selfplay_iterations: usize,
    /// MCTS iterations per move.
    pub num_searches: usize,
    /// Training epochs over each iteration's memory.
    pub num_epochs: usize,
    /// Examples per gradient step.
    pub batch_size: usize,
    /// Visit-count sampling temperature, positive.
    pub temperature: f64,
    /// Root noise mixing weight in `[0, 1]`.
    pub dirichlet_epsilon: f64,
    /// Dirichlet concentration, positive.
    pub dirichlet_alpha: f64,
    /// PUCT exploration constant, positive.
    pub c_puct: f64,
    /// History window length `T`, in `[1, 8]`.
    pub history_length: usize,
    /// Master seed for all self-play randomness.
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_iterations: 3,
            num_selfplay_iterations: 10,
            num_searches: 500,
            num_epochs: 4,
            batch_size: 64,
            temperature: 1.0,
            dirichlet_epsilon: 0.25,
            dirichlet_alpha: 0.03,
            c_puct: 1.41,
            history_length: 8,
            seed: 0,
        }
    }
}

impl TrainerConfig {
    /// Reject configurations the loops cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.temperature <= 0.0 {
            return Err(CoreError::InvariantViolation(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.dirichlet_epsilon) {
            return Err(CoreError::InvariantViolation(format!(
                "dirichlet_epsilon must be in [0, 1], got {}",
                self.dirichlet_epsilon
            )));
        }
        if self.dirichlet_alpha <= 0.0 {
            return Err(CoreError::InvariantViolation(format!(
                "dirichlet_alpha must be positive, got {}",
                self.dirichlet_alpha
            )));
        }
        if self.c_puct <= 0.0 {
            return Err(CoreError::InvariantViolation(format!(
                "c_puct must be positive, got {}",
                self.c_puct
            )));
        }
        if !(1..=8).contains(&self.history_length) {
            return Err(CoreError::InvariantViolation(format!(
                "history_length must be in [1, 8], got {}",
                self.history_length
            )));
        }
        if self.num_searches == 0 || self.batch_size == 0 {
            return Err(CoreError::InvariantViolation(
                "num_searches and batch_size must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}
