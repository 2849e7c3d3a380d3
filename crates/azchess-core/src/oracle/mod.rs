//! The oracle boundary.
//!
//! Everything the core needs from the policy/value network: batch
//! evaluation of a position history and gradient steps on training
//! examples. The core never sees a tensor; it hands over typed position
//! snapshots and receives a dense policy plus a scalar value. Root
//! Dirichlet noise is sampled by the search itself from its own PRNG, so
//! oracles stay stateless about exploration.

use anyhow::Result;

use crate::movegen::LegalMoves;
use crate::moves::ACTION_SIZE;
use crate::position::Position;
use crate::selfplay::TrainingExample;

/// Policy and value for one evaluated history.
pub struct Evaluation {
    /// Dense probabilities over the 4672 actions. Not yet masked.
    pub policy: [f32; ACTION_SIZE],
    /// Expected outcome in `[-1, 1]` from the mover's perspective.
    pub value: f32,
}

/// External policy/value network plus trainer.
pub trait Oracle {
    /// Evaluate a chronological history of positions ending at the
    /// position to score. The caller pads short histories itself.
    fn evaluate(&mut self, history: &[Position]) -> Result<Evaluation>;

    /// One gradient step on a batch of examples.
    fn train_batch(&mut self, batch: &[TrainingExample]) -> Result<()>;

    /// Persist the model after a training iteration. Serialisation is
    /// entirely the oracle's concern; the default keeps nothing.
    fn checkpoint(&mut self, iteration: usize) -> Result<()> {
        let _ = iteration;
        Ok(())
    }
}

/// Zero out illegal actions and renormalise. Falls back to uniform over
/// the legal actions when the network puts no mass on any of them.
pub fn mask_and_normalize(policy: &[f32; ACTION_SIZE], legal: &LegalMoves) -> [f32; ACTION_SIZE] {
    let mut masked = [0.0f32; ACTION_SIZE];
    let mut sum = 0.0f32;
    for (action, &p) in policy.iter().enumerate() {
        if legal.contains(action) && p > 0.0 {
            masked[action] = p;
            sum += p;
        }
    }
    if sum > 0.0 {
        for p in masked.iter_mut() {
            *p /= sum;
        }
    } else {
        let count = legal.count();
        if count > 0 {
            let uniform = 1.0 / count as f32;
            for action in legal.actions() {
                masked[action] = uniform;
            }
        }
    }
    masked
}

/// Flat-prior oracle: uniform policy, neutral value. Used by tests and
/// as the stand-in network for demonstration games.
#[derive(Debug, Default, Clone, Copy)]
pub struct UniformOracle;

impl Oracle for UniformOracle {
    fn evaluate(&mut self, _history: &[Position]) -> Result<Evaluation> {
        Ok(Evaluation {
            policy: [1.0 / ACTION_SIZE as f32; ACTION_SIZE],
            value: 0.0,
        })
    }

    fn train_batch(&mut self, _batch: &[TrainingExample]) -> Result<()> {
        Ok(())
    }
}
