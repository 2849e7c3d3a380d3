//! Self-play driver and training loop.
//!
//! A game keeps the current position, a FIFO window of the last `T`
//! positions and the authoritative repetition map. Every ply runs a
//! full search, records the visit policy, samples an action through the
//! temperature and applies it. At termination each recorded step is
//! labelled with the final outcome relative to its mover and encoded
//! into a training example.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::VecDeque;

use crate::config::TrainerConfig;
use crate::encoder::{encode_state, HistorySnapshot};
use crate::error::CoreError;
use crate::mcts::{Mcts, RepetitionMap};
use crate::moves::{Action, ACTION_SIZE};
use crate::oracle::Oracle;
use crate::position::Position;
use crate::status;
use crate::transition;
use crate::types::{Color, Flags};

/// One labelled example handed to the oracle's trainer.
#[derive(Clone)]
pub struct TrainingExample {
    /// Flattened plane encoding of the history window.
    pub encoded_state: Vec<f32>,
    /// Visit-count policy from the search.
    pub policy_target: [f32; ACTION_SIZE],
    /// Final outcome relative to this step's mover.
    pub value_target: i8,
}

/// Per-ply record kept until the game ends.
struct PlyRecord {
    history: Vec<HistorySnapshot>,
    flags: Flags,
    policy: [f32; ACTION_SIZE],
    mover: Color,
}

/// Counts from one learn iteration.
#[derive(Debug, Clone, Copy, Default)]
pub struct IterationStats {
    pub games: usize,
    pub examples: usize,
}

/// Self-play trainer: owns the oracle, the config and all randomness.
pub struct Trainer<O: Oracle> {
    oracle: O,
    config: TrainerConfig,
    rng: Xoshiro256PlusPlus,
}

impl<O: Oracle> Trainer<O> {
    pub fn new(oracle: O, config: TrainerConfig) -> Result<Trainer<O>, CoreError> {
        config.validate()?;
        let rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
        Ok(Trainer {
            oracle,
            config,
            rng,
        })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    /// Play one game to termination and return its labelled examples.
    pub fn self_play(&mut self) -> Result<Vec<TrainingExample>, CoreError> {
        let mut mcts = Mcts::new(&self.config, self.rng.random())?;
        let mut position = Position::startpos();

        let mut window: VecDeque<Position> = VecDeque::with_capacity(self.config.history_length);
        for _ in 0..self.config.history_length {
            window.push_back(position.clone());
        }

        let mut repetition_map = RepetitionMap::new();
        repetition_map.insert(position.zobrist, 1);

        let mut records: Vec<PlyRecord> = Vec::new();

        loop {
            let policy = mcts.search(&mut self.oracle, &position, &repetition_map)?;

            records.push(PlyRecord {
                history: window.iter().map(HistorySnapshot::from).collect(),
                flags: window
                    .back()
                    .map(|pos| pos.flags)
                    .unwrap_or_else(Flags::initial),
                policy,
                mover: position.flags.turn,
            });

            let action = self.sample_action(&policy)?;

            let (next, reset) = transition::apply(&position, action)?;
            position = next;
            if reset {
                repetition_map.clear();
            }

            window.pop_front();
            window.push_back(position.clone());

            let count = repetition_map.entry(position.zobrist).or_insert(0);
            *count = count.saturating_add(1);
            let count = *count;
            position.set_repetition_tag(count);

            let (value, terminal) = status::evaluate(&position, None);
            if terminal {
                let terminal_mover = position.flags.turn;
                log::info!(
                    "self-play game over after {} plies, value {} for {:?}",
                    records.len(),
                    value,
                    terminal_mover
                );
                return Ok(Self::label_records(records, value, terminal_mover));
            }
        }
    }

    /// Turn the per-ply records into labelled training examples.
    fn label_records(
        records: Vec<PlyRecord>,
        value: i8,
        terminal_mover: Color,
    ) -> Vec<TrainingExample> {
        records
            .into_iter()
            .map(|record| {
                let value_target = if record.mover == terminal_mover {
                    value
                } else {
                    -value
                };
                TrainingExample {
                    encoded_state: encode_state(&record.history, &record.flags),
                    policy_target: record.policy,
                    value_target,
                }
            })
            .collect()
    }

    /// Sample an action from `policy^(1/temperature)`, renormalised.
    fn sample_action(&mut self, policy: &[f32; ACTION_SIZE]) -> Result<Action, CoreError> {
        let inv_tau = 1.0 / self.config.temperature;
        let mut tempered = [0.0f64; ACTION_SIZE];
        let mut total = 0.0f64;
        for (action, &p) in policy.iter().enumerate() {
            if p > 0.0 {
                let weight = f64::from(p).powf(inv_tau);
                tempered[action] = weight;
                total += weight;
            }
        }
        if total <= 0.0 {
            return Err(CoreError::InvariantViolation(
                "search returned an all-zero policy".to_string(),
            ));
        }

        let mut roll = self.rng.random::<f64>() * total;
        let mut last = 0;
        for (action, &weight) in tempered.iter().enumerate() {
            if weight <= 0.0 {
                continue;
            }
            last = action;
            roll -= weight;
            if roll <= 0.0 {
                return Ok(action);
            }
        }
        // Floating-point shortfall: fall back to the last viable action.
        Ok(last)
    }

    /// Shuffle the iteration memory and run the epoch/batch loop through
    /// the oracle.
    pub fn train(&mut self, memory: &mut Vec<TrainingExample>) -> Result<(), CoreError> {
        if memory.is_empty() {
            log::warn!("train called with zero examples");
            return Ok(());
        }
        memory.shuffle(&mut self.rng);
        for epoch in 1..=self.config.num_epochs {
            log::info!(
                "epoch {epoch}/{} over {} examples in batches of {}",
                self.config.num_epochs,
                memory.len(),
                self.config.batch_size
            );
            for batch in memory.chunks(self.config.batch_size) {
                self.oracle.train_batch(batch).map_err(CoreError::Oracle)?;
            }
        }
        Ok(())
    }

    /// One learn iteration: the configured number of self-play games,
    /// then training on everything they produced.
    pub fn run_iteration(&mut self) -> Result<IterationStats, CoreError> {
        let mut memory: Vec<TrainingExample> = Vec::new();
        let mut stats = IterationStats::default();
        for game in 1..=self.config.num_selfplay_iterations {
            let examples = self.self_play()?;
            log::info!("game {game}: {} examples", examples.len());
            stats.games += 1;
            stats.examples += examples.len();
            memory.extend(examples);
        }
        self.train(&mut memory)?;
        Ok(stats)
    }
}
