//! Monte Carlo Tree Search.
//!
//! The tree lives in a flat arena for the duration of one `search` call;
//! parent/child edges are indices, nothing is freed mid-search.
//! Selection follows PUCT with the child value rescaled to the parent's
//! benefit, expansion asks the oracle for priors over the legal actions,
//! and values backpropagate with alternating sign. Threefold repetition
//! is tracked against a scratch clone of the driver's repetition map,
//! re-cloned for every descent.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_distr::{Distribution, Gamma};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::config::TrainerConfig;
use crate::error::CoreError;
use crate::movegen::{self, LegalMoves};
use crate::moves::{Action, ACTION_SIZE};
use crate::oracle::{mask_and_normalize, Oracle};
use crate::position::Position;
use crate::status;
use crate::transition;

/// Occurrence counts keyed by Zobrist hash. The self-play driver owns
/// the authoritative map; the search only ever sees clones.
pub type RepetitionMap = HashMap<u64, u8>;

/// Arena node. Identity is the index into the arena vector.
pub struct Node {
    /// Action that led here; `None` for the root.
    pub action_taken: Option<Action>,
    /// Prior probability from the masked policy.
    pub prior: f32,
    pub visit_count: u32,
    pub value_sum: f32,
    /// Position after `action_taken`, owned by the node.
    pub position: Position,
    pub parent: Option<usize>,
    /// Child indices in ascending action order.
    pub children: Vec<usize>,
    /// Did the edge into this node clear the repetition window?
    pub resets_repetition: bool,
}

/// Single-threaded PUCT searcher.
pub struct Mcts {
    num_searches: usize,
    c_puct: f32,
    dirichlet_epsilon: f64,
    history_length: usize,
    arena: Vec<Node>,
    noise_dist: Gamma<f64>,
    rng: Xoshiro256PlusPlus,
}

impl Mcts {
    /// Build a searcher from the config, seeding its private PRNG.
    pub fn new(config: &TrainerConfig, seed: u64) -> Result<Mcts, CoreError> {
        config.validate()?;
        let noise_dist = Gamma::new(config.dirichlet_alpha, 1.0).map_err(|e| {
            CoreError::InvariantViolation(format!("invalid dirichlet alpha: {e}"))
        })?;
        Ok(Mcts {
            num_searches: config.num_searches,
            c_puct: config.c_puct as f32,
            dirichlet_epsilon: config.dirichlet_epsilon,
            history_length: config.history_length,
            arena: Vec::with_capacity(4 * config.num_searches),
            noise_dist,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        })
    }

    /// Run the configured number of iterations from `root` and return
    /// the normalised visit distribution over the root actions.
    pub fn search<O: Oracle>(
        &mut self,
        oracle: &mut O,
        root: &Position,
        repetition_map: &RepetitionMap,
    ) -> Result<[f32; ACTION_SIZE], CoreError> {
        self.arena.clear();
        self.arena.push(Node {
            action_taken: None,
            prior: 1.0,
            visit_count: 1,
            value_sum: 0.0,
            position: root.clone(),
            parent: None,
            children: Vec::new(),
            resets_repetition: false,
        });

        let root_legal = movegen::legal_moves(root);
        self.guard_king(&root_legal, 0)?;

        // Root evaluation: mask, renormalise, then mix exploration noise
        // over the legal actions.
        let root_history = vec![root.clone(); self.history_length];
        let eval = oracle.evaluate(&root_history).map_err(CoreError::Oracle)?;
        let mut policy = mask_and_normalize(&eval.policy, &root_legal);
        self.mix_root_noise(&mut policy, &root_legal);
        self.expand(0, &policy)?;

        for _ in 0..self.num_searches {
            let mut scratch = repetition_map.clone();
            let leaf = self.select_leaf(&mut scratch);

            let leaf_legal = movegen::legal_moves(&self.arena[leaf].position);
            self.guard_king(&leaf_legal, leaf)?;

            let (terminal_value, terminal) =
                status::evaluate(&self.arena[leaf].position, Some(&leaf_legal));
            let value = if terminal {
                f32::from(terminal_value)
            } else {
                let history = self.history_window(leaf);
                let eval = oracle.evaluate(&history).map_err(CoreError::Oracle)?;
                let leaf_policy = mask_and_normalize(&eval.policy, &leaf_legal);
                self.expand(leaf, &leaf_policy)?;
                eval.value
            };

            self.backpropagate(leaf, value);
        }

        let mut probs = [0.0f32; ACTION_SIZE];
        let mut sum = 0.0f32;
        for &child in &self.arena[0].children {
            let node = &self.arena[child];
            if let Some(action) = node.action_taken {
                probs[action] = node.visit_count as f32;
                sum += node.visit_count as f32;
            }
        }
        if sum > 0.0 {
            for p in probs.iter_mut() {
                *p /= sum;
            }
        }
        Ok(probs)
    }

    /// A generator reporting the opposing king as capturable means the
    /// previous ply failed to end the game. Dump and abort.
    fn guard_king(&self, legal: &LegalMoves, node: usize) -> Result<(), CoreError> {
        if legal.king_captured {
            let dump = format!(
                "opposing king capturable during search\n{}",
                self.arena[node].position
            );
            log::error!("{dump}");
            return Err(CoreError::InvariantViolation(dump));
        }
        Ok(())
    }

    /// PUCT descent. Updates the scratch repetition map along the path
    /// and writes the resulting tag into each visited node's position so
    /// terminal detection sees it.
    fn select_leaf(&mut self, scratch: &mut RepetitionMap) -> usize {
        let mut idx = 0;
        loop {
            if self.arena[idx].children.is_empty() {
                return idx;
            }
            let parent_visits = self.arena[idx].visit_count;
            let mut best = self.arena[idx].children[0];
            let mut best_score = f32::NEG_INFINITY;
            for &child in &self.arena[idx].children {
                let score = self.puct(&self.arena[child], parent_visits);
                if score > best_score {
                    best_score = score;
                    best = child;
                }
            }
            idx = best;

            if self.arena[idx].resets_repetition {
                scratch.clear();
            }
            let count = scratch
                .entry(self.arena[idx].position.zobrist)
                .or_insert(0);
            *count = count.saturating_add(1);
            let count = *count;
            self.arena[idx].position.set_repetition_tag(count);
        }
    }

    /// Parent-benefit PUCT score. Unvisited children score a neutral Q.
    fn puct(&self, child: &Node, parent_visits: u32) -> f32 {
        let q = if child.visit_count == 0 {
            0.5
        } else {
            (1.0 - child.value_sum / child.visit_count as f32) / 2.0
        };
        q + self.c_puct * child.prior * (parent_visits as f32).sqrt()
            / (1.0 + child.visit_count as f32)
    }

    /// Create one child per action with positive prior, in ascending
    /// action order. Ascending order is what makes selection ties
    /// deterministic.
    fn expand(&mut self, leaf: usize, policy: &[f32; ACTION_SIZE]) -> Result<(), CoreError> {
        let parent_position = self.arena[leaf].position.clone();
        for (action, &prior) in policy.iter().enumerate() {
            if prior <= 0.0 {
                continue;
            }
            let (position, resets_repetition) = transition::apply(&parent_position, action)?;
            let child_idx = self.arena.len();
            self.arena.push(Node {
                action_taken: Some(action),
                prior,
                visit_count: 0,
                value_sum: 0.0,
                position,
                parent: Some(leaf),
                children: Vec::new(),
                resets_repetition,
            });
            self.arena[leaf].children.push(child_idx);
        }
        Ok(())
    }

    /// Walk parent links to the value sink, negating per step: the leaf
    /// stores the value from its own mover's perspective.
    fn backpropagate(&mut self, leaf: usize, mut value: f32) {
        let mut idx = Some(leaf);
        while let Some(i) = idx {
            let node = &mut self.arena[i];
            node.visit_count += 1;
            node.value_sum += value;
            value = -value;
            idx = node.parent;
        }
    }

    /// The last `T` positions ending at `node`, oldest first, padded
    /// with copies of the oldest when the path is shorter than `T`.
    fn history_window(&self, node: usize) -> Vec<Position> {
        let mut window = Vec::with_capacity(self.history_length);
        let mut idx = Some(node);
        while let Some(i) = idx {
            if window.len() == self.history_length {
                break;
            }
            window.push(self.arena[i].position.clone());
            idx = self.arena[i].parent;
        }
        while window.len() < self.history_length {
            let oldest = window[window.len() - 1].clone();
            window.push(oldest);
        }
        window.reverse();
        window
    }

    /// Mix a Dirichlet sample over the legal actions into the policy.
    fn mix_root_noise(&mut self, policy: &mut [f32; ACTION_SIZE], legal: &LegalMoves) {
        if self.dirichlet_epsilon <= 0.0 {
            return;
        }
        let actions: Vec<Action> = legal.actions().collect();
        if actions.is_empty() {
            return;
        }
        let noise = self.sample_dirichlet(actions.len());
        let eps = self.dirichlet_epsilon as f32;
        for (i, &action) in actions.iter().enumerate() {
            policy[action] = (1.0 - eps) * policy[action] + eps * noise[i] as f32;
        }
    }

    /// Dirichlet(alpha) over `k` categories: normalised Gamma draws.
    fn sample_dirichlet(&mut self, k: usize) -> Vec<f64> {
        let mut samples: Vec<f64> = (0..k)
            .map(|_| self.noise_dist.sample(&mut self.rng))
            .collect();
        let sum: f64 = samples.iter().sum();
        if sum > 0.0 {
            for s in samples.iter_mut() {
                *s /= sum;
            }
        } else {
            let uniform = 1.0 / k as f64;
            for s in samples.iter_mut() {
                *s = uniform;
            }
        }
        samples
    }
}
