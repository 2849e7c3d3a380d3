//! Self-play search and data-generation core for an AlphaZero-style
//! chess engine.
//!
//! The crate owns everything between the rules of chess and the oracle
//! boundary: bitboard arithmetic, the 4672-action move encoding, the
//! immutable [`Position`] value with incremental Zobrist hashing, legal
//! move generation, the pure state transition with its perspective flip,
//! repetition tracking, terminal detection, Monte Carlo Tree Search and
//! the self-play driver that assembles training examples. The neural
//! network lives behind the [`Oracle`] trait and is someone else's
//! problem.

pub mod bitboard;
pub mod config;
pub mod encoder;
pub mod error;
pub mod mcts;
pub mod movegen;
pub mod moves;
pub mod oracle;
pub mod position;
pub mod selfplay;
pub mod status;
pub mod transition;
pub mod types;

pub use config::TrainerConfig;
pub use encoder::{encode_state, HistorySnapshot};
pub use error::CoreError;
pub use mcts::{Mcts, RepetitionMap};
pub use movegen::{legal_moves, LegalMoves};
pub use moves::{decode_action, encode_action, Action, ACTION_SIZE};
pub use oracle::{mask_and_normalize, Evaluation, Oracle, UniformOracle};
pub use position::Position;
pub use selfplay::{IterationStats, Trainer, TrainingExample};
pub use types::{Color, Flags, Piece, Repetition};
