//! Error types for the self-play core.
//!
//! A lost game is a value, never an error; these variants cover genuine
//! engine defects and oracle failures only.

use std::error::Error;
use std::fmt;

/// Fatal conditions surfaced by the search and self-play core.
#[derive(Debug)]
pub enum CoreError {
    /// A structural invariant of the position or search broke: bitboard
    /// overlap, a missing king, or a generator that reported the opposing
    /// king as capturable. The payload carries a position dump.
    InvariantViolation(String),

    /// An action outside `[0, 4672)`, or one that decodes to an empty or
    /// enemy-occupied from-square.
    BadAction(usize),

    /// The oracle failed to evaluate or train.
    Oracle(anyhow::Error),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvariantViolation(msg) => write!(f, "invariant violation: {msg}"),
            CoreError::BadAction(action) => write!(f, "bad action index: {action}"),
            CoreError::Oracle(e) => write!(f, "oracle failure: {e}"),
        }
    }
}

impl Error for CoreError {}

impl From<anyhow::Error> for CoreError {
    fn from(e: anyhow::Error) -> Self {
        CoreError::Oracle(e)
    }
}
