//! State-plane encoding.
//!
//! The self-play driver stores the last `T` positions as typed
//! [`HistorySnapshot`] values; this module flattens them into the dense
//! float vector the oracle consumes. Layout, all planes 64 floats in
//! square order: per snapshot 12 piece planes plus two repetition-bit
//! planes, then seven trailing planes from the current flags (colour,
//! four castle bits, total-move count / 100, half-move count / 50).

use crate::position::Position;
use crate::types::{Color, Flags, Piece, Repetition};

/// Planes per history snapshot.
pub const PLANES_PER_SNAPSHOT: usize = Piece::SLOT_COUNT + 2;

/// Trailing flag planes.
pub const FLAG_PLANES: usize = 7;

/// Board state a single history entry contributes to the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub pieces: [u64; Piece::SLOT_COUNT],
    pub repeated_state: Repetition,
}

impl From<&Position> for HistorySnapshot {
    fn from(pos: &Position) -> Self {
        HistorySnapshot {
            pieces: *pos.pieces(),
            repeated_state: pos.flags.repeated_state,
        }
    }
}

/// Spread a bitboard into an 8x8 plane, bit `i` to index `i`.
fn push_bitboard_plane(out: &mut Vec<f32>, bb: u64) {
    for sq in 0..64 {
        out.push(if (bb >> sq) & 1 == 1 { 1.0 } else { 0.0 });
    }
}

/// A plane holding one broadcast value.
fn push_constant_plane(out: &mut Vec<f32>, value: f32) {
    out.extend(std::iter::repeat(value).take(64));
}

/// Encode a history window plus the current flags into a flat vector of
/// `(history.len() * 14 + 7) * 64` floats.
pub fn encode_state(history: &[HistorySnapshot], flags: &Flags) -> Vec<f32> {
    let total_planes = history.len() * PLANES_PER_SNAPSHOT + FLAG_PLANES;
    let mut out = Vec::with_capacity(total_planes * 64);

    for snap in history {
        for &bb in &snap.pieces {
            push_bitboard_plane(&mut out, bb);
        }
        let bits = snap.repeated_state.bits();
        push_constant_plane(&mut out, (bits & 0b01) as f32);
        push_constant_plane(&mut out, ((bits >> 1) & 0b01) as f32);
    }

    push_constant_plane(&mut out, if flags.turn == Color::White { 1.0 } else { 0.0 });
    for bit in 0..4 {
        push_constant_plane(&mut out, ((flags.castle_rights >> bit) & 1) as f32);
    }
    push_constant_plane(&mut out, f32::from(flags.total_move_count.min(255) as u8) / 100.0);
    push_constant_plane(&mut out, f32::from(flags.half_move_count) / 50.0);

    out
}
