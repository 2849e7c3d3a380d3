//! Immutable position representation.
//!
//! Twelve per-type bitboards, a redundant square-to-tag array kept in
//! sync with them, the packed flags, and the Zobrist hash. The board is
//! always stored in canonical orientation: whichever side is to move
//! occupies the white slots, with its back rank at bit 0. A position is
//! constructed once and never mutated by core operations, except for the
//! repeated-state tag which the repetition-map owner writes back.

pub mod zobrist;

use std::fmt;

use crate::bitboard;
use crate::error::CoreError;
use crate::types::{Flags, Piece, Repetition};

// Canonical starting bitboards; the mover's back rank sits at bits 0-7
// with the king on bit 3.
const INIT_W_PAWNS: u64 = 0x0000_0000_0000_ff00;
const INIT_W_KNIGHTS: u64 = 0x0000_0000_0000_0042;
const INIT_W_BISHOPS: u64 = 0x0000_0000_0000_0024;
const INIT_W_ROOKS: u64 = 0x0000_0000_0000_0081;
const INIT_W_QUEEN: u64 = 0x0000_0000_0000_0010;
const INIT_W_KING: u64 = 0x0000_0000_0000_0008;
const INIT_B_PAWNS: u64 = 0x00ff_0000_0000_0000;
const INIT_B_KNIGHTS: u64 = 0x4200_0000_0000_0000;
const INIT_B_BISHOPS: u64 = 0x2400_0000_0000_0000;
const INIT_B_ROOKS: u64 = 0x8100_0000_0000_0000;
const INIT_B_QUEEN: u64 = 0x1000_0000_0000_0000;
const INIT_B_KING: u64 = 0x0800_0000_0000_0000;

/// An immutable chess position in canonical (mover-as-white) form.
#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    pieces: [u64; Piece::SLOT_COUNT],
    type_at: [Piece; 64],
    /// Packed non-board state.
    pub flags: Flags,
    /// Hash over piece-squares, turn, castle rights and en-passant file.
    pub zobrist: u64,
}

impl Position {
    /// The standard starting position, White to move.
    pub fn startpos() -> Position {
        let pieces = [
            INIT_W_PAWNS,
            INIT_W_KNIGHTS,
            INIT_W_BISHOPS,
            INIT_W_ROOKS,
            INIT_W_QUEEN,
            INIT_W_KING,
            INIT_B_PAWNS,
            INIT_B_KNIGHTS,
            INIT_B_BISHOPS,
            INIT_B_ROOKS,
            INIT_B_QUEEN,
            INIT_B_KING,
        ];
        Position::new(pieces, Flags::initial())
    }

    /// Build a position from bitboards and flags, deriving the square
    /// array and the hash.
    pub fn new(pieces: [u64; Piece::SLOT_COUNT], flags: Flags) -> Position {
        let type_at = derive_type_at(&pieces);
        let zobrist = zobrist::compute_hash(&pieces, &flags);
        Position {
            pieces,
            type_at,
            flags,
            zobrist,
        }
    }

    /// The twelve per-type bitboards.
    #[inline]
    pub fn pieces(&self) -> &[u64; Piece::SLOT_COUNT] {
        &self.pieces
    }

    /// Bitboard of one piece slot.
    #[inline]
    pub fn bitboard(&self, piece: Piece) -> u64 {
        debug_assert!(piece.is_some());
        self.pieces[piece.index()]
    }

    /// Piece tag at a square.
    #[inline]
    pub fn piece_at(&self, sq: usize) -> Piece {
        self.type_at[sq]
    }

    /// Union of all occupied squares.
    #[inline]
    pub fn occupied(&self) -> u64 {
        self.pieces.iter().fold(0, |acc, bb| acc | bb)
    }

    /// Squares occupied by the canonical mover.
    #[inline]
    pub fn mover_occupied(&self) -> u64 {
        self.pieces[..6].iter().fold(0, |acc, bb| acc | bb)
    }

    /// Squares occupied by the opponent.
    #[inline]
    pub fn opponent_occupied(&self) -> u64 {
        self.pieces[6..].iter().fold(0, |acc, bb| acc | bb)
    }

    /// Write back the repeated-state tag for an occurrence count taken
    /// from the repetition map. The tag is not part of the hash.
    #[inline]
    pub fn set_repetition_tag(&mut self, count: u8) {
        self.flags.repeated_state = Repetition::from_count(count);
    }

    /// Check the structural invariants: slot bitboards pairwise disjoint,
    /// the square array in sync with them, at most 32 pieces, exactly one
    /// king per side.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut union = 0u64;
        for (slot, &bb) in self.pieces.iter().enumerate() {
            if union & bb != 0 {
                return Err(CoreError::InvariantViolation(format!(
                    "piece bitboards overlap at slot {slot}\n{self}"
                )));
            }
            union |= bb;
        }
        if bitboard::popcount(union) > 32 {
            return Err(CoreError::InvariantViolation(format!(
                "more than 32 pieces on the board\n{self}"
            )));
        }
        for sq in 0..64 {
            let tagged = self.type_at[sq];
            let from_bb = (0..Piece::SLOT_COUNT)
                .find(|&slot| (self.pieces[slot] >> sq) & 1 == 1)
                .map_or(Piece::None, Piece::from_index);
            if tagged != from_bb {
                return Err(CoreError::InvariantViolation(format!(
                    "type_at[{sq}] = {tagged:?} but bitboards say {from_bb:?}\n{self}"
                )));
            }
        }
        for king in [Piece::WKing, Piece::BKing] {
            if bitboard::popcount(self.bitboard(king)) != 1 {
                return Err(CoreError::InvariantViolation(format!(
                    "{king:?} count is not one\n{self}"
                )));
            }
        }
        Ok(())
    }
}

/// Rebuild the square-to-tag array from the bitboards.
fn derive_type_at(pieces: &[u64; Piece::SLOT_COUNT]) -> [Piece; 64] {
    let mut type_at = [Piece::None; 64];
    for (slot, &bb) in pieces.iter().enumerate() {
        let piece = Piece::from_index(slot);
        let mut rest = bb;
        while rest != 0 {
            let sq = bitboard::pop_lsb(&mut rest).trailing_zeros() as usize;
            type_at[sq] = piece;
        }
    }
    type_at
}

impl fmt::Display for Position {
    /// Board grid with rank 8 on top, plus the flag fields. Used for
    /// invariant-violation dumps.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            for file in (0..8).rev() {
                write!(f, "{} ", self.type_at[rank * 8 + file].glyph())?;
            }
            writeln!(f)?;
        }
        writeln!(
            f,
            "turn={:?} castle={:04b} ep={:#04x} rep={:?} half={} total={} zobrist={:#018x}",
            self.flags.turn,
            self.flags.castle_rights,
            self.flags.en_passant,
            self.flags.repeated_state,
            self.flags.half_move_count,
            self.flags.total_move_count,
            self.zobrist,
        )
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    #[test]
    fn test_startpos_piece_counts() {
        let pos = Position::startpos();
        assert_eq!(bitboard::popcount(pos.occupied()), 32);
        assert_eq!(bitboard::popcount(pos.mover_occupied()), 16);
        assert_eq!(bitboard::popcount(pos.opponent_occupied()), 16);
        assert_eq!(bitboard::popcount(pos.bitboard(Piece::WPawn)), 8);
        assert_eq!(bitboard::popcount(pos.bitboard(Piece::BQueen)), 1);
    }

    #[test]
    fn test_startpos_layout() {
        let pos = Position::startpos();
        // Mover's king on bit 3, rooks on the corners.
        assert_eq!(pos.piece_at(3), Piece::WKing);
        assert_eq!(pos.piece_at(4), Piece::WQueen);
        assert_eq!(pos.piece_at(0), Piece::WRook);
        assert_eq!(pos.piece_at(7), Piece::WRook);
        assert_eq!(pos.piece_at(59), Piece::BKing);
        assert_eq!(pos.piece_at(56), Piece::BRook);
        assert_eq!(pos.piece_at(63), Piece::BRook);
        assert_eq!(pos.piece_at(27), Piece::None);
        assert_eq!(pos.flags.turn, Color::White);
    }

    #[test]
    fn test_type_at_matches_bitboards() {
        let pos = Position::startpos();
        for sq in 0..64 {
            let tag = pos.piece_at(sq);
            match tag {
                Piece::None => {
                    assert_eq!(pos.occupied() >> sq & 1, 0);
                }
                piece => {
                    assert_eq!(pos.bitboard(piece) >> sq & 1, 1);
                }
            }
        }
    }

    #[test]
    fn test_startpos_validates() {
        assert!(Position::startpos().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let mut pieces = *Position::startpos().pieces();
        pieces[Piece::WKnight.index()] |= pieces[Piece::WPawn.index()];
        let pos = Position::new(pieces, Flags::initial());
        assert!(matches!(
            pos.validate(),
            Err(CoreError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_missing_king() {
        let mut pieces = *Position::startpos().pieces();
        pieces[Piece::BKing.index()] = 0;
        let pos = Position::new(pieces, Flags::initial());
        assert!(matches!(
            pos.validate(),
            Err(CoreError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_set_repetition_tag() {
        let mut pos = Position::startpos();
        let hash = pos.zobrist;
        pos.set_repetition_tag(2);
        assert_eq!(pos.flags.repeated_state, Repetition::Second);
        // The tag is outside the hash.
        assert_eq!(pos.zobrist, hash);
        pos.set_repetition_tag(3);
        assert_eq!(pos.flags.repeated_state, Repetition::Third);
    }

    #[test]
    fn test_display_contains_grid() {
        let dump = Position::startpos().to_string();
        assert!(dump.contains('K'));
        assert!(dump.contains('k'));
        assert!(dump.contains("castle=1111"));
    }
}
