//! Packed position flags.
//!
//! The fields are stored widened for convenience; [`Flags::pack`]
//! serialises them into the fixed 30-bit wire layout, saturating the
//! counters to their wire widths:
//!
//! ```text
//! bit 0      turn (0 = White to move)
//! bits 1-4   castle rights (WQ, WK, BQ, BK)
//! bits 5-12  en-passant file mask
//! bits 13-14 repeated-state tag
//! bits 15-20 half-move count (saturating at 63)
//! bit 21     no-progress side
//! bits 22-29 total move count (saturating at 255)
//! ```

use super::{Color, Repetition};

/// White queen-side castle right.
pub const CASTLE_WQ: u8 = 0b0001;
/// White king-side castle right.
pub const CASTLE_WK: u8 = 0b0010;
/// Black queen-side castle right.
pub const CASTLE_BQ: u8 = 0b0100;
/// Black king-side castle right.
pub const CASTLE_BK: u8 = 0b1000;
/// All four castle rights.
pub const CASTLE_ALL: u8 = 0b1111;

/// Non-board state of a position.
///
/// `castle_rights` tracks real colours and is deliberately not touched by
/// the perspective flip; `turn` selects which pair belongs to the mover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flags {
    /// Real colour of the side to move (the canonical mover).
    pub turn: Color,
    /// Castle-right bits, see the `CASTLE_*` constants.
    pub castle_rights: u8,
    /// En-passant file mask on the canonical board, 0 when unavailable.
    /// The capture target square is this file on rank 6 (`mask << 40`).
    pub en_passant: u8,
    /// Repeated-state tag, written by whoever owns the repetition map.
    pub repeated_state: Repetition,
    /// Plies since the last pawn move or capture, saturating at 63.
    pub half_move_count: u8,
    /// Side that made the last irreversible move.
    pub no_progress_side: Color,
    /// Full moves played, incremented after the second side moves.
    pub total_move_count: u16,
}

impl Flags {
    /// Flags of the standard starting position.
    pub const fn initial() -> Flags {
        Flags {
            turn: Color::White,
            castle_rights: CASTLE_ALL,
            en_passant: 0,
            repeated_state: Repetition::First,
            half_move_count: 0,
            no_progress_side: Color::White,
            total_move_count: 0,
        }
    }

    /// Castle-right bits `(queen_side, king_side)` of the given colour.
    #[inline]
    pub const fn castle_bits(color: Color) -> (u8, u8) {
        match color {
            Color::White => (CASTLE_WQ, CASTLE_WK),
            Color::Black => (CASTLE_BQ, CASTLE_BK),
        }
    }

    /// Serialise into the 30-bit wire layout.
    pub fn pack(&self) -> u32 {
        let half = u32::from(self.half_move_count.min(63));
        let total = u32::from(self.total_move_count.min(255) as u8);
        self.turn.bit()
            | (u32::from(self.castle_rights & CASTLE_ALL) << 1)
            | (u32::from(self.en_passant) << 5)
            | (self.repeated_state.bits() << 13)
            | (half << 15)
            | (self.no_progress_side.bit() << 21)
            | (total << 22)
    }

    /// Deserialise from the 30-bit wire layout.
    pub fn unpack(word: u32) -> Flags {
        Flags {
            turn: Color::from_bit(word),
            castle_rights: ((word >> 1) & 0b1111) as u8,
            en_passant: ((word >> 5) & 0xff) as u8,
            repeated_state: Repetition::from_bits(word >> 13),
            half_move_count: ((word >> 15) & 0b11_1111) as u8,
            no_progress_side: Color::from_bit(word >> 21),
            total_move_count: ((word >> 22) & 0xff) as u16,
        }
    }
}

impl Default for Flags {
    fn default() -> Self {
        Flags::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_flags() {
        let flags = Flags::initial();
        assert_eq!(flags.turn, Color::White);
        assert_eq!(flags.castle_rights, CASTLE_ALL);
        assert_eq!(flags.en_passant, 0);
        assert_eq!(flags.half_move_count, 0);
        assert_eq!(flags.total_move_count, 0);
    }

    #[test]
    fn test_pack_round_trip() {
        let flags = Flags {
            turn: Color::Black,
            castle_rights: CASTLE_WK | CASTLE_BQ,
            en_passant: 0b0010_0000,
            repeated_state: Repetition::Second,
            half_move_count: 17,
            no_progress_side: Color::Black,
            total_move_count: 93,
        };
        assert_eq!(Flags::unpack(flags.pack()), flags);
    }

    #[test]
    fn test_pack_saturates_counters() {
        let flags = Flags {
            half_move_count: 200,
            total_move_count: 1000,
            ..Flags::initial()
        };
        let unpacked = Flags::unpack(flags.pack());
        assert_eq!(unpacked.half_move_count, 63);
        assert_eq!(unpacked.total_move_count, 255);
    }

    #[test]
    fn test_castle_bits_per_color() {
        assert_eq!(Flags::castle_bits(Color::White), (CASTLE_WQ, CASTLE_WK));
        assert_eq!(Flags::castle_bits(Color::Black), (CASTLE_BQ, CASTLE_BK));
    }

    #[test]
    fn test_pack_fits_thirty_bits() {
        let flags = Flags {
            turn: Color::Black,
            castle_rights: CASTLE_ALL,
            en_passant: 0xff,
            repeated_state: Repetition::Third,
            half_move_count: 63,
            no_progress_side: Color::Black,
            total_move_count: 255,
        };
        assert!(flags.pack() < (1 << 30));
    }
}
