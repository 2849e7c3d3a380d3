//! Piece tags.
//!
//! The closed set of 12 piece types plus `None`, used both as bitboard
//! slot indices and as the per-square tag in `type_at`. The mover always
//! occupies the white slots (0..6); the perspective flip in the
//! transition keeps that invariant.

use super::Color;

/// Piece type tag. Discriminants are the bitboard slot indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Piece {
    WPawn = 0,
    WKnight = 1,
    WBishop = 2,
    WRook = 3,
    WQueen = 4,
    WKing = 5,
    BPawn = 6,
    BKnight = 7,
    BBishop = 8,
    BRook = 9,
    BQueen = 10,
    BKing = 11,
    None = 12,
}

impl Piece {
    /// Number of real piece slots (excludes `None`).
    pub const SLOT_COUNT: usize = 12;

    /// Slot index for bitboard arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decode a slot index; anything out of range is `None`.
    #[inline]
    pub const fn from_index(index: usize) -> Piece {
        match index {
            0 => Piece::WPawn,
            1 => Piece::WKnight,
            2 => Piece::WBishop,
            3 => Piece::WRook,
            4 => Piece::WQueen,
            5 => Piece::WKing,
            6 => Piece::BPawn,
            7 => Piece::BKnight,
            8 => Piece::BBishop,
            9 => Piece::BRook,
            10 => Piece::BQueen,
            11 => Piece::BKing,
            _ => Piece::None,
        }
    }

    #[inline]
    pub const fn is_white(self) -> bool {
        (self as u8) < 6
    }

    #[inline]
    pub const fn is_black(self) -> bool {
        (self as u8) >= 6 && (self as u8) < 12
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        matches!(self, Piece::None)
    }

    #[inline]
    pub const fn is_some(self) -> bool {
        !self.is_none()
    }

    /// Slot colour of the piece, if any.
    #[inline]
    pub const fn color(self) -> Option<Color> {
        if self.is_white() {
            Some(Color::White)
        } else if self.is_black() {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// Same piece kind in the opposite colour slots. `None` stays `None`.
    #[inline]
    pub const fn flip_color(self) -> Piece {
        if self.is_white() {
            Piece::from_index(self as usize + 6)
        } else if self.is_black() {
            Piece::from_index(self as usize - 6)
        } else {
            Piece::None
        }
    }

    /// Board glyph for position dumps.
    pub const fn glyph(self) -> char {
        match self {
            Piece::WPawn => 'P',
            Piece::WKnight => 'N',
            Piece::WBishop => 'B',
            Piece::WRook => 'R',
            Piece::WQueen => 'Q',
            Piece::WKing => 'K',
            Piece::BPawn => 'p',
            Piece::BKnight => 'n',
            Piece::BBishop => 'b',
            Piece::BRook => 'r',
            Piece::BQueen => 'q',
            Piece::BKing => 'k',
            Piece::None => '.',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for i in 0..12 {
            let piece = Piece::from_index(i);
            assert_eq!(piece.index(), i);
            assert!(piece.is_some());
        }
        assert_eq!(Piece::from_index(12), Piece::None);
        assert_eq!(Piece::from_index(255), Piece::None);
    }

    #[test]
    fn test_color_partition() {
        for i in 0..6 {
            assert!(Piece::from_index(i).is_white());
            assert_eq!(Piece::from_index(i).color(), Some(Color::White));
        }
        for i in 6..12 {
            assert!(Piece::from_index(i).is_black());
            assert_eq!(Piece::from_index(i).color(), Some(Color::Black));
        }
        assert_eq!(Piece::None.color(), None);
    }

    #[test]
    fn test_flip_color_involution() {
        for i in 0..12 {
            let piece = Piece::from_index(i);
            assert_eq!(piece.flip_color().flip_color(), piece);
            assert_ne!(piece.flip_color(), piece);
        }
        assert_eq!(Piece::None.flip_color(), Piece::None);
    }

    #[test]
    fn test_flip_color_pairs() {
        assert_eq!(Piece::WPawn.flip_color(), Piece::BPawn);
        assert_eq!(Piece::BKing.flip_color(), Piece::WKing);
        assert_eq!(Piece::WQueen.flip_color(), Piece::BQueen);
    }
}
