//! Action encoding.
//!
//! Every move of the canonical mover is `(from_square, move_type)` with
//! 73 movement types, flattened to `action = move_type * 64 + from_square`
//! in `[0, 4672)`. The policy head of the network is indexed by exactly
//! this layout, so it is part of the wire format.
//!
//! Movement types:
//!
//! * 0-55: queen-line slides, eight directions x distance 1..7, in the
//!   order N, NE, E, SE, S, SW, W, NW.
//! * 56-63: knight jumps.
//! * 64-72: underpromotions, grouped by piece (knight, bishop, rook),
//!   each via the NW / N / NE pawn step.
//!
//! Queen promotion is not a movement type; a pawn move of type 0, 7 or 49
//! landing on the last rank promotes to queen implicitly.

use crate::types::Piece;

/// Number of movement types.
pub const MOVE_TYPE_COUNT: usize = 73;

/// Size of the flattened action space.
pub const ACTION_SIZE: usize = MOVE_TYPE_COUNT * 64;

/// Flattened action index.
pub type Action = usize;

/// King-side castle movement type (king slides two squares east).
pub const KING_SIDE_CASTLE: usize = 15;

/// Queen-side castle movement type (king slides two squares west).
pub const QUEEN_SIDE_CASTLE: usize = 43;

/// First underpromotion movement type.
pub const UNDERPROMOTION_BASE: usize = 64;

/// Bit shift of each movement type. Positive shifts left, negative right.
pub const MOVE_TYPE_SHIFT: [i8; MOVE_TYPE_COUNT] = [
    // 0-6: N slides
    8, 16, 24, 32, 40, 48, 56,
    // 7-13: NE slides
    7, 14, 21, 28, 35, 42, 49,
    // 14-20: E slides
    -1, -2, -3, -4, -5, -6, -7,
    // 21-27: SE slides
    -9, -18, -27, -36, -45, -54, -63,
    // 28-34: S slides
    -8, -16, -24, -32, -40, -48, -56,
    // 35-41: SW slides
    -7, -14, -21, -28, -35, -42, -49,
    // 42-48: W slides
    1, 2, 3, 4, 5, 6, 7,
    // 49-55: NW slides
    9, 18, 27, 36, 45, 54, 63,
    // 56-63: knight jumps
    15, 6, -10, -17, -15, -6, 10, 17,
    // 64-72: underpromotions (knight, bishop, rook) x (NW, N, NE)
    9, 8, 7, 9, 8, 7, 9, 8, 7,
];

/// Marker for shifts whose movement type depends on the from-square.
const AMBIGUOUS: i16 = -1;

/// Dense reverse lookup indexed by `shift + 63`. Shifts of magnitude 6
/// and 7 collide between slides and knight jumps and stay `AMBIGUOUS`;
/// `shift_to_type` resolves them by file.
static REVERSE_SHIFT: [i16; 127] = build_reverse_table();

const fn build_reverse_table() -> [i16; 127] {
    let mut table = [AMBIGUOUS; 127];
    let mut move_type = 0;
    // Slides and knight jumps; underpromotions share slide shifts and are
    // resolved by the promotion logic, not this table.
    while move_type < 64 {
        let s = MOVE_TYPE_SHIFT[move_type];
        let ambiguous = s == 6 || s == -6 || s == 7 || s == -7;
        if !ambiguous {
            table[(s as i16 + 63) as usize] = move_type as i16;
        }
        move_type += 1;
    }
    table
}

/// Flatten `(from_square, move_type)` into an action index.
#[inline]
pub const fn encode_action(from_sq: usize, move_type: usize) -> Action {
    move_type * 64 + from_sq
}

/// Split an action index into `(from_square, move_type)`.
#[inline]
pub const fn decode_action(action: Action) -> (usize, usize) {
    (action % 64, action / 64)
}

/// Apply a movement type to a one-bit bitboard. No wrap masking; the
/// generator only feeds shifts it has already validated.
#[inline]
pub const fn apply_shift(from_bb: u64, move_type: usize) -> u64 {
    crate::bitboard::shift(from_bb, MOVE_TYPE_SHIFT[move_type])
}

/// Movement type for a signed destination-minus-source shift.
///
/// Shifts of magnitude 6 and 7 are ambiguous between a slide and either a
/// knight jump or the opposite-direction slide near a file edge; the
/// from-square's file settles it:
///
/// * `+7`: file 0 can only be the W slide of 7 (type 48), else NE 1.
/// * `-7`: file 7 can only be the E slide of 7 (type 20), else SW 1.
/// * `+6`: files 0-1 can only be the W slide of 6 (type 47), else the
///   knight jump (type 57).
/// * `-6`: files 6-7 can only be the E slide of 6 (type 19), else the
///   knight jump (type 61).
pub fn shift_to_type(shift: i8, from_sq: usize, piece: Piece) -> Option<usize> {
    debug_assert!(from_sq < 64);
    let file = from_sq % 8;
    let resolved = match shift {
        7 => {
            if file == 0 {
                48
            } else {
                7
            }
        }
        -7 => {
            if file == 7 {
                20
            } else {
                35
            }
        }
        6 => {
            if file <= 1 {
                47
            } else {
                debug_assert!(piece == Piece::WKnight || piece == Piece::BKnight);
                57
            }
        }
        -6 => {
            if file >= 6 {
                19
            } else {
                debug_assert!(piece == Piece::WKnight || piece == Piece::BKnight);
                61
            }
        }
        s if (-63..=63).contains(&s) => {
            let entry = REVERSE_SHIFT[(s as i16 + 63) as usize];
            if entry == AMBIGUOUS {
                return None;
            }
            entry as usize
        }
        _ => return None,
    };
    Some(resolved)
}

/// Underpromotion movement-type triple `(knight, bishop, rook)` for a
/// one-step pawn shift, or `None` when the shift is not a pawn step.
#[inline]
pub const fn underpromotion_types(shift: i8) -> Option<[usize; 3]> {
    match shift {
        9 => Some([64, 67, 70]),
        8 => Some([65, 68, 71]),
        7 => Some([66, 69, 72]),
        _ => None,
    }
}

/// Piece a given underpromotion type resolves to.
#[inline]
pub const fn underpromotion_piece(move_type: usize) -> Option<Piece> {
    match move_type {
        64..=66 => Some(Piece::WKnight),
        67..=69 => Some(Piece::WBishop),
        70..=72 => Some(Piece::WRook),
        _ => None,
    }
}
