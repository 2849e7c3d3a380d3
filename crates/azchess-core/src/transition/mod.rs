//! Pure state transition.
//!
//! [`apply`] consumes a position and an action and produces the
//! successor position together with a flag telling the caller to reset
//! its repetition map. The board is rotated 180 degrees on the way out so
//! the new mover again sits in the white slots. [`apply_to_pieces`]
//! performs only the board part of the same update; the move generator
//! uses it to test king safety without paying for flags, flip and hash.

use crate::bitboard;
use crate::error::CoreError;
use crate::moves::{
    self, decode_action, Action, ACTION_SIZE, KING_SIDE_CASTLE, QUEEN_SIDE_CASTLE,
};
use crate::position::Position;
use crate::types::{Color, Flags, Piece, Repetition};

/// Opponent rook home squares on the canonical board: capturing on one
/// of these forfeits the matching castle right.
const OPP_KING_SIDE_ROOK_SQ: usize = 56;
const OPP_QUEEN_SIDE_ROOK_SQ: usize = 63;

/// Board-only outcome of an action, before flags and flip.
struct BoardOutcome {
    pieces: [u64; Piece::SLOT_COUNT],
    mover: Piece,
    from_bb: u64,
    to_bb: u64,
    to_sq: usize,
    move_type: usize,
    captured: Piece,
    ep_capture: bool,
}

/// Run the bitboard updates for an action on a copy of the board.
fn apply_board(pos: &Position, action: Action) -> Result<BoardOutcome, CoreError> {
    if action >= ACTION_SIZE {
        debug_assert!(false, "action {action} out of range");
        return Err(CoreError::BadAction(action));
    }
    let (from_sq, move_type) = decode_action(action);
    let mover = pos.piece_at(from_sq);
    if !mover.is_white() {
        debug_assert!(false, "action {action} moves from an empty or enemy square");
        return Err(CoreError::BadAction(action));
    }

    let from_bb = 1u64 << from_sq;
    let to_bb = moves::apply_shift(from_bb, move_type);
    if bitboard::popcount(to_bb) != 1 {
        debug_assert!(false, "action {action} shifts off the board");
        return Err(CoreError::BadAction(action));
    }
    let to_sq = bitboard::lsb_index(to_bb) as usize;

    let mut pieces = *pos.pieces();

    // Move the mover.
    pieces[mover.index()] &= !from_bb;
    pieces[mover.index()] |= to_bb;

    // Castling drags the rook along.
    if mover == Piece::WKing {
        if move_type == KING_SIDE_CASTLE {
            pieces[Piece::WRook.index()] &= !(1u64 << 0);
            pieces[Piece::WRook.index()] |= 1u64 << 2;
        } else if move_type == QUEEN_SIDE_CASTLE {
            pieces[Piece::WRook.index()] &= !(1u64 << 7);
            pieces[Piece::WRook.index()] |= 1u64 << 4;
        }
    }

    // Plain capture: clear the previous occupant of the target square.
    let captured = pos.piece_at(to_sq);
    if captured.is_some() {
        debug_assert!(captured.is_black(), "capture of an own piece");
        pieces[captured.index()] &= !to_bb;
    }

    // En passant: the captured pawn stands one rank behind the target.
    let mut ep_capture = false;
    if mover == Piece::WPawn && pos.flags.en_passant != 0 {
        let target = u64::from(pos.flags.en_passant) << 40;
        if to_bb & target != 0 {
            pieces[Piece::BPawn.index()] &= !(target >> 8);
            ep_capture = true;
        }
    }

    // Promotion: explicit underpromotion types name the piece, any other
    // pawn move onto the last rank becomes a queen.
    if let Some(promoted) = moves::underpromotion_piece(move_type) {
        debug_assert!(mover == Piece::WPawn, "underpromotion by a non-pawn");
        debug_assert!(to_bb & bitboard::RANK_8 != 0, "underpromotion short of the last rank");
        pieces[Piece::WPawn.index()] &= !to_bb;
        pieces[promoted.index()] |= to_bb;
    } else if mover == Piece::WPawn && to_bb & bitboard::RANK_8 != 0 {
        pieces[Piece::WPawn.index()] &= !to_bb;
        pieces[Piece::WQueen.index()] |= to_bb;
    }

    Ok(BoardOutcome {
        pieces,
        mover,
        from_bb,
        to_bb,
        to_sq,
        move_type,
        captured,
        ep_capture,
    })
}

/// Board-only application, for king-safety tests in the generator.
pub fn apply_to_pieces(
    pos: &Position,
    action: Action,
) -> Result<[u64; Piece::SLOT_COUNT], CoreError> {
    Ok(apply_board(pos, action)?.pieces)
}

/// Apply an action, returning the successor position and whether the
/// move resets the repetition window (pawn move or capture).
pub fn apply(pos: &Position, action: Action) -> Result<(Position, bool), CoreError> {
    let out = apply_board(pos, action)?;

    let mover_color = pos.flags.turn;
    let pawn_move = out.mover == Piece::WPawn;
    let was_capture = out.captured.is_some() || out.ep_capture;
    let mut flags = pos.flags;

    flags.turn = mover_color.opponent();

    if flags.castle_rights != 0 {
        let (own_qs, own_ks) = Flags::castle_bits(mover_color);
        let (opp_qs, opp_ks) = Flags::castle_bits(mover_color.opponent());
        if out.mover == Piece::WKing {
            flags.castle_rights &= !(own_qs | own_ks);
        } else if out.mover == Piece::WRook {
            if out.from_bb & (1u64 << 0) != 0 {
                flags.castle_rights &= !own_ks;
            } else if out.from_bb & (1u64 << 7) != 0 {
                flags.castle_rights &= !own_qs;
            }
        }
        if out.captured == Piece::BRook {
            if out.to_sq == OPP_KING_SIDE_ROOK_SQ {
                flags.castle_rights &= !opp_ks;
            } else if out.to_sq == OPP_QUEEN_SIDE_ROOK_SQ {
                flags.castle_rights &= !opp_qs;
            }
        }
    }

    // A double push opens en passant on the pushed file.
    flags.en_passant = if pawn_move && out.move_type == 1 {
        ((out.to_bb >> 24) & 0xff) as u8
    } else {
        0
    };

    if pawn_move || was_capture {
        flags.half_move_count = 0;
        flags.no_progress_side = mover_color;
    } else {
        flags.half_move_count = (flags.half_move_count + 1).min(63);
    }
    if mover_color == Color::Black {
        flags.total_move_count = flags.total_move_count.saturating_add(1);
    }
    // The repetition-map owner overwrites this after counting the new
    // position.
    flags.repeated_state = Repetition::First;

    // Perspective flip: rotate every board 180 degrees, swap the colour
    // slots, mirror the en-passant file.
    let mut pieces = out.pieces;
    for bb in pieces.iter_mut() {
        *bb = bitboard::reverse(*bb);
    }
    for slot in 0..6 {
        pieces.swap(slot, slot + 6);
    }
    if flags.en_passant != 0 {
        flags.en_passant = 1u8 << (7 - flags.en_passant.trailing_zeros());
    }

    Ok((Position::new(pieces, flags), pawn_move || was_capture))
}
