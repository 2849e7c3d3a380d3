//! Legal move generation for the canonical mover.
//!
//! Candidates are enumerated per piece with wrap-safe shifts, special
//! moves (castling, en passant, promotion expansion) are appended, and
//! every candidate is then vetted by replaying it onto a board copy and
//! rejecting it if the mover's king ends up attacked. The result is a
//! 4672-entry legality mask plus a `king_captured` alarm: a well-formed
//! position never allows the opposing king to be taken, so that flag
//! surfaces as an invariant violation upstream.

pub mod attacks;

use smallvec::SmallVec;

use crate::bitboard::{
    self, NOT_LEFT_EDGE, NOT_RIGHT_EDGE, RANK_2, RANK_8,
};
use crate::moves::{
    encode_action, Action, ACTION_SIZE, KING_SIDE_CASTLE, QUEEN_SIDE_CASTLE,
};
use crate::position::Position;
use crate::transition;
use crate::types::{Flags, Piece};

use attacks::{DIAGONAL_DIRS, DIRECTIONS, KNIGHT_DIRS, STRAIGHT_DIRS};

/// Output of the generator: which of the 4672 actions are legal, and
/// whether any pseudo-move could capture the opposing king.
#[derive(Clone)]
pub struct LegalMoves {
    pub mask: [bool; ACTION_SIZE],
    pub king_captured: bool,
}

impl LegalMoves {
    /// True when at least one action is legal.
    pub fn any(&self) -> bool {
        self.mask.iter().any(|&m| m)
    }

    /// Number of legal actions.
    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Legal action indices in ascending order.
    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(action, &legal)| legal.then_some(action))
    }

    #[inline]
    pub fn contains(&self, action: Action) -> bool {
        self.mask[action]
    }
}

type Candidates = SmallVec<[Action; 128]>;

struct Collector {
    candidates: Candidates,
    enemy_king: u64,
    king_captured: bool,
}

impl Collector {
    #[inline]
    fn push(&mut self, from_sq: usize, move_type: usize, to_bb: u64) {
        if to_bb & self.enemy_king != 0 {
            self.king_captured = true;
        }
        self.candidates.push(encode_action(from_sq, move_type));
    }
}

/// Generate the legality mask for the side to move.
pub fn legal_moves(pos: &Position) -> LegalMoves {
    let pieces = pos.pieces();
    let occupied = pos.occupied();
    let own = pos.mover_occupied();
    let enemy = pos.opponent_occupied();
    let empty = !occupied;

    let mut col = Collector {
        candidates: SmallVec::new(),
        enemy_king: pieces[Piece::BKing.index()],
        king_captured: false,
    };

    gen_pawn_moves(&mut col, pieces[Piece::WPawn.index()], empty, enemy);
    gen_knight_moves(&mut col, pieces[Piece::WKnight.index()], own);
    gen_slider_moves(
        &mut col,
        pieces[Piece::WBishop.index()],
        &DIAGONAL_DIRS,
        own,
        enemy,
    );
    gen_slider_moves(
        &mut col,
        pieces[Piece::WRook.index()],
        &STRAIGHT_DIRS,
        own,
        enemy,
    );
    gen_slider_moves(
        &mut col,
        pieces[Piece::WQueen.index()],
        &[0, 1, 2, 3, 4, 5, 6, 7],
        own,
        enemy,
    );
    gen_king_moves(&mut col, pieces[Piece::WKing.index()], own);
    gen_castling(&mut col, pos, occupied);
    gen_en_passant(&mut col, pos);

    let mut out = LegalMoves {
        mask: [false; ACTION_SIZE],
        king_captured: col.king_captured,
    };

    // Self-check test: replay each candidate onto a board copy and keep
    // it only if the mover's king is not attacked afterwards.
    for &action in &col.candidates {
        match transition::apply_to_pieces(pos, action) {
            Ok(next) => {
                if !attacks::mover_in_check(&next) {
                    out.mask[action] = true;
                }
            }
            Err(e) => {
                debug_assert!(false, "generator emitted undecodable action {action}: {e}");
                log::warn!("dropping undecodable candidate action {action}: {e}");
            }
        }
    }

    out
}

fn gen_pawn_moves(col: &mut Collector, pawns: u64, empty: u64, enemy: u64) {
    // Single pushes, move type 0; promotion push triple on the last rank.
    let mut singles = (pawns << 8) & empty;
    while singles != 0 {
        let to_bb = bitboard::pop_lsb(&mut singles);
        let from_sq = (bitboard::lsb_index(to_bb) - 8) as usize;
        col.push(from_sq, 0, to_bb);
        if to_bb & RANK_8 != 0 {
            for move_type in [65, 68, 71] {
                col.push(from_sq, move_type, to_bb);
            }
        }
    }

    // Double pushes from the starting rank, move type 1.
    let mut doubles = ((((pawns & RANK_2) << 8) & empty) << 8) & empty;
    while doubles != 0 {
        let to_bb = bitboard::pop_lsb(&mut doubles);
        let from_sq = (bitboard::lsb_index(to_bb) - 16) as usize;
        col.push(from_sq, 1, to_bb);
    }

    // Captures toward the higher file, move type 49 (shift +9).
    let mut caps = (pawns << 9) & enemy & NOT_RIGHT_EDGE;
    while caps != 0 {
        let to_bb = bitboard::pop_lsb(&mut caps);
        let from_sq = (bitboard::lsb_index(to_bb) - 9) as usize;
        col.push(from_sq, 49, to_bb);
        if to_bb & RANK_8 != 0 {
            for move_type in [64, 67, 70] {
                col.push(from_sq, move_type, to_bb);
            }
        }
    }

    // Captures toward the lower file, move type 7 (shift +7).
    let mut caps = (pawns << 7) & enemy & NOT_LEFT_EDGE;
    while caps != 0 {
        let to_bb = bitboard::pop_lsb(&mut caps);
        let from_sq = (bitboard::lsb_index(to_bb) - 7) as usize;
        col.push(from_sq, 7, to_bb);
        if to_bb & RANK_8 != 0 {
            for move_type in [66, 69, 72] {
                col.push(from_sq, move_type, to_bb);
            }
        }
    }
}

fn gen_knight_moves(col: &mut Collector, knights: u64, own: u64) {
    for (move_type, step, wrap) in KNIGHT_DIRS {
        let mut dests = bitboard::shift(knights, step) & wrap & !own;
        while dests != 0 {
            let to_bb = bitboard::pop_lsb(&mut dests);
            let from_bb = bitboard::shift(to_bb, -step);
            col.push(bitboard::lsb_index(from_bb) as usize, move_type, to_bb);
        }
    }
}

fn gen_slider_moves(
    col: &mut Collector,
    sliders: u64,
    dirs: &[usize],
    own: u64,
    enemy: u64,
) {
    let mut rest = sliders;
    while rest != 0 {
        let from_bb = bitboard::pop_lsb(&mut rest);
        let from_sq = bitboard::lsb_index(from_bb) as usize;
        for &dir in dirs {
            let (step, wrap) = DIRECTIONS[dir];
            let base = dir * 7;
            let mut cursor = bitboard::shift(from_bb, step) & wrap;
            let mut dist = 0;
            while cursor != 0 {
                if cursor & own != 0 {
                    break;
                }
                col.push(from_sq, base + dist, cursor);
                if cursor & enemy != 0 {
                    break;
                }
                dist += 1;
                if dist == 7 {
                    break;
                }
                cursor = bitboard::shift(cursor, step) & wrap;
            }
        }
    }
}

fn gen_king_moves(col: &mut Collector, king: u64, own: u64) {
    debug_assert!(king != 0, "mover has no king");
    if king == 0 {
        return;
    }
    let from_sq = bitboard::lsb_index(king) as usize;
    for (dir, (step, wrap)) in DIRECTIONS.iter().enumerate() {
        let to_bb = bitboard::shift(king, *step) & wrap & !own;
        if to_bb != 0 {
            col.push(from_sq, dir * 7, to_bb);
        }
    }
}

/// Castling: right bit set, rook at home, gap empty, and neither the
/// king's square nor any square it crosses attacked.
fn gen_castling(col: &mut Collector, pos: &Position, occupied: u64) {
    let (own_qs, own_ks) = Flags::castle_bits(pos.flags.turn);
    let rights = pos.flags.castle_rights & (own_qs | own_ks);
    if rights == 0 || pos.pieces()[Piece::WKing.index()] != 1 << 3 {
        return;
    }
    let attacked = attacks::opponent_attacks(pos.pieces());
    let rooks = pos.pieces()[Piece::WRook.index()];

    if rights & own_ks != 0
        && rooks & 1 != 0
        && occupied & 0b0000_0110 == 0
        && attacked & 0b0000_1110 == 0
    {
        col.candidates.push(encode_action(3, KING_SIDE_CASTLE));
    }
    if rights & own_qs != 0
        && rooks & (1 << 7) != 0
        && occupied & 0b0111_0000 == 0
        && attacked & 0b0011_1000 == 0
    {
        col.candidates.push(encode_action(3, QUEEN_SIDE_CASTLE));
    }
}

/// En passant: the flag names a file; the capture lands on that file's
/// rank-6 square, from either adjacent file of rank 5.
fn gen_en_passant(col: &mut Collector, pos: &Position) {
    if pos.flags.en_passant == 0 {
        return;
    }
    let pawns = pos.pieces()[Piece::WPawn.index()];
    let target = u64::from(pos.flags.en_passant) << 40;

    let from_left = (target >> 9) & pawns & NOT_LEFT_EDGE;
    if from_left != 0 {
        col.candidates
            .push(encode_action(bitboard::lsb_index(from_left) as usize, 49));
    }
    let from_right = (target >> 7) & pawns & NOT_RIGHT_EDGE;
    if from_right != 0 {
        col.candidates
            .push(encode_action(bitboard::lsb_index(from_right) as usize, 7));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::flags::{CASTLE_WK, CASTLE_WQ};
    use crate::types::{Color, Flags};

    fn kings_only() -> [u64; Piece::SLOT_COUNT] {
        let mut pieces = [0u64; Piece::SLOT_COUNT];
        pieces[Piece::WKing.index()] = 1 << 3;
        pieces[Piece::BKing.index()] = 1 << 59;
        pieces
    }

    fn bare_flags() -> Flags {
        Flags {
            castle_rights: 0,
            ..Flags::initial()
        }
    }

    #[test]
    fn test_startpos_has_twenty_moves() {
        let moves = legal_moves(&Position::startpos());
        assert!(!moves.king_captured);
        assert_eq!(moves.count(), 20);

        let mut pawn_moves = 0;
        let mut knight_moves = 0;
        for action in moves.actions() {
            let (from_sq, move_type) = crate::moves::decode_action(action);
            match move_type {
                0 | 1 => {
                    pawn_moves += 1;
                    assert!((8..16).contains(&from_sq));
                }
                56..=63 => {
                    knight_moves += 1;
                    assert!(from_sq == 1 || from_sq == 6);
                }
                other => panic!("unexpected move type {other} at start"),
            }
        }
        assert_eq!(pawn_moves, 16);
        assert_eq!(knight_moves, 4);
    }

    #[test]
    fn test_en_passant_adds_one_candidate() {
        // Mover pawn on rank 5 file 6, en-passant file 7: exactly one
        // extra action, the up-left capture onto the empty target.
        let mut pieces = kings_only();
        pieces[Piece::WPawn.index()] = 1 << 38;
        pieces[Piece::BPawn.index()] = 1 << 39;
        let flags = Flags {
            en_passant: 0x80,
            ..bare_flags()
        };
        let pos = Position::new(pieces, flags);
        let moves = legal_moves(&pos);
        assert!(moves.contains(encode_action(38, 49)));

        // Same position without the flag: the capture disappears.
        let pos_no_ep = Position::new(pieces, bare_flags());
        let moves_no_ep = legal_moves(&pos_no_ep);
        assert!(!moves_no_ep.contains(encode_action(38, 49)));
        assert_eq!(moves.count(), moves_no_ep.count() + 1);
    }

    #[test]
    fn test_en_passant_file_zero_no_wrap() {
        // En-passant on file 0: only the adjacent file-1 pawn may take;
        // nothing wraps in from file 7.
        let mut pieces = kings_only();
        pieces[Piece::WPawn.index()] = (1 << 33) | (1 << 39);
        pieces[Piece::BPawn.index()] = 1 << 32;
        let flags = Flags {
            en_passant: 0x01,
            ..bare_flags()
        };
        let pos = Position::new(pieces, flags);
        let moves = legal_moves(&pos);
        // Target square is 40; pawn on 33 reaches it with the +7 step.
        assert!(moves.contains(encode_action(33, 7)));
        // The pawn on 39 (file 7) must not appear as an en-passant taker.
        assert!(!moves.contains(encode_action(39, 49)));
        assert!(!moves.contains(encode_action(39, 7)));
    }

    #[test]
    fn test_promotion_enumerates_four_actions() {
        let mut pieces = kings_only();
        // Keep the opposing king off the pawn's capture squares.
        pieces[Piece::BKing.index()] = 1 << 62;
        pieces[Piece::WPawn.index()] = 1 << 50;
        let pos = Position::new(pieces, bare_flags());
        let moves = legal_moves(&pos);

        let at_from: Vec<usize> = moves
            .actions()
            .filter(|&a| crate::moves::decode_action(a).0 == 50)
            .map(|a| crate::moves::decode_action(a).1)
            .collect();
        assert_eq!(at_from, vec![0, 65, 68, 71]);
    }

    #[test]
    fn test_capture_promotion_expands_underpromotions() {
        let mut pieces = kings_only();
        // Mover king clear of the rook files, opposing king clear of the
        // pawn's capture squares.
        pieces[Piece::WKing.index()] = 1 << 5;
        pieces[Piece::BKing.index()] = 1 << 62;
        pieces[Piece::WPawn.index()] = 1 << 50;
        pieces[Piece::BRook.index()] = (1 << 57) | (1 << 58) | (1 << 59);
        let pos = Position::new(pieces, bare_flags());
        let moves = legal_moves(&pos);

        // Forward push is blocked; both diagonal captures promote.
        assert!(!moves.contains(encode_action(50, 0)));
        for move_type in [49, 64, 67, 70, 7, 66, 69, 72] {
            assert!(
                moves.contains(encode_action(50, move_type)),
                "missing capture-promotion type {move_type}"
            );
        }
    }

    #[test]
    fn test_castling_both_sides_when_clear() {
        let mut pieces = kings_only();
        pieces[Piece::WRook.index()] = (1 << 0) | (1 << 7);
        let flags = Flags {
            castle_rights: CASTLE_WK | CASTLE_WQ,
            ..Flags::initial()
        };
        let pos = Position::new(pieces, flags);
        let moves = legal_moves(&pos);
        assert!(moves.contains(encode_action(3, KING_SIDE_CASTLE)));
        assert!(moves.contains(encode_action(3, QUEEN_SIDE_CASTLE)));
    }

    #[test]
    fn test_castling_blocked_by_piece() {
        let mut pieces = kings_only();
        pieces[Piece::WRook.index()] = (1 << 0) | (1 << 7);
        pieces[Piece::WBishop.index()] = 1 << 2;
        let flags = Flags {
            castle_rights: CASTLE_WK | CASTLE_WQ,
            ..Flags::initial()
        };
        let pos = Position::new(pieces, flags);
        let moves = legal_moves(&pos);
        assert!(!moves.contains(encode_action(3, KING_SIDE_CASTLE)));
        assert!(moves.contains(encode_action(3, QUEEN_SIDE_CASTLE)));
    }

    #[test]
    fn test_castling_requires_safe_path() {
        let mut pieces = kings_only();
        pieces[Piece::WRook.index()] = 1 << 0;
        // Enemy rook eyes square 2, which the king crosses.
        pieces[Piece::BRook.index()] = 1 << 58;
        let flags = Flags {
            castle_rights: CASTLE_WK,
            ..Flags::initial()
        };
        let pos = Position::new(pieces, flags);
        let moves = legal_moves(&pos);
        assert!(!moves.contains(encode_action(3, KING_SIDE_CASTLE)));
    }

    #[test]
    fn test_castling_requires_home_rook() {
        let pieces = kings_only();
        // Rights claim the rook but the board disagrees.
        let flags = Flags {
            castle_rights: CASTLE_WK | CASTLE_WQ,
            ..Flags::initial()
        };
        let pos = Position::new(pieces, flags);
        let moves = legal_moves(&pos);
        assert!(!moves.contains(encode_action(3, KING_SIDE_CASTLE)));
        assert!(!moves.contains(encode_action(3, QUEEN_SIDE_CASTLE)));
    }

    #[test]
    fn test_black_mover_uses_own_castle_bits() {
        // Canonical board with Black to move: white-slot rights must be
        // ignored, black-slot rights apply.
        let mut pieces = kings_only();
        pieces[Piece::WRook.index()] = (1 << 0) | (1 << 7);
        let flags = Flags {
            turn: Color::Black,
            castle_rights: CASTLE_WK | CASTLE_WQ,
            ..Flags::initial()
        };
        let pos = Position::new(pieces, flags);
        let moves = legal_moves(&pos);
        assert!(!moves.contains(encode_action(3, KING_SIDE_CASTLE)));
        assert!(!moves.contains(encode_action(3, QUEEN_SIDE_CASTLE)));
    }

    #[test]
    fn test_pinned_rook_cannot_leave_file() {
        let mut pieces = kings_only();
        pieces[Piece::WRook.index()] = 1 << 11;
        pieces[Piece::BRook.index()] = 1 << 27; // same file, above
        let pos = Position::new(pieces, bare_flags());
        let moves = legal_moves(&pos);
        // Along the pin file: fine.
        assert!(moves.contains(encode_action(11, 0)));
        // Sideways exposes the king.
        assert!(!moves.contains(encode_action(11, 14)));
        assert!(!moves.contains(encode_action(11, 42)));
    }

    #[test]
    fn test_check_restricts_moves() {
        let mut pieces = kings_only();
        pieces[Piece::BRook.index()] = 1 << 35; // checking down the king file
        pieces[Piece::WQueen.index()] = 1 << 0;
        let pos = Position::new(pieces, bare_flags());
        let moves = legal_moves(&pos);
        for action in moves.actions() {
            let next = transition::apply_to_pieces(&pos, action).unwrap();
            assert!(!attacks::mover_in_check(&next));
        }
        assert!(moves.any());
    }

    #[test]
    fn test_king_captured_flag() {
        let mut pieces = kings_only();
        // Opposing king adjacent to a mover rook: previous ply failed to
        // resolve check, the generator must raise the alarm.
        pieces[Piece::WRook.index()] = 1 << 51;
        let pos = Position::new(pieces, bare_flags());
        let moves = legal_moves(&pos);
        assert!(moves.king_captured);
    }

    #[test]
    fn test_center_mobility_counts() {
        // Kings parked off every line through square 27.
        let base = || {
            let mut pieces = [0u64; Piece::SLOT_COUNT];
            pieces[Piece::WKing.index()] = 1 << 1;
            pieces[Piece::BKing.index()] = 1 << 62;
            pieces
        };
        let count_from = |pieces, from_sq: usize| {
            let pos = Position::new(pieces, bare_flags());
            legal_moves(&pos)
                .actions()
                .filter(|&a| crate::moves::decode_action(a).0 == from_sq)
                .count()
        };

        let mut pieces = base();
        pieces[Piece::WRook.index()] = 1 << 27;
        assert_eq!(count_from(pieces, 27), 14);

        let mut pieces = base();
        pieces[Piece::WBishop.index()] = 1 << 27;
        assert_eq!(count_from(pieces, 27), 13);

        let mut pieces = base();
        pieces[Piece::WQueen.index()] = 1 << 27;
        assert_eq!(count_from(pieces, 27), 27);

        let mut pieces = base();
        pieces[Piece::WKnight.index()] = 1 << 27;
        assert_eq!(count_from(pieces, 27), 8);
    }

    #[test]
    fn test_actions_iterator_sorted() {
        let moves = legal_moves(&Position::startpos());
        let actions: Vec<usize> = moves.actions().collect();
        let mut sorted = actions.clone();
        sorted.sort_unstable();
        assert_eq!(actions, sorted);
    }
}
