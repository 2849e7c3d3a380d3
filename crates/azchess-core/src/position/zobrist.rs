//! Zobrist hashing for position identification.
//!
//! Keys cover piece-at-square, side to move, castle rights and the
//! en-passant file. The table is a process-wide constant built once from
//! a fixed-seed PRNG, so every process derives identical keys and hashes
//! are comparable across runs.

use lazy_static::lazy_static;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::types::{Flags, Piece};

/// Zobrist key tables.
pub struct ZobristTable {
    /// Keys for a piece slot on a square.
    pub piece_square: [[u64; 64]; Piece::SLOT_COUNT],
    /// Key XORed in when Black is to move.
    pub side_to_move: u64,
    /// One key per castle-right bit.
    pub castle: [u64; 4],
    /// One key per en-passant file.
    pub en_passant_file: [u64; 8],
}

impl ZobristTable {
    /// Build the table from the fixed seed.
    pub fn new() -> Self {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0x5A0B_0157_C0DE_D00D);

        let mut table = ZobristTable {
            piece_square: [[0; 64]; Piece::SLOT_COUNT],
            side_to_move: rng.random(),
            castle: [0; 4],
            en_passant_file: [0; 8],
        };

        for slot in 0..Piece::SLOT_COUNT {
            for sq in 0..64 {
                table.piece_square[slot][sq] = rng.random();
            }
        }
        for bit in 0..4 {
            table.castle[bit] = rng.random();
        }
        for file in 0..8 {
            table.en_passant_file[file] = rng.random();
        }

        table
    }
}

impl Default for ZobristTable {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    /// Global Zobrist table, initialised before any `Position` exists.
    pub static ref ZOBRIST: ZobristTable = ZobristTable::new();
}

/// Full hash of a canonical board plus flags.
pub fn compute_hash(pieces: &[u64; Piece::SLOT_COUNT], flags: &Flags) -> u64 {
    let mut hash = 0u64;

    for (slot, &bb) in pieces.iter().enumerate() {
        let mut rest = bb;
        while rest != 0 {
            let sq = crate::bitboard::pop_lsb(&mut rest).trailing_zeros() as usize;
            hash ^= ZOBRIST.piece_square[slot][sq];
        }
    }

    if flags.turn == crate::types::Color::Black {
        hash ^= ZOBRIST.side_to_move;
    }
    for bit in 0..4 {
        if flags.castle_rights & (1 << bit) != 0 {
            hash ^= ZOBRIST.castle[bit];
        }
    }
    if flags.en_passant != 0 {
        let file = flags.en_passant.trailing_zeros() as usize;
        hash ^= ZOBRIST.en_passant_file[file & 7];
    }

    hash
}
