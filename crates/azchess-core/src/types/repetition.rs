//! Repeated-state tag.

/// Two-bit tag recording how often the position has occurred in the
/// current irreversible-move window: first, second, or third-and-beyond
/// occurrence. The third occurrence is a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Repetition {
    #[default]
    First = 0b00,
    Second = 0b01,
    Third = 0b10,
}

impl Repetition {
    /// Tag for an occurrence count taken from the repetition map.
    #[inline]
    pub const fn from_count(count: u8) -> Repetition {
        match count {
            0 | 1 => Repetition::First,
            2 => Repetition::Second,
            _ => Repetition::Third,
        }
    }

    /// Wire bits of the tag.
    #[inline]
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// Decode wire bits; `0b11` is not produced by the core and decodes
    /// to `Third`.
    #[inline]
    pub const fn from_bits(bits: u32) -> Repetition {
        match bits & 0b11 {
            0b00 => Repetition::First,
            0b01 => Repetition::Second,
            _ => Repetition::Third,
        }
    }

    /// True when the tag marks a threefold draw.
    #[inline]
    pub const fn is_draw(self) -> bool {
        matches!(self, Repetition::Third)
    }
}
