use std::fmt;

use serde::{Deserialize, Serialize};

/// Castling-rights tokens accepted for the castling field.
pub const CASTLING_RIGHTS: [&str; 8] = ["KQkq", "KQ", "kq", "K", "Q", "k", "q", "-"];

/// A FEN split into its six fields.
///
/// `None` means the field was missing from the source text. It is never the
/// same thing as an explicit `-`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionEncoding {
    pub placement: String,
    pub turn: Option<String>,
    pub castling: Option<String>,
    pub en_passant: Option<String>,
    pub halfmove_clock: u64,
    pub fullmove_number: u64,
}

/// Field-by-field outcome of comparing a candidate FEN against the truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonVerdict {
    pub full_correctness: bool,
    pub piece_placement: bool,
    pub turn: bool,
    pub castling: bool,
    pub en_passant: bool,
    pub halfmove_clock: bool,
    pub fullmove_number: bool,
}

impl ComparisonVerdict {
    /// Build a verdict from the six field results; `full_correctness` is their conjunction.
    pub fn from_fields(
        piece_placement: bool,
        turn: bool,
        castling: bool,
        en_passant: bool,
        halfmove_clock: bool,
        fullmove_number: bool,
    ) -> Self {
        Self {
            full_correctness: piece_placement
                && turn
                && castling
                && en_passant
                && halfmove_clock
                && fullmove_number,
            piece_placement,
            turn,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        }
    }

    /// Verdict recorded when the model gave no usable FEN.
    pub fn all_false() -> Self {
        Self::from_fields(false, false, false, false, false, false)
    }
}

impl fmt::Display for ComparisonVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "All Correct  : {}", self.full_correctness)?;
        writeln!(f, "    Piece Placement : {}", self.piece_placement)?;
        writeln!(f, "    Turn            : {}", self.turn)?;
        writeln!(f, "    Castling        : {}", self.castling)?;
        writeln!(f, "    En Passant      : {}", self.en_passant)?;
        writeln!(f, "    Halfmove Clock  : {}", self.halfmove_clock)?;
        write!(f, "    Fullmove Number : {}", self.fullmove_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_correctness_is_conjunction() {
        assert!(ComparisonVerdict::from_fields(true, true, true, true, true, true).full_correctness);
        assert!(!ComparisonVerdict::from_fields(true, true, true, true, true, false).full_correctness);
        assert!(!ComparisonVerdict::all_false().full_correctness);
    }

    #[test]
    fn test_verdict_display() {
        let text = ComparisonVerdict::from_fields(true, false, true, true, true, true).to_string();
        assert!(text.starts_with("All Correct  : false"));
        assert!(text.contains("    Turn            : false"));
        assert_eq!(text.lines().count(), 7);
    }
}
