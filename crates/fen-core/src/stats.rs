//! Verdict aggregation stratified by game length.

use std::fmt;

use crate::record::ExperimentRecord;

/// Inclusive range of halfmove counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfmoveRange {
    pub min: u32,
    pub max: u32,
}

impl HalfmoveRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, halfmoves: u32) -> bool {
        self.min <= halfmoves && halfmoves <= self.max
    }
}

impl fmt::Display for HalfmoveRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Ranges used for per-log analysis.
pub const ANALYSIS_RANGES: [HalfmoveRange; 6] = [
    HalfmoveRange::new(1, 10),
    HalfmoveRange::new(11, 20),
    HalfmoveRange::new(21, 40),
    HalfmoveRange::new(41, 60),
    HalfmoveRange::new(61, 80),
    HalfmoveRange::new(81, 100),
];

/// Strata used for the cross-model results table.
pub const TABLE_STRATA: [HalfmoveRange; 6] = [
    HalfmoveRange::new(0, 10),
    HalfmoveRange::new(11, 20),
    HalfmoveRange::new(21, 40),
    HalfmoveRange::new(41, 60),
    HalfmoveRange::new(61, 80),
    HalfmoveRange::new(81, 100),
];

/// One of the seven verdict columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictField {
    FullCorrectness,
    PiecePlacement,
    Turn,
    Castling,
    EnPassant,
    HalfmoveClock,
    FullmoveNumber,
}

impl VerdictField {
    pub const ALL: [VerdictField; 7] = [
        VerdictField::FullCorrectness,
        VerdictField::PiecePlacement,
        VerdictField::Turn,
        VerdictField::Castling,
        VerdictField::EnPassant,
        VerdictField::HalfmoveClock,
        VerdictField::FullmoveNumber,
    ];

    /// Column name as used in the log format.
    pub fn key(self) -> &'static str {
        match self {
            VerdictField::FullCorrectness => "full_correctness",
            VerdictField::PiecePlacement => "piece_placement",
            VerdictField::Turn => "turn",
            VerdictField::Castling => "castling",
            VerdictField::EnPassant => "en_passant",
            VerdictField::HalfmoveClock => "halfmove_clock",
            VerdictField::FullmoveNumber => "fullmove_number",
        }
    }

    /// Accepts `full_correctness`, `full correctness` or `Full Correctness`.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = name.trim().to_lowercase().replace(' ', "_");
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerdictCounts {
    pub n: usize,
    pub full_correctness: usize,
    pub piece_placement: usize,
    pub turn: usize,
    pub castling: usize,
    pub en_passant: usize,
    pub halfmove_clock: usize,
    pub fullmove_number: usize,
}

impl VerdictCounts {
    pub fn get(&self, field: VerdictField) -> usize {
        match field {
            VerdictField::FullCorrectness => self.full_correctness,
            VerdictField::PiecePlacement => self.piece_placement,
            VerdictField::Turn => self.turn,
            VerdictField::Castling => self.castling,
            VerdictField::EnPassant => self.en_passant,
            VerdictField::HalfmoveClock => self.halfmove_clock,
            VerdictField::FullmoveNumber => self.fullmove_number,
        }
    }

    /// Share of records with `field` correct, in percent; 0 when empty.
    pub fn percentage(&self, field: VerdictField) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.get(field) as f64 / self.n as f64 * 100.0
        }
    }
}

/// Count correct fields over records whose halfmove count lies in `range`.
///
/// Also returns the mean halfmove count of the counted records (0 when none).
pub fn count_in_range(records: &[ExperimentRecord], range: HalfmoveRange) -> (VerdictCounts, f64) {
    let mut counts = VerdictCounts::default();
    let mut total_halfmoves = 0u64;

    for record in records {
        let halfmoves = record.game_info.number_of_halfmoves;
        if !range.contains(halfmoves) {
            continue;
        }
        counts.n += 1;
        total_halfmoves += u64::from(halfmoves);

        let eval = &record.evaluation;
        counts.full_correctness += usize::from(eval.full_correctness);
        counts.piece_placement += usize::from(eval.piece_placement);
        counts.turn += usize::from(eval.turn);
        counts.castling += usize::from(eval.castling);
        counts.en_passant += usize::from(eval.en_passant);
        counts.halfmove_clock += usize::from(eval.halfmove_clock);
        counts.fullmove_number += usize::from(eval.fullmove_number);
    }

    let mean = if counts.n == 0 {
        0.0
    } else {
        total_halfmoves as f64 / counts.n as f64
    };
    (counts, mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::ComparisonVerdict;
    use crate::record::{GameInfo, ModelInfo};

    fn record(halfmoves: u32, verdict: ComparisonVerdict) -> ExperimentRecord {
        ExperimentRecord {
            game_info: GameInfo {
                datetime: String::new(),
                input_pgn_file: format!("halfmoves{halfmoves:04}_001.pgn"),
                input_fen: String::new(),
                number_of_halfmoves: halfmoves,
            },
            model_info: ModelInfo {
                provider: "openai".to_string(),
                model: "gpt-4.1".to_string(),
                llm_raw_text: String::new(),
                llm_fen: None,
            },
            evaluation: verdict,
        }
    }

    #[test]
    fn test_count_in_range() {
        let all_true = ComparisonVerdict::from_fields(true, true, true, true, true, true);
        let partial = ComparisonVerdict::from_fields(true, false, true, false, true, true);
        let records = vec![
            record(3, all_true),
            record(8, partial),
            record(12, all_true),
            record(10, ComparisonVerdict::all_false()),
        ];

        let (counts, mean) = count_in_range(&records, HalfmoveRange::new(1, 10));
        assert_eq!(counts.n, 3);
        assert_eq!(counts.full_correctness, 1);
        assert_eq!(counts.piece_placement, 2);
        assert_eq!(counts.turn, 1);
        assert_eq!(counts.castling, 2);
        assert_eq!(counts.en_passant, 1);
        assert!((mean - 7.0).abs() < 1e-9);
        assert!((counts.percentage(VerdictField::PiecePlacement) - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_range() {
        let (counts, mean) = count_in_range(&[], HalfmoveRange::new(81, 100));
        assert_eq!(counts, VerdictCounts::default());
        assert_eq!(mean, 0.0);
        assert_eq!(counts.percentage(VerdictField::FullCorrectness), 0.0);
    }

    #[test]
    fn test_field_names() {
        assert_eq!(VerdictField::from_name("full correctness"), Some(VerdictField::FullCorrectness));
        assert_eq!(VerdictField::from_name("Piece Placement"), Some(VerdictField::PiecePlacement));
        assert_eq!(VerdictField::from_name("en_passant"), Some(VerdictField::EnPassant));
        assert_eq!(VerdictField::from_name("all correct"), None);
        assert_eq!(HalfmoveRange::new(21, 40).to_string(), "21-40");
    }
}
