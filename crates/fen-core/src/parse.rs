//! Positional parsing of ground-truth FENs and tolerant parsing of model FENs.

use crate::compare::is_en_passant_shape;
use crate::encoding::{PositionEncoding, CASTLING_RIGHTS};
use crate::error::FenError;
use crate::validate::is_digits;

/// Field a middle token was classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MiddleField {
    Turn,
    Castling,
    EnPassant,
}

/// Parse a complete, canonical six-field FEN.
pub fn parse_ground_truth(text: &str) -> Result<PositionEncoding, FenError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != 6 {
        return Err(FenError::Format(format!(
            "ground truth FEN must have 6 fields, got {}: {text:?}",
            tokens.len()
        )));
    }

    Ok(PositionEncoding {
        placement: tokens[0].to_string(),
        turn: Some(tokens[1].to_string()),
        castling: Some(tokens[2].to_string()),
        en_passant: Some(tokens[3].to_string()),
        halfmove_clock: parse_counter(tokens[4], text)?,
        fullmove_number: parse_counter(tokens[5], text)?,
    })
}

/// Parse a model-generated FEN with 3 to 6 fields.
///
/// Placement and the two counters are positional. With fewer than six fields
/// the tokens in between are assigned by shape, so a FEN missing its turn or
/// with castling and en passant swapped still parses. Tokens that fit no
/// field are dropped.
pub fn parse_candidate(text: &str) -> Result<PositionEncoding, FenError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let n = tokens.len();
    if !(3..=6).contains(&n) {
        return Err(FenError::Format(format!(
            "candidate FEN must have 3 to 6 fields, got {n}: {text:?}"
        )));
    }

    let halfmove_clock = parse_counter(tokens[n - 2], text)?;
    let fullmove_number = parse_counter(tokens[n - 1], text)?;

    let (turn, castling, en_passant) = if n == 6 {
        (
            Some(tokens[1].to_string()),
            Some(tokens[2].to_string()),
            Some(tokens[3].to_string()),
        )
    } else {
        infer_middle_fields(&tokens[1..n - 2])
    };

    Ok(PositionEncoding {
        placement: tokens[0].to_string(),
        turn,
        castling,
        en_passant,
        halfmove_clock,
        fullmove_number,
    })
}

/// Assign each middle token to the field its value looks like.
///
/// A later token of the same shape overwrites an earlier one.
fn infer_middle_fields(middle: &[&str]) -> (Option<String>, Option<String>, Option<String>) {
    let mut turn = None;
    let mut castling = None;
    let mut en_passant = None;

    for &token in middle {
        match classify(token) {
            Some(MiddleField::Turn) => turn = Some(token.to_string()),
            Some(MiddleField::Castling) => castling = Some(token.to_string()),
            Some(MiddleField::EnPassant) => en_passant = Some(token.to_string()),
            None => {}
        }
    }

    (turn, castling, en_passant)
}

/// Classify a token, trying turn, then castling, then en passant.
///
/// `-` fits both castling and en passant and always resolves to castling.
fn classify(token: &str) -> Option<MiddleField> {
    if token == "w" || token == "b" {
        Some(MiddleField::Turn)
    } else if CASTLING_RIGHTS.contains(&token) {
        Some(MiddleField::Castling)
    } else if is_en_passant_shape(token) {
        Some(MiddleField::EnPassant)
    } else {
        None
    }
}

fn parse_counter(token: &str, text: &str) -> Result<u64, FenError> {
    if !is_digits(token) {
        return Err(FenError::Format(format!(
            "expected a non-negative integer, got {token:?} in {text:?}"
        )));
    }
    // Digit runs too wide for u64 saturate.
    Ok(token.parse().unwrap_or(u64::MAX))
}
