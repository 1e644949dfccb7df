//! Field-wise comparison of a candidate FEN against the ground truth.
//!
//! En passant and the fullmove number are compared leniently since both are
//! written differently across FEN conventions.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::encoding::{ComparisonVerdict, PositionEncoding};
use crate::error::FenError;
use crate::parse::{parse_candidate, parse_ground_truth};
use crate::validate::is_loosely_valid;

static EN_PASSANT_SQUARE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-h][36]$").expect("valid en passant regex"));

/// `true` for an en passant target square (`a3`..`h6`) or `-`.
pub fn is_en_passant_shape(token: &str) -> bool {
    token == "-" || EN_PASSANT_SQUARE_RE.is_match(token)
}

/// Lenient en passant comparison.
///
/// Some encoders only write a target square when a capture is actually
/// possible, others write one after every double pawn push. When the truth is
/// `-`, any well-formed value is accepted; a true square must match exactly.
pub fn compare_en_passant(truth: Option<&str>, candidate: Option<&str>) -> Result<bool, FenError> {
    let (Some(truth), Some(candidate)) = (truth, candidate) else {
        return Ok(false);
    };

    if !is_en_passant_shape(truth) {
        return Err(FenError::Contract(format!(
            "true en passant must be valid, received {truth:?}"
        )));
    }

    if EN_PASSANT_SQUARE_RE.is_match(truth) {
        Ok(truth == candidate)
    } else {
        Ok(is_en_passant_shape(candidate))
    }
}

/// Fullmove numbers within one of each other are considered equal.
pub fn compare_fullmove_number(truth: u64, candidate: u64) -> bool {
    truth.abs_diff(candidate) <= 1
}

/// Compare two parsed FENs field by field.
pub fn compare(
    truth: &PositionEncoding,
    candidate: &PositionEncoding,
) -> Result<ComparisonVerdict, FenError> {
    let en_passant =
        compare_en_passant(truth.en_passant.as_deref(), candidate.en_passant.as_deref())?;

    Ok(ComparisonVerdict::from_fields(
        truth.placement == candidate.placement,
        truth.turn == candidate.turn,
        truth.castling == candidate.castling,
        en_passant,
        truth.halfmove_clock == candidate.halfmove_clock,
        compare_fullmove_number(truth.fullmove_number, candidate.fullmove_number),
    ))
}

/// Evaluate one model answer against the true FEN.
///
/// Any failure to parse or compare yields an all-false verdict, so a single
/// bad answer never aborts a batch.
pub fn evaluate(truth: &str, candidate: Option<&str>) -> ComparisonVerdict {
    let Some(candidate) = candidate.filter(|c| is_loosely_valid(c)) else {
        return ComparisonVerdict::all_false();
    };

    let result = parse_ground_truth(truth)
        .and_then(|t| parse_candidate(candidate).map(|c| (t, c)))
        .and_then(|(t, c)| compare(&t, &c));

    match result {
        Ok(verdict) => verdict,
        Err(e @ FenError::Contract(_)) => {
            warn!(truth, candidate, error = %e, "Ground truth FEN is malformed");
            ComparisonVerdict::all_false()
        }
        Err(e) => {
            debug!(candidate, error = %e, "Unusable candidate FEN");
            ComparisonVerdict::all_false()
        }
    }
}
