//! Structural FEN validation and extraction of FENs embedded in prose.

use std::sync::LazyLock;

use regex::Regex;
use shakmaty::fen::Fen;

static PLACEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[rnbqkpRNBQKP1-8]+(?:/[rnbqkpRNBQKP1-8]+){7}$").expect("valid placement regex")
});

static CANDIDATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[rnbqkpRNBQKP1-8]+(?:/[rnbqkpRNBQKP1-8]+){7} [wb] (?:KQkq|KQ|kq|K|Q|k|q|-) (?:-|[a-h][36]) \d+ \d+",
    )
    .expect("valid candidate regex")
});

/// Strict validation through the rules engine's FEN parser.
///
/// Requires all six fields and 8 files in each of 8 ranks. The position
/// itself may be illegal.
pub fn is_strictly_valid(text: &str) -> bool {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != 6 {
        return false;
    }
    tokens.join(" ").parse::<Fen>().is_ok()
}

/// Lenient validation of FEN shape.
///
/// Checks 3 to 6 tokens, an 8-rank placement (rank widths are not summed) and
/// two trailing integers. Turn, castling and en passant tokens are left to the
/// parser.
pub fn is_loosely_valid(text: &str) -> bool {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 3 || tokens.len() > 6 {
        return false;
    }

    if !PLACEMENT_RE.is_match(tokens[0]) {
        return false;
    }

    tokens[tokens.len() - 2..].iter().all(|t| is_digits(t))
}

/// Find canonical-order FENs embedded in free text, in order of appearance.
pub fn extract_candidates(text: &str) -> impl Iterator<Item = &str> + '_ {
    CANDIDATE_RE.find_iter(text).map(|m| m.as_str())
}

/// Pull a usable FEN out of a raw model response.
///
/// A response that already looks like a FEN is used as is. Otherwise, when
/// `extract` is set, the first embedded canonical FEN is used.
pub fn extract_encoding(raw: &str, extract: bool) -> Option<String> {
    let trimmed = raw.trim();
    if is_loosely_valid(trimmed) {
        return Some(trimmed.to_string());
    }
    if extract {
        return extract_candidates(raw)
            .find(|fen| is_loosely_valid(fen))
            .map(str::to_string);
    }
    None
}

pub(crate) fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}
