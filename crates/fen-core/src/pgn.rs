//! PGN replay and dataset preparation on top of pgn-reader and shakmaty.

use std::ops::ControlFlow;
use std::sync::LazyLock;

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};
use regex::Regex;
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position};

use crate::error::FenError;

static GAME_BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n[ \t]*\r?\n\[").expect("valid game boundary regex"));

/// Final position of a replayed game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundTruth {
    pub fen: String,
    pub halfmoves: u32,
}

/// Headers and mainline of a single game.
struct Mainline {
    headers: Vec<(String, String)>,
    start: Chess,
    moves: Vec<String>,
    position: Chess,
}

/// State while reading movetext.
struct Replay {
    headers: Vec<(String, String)>,
    start: Chess,
    position: Chess,
    moves: Vec<String>,
}

/// Visitor that replays the mainline of a game, skipping variations.
struct MainlineVisitor;

impl Visitor for MainlineVisitor {
    type Tags = Vec<(String, String)>;
    type Movetext = Replay;
    type Output = Result<Mainline, FenError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(Vec::new())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        tags.push((
            String::from_utf8_lossy(name).into_owned(),
            value.decode_utf8_lossy().into_owned(),
        ));
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        let start = match tags.iter().find(|(name, _)| name == "FEN") {
            Some((_, fen)) => match start_position(fen) {
                Ok(pos) => pos,
                Err(e) => return ControlFlow::Break(Err(e)),
            },
            None => Chess::default(),
        };

        ControlFlow::Continue(Replay {
            headers: tags,
            position: start.clone(),
            start,
            moves: Vec::new(),
        })
    }

    fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn san(&mut self, replay: &mut Self::Movetext, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        let ply = replay.moves.len() + 1;
        let mv = match san_plus.san.to_move(&replay.position) {
            Ok(mv) => mv,
            Err(e) => {
                return ControlFlow::Break(Err(FenError::Pgn(format!(
                    "illegal move {san_plus} at ply {ply}: {e}"
                ))))
            }
        };

        match replay.position.clone().play(mv) {
            Ok(next) => replay.position = next,
            Err(e) => {
                return ControlFlow::Break(Err(FenError::Pgn(format!(
                    "cannot play {san_plus} at ply {ply}: {e}"
                ))))
            }
        }
        replay.moves.push(san_plus.to_string());
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, replay: Self::Movetext) -> Self::Output {
        Ok(Mainline {
            headers: replay.headers,
            start: replay.start,
            moves: replay.moves,
            position: replay.position,
        })
    }
}

fn start_position(fen: &str) -> Result<Chess, FenError> {
    let setup: Fen = fen
        .parse()
        .map_err(|e| FenError::Pgn(format!("invalid FEN header {fen:?}: {e}")))?;
    setup
        .into_position(CastlingMode::Standard)
        .map_err(|e| FenError::Pgn(format!("illegal start position {fen:?}: {e}")))
}

fn read_mainline(pgn: &str) -> Result<Mainline, FenError> {
    let mut reader = Reader::new(pgn.as_bytes());
    reader
        .read_game(&mut MainlineVisitor)?
        .ok_or_else(|| FenError::Pgn("no game found".to_string()))?
}

/// Replay the first game in `pgn` and return its final FEN.
///
/// The en passant square is only written when a capture is legal.
pub fn final_position(pgn: &str) -> Result<GroundTruth, FenError> {
    let mainline = read_mainline(pgn)?;
    let fen = Fen::from_position(&mainline.position, EnPassantMode::Legal).to_string();
    Ok(GroundTruth {
        fen,
        halfmoves: mainline.moves.len() as u32,
    })
}

/// Split the contents of a multi-game PGN file into one string per game.
pub fn split_games(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    GAME_BOUNDARY_RE
        .split(trimmed)
        .enumerate()
        .map(|(idx, game)| {
            // The boundary match swallows the opening bracket of every later game.
            let game = game.trim();
            if idx == 0 {
                format!("{game}\n")
            } else {
                format!("[{game}\n")
            }
        })
        .collect()
}

/// Cut a game down to its first `halfmoves` moves.
///
/// Headers named in `headers_to_delete` are dropped and the result is set to
/// `*`. Returns `None` when the game is shorter than `halfmoves`.
pub fn truncate_game(
    pgn: &str,
    halfmoves: usize,
    headers_to_delete: &[&str],
) -> Result<Option<String>, FenError> {
    let mainline = read_mainline(pgn)?;
    if mainline.moves.len() < halfmoves {
        return Ok(None);
    }

    let mut headers: Vec<(String, String)> = mainline
        .headers
        .into_iter()
        .filter(|(name, _)| !headers_to_delete.contains(&name.as_str()))
        .collect();
    match headers.iter_mut().find(|(name, _)| name == "Result") {
        Some((_, value)) => *value = "*".to_string(),
        None => headers.push(("Result".to_string(), "*".to_string())),
    }

    let mut out = String::new();
    for (name, value) in &headers {
        let value = value.replace('\\', "\\\\").replace('"', "\\\"");
        out.push_str(&format!("[{name} \"{value}\"]\n"));
    }
    out.push('\n');
    out.push_str(&movetext(&mainline.start, &mainline.moves[..halfmoves]));
    out.push_str("\n\n");
    Ok(Some(out))
}

/// Numbered movetext for `moves` played from `start`, terminated by `*`.
fn movetext(start: &Chess, moves: &[String]) -> String {
    let mut fullmove = start.fullmoves().get();
    let mut turn = start.turn();
    let mut out = String::new();

    for (idx, san) in moves.iter().enumerate() {
        match turn {
            Color::White => out.push_str(&format!("{fullmove}. ")),
            Color::Black if idx == 0 => out.push_str(&format!("{fullmove}... ")),
            Color::Black => {}
        }
        out.push_str(san);
        out.push(' ');

        if turn == Color::Black {
            fullmove += 1;
        }
        turn = !turn;
    }

    out.push('*');
    out
}
