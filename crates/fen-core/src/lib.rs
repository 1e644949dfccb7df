//! Lenient FEN validation, inference and comparison for the PGN to FEN benchmark.

pub mod compare;
pub mod encoding;
pub mod error;
pub mod parse;
pub mod pgn;
pub mod record;
pub mod stats;
pub mod validate;

pub use compare::{compare, evaluate};
pub use encoding::{ComparisonVerdict, PositionEncoding};
pub use error::FenError;
pub use parse::{parse_candidate, parse_ground_truth};
pub use record::{ExperimentRecord, GameInfo, ModelInfo};
