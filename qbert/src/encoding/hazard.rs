use std::fmt::{Display, Formatter};

use crate::board::{Board, Position};
use crate::encoding::features::*;

/// How the enemy avoiding learner sees the board. Each variant comes with the matching
/// proximity predicate, which decides when that learner takes over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HazardEncoding {
    /// All dangerous enemies as one class, within radius 2
    Basic,
    /// Coily on its own (radius 2), balls within their reach
    SeparateChaser,
    /// Like [SeparateChaser](Self::SeparateChaser), but Coily is watched within radius 3
    SeparateChaserWide,
}

impl HazardEncoding {
    pub fn encode(&self, board: &Board, p: Position) -> u32 {
        match self {
            HazardEncoding::Basic => encode_basic(board, p),
            HazardEncoding::SeparateChaser => encode_separate_chaser(board, p, encode_coily(board, p), 4),
            HazardEncoding::SeparateChaserWide => encode_separate_chaser(board, p, encode_coily_wide(board, p), 5),
        }
    }

    pub fn has_hazard_nearby(&self, board: &Board, p: Position) -> bool {
        match self {
            HazardEncoding::Basic => has_hazards_nearby(board, p),
            HazardEncoding::SeparateChaser => has_hazards_nearby_separate_chaser(board, p),
            HazardEncoding::SeparateChaserWide => has_hazards_nearby_separate_chaser_wide(board, p),
        }
    }
}

impl Display for HazardEncoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HazardEncoding::Basic => write!(f, "basic"),
            HazardEncoding::SeparateChaser => write!(f, "separate-chaser"),
            HazardEncoding::SeparateChaserWide => write!(f, "separate-chaser-wide"),
        }
    }
}

/// dangerous (8 bits) | green (5) | discs (3) | moves (4) | x (3) | y (3)
fn encode_basic(board: &Board, p: Position) -> u32 {
    let (px, py) = encode_coarse_position(p);
    encode_dangerous(board, p)
        | encode_green(board, p) << 8
        | encode_discs(board, p) << 13
        | encode_moves(board, p) << 16
        | px << 20
        | py << 23
}

/// coily (`coily_bits`) | balls (7) | green (5) | discs (3) | moves (4) | x (3) | y (3)
fn encode_separate_chaser(board: &Board, p: Position, coily: u32, coily_bits: u32) -> u32 {
    let (px, py) = encode_coarse_position(p);
    let mut shift = coily_bits;
    let mut result = coily;
    for (field, bits) in [
        (encode_balls(board, p), 7),
        (encode_green(board, p), 5),
        (encode_discs(board, p), 3),
        (encode_moves(board, p), 4),
        (px, 3),
        (py, 3),
    ] {
        result |= field << shift;
        shift += bits;
    }
    result
}

/// Any dangerous enemy at distance <= 2, or a green creature next to the player
pub fn has_hazards_nearby(board: &Board, p: Position) -> bool {
    any_within(board, p, &RADIUS_2, Board::is_dangerous) || any_within(board, p, &RADIUS_1, Board::is_green)
}

pub fn has_hazards_nearby_separate_chaser(board: &Board, p: Position) -> bool {
    any_within(board, p, &RADIUS_2, Board::is_coily)
        || any_within(board, p, &BALL_REACH, Board::is_ball)
        || any_within(board, p, &RADIUS_1, Board::is_green)
}

pub fn has_hazards_nearby_separate_chaser_wide(board: &Board, p: Position) -> bool {
    any_within(board, p, &RADIUS_3, Board::is_coily)
        || any_within(board, p, &BALL_REACH, Board::is_ball)
        || any_within(board, p, &RADIUS_1, Board::is_green)
}
