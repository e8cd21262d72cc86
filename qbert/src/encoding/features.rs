//! Bit fields the state encodings are assembled from.
//!
//! Offsets are `(dx, dy)` relative to the player. Their order is canonical: a rank is the
//! 1-based index of an occupied offset within its list.

use crate::board::{Board, Color, Position, BOARD_SIZE};

/// Direct neighbors
pub const RADIUS_1: [(i32, i32); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

/// Cells at a distance of 2 or less
pub const RADIUS_2: [(i32, i32); 12] = [
    (-2, 0),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -2),
    (0, -1),
    (0, 1),
    (0, 2),
    (1, -1),
    (1, 0),
    (1, 1),
    (2, 0),
];

/// Cells at a distance of 3 or less
pub const RADIUS_3: [(i32, i32); 24] = [
    (-3, 0),
    (-2, -1),
    (-2, 0),
    (-2, 1),
    (-1, -2),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (-1, 2),
    (0, -3),
    (0, -2),
    (0, -1),
    (0, 1),
    (0, 2),
    (0, 3),
    (1, -2),
    (1, -1),
    (1, 0),
    (1, 1),
    (1, 2),
    (2, -1),
    (2, 0),
    (2, 1),
    (3, 0),
];

/// Cells from where a ball reaches the player within one move. Balls only bounce downwards.
pub const BALL_REACH: [(i32, i32); 9] = [(-2, 0), (-1, -1), (-1, 0), (-1, 1), (0, -2), (0, -1), (0, 1), (1, -1), (1, 0)];

/// Cells next to the pyramid's left and right edge, where a disc is in reach
pub const DISC_REACH: [(i32, i32); 7] = [(-2, 0), (-1, -1), (-1, 0), (-1, 1), (0, -2), (0, -1), (1, -1)];

/// Rank encoding of a set with at most two members out of `base` candidate slots.
///
/// `0` for none, the 1-based rank `r` for a single one, `r1 * base + r2` (with `r1 < r2`) for two.
/// The game never shows more than two instances of one hazard class; further ones are ignored.
pub fn rank_encode(present: impl IntoIterator<Item = bool>, base: u32) -> u32 {
    let mut ranks = present
        .into_iter()
        .enumerate()
        .filter(|&(_, p)| p)
        .map(|(i, _)| i as u32 + 1);
    match (ranks.next(), ranks.next()) {
        (None, _) => 0,
        (Some(r), None) => r,
        (Some(r1), Some(r2)) => r1 * base + r2,
    }
}

/// Rank of the first occupied slot; for classes with a single instance
pub fn first_rank(present: impl IntoIterator<Item = bool>) -> u32 {
    present
        .into_iter()
        .position(|p| p)
        .map_or(0, |i| i as u32 + 1)
}

fn scan<'a>(board: &'a Board, p: Position, offsets: &'a [(i32, i32)], check: fn(&Board, i32, i32) -> bool) -> impl Iterator<Item = bool> + 'a {
    offsets.iter().map(move |&(dx, dy)| check(board, p.x.saturating_add(dx), p.y.saturating_add(dy)))
}

pub fn any_within(board: &Board, p: Position, offsets: &[(i32, i32)], check: fn(&Board, i32, i32) -> bool) -> bool {
    scan(board, p, offsets, check).any(|b| b)
}

/// Coily, purple and red balls at distance <= 2; 8 bits
pub fn encode_dangerous(board: &Board, p: Position) -> u32 {
    rank_encode(scan(board, p, &RADIUS_2, Board::is_dangerous), RADIUS_2.len() as u32)
}

/// Coily at distance <= 2; 4 bits
pub fn encode_coily(board: &Board, p: Position) -> u32 {
    first_rank(scan(board, p, &RADIUS_2, Board::is_coily))
}

/// Coily at distance <= 3; 5 bits
pub fn encode_coily_wide(board: &Board, p: Position) -> u32 {
    first_rank(scan(board, p, &RADIUS_3, Board::is_coily))
}

/// Balls, which may hit within one move; 7 bits
pub fn encode_balls(board: &Board, p: Position) -> u32 {
    rank_encode(scan(board, p, &BALL_REACH, Board::is_ball), BALL_REACH.len() as u32)
}

/// Green creatures next to the player; 5 bits
pub fn encode_green(board: &Board, p: Position) -> u32 {
    rank_encode(scan(board, p, &RADIUS_1, Board::is_green), RADIUS_1.len() as u32)
}

/// Disc in reach (never more than one at a time); 3 bits
pub fn encode_discs(board: &Board, p: Position) -> u32 {
    first_rank(scan(board, p, &DISC_REACH, Board::is_disc))
}

/// One bit per direction, which does not lead into the void; 4 bits
pub fn encode_moves(board: &Board, p: Position) -> u32 {
    [(-1, 0), (0, -1), (1, 0), (0, 1)]
        .iter()
        .enumerate()
        .filter(|&(_, &(dx, dy))| !board.is_void(p.x.saturating_add(dx), p.y.saturating_add(dy)))
        .fold(0, |acc, (bit, _)| acc | 1 << bit)
}

/// Halved coordinates; 3 bits each
pub fn encode_coarse_position(p: Position) -> (u32, u32) {
    let coarse = |v: i32| ((v.clamp(0, 7) + 1) >> 1) as u32;
    (coarse(p.x), coarse(p.y))
}

/// 0 = unset, 1 = start color, 2 = goal color, 3 = anything else (including off-grid cells); 2 bits
pub fn encode_color(board: &Board, x: i32, y: i32, start_color: Color, goal_color: Color) -> u32 {
    if board.has_color(x, y, 0) {
        0
    } else if board.has_color(x, y, start_color) {
        1
    } else if board.has_color(x, y, goal_color) {
        2
    } else {
        3
    }
}

/// Color of a neighbor cell. Stepping on a disc brings the player back to the top block.
pub fn encode_neighbor_color(board: &Board, x: i32, y: i32, start_color: Color, goal_color: Color) -> u32 {
    if board.is_disc(x, y) {
        encode_color(board, 1, 1, start_color, goal_color)
    } else {
        encode_color(board, x, y, start_color, goal_color)
    }
}

/// Presence of start colored, goal colored and intermediate colored blocks
/// within the rectangle `x0..=x1`, `y0..=y1`; 3 bits
pub fn encode_count(board: &Board, (x0, x1): (i32, i32), (y0, y1): (i32, i32), start_color: Color, goal_color: Color) -> u32 {
    let last = BOARD_SIZE as i32 - 1;
    let mut result = 0;
    for x in x0.max(0)..=x1.min(last) {
        for y in y0.max(0)..=y1.min(last) {
            if board.has_color(x, y, start_color) {
                result |= 1 << 0;
            } else if board.has_color(x, y, goal_color) {
                result |= 1 << 1;
            } else if is_intermediate(board, x, y, start_color, goal_color) {
                result |= 1 << 2;
            }
        }
    }
    result
}

fn is_intermediate(board: &Board, x: i32, y: i32, start_color: Color, goal_color: Color) -> bool {
    !board.is_void(x, y) && !board.has_color(x, y, 0) && !board.has_color(x, y, start_color) && !board.has_color(x, y, goal_color)
}
