//! Encoders, which pack a [Situation] into the integer state keys of the learners.

use ql::learn::tabular_learner::StateEncoder;
use ql::prelude::{StateKey, View};

use crate::action::{legal_moves, QbertAction};
use crate::agent::Situation;
use crate::board::{Board, Color, Position};
use crate::encoding::features::*;

pub mod features;
pub mod hazard;

pub use hazard::HazardEncoding;

/// Key space of the block-solving learners
pub struct PuzzleView;

impl View for PuzzleView {
    const NAME: &'static str = "puzzle";
}

/// Key space of the enemy-avoiding learners
pub struct HazardView;

impl View for HazardView {
    const NAME: &'static str = "hazard";
}

/// Key space of the monolithic learner
pub struct UnifiedView;

impl View for UnifiedView {
    const NAME: &'static str = "unified";
}

/// Valid bit and the 2-bit color codes of the player's cell and its four neighbors (bits 0..=10).
/// `0` while a context color is unknown.
fn encode_neighborhood(board: &Board, p: Position, start_color: Color, goal_color: Color) -> u32 {
    if start_color == 0 || goal_color == 0 {
        return 0;
    }
    let mut result = 1;
    result |= encode_color(board, p.x, p.y, start_color, goal_color) << 1;
    result |= encode_neighbor_color(board, p.x.saturating_sub(1), p.y, start_color, goal_color) << 3;
    result |= encode_neighbor_color(board, p.x, p.y.saturating_sub(1), start_color, goal_color) << 5;
    result |= encode_neighbor_color(board, p.x.saturating_add(1), p.y, start_color, goal_color) << 7;
    result |= encode_neighbor_color(board, p.x, p.y.saturating_add(1), start_color, goal_color) << 9;
    result
}

/// Puzzle view of the board.
///
/// | bits    | field                                                   |
/// |---------|---------------------------------------------------------|
/// | 0       | valid                                                   |
/// | 1..=10  | colors of the player's cell, then up, left, down, right |
/// | 11..=13 | blocks left of the player (`y` smaller)                 |
/// | 14..=16 | blocks below the player (`x` greater)                   |
/// | 17..=19 | blocks above the player (`x` smaller)                   |
/// | 20..=22 | blocks right of the player (`y` greater)                |
/// | 23..=25 | level bucket                                            |
///
/// Returns `0` when either context color is still unknown.
pub fn encode_puzzle_view(board: &Board, p: Position, start_color: Color, goal_color: Color, level: u32) -> u32 {
    let mut result = encode_neighborhood(board, p, start_color, goal_color);
    if result == 0 {
        return 0;
    }
    result |= encode_count(board, (1, 6), (1, p.y.saturating_sub(1)), start_color, goal_color) << 11;
    result |= encode_count(board, (p.x.saturating_add(1), 6), (1, 6), start_color, goal_color) << 14;
    result |= encode_count(board, (1, p.x.saturating_sub(1)), (1, 6), start_color, goal_color) << 17;
    result |= encode_count(board, (1, 6), (p.y.saturating_add(1), 6), start_color, goal_color) << 20;
    result |= (level / 4).min(4) << 23;
    result
}

/// Unified view for a single learner doing both jobs: the neighborhood colors of the puzzle view
/// plus dangerous hazards (bits 11..=18), green creatures (19..=23) and discs (24..=26).
pub fn encode_unified_view(board: &Board, p: Position, start_color: Color, goal_color: Color) -> u32 {
    let mut result = encode_neighborhood(board, p, start_color, goal_color);
    if result == 0 {
        return 0;
    }
    result |= encode_dangerous(board, p) << 11;
    result |= encode_green(board, p) << 19;
    result |= encode_discs(board, p) << 24;
    result
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PuzzleEncoder;

impl StateEncoder for PuzzleEncoder {
    type View = PuzzleView;
    type Observation = Situation;
    type Action = QbertAction;

    fn encode(&self, s: &Situation) -> StateKey<PuzzleView> {
        StateKey::new(encode_puzzle_view(&s.board, s.position, s.start_color, s.goal_color, s.level))
    }

    fn moves(&self, s: &Situation) -> Vec<QbertAction> {
        legal_moves(&s.board, s.position)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct HazardEncoder(pub HazardEncoding);

impl StateEncoder for HazardEncoder {
    type View = HazardView;
    type Observation = Situation;
    type Action = QbertAction;

    fn encode(&self, s: &Situation) -> StateKey<HazardView> {
        StateKey::new(self.0.encode(&s.board, s.position))
    }

    fn moves(&self, s: &Situation) -> Vec<QbertAction> {
        legal_moves(&s.board, s.position)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct UnifiedEncoder;

impl StateEncoder for UnifiedEncoder {
    type View = UnifiedView;
    type Observation = Situation;
    type Action = QbertAction;

    fn encode(&self, s: &Situation) -> StateKey<UnifiedView> {
        StateKey::new(encode_unified_view(&s.board, s.position, s.start_color, s.goal_color))
    }

    fn moves(&self, s: &Situation) -> Vec<QbertAction> {
        legal_moves(&s.board, s.position)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use rstest::rstest;

    use crate::board::GameEntity;

    use super::*;

    const START: Color = 10;
    const GOAL: Color = 20;

    #[rstest]
    #[case(0, 0)]
    #[case(START, 0)]
    #[case(0, GOAL)]
    fn test_unknown_colors_encode_to_zero(#[case] start: Color, #[case] goal: Color) {
        let board = Board::pyramid(START).with_entity(Position::new(1, 1), GameEntity::Qbert);
        assert_eq!(encode_puzzle_view(&board, Position::new(1, 1), start, goal, 3), 0);
        assert_eq!(encode_unified_view(&board, Position::new(1, 1), start, goal), 0);
    }

    #[test]
    fn test_puzzle_view_at_top() {
        let board = Board::pyramid(START).with_color(Position::new(2, 1), GOAL);
        let key = encode_puzzle_view(&board, Position::new(1, 1), START, GOAL, 0);

        assert_eq!(key & 1, 1);
        // own cell start, up and left unset (void), down goal, right start
        assert_eq!((key >> 1) & 0x3ff, 1 | 0 << 2 | 0 << 4 | 2 << 6 | 1 << 8);
        // nothing above and nothing to the left
        assert_eq!((key >> 11) & 0b111, 0);
        assert_eq!((key >> 17) & 0b111, 0);
        assert_eq!((key >> 14) & 0b111, 0b011);
        assert_eq!((key >> 20) & 0b111, 0b001);
        assert_eq!(key >> 23, 0);
    }

    #[test]
    fn test_puzzle_view_disc_teleports_to_top() {
        let board = Board::pyramid(START)
            .with_color(Position::new(1, 1), GOAL)
            .with_entity(Position::new(0, 2), GameEntity::Disc);
        let key = encode_puzzle_view(&board, Position::new(1, 2), START, GOAL, 0);
        // the cell above is a disc, which reads as the goal colored top block
        assert_eq!((key >> 3) & 0b11, 2);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(3, 0)]
    #[case(4, 1)]
    #[case(15, 3)]
    #[case(16, 4)]
    #[case(100, 4)]
    fn test_level_bucket(#[case] level: u32, #[case] bucket: u32) {
        let board = Board::pyramid(START);
        let key = encode_puzzle_view(&board, Position::new(3, 2), START, GOAL, level);
        assert_eq!(key >> 23, bucket);
    }

    #[test]
    fn test_unified_view() {
        let p = Position::new(3, 2);
        let board = Board::pyramid(START)
            .with_entity(Position::new(2, 2), GameEntity::PurpleBall)
            .with_entity(Position::new(4, 2), GameEntity::GreenBall);
        let key = encode_unified_view(&board, p, START, GOAL);
        assert_eq!(key & 1, 1);
        // (-1,0) has rank 3 of RADIUS_2, (1,0) rank 4 of RADIUS_1
        assert_eq!((key >> 11) & 0xff, 3);
        assert_eq!((key >> 19) & 0x1f, 4);
        assert_eq!(key >> 24, 0);
    }

    #[test]
    fn test_encoders_use_their_view() {
        let board = Rc::new(Board::pyramid(START).with_entity(Position::new(3, 2), GameEntity::Qbert));
        let situation = Situation {
            board,
            position: Position::new(3, 2),
            start_color: START,
            goal_color: GOAL,
            level: 0,
        };
        let puzzle: StateKey<PuzzleView> = PuzzleEncoder.encode(&situation);
        assert_eq!(puzzle.value(), encode_puzzle_view(&situation.board, situation.position, START, GOAL, 0));
        let hazard: StateKey<HazardView> = HazardEncoder(HazardEncoding::Basic).encode(&situation);
        assert_eq!(hazard.value(), HazardEncoding::Basic.encode(&situation.board, situation.position));
        assert_eq!(PuzzleEncoder.moves(&situation).len(), 4);
    }

    #[test]
    fn test_far_off_grid_position() {
        let board = Board::pyramid(START);
        let p = Position::new(i32::MAX, i32::MAX);
        // every cell around reads as "other", all blocks lie left of and above the player
        assert_eq!(encode_puzzle_view(&board, p, START, GOAL, 0), 0x7ff | 0b001 << 11 | 0b001 << 17);
        assert_eq!(encode_unified_view(&board, p, START, GOAL), 0x7ff);
        assert_eq!(encode_puzzle_view(&board, Position::new(i32::MIN, i32::MIN), START, GOAL, 0) & 0x7ff, 0x7ff);
    }
}
