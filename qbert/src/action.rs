use std::fmt::{Display, Formatter};

use anyhow::Result;
use ql::prelude::{Action, ModelActionType, QlError};

use crate::board::{Board, Position};

/// Number of slots in the learning tables, one per action
pub const ACTION_SLOTS: usize = 5;

/// Joystick directions, named by how they move on screen:
/// `Up` and `Down` change `x`, `Left` and `Right` change `y`.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum QbertAction {
    NoOp,
    Up,
    Right,
    Left,
    Down,
}

impl QbertAction {
    pub const MOVES: [QbertAction; 4] = [QbertAction::Up, QbertAction::Right, QbertAction::Left, QbertAction::Down];

    /// Where this action takes the player
    pub fn target(&self, from: Position) -> Position {
        match self {
            QbertAction::NoOp => from,
            QbertAction::Up => from.offset(-1, 0),
            QbertAction::Right => from.offset(0, 1),
            QbertAction::Left => from.offset(0, -1),
            QbertAction::Down => from.offset(1, 0),
        }
    }
}

/// Moves, which do not jump off the pyramid into the void
pub fn legal_moves(board: &Board, position: Position) -> Vec<QbertAction> {
    QbertAction::MOVES
        .into_iter()
        .filter(|a| {
            let t = a.target(position);
            !board.is_void(t.x, t.y)
        })
        .collect()
}

impl Display for QbertAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Action for QbertAction {
    const ACTION_SPACE: ModelActionType = ACTION_SLOTS as ModelActionType;

    fn numeric(&self) -> ModelActionType {
        use QbertAction::*;
        match self {
            NoOp => 0,
            Up => 1,
            Right => 2,
            Left => 3,
            Down => 4,
        }
    }

    fn try_from_numeric(value: ModelActionType) -> Result<Self> {
        use QbertAction::*;
        match value {
            0 => Ok(NoOp),
            1 => Ok(Up),
            2 => Ok(Right),
            3 => Ok(Left),
            4 => Ok(Down),
            _ => Err(QlError(format!("value {} out of range", value)).into()),
        }
    }

    fn no_action() -> Self {
        QbertAction::NoOp
    }
}
