#![allow(dead_code)]

use std::rc::Rc;

use qbert::action::QbertAction;
use qbert::board::{Board, Color, GameEntity, Position, DISC_CELLS};
use qbert::driver::GameEnvironment;

pub const START_COLOR: Color = 10;
pub const GOAL_COLOR: Color = 20;
pub const LIVES: u32 = 3;
/// Frames a jump takes from take-off to landing
pub const JUMP_FRAMES: u32 = 3;
pub const TOP: Position = Position::new(1, 1);

/// A tiny Q*bert: every landing on a start colored block turns it into the goal color for 25 points,
/// a disc carries the player back to the top, landing on the (static) enemy costs a life.
/// The player stands on a disc for one input accepting frame before the ride, as in the real game.
/// The game is over when all blocks have the goal color or no life is left.
pub struct PyramidGame {
    blocks: Board,
    player: Position,
    jump: Option<(Position, u32)>,
    hazard: Option<(Position, GameEntity)>,
    disc_layout: Vec<Position>,
    discs: Vec<Position>,
    riding_disc: bool,
    lives: u32,
    ram: [u8; 4],
    desynchronized: bool,
}

impl PyramidGame {
    pub fn new(hazard: Option<(Position, GameEntity)>) -> Self {
        Self::with_discs(hazard, DISC_CELLS[..2].to_vec())
    }

    /// A game without discs
    pub fn without_discs(hazard: Option<(Position, GameEntity)>) -> Self {
        Self::with_discs(hazard, Vec::new())
    }

    fn with_discs(hazard: Option<(Position, GameEntity)>, disc_layout: Vec<Position>) -> Self {
        let mut game = Self {
            blocks: Board::pyramid(START_COLOR),
            player: TOP,
            jump: None,
            hazard,
            discs: disc_layout.clone(),
            disc_layout,
            riding_disc: false,
            lives: LIVES,
            ram: [0; 4],
            desynchronized: false,
        };
        game.update_ram();
        game
    }

    /// A game, which never signals that it accepts input
    pub fn desynchronized() -> Self {
        let mut game = Self::new(None);
        game.desynchronized = true;
        game.update_ram();
        game
    }

    pub fn player(&self) -> Position {
        self.player
    }

    pub fn goal_colored_blocks(&self) -> usize {
        Board::block_positions()
            .filter(|p| self.blocks.has_color(p.x, p.y, GOAL_COLOR))
            .count()
    }

    fn update_ram(&mut self) {
        let accepting = self.jump.is_none() && !self.desynchronized;
        self.ram = [0, 0x42, 0x17, u8::from(accepting)];
    }

    fn land(&mut self, target: Position) -> f32 {
        if self.discs.contains(&target) {
            self.discs.retain(|&d| d != target);
            self.player = target;
            self.riding_disc = true;
            return 0.0;
        }
        if self.blocks.is_void(target.x, target.y) || matches!(self.hazard, Some((h, _)) if h == target) {
            self.lives -= 1;
            self.player = TOP;
            return 0.0;
        }
        self.player = target;
        if self.blocks.has_color(target.x, target.y, START_COLOR) {
            self.blocks.set_color(target, GOAL_COLOR);
            25.0
        } else {
            0.0
        }
    }
}

impl GameEnvironment for PyramidGame {
    fn board(&self) -> Rc<Board> {
        let mut board = self.blocks.clone();
        for &disc in &self.discs {
            board.set_entity(disc, GameEntity::Disc);
        }
        if let Some((position, entity)) = self.hazard {
            board.set_entity(position, entity);
        }
        board.set_entity(self.player, GameEntity::Qbert);
        Rc::new(board)
    }

    fn ram(&self) -> &[u8] {
        &self.ram
    }

    fn goal_color(&self) -> Color {
        GOAL_COLOR
    }

    fn act(&mut self, action: QbertAction) -> f32 {
        let reward = match self.jump {
            // the joystick is ignored during the ride
            None if self.riding_disc => {
                self.riding_disc = false;
                self.player = TOP;
                0.0
            }
            Some((target, 1)) => {
                self.jump = None;
                self.land(target)
            }
            Some((target, frames)) => {
                self.jump = Some((target, frames - 1));
                0.0
            }
            None if action != QbertAction::NoOp && !self.desynchronized => {
                self.jump = Some((action.target(self.player), JUMP_FRAMES));
                0.0
            }
            None => 0.0,
        };
        self.update_ram();
        reward
    }

    fn lives(&self) -> u32 {
        self.lives
    }

    fn game_over(&self) -> bool {
        self.lives == 0 || self.goal_colored_blocks() == Board::block_positions().count()
    }

    fn reset(&mut self) {
        *self = Self {
            desynchronized: self.desynchronized,
            ..Self::with_discs(self.hazard, self.disc_layout.clone())
        };
        self.update_ram();
    }
}
