use std::fmt::{Display, Formatter};

use console_engine::pixel;
use console_engine::screen::Screen;
use itertools::Itertools;
use ql::prelude::DebugVisualizer;

pub const BOARD_SIZE: usize = 8;

/// Block color code as reported by the screen; `0` means unset (black)
pub type Color = u8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GameEntity {
    #[default]
    Void,
    /// A block without anything on it
    Empty,
    Qbert,
    Coily,
    PurpleBall,
    RedBall,
    Sam,
    GreenBall,
    Disc,
}

impl GameEntity {
    /// Can touching it cost a life?
    pub fn is_dangerous(&self) -> bool {
        matches!(self, GameEntity::Coily | GameEntity::PurpleBall | GameEntity::RedBall)
    }

    pub fn is_ball(&self) -> bool {
        matches!(self, GameEntity::PurpleBall | GameEntity::RedBall)
    }

    /// Green creatures are harmless but worth catching
    pub fn is_green(&self) -> bool {
        matches!(self, GameEntity::Sam | GameEntity::GreenBall)
    }

    pub fn symbol(&self) -> char {
        match self {
            GameEntity::Void => '.',
            GameEntity::Empty => '_',
            GameEntity::Qbert => 'q',
            GameEntity::Coily => 'c',
            GameEntity::PurpleBall => 'p',
            GameEntity::RedBall => 'r',
            GameEntity::Sam => 's',
            GameEntity::GreenBall => 'g',
            GameEntity::Disc => 'o',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// The pyramid as seen in one frame: an entity grid and a block color grid, both indexed `[x][y]`.
///
/// Blocks occupy the cells with `x >= 1`, `y >= 1` and `x + y <= 7`; `(1,1)` is the top block.
/// Every query accepts any coordinate: cells off the grid read as [GameEntity::Void] without a color.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Board {
    entities: [[GameEntity; BOARD_SIZE]; BOARD_SIZE],
    colors: [[Color; BOARD_SIZE]; BOARD_SIZE],
}

/// Cells, where discs can appear
pub const DISC_CELLS: [Position; 5] = [
    Position::new(0, 1),
    Position::new(0, 3),
    Position::new(0, 5),
    Position::new(3, 0),
    Position::new(5, 0),
];

impl Board {
    pub fn new(entities: [[GameEntity; BOARD_SIZE]; BOARD_SIZE], colors: [[Color; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        Self { entities, colors }
    }

    /// The 21 block pyramid, all blocks empty and of the given color
    pub fn pyramid(color: Color) -> Self {
        let mut board = Board::default();
        for p in Self::block_positions() {
            board.set_entity(p, GameEntity::Empty);
            board.set_color(p, color);
        }
        board
    }

    pub fn block_positions() -> impl Iterator<Item = Position> {
        (1..=6).flat_map(|row| (1..=row).map(move |j| Position::new(row - j + 1, j)))
    }

    fn index(x: i32, y: i32) -> Option<(usize, usize)> {
        let range = 0..BOARD_SIZE as i32;
        (range.contains(&x) && range.contains(&y)).then_some((x as usize, y as usize))
    }

    pub fn entity(&self, x: i32, y: i32) -> GameEntity {
        Self::index(x, y).map_or(GameEntity::Void, |(x, y)| self.entities[x][y])
    }

    /// Block color, `None` off the grid
    pub fn color(&self, x: i32, y: i32) -> Option<Color> {
        Self::index(x, y).map(|(x, y)| self.colors[x][y])
    }

    pub fn set_entity(&mut self, p: Position, entity: GameEntity) {
        if let Some((x, y)) = Self::index(p.x, p.y) {
            self.entities[x][y] = entity
        }
    }

    pub fn set_color(&mut self, p: Position, color: Color) {
        if let Some((x, y)) = Self::index(p.x, p.y) {
            self.colors[x][y] = color
        }
    }

    pub fn with_entity(mut self, p: Position, entity: GameEntity) -> Self {
        self.set_entity(p, entity);
        self
    }

    pub fn with_color(mut self, p: Position, color: Color) -> Self {
        self.set_color(p, color);
        self
    }

    pub fn is_void(&self, x: i32, y: i32) -> bool {
        self.entity(x, y) == GameEntity::Void
    }

    pub fn is_dangerous(&self, x: i32, y: i32) -> bool {
        self.entity(x, y).is_dangerous()
    }

    pub fn is_coily(&self, x: i32, y: i32) -> bool {
        self.entity(x, y) == GameEntity::Coily
    }

    pub fn is_ball(&self, x: i32, y: i32) -> bool {
        self.entity(x, y).is_ball()
    }

    pub fn is_green(&self, x: i32, y: i32) -> bool {
        self.entity(x, y).is_green()
    }

    pub fn is_disc(&self, x: i32, y: i32) -> bool {
        self.entity(x, y) == GameEntity::Disc
    }

    pub fn has_color(&self, x: i32, y: i32, color: Color) -> bool {
        self.color(x, y) == Some(color)
    }

    pub fn player_position(&self) -> Option<Position> {
        (0..BOARD_SIZE as i32)
            .cartesian_product(0..BOARD_SIZE as i32)
            .find(|&(x, y)| self.entity(x, y) == GameEntity::Qbert)
            .map(|(x, y)| Position::new(x, y))
    }

    /// The most frequent block color other than unset; `0` for a board without colors.
    /// Ties go to the lower color code.
    pub fn dominant_color(&self) -> Color {
        self.colors
            .iter()
            .flatten()
            .filter(|&&c| c != 0)
            .counts()
            .into_iter()
            .max_by_key(|&(&color, count)| (count, std::cmp::Reverse(color)))
            .map_or(0, |(&color, _)| color)
    }
}

impl DebugVisualizer for Board {
    fn one_line_info(&self) -> String {
        let player = self.player_position().map_or("-".to_string(), |p| p.to_string());
        let hazards = self.entities.iter().flatten().filter(|e| e.is_dangerous()).count();
        format!("Board: player at {}, {} hazards, dominant color {}", player, hazards, self.dominant_color())
    }

    fn render_to_console(&self) -> Screen {
        let mut screen = Screen::new_empty(BOARD_SIZE as u32, BOARD_SIZE as u32);
        screen.clear();
        for x in 0..BOARD_SIZE {
            for y in 0..BOARD_SIZE {
                let entity = self.entities[x][y];
                if entity != GameEntity::Void {
                    screen.set_pxl(y as i32, x as i32, pixel::pxl(entity.symbol()));
                }
            }
        }
        screen
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in &self.entities {
            writeln!(f, "{}", row.iter().map(GameEntity::symbol).join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(-1, 0)]
    #[case(0, -1)]
    #[case(8, 3)]
    #[case(3, 8)]
    #[case(-100, 100)]
    #[case(i32::MIN, i32::MAX)]
    fn test_off_grid_sentinels(#[case] x: i32, #[case] y: i32) {
        let board = Board::pyramid(7)
            .with_entity(Position::new(0, 0), GameEntity::Coily)
            .with_entity(Position::new(7, 7), GameEntity::Disc);
        assert_eq!(board.entity(x, y), GameEntity::Void);
        assert!(board.is_void(x, y));
        assert!(!board.is_dangerous(x, y));
        assert!(!board.is_coily(x, y));
        assert!(!board.is_ball(x, y));
        assert!(!board.is_green(x, y));
        assert!(!board.is_disc(x, y));
        assert_eq!(board.color(x, y), None);
        assert!(!board.has_color(x, y, 0));
        assert!(!board.has_color(x, y, 7));
    }

    #[test]
    fn test_pyramid() {
        let board = Board::pyramid(5);
        assert_eq!(Board::block_positions().count(), 21);
        assert!(Board::block_positions().all(|p| p.x >= 1 && p.y >= 1 && p.x + p.y <= 7));
        assert_eq!(board.entity(1, 1), GameEntity::Empty);
        assert_eq!(board.entity(6, 1), GameEntity::Empty);
        assert_eq!(board.entity(1, 6), GameEntity::Empty);
        assert!(board.is_void(6, 2));
        assert!(board.is_void(0, 1));
        assert_eq!(board.color(3, 3), Some(5));
        assert_eq!(board.color(0, 0), Some(0));
    }

    #[test]
    fn test_player_position() {
        let board = Board::pyramid(5);
        assert_eq!(board.player_position(), None);
        let board = board.with_entity(Position::new(3, 2), GameEntity::Qbert);
        assert_eq!(board.player_position(), Some(Position::new(3, 2)));
    }

    #[test]
    fn test_dominant_color() {
        assert_eq!(Board::default().dominant_color(), 0);
        let board = Board::pyramid(5)
            .with_color(Position::new(1, 1), 9)
            .with_color(Position::new(2, 1), 9);
        assert_eq!(board.dominant_color(), 5);
        let board = Board::default()
            .with_color(Position::new(1, 1), 9)
            .with_color(Position::new(2, 1), 4);
        assert_eq!(board.dominant_color(), 4);
    }

    #[test]
    fn test_one_line_info() {
        let board = Board::pyramid(5)
            .with_entity(Position::new(2, 2), GameEntity::Qbert)
            .with_entity(Position::new(1, 1), GameEntity::RedBall);
        assert_eq!(board.one_line_info(), "Board: player at (2,2), 1 hazards, dominant color 5");
    }

    #[test]
    fn test_render_to_console() {
        let board = Board::pyramid(5)
            .with_entity(Position::new(3, 1), GameEntity::Qbert)
            .with_entity(DISC_CELLS[0], GameEntity::Disc);
        let screen = board.render_to_console();
        assert_eq!(screen.get_pxl(1, 3).unwrap().chr, 'q');
        assert_eq!(screen.get_pxl(1, 0).unwrap().chr, 'o');
        assert_eq!(screen.get_pxl(2, 2).unwrap().chr, '_');
    }
}
