use std::time::Duration;

use thiserror::Error;

use crate::grid::{Grid, Position};

pub const DEFAULT_WIDTH: u16 = 25;
pub const DEFAULT_HEIGHT: u16 = 20;
pub const DEFAULT_TICK_MS: u64 = 120;
pub const DEFAULT_REWARD: u32 = 10;
pub const DEFAULT_INITIAL_LENGTH: usize = 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid must be at least 1x1, got {0}x{1}")]
    EmptyGrid(u16, u16),
    #[error("tick period must be longer than zero")]
    ZeroTick,
    #[error("initial snake length must be at least 1")]
    ZeroLength,
    #[error("a snake of length {length} does not fit left of column {start_x}")]
    SnakeTooLong { length: usize, start_x: i32 },
}

/// Scalar parameters of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub grid: Grid,
    pub tick_period: Duration,
    /// Score added for every consumable eaten
    pub reward: u32,
    pub initial_length: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid: Grid::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
            tick_period: Duration::from_millis(DEFAULT_TICK_MS),
            reward: DEFAULT_REWARD,
            initial_length: DEFAULT_INITIAL_LENGTH,
        }
    }
}

impl GameConfig {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            grid: Grid::new(width, height),
            ..Default::default()
        }
    }

    /// Where the head starts: two cells left of the centre column, on the centre row.
    pub fn start_position(&self) -> Position {
        Position::new(
            (self.grid.width / 2).saturating_sub(2) as i32,
            (self.grid.height / 2) as i32,
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(ConfigError::EmptyGrid(self.grid.width, self.grid.height));
        }
        if self.tick_period.is_zero() {
            return Err(ConfigError::ZeroTick);
        }
        if self.initial_length == 0 {
            return Err(ConfigError::ZeroLength);
        }

        // The body trails to the left of the head.
        let start_x = self.start_position().x;
        if self.initial_length > start_x as usize + 1 {
            return Err(ConfigError::SnakeTooLong { length: self.initial_length, start_x });
        }

        Ok(())
    }
}
