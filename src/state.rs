use crate::grid::Position;
use crate::snake::Snake;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    HitWall,
    HitSelf,
    /// The body covers every cell, nowhere left to put the consumable.
    BoardFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active,
    /// Terminal, nothing moves any more.
    Over(Ending),
}

/// Everything a frame needs. Owned by the game loop for the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub snake: Snake,
    /// Absent only once the board is full.
    pub consumable: Option<Position>,
    pub score: u32,
    pub phase: Phase,
}

impl GameState {
    pub fn new(snake: Snake, consumable: Option<Position>) -> Self {
        Self { snake, consumable, score: 0, phase: Phase::Active }
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn is_over(&self) -> bool {
        !self.is_active()
    }
}
