use log::{debug, info, trace};
use rand::{rngs::ThreadRng, Rng};

use crate::config::GameConfig;
use crate::food::place_consumable;
use crate::grid::Grid;
use crate::snake::{Direction, Snake};
use crate::state::{Ending, GameState, Phase};

/// Movement and collision rules. Holds no game state of its own, only the
/// board, the reward and the random source used for placement.
pub struct Engine<R: Rng = ThreadRng> {
    grid: Grid,
    reward: u32,
    rng: R,
}

impl Engine {
    pub fn new(config: &GameConfig) -> Self {
        Engine::with_rng(config, rand::thread_rng())
    }
}

impl<R: Rng> Engine<R> {
    pub fn with_rng(config: &GameConfig, rng: R) -> Self {
        Engine { grid: config.grid, reward: config.reward, rng }
    }

    /// Fresh state: snake heading right from the start cell, one consumable on the board.
    pub fn new_game(&mut self, config: &GameConfig) -> GameState {
        let snake = Snake::new(config.start_position(), config.initial_length, Direction::Right);
        let consumable = place_consumable(self.grid, snake.body(), &mut self.rng);

        let mut state = GameState::new(snake, consumable);
        if consumable.is_none() {
            state.phase = Phase::Over(Ending::BoardFull);
        }

        info!("New game on a {}x{} board", self.grid.width, self.grid.height);
        state
    }

    /// One tick. Moves the snake along its queued heading, eats, grows and
    /// checks for collisions. Does nothing once the game is over.
    pub fn advance(&mut self, state: &mut GameState) {
        if state.is_over() {
            return;
        }
        debug_assert!(!state.snake.is_empty());

        let next = state.snake.head().offset(state.snake.pending_direction().delta());
        let ate = state.consumable == Some(next);

        let new_head = state.snake.step(ate);
        trace!("Head moved to ({}, {})", new_head.x, new_head.y);

        if ate {
            state.score = state.score.saturating_add(self.reward);
            state.consumable = place_consumable(self.grid, state.snake.body(), &mut self.rng);
            debug!("Consumable eaten, score {}, next at {:?}", state.score, state.consumable);
        }

        // Checked against the already moved body, the head stays on the lethal cell.
        let ending = if !self.grid.contains(new_head) {
            Some(Ending::HitWall)
        } else if state.snake.bites_itself() {
            Some(Ending::HitSelf)
        } else if state.consumable.is_none() {
            Some(Ending::BoardFull)
        } else {
            None
        };

        match ending {
            Some(ending) => {
                state.phase = Phase::Over(ending);
                info!(
                    "Game over ({:?}), score {}, length {}",
                    ending,
                    state.score,
                    state.snake.len()
                );
            }
            None => debug_assert!(state.snake.is_untangled()),
        }
    }
}

/// Queues `requested` as the next heading unless it reverses the current one.
/// Never moves anything; effective on the next `advance`.
pub fn set_pending_direction(state: &mut GameState, requested: Direction) -> bool {
    let accepted = state.snake.steer(requested);

    if accepted {
        debug!("Turn {:?} queued", requested);
    } else {
        debug!("Turn {:?} rejected, heading {:?}", requested, state.snake.direction());
    }

    accepted
}
