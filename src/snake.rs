use std::collections::VecDeque;

use crate::grid::{overlaps, Position};
use Direction::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

impl Direction {
    pub fn opposite(&self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    /// Unit step (dx, dy) with y growing downwards.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        }
    }

    pub fn head_char(&self) -> char {
        match self {
            Up => '^',
            Down => 'v',
            Left => '<',
            Right => '>',
        }
    }
}

/// The body, head first, together with its heading.
///
/// `pending` is what the next step will travel along; it only becomes the
/// heading when the step is taken, so turns queued between ticks never move
/// the snake by themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    body: VecDeque<Position>,
    direction: Direction,
    pending: Direction,
}

impl Snake {
    /// A straight snake of `size` cells with its head at `head`, the rest trailing behind it.
    pub fn new(head: Position, size: usize, direction: Direction) -> Self {
        let back = direction.opposite().delta();
        let body = (0..size.max(1) as i32)
            .map(|i| Position::new(head.x + back.0 * i, head.y + back.1 * i))
            .collect();

        Snake { body, direction, pending: direction }
    }

    /// Builds a snake from explicit segments, head first. Panics on an empty body.
    #[cfg(test)]
    pub fn from_segments(segments: Vec<Position>, direction: Direction) -> Self {
        assert!(!segments.is_empty(), "a snake needs at least one segment");
        Snake { body: segments.into(), direction, pending: direction }
    }

    pub fn body(&self) -> &VecDeque<Position> {
        &self.body
    }

    pub fn head(&self) -> Position {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn pending_direction(&self) -> Direction {
        self.pending
    }

    /// Queues a turn for the next step. A request that would reverse the current
    /// heading is dropped; otherwise it replaces whatever was queued before.
    /// Returns whether the request was kept.
    pub fn steer(&mut self, requested: Direction) -> bool {
        if requested == self.direction.opposite() {
            return false;
        }

        self.pending = requested;
        true
    }

    /// Commits the queued heading and moves one cell along it. The tail is kept
    /// when `grow` is set. Returns the new head.
    pub fn step(&mut self, grow: bool) -> Position {
        self.direction = self.pending;

        let new_head = self.head().offset(self.direction.delta());
        self.body.push_front(new_head);

        if !grow {
            self.body.pop_back();
        }

        new_head
    }

    /// True if the head sits on any other segment.
    pub fn bites_itself(&self) -> bool {
        overlaps(self.head(), self.body.iter().skip(1))
    }

    /// True if all segments are pairwise distinct.
    pub fn is_untangled(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.body.len());
        self.body.iter().all(|pos| seen.insert(*pos))
    }
}
