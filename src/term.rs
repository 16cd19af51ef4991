use std::io::{self, Stdout, Write, stdout};

use crossterm::{cursor, execute, queue, terminal};
use crossterm::event::{Event, KeyEvent, KeyEventKind, read};
use crossterm::style::{
    Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};

use crate::game::Renderer;
use crate::grid::{Grid, Position};
use crate::state::{Ending, GameState, Phase};

const SNAKE_BODY_CHAR: char = '▣';
const CONSUMABLE_CHAR: char = '◆';
const BORDER_CHAR: char = '■';
const DEAD_SNAKE_CHAR: char = 'X';

const SNAKE_COLOR: Color = Color::Green;
const CONSUMABLE_COLOR: Color = Color::Red;
const BORDER_COLOR: Color = Color::Cyan;
const TEXT_COLOR: Color = Color::Yellow;
const BAR_COLOR: Color = Color::Blue;

/// Owns the terminal: raw mode, alternate screen and frame drawing.
/// The board sits inside a one-cell border with the score bar below it.
pub struct TermManager {
    grid: Grid,
    stdout: Stdout,
}

impl TermManager {
    pub fn new(grid: Grid) -> Self {
        TermManager { grid, stdout: stdout() }
    }

    /// Columns and rows needed for the framed board plus the score bar.
    pub fn required_size(grid: Grid) -> (u16, u16) {
        (grid.width.saturating_add(2), grid.height.saturating_add(3))
    }

    pub fn fits_terminal(&self) -> io::Result<bool> {
        let (w, h) = terminal::size()?;
        let (need_w, need_h) = Self::required_size(self.grid);
        Ok(w >= need_w && h >= need_h)
    }

    /// Enters the alternate screen in raw mode. Undoes whatever it did on failure.
    pub fn setup(&mut self) -> io::Result<()> {
        execute!(self.stdout, EnterAlternateScreen)?;

        let res = terminal::enable_raw_mode()
            .and_then(|_| execute!(self.stdout, cursor::Hide, cursor::DisableBlinking));
        if res.is_err() {
            let _ = self.restore();
        }
        res
    }

    /// Runs every step even if an earlier one fails, reporting the first error.
    pub fn restore(&mut self) -> io::Result<()> {
        let raw = terminal::disable_raw_mode();
        let screen = execute!(
            self.stdout,
            ResetColor,
            cursor::Show,
            cursor::EnableBlinking,
            LeaveAlternateScreen
        );
        raw.and(screen)
    }

    pub fn read_key_blocking(&self) -> io::Result<KeyEvent> {
        loop {
            if let Event::Key(ev) = read()? {
                if ev.kind == KeyEventKind::Press {
                    return Ok(ev);
                }
            }
        }
    }

    pub fn show_intro(&mut self) -> io::Result<()> {
        queue!(self.stdout, terminal::Clear(ClearType::All))?;
        self.draw_borders()?;
        self.show_message(&[
            "SNAKE",
            "",
            "Arrow keys or WASD to move",
            "Eat the \u{25c6} to grow",
            "Avoid walls and yourself!",
            "Q or Esc to quit",
            "",
            "Press any key to start",
        ], TEXT_COLOR)?;
        self.flush()
    }

    /// Screen cell for a board cell. The border ring is allowed so a head
    /// that crashed into the wall stays visible.
    fn screen_cell(&self, pos: Position) -> Option<(u16, u16)> {
        let (x, y) = (pos.x + 1, pos.y + 1);
        let (max_x, max_y) = (self.grid.width as i32 + 1, self.grid.height as i32 + 1);

        if x < 0 || y < 0 || x > max_x || y > max_y {
            return None;
        }
        Some((x as u16, y as u16))
    }

    fn print_at(&mut self, pos: (u16, u16), ch: char, color: Color) -> io::Result<()> {
        queue!(self.stdout, cursor::MoveTo(pos.0, pos.1), SetForegroundColor(color), Print(ch))
    }

    fn draw_borders(&mut self) -> io::Result<()> {
        let end_x = self.grid.width + 1;
        let end_y = self.grid.height + 1;

        for x in 0..=end_x {
            self.print_at((x, 0), BORDER_CHAR, BORDER_COLOR)?;
            self.print_at((x, end_y), BORDER_CHAR, BORDER_COLOR)?;
        }

        for y in 1..end_y {
            self.print_at((0, y), BORDER_CHAR, BORDER_COLOR)?;
            self.print_at((end_x, y), BORDER_CHAR, BORDER_COLOR)?;
        }

        Ok(())
    }

    fn draw_snake(&mut self, state: &GameState) -> io::Result<()> {
        let dead = matches!(state.phase, Phase::Over(Ending::HitWall | Ending::HitSelf));
        let head_char = state.snake.direction().head_char();

        // Tail first so the head wins if it overlaps a segment.
        for (i, pos) in state.snake.body().iter().enumerate().rev() {
            let ch = match (i, dead) {
                (_, true) => DEAD_SNAKE_CHAR,
                (0, false) => head_char,
                _ => SNAKE_BODY_CHAR,
            };

            if let Some(cell) = self.screen_cell(*pos) {
                if i == 0 {
                    queue!(self.stdout, SetAttribute(Attribute::Bold))?;
                }
                self.print_at(cell, ch, SNAKE_COLOR)?;
                queue!(self.stdout, SetAttribute(Attribute::Reset))?;
            }
        }

        Ok(())
    }

    fn draw_score_bar(&mut self, score: u32) -> io::Result<()> {
        let y = self.grid.height + 2;
        let score_text = format!(" SCORE: {} ", score);
        let hint = " Q TO QUIT ";

        queue!(
            self.stdout,
            cursor::MoveTo(1, y),
            SetBackgroundColor(BAR_COLOR),
            SetForegroundColor(Color::White),
            SetAttribute(Attribute::Bold),
            Print(&score_text),
            SetAttribute(Attribute::Reset)
        )?;

        let hint_x = (self.grid.width + 1).saturating_sub(hint.len() as u16);
        if hint_x as usize > score_text.len() + 1 {
            queue!(
                self.stdout,
                cursor::MoveTo(hint_x, y),
                SetBackgroundColor(BAR_COLOR),
                SetForegroundColor(TEXT_COLOR),
                Print(hint)
            )?;
        }

        queue!(self.stdout, ResetColor)
    }

    /// Boxed, centred lines over the board.
    fn show_message(&mut self, lines: &[&str], color: Color) -> io::Result<()> {
        let inner = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 2;
        let (frame_w, frame_h) = (self.grid.width as usize + 2, self.grid.height as usize + 2);

        let left = frame_w.saturating_sub(inner + 2) / 2;
        let top = frame_h.saturating_sub(lines.len() + 2) / 2;

        let bar = "═".repeat(inner);
        let mut rows = Vec::with_capacity(lines.len() + 2);
        rows.push(format!("╔{}╗", bar));
        rows.extend(lines.iter().map(|line| format!("║{: ^width$}║", line, width = inner)));
        rows.push(format!("╚{}╝", bar));

        queue!(self.stdout, SetForegroundColor(color), SetAttribute(Attribute::Bold))?;
        for (i, row) in rows.iter().enumerate() {
            queue!(self.stdout, cursor::MoveTo(left as u16, (top + i) as u16), Print(row))?;
        }
        queue!(self.stdout, SetAttribute(Attribute::Reset), ResetColor)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}

impl Renderer for TermManager {
    fn render(&mut self, state: &GameState) -> io::Result<()> {
        queue!(self.stdout, terminal::Clear(ClearType::All))?;
        self.draw_borders()?;

        if let Some(cell) = state.consumable.and_then(|pos| self.screen_cell(pos)) {
            self.print_at(cell, CONSUMABLE_CHAR, CONSUMABLE_COLOR)?;
        }

        self.draw_snake(state)?;
        self.draw_score_bar(state.score)?;

        if let Phase::Over(ending) = state.phase {
            let (title, color) = match ending {
                Ending::BoardFull => ("YOU WIN", Color::Green),
                Ending::HitWall | Ending::HitSelf => ("GAME OVER", Color::Red),
            };
            let score = format!("FINAL SCORE: {}", state.score);
            self.show_message(&[title, "", score.as_str(), "", "PRESS Q TO QUIT"], color)?;
        }

        self.flush()
    }
}
