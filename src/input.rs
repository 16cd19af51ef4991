use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{debug, info};
use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::snake::Direction;

/// How many decoded events may wait for the game loop.
pub const INPUT_QUEUE_DEPTH: usize = 1;

/// How long the reader waits for a key before checking whether anyone still listens.
const READ_POLL_MS: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Turn(Direction),
    Quit,
}

pub fn is_ctrl_c(ev: &KeyEvent) -> bool {
    ev.code == KeyCode::Char('c') && ev.modifiers.contains(KeyModifiers::CONTROL)
}

/// Maps a key press to a game event. Releases, repeats and unknown keys give `None`.
pub fn decode_key(ev: &KeyEvent) -> Option<InputEvent> {
    if ev.kind != KeyEventKind::Press {
        return None;
    }
    if is_ctrl_c(ev) {
        return Some(InputEvent::Quit);
    }

    match ev.code {
        KeyCode::Up | KeyCode::Char('w' | 'W') => Some(InputEvent::Turn(Direction::Up)),
        KeyCode::Left | KeyCode::Char('a' | 'A') => Some(InputEvent::Turn(Direction::Left)),
        KeyCode::Down | KeyCode::Char('s' | 'S') => Some(InputEvent::Turn(Direction::Down)),
        KeyCode::Right | KeyCode::Char('d' | 'D') => Some(InputEvent::Turn(Direction::Right)),
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Some(InputEvent::Quit),
        _ => None,
    }
}

pub fn channel() -> (Sender<InputEvent>, Receiver<InputEvent>) {
    mpsc::channel(INPUT_QUEUE_DEPTH)
}

/// Reads the terminal on its own thread and forwards decoded events.
///
/// The thread ends after forwarding `Quit`, or once the receiving side is gone.
/// Either way its sender is dropped, which closes the channel.
pub fn spawn_reader(tx: Sender<InputEvent>) -> io::Result<JoinHandle<io::Result<()>>> {
    thread::Builder::new()
        .name("input".into())
        .spawn(move || read_loop(tx))
}

fn read_loop(tx: Sender<InputEvent>) -> io::Result<()> {
    // Ends once nobody listens any more, checked between polls.
    let terminal_events = std::iter::from_fn(|| loop {
        if tx.is_closed() {
            return None;
        }
        match poll(Duration::from_millis(READ_POLL_MS)) {
            Ok(true) => return Some(read()),
            Ok(false) => continue,
            Err(err) => return Some(Err(err)),
        }
    });

    forward(terminal_events, &tx)
}

/// Decodes raw events and sends the meaningful ones. Stops after `Quit`,
/// when the receiver is gone or when the source runs dry.
fn forward(
    events: impl IntoIterator<Item = io::Result<Event>>,
    tx: &Sender<InputEvent>,
) -> io::Result<()> {
    for event in events {
        let decoded = match event? {
            Event::Key(key) => decode_key(&key),
            _ => None,
        };

        if let Some(decoded) = decoded {
            if tx.blocking_send(decoded).is_err() {
                break;
            }
            if decoded == InputEvent::Quit {
                info!("Quit requested");
                return Ok(());
            }
        }
    }

    debug!("Game loop is gone, input reader stops");
    Ok(())
}
