use std::io;
use std::time::Duration;

use log::{debug, info, warn};
use rand::Rng;
use tokio::sync::{mpsc::Receiver, oneshot};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::engine::{set_pending_direction, Engine};
use crate::input::InputEvent;
use crate::state::GameState;

/// Draws a frame. Called by the game loop once per tick with a read-only view of the state.
pub trait Renderer {
    fn render(&mut self, state: &GameState) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Quit,
    InputClosed,
    Shutdown,
}

/// The only owner of the live `GameState`. Ticks, input and the shutdown
/// signal are taken one at a time, so nothing mutates the state concurrently.
pub struct GameLoop<R: Rng> {
    engine: Engine<R>,
    state: GameState,
    tick_period: Duration,
}

impl<R: Rng> GameLoop<R> {
    pub fn new(engine: Engine<R>, state: GameState, tick_period: Duration) -> Self {
        GameLoop { engine, state, tick_period }
    }

    /// Runs until a quit key, the input channel closing or the shutdown signal.
    /// Hands the final state back together with what stopped the loop.
    ///
    /// After the game is over ticks keep rendering the last frame so the
    /// result stays on screen until the player quits.
    pub async fn run(
        mut self,
        renderer: &mut impl Renderer,
        mut input: Receiver<InputEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> (GameState, StopReason) {
        let mut ticker = interval_at(Instant::now() + self.tick_period, self.tick_period);
        // A late tick moves once and restarts the period, never catches up in a burst.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown_armed = true;

        draw(renderer, &self.state);

        let reason = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.engine.advance(&mut self.state);
                    draw(renderer, &self.state);
                }
                event = input.recv() => match event {
                    Some(InputEvent::Turn(dir)) => {
                        set_pending_direction(&mut self.state, dir);
                    }
                    Some(InputEvent::Quit) => break StopReason::Quit,
                    None => break StopReason::InputClosed,
                },
                res = &mut shutdown, if shutdown_armed => match res {
                    Ok(()) => break StopReason::Shutdown,
                    // Nobody left to signal, keep going.
                    Err(_) => {
                        debug!("Shutdown sender dropped");
                        shutdown_armed = false;
                    }
                },
            }
        };

        info!("Game loop stopped ({:?}), score {}", reason, self.state.score);
        (self.state, reason)
    }
}

fn draw(renderer: &mut impl Renderer, state: &GameState) {
    if let Err(err) = renderer.render(state) {
        warn!("Frame dropped: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::grid::Position;
    use crate::input;
    use crate::snake::{Direction, Snake};
    use crate::state::{Ending, Phase};
    use rand::{rngs::StdRng, SeedableRng};
    use tokio::time::sleep;

    const TICK: Duration = Duration::from_millis(120);

    #[derive(Default)]
    struct Recorder {
        frames: Vec<GameState>,
        drawn_at: Vec<Instant>,
        fail: bool,
    }

    impl Renderer for Recorder {
        fn render(&mut self, state: &GameState) -> io::Result<()> {
            self.frames.push(state.clone());
            self.drawn_at.push(Instant::now());
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::Other, "broken pipe"));
            }
            Ok(())
        }
    }

    fn game(segments: &[(i32, i32)], direction: Direction) -> GameLoop<StdRng> {
        let config = GameConfig::default();
        let engine = Engine::with_rng(&config, StdRng::seed_from_u64(1));
        let body = segments.iter().map(|&(x, y)| Position::new(x, y)).collect();
        let snake = Snake::from_segments(body, direction);
        let state = GameState::new(snake, Some(Position::new(0, 0)));
        GameLoop::new(engine, state, TICK)
    }

    fn head(state: &GameState) -> (i32, i32) {
        let head = state.snake.head();
        (head.x, head.y)
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_before_first_tick() {
        let (tx, rx) = input::channel();
        let (_stop, shutdown) = oneshot::channel();
        tx.send(InputEvent::Quit).await.unwrap();

        let mut recorder = Recorder::default();
        let (state, reason) = game(&[(10, 10)], Direction::Right)
            .run(&mut recorder, rx, shutdown)
            .await;

        assert_eq!(reason, StopReason::Quit);
        assert_eq!(head(&state), (10, 10));
        assert_eq!(recorder.frames.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_input_stops() {
        let (tx, rx) = input::channel();
        let (_stop, shutdown) = oneshot::channel();
        drop(tx);

        let mut recorder = Recorder::default();
        let (_, reason) = game(&[(10, 10)], Direction::Right)
            .run(&mut recorder, rx, shutdown)
            .await;

        assert_eq!(reason, StopReason::InputClosed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_signal_stops() {
        let (_tx, rx) = input::channel();
        let (stop, shutdown) = oneshot::channel();

        tokio::spawn(async move {
            sleep(TICK * 2 + TICK / 2).await;
            let _ = stop.send(());
        });

        let mut recorder = Recorder::default();
        let (state, reason) = game(&[(10, 10)], Direction::Right)
            .run(&mut recorder, rx, shutdown)
            .await;

        assert_eq!(reason, StopReason::Shutdown);
        assert_eq!(head(&state), (12, 10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_shutdown_sender_is_not_a_stop() {
        let (tx, rx) = input::channel();
        let (stop, shutdown) = oneshot::channel::<()>();
        drop(stop);

        tokio::spawn(async move {
            sleep(TICK + TICK / 2).await;
            let _ = tx.send(InputEvent::Quit).await;
        });

        let mut recorder = Recorder::default();
        let (state, reason) = game(&[(10, 10)], Direction::Right)
            .run(&mut recorder, rx, shutdown)
            .await;

        assert_eq!(reason, StopReason::Quit);
        assert_eq!(head(&state), (11, 10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_move_and_render() {
        let (tx, rx) = input::channel();
        let (_stop, shutdown) = oneshot::channel();

        tokio::spawn(async move {
            sleep(TICK * 3 + TICK / 2).await;
            let _ = tx.send(InputEvent::Quit).await;
        });

        let mut recorder = Recorder::default();
        let (state, _) = game(&[(10, 10)], Direction::Right)
            .run(&mut recorder, rx, shutdown)
            .await;

        assert_eq!(head(&state), (13, 10));
        let heads: Vec<_> = recorder.frames.iter().map(head).collect();
        assert_eq!(heads, vec![(10, 10), (11, 10), (12, 10), (13, 10)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_turns_wait_for_the_tick() {
        let (tx, rx) = input::channel();
        let (_stop, shutdown) = oneshot::channel();

        tokio::spawn(async move {
            // Rejected reversal, then a real turn.
            tx.send(InputEvent::Turn(Direction::Left)).await.unwrap();
            tx.send(InputEvent::Turn(Direction::Up)).await.unwrap();
            sleep(TICK * 2 + TICK / 2).await;
            let _ = tx.send(InputEvent::Quit).await;
        });

        let mut recorder = Recorder::default();
        let (state, _) = game(&[(10, 10), (9, 10)], Direction::Right)
            .run(&mut recorder, rx, shutdown)
            .await;

        // Turning never redraws, only ticks do.
        assert_eq!(recorder.frames.len(), 3);
        assert_eq!(head(&state), (10, 8));
        assert_eq!(state.snake.direction(), Direction::Up);
    }

    #[tokio::test(start_paused = true)]
    async fn test_game_over_keeps_rendering() {
        let (tx, rx) = input::channel();
        let (_stop, shutdown) = oneshot::channel();

        tokio::spawn(async move {
            sleep(TICK * 4 + TICK / 2).await;
            tx.send(InputEvent::Turn(Direction::Down)).await.unwrap();
            sleep(TICK).await;
            let _ = tx.send(InputEvent::Quit).await;
        });

        let mut recorder = Recorder::default();
        let (state, reason) = game(&[(24, 10)], Direction::Right)
            .run(&mut recorder, rx, shutdown)
            .await;

        assert_eq!(reason, StopReason::Quit);
        assert_eq!(state.phase, Phase::Over(Ending::HitWall));
        assert_eq!(head(&state), (25, 10));
        // Initial frame plus one per tick, frozen after the crash.
        assert_eq!(recorder.frames.len(), 6);
        let crashed = &recorder.frames[1];
        for frame in &recorder.frames[1..] {
            assert_eq!(frame.snake.body(), crashed.snake.body());
            assert_eq!(frame.score, crashed.score);
            assert_eq!(frame.consumable, crashed.consumable);
            assert_eq!(frame.phase, crashed.phase);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_errors_do_not_stop_the_loop() {
        let (tx, rx) = input::channel();
        let (_stop, shutdown) = oneshot::channel();

        tokio::spawn(async move {
            sleep(TICK * 2 + TICK / 2).await;
            let _ = tx.send(InputEvent::Quit).await;
        });

        let mut recorder = Recorder { fail: true, ..Default::default() };
        let (state, reason) = game(&[(10, 10)], Direction::Right)
            .run(&mut recorder, rx, shutdown)
            .await;

        assert_eq!(reason, StopReason::Quit);
        assert_eq!(head(&state), (12, 10));
        assert_eq!(recorder.frames.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_ticks_do_not_burst() {
        let (tx, rx) = input::channel();
        let (_stop, shutdown) = oneshot::channel();

        tokio::spawn(async move {
            sleep(TICK + TICK / 2).await;
            // Stall the clock past several periods at once.
            tokio::time::advance(TICK * 4).await;
            sleep(TICK * 2 + TICK / 4).await;
            let _ = tx.send(InputEvent::Quit).await;
        });

        let mut recorder = Recorder::default();
        let (state, _) = game(&[(10, 10)], Direction::Right)
            .run(&mut recorder, rx, shutdown)
            .await;

        let heads: Vec<_> = recorder.frames.iter().map(head).collect();
        assert_eq!(heads, vec![(10, 10), (11, 10), (12, 10), (13, 10), (14, 10)]);
        assert_eq!(head(&state), (14, 10));
        for pair in recorder.drawn_at[1..].windows(2) {
            assert!(pair[1] - pair[0] >= TICK, "two moves {:?} apart", pair[1] - pair[0]);
        }
    }
}
