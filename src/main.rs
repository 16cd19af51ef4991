mod config;
mod engine;
mod food;
mod game;
mod grid;
mod input;
mod snake;
mod state;
mod term;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info, LevelFilter};
use simplelog::{Config, WriteLogger};
use tokio::sync::oneshot;

use crate::config::{
    GameConfig, DEFAULT_HEIGHT, DEFAULT_INITIAL_LENGTH, DEFAULT_REWARD, DEFAULT_TICK_MS,
    DEFAULT_WIDTH,
};
use crate::engine::Engine;
use crate::game::GameLoop;
use crate::input::{decode_key, InputEvent};
use crate::state::GameState;
use crate::term::TermManager;

#[derive(Parser)]
#[command(name = "term-snake")]
#[command(version, about = "Snake in the terminal")]
struct Cli {
    /// Board width in cells
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: u16,

    /// Board height in cells
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: u16,

    /// Milliseconds between two moves
    #[arg(long, default_value_t = DEFAULT_TICK_MS)]
    tick_ms: u64,

    /// Score for each consumable eaten
    #[arg(long, default_value_t = DEFAULT_REWARD)]
    reward: u32,

    /// Initial snake length
    #[arg(long, default_value_t = DEFAULT_INITIAL_LENGTH)]
    length: usize,

    /// Log file, the terminal itself is busy drawing the game
    #[arg(long, default_value = "snake.log")]
    log_file: PathBuf,

    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

impl Cli {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            tick_period: Duration::from_millis(self.tick_ms),
            reward: self.reward,
            initial_length: self.length,
            ..GameConfig::new(self.width, self.height)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = File::create(&cli.log_file)
        .with_context(|| format!("Failed to create log file {}", cli.log_file.display()))?;
    WriteLogger::init(cli.log_level, Config::default(), log_file)
        .context("Failed to initialize logger")?;

    let config = cli.game_config();
    config.validate().context("Invalid game configuration")?;

    let mut term = TermManager::new(config.grid);
    if !term.fits_terminal().context("Failed to read terminal size")? {
        let (w, h) = TermManager::required_size(config.grid);
        bail!(
            "Terminal too small, a {}x{} board needs {}x{}",
            config.grid.width,
            config.grid.height,
            w,
            h
        );
    }

    term.setup().context("Failed to set up terminal")?;
    let played = play(&mut term, &config).await;
    let restored = term.restore();

    if let Some(state) = settle(played, restored)? {
        println!("Final score: {}", state.score);
    }

    Ok(())
}

/// What went wrong while playing outranks a failed terminal restore.
fn settle<T>(played: Result<T>, restored: io::Result<()>) -> Result<T> {
    let value = played?;
    restored.context("Failed to restore terminal")?;
    Ok(value)
}

/// Welcome screen, then one run of the game. `None` if the player quit on the welcome screen.
async fn play(term: &mut TermManager, config: &GameConfig) -> Result<Option<GameState>> {
    term.show_intro().context("Failed to draw welcome screen")?;
    let key = term.read_key_blocking().context("Failed to read key")?;
    if decode_key(&key) == Some(InputEvent::Quit) {
        info!("Quit on welcome screen");
        return Ok(None);
    }

    let mut engine = Engine::new(config);
    let state = engine.new_game(config);

    let (tx, rx) = input::channel();
    let reader = input::spawn_reader(tx).context("Failed to start input reader")?;

    let (stop, shutdown) = oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop.send(());
        }
    });

    let (state, _) = GameLoop::new(engine, state, config.tick_period)
        .run(term, rx, shutdown)
        .await;

    // The receiver is gone now, the reader notices on its next poll.
    match tokio::task::spawn_blocking(move || reader.join()).await {
        Ok(Ok(Err(err))) => error!("Input reader failed: {}", err),
        Ok(Err(_)) => error!("Input reader panicked"),
        _ => {}
    }

    Ok(Some(state))
}
