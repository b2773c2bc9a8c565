use std::{
    fs::File,
    io::{self, stdout},
    path::{Path, PathBuf},
    sync::{
        mpsc::{channel, Sender},
        Arc, Mutex,
    },
    thread::{Builder, JoinHandle},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use board::{spawn_timer, Board, TimerId};
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyModifiers, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, ClearType},
};
use engine::{
    constants::{
        BACKGROUND_COLOR, DEFAULT_ATTEMPTS, DEFAULT_COUNTDOWN, FAST_TIMER_PERIOD, SCREEN_HEIGHT,
        SCREEN_WIDTH, SLOW_TIMER_PERIOD,
    },
    device::StatusOutputs,
    FrameBuffer, GameConfig, InterruptHandler, Outcome, Session, SharedState,
};
use display::{TerminalDisplay, TerminalOutputs};
use keymap::{translate, HeldKeys, Input};
use tracing::{error, info, warn};

mod board;
mod display;
mod keymap;

/// How long the keyboard thread waits for an event when no key is held.
const IDLE_POLL: Duration = Duration::from_millis(100);
/// How long the final frame stays up once the game is over.
const LINGER: Duration = Duration::from_secs(3);

#[derive(Parser)]
#[command(about = "mini-golf on an emulated interrupt-driven board")]
struct Cli {
    /// Course to play
    #[arg(long, default_value_t = 1)]
    course: u8,
    /// Shots allowed before the game is lost
    #[arg(long, default_value_t = DEFAULT_ATTEMPTS)]
    attempts: u32,
    /// Seconds to aim before the shot fires on its own
    #[arg(long, default_value_t = DEFAULT_COUNTDOWN)]
    countdown: u32,
    /// Playfield width in pixels
    #[arg(long, default_value_t = SCREEN_WIDTH)]
    width: usize,
    /// Playfield height in pixels
    #[arg(long, default_value_t = SCREEN_HEIGHT)]
    height: usize,
    /// Frames per second, the emulated vertical blank rate
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,
    /// Pixels per terminal column (and half-row)
    #[arg(long, default_value_t = 2)]
    scale: usize,
    /// Fast timer period in milliseconds (power and aim)
    #[arg(
        long,
        default_value_t = FAST_TIMER_PERIOD.as_millis() as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    fast_ms: u64,
    /// Slow timer period in milliseconds (countdown)
    #[arg(
        long,
        default_value_t = SLOW_TIMER_PERIOD.as_millis() as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    slow_ms: u64,
    /// Milliseconds without a key repeat before the key counts as released,
    /// on terminals that do not report releases
    #[arg(long, default_value_t = 500)]
    hold_ms: u64,
    /// Where log output goes
    #[arg(long, default_value = "golf.log")]
    log_file: PathBuf,
}

impl Cli {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            width: self.width,
            height: self.height,
            course_id: self.course,
            attempts: self.attempts,
            countdown: self.countdown,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    let config = cli.game_config();
    let shared = Arc::new(SharedState::new(config.countdown));
    let session =
        Session::new(&config, Arc::clone(&shared)).context("could not set up the game")?;
    let display = TerminalDisplay::new(cli.scale, BACKGROUND_COLOR, cli.fps);
    let (columns, rows) = display.cells(config.width, config.height);
    if let Ok((term_columns, term_rows)) = terminal::size() {
        if term_columns < columns || term_rows <= rows {
            warn!(
                term_columns,
                term_rows, columns, rows, "terminal is smaller than the playfield"
            );
        }
    }
    let handler = InterruptHandler::new(Arc::clone(&shared), config.countdown);
    let board = Arc::new(Board::new(
        handler,
        TerminalOutputs::new(rows),
        Duration::from_millis(cli.fast_ms),
        Duration::from_millis(cli.slow_ms),
    ));

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal(false);
        original_hook(panic_info);
    }));

    let enhanced = enter_terminal()?;
    info!(?config, enhanced, "starting");
    let held = (!enhanced).then(|| HeldKeys::new(Duration::from_millis(cli.hold_ms)));
    let quit = play(session, display, &config, board, held);
    restore_terminal(enhanced);

    let quit = quit?;
    info!(?quit, "exiting");
    match quit {
        Quit::CtrlC => println!("^C"),
        Quit::Key => println!("quit"),
        Quit::InputLost => println!("lost the keyboard"),
        Quit::Finished(Outcome::Sunk { strokes: 1 }) => println!("hole in one!"),
        Quit::Finished(Outcome::Sunk { strokes }) => println!("sunk in {strokes} strokes"),
        Quit::Finished(Outcome::OutOfStrokes { strokes }) => {
            println!("out of strokes after {strokes} shots")
        }
    }
    Ok(())
}

fn init_logging(path: &Path) -> Result<()> {
    let log_file = File::create(path)
        .with_context(|| format!("could not create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Raw mode, alternate screen, hidden cursor. Returns whether the terminal
/// agreed to report key releases.
fn enter_terminal() -> Result<bool> {
    enable_raw_mode().context("could not enable raw mode")?;
    execute!(
        stdout(),
        terminal::EnterAlternateScreen,
        terminal::Clear(ClearType::All),
        cursor::Hide,
        cursor::MoveTo(0, 0)
    )
    .context("could not set up the terminal")?;
    let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            stdout(),
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .context("could not enable key release reporting")?;
    }
    Ok(enhanced)
}

fn restore_terminal(enhanced: bool) {
    if enhanced {
        let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
    }
    let _ = disable_raw_mode();
    let _ = execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show);
}

/// Runs the board until the game ends or the player quits.
fn play<O>(
    mut session: Session,
    mut display: TerminalDisplay,
    config: &GameConfig,
    board: Arc<Board<O>>,
    held: Option<HeldKeys>,
) -> Result<Quit>
where
    O: StatusOutputs + Send + 'static,
{
    let (quit_tx, quit_rx) = channel();
    spawn_timer(&board, TimerId::Fast).context("could not start the fast timer")?;
    spawn_timer(&board, TimerId::Slow).context("could not start the slow timer")?;
    spawn_keyboard(Arc::clone(&board), quit_tx, held)
        .context("could not start the keyboard listener")?;

    let mut fb = FrameBuffer::new(config.width, config.height, BACKGROUND_COLOR);
    loop {
        if let Ok(quit) = quit_rx.try_recv() {
            return Ok(quit);
        }
        session.run_frame(&mut fb, &mut display, &mut &*board);
        if let Some(outcome) = session.outcome() {
            // leave the last frame up for a moment; any quit key skips it.
            let _ = quit_rx.recv_timeout(LINGER);
            return Ok(Quit::Finished(outcome));
        }
    }
}

/// The PS/2 keyboard: turns terminal key events into scan codes and raises
/// the keyboard interrupt for them.
fn spawn_keyboard<O>(
    board: Arc<Board<O>>,
    quit_tx: Sender<Quit>,
    mut held: Option<HeldKeys>,
) -> io::Result<JoinHandle<()>>
where
    O: StatusOutputs + Send + 'static,
{
    Builder::new()
        .name("keyboard".to_owned())
        .spawn(move || loop {
            let now = Instant::now();
            let mut wait = IDLE_POLL;
            if let Some(held) = held.as_mut() {
                for key in held.expire(now) {
                    board.keyboard_bytes(&key.scan_codes(false));
                }
                wait = held.next_expiry(now).map_or(wait, |expiry| expiry.min(wait));
            }
            let event = match event::poll(wait) {
                Ok(false) => continue,
                Ok(true) => event::read(),
                Err(e) => Err(e),
            };
            let key_event = match event {
                Ok(Event::Key(key_event)) => key_event,
                Ok(_) => continue,
                Err(e) => {
                    error!(error = %e, "keyboard input failed");
                    let _ = quit_tx.send(Quit::InputLost);
                    return;
                }
            };
            match translate(&key_event) {
                Input::Quit if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                    let _ = quit_tx.send(Quit::CtrlC);
                }
                Input::Quit => {
                    let _ = quit_tx.send(Quit::Key);
                }
                Input::Key { key, pressed } => {
                    if let (true, Some(held)) = (pressed, held.as_mut()) {
                        held.press(key, Instant::now());
                    }
                    board.keyboard_bytes(&key.scan_codes(pressed));
                }
                Input::Ignored => {}
            }
        })
}

#[derive(Debug)]
enum Quit {
    CtrlC,
    Key,
    InputLost,
    Finished(Outcome),
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use engine::constants::{FAST_TIMER_PERIOD, SLOW_TIMER_PERIOD};

    use crate::Cli;

    #[test]
    fn timer_defaults_match_the_board() {
        let cli = Cli::try_parse_from(["golf"]).unwrap();
        assert_eq!(cli.fast_ms, FAST_TIMER_PERIOD.as_millis() as u64);
        assert_eq!(cli.slow_ms, SLOW_TIMER_PERIOD.as_millis() as u64);
        assert_eq!(cli.game_config(), engine::GameConfig::default());
    }

    #[test]
    fn zero_periods_are_rejected() {
        for flag in ["--fast-ms", "--slow-ms", "--fps"] {
            assert!(Cli::try_parse_from(["golf", flag, "0"]).is_err(), "{flag}");
            assert!(Cli::try_parse_from(["golf", flag, "1"]).is_ok(), "{flag}");
        }
    }
}
