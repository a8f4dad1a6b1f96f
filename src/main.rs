use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use glitchbeat::{
    app_dirs::AppDirs,
    audio::{AudioBackend, AudioCatalog, AudioPlayer, NullBackend, RodioBackend},
    config::{ConfigStore, FileConfigStore},
    game::GameSession,
    report,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, GameEventSource, Runner, Ticker},
    section::Section,
    ui, TICK_RATE_MS,
};

/// four sections, seven keys, one degrading soundtrack
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A timed key-combo arcade TUI. Hold the requested keys together before the clock runs out; every miss pushes the soundtrack one error level deeper."
)]
pub struct Cli {
    /// playback volume, 0.0-1.0
    #[clap(short = 'v', long)]
    volume: Option<f32>,

    /// start muted (audio still loads and tracks position)
    #[clap(long)]
    mute: bool,

    /// run without an audio device
    #[clap(long)]
    silent: bool,

    /// JSON catalog overriding the built-in soundtrack table
    #[clap(long)]
    catalog: Option<PathBuf>,
}

struct App {
    session: GameSession,
    player: AudioPlayer,
    reported: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    init_tracing();

    let store = FileConfigStore::new();
    let mut cfg = store.load();
    if let Some(volume) = cli.volume {
        cfg.volume = volume.clamp(0.0, 1.0);
    }
    if cli.mute {
        cfg.muted = true;
    }
    if cli.silent {
        cfg.silent = true;
    }
    if let Some(path) = cli.catalog.clone() {
        cfg.catalog_path = Some(path);
    }
    let _ = store.save(&cfg);

    let catalog = match &cfg.catalog_path {
        Some(path) => AudioCatalog::from_json_file(path).unwrap_or_else(|e| {
            warn!("catalog override failed ({e}), using built-in table");
            AudioCatalog::builtin()
        }),
        None => AudioCatalog::builtin(),
    };
    let audio_backend: Box<dyn AudioBackend> = if cfg.silent {
        Box::new(NullBackend)
    } else {
        Box::new(RodioBackend::new())
    };
    let mut player = AudioPlayer::new(audio_backend, catalog);
    player.set_volume(cfg.volume);
    if cfg.muted {
        player.mute();
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    // Key-release events need the kitty protocol; chords still work without
    // it because success fires on the last key-down.
    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App {
        session: GameSession::new(),
        player,
        reported: false,
    };
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = run(&mut terminal, &mut app, &runner);

    app.player.reset();
    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    Ok(())
}

fn run<B: Backend, E: GameEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> io::Result<()> {
    // Load section 1's base variant before the first frame.
    app.player.sync_with(&app.session.snapshot());

    loop {
        terminal.draw(|f| ui::draw(f, &app.session.snapshot(), &app.player.snapshot()))?;

        match runner.step() {
            GameEvent::Tick => {
                app.session.on_tick();
                app.player.on_tick();
                maybe_start_second_pass(app);
                app.player.sync_with(&app.session.snapshot());

                if app.session.is_game_over() && !app.reported {
                    app.reported = true;
                    let snap = app.session.snapshot();
                    info!("run over: {}", ui::summary_line(&snap));
                    if let Err(e) = report::append_result(&snap) {
                        warn!("could not write results log: {e}");
                    }
                }
            }
            GameEvent::Resize => {}
            GameEvent::Quit => break,
            GameEvent::KeyDown { key, repeat } => handle_key_down(app, key, repeat),
            GameEvent::KeyUp(key) => app.session.on_key_up(key),
        }
    }

    Ok(())
}

fn handle_key_down(app: &mut App, key: char, repeat: bool) {
    // Any gesture doubles as the playback-retry affordance; the key still
    // reaches the game afterwards.
    if app.player.pending_play() {
        app.player.notify_user_gesture();
    }

    if app.session.is_game_over() {
        if key.eq_ignore_ascii_case(&'r') {
            app.session.reset_game();
            app.player.reset();
            app.reported = false;
        }
    } else {
        app.session.on_key_down(key, repeat);
    }
    app.player.sync_with(&app.session.snapshot());
}

/// Section 1 plays its first pass without challenges; once the track crosses
/// the midpoint of the nominal duration the second pass arms them.
fn maybe_start_second_pass(app: &mut App) {
    if app.session.is_game_over()
        || app.session.section() != Section::One
        || app.session.section_one_half_passed()
    {
        return;
    }
    let Some(cfg) = Section::One.config() else {
        return;
    };
    let half_ms = (cfg.section_duration_secs * 500.0) as u64;
    if app.player.position_ms() >= half_ms {
        app.session.start_section_challenges(Section::One);
    }
}

fn init_tracing() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(file) = std::fs::File::create(&path) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(file)
            .with_ansi(false)
            .try_init();
    }
}
