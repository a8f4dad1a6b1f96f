use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEventKind, KeyModifiers};

/// Domain-level events consumed by the game loop. Terminal input is
/// translated at the source, so nothing past this seam sees crossterm types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// A character key went down. `repeat` marks OS key-repeat, which the
    /// session must not count as a new press.
    KeyDown { key: char, repeat: bool },
    /// A character key was released (requires the kitty keyboard protocol;
    /// terminals without it simply never produce these).
    KeyUp(char),
    /// Esc or ctrl-c.
    Quit,
    Resize,
    Tick,
}

/// Map one raw terminal event to its domain event, if it has one. Non-quit
/// special keys are dropped here rather than in every consumer.
pub fn translate(ev: CtEvent) -> Option<GameEvent> {
    match ev {
        CtEvent::Key(key) => match (key.code, key.kind) {
            (KeyCode::Esc, KeyEventKind::Press) => Some(GameEvent::Quit),
            (KeyCode::Char('c'), KeyEventKind::Press)
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                Some(GameEvent::Quit)
            }
            (KeyCode::Char(c), KeyEventKind::Press) => Some(GameEvent::KeyDown {
                key: c,
                repeat: false,
            }),
            (KeyCode::Char(c), KeyEventKind::Repeat) => Some(GameEvent::KeyDown {
                key: c,
                repeat: true,
            }),
            (KeyCode::Char(c), KeyEventKind::Release) => Some(GameEvent::KeyUp(c)),
            _ => None,
        },
        CtEvent::Resize(_, _) => Some(GameEvent::Resize),
        _ => None,
    }
}

/// Source of domain events for the game loop.
pub trait GameEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Production event source: a background thread reads crossterm events,
/// translates them, and feeds the channel.
pub struct CrosstermEventSource {
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(raw) => {
                    if let Some(ev) = translate(raw) {
                        if tx.send(ev).is_err() {
                            break;
                        }
                    }
                }
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GameEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source fed from a plain channel
pub struct TestEventSource {
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl GameEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: GameEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: GameEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> GameEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => GameEvent::Tick,
        }
    }
}
