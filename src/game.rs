use crate::challenge::{Challenge, KeyOutcome};
use crate::error_level::ErrorLevel;
use crate::section::{Phase, Section, CHALLENGE_FAILED_MS, EXPLOSION_MS};
use crate::TICK_RATE_MS;
use tracing::{debug, info};

/// Running tallies for the current section. All reset on section
/// (re)initialization and on full game reset. Under time-bounded sections
/// `total_challenges` is a display figure, not a hard bound: the timer, not
/// the tally, ends a section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionCounters {
    pub total_challenges: u32,
    pub completed_challenges: u32,
    pub correct_hits: u32,
    pub incorrect_hits: u32,
    pub section_time_remaining: f64,
    pub challenge_time_remaining: f64,
}

/// Immutable view of the session handed to observers (UI, audio sync, tests).
/// Snapshots are taken at transition boundaries, so no observer can see a
/// half-updated section/phase/error-level combination.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub section: Section,
    pub phase: Phase,
    pub error_level: u8,
    pub target_keys: Vec<char>,
    pub pressed_keys: Vec<char>,
    pub challenges_active: bool,
    pub total_challenges: u32,
    pub completed_challenges: u32,
    pub correct_hits: u32,
    pub incorrect_hits: u32,
    pub section_time_remaining: f64,
    pub challenge_time_remaining: f64,
    pub is_game_over: bool,
}

/// The authoritative session state machine. Processes one event at a time
/// (key-down, key-up, tick); every countdown and transient phase derives from
/// the tick, so a caller driving synthetic ticks controls time completely.
///
/// The caller owns the lifecycle: construct, feed events, drop. There are no
/// ambient singletons and no background timers.
#[derive(Debug)]
pub struct GameSession {
    section: Section,
    phase: Phase,
    error_level: ErrorLevel,
    counters: SessionCounters,
    challenge: Option<Challenge>,
    /// False during section 1's first, audio-only pass.
    challenges_active: bool,
    section_one_half_passed: bool,
    /// Countdown for the transient phases (failure flash, explosion).
    phase_ms_remaining: Option<u64>,
    /// Set while a failure outcome waits on its resolution timer, so the same
    /// outcome cannot be processed twice.
    outcome_pending: bool,
    is_game_over: bool,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    pub fn new() -> Self {
        let mut session = Self {
            section: Section::One,
            phase: Phase::Playing,
            error_level: ErrorLevel::new(),
            counters: SessionCounters {
                total_challenges: 0,
                completed_challenges: 0,
                correct_hits: 0,
                incorrect_hits: 0,
                section_time_remaining: 0.0,
                challenge_time_remaining: 0.0,
            },
            challenge: None,
            challenges_active: false,
            section_one_half_passed: false,
            phase_ms_remaining: None,
            outcome_pending: false,
            is_game_over: false,
        };
        session.initialize_section(Section::One);
        session
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error_level(&self) -> u8 {
        self.error_level.get()
    }

    pub fn is_game_over(&self) -> bool {
        self.is_game_over
    }

    /// True once section 1's audio midpoint has activated its challenges.
    pub fn section_one_half_passed(&self) -> bool {
        self.section_one_half_passed
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            section: self.section,
            phase: self.phase,
            error_level: self.error_level.get(),
            target_keys: self
                .challenge
                .as_ref()
                .map(|c| c.target_keys().to_vec())
                .unwrap_or_default(),
            pressed_keys: self
                .challenge
                .as_ref()
                .map(|c| c.pressed_keys())
                .unwrap_or_default(),
            challenges_active: self.challenges_active,
            total_challenges: self.counters.total_challenges,
            completed_challenges: self.counters.completed_challenges,
            correct_hits: self.counters.correct_hits,
            incorrect_hits: self.counters.incorrect_hits,
            section_time_remaining: self.counters.section_time_remaining,
            challenge_time_remaining: self.counters.challenge_time_remaining,
            is_game_over: self.is_game_over,
        }
    }

    /// (Re)initialize a section: fresh config, zeroed tallies, error level 0.
    /// Section 1 starts with challenges disabled; its first pass is audio-only
    /// and `start_section_challenges` arms the second pass at the midpoint.
    fn initialize_section(&mut self, section: Section) {
        let Some(cfg) = section.config() else {
            return;
        };
        info!(section = %section, "initializing section");
        self.section = section;
        self.phase = Phase::Playing;
        self.error_level.reset();
        self.challenges_active = section != Section::One;
        self.counters = SessionCounters {
            total_challenges: if self.challenges_active {
                cfg.total_challenges
            } else {
                0
            },
            completed_challenges: 0,
            correct_hits: 0,
            incorrect_hits: 0,
            section_time_remaining: cfg.section_duration_secs,
            challenge_time_remaining: cfg.challenge_time_secs,
        };
        self.challenge = if self.challenges_active {
            Some(Challenge::generate(cfg.keys_per_challenge))
        } else {
            None
        };
        if section == Section::One {
            self.section_one_half_passed = false;
        }
        self.phase_ms_remaining = None;
        self.outcome_pending = false;
    }

    /// Activate challenges for the current section, zeroing tallies and error
    /// level. Invoked externally when the audio engine reports section 1's
    /// midpoint; a no-op for any other section or after the run ends.
    pub fn start_section_challenges(&mut self, section: Section) {
        if self.is_game_over || section != self.section {
            return;
        }
        let Some(cfg) = section.config() else {
            return;
        };
        info!(section = %section, "starting section challenges");
        self.phase = Phase::Playing;
        self.error_level.reset();
        self.challenges_active = true;
        self.counters.total_challenges = cfg.total_challenges;
        self.counters.completed_challenges = 0;
        self.counters.correct_hits = 0;
        self.counters.incorrect_hits = 0;
        self.counters.challenge_time_remaining = cfg.challenge_time_secs;
        self.challenge = Some(Challenge::generate(cfg.keys_per_challenge));
        if section == Section::One {
            self.section_one_half_passed = true;
        }
        self.phase_ms_remaining = None;
        self.outcome_pending = false;
    }

    /// Restore the exact state produced by fresh initialization of section 1.
    pub fn reset_game(&mut self) {
        info!("resetting game");
        *self = GameSession::new();
    }

    pub fn on_key_down(&mut self, key: char, repeat: bool) {
        if repeat
            || self.is_game_over
            || self.phase != Phase::Playing
            || !self.challenges_active
        {
            return;
        }
        let Some(challenge) = self.challenge.as_mut() else {
            return;
        };
        match challenge.key_down(key) {
            KeyOutcome::Success => self.complete_challenge_success(),
            KeyOutcome::Failure => self.complete_challenge_failure("wrong key"),
            KeyOutcome::Progress | KeyOutcome::Ignored => {}
        }
    }

    pub fn on_key_up(&mut self, key: char) {
        if let Some(challenge) = self.challenge.as_mut() {
            challenge.key_up(key);
        }
    }

    /// Advance the session by one tick of [`TICK_RATE_MS`].
    pub fn on_tick(&mut self) {
        if self.is_game_over {
            return;
        }
        let dt = TICK_RATE_MS as f64 / 1000.0;

        match self.phase {
            Phase::Exploding => {
                // Section timer is frozen; only the terminal transition runs.
                if self.tick_phase_timer() {
                    self.finish(false);
                }
                return;
            }
            Phase::ChallengeFailed => {
                // The failure flash blocks input but the section clock keeps
                // running underneath it.
                self.counters.section_time_remaining -= dt;
                if self.tick_phase_timer() {
                    self.phase = Phase::Playing;
                    self.outcome_pending = false;
                    self.issue_new_challenge();
                }
            }
            Phase::Playing => {
                self.counters.section_time_remaining -= dt;
                if self.challenges_active && self.challenge.is_some() {
                    self.counters.challenge_time_remaining -= dt;
                    if self.counters.challenge_time_remaining <= 0.0 {
                        self.complete_challenge_failure("timeout");
                    }
                }
            }
        }

        if self.counters.section_time_remaining <= 0.0 {
            self.evaluate_section_end();
        }
    }

    /// Returns true when the transient-phase countdown fires this tick.
    fn tick_phase_timer(&mut self) -> bool {
        match self.phase_ms_remaining.as_mut() {
            Some(ms) => {
                *ms = ms.saturating_sub(TICK_RATE_MS);
                if *ms == 0 {
                    self.phase_ms_remaining = None;
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    fn complete_challenge_success(&mut self) {
        self.counters.correct_hits += 1;
        self.counters.completed_challenges += 1;
        debug!(
            completed = self.counters.completed_challenges,
            correct = self.counters.correct_hits,
            "challenge succeeded"
        );
        self.issue_new_challenge();
    }

    fn complete_challenge_failure(&mut self, reason: &str) {
        // Guard against a second resolution while the flash timer is pending.
        if self.outcome_pending {
            return;
        }
        self.outcome_pending = true;
        self.counters.incorrect_hits += 1;
        self.counters.completed_challenges += 1;
        self.error_level.increment();
        debug!(
            reason,
            error_level = self.error_level.get(),
            "challenge failed"
        );
        self.challenge = None;
        self.phase = Phase::ChallengeFailed;
        self.phase_ms_remaining = Some(CHALLENGE_FAILED_MS);
    }

    fn issue_new_challenge(&mut self) {
        if !self.challenges_active {
            return;
        }
        let Some(cfg) = self.section.config() else {
            return;
        };
        self.counters.challenge_time_remaining = cfg.challenge_time_secs;
        self.challenge = Some(Challenge::generate(cfg.keys_per_challenge));
    }

    /// The section clock has run out. Section 1 always advances; sections 2-4
    /// gate on the minimum correct-hit count, failing into the explosion.
    fn evaluate_section_end(&mut self) {
        match self.section {
            Section::Final => {}
            Section::One => self.advance(Section::Two),
            section => {
                let min = section
                    .config()
                    .map(|c| c.min_correct_hits)
                    .unwrap_or_default();
                if self.counters.correct_hits >= min {
                    self.advance(section.next());
                } else {
                    info!(
                        section = %section,
                        correct = self.counters.correct_hits,
                        min, "section failed"
                    );
                    self.challenge = None;
                    self.phase = Phase::Exploding;
                    self.phase_ms_remaining = Some(EXPLOSION_MS);
                }
            }
        }
    }

    fn advance(&mut self, next: Section) {
        if next == Section::Final {
            self.finish(true);
        } else {
            self.initialize_section(next);
        }
    }

    fn finish(&mut self, passed: bool) {
        info!(passed, "run ended");
        self.section = Section::Final;
        self.phase = Phase::Playing;
        self.challenge = None;
        self.challenges_active = false;
        self.phase_ms_remaining = None;
        self.outcome_pending = false;
        self.is_game_over = true;
    }
}
