use super::backend::{AudioBackend, AudioSink};
use super::catalog::AudioCatalog;
use super::AudioError;
use crate::game::GameSnapshot;
use crate::section::Section;
use crate::TICK_RATE_MS;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The one live audio resource plus its nominal cap.
struct PlaybackSession {
    sink: Box<dyn AudioSink>,
    nominal: Duration,
}

/// Read-only view of the player for the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub playing: bool,
    pub pending_play: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub muted: bool,
}

/// Audio synchronization engine. Resolves (section, error level) to a
/// fragment, hot-swaps variants without losing the playback position, caps
/// each fragment at its nominal duration, and recovers from blocked playback
/// on the next user gesture.
///
/// Position is tracked logically and advanced by the engine tick, so the
/// player is exactly as deterministic as the session driving it.
pub struct AudioPlayer {
    backend: Box<dyn AudioBackend>,
    catalog: AudioCatalog,
    session: Option<PlaybackSession>,
    /// Last requested (section, error level), kept even while silent so a
    /// retry knows what to reload.
    current: Option<(Section, u8)>,
    position: Duration,
    playing: bool,
    pending_play: bool,
    volume: f32,
    muted: bool,
}

impl AudioPlayer {
    pub fn new(backend: Box<dyn AudioBackend>, catalog: AudioCatalog) -> Self {
        Self {
            backend,
            catalog,
            session: None,
            current: None,
            position: Duration::ZERO,
            playing: false,
            pending_play: false,
            volume: 1.0,
            muted: false,
        }
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            playing: self.playing,
            pending_play: self.pending_play,
            position_ms: self.position.as_millis() as u64,
            duration_ms: self
                .session
                .as_ref()
                .map(|s| s.nominal.as_millis() as u64)
                .unwrap_or(0),
            muted: self.muted,
        }
    }

    pub fn position_ms(&self) -> u64 {
        self.position.as_millis() as u64
    }

    pub fn pending_play(&self) -> bool {
        self.pending_play
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Switch to the variant for (section, level), preserving the playback
    /// position across the swap when it still fits in the new fragment. A
    /// missing fragment degrades to silence; a blocked device arms the
    /// pending-play retry.
    pub fn go_to(&mut self, section: Section, level: u8) {
        let prev_position = self.position;

        // Teardown strictly precedes construction of the next session; at
        // most one sink is ever alive.
        if let Some(mut old) = self.session.take() {
            old.sink.pause();
        }
        self.playing = false;
        self.current = Some((section, level));

        let (file, nominal) = match self.catalog.resolve(section, level) {
            Some(fragment) => (
                fragment.file.clone(),
                Duration::from_secs_f64(fragment.duration_secs),
            ),
            None => {
                warn!(
                    "{}",
                    AudioError::FragmentMissing {
                        section: section.number().unwrap_or(0),
                        level,
                    }
                );
                self.position = Duration::ZERO;
                self.pending_play = false;
                return;
            }
        };

        match self.backend.open(&file) {
            Ok(mut sink) => {
                sink.set_volume(self.effective_volume());
                if !prev_position.is_zero() && prev_position < nominal {
                    // Seamless swap: pick up where the old variant left off.
                    self.position = match sink.seek(prev_position) {
                        Ok(()) => prev_position,
                        Err(e) => {
                            warn!("seek failed, restarting fragment: {e}");
                            Duration::ZERO
                        }
                    };
                } else {
                    self.position = Duration::ZERO;
                }
                debug!(%section, level, file = %file.display(), "loaded fragment");
                self.session = Some(PlaybackSession { sink, nominal });
                self.play();
            }
            Err(AudioError::Blocked) => {
                info!("playback blocked while loading, waiting for user gesture");
                self.pending_play = true;
            }
            Err(e) => {
                warn!("audio backend failed, continuing silent: {e}");
                self.position = Duration::ZERO;
            }
        }
    }

    /// Attempt playback of the current fragment. On policy rejection the
    /// pending-play flag is set and the attempt is repeated on the next user
    /// gesture.
    pub fn play(&mut self) {
        if self.session.is_none() {
            // A blocked or failed open left no live session; reload first.
            if let Some((section, level)) = self.current {
                self.go_to(section, level);
            }
            return;
        }
        let session = self.session.as_mut().expect("session checked above");
        match session.sink.play() {
            Ok(()) => {
                self.playing = true;
                if self.pending_play {
                    info!("playback recovered after user gesture");
                }
                self.pending_play = false;
            }
            Err(AudioError::Blocked) => {
                info!("playback blocked, waiting for user gesture");
                self.playing = false;
                self.pending_play = true;
            }
            Err(e) => {
                warn!("playback failed: {e}");
                self.playing = false;
            }
        }
    }

    /// Pause and record the current position.
    pub fn pause(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.sink.pause();
        }
        self.playing = false;
    }

    /// Re-resolve the current section at a new error level, preserving
    /// position. No-op when the level is unchanged.
    pub fn set_error_level(&mut self, level: u8) {
        if let Some((section, current_level)) = self.current {
            if current_level != level {
                self.go_to(section, level);
            }
        }
    }

    /// Follow the session: new section restarts the track from the top, an
    /// error-level change hot-swaps in place, the terminal section pauses.
    pub fn sync_with(&mut self, snap: &GameSnapshot) {
        if snap.is_game_over || snap.section == Section::Final {
            if self.playing {
                self.pause();
            }
            return;
        }
        match self.current {
            Some((section, level)) if section == snap.section => {
                if level != snap.error_level {
                    self.set_error_level(snap.error_level);
                }
            }
            _ => {
                self.position = Duration::ZERO;
                self.go_to(snap.section, snap.error_level);
            }
        }
    }

    /// Any pointer/keyboard gesture while pending retries playback.
    pub fn notify_user_gesture(&mut self) {
        if self.pending_play {
            debug!("user gesture received, retrying playback");
            self.play();
        }
    }

    /// Explicit UI affordance for retrying blocked playback.
    pub fn request_user_play(&mut self) {
        self.play();
    }

    /// Advance the playback clock by one tick. Reaching the fragment's
    /// nominal duration auto-pauses and rewinds, bounding playback even when
    /// the underlying media outlasts the logical fragment.
    pub fn on_tick(&mut self) {
        if !self.playing {
            return;
        }
        self.position += Duration::from_millis(TICK_RATE_MS);
        if let Some(session) = self.session.as_mut() {
            if self.position >= session.nominal {
                debug!("fragment cap reached, auto-pausing");
                session.sink.pause();
                if let Err(e) = session.sink.seek(Duration::ZERO) {
                    warn!("rewind failed: {e}");
                }
                self.position = Duration::ZERO;
                self.playing = false;
            }
        }
    }

    /// Full teardown: pause, release the sink, clear all playback state.
    pub fn reset(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.sink.pause();
        }
        self.current = None;
        self.position = Duration::ZERO;
        self.playing = false;
        self.pending_play = false;
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.apply_volume();
    }

    pub fn mute(&mut self) {
        self.muted = true;
        self.apply_volume();
    }

    pub fn unmute(&mut self) {
        self.muted = false;
        self.apply_volume();
    }

    fn apply_volume(&mut self) {
        let volume = self.effective_volume();
        if let Some(session) = self.session.as_mut() {
            session.sink.set_volume(volume);
        }
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }
}
