// Full engine wiring: GameSession driving AudioPlayer through snapshots,
// with a recording backend standing in for the audio device.

use glitchbeat::audio::backend::SinkEvent;
use glitchbeat::audio::{AudioCatalog, AudioPlayer, TestBackend};
use glitchbeat::challenge::KEY_POOL;
use glitchbeat::game::GameSession;
use glitchbeat::section::Section;
use glitchbeat::TICK_RATE_MS;
use std::sync::{Arc, Mutex};

fn wired() -> (
    GameSession,
    AudioPlayer,
    Arc<Mutex<glitchbeat::audio::backend::TestBackendState>>,
) {
    let (backend, state) = TestBackend::new();
    let player = AudioPlayer::new(Box::new(backend), AudioCatalog::builtin());
    (GameSession::new(), player, state)
}

/// One engine tick: session, player, midpoint trigger, audio sync. Mirrors
/// the binary's tick arm.
fn tick(session: &mut GameSession, player: &mut AudioPlayer) {
    session.on_tick();
    player.on_tick();
    if session.section() == Section::One && !session.section_one_half_passed() {
        let half_ms = (Section::One.config().unwrap().section_duration_secs * 500.0) as u64;
        if player.position_ms() >= half_ms {
            session.start_section_challenges(Section::One);
        }
    }
    player.sync_with(&session.snapshot());
}

fn tick_secs(session: &mut GameSession, player: &mut AudioPlayer, secs: f64) {
    let ticks = (secs * 1000.0 / TICK_RATE_MS as f64).round() as u64;
    for _ in 0..ticks {
        tick(session, player);
    }
}

fn press_wrong_key(session: &mut GameSession, player: &mut AudioPlayer) {
    let target = session.snapshot().target_keys;
    let wrong = KEY_POOL
        .iter()
        .find(|k| !target.contains(k))
        .copied()
        .expect("target smaller than pool");
    session.on_key_down(wrong, false);
    player.sync_with(&session.snapshot());
}

#[test]
fn initial_sync_loads_section_one_base_variant() {
    let (session, mut player, state) = wired();
    player.sync_with(&session.snapshot());
    assert!(player.is_playing());
    let state = state.lock().unwrap();
    assert_eq!(state.opened.len(), 1);
    assert!(state.opened[0].to_string_lossy().contains("seccion1_error0"));
}

#[test]
fn midpoint_arms_section_one_challenges() {
    let (mut session, mut player, _state) = wired();
    player.sync_with(&session.snapshot());

    tick_secs(&mut session, &mut player, 24.0);
    assert!(!session.snapshot().challenges_active, "first pass is silent");

    tick_secs(&mut session, &mut player, 1.5);
    let snap = session.snapshot();
    assert!(snap.challenges_active, "midpoint arms the second pass");
    assert_eq!(snap.error_level, 0);
    assert_eq!(snap.total_challenges, 3);
}

#[test]
fn escalation_hot_swaps_variant_at_same_position() {
    let (mut session, mut player, state) = wired();
    session.start_section_challenges(Section::One);
    player.sync_with(&session.snapshot());

    tick_secs(&mut session, &mut player, 4.0);
    let position_before = player.position_ms();
    assert!(position_before >= 3_900);

    press_wrong_key(&mut session, &mut player);

    assert_eq!(player.position_ms(), position_before, "swap keeps position");
    let state = state.lock().unwrap();
    assert!(state.opened[1].to_string_lossy().contains("seccion1_error1"));
    assert!(state
        .events
        .contains(&(1, SinkEvent::Sought(position_before))));
    assert_eq!(state.max_alive, 1, "one live resource, always");
}

#[test]
fn section_advance_restarts_audio_from_the_top() {
    let (mut session, mut player, state) = wired();
    player.sync_with(&session.snapshot());

    tick_secs(&mut session, &mut player, 51.0);
    assert_eq!(session.section(), Section::Two);
    assert!(
        player.position_ms() <= 1_500,
        "new section starts its track near zero"
    );
    let state = state.lock().unwrap();
    let last = state.opened.last().unwrap();
    assert!(last.to_string_lossy().contains("seccion2_error0"));
    assert_eq!(state.max_alive, 1);
}

#[test]
fn blocked_playback_recovers_on_user_gesture() {
    // Scenario D with the full wiring in place.
    let (mut session, mut player, state) = wired();
    state.lock().unwrap().block_play = true;

    player.sync_with(&session.snapshot());
    assert!(player.pending_play());
    assert!(!player.is_playing());

    // Timers and challenges keep running while blocked.
    tick_secs(&mut session, &mut player, 2.0);
    assert!(session.snapshot().section_time_remaining < 50.0);

    state.lock().unwrap().block_play = false;
    player.notify_user_gesture();
    assert!(!player.pending_play());
    assert!(player.is_playing());
}

#[test]
fn game_over_pauses_playback() {
    let (mut session, mut player, _state) = wired();
    session.start_section_challenges(Section::One);
    player.sync_with(&session.snapshot());
    assert!(player.is_playing());

    // Ride out section 1, then let section 2's gate fail unattended.
    tick_secs(&mut session, &mut player, 51.0);
    assert_eq!(session.section(), Section::Two);
    tick_secs(&mut session, &mut player, 30.0); // gate fails, explosion runs out
    assert_eq!(session.section(), Section::Final);
    assert!(session.is_game_over());
    assert!(!player.is_playing());
}

#[test]
fn reset_returns_audio_and_game_to_baseline() {
    let (mut session, mut player, state) = wired();
    player.sync_with(&session.snapshot());
    tick_secs(&mut session, &mut player, 10.0);

    session.reset_game();
    player.reset();
    assert_eq!(state.lock().unwrap().alive, 0, "sink released on reset");

    player.sync_with(&session.snapshot());
    assert!(player.is_playing());
    assert_eq!(player.position_ms(), 0);
    let state = state.lock().unwrap();
    assert!(state
        .opened
        .last()
        .unwrap()
        .to_string_lossy()
        .contains("seccion1_error0"));
}
