pub mod backend;
pub mod catalog;
pub mod player;

pub use backend::{AudioBackend, AudioSink, NullBackend, RodioBackend, TestBackend};
pub use catalog::{AudioCatalog, Fragment};
pub use player::{AudioPlayer, PlayerSnapshot};

use thiserror::Error;

/// Audio failure taxonomy. Nothing here is fatal to a session: `Blocked`
/// recovers on a user gesture and `FragmentMissing` degrades to silence.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("playback blocked, waiting for a user gesture")]
    Blocked,
    #[error("no audio fragment for section {section} at error level {level}")]
    FragmentMissing { section: u8, level: u8 },
    #[error("audio backend: {0}")]
    Backend(String),
}
