use super::AudioError;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One live audio resource. Dropping the sink releases it; the player never
/// holds more than one at a time.
pub trait AudioSink {
    /// Start or resume playback. `AudioError::Blocked` means the output
    /// device refused and the attempt should be retried on a user gesture.
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self);
    fn seek(&mut self, position: Duration) -> Result<(), AudioError>;
    fn set_volume(&mut self, volume: f32);
}

/// Source of sinks. The seam that lets the whole engine run headless: the
/// binary wires `RodioBackend`, tests wire `TestBackend`.
pub trait AudioBackend {
    fn open(&mut self, file: &Path) -> Result<Box<dyn AudioSink>, AudioError>;
}

/// Production backend on top of rodio. The output stream is acquired lazily
/// so a missing device surfaces as `Blocked` (recoverable) instead of a
/// startup failure, and is kept for the lifetime of the backend.
pub struct RodioBackend {
    stream: Option<(OutputStream, OutputStreamHandle)>,
}

impl RodioBackend {
    pub fn new() -> Self {
        Self { stream: None }
    }

    fn handle(&mut self) -> Result<&OutputStreamHandle, AudioError> {
        if self.stream.is_none() {
            let (stream, handle) =
                OutputStream::try_default().map_err(|_| AudioError::Blocked)?;
            self.stream = Some((stream, handle));
        }
        Ok(&self.stream.as_ref().expect("stream just acquired").1)
    }
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for RodioBackend {
    fn open(&mut self, file: &Path) -> Result<Box<dyn AudioSink>, AudioError> {
        let reader = BufReader::new(
            File::open(file).map_err(|e| AudioError::Backend(e.to_string()))?,
        );
        let source = Decoder::new(reader)
            .map_err(|e| AudioError::Backend(e.to_string()))?
            .repeat_infinite();
        let handle = self.handle()?;
        let sink = Sink::try_new(handle).map_err(|_| AudioError::Blocked)?;
        sink.append(source);
        // Constructed paused; the player decides when playback starts.
        sink.pause();
        Ok(Box::new(RodioSink { sink }))
    }
}

struct RodioSink {
    sink: Sink,
}

impl AudioSink for RodioSink {
    fn play(&mut self) -> Result<(), AudioError> {
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn seek(&mut self, position: Duration) -> Result<(), AudioError> {
        self.sink
            .try_seek(position)
            .map_err(|e| AudioError::Backend(format!("{e:?}")))
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }
}

/// Backend that produces silent, always-successful sinks. Used for the
/// `--silent` flag.
#[derive(Debug, Default)]
pub struct NullBackend;

impl AudioBackend for NullBackend {
    fn open(&mut self, _file: &Path) -> Result<Box<dyn AudioSink>, AudioError> {
        Ok(Box::new(NullSink))
    }
}

struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
    fn pause(&mut self) {}
    fn seek(&mut self, _position: Duration) -> Result<(), AudioError> {
        Ok(())
    }
    fn set_volume(&mut self, _volume: f32) {}
}

/// What a [`TestBackend`] sink was asked to do. Seek positions are recorded
/// in milliseconds so events stay comparable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SinkEvent {
    Played,
    PlayRefused,
    Paused,
    Sought(u64),
    VolumeSet(f32),
}

/// Shared observable state of a [`TestBackend`].
#[derive(Debug, Default)]
pub struct TestBackendState {
    /// (sink ordinal, event), in call order across all sinks.
    pub events: Vec<(usize, SinkEvent)>,
    /// Files opened, in order.
    pub opened: Vec<PathBuf>,
    /// Sinks currently alive (not yet dropped).
    pub alive: usize,
    /// High-water mark of simultaneously alive sinks.
    pub max_alive: usize,
    /// When set, `play()` fails with `Blocked` until cleared.
    pub block_play: bool,
    /// When set, `open()` fails with `Blocked`.
    pub block_open: bool,
}

/// Recording backend for unit and integration tests.
pub struct TestBackend {
    state: Arc<Mutex<TestBackendState>>,
    next_id: usize,
}

impl TestBackend {
    pub fn new() -> (Self, Arc<Mutex<TestBackendState>>) {
        let state = Arc::new(Mutex::new(TestBackendState::default()));
        (
            Self {
                state: Arc::clone(&state),
                next_id: 0,
            },
            state,
        )
    }
}

impl AudioBackend for TestBackend {
    fn open(&mut self, file: &Path) -> Result<Box<dyn AudioSink>, AudioError> {
        let mut state = self.state.lock().unwrap();
        if state.block_open {
            return Err(AudioError::Blocked);
        }
        state.opened.push(file.to_path_buf());
        state.alive += 1;
        state.max_alive = state.max_alive.max(state.alive);
        let id = self.next_id;
        self.next_id += 1;
        Ok(Box::new(TestSink {
            id,
            state: Arc::clone(&self.state),
        }))
    }
}

struct TestSink {
    id: usize,
    state: Arc<Mutex<TestBackendState>>,
}

impl AudioSink for TestSink {
    fn play(&mut self) -> Result<(), AudioError> {
        let mut state = self.state.lock().unwrap();
        if state.block_play {
            state.events.push((self.id, SinkEvent::PlayRefused));
            return Err(AudioError::Blocked);
        }
        state.events.push((self.id, SinkEvent::Played));
        Ok(())
    }

    fn pause(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.events.push((self.id, SinkEvent::Paused));
    }

    fn seek(&mut self, position: Duration) -> Result<(), AudioError> {
        let mut state = self.state.lock().unwrap();
        state
            .events
            .push((self.id, SinkEvent::Sought(position.as_millis() as u64)));
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        let mut state = self.state.lock().unwrap();
        state.events.push((self.id, SinkEvent::VolumeSet(volume)));
    }
}

impl Drop for TestSink {
    fn drop(&mut self) {
        self.state.lock().unwrap().alive -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_null_backend_always_succeeds() {
        let mut backend = NullBackend;
        let mut sink = backend.open(Path::new("missing.mp3")).unwrap();
        assert!(sink.play().is_ok());
        assert!(sink.seek(Duration::from_secs(3)).is_ok());
    }

    #[test]
    fn test_test_backend_records_lifecycle() {
        let (mut backend, state) = TestBackend::new();
        let mut sink = backend.open(Path::new("a.mp3")).unwrap();
        sink.play().unwrap();
        sink.pause();
        drop(sink);

        let state = state.lock().unwrap();
        assert_eq!(state.opened, vec![PathBuf::from("a.mp3")]);
        assert_eq!(
            state.events,
            vec![(0, SinkEvent::Played), (0, SinkEvent::Paused)]
        );
        assert_eq!(state.alive, 0);
        assert_eq!(state.max_alive, 1);
    }

    #[test]
    fn test_test_backend_block_play() {
        let (mut backend, state) = TestBackend::new();
        state.lock().unwrap().block_play = true;
        let mut sink = backend.open(Path::new("a.mp3")).unwrap();
        assert_matches!(sink.play(), Err(AudioError::Blocked));
        state.lock().unwrap().block_play = false;
        assert!(sink.play().is_ok());
    }
}
