/// Highest error level; audio variants exist for levels 0 through this.
pub const MAX_ERROR_LEVEL: u8 = 4;

/// Escalating failure counter, 0-4. Non-decreasing within a section and reset
/// to 0 exactly when a section (re)initializes. The audio engine reads it to
/// pick the playback variant but never writes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ErrorLevel(u8);

impl ErrorLevel {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Bump one level, saturating at [`MAX_ERROR_LEVEL`].
    pub fn increment(&mut self) {
        self.0 = (self.0 + 1).min(MAX_ERROR_LEVEL);
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}
