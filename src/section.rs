use strum_macros::Display;

/// One of the four gameplay segments, or the terminal state reached when the
/// run ends (by winning section four or by failing a section gate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Section {
    #[strum(serialize = "1")]
    One,
    #[strum(serialize = "2")]
    Two,
    #[strum(serialize = "3")]
    Three,
    #[strum(serialize = "4")]
    Four,
    #[strum(serialize = "FINAL")]
    Final,
}

impl Section {
    /// Ordinal 1-4, or `None` for the terminal section.
    pub fn number(&self) -> Option<u8> {
        match self {
            Section::One => Some(1),
            Section::Two => Some(2),
            Section::Three => Some(3),
            Section::Four => Some(4),
            Section::Final => None,
        }
    }

    pub fn next(&self) -> Section {
        match self {
            Section::One => Section::Two,
            Section::Two => Section::Three,
            Section::Three => Section::Four,
            Section::Four | Section::Final => Section::Final,
        }
    }

    /// Fixed per-section tuning. `Final` has no config; nothing runs there.
    pub fn config(&self) -> Option<&'static SectionConfig> {
        self.number().map(|n| &SECTION_CONFIGS[(n - 1) as usize])
    }
}

/// Tuning for a single section. Time limits shrink and chord sizes grow as
/// sections progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionConfig {
    pub keys_per_challenge: usize,
    pub total_challenges: u32,
    pub challenge_time_secs: f64,
    pub section_duration_secs: f64,
    pub min_correct_hits: u32,
}

/// Section tuning, indexed by ordinal - 1. Section durations track the
/// base-variant audio so the track and the section timer run out together.
pub const SECTION_CONFIGS: [SectionConfig; 4] = [
    SectionConfig {
        keys_per_challenge: 1,
        total_challenges: 3,
        challenge_time_secs: 5.0,
        section_duration_secs: 50.0,
        min_correct_hits: 2,
    },
    SectionConfig {
        keys_per_challenge: 2,
        total_challenges: 3,
        challenge_time_secs: 4.0,
        section_duration_secs: 27.0,
        min_correct_hits: 2,
    },
    SectionConfig {
        keys_per_challenge: 4,
        total_challenges: 3,
        challenge_time_secs: 3.0,
        section_duration_secs: 35.0,
        min_correct_hits: 2,
    },
    SectionConfig {
        keys_per_challenge: 6,
        total_challenges: 3,
        challenge_time_secs: 2.0,
        section_duration_secs: 31.0,
        min_correct_hits: 1,
    },
];

/// Momentary sub-state within a section. Input is accepted only in `Playing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    #[strum(serialize = "playing")]
    Playing,
    #[strum(serialize = "challenge-failed")]
    ChallengeFailed,
    #[strum(serialize = "exploding")]
    Exploding,
}

/// How long the failure flash blocks input before a fresh challenge is issued.
pub const CHALLENGE_FAILED_MS: u64 = 1000;

/// How long the explosion plays before the terminal transition.
pub const EXPLOSION_MS: u64 = 2000;
