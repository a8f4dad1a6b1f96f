// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod audio;
pub mod challenge;
pub mod config;
pub mod error_level;
pub mod game;
pub mod report;
pub mod runtime;
pub mod section;
pub mod ui;

/// Cooperative tick interval driving every countdown in the engine.
pub const TICK_RATE_MS: u64 = 100;
