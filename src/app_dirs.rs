use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("glitchbeat"),
            )
        } else {
            ProjectDirs::from("", "", "glitchbeat")
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    /// Tracing output; the terminal is owned by the TUI.
    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("glitchbeat.log"))
    }

    /// Per-run results log.
    pub fn results_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("runs.csv"))
    }
}
