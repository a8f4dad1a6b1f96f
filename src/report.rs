use crate::app_dirs::AppDirs;
use crate::game::GameSnapshot;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Append one finished run to the results log, creating the file (and a
/// header) on first use.
pub fn append_result(snapshot: &GameSnapshot) -> io::Result<()> {
    match AppDirs::results_path() {
        Some(path) => append_result_to(snapshot, &path),
        None => Ok(()),
    }
}

pub fn append_result_to(snapshot: &GameSnapshot, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let needs_header = !path.exists();

    let mut log_file = OpenOptions::new().append(true).create(true).open(path)?;

    if needs_header {
        writeln!(
            log_file,
            "date,section,error_level,correct_hits,incorrect_hits,completed_challenges"
        )?;
    }

    writeln!(
        log_file,
        "{},{},{},{},{},{}",
        Local::now().format("%c"),
        snapshot.section,
        snapshot.error_level,
        snapshot.correct_hits,
        snapshot.incorrect_hits,
        snapshot.completed_challenges,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameSession;

    #[test]
    fn test_append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.csv");
        let snapshot = GameSession::new().snapshot();

        append_result_to(&snapshot, &path).unwrap();
        append_result_to(&snapshot, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("date,section"));
        assert!(lines[1].ends_with(",1,0,0,0,0"));
    }
}
