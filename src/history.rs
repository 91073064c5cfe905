//! Append-only history log and the status/history printers.
//!
//! One record per line: `<local timestamp> | <description> | <outcome>`.
//! The log is read back in file order; display trims to the most recent
//! entries. Logging failures are warned about and swallowed, never fatal.

use crate::config::Settings;
use crate::llm::ModelClient;
use chrono::Local;
use console::style;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const HISTORY_FILE: &str = "commands.log";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Entries shown by `evogen history`.
const DISPLAY_LIMIT: usize = 10;

pub struct HistoryLog<'a> {
    settings: &'a Settings,
}

impl<'a> HistoryLog<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    pub fn file_path(&self) -> PathBuf {
        self.settings.history_dir().join(HISTORY_FILE)
    }

    /// Append one record, creating the history directory on first use.
    /// Afterwards the file is trimmed to `history.max_entries` lines.
    pub fn append(&self, description: &str, outcome: &str) {
        let dir = self.settings.history_dir();
        if let Err(err) = fs::create_dir_all(&dir) {
            tracing::warn!("could not create history dir {}: {err}", dir.display());
            return;
        }

        let path = dir.join(HISTORY_FILE);
        let line = format!(
            "{} | {description} | {outcome}\n",
            Local::now().format(TIMESTAMP_FORMAT)
        );

        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(err) = written {
            tracing::warn!("could not append history record: {err}");
            return;
        }

        self.trim_to_limit(&path);
    }

    /// All records in file order, blank lines skipped. A missing log file is
    /// an empty history, not an error.
    pub fn load(&self) -> Vec<String> {
        let Ok(contents) = fs::read_to_string(self.file_path()) else {
            return Vec::new();
        };
        contents
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn trim_to_limit(&self, path: &Path) {
        let max = self.settings.get_int("history.max_entries", 1000);
        let Ok(max) = usize::try_from(max) else {
            return;
        };
        if max == 0 {
            return;
        }

        let Ok(contents) = fs::read_to_string(path) else {
            return;
        };
        let lines: Vec<&str> = contents.lines().filter(|line| !line.is_empty()).collect();
        if lines.len() <= max {
            return;
        }

        let mut trimmed = lines[lines.len() - max..].join("\n");
        trimmed.push('\n');
        if let Err(err) = fs::write(path, trimmed) {
            tracing::warn!("could not trim history log: {err}");
        }
    }
}

/// `evogen history`: the most recent entries, oldest first.
pub fn print_history(settings: &Settings) {
    let entries = HistoryLog::new(settings).load();
    if entries.is_empty() {
        println!("No command history found");
        return;
    }

    println!("{}", style("Command History").bold());
    println!("{}", "=".repeat(40));
    let start = entries.len().saturating_sub(DISPLAY_LIMIT);
    for (index, entry) in entries.iter().enumerate().skip(start) {
        println!("Entry {}: {entry}", index + 1);
        println!("{}", "-".repeat(20));
    }
}

/// `evogen status`: configuration summary plus backend availability.
pub async fn print_status(settings: &Settings) {
    let client = ModelClient::new(settings);
    let available = client.available().await;
    let entries = HistoryLog::new(settings).load();

    println!("{}", style("evogen status").bold());
    println!("{}", "=".repeat(40));
    println!(
        "Version: {}",
        settings.get_string("version", env!("CARGO_PKG_VERSION"))
    );
    println!("Config file: {}", settings.config_path().display());
    println!("LLM available: {}", if available { "Yes" } else { "No" });
    println!("LLM command: {}", settings.llm_command());
    println!("Default model: {}", settings.default_model());
    println!(
        "Safe mode: {}",
        if settings.get_bool("execution.safe_mode", true) {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    println!("Command history: {} entries", entries.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_settings(dir: &Path) -> Settings {
        let mut settings = Settings::with_path(dir.join("config"));
        settings.set(
            "paths.history_dir",
            dir.join("history").to_str().unwrap(),
        );
        settings
    }

    #[test]
    fn append_then_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let settings = history_settings(dir.path());
        let log = HistoryLog::new(&settings);

        log.append("first action", "Success");
        log.append("second action", "Failure");

        let entries = log.load();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].contains("first action"));
        assert!(entries[0].contains(" | Success"));
        assert!(entries[1].contains("second action"));
        assert!(entries[1].contains(" | Failure"));
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let settings = history_settings(dir.path());
        assert!(HistoryLog::new(&settings).load().is_empty());
    }

    #[test]
    fn records_use_pipe_separated_fields() {
        let dir = tempfile::tempdir().unwrap();
        let settings = history_settings(dir.path());
        let log = HistoryLog::new(&settings);

        log.append("desc", "outcome");
        let entries = log.load();
        let fields: Vec<&str> = entries[0].split(" | ").collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[1], "desc");
        assert_eq!(fields[2], "outcome");
    }

    #[test]
    fn append_trims_to_max_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = history_settings(dir.path());
        settings.set("history.max_entries", "5");
        let log = HistoryLog::new(&settings);

        for n in 0..8 {
            log.append(&format!("action {n}"), "Success");
        }

        let entries = log.load();
        assert_eq!(entries.len(), 5);
        assert!(entries[0].contains("action 3"));
        assert!(entries[4].contains("action 7"));
    }
}
