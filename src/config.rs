//! Flat key-value configuration store.
//!
//! The on-disk format is deliberately simple: one `key = value` pair per
//! line, `#` comment lines, UTF-8 throughout. Keys are dotted by convention
//! (`llm.command`, `execution.safe_mode`) but stored flat; values are plain
//! strings with typed coercion only at read time.
//!
//! A [`Settings`] value is constructed once at startup and passed by
//! reference into every component that needs it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Dotfile looked up in the home directory.
pub const CONFIG_DOTFILE: &str = ".evogen_config";

/// Relative fallback when the home directory cannot be determined.
const CONFIG_FALLBACK: &str = "evogen_config.txt";

#[derive(Debug, Clone)]
pub struct Settings {
    values: BTreeMap<String, String>,
    config_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    /// Empty store pointed at the default config path. Nothing is read from
    /// disk until [`Settings::load`] is called.
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            config_path: default_config_path(),
        }
    }

    /// Empty store pointed at an explicit path. Used by tests and by callers
    /// that manage their own config location.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            values: BTreeMap::new(),
            config_path: path.into(),
        }
    }

    /// Parse a config file, replacing the current contents wholesale.
    ///
    /// `None` means the store's current path. Blank lines and lines starting
    /// with `#` are skipped; everything else is split on the first `=` with
    /// both sides trimmed. Lines without `=` are ignored. Returns `false`
    /// when the file is missing or unreadable.
    pub fn load(&mut self, path: Option<&Path>) -> bool {
        let path = path.map_or_else(|| self.config_path.clone(), Path::to_path_buf);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                tracing::debug!("config not loaded from {}: {err}", path.display());
                return false;
            }
        };

        self.values.clear();
        for line in contents.lines() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                self.values
                    .insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        self.config_path = path;
        tracing::debug!("config loaded from {}", self.config_path.display());
        true
    }

    /// Serialize every setting back out as `key = value` lines under a short
    /// header comment. Full overwrite, no merging. Returns `false` on any
    /// I/O failure; the failure is logged but never fatal.
    pub fn save(&self, path: Option<&Path>) -> bool {
        let path = path.map_or_else(|| self.config_path.clone(), Path::to_path_buf);

        let mut out = String::from(
            "# evogen configuration\n# Generated automatically; edit by hand or via `evogen config set`\n\n",
        );
        for (key, value) in &self.values {
            out.push_str(key);
            out.push_str(" = ");
            out.push_str(value);
            out.push('\n');
        }

        match fs::write(&path, out) {
            Ok(()) => {
                tracing::debug!("config saved to {}", path.display());
                true
            }
            Err(err) => {
                tracing::warn!("failed to save config to {}: {err}", path.display());
                false
            }
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    /// Case-insensitive bool coercion. `true`, `1`, `yes` and `on` count as
    /// true; any other present value is false; an absent or empty value
    /// falls back to `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        let value = self.get_string(key, "");
        if value.is_empty() {
            return default;
        }
        matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
    }

    /// Integer coercion; a missing or non-numeric value falls back to
    /// `default` instead of surfacing a parse error.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        let value = self.get_string(key, "");
        if value.is_empty() {
            return default;
        }
        value.parse().unwrap_or(default)
    }

    pub fn llm_command(&self) -> String {
        self.get_string("llm.command", "llm")
    }

    pub fn default_model(&self) -> String {
        self.get_string("llm.model", "gpt-3.5-turbo")
    }

    /// Directory generated artifacts are written to, with `~` expanded.
    pub fn generated_dir(&self) -> PathBuf {
        let raw = self.get_string("paths.generated_dir", "generated");
        PathBuf::from(shellexpand::tilde(&raw).as_ref())
    }

    /// Directory holding the history log, with `~` expanded.
    pub fn history_dir(&self) -> PathBuf {
        let raw = self.get_string("paths.history_dir", "history");
        PathBuf::from(shellexpand::tilde(&raw).as_ref())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Populate the fixed baseline and persist it immediately. This is the
    /// self-healing path taken when no config file exists at startup.
    pub fn seed_defaults(&mut self) {
        self.set("version", env!("CARGO_PKG_VERSION"));
        self.set("verbose", "false");
        self.set("llm.command", "llm");
        self.set("llm.model", "gpt-3.5-turbo");
        self.set("llm.temperature", "0.7");
        self.set("llm.max_tokens", "2000");
        self.set("llm.timeout", "30");
        self.set("execution.safe_mode", "true");
        self.set("execution.max_time", "60");
        self.set("validation.enabled", "true");
        self.set("validation.model_verdict", "exact");
        self.set("history.max_entries", "1000");
        self.set("paths.generated_dir", "generated");
        self.set("paths.history_dir", "history");

        if !self.save(None) {
            tracing::warn!("could not persist default configuration");
        }
    }

    /// Print every setting, sorted by key.
    pub fn print_all(&self) {
        println!("{}", console::style("Configuration Settings").bold());
        println!("{}", "=".repeat(40));
        for (key, value) in &self.values {
            println!("{key} = {value}");
        }
        println!();
        println!("Config file: {}", self.config_path.display());
    }
}

/// `$HOME/.evogen_config`, or a relative fallback when the home directory
/// cannot be determined.
fn default_config_path() -> PathBuf {
    dirs::home_dir().map_or_else(
        || PathBuf::from(CONFIG_FALLBACK),
        |home| home.join(CONFIG_DOTFILE),
    )
}
