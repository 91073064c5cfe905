//! The evolve pipeline: generate, validate, identify, persist, log.
//!
//! A linear state machine with early exits. Nothing is persisted on any
//! failure path, and failures never cross this boundary as errors: the
//! pipeline reports `false` and prints its diagnostics.

use crate::config::Settings;
use crate::history::HistoryLog;
use crate::llm::{ModelClient, ModelReply, VerdictPolicy};
use crate::util::truncate_with_ellipsis;
use anyhow::{Context, Result};
use rand::Rng;
use std::fs;
use std::path::PathBuf;

/// Generated code above this many characters is rejected outright.
pub const MAX_CODE_CHARS: usize = 50_000;

/// Substrings that fail static validation wherever they appear.
pub const DANGEROUS_PATTERNS: &[&str] = &["system(", "exec(", "rm -rf", "format C:", "delete *"];

/// Identifier redraw attempts before giving up on a collision-free id.
const ID_RETRY_LIMIT: u32 = 16;

/// File name an artifact is persisted under, derived from its id.
pub fn artifact_file_name(id: &str) -> String {
    format!("command_{id}.rs")
}

/// One uniform draw from the 8-digit identifier space.
pub fn draw_id(rng: &mut impl Rng) -> u32 {
    rng.gen_range(10_000_000..=99_999_999)
}

/// Static validation: emptiness, length bound, dangerous patterns. Returns
/// the rejection reason, or `None` when the code passes.
pub fn static_rejection(code: &str) -> Option<String> {
    if code.is_empty() {
        return Some("empty code".to_string());
    }
    if code.chars().count() > MAX_CODE_CHARS {
        return Some("code too long".to_string());
    }
    for pattern in DANGEROUS_PATTERNS {
        if code.contains(pattern) {
            return Some(format!("dangerous pattern detected: {pattern}"));
        }
    }
    None
}

pub struct Evolver<'a> {
    settings: &'a Settings,
}

impl<'a> Evolver<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Run the full pipeline for one description. `execute` simulates
    /// execution; `save` persists the artifact. With neither requested the
    /// run stops after generation.
    pub async fn evolve(&self, description: &str, execute: bool, save: bool) -> bool {
        println!("Evolving: {description}");

        let client = ModelClient::new(self.settings);
        let code = match client.generate_code(description).await {
            ModelReply::Text(code) if !code.is_empty() => code,
            ModelReply::Text(_) => {
                println!("Failed to generate code: backend returned no output");
                return false;
            }
            reply => {
                let reason = reply
                    .failure_reason()
                    .unwrap_or_else(|| "unknown failure".to_string());
                println!("Failed to generate code: {reason}");
                return false;
            }
        };

        println!("Code generated successfully");
        println!(
            "Generated code preview:\n{}",
            truncate_with_ellipsis(&code, 200)
        );

        if !execute && !save {
            return true;
        }

        if !self.validate(&client, &code).await {
            return false;
        }

        let Some(id) = self.draw_artifact_id() else {
            println!("Failed to allocate an artifact id");
            return false;
        };

        let history = HistoryLog::new(self.settings);

        if save {
            match self.persist(&id, &code) {
                Ok(path) => {
                    println!("Command saved with ID: {id}");
                    history.append(
                        &format!("Save command {id}"),
                        &format!("Success: {}", path.display()),
                    );
                }
                Err(err) => {
                    println!("Failed to save command: {err:#}");
                    return false;
                }
            }
        }

        if execute {
            // No generated code is ever run; the execute path is a labeled
            // simulation that only leaves a history record.
            println!("Command execution simulation completed");
            history.append(description, "Success");
        }

        true
    }

    /// Layered validation: config gate, static checks, then the model
    /// verdict when a backend is reachable.
    async fn validate(&self, client: &ModelClient<'_>, code: &str) -> bool {
        if !self.settings.get_bool("validation.enabled", true) {
            println!("Code validation is disabled");
            return true;
        }

        if let Some(reason) = static_rejection(code) {
            println!("Code validation failed: {reason}");
            return false;
        }

        if client.available().await {
            let policy = VerdictPolicy::from_settings(self.settings);
            if !client.validate_code(code, policy).await {
                println!("Code validation failed: model verdict");
                return false;
            }
        }

        println!("Code validation passed");
        true
    }

    /// Draw an id that does not collide with an existing artifact file.
    /// Uniqueness is only checked against the target directory; the 8-digit
    /// space makes collisions rare but the redraw keeps them from clobbering
    /// earlier artifacts.
    fn draw_artifact_id(&self) -> Option<String> {
        let dir = self.settings.generated_dir();
        let mut rng = rand::thread_rng();
        for _ in 0..ID_RETRY_LIMIT {
            let id = draw_id(&mut rng).to_string();
            if !dir.join(artifact_file_name(&id)).exists() {
                return Some(id);
            }
        }
        None
    }

    fn persist(&self, id: &str, code: &str) -> Result<PathBuf> {
        let dir = self.settings.generated_dir();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let path = dir.join(artifact_file_name(id));
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let contents = format!(
            "// Generated command ID: {id}\n// Generated at: {timestamp}\n\n{code}"
        );
        fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;

        tracing::info!(id, path = %path.display(), "artifact persisted");
        Ok(path)
    }
}
