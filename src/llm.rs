//! Client for the external LLM command-line backend.
//!
//! The backend is any executable speaking the `llm` CLI convention:
//! `<command> [-m <model>] [-s <system_prompt>] <prompt>` with the response
//! on stdout, plus `<command> --version` for version text. Availability is
//! probed with `command -v` before every operation so a missing backend
//! degrades to [`ModelReply::Unavailable`] instead of a spawn error.

use crate::config::Settings;
use crate::invoker::{InvokeError, Invoker};

const GENERATOR_SYSTEM_PROMPT: &str = "\
You are a Rust code generator for a self-evolving CLI tool.
Generate clean, safe, and functional Rust code based on the user's description.
The code should integrate with a clap-based application and follow these guidelines:

1. Use stable, idiomatic Rust
2. Handle fallible operations with Result
3. Add brief comments and documentation
4. Return complete, compilable code
5. Use clap patterns for command-line parsing

Return ONLY the Rust code without any explanations or markdown formatting.";

const VALIDATOR_SYSTEM_PROMPT: &str = "\
You are a Rust code validator for a self-evolving CLI tool.
Analyze the provided Rust code and respond with only 'SAFE' or 'UNSAFE'.

Check for:
1. Dangerous system calls or operations
2. Potential security vulnerabilities
3. Resource leaks
4. Code injection risks

Respond with only 'SAFE' if the code is acceptable, or 'UNSAFE' if it poses any security risk.";

/// Outcome of one backend invocation. Callers match on the variant; there
/// are no sentinel strings to compare against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    /// The backend produced output (possibly empty).
    Text(String),
    /// The backend executable does not resolve on PATH.
    Unavailable,
    /// The subprocess could not be spawned.
    SpawnFailed(String),
    /// The subprocess exceeded the configured timeout and was killed.
    TimedOut(u64),
}

impl ModelReply {
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Short diagnostic for the non-text variants.
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            Self::Text(_) => None,
            Self::Unavailable => Some("LLM backend not available".to_string()),
            Self::SpawnFailed(err) => Some(format!("failed to invoke LLM backend: {err}")),
            Self::TimedOut(secs) => Some(format!("LLM backend timed out after {secs}s")),
        }
    }
}

/// How a model validation verdict is read out of the response text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerdictPolicy {
    /// The trimmed, uppercased reply must be exactly `SAFE`.
    #[default]
    Exact,
    /// Historical behavior: `SAFE` anywhere in the uppercased reply counts,
    /// which also matches the `SAFE` inside `UNSAFE`. Kept behind the
    /// `validation.model_verdict = substring` setting for compatibility.
    Substring,
}

impl VerdictPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        match settings
            .get_string("validation.model_verdict", "exact")
            .to_lowercase()
            .as_str()
        {
            "substring" => Self::Substring,
            _ => Self::Exact,
        }
    }

    pub fn is_safe(self, reply: &str) -> bool {
        let upper = reply.to_uppercase();
        match self {
            Self::Exact => upper.trim() == "SAFE",
            Self::Substring => upper.contains("SAFE"),
        }
    }
}

pub struct ModelClient<'a> {
    settings: &'a Settings,
    invoker: Invoker,
}

impl<'a> ModelClient<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        let timeout_secs = u64::try_from(settings.get_int("llm.timeout", 30).max(1)).unwrap_or(30);
        Self {
            settings,
            invoker: Invoker::new(timeout_secs),
        }
    }

    /// Whether the configured backend command resolves on PATH.
    pub async fn available(&self) -> bool {
        self.invoker
            .probe(&[
                "command".to_string(),
                "-v".to_string(),
                self.settings.llm_command(),
            ])
            .await
    }

    /// Send a prompt to the backend. Short-circuits to `Unavailable`
    /// without spawning anything when the backend is missing.
    pub async fn query(&self, prompt: &str, system_prompt: &str) -> ModelReply {
        if !self.available().await {
            return ModelReply::Unavailable;
        }

        let args = self.build_query_args(prompt, system_prompt);
        match self.invoker.run(&args).await {
            Ok(text) => ModelReply::Text(text),
            Err(InvokeError::Spawn(err)) => ModelReply::SpawnFailed(err.to_string()),
            Err(InvokeError::TimedOut { secs }) => ModelReply::TimedOut(secs),
        }
    }

    /// Ask the backend to emit source code for `description`.
    pub async fn generate_code(&self, description: &str) -> ModelReply {
        let user_prompt = format!(
            "Generate Rust code for: {description}\n\n\
             The code should be a complete function or module that can be \
             integrated into a clap-based application."
        );
        self.query(&user_prompt, GENERATOR_SYSTEM_PROMPT).await
    }

    /// Ask the backend for a SAFE/UNSAFE verdict on `code`, read out under
    /// `policy`. Any non-text reply counts as a failed validation.
    pub async fn validate_code(&self, code: &str, policy: VerdictPolicy) -> bool {
        let user_prompt = format!("Validate this Rust code:\n\n```rust\n{code}\n```");
        match self.query(&user_prompt, VALIDATOR_SYSTEM_PROMPT).await {
            ModelReply::Text(reply) => policy.is_safe(&reply),
            _ => false,
        }
    }

    /// `<command> --version`, or `Unavailable`.
    pub async fn model_info(&self) -> ModelReply {
        if !self.available().await {
            return ModelReply::Unavailable;
        }
        let args = vec![self.settings.llm_command(), "--version".to_string()];
        match self.invoker.run(&args).await {
            Ok(text) => ModelReply::Text(text),
            Err(InvokeError::Spawn(err)) => ModelReply::SpawnFailed(err.to_string()),
            Err(InvokeError::TimedOut { secs }) => ModelReply::TimedOut(secs),
        }
    }

    /// Ask the backend for improvement suggestions given a description of
    /// the tool's current functionality.
    pub async fn suggest_improvements(&self, current_functionality: &str) -> ModelReply {
        let prompt = format!(
            "Given this current CLI tool functionality: {current_functionality}\n\n\
             Suggest specific improvements or new features that would make \
             this tool more capable of self-evolution."
        );
        self.query(&prompt, "").await
    }

    fn build_query_args(&self, prompt: &str, system_prompt: &str) -> Vec<String> {
        let mut args = vec![self.settings.llm_command()];

        let model = self.settings.default_model();
        if !model.is_empty() {
            args.push("-m".to_string());
            args.push(model);
        }
        if !system_prompt.is_empty() {
            args.push("-s".to_string());
            args.push(system_prompt.to_string());
        }
        args.push(prompt.to_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_settings() -> Settings {
        let mut settings = Settings::with_path("unused");
        settings.set("llm.command", "llm");
        settings.set("llm.model", "gpt-4");
        settings
    }

    #[test]
    fn query_args_include_model_and_system_prompt() {
        let settings = client_settings();
        let client = ModelClient::new(&settings);
        let args = client.build_query_args("the prompt", "the system");
        assert_eq!(
            args,
            vec!["llm", "-m", "gpt-4", "-s", "the system", "the prompt"]
        );
    }

    #[test]
    fn query_args_skip_empty_system_prompt() {
        let settings = client_settings();
        let client = ModelClient::new(&settings);
        let args = client.build_query_args("p", "");
        assert_eq!(args, vec!["llm", "-m", "gpt-4", "p"]);
    }

    #[test]
    fn query_args_skip_empty_model() {
        let mut settings = client_settings();
        settings.set("llm.model", "");
        let client = ModelClient::new(&settings);
        let args = client.build_query_args("p", "");
        assert_eq!(args, vec!["llm", "p"]);
    }

    #[test]
    fn exact_verdict_rejects_unsafe() {
        assert!(VerdictPolicy::Exact.is_safe("SAFE"));
        assert!(VerdictPolicy::Exact.is_safe("  safe \n"));
        assert!(!VerdictPolicy::Exact.is_safe("UNSAFE"));
        assert!(!VerdictPolicy::Exact.is_safe("The code is SAFE"));
        assert!(!VerdictPolicy::Exact.is_safe(""));
    }

    #[test]
    fn substring_verdict_accepts_unsafe() {
        // The historical defect, preserved verbatim behind the flag: the
        // SAFE inside UNSAFE matches.
        assert!(VerdictPolicy::Substring.is_safe("SAFE"));
        assert!(VerdictPolicy::Substring.is_safe("UNSAFE"));
        assert!(VerdictPolicy::Substring.is_safe("the code looks safe to me"));
        assert!(!VerdictPolicy::Substring.is_safe("rejected"));
    }

    #[test]
    fn verdict_policy_read_from_settings() {
        let mut settings = Settings::with_path("unused");
        assert_eq!(VerdictPolicy::from_settings(&settings), VerdictPolicy::Exact);
        settings.set("validation.model_verdict", "substring");
        assert_eq!(
            VerdictPolicy::from_settings(&settings),
            VerdictPolicy::Substring
        );
        settings.set("validation.model_verdict", "anything-else");
        assert_eq!(VerdictPolicy::from_settings(&settings), VerdictPolicy::Exact);
    }

    #[tokio::test]
    async fn query_short_circuits_when_unavailable() {
        let mut settings = Settings::with_path("unused");
        settings.set("llm.command", "definitely-not-a-real-llm-backend");
        let client = ModelClient::new(&settings);
        assert_eq!(client.query("hello", "").await, ModelReply::Unavailable);
        assert_eq!(client.model_info().await, ModelReply::Unavailable);
    }

    #[test]
    fn failure_reasons_cover_non_text_variants() {
        assert!(ModelReply::Text("ok".into()).failure_reason().is_none());
        assert!(ModelReply::Unavailable.failure_reason().is_some());
        assert!(ModelReply::SpawnFailed("x".into()).failure_reason().is_some());
        assert!(ModelReply::TimedOut(30).failure_reason().is_some());
    }
}
