//! Subprocess invocation: shell escaping, stdout capture, timeouts.
//!
//! Command lines are composed from individually escaped tokens and run
//! through `sh -c`. Every invocation carries a timeout; on expiry the child
//! is killed rather than left to hang the caller.

use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("failed to execute command: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("command timed out after {secs}s and was killed")]
    TimedOut { secs: u64 },
}

/// Escape one token for POSIX `sh`: wrap in single quotes, with any embedded
/// single quote rewritten as `'\''`. Applied to every externally composed
/// token before it reaches the shell.
pub fn escape_arg(arg: &str) -> String {
    let mut escaped = String::with_capacity(arg.len() + 2);
    escaped.push('\'');
    for c in arg.chars() {
        if c == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(c);
        }
    }
    escaped.push('\'');
    escaped
}

fn join_escaped(args: &[String]) -> String {
    args.iter()
        .map(|arg| escape_arg(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy)]
pub struct Invoker {
    timeout_secs: u64,
}

impl Invoker {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout_secs: timeout_secs.max(1),
        }
    }

    /// Run an escaped argument vector through the shell and capture stdout.
    ///
    /// The exit status is deliberately not inspected; callers act on the
    /// captured text alone. One trailing newline is stripped. Stderr passes
    /// through to the terminal.
    pub async fn run(&self, args: &[String]) -> Result<String, InvokeError> {
        let line = join_escaped(args);
        tracing::debug!(command = %line, "invoking");

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let result = tokio::time::timeout(self.timeout(), cmd.output()).await;
        match result {
            Ok(Ok(output)) => {
                let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                if stdout.ends_with('\n') {
                    stdout.pop();
                }
                Ok(stdout)
            }
            Ok(Err(err)) => Err(InvokeError::Spawn(err)),
            Err(_) => Err(InvokeError::TimedOut {
                secs: self.timeout_secs,
            }),
        }
    }

    /// Run an escaped argument vector and report only whether it exited
    /// successfully. Used for availability probes such as `command -v`.
    pub async fn probe(&self, args: &[String]) -> bool {
        let line = join_escaped(args);
        tracing::debug!(command = %line, "probing");

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&line)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout(), cmd.status()).await {
            Ok(Ok(status)) => status.success(),
            _ => false,
        }
    }

    /// Run a raw shell line with inherited stdio and report whether it
    /// exited successfully. No escaping is applied: the caller is handing
    /// over a full command line on purpose (the `exec` subcommand).
    pub async fn run_line(&self, line: &str) -> Result<bool, InvokeError> {
        tracing::debug!(command = %line, "executing raw line");

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(line).kill_on_drop(true);

        let result = tokio::time::timeout(self.timeout(), cmd.status()).await;
        match result {
            Ok(Ok(status)) => Ok(status.success()),
            Ok(Err(err)) => Err(InvokeError::Spawn(err)),
            Err(_) => Err(InvokeError::TimedOut {
                secs: self.timeout_secs,
            }),
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_plain_token() {
        assert_eq!(escape_arg("hello"), "'hello'");
    }

    #[test]
    fn escape_embedded_quote() {
        assert_eq!(escape_arg("it's"), "'it'\\''s'");
    }

    #[test]
    fn escape_empty_token() {
        assert_eq!(escape_arg(""), "''");
    }

    #[test]
    fn join_preserves_order() {
        let args = vec!["a".to_string(), "b c".to_string()];
        assert_eq!(join_escaped(&args), "'a' 'b c'");
    }

    #[tokio::test]
    async fn run_captures_stdout_and_strips_one_newline() {
        let invoker = Invoker::new(10);
        let out = invoker
            .run(&["echo".to_string(), "hello".to_string()])
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn injection_payload_stays_one_literal_token() {
        let invoker = Invoker::new(10);
        let payload = "'; rm -rf /'".to_string();
        let out = invoker
            .run(&["printf".to_string(), "%s".to_string(), payload.clone()])
            .await
            .unwrap();
        assert_eq!(out, payload);
    }

    #[tokio::test]
    async fn run_ignores_exit_status() {
        let invoker = Invoker::new(10);
        // `false` produces no output and exits nonzero; run still succeeds.
        let out = invoker.run(&["false".to_string()]).await.unwrap();
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn run_times_out_and_kills() {
        let invoker = Invoker::new(1);
        let err = invoker
            .run(&["sleep".to_string(), "5".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::TimedOut { secs: 1 }));
    }

    #[tokio::test]
    async fn probe_reflects_exit_status() {
        let invoker = Invoker::new(10);
        assert!(invoker.probe(&["true".to_string()]).await);
        assert!(!invoker.probe(&["false".to_string()]).await);
    }

    #[tokio::test]
    async fn probe_finds_sh_on_path() {
        let invoker = Invoker::new(10);
        assert!(
            invoker
                .probe(&["command".to_string(), "-v".to_string(), "sh".to_string()])
                .await
        );
        assert!(
            !invoker
                .probe(&[
                    "command".to_string(),
                    "-v".to_string(),
                    "definitely-not-a-real-binary".to_string(),
                ])
                .await
        );
    }
}
